// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Coils and Coil Sets
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Filamentary coils: a curve carrying a current.
//!
//! A `Coil` owns its geometry as a boxed `Curve`; a `CoilSet` is an ordered
//! collection whose field is the superposition of its members.

use std::f64::consts::PI;

use flux_types::error::{FluxError, FluxResult};
use ndarray::{Array1, Array2};

use crate::biot_savart::biot_savart;
use crate::coords::{check_points, rpz2xyz, xyz2rpz_vec, CoordBasis};
use crate::curve::{Curve, FrenetFrame};

/// Per-call overrides of a coil's current and discretization.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FieldParams {
    pub current: Option<f64>,
    /// Number of straight segments the coil is split into.
    pub grid: Option<usize>,
}

/// Anything that produces a magnetic field at given points.
pub trait MagneticField {
    /// B at `coords` (n, 3); coordinates and the returned field share `basis`.
    fn compute_magnetic_field(
        &self,
        coords: &Array2<f64>,
        params: &FieldParams,
        basis: CoordBasis,
    ) -> FluxResult<Array2<f64>>;
}

#[derive(Debug, Clone)]
pub struct Coil {
    curve: Box<dyn Curve>,
    current: f64,
    grid: Option<usize>,
    name: String,
}

impl Coil {
    pub fn new(curve: impl Curve + 'static, current: f64) -> Self {
        Self::from_boxed(Box::new(curve), current)
    }

    pub fn from_boxed(curve: Box<dyn Curve>, current: f64) -> Self {
        Coil {
            curve,
            current,
            grid: None,
            name: String::new(),
        }
    }

    pub fn with_grid(mut self, grid: usize) -> Self {
        self.grid = Some(grid);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn set_current(&mut self, current: f64) {
        self.current = current;
    }

    pub fn grid(&self) -> Option<usize> {
        self.grid
    }

    pub fn set_grid(&mut self, grid: Option<usize>) {
        self.grid = grid;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn curve(&self) -> &dyn Curve {
        self.curve.as_ref()
    }

    /// Points of the discretized filament, `grid` overriding the coil's own.
    pub fn compute_coordinates(&self, grid: Option<usize>, basis: CoordBasis) -> FluxResult<Array2<f64>> {
        let s = self.curve.nodes(grid.or(self.grid));
        self.curve.compute_coordinates(&s, 0, basis)
    }

    pub fn compute_frenet_frame(&self, grid: Option<usize>, basis: CoordBasis) -> FluxResult<FrenetFrame> {
        let s = self.curve.nodes(grid.or(self.grid));
        self.curve.compute_frenet_frame(&s, basis)
    }

    pub fn compute_curvature(&self, grid: Option<usize>) -> FluxResult<Array1<f64>> {
        let s = self.curve.nodes(grid.or(self.grid));
        self.curve.compute_curvature(&s)
    }

    pub fn compute_torsion(&self, grid: Option<usize>) -> FluxResult<Array1<f64>> {
        let s = self.curve.nodes(grid.or(self.grid));
        self.curve.compute_torsion(&s)
    }

    pub fn compute_length(&self, grid: Option<usize>) -> FluxResult<f64> {
        self.curve.compute_length(grid.or(self.grid))
    }

    pub fn translate(&mut self, displacement: [f64; 3]) {
        self.curve.translate(displacement);
    }

    pub fn rotate(&mut self, axis: [f64; 3], angle: f64) -> FluxResult<()> {
        self.curve.rotate(axis, angle)
    }

    pub fn flip(&mut self, normal: [f64; 3]) -> FluxResult<()> {
        self.curve.flip(normal)
    }
}

impl MagneticField for Coil {
    fn compute_magnetic_field(
        &self,
        coords: &Array2<f64>,
        params: &FieldParams,
        basis: CoordBasis,
    ) -> FluxResult<Array2<f64>> {
        check_points("field coordinates", coords)?;
        let xyz = match basis {
            CoordBasis::Xyz => coords.clone(),
            CoordBasis::Rpz => rpz2xyz(coords),
        };
        let current = params.current.unwrap_or(self.current);
        let filament = self.compute_coordinates(params.grid, CoordBasis::Xyz)?;
        let b = biot_savart(&xyz, &filament, current)?;
        Ok(match basis {
            CoordBasis::Xyz => b,
            CoordBasis::Rpz => xyz2rpz_vec(&b, &xyz),
        })
    }
}

/// Ordered collection of coils.
#[derive(Debug, Clone, Default)]
pub struct CoilSet {
    coils: Vec<Coil>,
    name: String,
}

impl CoilSet {
    pub fn new(coils: Vec<Coil>) -> Self {
        CoilSet {
            coils,
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coils(&self) -> &[Coil] {
        &self.coils
    }

    pub fn len(&self) -> usize {
        self.coils.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coils.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Coil> {
        self.coils.get(i)
    }

    pub fn get_mut(&mut self, i: usize) -> Option<&mut Coil> {
        self.coils.get_mut(i)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Coil> {
        self.coils.iter()
    }

    pub fn push(&mut self, coil: Coil) {
        self.coils.push(coil);
    }

    pub fn insert(&mut self, i: usize, coil: Coil) -> FluxResult<()> {
        if i > self.coils.len() {
            return Err(FluxError::ConfigError(format!(
                "cannot insert at {i} into a set of {} coils",
                self.coils.len()
            )));
        }
        self.coils.insert(i, coil);
        Ok(())
    }

    pub fn remove(&mut self, i: usize) -> Option<Coil> {
        (i < self.coils.len()).then(|| self.coils.remove(i))
    }

    /// Members of `other` appended after this set's.
    pub fn extend(&mut self, other: CoilSet) {
        self.coils.extend(other.coils);
    }

    pub fn currents(&self) -> Vec<f64> {
        self.coils.iter().map(Coil::current).collect()
    }

    pub fn set_current(&mut self, current: f64) {
        for coil in &mut self.coils {
            coil.set_current(current);
        }
    }

    pub fn set_currents(&mut self, currents: &[f64]) -> FluxResult<()> {
        self.check_count("currents", currents.len())?;
        for (coil, &c) in self.coils.iter_mut().zip(currents) {
            coil.set_current(c);
        }
        Ok(())
    }

    pub fn set_grid(&mut self, grid: Option<usize>) {
        for coil in &mut self.coils {
            coil.set_grid(grid);
        }
    }

    fn check_count(&self, what: &str, n: usize) -> FluxResult<()> {
        if n == self.coils.len() {
            Ok(())
        } else {
            Err(FluxError::DimensionMismatch(format!(
                "{n} {what} for a set of {} coils",
                self.coils.len()
            )))
        }
    }

    pub fn compute_coordinates(&self, grid: Option<usize>, basis: CoordBasis) -> FluxResult<Vec<Array2<f64>>> {
        self.coils.iter().map(|c| c.compute_coordinates(grid, basis)).collect()
    }

    pub fn compute_frenet_frame(&self, grid: Option<usize>, basis: CoordBasis) -> FluxResult<Vec<FrenetFrame>> {
        self.coils.iter().map(|c| c.compute_frenet_frame(grid, basis)).collect()
    }

    pub fn compute_curvature(&self, grid: Option<usize>) -> FluxResult<Vec<Array1<f64>>> {
        self.coils.iter().map(|c| c.compute_curvature(grid)).collect()
    }

    pub fn compute_torsion(&self, grid: Option<usize>) -> FluxResult<Vec<Array1<f64>>> {
        self.coils.iter().map(|c| c.compute_torsion(grid)).collect()
    }

    pub fn compute_length(&self, grid: Option<usize>) -> FluxResult<Vec<f64>> {
        self.coils.iter().map(|c| c.compute_length(grid)).collect()
    }

    pub fn translate(&mut self, displacement: [f64; 3]) {
        for coil in &mut self.coils {
            coil.translate(displacement);
        }
    }

    pub fn rotate(&mut self, axis: [f64; 3], angle: f64) -> FluxResult<()> {
        self.coils.iter_mut().try_for_each(|c| c.rotate(axis, angle))
    }

    pub fn flip(&mut self, normal: [f64; 3]) -> FluxResult<()> {
        self.coils.iter_mut().try_for_each(|c| c.flip(normal))
    }

    /// Superposed field with one parameter set per member.
    pub fn compute_magnetic_field_each(
        &self,
        coords: &Array2<f64>,
        params: &[FieldParams],
        basis: CoordBasis,
    ) -> FluxResult<Array2<f64>> {
        self.check_count("parameter sets", params.len())?;
        check_points("field coordinates", coords)?;
        let mut total = Array2::zeros((coords.nrows(), 3));
        for (coil, par) in self.coils.iter().zip(params) {
            total += &coil.compute_magnetic_field(coords, par, basis)?;
        }
        Ok(total)
    }

    fn broadcast_currents(current: Option<&[f64]>, base: f64, n: usize) -> FluxResult<Vec<f64>> {
        match current {
            None => Ok(vec![base; n]),
            Some([c]) => Ok(vec![*c; n]),
            Some(c) if c.len() == n => Ok(c.to_vec()),
            Some(c) => Err(FluxError::DimensionMismatch(format!(
                "{} currents for {n} coils",
                c.len()
            ))),
        }
    }

    /// `n` copies of `coil` rotated about `axis`, spread over `angle`.
    pub fn linspaced_angular(
        coil: &Coil,
        current: Option<&[f64]>,
        axis: [f64; 3],
        angle: f64,
        n: usize,
        endpoint: bool,
    ) -> FluxResult<Self> {
        let currents = Self::broadcast_currents(current, coil.current(), n)?;
        let step = angle / (if endpoint { n.saturating_sub(1) } else { n }).max(1) as f64;
        let mut coils = Vec::with_capacity(n);
        for (i, c) in currents.into_iter().enumerate() {
            let mut copy = coil.clone();
            copy.rotate(axis, step * i as f64)?;
            copy.set_current(c);
            coils.push(copy);
        }
        Ok(CoilSet::new(coils))
    }

    /// `n` copies of `coil` translated along `displacement`.
    pub fn linspaced_linear(
        coil: &Coil,
        current: Option<&[f64]>,
        displacement: [f64; 3],
        n: usize,
        endpoint: bool,
    ) -> FluxResult<Self> {
        let currents = Self::broadcast_currents(current, coil.current(), n)?;
        let step = 1.0 / (if endpoint { n.saturating_sub(1) } else { n }).max(1) as f64;
        let mut coils = Vec::with_capacity(n);
        for (i, c) in currents.into_iter().enumerate() {
            let mut copy = coil.clone();
            let f = step * i as f64;
            copy.translate(displacement.map(|d| f * d));
            copy.set_current(c);
            coils.push(copy);
        }
        Ok(CoilSet::new(coils))
    }

    /// Full coil set from the coils of one field period, or of half a period
    /// when `sym` adds the stellarator-symmetric mirror images.
    pub fn from_symmetry(coils: &CoilSet, nfp: usize, sym: bool) -> FluxResult<Self> {
        if nfp == 0 {
            return Err(FluxError::ConfigError("NFP must be positive".to_string()));
        }
        let mut period = coils.clone();
        if sym {
            // mirror through the half-period plane and the midplane, reversed order
            let normal = [-(PI / nfp as f64).sin(), (PI / nfp as f64).cos(), 0.0];
            for coil in coils.coils.iter().rev() {
                let mut mirrored = coil.clone();
                mirrored.flip(normal)?;
                mirrored.flip([0.0, 0.0, 1.0])?;
                mirrored.set_current(-coil.current());
                period.push(mirrored);
            }
        }
        let mut full = CoilSet::default().with_name(coils.name.clone());
        for k in 0..nfp {
            let mut copy = period.clone();
            copy.rotate([0.0, 0.0, 1.0], 2.0 * PI * k as f64 / nfp as f64)?;
            full.extend(copy);
        }
        log::debug!(
            "coil set from symmetry: {} base coils, NFP={nfp}, sym={sym} -> {} coils",
            coils.len(),
            full.len()
        );
        Ok(full)
    }
}

impl MagneticField for CoilSet {
    fn compute_magnetic_field(
        &self,
        coords: &Array2<f64>,
        params: &FieldParams,
        basis: CoordBasis,
    ) -> FluxResult<Array2<f64>> {
        self.compute_magnetic_field_each(coords, &vec![*params; self.len()], basis)
    }
}

impl<'a> IntoIterator for &'a CoilSet {
    type Item = &'a Coil;
    type IntoIter = std::slice::Iter<'a, Coil>;

    fn into_iter(self) -> Self::IntoIter {
        self.coils.iter()
    }
}

impl FromIterator<Coil> for CoilSet {
    fn from_iter<I: IntoIterator<Item = Coil>>(iter: I) -> Self {
        CoilSet::new(iter.into_iter().collect())
    }
}
