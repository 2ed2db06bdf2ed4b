// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Equilibrium Container
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Spectral equilibrium state: bases, coefficients, profiles and boundary.
//!
//! The state vector is x = [R_lmn, Z_lmn, L_lmn]; the per-part vectors and x
//! are kept in sync by every setter.

use std::collections::BTreeSet;
use std::str::FromStr;

use flux_math::basis::{Basis, Deriv, SpectralIndexing, Symmetry};
use flux_math::grid::Grid;
use flux_math::transform::Transform;
use flux_types::config::{ComputeOptions, EquilibriumConfig};
use flux_types::error::{FluxError, FluxResult};
use ndarray::{concatenate, s, Array1, Array2, Axis};

use crate::compute::{self, ComputeInputs, Spectral};
use crate::data::DataMap;
use crate::plan::required_derivatives;
use crate::registry::Source;

/// Where the boundary condition is imposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryMode {
    /// Last closed flux surface ρ = 1, given as (m, n) Fourier modes.
    Lcfs,
    /// Cross section ζ = 0, given as (l, m) Zernike modes.
    Poincare,
}

impl FromStr for BoundaryMode {
    type Err = FluxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lcfs" => Ok(BoundaryMode::Lcfs),
            "poincare" => Ok(BoundaryMode::Poincare),
            other => Err(FluxError::ConfigError(format!(
                "bdry_mode '{other}' is not supported"
            ))),
        }
    }
}

impl BoundaryMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BoundaryMode::Lcfs => "lcfs",
            BoundaryMode::Poincare => "poincare",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Equilibrium {
    psi: f64,
    nfp: usize,
    l: usize,
    m: usize,
    n: usize,
    sym: bool,
    indexing: SpectralIndexing,
    bdry_mode: BoundaryMode,
    profiles: Vec<[f64; 3]>,
    boundary: Vec<[f64; 5]>,

    r_basis: Basis,
    z_basis: Basis,
    l_basis: Basis,
    rb_basis: Basis,
    zb_basis: Basis,
    p_basis: Basis,
    i_basis: Basis,

    r_lmn: Array1<f64>,
    z_lmn: Array1<f64>,
    l_lmn: Array1<f64>,
    rb_lmn: Array1<f64>,
    zb_lmn: Array1<f64>,
    p_l: Array1<f64>,
    i_l: Array1<f64>,
}

/// Exact non-negative integer stored in a float input column.
fn mode_number(value: f64, what: &str) -> FluxResult<i32> {
    if value.fract() != 0.0 || !value.is_finite() || value.abs() > i32::MAX as f64 {
        return Err(FluxError::ConfigError(format!(
            "{what} must be an integer, got {value}"
        )));
    }
    Ok(value as i32)
}

fn check_len(what: &str, got: usize, expected: usize) -> FluxResult<()> {
    if got == expected {
        Ok(())
    } else {
        Err(FluxError::DimensionMismatch(format!(
            "{what} has {got} coefficients, basis has {expected}"
        )))
    }
}

/// Spectral bases of one resolution.
struct Bases {
    r: Basis,
    z: Basis,
    l: Basis,
    rb: Basis,
    zb: Basis,
    p: Basis,
    i: Basis,
}

impl Equilibrium {
    pub fn new(config: &EquilibriumConfig) -> FluxResult<Self> {
        if !config.psi.is_finite() {
            return Err(FluxError::ConfigError(format!(
                "Psi must be finite, got {}",
                config.psi
            )));
        }
        if config.nfp == 0 {
            return Err(FluxError::ConfigError("NFP must be positive".to_string()));
        }
        if config.profiles.is_empty() {
            return Err(FluxError::ConfigError("profiles must not be empty".to_string()));
        }
        if config.boundary.is_empty() {
            return Err(FluxError::ConfigError("boundary must not be empty".to_string()));
        }
        let indexing = SpectralIndexing::from_str(&config.spectral_indexing)?;
        let bdry_mode = BoundaryMode::from_str(&config.bdry_mode)?;

        let bases = Self::make_bases(
            config.l,
            config.m,
            config.n,
            config.nfp,
            config.sym,
            indexing,
            &config.profiles,
            &config.boundary,
        )?;
        let (p_l, i_l) = format_profiles(&config.profiles, &bases.p, &bases.i)?;
        let (rb_lmn, zb_lmn) = format_boundary(&config.boundary, &bases.rb, &bases.zb, bdry_mode)?;

        let (nr, nz, nl) = (bases.r.num_modes(), bases.z.num_modes(), bases.l.num_modes());
        let (r_lmn, z_lmn, l_lmn) = match &config.x {
            Some(x) => {
                check_len("x", x.len(), nr + nz + nl)?;
                let x = Array1::from_vec(x.clone());
                (
                    x.slice(s![..nr]).to_owned(),
                    x.slice(s![nr..nr + nz]).to_owned(),
                    x.slice(s![nr + nz..]).to_owned(),
                )
            }
            None => {
                let axis: Vec<[f64; 3]> = match &config.axis {
                    Some(axis) => axis.clone(),
                    None => config
                        .boundary
                        .iter()
                        .filter(|row| row[1] == 0.0)
                        .map(|row| [row[2], row[3], row[4]])
                        .collect(),
                };
                let axis_r: Vec<(f64, f64)> = axis.iter().map(|a| (a[0], a[1])).collect();
                let axis_z: Vec<(f64, f64)> = axis.iter().map(|a| (a[0], a[2])).collect();
                let r = match &config.r_lmn {
                    Some(r) => {
                        check_len("R_lmn", r.len(), nr)?;
                        Array1::from_vec(r.clone())
                    }
                    None => initial_guess(&bases.r, &rb_lmn, &bases.rb, &axis_r, bdry_mode),
                };
                let z = match &config.z_lmn {
                    Some(z) => {
                        check_len("Z_lmn", z.len(), nz)?;
                        Array1::from_vec(z.clone())
                    }
                    None => initial_guess(&bases.z, &zb_lmn, &bases.zb, &axis_z, bdry_mode),
                };
                let l = match &config.l_lmn {
                    Some(l) => {
                        check_len("L_lmn", l.len(), nl)?;
                        Array1::from_vec(l.clone())
                    }
                    None => Array1::zeros(nl),
                };
                (r, z, l)
            }
        };

        log::debug!(
            "equilibrium: L={} M={} N={} NFP={}, {} + {} + {} coefficients",
            config.l,
            config.m,
            config.n,
            config.nfp,
            nr,
            nz,
            nl
        );

        Ok(Equilibrium {
            psi: config.psi,
            nfp: config.nfp,
            l: config.l,
            m: config.m,
            n: config.n,
            sym: config.sym,
            indexing,
            bdry_mode,
            profiles: config.profiles.clone(),
            boundary: config.boundary.clone(),
            r_basis: bases.r,
            z_basis: bases.z,
            l_basis: bases.l,
            rb_basis: bases.rb,
            zb_basis: bases.zb,
            p_basis: bases.p,
            i_basis: bases.i,
            r_lmn,
            z_lmn,
            l_lmn,
            rb_lmn,
            zb_lmn,
            p_l,
            i_l,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn make_bases(
        l: usize,
        m: usize,
        n: usize,
        nfp: usize,
        sym: bool,
        indexing: SpectralIndexing,
        profiles: &[[f64; 3]],
        boundary: &[[f64; 5]],
    ) -> FluxResult<Bases> {
        let (r_sym, z_sym) = if sym {
            (Symmetry::Cos, Symmetry::Sin)
        } else {
            (Symmetry::None, Symmetry::None)
        };

        let (rb, zb) = if boundary.iter().all(|row| row[0] == 0.0) {
            (
                Basis::double_fourier(m, n, nfp, r_sym),
                Basis::double_fourier(m, n, nfp, z_sym),
            )
        } else if boundary.iter().all(|row| row[2] == 0.0) {
            (
                Basis::zernike(l, m, r_sym, indexing),
                Basis::zernike(l, m, z_sym, indexing),
            )
        } else {
            return Err(FluxError::ConfigError(
                "boundary modes must all have l = 0 or all have n = 0".to_string(),
            ));
        };

        let nonzero = boundary.iter().filter(|row| row[3] != 0.0 || row[4] != 0.0);
        let (bl, bm, bn) = nonzero.fold((0, 0, 0), |(bl, bm, bn), row| {
            (
                bl.max(row[0].abs() as usize),
                bm.max(row[1].abs() as usize),
                bn.max(row[2].abs() as usize),
            )
        });
        if bl > l || bm > m || bn > n {
            log::warn!(
                "resolution L,M,N={l},{m},{n} does not fully resolve the boundary inputs \
                 (boundary resolution L,M,N={bl},{bm},{bn})"
            );
        }

        let mut profile_l = l;
        for row in profiles {
            profile_l = profile_l.max(mode_number(row[0], "profile mode l")?.max(0) as usize);
        }

        Ok(Bases {
            r: Basis::fourier_zernike(l, m, n, nfp, r_sym, indexing),
            z: Basis::fourier_zernike(l, m, n, nfp, z_sym, indexing),
            l: Basis::fourier_zernike(l, m, n, nfp, z_sym, indexing),
            rb,
            zb,
            p: Basis::power_series(profile_l),
            i: Basis::power_series(profile_l),
        })
    }

    /// Change the spectral resolution, carrying over coefficients of modes
    /// present in both bases. Profile and boundary modes newly in range are
    /// taken from the original inputs.
    pub fn change_resolution(
        &mut self,
        l: Option<usize>,
        m: Option<usize>,
        n: Option<usize>,
    ) -> FluxResult<()> {
        let (l, m, n) = (l.unwrap_or(self.l), m.unwrap_or(self.m), n.unwrap_or(self.n));
        if (l, m, n) == (self.l, self.m, self.n) {
            return Ok(());
        }
        let bases = Self::make_bases(
            l,
            m,
            n,
            self.nfp,
            self.sym,
            self.indexing,
            &self.profiles,
            &self.boundary,
        )?;

        let (full_p, full_i) = format_profiles(&self.profiles, &bases.p, &bases.i)?;
        let (full_rb, full_zb) = format_boundary(&self.boundary, &bases.rb, &bases.zb, self.bdry_mode)?;

        self.p_l = copy_coeffs(&self.p_l, self.p_basis.modes(), bases.p.modes(), Some(full_p));
        self.i_l = copy_coeffs(&self.i_l, self.i_basis.modes(), bases.i.modes(), Some(full_i));
        self.rb_lmn = copy_coeffs(&self.rb_lmn, self.rb_basis.modes(), bases.rb.modes(), Some(full_rb));
        self.zb_lmn = copy_coeffs(&self.zb_lmn, self.zb_basis.modes(), bases.zb.modes(), Some(full_zb));
        self.r_lmn = copy_coeffs(&self.r_lmn, self.r_basis.modes(), bases.r.modes(), None);
        self.z_lmn = copy_coeffs(&self.z_lmn, self.z_basis.modes(), bases.z.modes(), None);
        self.l_lmn = copy_coeffs(&self.l_lmn, self.l_basis.modes(), bases.l.modes(), None);

        self.r_basis = bases.r;
        self.z_basis = bases.z;
        self.l_basis = bases.l;
        self.rb_basis = bases.rb;
        self.zb_basis = bases.zb;
        self.p_basis = bases.p;
        self.i_basis = bases.i;
        log::debug!(
            "equilibrium resolution {},{},{} -> {l},{m},{n}",
            self.l,
            self.m,
            self.n
        );
        self.l = l;
        self.m = m;
        self.n = n;
        Ok(())
    }

    // ── State vector ────────────────────────────────────────────────

    /// x = [R_lmn, Z_lmn, L_lmn].
    pub fn x(&self) -> Array1<f64> {
        concatenate![Axis(0), self.r_lmn, self.z_lmn, self.l_lmn]
    }

    pub fn set_x(&mut self, x: &Array1<f64>) -> FluxResult<()> {
        let (nr, nz, nl) = (
            self.r_basis.num_modes(),
            self.z_basis.num_modes(),
            self.l_basis.num_modes(),
        );
        check_len("x", x.len(), nr + nz + nl)?;
        self.r_lmn = x.slice(s![..nr]).to_owned();
        self.z_lmn = x.slice(s![nr..nr + nz]).to_owned();
        self.l_lmn = x.slice(s![nr + nz..]).to_owned();
        Ok(())
    }

    pub fn set_r_lmn(&mut self, r_lmn: Array1<f64>) -> FluxResult<()> {
        check_len("R_lmn", r_lmn.len(), self.r_basis.num_modes())?;
        self.r_lmn = r_lmn;
        Ok(())
    }

    pub fn set_z_lmn(&mut self, z_lmn: Array1<f64>) -> FluxResult<()> {
        check_len("Z_lmn", z_lmn.len(), self.z_basis.num_modes())?;
        self.z_lmn = z_lmn;
        Ok(())
    }

    pub fn set_l_lmn(&mut self, l_lmn: Array1<f64>) -> FluxResult<()> {
        check_len("L_lmn", l_lmn.len(), self.l_basis.num_modes())?;
        self.l_lmn = l_lmn;
        Ok(())
    }

    pub fn set_p_l(&mut self, p_l: Array1<f64>) -> FluxResult<()> {
        check_len("p_l", p_l.len(), self.p_basis.num_modes())?;
        self.p_l = p_l;
        Ok(())
    }

    pub fn set_i_l(&mut self, i_l: Array1<f64>) -> FluxResult<()> {
        check_len("i_l", i_l.len(), self.i_basis.num_modes())?;
        self.i_l = i_l;
        Ok(())
    }

    pub fn set_psi(&mut self, psi: f64) {
        self.psi = psi;
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn psi(&self) -> f64 {
        self.psi
    }
    pub fn nfp(&self) -> usize {
        self.nfp
    }
    pub fn l(&self) -> usize {
        self.l
    }
    pub fn m(&self) -> usize {
        self.m
    }
    pub fn n(&self) -> usize {
        self.n
    }
    pub fn sym(&self) -> bool {
        self.sym
    }
    pub fn spectral_indexing(&self) -> SpectralIndexing {
        self.indexing
    }
    pub fn bdry_mode(&self) -> BoundaryMode {
        self.bdry_mode
    }
    pub fn r_basis(&self) -> &Basis {
        &self.r_basis
    }
    pub fn z_basis(&self) -> &Basis {
        &self.z_basis
    }
    pub fn l_basis(&self) -> &Basis {
        &self.l_basis
    }
    pub fn rb_basis(&self) -> &Basis {
        &self.rb_basis
    }
    pub fn zb_basis(&self) -> &Basis {
        &self.zb_basis
    }
    pub fn p_basis(&self) -> &Basis {
        &self.p_basis
    }
    pub fn i_basis(&self) -> &Basis {
        &self.i_basis
    }
    pub fn r_lmn(&self) -> &Array1<f64> {
        &self.r_lmn
    }
    pub fn z_lmn(&self) -> &Array1<f64> {
        &self.z_lmn
    }
    pub fn l_lmn(&self) -> &Array1<f64> {
        &self.l_lmn
    }
    pub fn rb_lmn(&self) -> &Array1<f64> {
        &self.rb_lmn
    }
    pub fn zb_lmn(&self) -> &Array1<f64> {
        &self.zb_lmn
    }
    pub fn p_l(&self) -> &Array1<f64> {
        &self.p_l
    }
    pub fn i_l(&self) -> &Array1<f64> {
        &self.i_l
    }

    /// Configuration that rebuilds this equilibrium, state vector included.
    pub fn to_config(&self) -> EquilibriumConfig {
        EquilibriumConfig {
            psi: self.psi,
            nfp: self.nfp,
            l: self.l,
            m: self.m,
            n: self.n,
            profiles: self.profiles.clone(),
            boundary: self.boundary.clone(),
            sym: self.sym,
            spectral_indexing: match self.indexing {
                SpectralIndexing::Ansi => "ansi".to_string(),
                SpectralIndexing::Fringe => "fringe".to_string(),
            },
            bdry_mode: self.bdry_mode.as_str().to_string(),
            axis: None,
            x: Some(self.x().to_vec()),
            r_lmn: None,
            z_lmn: None,
            l_lmn: None,
        }
    }

    // ── Evaluation ──────────────────────────────────────────────────

    /// R and Z of the magnetic axis on the given toroidal planes.
    pub fn axis_location(&self, zeta: &[f64]) -> FluxResult<(Array1<f64>, Array1<f64>)> {
        let mut nodes = Array2::zeros((zeta.len(), 3));
        nodes.column_mut(2).assign(&Array1::from_vec(zeta.to_vec()));
        let r = self.r_basis.evaluate(&nodes, [0, 0, 0])?.dot(&self.r_lmn);
        let z = self.z_basis.evaluate(&nodes, [0, 0, 0])?.dot(&self.z_lmn);
        Ok((r, z))
    }

    /// Evaluate `keys` on `grid` with default options.
    pub fn compute<S: AsRef<str>>(&self, keys: &[S], grid: &Grid) -> FluxResult<DataMap> {
        let mut data = DataMap::new();
        self.compute_with(keys, grid, ComputeOptions::default(), &mut data)?;
        Ok(data)
    }

    /// Evaluate `keys` into `data`, building only the transforms and
    /// derivative orders the request needs. Keys already in `data` are kept.
    pub fn compute_with<S: AsRef<str>>(
        &self,
        keys: &[S],
        grid: &Grid,
        options: ComputeOptions,
        data: &mut DataMap,
    ) -> FluxResult<()> {
        let required = required_derivatives(keys, grid.has_axis())?;
        let derivs = |source: Source| -> Vec<Deriv> {
            required
                .get(&source)
                .map(|set: &BTreeSet<Deriv>| set.iter().copied().collect())
                .unwrap_or_default()
        };

        let sources = [
            (Source::R, &self.r_basis, &self.r_lmn),
            (Source::Z, &self.z_basis, &self.z_lmn),
            (Source::Lambda, &self.l_basis, &self.l_lmn),
            (Source::Pressure, &self.p_basis, &self.p_l),
            (Source::Iota, &self.i_basis, &self.i_l),
        ];
        let mut transforms = Vec::new();
        for (source, basis, coeffs) in sources {
            if required.contains_key(&source) {
                transforms.push((source, Transform::new(grid, basis, &derivs(source))?, coeffs));
            }
        }

        let mut inputs = ComputeInputs::new(self.psi, grid, options);
        for (source, transform, coeffs) in &transforms {
            inputs = inputs.with_source(*source, Spectral::new(coeffs, transform)?)?;
        }
        compute::compute(keys, &inputs, data)
    }
}

/// Profile coefficients by power l.
fn format_profiles(
    profiles: &[[f64; 3]],
    p_basis: &Basis,
    i_basis: &Basis,
) -> FluxResult<(Array1<f64>, Array1<f64>)> {
    let mut p_l = Array1::zeros(p_basis.num_modes());
    let mut i_l = Array1::zeros(i_basis.num_modes());
    for row in profiles {
        let l = mode_number(row[0], "profile mode l")?;
        if let Some(k) = p_basis.get_idx(l, 0, 0) {
            p_l[k] = row[1];
        }
        if let Some(k) = i_basis.get_idx(l, 0, 0) {
            i_l[k] = row[2];
        }
    }
    Ok((p_l, i_l))
}

/// Boundary coefficients on their bases: rows `[l, m, n, Rb, Zb]` match on
/// (m, n) for the last closed surface and on (l, m) for the cross section.
fn format_boundary(
    boundary: &[[f64; 5]],
    rb_basis: &Basis,
    zb_basis: &Basis,
    mode: BoundaryMode,
) -> FluxResult<(Array1<f64>, Array1<f64>)> {
    let mut rb = Array1::zeros(rb_basis.num_modes());
    let mut zb = Array1::zeros(zb_basis.num_modes());
    for row in boundary {
        let l = mode_number(row[0], "boundary mode l")?;
        let m = mode_number(row[1], "boundary mode m")?;
        let n = mode_number(row[2], "boundary mode n")?;
        let hit = |basis_mode: &[i32; 3]| match mode {
            BoundaryMode::Lcfs => basis_mode[1] == m && basis_mode[2] == n,
            BoundaryMode::Poincare => basis_mode[0] == l && basis_mode[1] == m,
        };
        for (k, basis_mode) in rb_basis.modes().iter().enumerate() {
            if hit(basis_mode) {
                rb[k] = row[3];
            }
        }
        for (k, basis_mode) in zb_basis.modes().iter().enumerate() {
            if hit(basis_mode) {
                zb[k] = row[4];
            }
        }
    }
    Ok((rb, zb))
}

/// Interior coefficients from the boundary. On the last closed surface each
/// (m, n) mode goes to the lowest radial order ρ^|m|; m = 0 modes are split
/// between the axis value and a ρ² term that reaches the boundary value.
fn initial_guess(
    x_basis: &Basis,
    b_lmn: &Array1<f64>,
    b_basis: &Basis,
    axis: &[(f64, f64)],
    mode: BoundaryMode,
) -> Array1<f64> {
    let mut x = Array1::zeros(x_basis.num_modes());
    for (k, &[l, m, n]) in b_basis.modes().iter().enumerate() {
        let b = b_lmn[k];
        match mode {
            BoundaryMode::Lcfs => {
                let idx = x_basis.get_idx(m.abs(), m, n);
                if m == 0 {
                    let x0 = axis
                        .iter()
                        .find(|(an, _)| *an == f64::from(n))
                        .map_or(b, |&(_, value)| value);
                    if let Some(i) = idx {
                        x[i] = x0;
                    }
                    if let Some(i) = x_basis.get_idx(2, 0, n) {
                        x[i] = b - x0;
                    }
                } else if let Some(i) = idx {
                    x[i] = b;
                }
            }
            BoundaryMode::Poincare => {
                if let Some(i) = x_basis.get_idx(l, m, n) {
                    x[i] = b;
                }
            }
        }
    }
    x
}

/// Coefficients of `old` re-indexed onto `new_modes`; modes without a
/// counterpart keep the value in `base` (zero when absent).
fn copy_coeffs(
    old: &Array1<f64>,
    old_modes: &[[i32; 3]],
    new_modes: &[[i32; 3]],
    base: Option<Array1<f64>>,
) -> Array1<f64> {
    let mut out = base.unwrap_or_else(|| Array1::zeros(new_modes.len()));
    for (k, mode) in new_modes.iter().enumerate() {
        if let Some(j) = old_modes.iter().position(|m| m == mode) {
            out[k] = old[j];
        }
    }
    out
}
