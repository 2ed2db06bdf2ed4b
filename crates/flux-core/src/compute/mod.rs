// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Compute Pipeline
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Spectral coefficients → geometry and physics on a grid.
//!
//! Each submodule registers one family of quantities. Registration order is
//! evaluation order:
//!
//! profiles → coordinates → covariant basis → Jacobian → metric and
//! contravariant basis → contravariant B → covariant B → |B| → current →
//! force, pressure gradient, tension → quasisymmetry → Boozer spectrum →
//! energy, volume.
//!
//! Vectors are stored as (R, φ, Z) components in the local cylindrical frame.
//! Their derivatives are component-wise, which is what every scalar product
//! formed from them needs.

pub mod boozer;
pub mod current;
pub mod energy;
pub mod field;
pub mod force;
pub mod geometry;
pub mod profiles;
pub mod quasisymmetry;

use flux_math::basis::Deriv;
use flux_math::grid::Grid;
use flux_math::special::binomial;
use flux_math::transform::Transform;
use flux_types::config::ComputeOptions;
use flux_types::error::{FluxError, FluxResult};
use ndarray::{Array1, Array2, Zip};

use crate::data::DataMap;
use crate::plan::{Availability, Plan};
use crate::registry::{Registry, Source};

/// Coefficients paired with the transform that evaluates them.
#[derive(Debug, Clone, Copy)]
pub struct Spectral<'a> {
    pub coeffs: &'a Array1<f64>,
    pub transform: &'a Transform<'a>,
}

impl<'a> Spectral<'a> {
    pub fn new(coeffs: &'a Array1<f64>, transform: &'a Transform<'a>) -> FluxResult<Self> {
        if coeffs.len() != transform.basis().num_modes() {
            return Err(FluxError::DimensionMismatch(format!(
                "{} coefficients for a basis of {} modes",
                coeffs.len(),
                transform.basis().num_modes()
            )));
        }
        Ok(Spectral { coeffs, transform })
    }

    pub fn eval(&self, d: Deriv) -> FluxResult<Array1<f64>> {
        self.transform.transform(self.coeffs, d)
    }
}

/// Everything a quantity may read besides previously computed quantities.
#[derive(Debug, Clone)]
pub struct ComputeInputs<'a> {
    /// Total toroidal flux (Wb).
    pub psi: f64,
    pub grid: &'a Grid,
    pub options: ComputeOptions,
    sources: [Option<Spectral<'a>>; 5],
}

fn slot(source: Source) -> usize {
    match source {
        Source::R => 0,
        Source::Z => 1,
        Source::Lambda => 2,
        Source::Pressure => 3,
        Source::Iota => 4,
    }
}

impl<'a> ComputeInputs<'a> {
    pub fn new(psi: f64, grid: &'a Grid, options: ComputeOptions) -> Self {
        ComputeInputs {
            psi,
            grid,
            options,
            sources: [None; 5],
        }
    }

    /// Attach a source; its transform must live on this grid's nodes.
    pub fn with_source(mut self, source: Source, spectral: Spectral<'a>) -> FluxResult<Self> {
        let nodes = spectral.transform.grid().num_nodes();
        if nodes != self.grid.num_nodes() {
            return Err(FluxError::DimensionMismatch(format!(
                "{source:?} transform has {nodes} nodes, grid has {}",
                self.grid.num_nodes()
            )));
        }
        self.sources[slot(source)] = Some(spectral);
        Ok(self)
    }

    pub fn spectral(&self, source: Source) -> FluxResult<&Spectral<'a>> {
        self.sources[slot(source)].as_ref().ok_or_else(|| {
            FluxError::ConfigError(format!("no {source:?} transform was supplied"))
        })
    }

    pub fn availability(&self) -> Availability {
        Source::ALL
            .iter()
            .fold(Availability::new(self.grid.has_axis()), |avail, &source| {
                match &self.sources[slot(source)] {
                    Some(s) => avail.with(source, s.transform.derivatives().copied()),
                    None => avail,
                }
            })
    }
}

/// Plan `keys` against the supplied transforms and evaluate into `data`.
pub fn compute<S: AsRef<str>>(
    keys: &[S],
    inputs: &ComputeInputs<'_>,
    data: &mut DataMap,
) -> FluxResult<()> {
    inputs.options.validate()?;
    Plan::new(keys, &inputs.availability())?.execute(inputs, data)
}

pub(crate) fn register_all(reg: &mut Registry) {
    profiles::register(reg);
    geometry::register(reg);
    field::register(reg);
    current::register(reg);
    force::register(reg);
    quasisymmetry::register(reg);
    boozer::register(reg);
    energy::register(reg);
}

// ── Derivative multi-index helpers ───────────────────────────────────

pub(crate) const D0: Deriv = [0, 0, 0];
pub(crate) const DR: Deriv = [1, 0, 0];
pub(crate) const DT: Deriv = [0, 1, 0];
pub(crate) const DZ: Deriv = [0, 0, 1];

pub(crate) fn add(a: Deriv, b: Deriv) -> Deriv {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// a - b for b ≤ a.
pub(crate) fn sub(a: Deriv, b: Deriv) -> Deriv {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Every β ≤ d component-wise, d itself last.
pub(crate) fn lower(d: Deriv) -> Vec<Deriv> {
    let mut out = Vec::new();
    for r in 0..=d[0] {
        for t in 0..=d[1] {
            for z in 0..=d[2] {
                out.push([r, t, z]);
            }
        }
    }
    out
}

/// Product of per-direction binomials C(d, β).
pub(crate) fn binom(d: Deriv, b: Deriv) -> f64 {
    (0..3)
        .map(|i| binomial(d[i] as usize, b[i] as usize))
        .product()
}

/// Splits d = a + b + c with their multinomial weights.
pub(crate) fn splits3(d: Deriv) -> Vec<(Deriv, Deriv, Deriv, f64)> {
    let mut out = Vec::new();
    for a in lower(d) {
        let rest = sub(d, a);
        for b in lower(rest) {
            let c = sub(rest, b);
            out.push((a, b, c, binom(d, a) * binom(rest, b)));
        }
    }
    out
}

// ── Row-wise vector algebra on (n, 3) arrays ─────────────────────────

pub(crate) fn dot(a: &Array2<f64>, b: &Array2<f64>) -> Array1<f64> {
    (a * b).sum_axis(ndarray::Axis(1))
}

pub(crate) fn cross(a: &Array2<f64>, b: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::zeros(a.raw_dim());
    Zip::from(out.rows_mut())
        .and(a.rows())
        .and(b.rows())
        .for_each(|mut o, u, v| {
            o[0] = u[1] * v[2] - u[2] * v[1];
            o[1] = u[2] * v[0] - u[0] * v[2];
            o[2] = u[0] * v[1] - u[1] * v[0];
        });
    out
}

/// Row i of `v` scaled by s[i].
pub(crate) fn scale(v: &Array2<f64>, s: &Array1<f64>) -> Array2<f64> {
    v * &s.view().insert_axis(ndarray::Axis(1))
}

pub(crate) fn norm(v: &Array2<f64>) -> Array1<f64> {
    dot(v, v).mapv(f64::sqrt)
}

/// Assemble (n, 3) from three component columns.
pub(crate) fn stack(c0: &Array1<f64>, c1: &Array1<f64>, c2: &Array1<f64>) -> Array2<f64> {
    let mut out = Array2::zeros((c0.len(), 3));
    out.column_mut(0).assign(c0);
    out.column_mut(1).assign(c1);
    out.column_mut(2).assign(c2);
    out
}

#[cfg(test)]
pub(crate) mod testing {
    //! Analytic fixtures shared by the family tests.

    use super::*;
    use flux_math::basis::{Basis, SpectralIndexing, Symmetry};
    use flux_math::grid::{ConcentricGridOptions, LinearGridOptions};

    /// Circular tokamak: R = R0 + aρ cos θ, Z = -aρ sin θ, λ = 0, p = p0(1-ρ²),
    /// constant ι.
    pub struct Circular {
        pub r0: f64,
        pub a: f64,
        pub psi: f64,
        pub iota: f64,
        pub basis: Basis,
        pub profile_basis: Basis,
        pub r: Array1<f64>,
        pub z: Array1<f64>,
        pub l: Array1<f64>,
        pub p: Array1<f64>,
        pub i: Array1<f64>,
    }

    impl Circular {
        pub fn new(r0: f64, a: f64, iota: f64, p0: f64) -> Self {
            let basis = Basis::fourier_zernike(2, 2, 0, 1, Symmetry::None, SpectralIndexing::Ansi);
            let profile_basis = Basis::power_series(2);
            let mut r = Array1::zeros(basis.num_modes());
            let mut z = Array1::zeros(basis.num_modes());
            let idx = |l, m| basis.get_idx(l, m, 0).expect("mode");
            r[idx(0, 0)] = r0;
            r[idx(1, 1)] = a;
            z[idx(1, -1)] = -a;
            let l = Array1::zeros(basis.num_modes());
            let mut p = Array1::zeros(3);
            p[0] = p0;
            p[2] = -p0;
            let mut i = Array1::zeros(3);
            i[0] = iota;
            Circular {
                r0,
                a,
                psi: 1.0,
                iota,
                basis,
                profile_basis,
                r,
                z,
                l,
                p,
                i,
            }
        }

        /// Evaluate `keys` on `grid` with transforms of the given order.
        pub fn compute(&self, grid: &Grid, keys: &[&str], order: u8) -> FluxResult<DataMap> {
            let geo = Transform::with_order(grid, &self.basis, order)?;
            let prof = Transform::new(grid, &self.profile_basis, &[[1, 0, 0], [2, 0, 0]])?;
            let inputs = ComputeInputs::new(self.psi, grid, ComputeOptions::default())
                .with_source(Source::R, Spectral::new(&self.r, &geo)?)?
                .with_source(Source::Z, Spectral::new(&self.z, &geo)?)?
                .with_source(Source::Lambda, Spectral::new(&self.l, &geo)?)?
                .with_source(Source::Pressure, Spectral::new(&self.p, &prof)?)?
                .with_source(Source::Iota, Spectral::new(&self.i, &prof)?)?;
            let mut data = DataMap::new();
            compute(keys, &inputs, &mut data)?;
            Ok(data)
        }
    }

    pub fn interior_grid() -> Grid {
        Grid::linear(LinearGridOptions {
            rho: vec![0.3, 0.6, 0.9],
            theta: vec![0.1, 1.2, 2.5, 4.0, 5.5],
            zeta: vec![0.0, 0.7],
            ..Default::default()
        })
        .expect("grid")
    }

    pub fn axis_grid() -> Grid {
        let mut opts = ConcentricGridOptions::new(6, 6, 1);
        opts.axis = true;
        Grid::concentric(opts).expect("grid")
    }
}
