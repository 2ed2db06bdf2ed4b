// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Spectral Transforms
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Spectral ↔ nodal transforms.
//!
//! A `Transform` pairs a grid with a basis and caches one collocation matrix
//! per requested derivative, so that `∂^d f(nodes) = A_d · c`.

use std::collections::BTreeMap;

use flux_types::error::{FluxError, FluxResult};
use ndarray::{Array1, Array2};

use crate::basis::{Basis, Deriv};
use crate::grid::Grid;
use crate::linalg::lstsq;

/// Every derivative (dr, dt, dz) with dr + dt + dz ≤ order.
pub fn derivatives_up_to(order: u8) -> Vec<Deriv> {
    let mut out = Vec::new();
    for total in 0..=order {
        for dr in (0..=total).rev() {
            for dt in (0..=(total - dr)).rev() {
                out.push([dr, dt, total - dr - dt]);
            }
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct Transform<'a> {
    grid: &'a Grid,
    basis: &'a Basis,
    matrices: BTreeMap<Deriv, Array2<f64>>,
}

impl<'a> Transform<'a> {
    /// Build matrices for `derivs`; the plain value [0, 0, 0] is always included.
    pub fn new(grid: &'a Grid, basis: &'a Basis, derivs: &[Deriv]) -> FluxResult<Self> {
        let mut matrices = BTreeMap::new();
        matrices.insert([0, 0, 0], basis.evaluate(grid.nodes(), [0, 0, 0])?);
        for &d in derivs {
            if !matrices.contains_key(&d) {
                matrices.insert(d, basis.evaluate(grid.nodes(), d)?);
            }
        }
        log::debug!(
            "transform: {} nodes × {} modes, {} derivative matrices",
            grid.num_nodes(),
            basis.num_modes(),
            matrices.len()
        );
        Ok(Transform {
            grid,
            basis,
            matrices,
        })
    }

    pub fn with_order(grid: &'a Grid, basis: &'a Basis, order: u8) -> FluxResult<Self> {
        Self::new(grid, basis, &derivatives_up_to(order))
    }

    pub fn grid(&self) -> &'a Grid {
        self.grid
    }

    pub fn basis(&self) -> &'a Basis {
        self.basis
    }

    pub fn derivatives(&self) -> impl Iterator<Item = &Deriv> {
        self.matrices.keys()
    }

    pub fn supports(&self, d: Deriv) -> bool {
        self.matrices.contains_key(&d)
    }

    pub fn matrix(&self, d: Deriv) -> Option<&Array2<f64>> {
        self.matrices.get(&d)
    }

    /// Nodal values of ∂^d of the series with coefficients `coeffs`.
    pub fn transform(&self, coeffs: &Array1<f64>, d: Deriv) -> FluxResult<Array1<f64>> {
        let matrix = self.matrices.get(&d).ok_or(FluxError::UnsupportedDerivative {
            dr: d[0],
            dt: d[1],
            dz: d[2],
        })?;
        if coeffs.len() != matrix.ncols() {
            return Err(FluxError::DimensionMismatch(format!(
                "transform: basis has {} modes but {} coefficients given",
                matrix.ncols(),
                coeffs.len()
            )));
        }
        Ok(matrix.dot(coeffs))
    }

    /// Least-squares coefficients reproducing nodal `values`; the
    /// minimum-norm coefficients when the grid underdetermines the basis.
    pub fn fit(&self, values: &Array1<f64>) -> FluxResult<Array1<f64>> {
        let matrix = &self.matrices[&[0, 0, 0]];
        if values.len() != matrix.nrows() {
            return Err(FluxError::DimensionMismatch(format!(
                "fit: grid has {} nodes but {} values given",
                matrix.nrows(),
                values.len()
            )));
        }
        if matrix.ncols() == 0 {
            return Ok(Array1::zeros(0));
        }
        lstsq(matrix, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::{SpectralIndexing, Symmetry};
    use crate::grid::ConcentricGridOptions;

    fn concentric(l: usize, m: usize, n: usize) -> Grid {
        let mut opts = ConcentricGridOptions::new(l, m, n);
        opts.axis = true;
        Grid::concentric(opts).expect("grid")
    }

    #[test]
    fn test_derivative_enumeration() {
        assert_eq!(derivatives_up_to(0), vec![[0, 0, 0]]);
        assert_eq!(derivatives_up_to(1).len(), 4);
        assert_eq!(derivatives_up_to(2).len(), 10);
        assert_eq!(derivatives_up_to(3).len(), 20);
    }

    #[test]
    fn test_fit_recovers_coefficients() {
        let grid = concentric(6, 6, 2);
        let basis = Basis::fourier_zernike(4, 4, 1, 1, Symmetry::None, SpectralIndexing::Ansi);
        let tf = Transform::new(&grid, &basis, &[]).expect("transform");
        let coeffs = Array1::from_iter((0..basis.num_modes()).map(|k| ((k * 7) % 5) as f64 - 2.0));
        let values = tf.transform(&coeffs, [0, 0, 0]).expect("values");
        let fitted = tf.fit(&values).expect("fit");
        for (a, b) in fitted.iter().zip(coeffs.iter()) {
            assert!((a - b).abs() < 1e-9, "{a} vs {b}");
        }
    }

    #[test]
    fn test_fit_on_coarse_grid_interpolates() {
        // fewer nodes than modes: the fit still reproduces the nodal values
        let grid = concentric(2, 2, 0);
        let basis = Basis::fourier_zernike(6, 6, 0, 1, Symmetry::None, SpectralIndexing::Ansi);
        assert!(grid.num_nodes() < basis.num_modes());
        let tf = Transform::new(&grid, &basis, &[]).expect("transform");
        let values = Array1::from_iter(grid.rho().iter().zip(grid.theta().iter()).map(|(r, t)| 1.0 + r * t.cos()));
        let fitted = tf.fit(&values).expect("fit");
        let back = tf.transform(&fitted, [0, 0, 0]).expect("values");
        for (a, b) in back.iter().zip(values.iter()) {
            assert!((a - b).abs() < 1e-10, "{a} vs {b}");
        }
    }

    #[test]
    fn test_unrequested_derivative_rejected() {
        let grid = concentric(2, 2, 0);
        let basis = Basis::zernike(2, 2, Symmetry::Cos, SpectralIndexing::Ansi);
        let tf = Transform::with_order(&grid, &basis, 1).expect("transform");
        assert!(tf.supports([1, 0, 0]));
        let coeffs = Array1::zeros(basis.num_modes());
        match tf.transform(&coeffs, [2, 0, 0]) {
            Err(FluxError::UnsupportedDerivative { dr: 2, dt: 0, dz: 0 }) => {}
            other => panic!("Expected UnsupportedDerivative, got {other:?}"),
        }
        assert!(tf.transform(&Array1::zeros(1), [0, 0, 0]).is_err());
    }

    #[test]
    fn test_radial_derivative_of_disk_map() {
        // R = 3 + ρ cos θ, so ∂ρ R = cos θ everywhere.
        let grid = concentric(4, 4, 0);
        let basis = Basis::zernike(2, 2, Symmetry::Cos, SpectralIndexing::Ansi);
        let tf = Transform::with_order(&grid, &basis, 1).expect("transform");
        let mut coeffs = Array1::zeros(basis.num_modes());
        coeffs[basis.get_idx(0, 0, 0).expect("mode")] = 3.0;
        coeffs[basis.get_idx(1, 1, 0).expect("mode")] = 1.0;
        let r_r = tf.transform(&coeffs, [1, 0, 0]).expect("derivative");
        for (i, &v) in r_r.iter().enumerate() {
            assert!((v - grid.theta()[i].cos()).abs() < 1e-13);
        }
    }
}
