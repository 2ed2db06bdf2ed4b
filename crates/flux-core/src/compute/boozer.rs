// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Boozer Spectrum
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Boozer angles and the |B| spectrum in them, surface by surface.
//!
//! With w the periodic part of the covariant field, B_θ = I + ∂_θ w and
//! B_ζ = G + ∂_ζ w. The Boozer angles are θ_B = θ + λ + ι ν and ζ_B = ζ + ν
//! with ν = (w − I λ) / (G + ι I). λ, B_θ and B_ζ are fitted on a double
//! Fourier basis over each surface's nodes, so a surface needs enough θ and ζ
//! nodes to resolve `boozer_m` and `boozer_n`.

use flux_math::basis::{Basis, Symmetry};
use flux_math::grid::Grid;
use flux_math::linalg::lstsq;
use flux_types::config::ComputeOptions;
use flux_types::error::{FluxError, FluxResult};
use ndarray::{Array1, Array2, Axis};

use super::{ComputeInputs, D0};
use crate::data::{DataMap, Value};
use crate::registry::{Quantity, Registry, Shape};

/// Modes of `ν` and of each row of `|B|_mn`.
pub fn boozer_basis(options: &ComputeOptions, nfp: usize) -> Basis {
    Basis::double_fourier(options.boozer_m, options.boozer_n, nfp, Symmetry::None)
}

/// Node indices of each flux surface, innermost first.
fn surfaces(grid: &Grid) -> Vec<Vec<usize>> {
    let mut out = vec![Vec::new(); grid.num_rho()];
    for (i, &s) in grid.inverse_rho_idx().iter().enumerate() {
        out[s].push(i);
    }
    out
}

fn angle_nodes(theta: &Array1<f64>, zeta: &Array1<f64>) -> Array2<f64> {
    let mut nodes = Array2::zeros((theta.len(), 3));
    nodes.column_mut(1).assign(theta);
    nodes.column_mut(2).assign(zeta);
    nodes
}

/// ν coefficients from the fitted λ, B_θ and B_ζ of one surface.
fn nu_modes(
    basis: &Basis,
    lambda: &Array1<f64>,
    b_theta: &Array1<f64>,
    b_zeta: &Array1<f64>,
    iota: f64,
) -> FluxResult<Array1<f64>> {
    let coeff = |f: &Array1<f64>, m: i32, n: i32| basis.get_idx(0, m, n).map_or(0.0, |j| f[j]);
    let i_pol = coeff(b_theta, 0, 0);
    let g_tor = coeff(b_zeta, 0, 0);
    let den = g_tor + iota * i_pol;
    if den == 0.0 || !den.is_finite() {
        return Err(FluxError::LinAlg(format!(
            "G + ιI = {den} leaves the Boozer angle undefined"
        )));
    }
    let nfp = basis.nfp() as f64;
    let mut nu = Array1::zeros(basis.num_modes());
    for (k, &[_, m, n]) in basis.modes().iter().enumerate() {
        // ∂_θ maps mode (m, n) onto (−m, n) with factor −m; ∂_ζ likewise in n
        let w = if m != 0 {
            -coeff(b_theta, -m, n) / f64::from(m)
        } else if n != 0 {
            -coeff(b_zeta, 0, -n) / (f64::from(n) * nfp)
        } else {
            continue;
        };
        nu[k] = (w - i_pol * lambda[k]) / den;
    }
    Ok(nu)
}

fn compute_nu(inputs: &ComputeInputs<'_>, data: &DataMap) -> FluxResult<Array1<f64>> {
    let grid = inputs.grid;
    let basis = boozer_basis(&inputs.options, grid.nfp());
    let lambda = data.nodal("lambda")?;
    let b_theta = data.nodal("B_theta")?;
    let b_zeta = data.nodal("B_zeta")?;
    let iota = data.nodal("iota")?;

    let mut nu = Array1::zeros(grid.num_nodes());
    for idx in surfaces(grid) {
        let on = |f: &Array1<f64>| f.select(Axis(0), &idx);
        let nodes = angle_nodes(
            &grid.theta().select(Axis(0), &idx),
            &grid.zeta().select(Axis(0), &idx),
        );
        let table = basis.evaluate(&nodes, D0)?;
        let modes = nu_modes(
            &basis,
            &lstsq(&table, &on(lambda))?,
            &lstsq(&table, &on(b_theta))?,
            &lstsq(&table, &on(b_zeta))?,
            iota[idx[0]],
        )?;
        for (k, value) in table.dot(&modes).into_iter().enumerate() {
            nu[idx[k]] = value;
        }
    }
    Ok(nu)
}

fn compute_b_mn(inputs: &ComputeInputs<'_>, data: &DataMap) -> FluxResult<Array2<f64>> {
    let grid = inputs.grid;
    let basis = boozer_basis(&inputs.options, grid.nfp());
    let lambda = data.nodal("lambda")?;
    let nu = data.nodal("nu")?;
    let iota = data.nodal("iota")?;
    let mag = data.nodal("|B|")?;
    let (theta, zeta) = (grid.theta(), grid.zeta());

    let mut out = Array2::zeros((grid.num_rho(), basis.num_modes()));
    for (s, idx) in surfaces(grid).iter().enumerate() {
        let theta_b: Array1<f64> = idx
            .iter()
            .map(|&i| theta[i] + lambda[i] + iota[i] * nu[i])
            .collect();
        let zeta_b: Array1<f64> = idx.iter().map(|&i| zeta[i] + nu[i]).collect();
        let table = basis.evaluate(&angle_nodes(&theta_b, &zeta_b), D0)?;
        out.row_mut(s).assign(&lstsq(&table, &mag.select(Axis(0), idx))?);
    }
    Ok(out)
}

pub(crate) fn register(reg: &mut Registry) {
    reg.add(
        Quantity::new(
            "nu",
            Shape::Nodal,
            "rad",
            "Boozer toroidal angle offset ζ_B − ζ",
            |inputs, data| Ok(Value::Nodal(compute_nu(inputs, data)?)),
        )
        .deps(["lambda", "B_theta", "B_zeta", "iota"])
        .singular_on_axis(),
    );
    reg.add(
        Quantity::new(
            "|B|_mn",
            Shape::Spectral,
            "T",
            "|B| spectrum in Boozer angles, one row per surface",
            |inputs, data| Ok(Value::Spectral(compute_b_mn(inputs, data)?)),
        )
        .deps(["lambda", "nu", "iota", "|B|"])
        .singular_on_axis(),
    );
}

#[cfg(test)]
mod tests {
    use super::super::testing::Circular;
    use super::*;
    use flux_math::grid::LinearGridOptions;

    fn surface_grid() -> Grid {
        Grid::linear(LinearGridOptions {
            m: Some(12),
            n: Some(6),
            rho: vec![0.5, 1.0],
            ..Default::default()
        })
        .expect("grid")
    }

    #[test]
    fn test_axisymmetric_spectrum_has_only_n0() {
        let mut eq = Circular::new(10.0, 1.0, 0.6, 0.0);
        let j = eq.basis.get_idx(1, -1, 0).expect("mode");
        eq.l[j] = 0.05;
        let grid = surface_grid();
        let data = eq.compute(&grid, &["nu", "|B|_mn"], 3).expect("compute");
        let basis = boozer_basis(&ComputeOptions::default(), 1);
        let b_mn = data.spectral("|B|_mn").expect("|B|_mn");
        assert_eq!(b_mn.dim(), (2, basis.num_modes()));

        let mag = data.nodal("|B|").expect("|B|");
        let i00 = basis.get_idx(0, 0, 0).expect("mode");
        let i10 = basis.get_idx(0, 1, 0).expect("mode");
        for (s, row) in b_mn.outer_iter().enumerate() {
            let on_surface: Vec<f64> = grid
                .inverse_rho_idx()
                .iter()
                .zip(mag.iter())
                .filter(|(k, _)| **k == s)
                .map(|(_, &b)| b)
                .collect();
            let lo = on_surface.iter().cloned().fold(f64::MAX, f64::min);
            let hi = on_surface.iter().cloned().fold(f64::MIN, f64::max);
            let b00 = row[i00];
            assert!(b00 > lo && b00 < hi, "B_00 = {b00} outside [{lo}, {hi}]");
            assert!(row[i10].abs() > 1e-3 * b00, "no poloidal variation on surface {s}");
            for (k, &[_, _, n]) in basis.modes().iter().enumerate() {
                if n != 0 {
                    assert!(row[k].abs() < 1e-10 * b00, "B_mn[{k}] = {} with n = {n}", row[k]);
                }
            }
        }

        // ν depends on θ only
        let nu = data.nodal("nu").expect("nu");
        let (rho, theta) = (grid.rho(), grid.theta());
        for i in 0..grid.num_nodes() {
            for k in i + 1..grid.num_nodes() {
                if rho[i] == rho[k] && theta[i] == theta[k] {
                    assert!((nu[i] - nu[k]).abs() < 1e-12);
                }
            }
        }
        assert!(nu.iter().any(|v| v.abs() > 1e-6));
    }

    #[test]
    fn test_no_rotation_leaves_angles_unchanged() {
        // ι = 0, λ = 0: B_θ vanishes and B_ζ has no ζ dependence, so ν = 0
        let eq = Circular::new(10.0, 1.0, 0.0, 0.0);
        let grid = surface_grid();
        let data = eq.compute(&grid, &["|B|_mn"], 3).expect("compute");
        assert!(data.nodal("nu").expect("nu").iter().all(|v| v.abs() < 1e-12));
        // |B| is even in θ for up-down symmetric surfaces
        let basis = boozer_basis(&ComputeOptions::default(), 1);
        let b_mn = data.spectral("|B|_mn").expect("|B|_mn");
        let b00 = b_mn[[1, basis.get_idx(0, 0, 0).expect("mode")]];
        for (k, &[_, m, _]) in basis.modes().iter().enumerate() {
            if m < 0 {
                assert!(b_mn[[1, k]].abs() < 1e-10 * b00);
            }
        }
    }

    #[test]
    fn test_nu_modes_inverts_derivatives() {
        let basis = Basis::double_fourier(2, 1, 3, Symmetry::None);
        let mut b_theta = Array1::zeros(basis.num_modes());
        let mut b_zeta = Array1::zeros(basis.num_modes());
        let idx = |m, n| basis.get_idx(0, m, n).expect("mode");
        // w = 0.2 cos 2θ + 0.1 sin 3ζ: B_θ = I − 0.4 sin 2θ, B_ζ = G + 0.3 cos 3ζ
        b_theta[idx(0, 0)] = 0.5;
        b_theta[idx(-2, 0)] = -0.4;
        b_zeta[idx(0, 0)] = 2.0;
        b_zeta[idx(0, 1)] = 0.3;
        let lambda = Array1::zeros(basis.num_modes());
        let nu = nu_modes(&basis, &lambda, &b_theta, &b_zeta, 1.0).expect("nu");
        let den = 2.0 + 0.5;
        assert!((nu[idx(2, 0)] - 0.2 / den).abs() < 1e-15);
        assert!((nu[idx(0, -1)] - 0.1 / den).abs() < 1e-15);
        assert_eq!(nu[idx(0, 0)], 0.0);
        let zero = Array1::zeros(basis.num_modes());
        assert!(nu_modes(&basis, &lambda, &zero, &zero, 1.0).is_err());
    }
}
