// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Property-Based Tests (proptest) for flux-math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for grids and bases.
//!
//! Covers: weight normalisation, symmetry trimming, resolution changes,
//! Zernike edge values and basis derivative consistency.

use flux_math::basis::{zernike_radial, Basis, SpectralIndexing, Symmetry};
use flux_math::grid::{ConcentricGridOptions, Grid, LinearGridOptions, NodePattern};
use flux_types::constants::FOUR_PI_SQ;
use ndarray::array;
use proptest::prelude::*;

fn pattern() -> impl Strategy<Value = NodePattern> {
    prop_oneof![
        Just(NodePattern::Linear),
        Just(NodePattern::Cheb1),
        Just(NodePattern::Cheb2),
        Just(NodePattern::Jacobi),
        Just(NodePattern::Ocs),
    ]
}

// ── Grid Weights ─────────────────────────────────────────────────────

proptest! {
    /// Concentric grid weights sum to 4π² for every resolution and pattern.
    #[test]
    fn concentric_weights_sum(
        l in 1usize..12,
        m in 1usize..12,
        n in 0usize..4,
        nfp in 1usize..5,
        sym in any::<bool>(),
        axis in any::<bool>(),
        pattern in pattern(),
    ) {
        let mut opts = ConcentricGridOptions::new(l, m, n);
        opts.nfp = nfp;
        opts.sym = sym;
        opts.axis = axis;
        opts.node_pattern = pattern;
        let grid = Grid::concentric(opts).unwrap();
        prop_assert!((grid.weights().sum() - FOUR_PI_SQ).abs() < 1e-9 * FOUR_PI_SQ);
        prop_assert!(grid.weights().iter().all(|&w| w > 0.0));
        // cheb2 with odd L has one more ρ value than rings, so ρ = 0 is never used
        let expect_axis = axis && !(pattern == NodePattern::Cheb2 && l % 2 == 1);
        prop_assert_eq!(grid.has_axis(), expect_axis);
        if sym {
            prop_assert!(grid.theta().iter().all(|&t| t <= std::f64::consts::PI));
        }
    }

    /// Weights stay normalised after changing resolution.
    #[test]
    fn linear_weights_sum_after_resize(
        l in 1usize..8,
        m in 1usize..8,
        n in 0usize..4,
        l2 in 1usize..8,
        m2 in 1usize..8,
        n2 in 0usize..4,
        sym in any::<bool>(),
    ) {
        let mut grid = Grid::linear(LinearGridOptions {
            l: Some(l),
            m: Some(m),
            n: Some(n),
            sym,
            ..Default::default()
        }).unwrap();
        prop_assert!((grid.weights().sum() - FOUR_PI_SQ).abs() < 1e-9 * FOUR_PI_SQ);
        grid.change_resolution(l2, m2, n2, 1).unwrap();
        prop_assert_eq!(grid.num_nodes(), grid.weights().len());
        prop_assert!((grid.weights().sum() - FOUR_PI_SQ).abs() < 1e-9 * FOUR_PI_SQ);
    }

    /// Quadrature grid weights integrate polynomials in ρ exactly.
    #[test]
    fn quadrature_integrates_monomials(l in 1usize..10, k in 0i32..4) {
        let grid = Grid::quadrature(l, 2, 0, 1).unwrap();
        let integral: f64 = grid
            .rho()
            .iter()
            .zip(grid.weights().iter())
            .map(|(&r, &w)| r.powi(k) * w)
            .sum();
        let exact = FOUR_PI_SQ / (k as f64 + 1.0);
        prop_assert!((integral - exact).abs() < 1e-10 * exact);
    }
}

// ── Basis Properties ─────────────────────────────────────────────────

proptest! {
    /// R_l^m(1) = 1.
    #[test]
    fn zernike_unit_circle(l in 0usize..30, pick in 0usize..30) {
        let choices: Vec<usize> = (l % 2..=l).step_by(2).collect();
        let m = choices[pick % choices.len()];
        prop_assert!((zernike_radial(1.0, l, m, 0) - 1.0).abs() < 1e-9);
    }

    /// First radial derivative agrees with a central difference.
    #[test]
    fn zernike_derivative_matches_difference(l in 0usize..16, pick in 0usize..16, rho in 0.05f64..0.95) {
        let choices: Vec<usize> = (l % 2..=l).step_by(2).collect();
        let m = choices[pick % choices.len()];
        let h = 1e-6;
        let fd = (zernike_radial(rho + h, l, m, 0) - zernike_radial(rho - h, l, m, 0)) / (2.0 * h);
        let exact = zernike_radial(rho, l, m, 1);
        prop_assert!((fd - exact).abs() < 1e-5 * exact.abs().max(1.0));
    }

    /// ∂θ of the cos-symmetric basis lands in the sin-symmetric span.
    #[test]
    fn poloidal_derivative_swaps_parity(theta in 0.0f64..6.28, zeta in 0.0f64..6.28) {
        let basis = Basis::fourier_zernike(3, 3, 2, 1, Symmetry::Cos, SpectralIndexing::Fringe);
        let nodes = array![[0.6, theta, zeta], [0.6, -theta, -zeta]];
        let d = basis.evaluate(&nodes, [0, 1, 0]).unwrap();
        for k in 0..basis.num_modes() {
            prop_assert!((d[[0, k]] + d[[1, k]]).abs() < 1e-9);
        }
    }
}
