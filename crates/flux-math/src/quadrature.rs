// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Gauss-Jacobi Quadrature
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Gauss-Jacobi nodes and weights by the Golub-Welsch algorithm.
//!
//! The n-point rule integrates `(1-x)^α (1+x)^β p(x)` exactly on [-1, 1] for
//! polynomials p of degree ≤ 2n-1.

use crate::linalg::symmetric_tridiagonal_eigen;
use crate::special::ln_gamma;
use flux_types::error::{FluxError, FluxResult};
use ndarray::Array1;

/// Nodes (ascending) and weights of the n-point Gauss-Jacobi rule on [-1, 1].
pub fn gauss_jacobi(n: usize, alpha: f64, beta: f64) -> FluxResult<(Array1<f64>, Array1<f64>)> {
    if n == 0 {
        return Err(FluxError::ConfigError(
            "Gauss-Jacobi rule needs at least one node".to_string(),
        ));
    }
    if alpha <= -1.0 || beta <= -1.0 {
        return Err(FluxError::ConfigError(format!(
            "Jacobi weight exponents must exceed -1, got alpha={alpha}, beta={beta}"
        )));
    }

    let ab = alpha + beta;
    let diag: Vec<f64> = (0..n)
        .map(|k| {
            let k = k as f64;
            if k == 0.0 {
                (beta - alpha) / (ab + 2.0)
            } else {
                (beta * beta - alpha * alpha) / ((2.0 * k + ab) * (2.0 * k + ab + 2.0))
            }
        })
        .collect();
    let off: Vec<f64> = (1..n)
        .map(|k| {
            let k = k as f64;
            let c = 2.0 * k + ab;
            (4.0 * k * (k + alpha) * (k + beta) * (k + ab) / (c * c * (c + 1.0) * (c - 1.0))).sqrt()
        })
        .collect();

    let (nodes, vectors) = symmetric_tridiagonal_eigen(&diag, &off)?;
    let mu0 = ((ab + 1.0) * std::f64::consts::LN_2 + ln_gamma(alpha + 1.0) + ln_gamma(beta + 1.0)
        - ln_gamma(ab + 2.0))
    .exp();
    let weights = Array1::from_iter((0..n).map(|j| mu0 * vectors[[0, j]] * vectors[[0, j]]));
    Ok((nodes, weights))
}

/// Gauss-Jacobi rule mapped to [0, 1] with weight `(1-x)^α x^β`.
pub fn shifted_gauss_jacobi(
    n: usize,
    alpha: f64,
    beta: f64,
) -> FluxResult<(Array1<f64>, Array1<f64>)> {
    let (t, w) = gauss_jacobi(n, alpha, beta)?;
    let scale = 2f64.powf(alpha + beta + 1.0);
    Ok((t.mapv(|ti| 0.5 * (ti + 1.0)), w.mapv(|wi| wi / scale)))
}

/// Gauss-Legendre rule on [0, 1]; weights sum to 1.
pub fn gauss_legendre_unit(n: usize) -> FluxResult<(Array1<f64>, Array1<f64>)> {
    shifted_gauss_jacobi(n, 0.0, 0.0)
}
