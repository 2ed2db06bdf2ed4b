//! Linear algebra utilities.
//!
//! Householder least squares with a minimum-norm SVD fallback, and the
//! symmetric tridiagonal eigensolver behind Gauss quadrature. Sizes here are a few hundred at most, so everything is
//! dense and hand-rolled.

use flux_types::error::{FluxError, FluxResult};
use ndarray::{Array1, Array2};

/// Relative pivot size below which the least-squares system is treated as
/// rank deficient.
const RANK_TOL: f64 = 1e-13;

const MAX_SWEEPS: usize = 60;

/// Solve `min ||A x - b||₂`, taking the minimum-norm solution when the system
/// is underdetermined or rank deficient.
pub fn lstsq(a: &Array2<f64>, b: &Array1<f64>) -> FluxResult<Array1<f64>> {
    match lstsq_qr(a, b) {
        Err(FluxError::LinAlg(reason)) => {
            log::debug!("least squares: {reason}; using the minimum-norm solution");
            lstsq_min_norm(a, b)
        }
        other => other,
    }
}

/// Solve `min ||A x - b||₂` by Householder QR.
///
/// Requires `rows >= cols` and full column rank. Used by `Transform::fit`,
/// where the collocation matrix is tall and well conditioned, so the normal
/// equations (which square the condition number) are avoided.
pub fn lstsq_qr(a: &Array2<f64>, b: &Array1<f64>) -> FluxResult<Array1<f64>> {
    let (m, n) = a.dim();
    if b.len() != m {
        return Err(FluxError::DimensionMismatch(format!(
            "least squares: matrix has {m} rows but rhs has {} entries",
            b.len()
        )));
    }
    if m < n {
        return Err(FluxError::LinAlg(format!(
            "least squares is underdetermined: {m} equations for {n} unknowns"
        )));
    }

    let mut r = a.clone();
    let mut y = b.clone();
    let mut v = vec![0.0; m];

    for k in 0..n {
        let norm = (k..m).map(|i| r[[i, k]] * r[[i, k]]).sum::<f64>().sqrt();
        if norm == 0.0 {
            return Err(FluxError::LinAlg(format!(
                "least squares: column {k} is identically zero"
            )));
        }
        let alpha = if r[[k, k]] > 0.0 { -norm } else { norm };

        for i in k..m {
            v[i] = r[[i, k]];
        }
        v[k] -= alpha;
        let vnorm2: f64 = (k..m).map(|i| v[i] * v[i]).sum();
        if vnorm2 == 0.0 {
            continue;
        }

        for j in k..n {
            let s: f64 = (k..m).map(|i| v[i] * r[[i, j]]).sum();
            let f = 2.0 * s / vnorm2;
            for i in k..m {
                r[[i, j]] -= f * v[i];
            }
        }
        let s: f64 = (k..m).map(|i| v[i] * y[i]).sum();
        let f = 2.0 * s / vnorm2;
        for i in k..m {
            y[i] -= f * v[i];
        }
    }

    let diag_max = (0..n).map(|k| r[[k, k]].abs()).fold(0.0, f64::max);
    let mut x = Array1::zeros(n);
    for k in (0..n).rev() {
        let pivot = r[[k, k]];
        if pivot.abs() <= RANK_TOL * diag_max {
            return Err(FluxError::LinAlg(format!(
                "least squares: matrix is rank deficient at column {k}"
            )));
        }
        let mut sum = y[k];
        for j in (k + 1)..n {
            sum -= r[[k, j]] * x[j];
        }
        x[k] = sum / pivot;
    }
    Ok(x)
}

/// Thin SVD `A = U diag(σ) Vᵀ` by one-sided Jacobi (Hestenes) rotations.
///
/// Returns `(U, σ, Vᵀ)` with `k = min(m, n)` columns of U, singular values in
/// descending order and k rows of Vᵀ.
pub fn svd_jacobi(a: &Array2<f64>) -> FluxResult<(Array2<f64>, Array1<f64>, Array2<f64>)> {
    let (m, n) = a.dim();
    if m < n {
        let (u, sigma, vt) = svd_jacobi(&a.t().to_owned())?;
        return Ok((vt.t().to_owned(), sigma, u.t().to_owned()));
    }

    let mut w = a.clone();
    let mut v = Array2::<f64>::eye(n);
    let mut converged = n < 2;
    for _ in 0..MAX_SWEEPS {
        let mut rotated = false;
        for p in 0..n {
            for q in (p + 1)..n {
                let (mut alpha, mut beta, mut gamma) = (0.0f64, 0.0f64, 0.0f64);
                for i in 0..m {
                    alpha += w[[i, p]] * w[[i, p]];
                    beta += w[[i, q]] * w[[i, q]];
                    gamma += w[[i, p]] * w[[i, q]];
                }
                if gamma == 0.0 || gamma.abs() <= f64::EPSILON * (alpha * beta).sqrt() {
                    continue;
                }
                rotated = true;
                let zeta = (beta - alpha) / (2.0 * gamma);
                let t = zeta.signum() / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = c * t;
                for i in 0..m {
                    let (wp, wq) = (w[[i, p]], w[[i, q]]);
                    w[[i, p]] = c * wp - s * wq;
                    w[[i, q]] = s * wp + c * wq;
                }
                for i in 0..n {
                    let (vp, vq) = (v[[i, p]], v[[i, q]]);
                    v[[i, p]] = c * vp - s * vq;
                    v[[i, q]] = s * vp + c * vq;
                }
            }
        }
        if !rotated {
            converged = true;
            break;
        }
    }
    if !converged {
        return Err(FluxError::LinAlg(format!(
            "Jacobi SVD did not converge in {MAX_SWEEPS} sweeps"
        )));
    }

    let norms: Vec<f64> = (0..n).map(|j| w.column(j).dot(&w.column(j)).sqrt()).collect();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| norms[j].total_cmp(&norms[i]));

    let mut u = Array2::zeros((m, n));
    let mut sigma = Array1::zeros(n);
    let mut vt = Array2::zeros((n, n));
    for (k, &j) in order.iter().enumerate() {
        sigma[k] = norms[j];
        if norms[j] > 0.0 {
            u.column_mut(k).assign(&(&w.column(j) / norms[j]));
        }
        vt.row_mut(k).assign(&v.column(j));
    }
    Ok((u, sigma, vt))
}

/// Minimum-norm least squares through the SVD; singular values below
/// `RANK_TOL · σ_max` are treated as zero.
pub fn lstsq_min_norm(a: &Array2<f64>, b: &Array1<f64>) -> FluxResult<Array1<f64>> {
    let (m, n) = a.dim();
    if b.len() != m {
        return Err(FluxError::DimensionMismatch(format!(
            "least squares: matrix has {m} rows but rhs has {} entries",
            b.len()
        )));
    }
    let (u, sigma, vt) = svd_jacobi(a)?;
    let cutoff = RANK_TOL * sigma.iter().copied().fold(0.0, f64::max);
    let mut x = Array1::zeros(n);
    for (k, &s) in sigma.iter().enumerate() {
        if s > cutoff {
            x.scaled_add(u.column(k).dot(b) / s, &vt.row(k));
        }
    }
    Ok(x)
}

fn sign(a: f64, b: f64) -> f64 {
    if b >= 0.0 {
        a.abs()
    } else {
        -a.abs()
    }
}

/// Eigen-decomposition of a symmetric tridiagonal matrix by the implicit QL
/// algorithm with Wilkinson shifts.
///
/// `diag` has length n, `off` the n-1 sub-diagonal entries. Returns eigenvalues
/// in ascending order and the matching orthonormal eigenvectors as columns.
pub fn symmetric_tridiagonal_eigen(
    diag: &[f64],
    off: &[f64],
) -> FluxResult<(Array1<f64>, Array2<f64>)> {
    let n = diag.len();
    if n == 0 {
        return Ok((Array1::zeros(0), Array2::zeros((0, 0))));
    }
    if off.len() + 1 != n {
        return Err(FluxError::DimensionMismatch(format!(
            "tridiagonal eigen: {n} diagonal entries need {} off-diagonal, got {}",
            n - 1,
            off.len()
        )));
    }

    let mut d = diag.to_vec();
    let mut e = vec![0.0; n];
    e[..(n - 1)].copy_from_slice(off);
    let mut z = Array2::eye(n);

    for l in 0..n {
        let mut iter = 0;
        loop {
            let mut m = l;
            while m + 1 < n {
                let dd = d[m].abs() + d[m + 1].abs();
                if e[m].abs() <= f64::EPSILON * dd {
                    break;
                }
                m += 1;
            }
            if m == l {
                break;
            }
            iter += 1;
            if iter > 60 {
                return Err(FluxError::LinAlg(format!(
                    "tridiagonal eigen: no convergence for eigenvalue {l}"
                )));
            }

            let mut g = (d[l + 1] - d[l]) / (2.0 * e[l]);
            let mut r = g.hypot(1.0);
            g = d[m] - d[l] + e[l] / (g + sign(r, g));
            let (mut s, mut c, mut p) = (1.0, 1.0, 0.0);
            let mut deflated = false;

            let mut i = m;
            while i > l {
                i -= 1;
                let f = s * e[i];
                let b = c * e[i];
                r = f.hypot(g);
                e[i + 1] = r;
                if r == 0.0 {
                    d[i + 1] -= p;
                    e[m] = 0.0;
                    deflated = true;
                    break;
                }
                s = f / r;
                c = g / r;
                g = d[i + 1] - p;
                r = (d[i] - g) * s + 2.0 * c * b;
                p = s * r;
                d[i + 1] = g + p;
                g = c * r - b;
                for k in 0..n {
                    let f = z[[k, i + 1]];
                    z[[k, i + 1]] = s * z[[k, i]] + c * f;
                    z[[k, i]] = c * z[[k, i]] - s * f;
                }
            }
            if deflated {
                continue;
            }
            d[l] -= p;
            e[l] = g;
            e[m] = 0.0;
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| d[a].total_cmp(&d[b]));
    let values = Array1::from_iter(order.iter().map(|&k| d[k]));
    let mut vectors = Array2::zeros((n, n));
    for (col, &k) in order.iter().enumerate() {
        vectors.column_mut(col).assign(&z.column(k));
    }
    Ok((values, vectors))
}
