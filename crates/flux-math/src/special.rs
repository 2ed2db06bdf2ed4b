// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Special Functions
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Gamma function, binomials and Jacobi polynomials.

use std::f64::consts::PI;

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// ln Γ(x) for x > 0 (Lanczos approximation, ~15 significant digits).
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection: Γ(x)Γ(1-x) = π / sin(πx)
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut a = LANCZOS_COEFFS[0];
    let t = x + LANCZOS_G + 0.5;
    for (i, &c) in LANCZOS_COEFFS.iter().enumerate().skip(1) {
        a += c / (x + i as f64);
    }
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}

/// Binomial coefficient C(n, k) as a float; zero when k > n.
pub fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut acc = 1.0;
    for i in 0..k {
        acc *= (n - i) as f64 / (i + 1) as f64;
    }
    acc
}

/// n! / (n - k)!, zero when k > n.
pub fn falling_factorial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    ((n - k + 1)..=n).map(|i| i as f64).product()
}

pub fn factorial(n: usize) -> f64 {
    falling_factorial(n, n)
}

/// Jacobi polynomial P_n^(α,β)(x) via the three-term recurrence.
pub fn jacobi(n: usize, alpha: f64, beta: f64, x: f64) -> f64 {
    let p0 = 1.0;
    if n == 0 {
        return p0;
    }
    let ab = alpha + beta;
    let p1 = (alpha + 1.0) + (ab + 2.0) * (x - 1.0) / 2.0;
    if n == 1 {
        return p1;
    }
    let (mut pm2, mut pm1) = (p0, p1);
    for k in 2..=n {
        let k = k as f64;
        let c = 2.0 * k + ab;
        let a1 = 2.0 * k * (k + ab) * (c - 2.0);
        let a2 = (c - 1.0) * (alpha * alpha - beta * beta);
        let a3 = (c - 2.0) * (c - 1.0) * c;
        let a4 = 2.0 * (k + alpha - 1.0) * (k + beta - 1.0) * c;
        let p = ((a2 + a3 * x) * pm1 - a4 * pm2) / a1;
        pm2 = pm1;
        pm1 = p;
    }
    pm1
}

/// k-th derivative of P_n^(α,β) at x:
/// Γ(n+α+β+1+k) / (2^k Γ(n+α+β+1)) · P_(n-k)^(α+k, β+k)(x).
pub fn jacobi_derivative(n: usize, alpha: f64, beta: f64, x: f64, k: usize) -> f64 {
    if k == 0 {
        return jacobi(n, alpha, beta, x);
    }
    if k > n {
        return 0.0;
    }
    let base = n as f64 + alpha + beta;
    let scale: f64 = (1..=k).map(|i| (base + i as f64) / 2.0).product();
    scale * jacobi(n - k, alpha + k as f64, beta + k as f64, x)
}
