// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Spectral Bases
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Spectral bases on the unit disk × torus.
//!
//! A mode is a triple (l, m, n): radial degree, poloidal and toroidal mode
//! numbers. Negative m (n) selects sin(|m|θ) (sin(|n|·NFP·ζ)), non-negative
//! selects cos. Mode order is fixed at construction.

use std::collections::HashMap;
use std::str::FromStr;

use flux_types::error::{FluxError, FluxResult};
use ndarray::{Array1, Array2};

use crate::special::{binomial, factorial, falling_factorial, jacobi_derivative};

/// Derivative orders (∂ρ, ∂θ, ∂ζ).
pub type Deriv = [u8; 3];

/// Stellarator symmetry selection of Fourier modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symmetry {
    None,
    /// Even under (θ, ζ) → (-θ, -ζ): cos·cos and sin·sin products.
    Cos,
    /// Odd under (θ, ζ) → (-θ, -ζ): sin·cos and cos·sin products.
    Sin,
}

impl Symmetry {
    fn keeps(self, m: i32, n: i32) -> bool {
        match self {
            Symmetry::None => true,
            Symmetry::Cos => (m >= 0) == (n >= 0),
            Symmetry::Sin => (m >= 0) != (n >= 0),
        }
    }
}

/// Ordering and truncation of Zernike (l, m) pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectralIndexing {
    /// Triangle: |m| ≤ l ≤ L.
    Ansi,
    /// Diamond: additionally l + |m| ≤ 2M.
    Fringe,
}

impl FromStr for SpectralIndexing {
    type Err = FluxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ansi" => Ok(SpectralIndexing::Ansi),
            "fringe" => Ok(SpectralIndexing::Fringe),
            other => Err(FluxError::ConfigError(format!(
                "spectral_indexing '{other}' is not supported"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasisKind {
    /// ρ^l, for radial profiles.
    PowerSeries,
    /// Fourier in θ and ζ, for boundary surfaces.
    DoubleFourierSeries,
    /// Zernike in (ρ, θ), for a poloidal cross section.
    ZernikePolynomial,
    /// Zernike in (ρ, θ) times Fourier in ζ, for R, Z and λ.
    FourierZernike,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Basis {
    kind: BasisKind,
    l: usize,
    m: usize,
    n: usize,
    nfp: usize,
    sym: Symmetry,
    indexing: SpectralIndexing,
    modes: Vec<[i32; 3]>,
}

fn zernike_pairs(l_max: usize, m_max: usize, indexing: SpectralIndexing) -> Vec<(i32, i32)> {
    let mut pairs = Vec::new();
    for l in 0..=l_max as i32 {
        let mm = l.min(m_max as i32);
        for m in -mm..=mm {
            if (l - m.abs()) % 2 != 0 {
                continue;
            }
            if indexing == SpectralIndexing::Fringe && l + m.abs() > 2 * m_max as i32 {
                continue;
            }
            pairs.push((l, m));
        }
    }
    match indexing {
        SpectralIndexing::Ansi => pairs.sort_by_key(|&(l, m)| (l, m)),
        SpectralIndexing::Fringe => pairs.sort_by_key(|&(l, m)| (l + m.abs(), l, m)),
    }
    pairs
}

impl Basis {
    pub fn power_series(l: usize) -> Self {
        Basis {
            kind: BasisKind::PowerSeries,
            l,
            m: 0,
            n: 0,
            nfp: 1,
            sym: Symmetry::None,
            indexing: SpectralIndexing::Ansi,
            modes: (0..=l as i32).map(|l| [l, 0, 0]).collect(),
        }
    }

    pub fn double_fourier(m: usize, n: usize, nfp: usize, sym: Symmetry) -> Self {
        let (mm, nn) = (m as i32, n as i32);
        let mut modes = Vec::new();
        for nj in -nn..=nn {
            for mj in -mm..=mm {
                if sym.keeps(mj, nj) {
                    modes.push([0, mj, nj]);
                }
            }
        }
        Basis {
            kind: BasisKind::DoubleFourierSeries,
            l: 0,
            m,
            n,
            nfp,
            sym,
            indexing: SpectralIndexing::Ansi,
            modes,
        }
    }

    pub fn zernike(l: usize, m: usize, sym: Symmetry, indexing: SpectralIndexing) -> Self {
        let modes = zernike_pairs(l, m, indexing)
            .into_iter()
            .filter(|&(_, mj)| sym.keeps(mj, 0))
            .map(|(lj, mj)| [lj, mj, 0])
            .collect();
        Basis {
            kind: BasisKind::ZernikePolynomial,
            l,
            m,
            n: 0,
            nfp: 1,
            sym,
            indexing,
            modes,
        }
    }

    pub fn fourier_zernike(
        l: usize,
        m: usize,
        n: usize,
        nfp: usize,
        sym: Symmetry,
        indexing: SpectralIndexing,
    ) -> Self {
        let pairs = zernike_pairs(l, m, indexing);
        let mut modes = Vec::new();
        for nj in -(n as i32)..=n as i32 {
            for &(lj, mj) in &pairs {
                if sym.keeps(mj, nj) {
                    modes.push([lj, mj, nj]);
                }
            }
        }
        Basis {
            kind: BasisKind::FourierZernike,
            l,
            m,
            n,
            nfp,
            sym,
            indexing,
            modes,
        }
    }

    pub fn kind(&self) -> BasisKind {
        self.kind
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
    pub fn nfp(&self) -> usize {
        self.nfp
    }
    pub fn sym(&self) -> Symmetry {
        self.sym
    }
    pub fn indexing(&self) -> SpectralIndexing {
        self.indexing
    }
    pub fn modes(&self) -> &[[i32; 3]] {
        &self.modes
    }
    pub fn num_modes(&self) -> usize {
        self.modes.len()
    }

    /// Position of mode (l, m, n), if present.
    pub fn get_idx(&self, l: i32, m: i32, n: i32) -> Option<usize> {
        self.modes.iter().position(|&mode| mode == [l, m, n])
    }

    /// Basis function table: entry (i, k) is ∂^d of mode k at node i.
    pub fn evaluate(&self, nodes: &Array2<f64>, d: Deriv) -> FluxResult<Array2<f64>> {
        if nodes.ncols() != 3 {
            return Err(FluxError::DimensionMismatch(format!(
                "basis nodes must have 3 columns, got {}",
                nodes.ncols()
            )));
        }
        let [dr, dt, dz] = [d[0] as usize, d[1] as usize, d[2] as usize];
        let num_nodes = nodes.nrows();
        let mut out = Array2::zeros((num_nodes, self.num_modes()));

        let radial_free = matches!(self.kind, BasisKind::DoubleFourierSeries);
        let poloidal_free = matches!(self.kind, BasisKind::PowerSeries);
        let toroidal_free = matches!(
            self.kind,
            BasisKind::PowerSeries | BasisKind::ZernikePolynomial
        );
        if (radial_free && dr > 0) || (poloidal_free && dt > 0) || (toroidal_free && dz > 0) {
            return Ok(out);
        }

        let rho = nodes.column(0);
        let theta = nodes.column(1);
        let zeta = nodes.column(2);
        let nfp = self.nfp as f64;

        // One column per distinct radial, poloidal and toroidal factor.
        let mut radial: HashMap<(i32, i32), Array1<f64>> = HashMap::new();
        let mut poloidal: HashMap<i32, Array1<f64>> = HashMap::new();
        let mut toroidal: HashMap<i32, Array1<f64>> = HashMap::new();
        for &[l, m, n] in &self.modes {
            let key = match self.kind {
                BasisKind::PowerSeries => (l, -1),
                BasisKind::DoubleFourierSeries => (0, 0),
                _ => (l, m.abs()),
            };
            radial.entry(key).or_insert_with(|| match self.kind {
                BasisKind::PowerSeries => rho.mapv(|r| power(r, l as usize, dr)),
                BasisKind::DoubleFourierSeries => Array1::ones(num_nodes),
                _ => rho.mapv(|r| zernike_radial(r, l as usize, m.unsigned_abs() as usize, dr)),
            });
            poloidal.entry(m).or_insert_with(|| {
                if poloidal_free {
                    Array1::ones(num_nodes)
                } else {
                    theta.mapv(|t| fourier(t, m, dt))
                }
            });
            toroidal.entry(n).or_insert_with(|| {
                if toroidal_free {
                    Array1::ones(num_nodes)
                } else {
                    zeta.mapv(|z| fourier(nfp * z, n, dz) * nfp.powi(dz as i32))
                }
            });
        }

        for (k, &[l, m, n]) in self.modes.iter().enumerate() {
            let key = match self.kind {
                BasisKind::PowerSeries => (l, -1),
                BasisKind::DoubleFourierSeries => (0, 0),
                _ => (l, m.abs()),
            };
            let (Some(r), Some(p), Some(t)) =
                (radial.get(&key), poloidal.get(&m), toroidal.get(&n))
            else {
                continue;
            };
            let mut col = out.column_mut(k);
            for i in 0..num_nodes {
                col[i] = r[i] * p[i] * t[i];
            }
        }
        Ok(out)
    }
}

/// d^k/dρ^k of ρ^l.
pub fn power(rho: f64, l: usize, k: usize) -> f64 {
    if k > l {
        return 0.0;
    }
    falling_factorial(l, k) * rho.powi((l - k) as i32)
}

/// d^k/dx^k of cos(m x) for m ≥ 0, of sin(|m| x) for m < 0.
pub fn fourier(x: f64, m: i32, k: usize) -> f64 {
    let am = m.unsigned_abs() as f64;
    let scale = am.powi(k as i32);
    if scale == 0.0 {
        return if m == 0 && k == 0 { 1.0 } else { 0.0 };
    }
    let y = am * x;
    let value = if m >= 0 {
        match k % 4 {
            0 => y.cos(),
            1 => -y.sin(),
            2 => -y.cos(),
            _ => y.sin(),
        }
    } else {
        match k % 4 {
            0 => y.sin(),
            1 => y.cos(),
            2 => -y.sin(),
            _ => -y.cos(),
        }
    };
    scale * value
}

/// d^k/dρ^k of the Zernike radial polynomial R_l^m(ρ), m ≥ 0.
///
/// Uses R_l^m(ρ) = (-1)^s ρ^m P_s^(m,0)(1 - 2ρ²), s = (l-m)/2, which is stable
/// for high l where the explicit factorial sum cancels catastrophically.
/// Derivatives of the Jacobi factor come from Faà di Bruno on the quadratic
/// inner map x(ρ) = 1 - 2ρ² (only x' = -4ρ and x'' = -4 survive).
pub fn zernike_radial(rho: f64, l: usize, m: usize, k: usize) -> f64 {
    if m > l || (l - m) % 2 != 0 {
        return 0.0;
    }
    let s = (l - m) / 2;
    let sign = if s % 2 == 0 { 1.0 } else { -1.0 };
    let x = 1.0 - 2.0 * rho * rho;
    let dx = -4.0 * rho;
    let ddx: f64 = -4.0;
    let alpha = m as f64;

    // g^(j)(ρ) for j = 0..=k
    let g: Vec<f64> = (0..=k)
        .map(|j| {
            let mut acc = 0.0;
            for b in 0..=(j / 2) {
                let a = j - 2 * b;
                let coeff = factorial(j) / (factorial(a) * factorial(b) * 2f64.powi(b as i32));
                acc += coeff
                    * jacobi_derivative(s, alpha, 0.0, x, j - b)
                    * dx.powi(a as i32)
                    * ddx.powi(b as i32);
            }
            acc
        })
        .collect();

    let mut total = 0.0;
    for i in 0..=k.min(m) {
        let rho_part = falling_factorial(m, i) * rho.powi((m - i) as i32);
        total += binomial(k, i) * rho_part * g[k - i];
    }
    sign * total
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Explicit factorial sum, adequate for moderate l.
    fn zernike_reference(rho: f64, l: usize, m: usize, k: usize) -> f64 {
        let mut total = 0.0;
        for s in 0..=((l - m) / 2) {
            let coeff = (if s % 2 == 0 { 1.0 } else { -1.0 }) * factorial(l - s)
                / (factorial(s) * factorial((l + m) / 2 - s) * factorial((l - m) / 2 - s));
            total += coeff * power(rho, l - 2 * s, k);
        }
        total
    }

    #[test]
    fn test_zernike_known_polynomials() {
        for &r in &[0.0f64, 0.25, 0.5, 0.9, 1.0] {
            let z31 = 3.0 * r.powi(3) - 2.0 * r;
            let z42 = 4.0 * r.powi(4) - 3.0 * r.powi(2);
            let z62 = 15.0 * r.powi(6) - 20.0 * r.powi(4) + 6.0 * r.powi(2);
            assert!((zernike_radial(r, 3, 1, 0) - z31).abs() < 1e-13);
            assert!((zernike_radial(r, 4, 2, 0) - z42).abs() < 1e-13);
            assert!((zernike_radial(r, 6, 2, 0) - z62).abs() < 1e-12);

            let dz31 = 9.0 * r * r - 2.0;
            let dz42 = 16.0 * r.powi(3) - 6.0 * r;
            let dz62 = 90.0 * r.powi(5) - 80.0 * r.powi(3) + 12.0 * r;
            assert!((zernike_radial(r, 3, 1, 1) - dz31).abs() < 1e-12);
            assert!((zernike_radial(r, 4, 2, 1) - dz42).abs() < 1e-12);
            assert!((zernike_radial(r, 6, 2, 1) - dz62).abs() < 1e-11);
        }
    }

    #[test]
    fn test_zernike_matches_factorial_sum() {
        let samples = [0.0, 0.1, 0.37, 0.5, 0.77, 0.95, 1.0];
        for l in 0..=20usize {
            for m in (l % 2..=l).step_by(2) {
                for k in 0..=3 {
                    for &r in &samples {
                        let got = zernike_radial(r, l, m, k);
                        let expected = zernike_reference(r, l, m, k);
                        assert!(
                            (got - expected).abs() < 1e-8 * expected.abs().max(1.0),
                            "R_{l}^{m} d{k} at ρ={r}: {got} vs {expected}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_zernike_unit_edge_value() {
        // R_l^m(1) = 1 for every valid pair
        for l in 0..40usize {
            for m in (l % 2..=l).step_by(2) {
                assert!((zernike_radial(1.0, l, m, 0) - 1.0).abs() < 1e-9, "l={l} m={m}");
            }
        }
    }

    #[test]
    fn test_fourier_derivatives() {
        let t = 0.7;
        assert!((fourier(t, 0, 0) - 1.0).abs() < 1e-15);
        assert_eq!(fourier(t, 0, 1), 0.0);
        assert!((fourier(t, 2, 0) - (2.0 * t).cos()).abs() < 1e-15);
        assert!((fourier(t, 2, 1) + 2.0 * (2.0 * t).sin()).abs() < 1e-14);
        assert!((fourier(t, -3, 0) - (3.0 * t).sin()).abs() < 1e-15);
        assert!((fourier(t, -3, 2) + 9.0 * (3.0 * t).sin()).abs() < 1e-13);
    }

    #[test]
    fn test_double_fourier_ordering() {
        let basis = Basis::double_fourier(1, 1, 1, Symmetry::None);
        let nodes = array![[0.0, 1.0, 0.5]];
        let values = basis.evaluate(&nodes, [0, 0, 0]).expect("evaluate");
        let (t, z): (f64, f64) = (1.0, 0.5);
        let expected = [
            t.sin() * z.sin(),
            z.sin(),
            t.cos() * z.sin(),
            t.sin(),
            1.0,
            t.cos(),
            t.sin() * z.cos(),
            z.cos(),
            t.cos() * z.cos(),
        ];
        for (k, e) in expected.iter().enumerate() {
            assert!((values[[0, k]] - e).abs() < 1e-14, "mode {k}");
        }
    }

    #[test]
    fn test_power_series_derivatives() {
        let basis = Basis::power_series(3);
        let nodes = array![[0.5, 0.0, 0.0]];
        let d1 = basis.evaluate(&nodes, [1, 0, 0]).expect("evaluate");
        assert_eq!(d1[[0, 0]], 0.0);
        assert!((d1[[0, 2]] - 1.0).abs() < 1e-15);
        assert!((d1[[0, 3]] - 0.75).abs() < 1e-15);
        let dt = basis.evaluate(&nodes, [0, 1, 0]).expect("evaluate");
        assert!(dt.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_symmetry_partitions_modes() {
        let full = Basis::fourier_zernike(4, 4, 2, 1, Symmetry::None, SpectralIndexing::Ansi);
        let cos = Basis::fourier_zernike(4, 4, 2, 1, Symmetry::Cos, SpectralIndexing::Ansi);
        let sin = Basis::fourier_zernike(4, 4, 2, 1, Symmetry::Sin, SpectralIndexing::Ansi);
        assert_eq!(cos.num_modes() + sin.num_modes(), full.num_modes());
        assert!(cos.get_idx(0, 0, 0).is_some());
        assert!(sin.get_idx(0, 0, 0).is_none());
        assert!(sin.get_idx(1, -1, 0).is_some());
    }

    #[test]
    fn test_fringe_is_subset_of_ansi() {
        let ansi = Basis::zernike(8, 2, Symmetry::None, SpectralIndexing::Ansi);
        let fringe = Basis::zernike(8, 2, Symmetry::None, SpectralIndexing::Fringe);
        assert!(fringe.num_modes() < ansi.num_modes());
        for mode in fringe.modes() {
            assert!(ansi.modes().contains(mode));
            assert!(mode[0] + mode[1].abs() <= 4);
        }
        assert!("zigzag".parse::<SpectralIndexing>().is_err());
    }

    #[test]
    fn test_fourier_zernike_toroidal_derivative() {
        let basis = Basis::fourier_zernike(1, 1, 1, 3, Symmetry::None, SpectralIndexing::Ansi);
        let idx = basis.get_idx(1, 1, 1).expect("mode present");
        let nodes = array![[0.6, 0.4, 0.2]];
        let d = basis.evaluate(&nodes, [0, 0, 1]).expect("evaluate");
        let expected = 0.6 * 0.4f64.cos() * (-3.0 * (3.0 * 0.2f64).sin());
        assert!((d[[0, idx]] - expected).abs() < 1e-14);
    }
}
