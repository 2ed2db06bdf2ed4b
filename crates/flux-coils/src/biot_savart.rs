// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Biot-Savart
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Magnetic field of a closed filamentary polyline.
//!
//! Each straight segment contributes its exact field (Hanson & Hirshman):
//!
//!   B = (μ₀ I / 4π) · (|a| + |b|) / (|a||b| (|a||b| + a·b)) · (a × b)
//!
//! with a, b the vectors from the evaluation point to the segment ends.

use flux_types::constants::MU0_OVER_4PI;
use flux_types::error::FluxResult;
use ndarray::{Array2, ArrayView1, Axis};

use crate::coords::check_points;

fn segment_field(p: ArrayView1<f64>, start: ArrayView1<f64>, end: ArrayView1<f64>) -> [f64; 3] {
    let a = [start[0] - p[0], start[1] - p[1], start[2] - p[2]];
    let b = [end[0] - p[0], end[1] - p[1], end[2] - p[2]];
    let na = (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt();
    let nb = (b[0] * b[0] + b[1] * b[1] + b[2] * b[2]).sqrt();
    let ab = a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
    let factor = (na + nb) / (na * nb * (na * nb + ab));
    [
        factor * (a[1] * b[2] - a[2] * b[1]),
        factor * (a[2] * b[0] - a[0] * b[2]),
        factor * (a[0] * b[1] - a[1] * b[0]),
    ]
}

/// Field at `eval` (n, 3) of `current` flowing along the closed polyline
/// `coil` (m, 3), both Cartesian. The closing segment back to the first point
/// is implied; zero-length segments contribute nothing. The field is singular
/// on the filament itself.
pub fn biot_savart(eval: &Array2<f64>, coil: &Array2<f64>, current: f64) -> FluxResult<Array2<f64>> {
    check_points("evaluation points", eval)?;
    check_points("coil points", coil)?;
    let m = coil.nrows();
    let mut out = Array2::zeros((eval.nrows(), 3));
    for (mut b, p) in out.axis_iter_mut(Axis(0)).zip(eval.axis_iter(Axis(0))) {
        for j in 0..m {
            let (start, end) = (coil.row(j), coil.row((j + 1) % m));
            if start == end {
                continue;
            }
            let db = segment_field(p, start, end);
            for k in 0..3 {
                b[k] += db[k];
            }
        }
    }
    out *= MU0_OVER_4PI * current;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flux_types::constants::MU0;
    use ndarray::array;
    use std::f64::consts::PI;

    fn loop_points(a: f64, n: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, 3), |(i, k)| {
            let t = 2.0 * PI * i as f64 / n as f64;
            [a * t.cos(), a * t.sin(), 0.0][k]
        })
    }

    #[test]
    fn test_loop_centre_field() {
        let (a, current) = (1.5, 2.0e4);
        let b = biot_savart(&array![[0.0, 0.0, 0.0]], &loop_points(a, 512), current).expect("field");
        let expected = MU0 * current / (2.0 * a);
        assert!(b[[0, 0]].abs() < 1e-12 * expected);
        assert!((b[[0, 2]] - expected).abs() < 1e-4 * expected, "{} vs {expected}", b[[0, 2]]);
    }

    #[test]
    fn test_loop_on_axis_field() {
        let (a, z, current) = (1.0, 0.7, 1.0e3);
        let b = biot_savart(&array![[0.0, 0.0, z]], &loop_points(a, 512), current).expect("field");
        let expected = MU0 * current * a * a / (2.0 * (a * a + z * z).powf(1.5));
        assert!((b[[0, 2]] - expected).abs() < 1e-4 * expected);
    }

    #[test]
    fn test_finite_straight_wire() {
        // a long rectangle: the near side dominates and matches the finite-wire formula
        let (l, d) = (50.0, 0.1);
        let coil = array![[0.0, -l, 0.0], [0.0, l, 0.0], [1e6, l, 0.0], [1e6, -l, 0.0]];
        let b = biot_savart(&array![[d, 0.0, 0.0]], &coil, 1.0).expect("field");
        let expected = MU0 / (4.0 * PI) * 2.0 * l / (d * (d * d + l * l).sqrt());
        assert!((b[[0, 2]].abs() - expected).abs() < 5e-3 * expected);
    }

    #[test]
    fn test_repeated_closing_point_is_harmless() {
        let open = loop_points(1.0, 64);
        let mut closed = Array2::zeros((65, 3));
        closed.slice_mut(ndarray::s![..64, ..]).assign(&open);
        closed.row_mut(64).assign(&open.row(0));
        let p = array![[0.2, -0.1, 0.3]];
        let b1 = biot_savart(&p, &open, 1.0).expect("field");
        let b2 = biot_savart(&p, &closed, 1.0).expect("field");
        for (x, y) in b1.iter().zip(b2.iter()) {
            assert!((x - y).abs() < 1e-15);
        }
        assert!(biot_savart(&array![[0.0, 0.0]], &open, 1.0).is_err());
    }
}
