// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Space Curves
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Closed space curves parameterized by an angle s ∈ [0, 2π).
//!
//! Each curve evaluates itself in its own local frame; a rigid-body `Frame`
//! (rotation then shift) places it in space afterwards, so translate, rotate
//! and flip never touch the shape coefficients.

use std::f64::consts::PI;
use std::fmt;

use flux_math::basis::fourier;
use flux_types::error::{FluxError, FluxResult};
use ndarray::{Array1, Array2, Axis};

use crate::coords::{xyz2rpz, xyz2rpz_vec, CoordBasis};

/// Points per curve when no resolution is requested.
pub const DEFAULT_RESOLUTION: usize = 64;

/// n equispaced parameter values in [0, 2π).
pub fn periodic_nodes(n: usize) -> Array1<f64> {
    Array1::from_iter((0..n).map(|i| 2.0 * PI * i as f64 / n as f64))
}

type Mat3 = [[f64; 3]; 3];

const IDENTITY: Mat3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

fn unit(v: [f64; 3], what: &str) -> FluxResult<[f64; 3]> {
    let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if !norm.is_finite() || norm == 0.0 {
        return Err(FluxError::ConfigError(format!(
            "{what} must be a finite non-zero vector, got {v:?}"
        )));
    }
    Ok([v[0] / norm, v[1] / norm, v[2] / norm])
}

fn mat_vec(m: &Mat3, v: [f64; 3]) -> [f64; 3] {
    [0usize, 1, 2].map(|i| m[i][0] * v[0] + m[i][1] * v[1] + m[i][2] * v[2])
}

fn mat_mat(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// Rodrigues rotation by `angle` about the unit vector `k`.
pub fn rotation_matrix(k: [f64; 3], angle: f64) -> Mat3 {
    let (s, c) = angle.sin_cos();
    let t = 1.0 - c;
    let [x, y, z] = k;
    [
        [c + t * x * x, t * x * y - s * z, t * x * z + s * y],
        [t * x * y + s * z, c + t * y * y, t * y * z - s * x],
        [t * x * z - s * y, t * y * z + s * x, c + t * z * z],
    ]
}

/// Rigid-body placement x ↦ Q x + shift.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    rotmat: Mat3,
    shift: [f64; 3],
}

impl Default for Frame {
    fn default() -> Self {
        Frame {
            rotmat: IDENTITY,
            shift: [0.0; 3],
        }
    }
}

impl Frame {
    pub fn rotmat(&self) -> &Mat3 {
        &self.rotmat
    }

    pub fn shift(&self) -> [f64; 3] {
        self.shift
    }

    fn compose(&mut self, m: &Mat3) {
        self.rotmat = mat_mat(m, &self.rotmat);
        self.shift = mat_vec(m, self.shift);
    }

    pub fn translate(&mut self, displacement: [f64; 3]) {
        for (s, d) in self.shift.iter_mut().zip(displacement) {
            *s += d;
        }
    }

    pub fn rotate(&mut self, axis: [f64; 3], angle: f64) -> FluxResult<()> {
        let k = unit(axis, "rotation axis")?;
        self.compose(&rotation_matrix(k, angle));
        Ok(())
    }

    /// Reflect across the plane through the origin with the given normal.
    pub fn flip(&mut self, normal: [f64; 3]) -> FluxResult<()> {
        let n = unit(normal, "flip normal")?;
        let mut m = IDENTITY;
        for i in 0..3 {
            for j in 0..3 {
                m[i][j] -= 2.0 * n[i] * n[j];
            }
        }
        self.compose(&m);
        Ok(())
    }

    /// Place local points; derivatives (`translate == false`) only rotate.
    pub fn apply(&self, local: &Array2<f64>, translate: bool) -> Array2<f64> {
        let mut out = Array2::zeros(local.raw_dim());
        for (mut o, p) in out.axis_iter_mut(Axis(0)).zip(local.axis_iter(Axis(0))) {
            let v = mat_vec(&self.rotmat, [p[0], p[1], p[2]]);
            for i in 0..3 {
                o[i] = if translate { v[i] + self.shift[i] } else { v[i] };
            }
        }
        out
    }
}

/// Unit tangent, normal and binormal per evaluation point.
#[derive(Debug, Clone, PartialEq)]
pub struct FrenetFrame {
    pub tangent: Array2<f64>,
    pub normal: Array2<f64>,
    pub binormal: Array2<f64>,
}

fn row_cross(a: &Array2<f64>, b: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::zeros(a.raw_dim());
    for i in 0..a.nrows() {
        out[[i, 0]] = a[[i, 1]] * b[[i, 2]] - a[[i, 2]] * b[[i, 1]];
        out[[i, 1]] = a[[i, 2]] * b[[i, 0]] - a[[i, 0]] * b[[i, 2]];
        out[[i, 2]] = a[[i, 0]] * b[[i, 1]] - a[[i, 1]] * b[[i, 0]];
    }
    out
}

fn row_norm(a: &Array2<f64>) -> Array1<f64> {
    a.map_axis(Axis(1), |r| r.dot(&r).sqrt())
}

fn normalized(a: &Array2<f64>) -> Array2<f64> {
    let n = row_norm(a);
    a / &n.insert_axis(Axis(1))
}

/// A closed curve with a rigid-body frame.
pub trait Curve: fmt::Debug + Send + Sync {
    /// d^dt/ds^dt of the curve in its own frame, Cartesian, shape (n, 3).
    fn local_coordinates(&self, s: &Array1<f64>, dt: usize) -> FluxResult<Array2<f64>>;

    fn frame(&self) -> &Frame;

    fn frame_mut(&mut self) -> &mut Frame;

    fn clone_box(&self) -> Box<dyn Curve>;

    /// Parameter values used when no resolution is requested.
    fn default_nodes(&self) -> Array1<f64> {
        periodic_nodes(DEFAULT_RESOLUTION)
    }

    fn nodes(&self, resolution: Option<usize>) -> Array1<f64> {
        match resolution {
            Some(n) => periodic_nodes(n),
            None => self.default_nodes(),
        }
    }

    /// Positions (dt = 0) or derivatives of the placed curve.
    fn compute_coordinates(
        &self,
        s: &Array1<f64>,
        dt: usize,
        basis: CoordBasis,
    ) -> FluxResult<Array2<f64>> {
        let xyz = self.frame().apply(&self.local_coordinates(s, dt)?, dt == 0);
        Ok(match (basis, dt) {
            (CoordBasis::Xyz, _) => xyz,
            (CoordBasis::Rpz, 0) => xyz2rpz(&xyz),
            (CoordBasis::Rpz, _) => {
                let pos = self.frame().apply(&self.local_coordinates(s, 0)?, true);
                xyz2rpz_vec(&xyz, &pos)
            }
        })
    }

    /// Frenet frame from the first two derivatives. Straight pieces have no
    /// defined normal and give NaN there.
    fn compute_frenet_frame(&self, s: &Array1<f64>, basis: CoordBasis) -> FluxResult<FrenetFrame> {
        let d1 = self.compute_coordinates(s, 1, CoordBasis::Xyz)?;
        let d2 = self.compute_coordinates(s, 2, CoordBasis::Xyz)?;
        let tangent = normalized(&d1);
        let binormal = normalized(&row_cross(&d1, &d2));
        let normal = row_cross(&binormal, &tangent);
        Ok(match basis {
            CoordBasis::Xyz => FrenetFrame {
                tangent,
                normal,
                binormal,
            },
            CoordBasis::Rpz => {
                let pos = self.compute_coordinates(s, 0, CoordBasis::Xyz)?;
                FrenetFrame {
                    tangent: xyz2rpz_vec(&tangent, &pos),
                    normal: xyz2rpz_vec(&normal, &pos),
                    binormal: xyz2rpz_vec(&binormal, &pos),
                }
            }
        })
    }

    /// κ = |r′ × r″| / |r′|³.
    fn compute_curvature(&self, s: &Array1<f64>) -> FluxResult<Array1<f64>> {
        let d1 = self.compute_coordinates(s, 1, CoordBasis::Xyz)?;
        let d2 = self.compute_coordinates(s, 2, CoordBasis::Xyz)?;
        let speed = row_norm(&d1);
        Ok(row_norm(&row_cross(&d1, &d2)) / speed.mapv(|v| v.powi(3)))
    }

    /// τ = (r′ × r″)·r‴ / |r′ × r″|². NaN where the curve is straight.
    fn compute_torsion(&self, s: &Array1<f64>) -> FluxResult<Array1<f64>> {
        let d1 = self.compute_coordinates(s, 1, CoordBasis::Xyz)?;
        let d2 = self.compute_coordinates(s, 2, CoordBasis::Xyz)?;
        let d3 = self.compute_coordinates(s, 3, CoordBasis::Xyz)?;
        let c = row_cross(&d1, &d2);
        let triple = (&c * &d3).sum_axis(Axis(1));
        Ok(triple / row_norm(&c).mapv(|v| v * v))
    }

    /// ∮ |r′| ds by the periodic trapezoidal rule.
    fn compute_length(&self, resolution: Option<usize>) -> FluxResult<f64> {
        let s = self.nodes(resolution);
        let speed = row_norm(&self.compute_coordinates(&s, 1, CoordBasis::Xyz)?);
        Ok(speed.sum() * 2.0 * PI / s.len().max(1) as f64)
    }

    fn translate(&mut self, displacement: [f64; 3]) {
        self.frame_mut().translate(displacement);
    }

    fn rotate(&mut self, axis: [f64; 3], angle: f64) -> FluxResult<()> {
        self.frame_mut().rotate(axis, angle)
    }

    fn flip(&mut self, normal: [f64; 3]) -> FluxResult<()> {
        self.frame_mut().flip(normal)
    }
}

impl Clone for Box<dyn Curve> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

// ── Spectral helpers ─────────────────────────────────────────────────

/// Modes −N..=N for 2N+1 coefficients.
fn default_modes(len: usize, what: &str) -> FluxResult<Vec<i32>> {
    if len % 2 == 0 {
        return Err(FluxError::ConfigError(format!(
            "{what} needs explicit modes for an even number ({len}) of coefficients"
        )));
    }
    let n = (len / 2) as i32;
    Ok((-n..=n).collect())
}

fn resolve_modes(coeffs: &[f64], modes: Option<Vec<i32>>, what: &str) -> FluxResult<Vec<i32>> {
    let modes = match modes {
        Some(m) => m,
        None => default_modes(coeffs.len(), what)?,
    };
    if modes.len() != coeffs.len() {
        return Err(FluxError::DimensionMismatch(format!(
            "{what}: {} coefficients for {} modes",
            coeffs.len(),
            modes.len()
        )));
    }
    Ok(modes)
}

/// d^k/dx^k of Σ c_n F_n(nfp x).
fn series(coeffs: &[f64], modes: &[i32], x: f64, nfp: f64, k: usize) -> f64 {
    let scale = nfp.powi(k as i32);
    coeffs
        .iter()
        .zip(modes)
        .map(|(c, &n)| c * fourier(nfp * x, n, k))
        .sum::<f64>()
        * scale
}

fn binom(n: usize, k: usize) -> f64 {
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// d^k/da^k of (r(a) cos a, r(a) sin a), with `radius(j)` the j-th derivative of r.
fn polar(radius: impl Fn(usize) -> f64, a: f64, k: usize) -> (f64, f64) {
    (0..=k).fold((0.0, 0.0), |(x, y), j| {
        let w = binom(k, j) * radius(j);
        (x + w * fourier(a, 1, k - j), y + w * fourier(a, -1, k - j))
    })
}

// ── Curves ───────────────────────────────────────────────────────────

/// R(φ), Z(φ) as Fourier series in the toroidal angle; s = φ.
#[derive(Debug, Clone, PartialEq)]
pub struct FourierRzCurve {
    r_n: Vec<f64>,
    z_n: Vec<f64>,
    modes_r: Vec<i32>,
    modes_z: Vec<i32>,
    nfp: usize,
    frame: Frame,
}

impl FourierRzCurve {
    pub fn new(
        r_n: Vec<f64>,
        z_n: Vec<f64>,
        modes_r: Option<Vec<i32>>,
        modes_z: Option<Vec<i32>>,
        nfp: usize,
    ) -> FluxResult<Self> {
        if nfp == 0 {
            return Err(FluxError::ConfigError("NFP must be positive".to_string()));
        }
        let modes_r = resolve_modes(&r_n, modes_r, "R_n")?;
        let modes_z = match modes_z {
            None if z_n.len() == r_n.len() => modes_r.clone(),
            other => resolve_modes(&z_n, other, "Z_n")?,
        };
        Ok(FourierRzCurve {
            r_n,
            z_n,
            modes_r,
            modes_z,
            nfp,
            frame: Frame::default(),
        })
    }

    pub fn r_n(&self) -> &[f64] {
        &self.r_n
    }
    pub fn z_n(&self) -> &[f64] {
        &self.z_n
    }
    pub fn nfp(&self) -> usize {
        self.nfp
    }
}

impl Curve for FourierRzCurve {
    fn local_coordinates(&self, s: &Array1<f64>, dt: usize) -> FluxResult<Array2<f64>> {
        let nfp = self.nfp as f64;
        let mut out = Array2::zeros((s.len(), 3));
        for (i, &phi) in s.iter().enumerate() {
            let radius = |j| series(&self.r_n, &self.modes_r, phi, nfp, j);
            let (x, y) = polar(radius, phi, dt);
            out[[i, 0]] = x;
            out[[i, 1]] = y;
            out[[i, 2]] = series(&self.z_n, &self.modes_z, phi, nfp, dt);
        }
        Ok(out)
    }

    fn frame(&self) -> &Frame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    fn clone_box(&self) -> Box<dyn Curve> {
        Box::new(self.clone())
    }
}

/// X(s), Y(s), Z(s) as Fourier series in an arbitrary angle.
#[derive(Debug, Clone, PartialEq)]
pub struct FourierXyzCurve {
    x_n: Vec<f64>,
    y_n: Vec<f64>,
    z_n: Vec<f64>,
    modes: Vec<i32>,
    frame: Frame,
}

impl FourierXyzCurve {
    pub fn new(x_n: Vec<f64>, y_n: Vec<f64>, z_n: Vec<f64>, modes: Option<Vec<i32>>) -> FluxResult<Self> {
        let modes = resolve_modes(&x_n, modes, "X_n")?;
        if y_n.len() != modes.len() || z_n.len() != modes.len() {
            return Err(FluxError::DimensionMismatch(format!(
                "X_n, Y_n, Z_n lengths differ: {}, {}, {}",
                x_n.len(),
                y_n.len(),
                z_n.len()
            )));
        }
        Ok(FourierXyzCurve {
            x_n,
            y_n,
            z_n,
            modes,
            frame: Frame::default(),
        })
    }
}

impl Curve for FourierXyzCurve {
    fn local_coordinates(&self, s: &Array1<f64>, dt: usize) -> FluxResult<Array2<f64>> {
        let mut out = Array2::zeros((s.len(), 3));
        for (i, &t) in s.iter().enumerate() {
            out[[i, 0]] = series(&self.x_n, &self.modes, t, 1.0, dt);
            out[[i, 1]] = series(&self.y_n, &self.modes, t, 1.0, dt);
            out[[i, 2]] = series(&self.z_n, &self.modes, t, 1.0, dt);
        }
        Ok(out)
    }

    fn frame(&self) -> &Frame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    fn clone_box(&self) -> Box<dyn Curve> {
        Box::new(self.clone())
    }
}

/// A curve in the plane through `center` with the given normal; the distance
/// from the center is a Fourier series in the polar angle.
#[derive(Debug, Clone, PartialEq)]
pub struct FourierPlanarCurve {
    center: [f64; 3],
    normal: [f64; 3],
    r_n: Vec<f64>,
    modes: Vec<i32>,
    orient: Mat3,
    frame: Frame,
}

impl FourierPlanarCurve {
    pub fn new(center: [f64; 3], normal: [f64; 3], r_n: Vec<f64>, modes: Option<Vec<i32>>) -> FluxResult<Self> {
        let normal = unit(normal, "plane normal")?;
        let modes = resolve_modes(&r_n, modes, "r_n")?;
        // rotation taking ẑ onto the normal
        let axis = [-normal[1], normal[0], 0.0];
        let sin = axis[0].hypot(axis[1]);
        let orient = if sin < 1e-14 {
            if normal[2] > 0.0 {
                IDENTITY
            } else {
                rotation_matrix([1.0, 0.0, 0.0], PI)
            }
        } else {
            rotation_matrix([axis[0] / sin, axis[1] / sin, 0.0], normal[2].clamp(-1.0, 1.0).acos())
        };
        Ok(FourierPlanarCurve {
            center,
            normal,
            r_n,
            modes,
            orient,
            frame: Frame::default(),
        })
    }

    pub fn center(&self) -> [f64; 3] {
        self.center
    }

    pub fn normal(&self) -> [f64; 3] {
        self.normal
    }
}

impl Curve for FourierPlanarCurve {
    fn local_coordinates(&self, s: &Array1<f64>, dt: usize) -> FluxResult<Array2<f64>> {
        let mut out = Array2::zeros((s.len(), 3));
        for (i, &theta) in s.iter().enumerate() {
            let radius = |j| series(&self.r_n, &self.modes, theta, 1.0, j);
            let (x, y) = polar(radius, theta, dt);
            let p = mat_vec(&self.orient, [x, y, 0.0]);
            for k in 0..3 {
                out[[i, k]] = if dt == 0 { p[k] + self.center[k] } else { p[k] };
            }
        }
        Ok(out)
    }

    fn frame(&self) -> &Frame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    fn clone_box(&self) -> Box<dyn Curve> {
        Box::new(self.clone())
    }
}

/// A closed polyline through given points, with knots equispaced in s.
#[derive(Debug, Clone, PartialEq)]
pub struct XyzCurve {
    points: Array2<f64>,
    frame: Frame,
}

impl XyzCurve {
    /// A repeated closing point is dropped.
    pub fn new(x: &[f64], y: &[f64], z: &[f64]) -> FluxResult<Self> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(FluxError::DimensionMismatch(format!(
                "X, Y, Z lengths differ: {}, {}, {}",
                x.len(),
                y.len(),
                z.len()
            )));
        }
        let mut n = x.len();
        if n > 1 && x[0] == x[n - 1] && y[0] == y[n - 1] && z[0] == z[n - 1] {
            n -= 1;
        }
        if n < 3 {
            return Err(FluxError::ConfigError(format!(
                "a closed curve needs at least 3 distinct points, got {n}"
            )));
        }
        let points = Array2::from_shape_fn((n, 3), |(i, k)| [x[i], y[i], z[i]][k]);
        Ok(XyzCurve {
            points,
            frame: Frame::default(),
        })
    }

    pub fn points(&self) -> &Array2<f64> {
        &self.points
    }

    /// Periodic linear interpolation of per-knot rows; knots are hit exactly.
    fn interpolate(knots: &Array2<f64>, s: &Array1<f64>) -> Array2<f64> {
        let n = knots.nrows();
        let h = 2.0 * PI / n as f64;
        let mut out = Array2::zeros((s.len(), 3));
        for (i, &si) in s.iter().enumerate() {
            let t = si.rem_euclid(2.0 * PI) / h;
            if (t - t.round()).abs() < 1e-9 {
                out.row_mut(i).assign(&knots.row(t.round() as usize % n));
                continue;
            }
            let j = t.floor() as usize % n;
            let w = t - t.floor();
            for k in 0..3 {
                out[[i, k]] = (1.0 - w) * knots[[j, k]] + w * knots[[(j + 1) % n, k]];
            }
        }
        out
    }
}

impl Curve for XyzCurve {
    fn local_coordinates(&self, s: &Array1<f64>, dt: usize) -> FluxResult<Array2<f64>> {
        let p = &self.points;
        let n = p.nrows();
        let h = 2.0 * PI / n as f64;
        let knots = match dt {
            0 => return Ok(Self::interpolate(p, s)),
            1 => Array2::from_shape_fn((n, 3), |(i, k)| {
                (p[[(i + 1) % n, k]] - p[[(i + n - 1) % n, k]]) / (2.0 * h)
            }),
            2 => Array2::from_shape_fn((n, 3), |(i, k)| {
                (p[[(i + 1) % n, k]] - 2.0 * p[[i, k]] + p[[(i + n - 1) % n, k]]) / (h * h)
            }),
            3 => Array2::from_shape_fn((n, 3), |(i, k)| {
                (p[[(i + 2) % n, k]] - 2.0 * p[[(i + 1) % n, k]] + 2.0 * p[[(i + n - 1) % n, k]]
                    - p[[(i + n - 2) % n, k]])
                    / (2.0 * h * h * h)
            }),
            _ => {
                return Err(FluxError::ConfigError(format!(
                    "point curves support derivatives up to order 3, got {dt}"
                )))
            }
        };
        Ok(Self::interpolate(&knots, s))
    }

    fn default_nodes(&self) -> Array1<f64> {
        periodic_nodes(self.points.nrows())
    }

    fn frame(&self) -> &Frame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    fn clone_box(&self) -> Box<dyn Curve> {
        Box::new(self.clone())
    }
}
