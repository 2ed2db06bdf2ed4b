//! Cylindrical (R, φ, Z) and Cartesian (x, y, z) conversions for (n, 3) arrays.

use flux_types::error::{FluxError, FluxResult};
use ndarray::{Array2, Axis};

/// Basis of input coordinates and returned vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordBasis {
    #[default]
    Rpz,
    Xyz,
}

impl std::str::FromStr for CoordBasis {
    type Err = FluxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rpz" => Ok(CoordBasis::Rpz),
            "xyz" => Ok(CoordBasis::Xyz),
            other => Err(FluxError::ConfigError(format!(
                "coordinate basis '{other}' is not supported (expected rpz or xyz)"
            ))),
        }
    }
}

pub(crate) fn check_points(what: &str, a: &Array2<f64>) -> FluxResult<()> {
    if a.ncols() != 3 {
        return Err(FluxError::DimensionMismatch(format!(
            "{what} must have 3 columns, got {}",
            a.ncols()
        )));
    }
    Ok(())
}

pub fn rpz2xyz(rpz: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::zeros(rpz.raw_dim());
    for (mut o, p) in out.axis_iter_mut(Axis(0)).zip(rpz.axis_iter(Axis(0))) {
        o[0] = p[0] * p[1].cos();
        o[1] = p[0] * p[1].sin();
        o[2] = p[2];
    }
    out
}

pub fn xyz2rpz(xyz: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::zeros(xyz.raw_dim());
    for (mut o, p) in out.axis_iter_mut(Axis(0)).zip(xyz.axis_iter(Axis(0))) {
        o[0] = p[0].hypot(p[1]);
        o[1] = p[1].atan2(p[0]);
        o[2] = p[2];
    }
    out
}

/// Cartesian vector components to (R, φ, Z) components at positions `xyz`.
pub fn xyz2rpz_vec(vec: &Array2<f64>, xyz: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::zeros(vec.raw_dim());
    for ((mut o, v), p) in out
        .axis_iter_mut(Axis(0))
        .zip(vec.axis_iter(Axis(0)))
        .zip(xyz.axis_iter(Axis(0)))
    {
        let phi = p[1].atan2(p[0]);
        let (s, c) = phi.sin_cos();
        o[0] = c * v[0] + s * v[1];
        o[1] = -s * v[0] + c * v[1];
        o[2] = v[2];
    }
    out
}
