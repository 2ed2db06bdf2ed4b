// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Flux Surface Nesting Check
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Geometric validity of an equilibrium on one toroidal plane.
//!
//! Surfaces are nested when the ρ contours and the straight-field-line θ
//! contours are each a family of simple curves: no contour crosses itself and
//! no two contours of a family cross. θ contours all start on the axis, so a
//! touch at that shared start point is allowed.

use std::f64::consts::PI;

use flux_types::error::FluxResult;
use geo::line_intersection::{line_intersection, LineIntersection};
use geo::Line;
use ndarray::{Array1, Array2};

use crate::equilibrium::Equilibrium;

/// Resolution of the nesting check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NestingCheck {
    /// ρ contours, at ρ = k / nsurfs for k = 1..=nsurfs.
    pub nsurfs: usize,
    /// Straight-field-line θ contours, equispaced in [0, 2π).
    pub ntheta: usize,
    /// Toroidal plane.
    pub zeta: f64,
    /// Points along each ρ contour.
    pub nt: usize,
    /// Points along each θ contour.
    pub nr: usize,
}

impl Default for NestingCheck {
    fn default() -> Self {
        NestingCheck {
            nsurfs: 10,
            ntheta: 20,
            zeta: 0.0,
            nt: 45,
            nr: 20,
        }
    }
}

type Point = (f64, f64);

impl Equilibrium {
    /// True when flux surfaces are properly nested on the plane ζ = `check.zeta`.
    pub fn is_nested(&self, check: NestingCheck) -> FluxResult<bool> {
        let (nsurfs, nt) = (check.nsurfs.max(1), check.nt.max(3));
        let (ntheta, nr) = (check.ntheta.max(1), check.nr.max(2));

        // ρ contours, closed (θ = 2π duplicates θ = 0)
        let mut nodes = Array2::zeros((nsurfs * nt, 3));
        for k in 0..nsurfs {
            let rho = (k + 1) as f64 / nsurfs as f64;
            for j in 0..nt {
                let row = k * nt + j;
                nodes[[row, 0]] = rho;
                nodes[[row, 1]] = 2.0 * PI * j as f64 / (nt - 1) as f64;
                nodes[[row, 2]] = check.zeta;
            }
        }
        let (r, z) = self.toroidal_coords(&nodes)?;
        let rings: Vec<Vec<Point>> = (0..nsurfs)
            .map(|k| (0..nt).map(|j| (r[k * nt + j], z[k * nt + j])).collect())
            .collect();

        // θ contours from the axis outward, at θ = ϑ − λ
        let mut nodes = Array2::zeros((ntheta * nr, 3));
        for k in 0..ntheta {
            let theta = 2.0 * PI * k as f64 / ntheta as f64;
            for j in 0..nr {
                let row = k * nr + j;
                nodes[[row, 0]] = j as f64 / (nr - 1) as f64;
                nodes[[row, 1]] = theta;
                nodes[[row, 2]] = check.zeta;
            }
        }
        let lambda = self.l_basis().evaluate(&nodes, [0, 0, 0])?.dot(self.l_lmn());
        for (row, lmbda) in lambda.iter().enumerate() {
            nodes[[row, 1]] -= lmbda;
        }
        let (r, z) = self.toroidal_coords(&nodes)?;
        let lines: Vec<Vec<Point>> = (0..ntheta)
            .map(|k| (0..nr).map(|j| (r[k * nr + j], z[k * nr + j])).collect())
            .collect();

        let nested = family_is_simple(&rings, true, false) && family_is_simple(&lines, false, true);
        if !nested {
            log::debug!("flux surfaces are not nested on zeta = {}", check.zeta);
        }
        Ok(nested)
    }

    fn toroidal_coords(&self, nodes: &Array2<f64>) -> FluxResult<(Array1<f64>, Array1<f64>)> {
        let r = self.r_basis().evaluate(nodes, [0, 0, 0])?.dot(self.r_lmn());
        let z = self.z_basis().evaluate(nodes, [0, 0, 0])?.dot(self.z_lmn());
        Ok((r, z))
    }
}

fn segments(line: &[Point]) -> Vec<Line<f64>> {
    line.windows(2)
        .filter(|w| w[0] != w[1])
        .map(|w| Line::new(w[0], w[1]))
        .collect()
}

fn is_simple(line: &[Point], closed: bool) -> bool {
    let segs = segments(line);
    let n = segs.len();
    for i in 0..n {
        for j in i + 2..n {
            if closed && i == 0 && j == n - 1 {
                continue;
            }
            if line_intersection(segs[i], segs[j]).is_some() {
                return false;
            }
        }
    }
    true
}

/// Every curve simple and no two curves meeting. With `shared_start`, curves
/// may touch where they all begin, provided they leave it in different
/// directions.
fn family_is_simple(lines: &[Vec<Point>], closed: bool, shared_start: bool) -> bool {
    if !lines.iter().all(|line| is_simple(line, closed)) {
        return false;
    }
    let segs: Vec<Vec<Line<f64>>> = lines.iter().map(|line| segments(line)).collect();
    for a in 0..segs.len() {
        for b in a + 1..segs.len() {
            for (i, &sa) in segs[a].iter().enumerate() {
                for (j, &sb) in segs[b].iter().enumerate() {
                    match line_intersection(sa, sb) {
                        None => {}
                        Some(LineIntersection::SinglePoint { intersection, .. })
                            if shared_start
                                && i == 0
                                && j == 0
                                && intersection == sa.start
                                && intersection == sb.start => {}
                        Some(_) => return false,
                    }
                }
            }
        }
    }
    true
}
