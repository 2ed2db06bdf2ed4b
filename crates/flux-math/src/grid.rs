// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Collocation Grids
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Collocation grids in flux coordinates (ρ, θ, ζ).
//!
//! Every grid goes through the same finishing sequence after its nodes are
//! generated: enforce stellarator symmetry, sort, locate the magnetic axis,
//! count unique coordinates, scale weights. Weight scaling runs last because it
//! depends on the final, deduplicated node set.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::str::FromStr;

use flux_types::constants::{FOUR_PI_SQ, TWO_PI};
use flux_types::error::{FluxError, FluxResult};
use ndarray::{Array1, Array2, ArrayView1};

use crate::quadrature::{gauss_legendre_unit, shifted_gauss_jacobi};

/// Radial node placement of a concentric grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePattern {
    Linear,
    /// Chebyshev-Gauss-Lobatto points on [0, 1].
    Cheb1,
    /// Outer half of the Chebyshev extrema on [-1, 1].
    Cheb2,
    /// Roots of the shifted Jacobi polynomial with weight ρ.
    Jacobi,
    /// Optimal concentric sampling (cubic in cosine).
    Ocs,
}

impl FromStr for NodePattern {
    type Err = FluxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(NodePattern::Linear),
            "cheb1" => Ok(NodePattern::Cheb1),
            "cheb2" => Ok(NodePattern::Cheb2),
            "jacobi" => Ok(NodePattern::Jacobi),
            "ocs" => Ok(NodePattern::Ocs),
            other => Err(FluxError::ConfigError(format!(
                "node_pattern '{other}' is not supported"
            ))),
        }
    }
}

/// Poloidal offset of the concentric rings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// Δθ/3 under symmetry, else no offset.
    None,
    /// cos(mθ - nζ) symmetry: no offset.
    Cos,
    /// sin(mθ - nζ) symmetry: Δθ/4.
    Sin,
}

impl FromStr for Rotation {
    type Err = FluxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" | "" => Ok(Rotation::None),
            "cos" | "cosine" => Ok(Rotation::Cos),
            "sin" | "sine" => Ok(Rotation::Sin),
            other => Err(FluxError::ConfigError(format!(
                "rotation '{other}' is not supported"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GridKind {
    Custom,
    Linear {
        axis: bool,
        endpoint: bool,
        rho: Option<Vec<f64>>,
        theta: Option<Vec<f64>>,
        zeta: Option<Vec<f64>>,
    },
    Quadrature,
    Concentric {
        axis: bool,
        rotation: Rotation,
        node_pattern: NodePattern,
    },
}

/// Options of the uniformly spaced grid. `l`, `m`, `n` take precedence over the
/// explicit coordinate lists.
#[derive(Debug, Clone)]
pub struct LinearGridOptions {
    pub l: Option<usize>,
    pub m: Option<usize>,
    pub n: Option<usize>,
    pub nfp: usize,
    pub sym: bool,
    /// Include ρ = 0 when the radial coordinates are generated from `l`.
    pub axis: bool,
    /// Duplicate θ = 2π and ζ = 2π/NFP.
    pub endpoint: bool,
    pub rho: Vec<f64>,
    pub theta: Vec<f64>,
    pub zeta: Vec<f64>,
}

impl Default for LinearGridOptions {
    fn default() -> Self {
        LinearGridOptions {
            l: None,
            m: None,
            n: None,
            nfp: 1,
            sym: false,
            axis: true,
            endpoint: false,
            rho: vec![1.0],
            theta: vec![0.0],
            zeta: vec![0.0],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConcentricGridOptions {
    pub l: usize,
    pub m: usize,
    pub n: usize,
    pub nfp: usize,
    pub sym: bool,
    pub axis: bool,
    pub rotation: Rotation,
    pub node_pattern: NodePattern,
}

impl ConcentricGridOptions {
    pub fn new(l: usize, m: usize, n: usize) -> Self {
        ConcentricGridOptions {
            l,
            m,
            n,
            nfp: 1,
            sym: false,
            axis: false,
            rotation: Rotation::None,
            node_pattern: NodePattern::Jacobi,
        }
    }
}

/// Collocation nodes with integration weights and index metadata.
#[derive(Debug, Clone)]
pub struct Grid {
    kind: GridKind,
    l: usize,
    m: usize,
    n: usize,
    nfp: usize,
    sym: bool,
    nodes: Array2<f64>,
    spacing: Array2<f64>,
    weights: Array1<f64>,
    axis: Vec<usize>,
    unique_rho_idx: Vec<usize>,
    unique_theta_idx: Vec<usize>,
    unique_zeta_idx: Vec<usize>,
    inverse_rho_idx: Vec<usize>,
    inverse_zeta_idx: Vec<usize>,
}

fn linspace(start: f64, stop: f64, num: usize, endpoint: bool) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let div = if endpoint { num - 1 } else { num } as f64;
            let step = (stop - start) / div;
            (0..num).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Sorted unique values of `col`: indices of first occurrences (in sorted
/// value order) and, for every entry, the index of its unique value.
fn unique_indices(col: ArrayView1<f64>) -> (Vec<usize>, Vec<usize>) {
    let mut order: Vec<usize> = (0..col.len()).collect();
    order.sort_by(|&a, &b| col[a].total_cmp(&col[b]).then(a.cmp(&b)));
    let mut first = Vec::new();
    let mut inverse = vec![0; col.len()];
    for &i in &order {
        let is_new = match first.last() {
            Some(&prev) => col[prev] != col[i],
            None => true,
        };
        if is_new {
            first.push(i);
        }
        inverse[i] = first.len() - 1;
    }
    (first, inverse)
}

fn float_key(x: f64) -> u64 {
    // -0.0 and 0.0 are the same node
    if x == 0.0 {
        0
    } else {
        x.to_bits()
    }
}

impl Grid {
    fn empty(kind: GridKind, l: usize, m: usize, n: usize, nfp: usize, sym: bool) -> Self {
        Grid {
            kind,
            l,
            m,
            n,
            nfp,
            sym,
            nodes: Array2::zeros((0, 3)),
            spacing: Array2::zeros((0, 3)),
            weights: Array1::zeros(0),
            axis: Vec::new(),
            unique_rho_idx: Vec::new(),
            unique_theta_idx: Vec::new(),
            unique_zeta_idx: Vec::new(),
            inverse_rho_idx: Vec::new(),
            inverse_zeta_idx: Vec::new(),
        }
    }

    /// Grid on caller-supplied nodes, kept in the given order.
    /// Spacing is uniform so the weights sum to 4π².
    pub fn custom(nodes: Array2<f64>) -> FluxResult<Self> {
        if nodes.ncols() != 3 || nodes.nrows() == 0 {
            return Err(FluxError::DimensionMismatch(format!(
                "custom grid nodes must be (N, 3) with N > 0, got {:?}",
                nodes.dim()
            )));
        }
        let num = nodes.nrows() as f64;
        let mut spacing = Array2::zeros(nodes.dim());
        spacing.column_mut(0).fill(1.0 / num);
        spacing.column_mut(1).fill(TWO_PI / num);
        spacing.column_mut(2).fill(TWO_PI / num);

        let mut grid = Grid::empty(GridKind::Custom, 0, 0, 0, 1, false);
        grid.l = unique_indices(nodes.column(0)).0.len();
        grid.m = unique_indices(nodes.column(1)).0.len();
        grid.n = unique_indices(nodes.column(2)).0.len();
        grid.nodes = nodes;
        grid.spacing = spacing;
        grid.find_axis();
        grid.count_nodes();
        grid.scale_weights();
        Ok(grid)
    }

    /// Uniformly spaced grid.
    pub fn linear(opts: LinearGridOptions) -> FluxResult<Self> {
        if opts.nfp == 0 {
            return Err(FluxError::ConfigError("NFP must be positive".to_string()));
        }
        let kind = GridKind::Linear {
            axis: opts.axis,
            endpoint: opts.endpoint,
            rho: opts.l.is_none().then(|| opts.rho.clone()),
            theta: opts.m.is_none().then(|| opts.theta.clone()),
            zeta: opts.n.is_none().then(|| opts.zeta.clone()),
        };
        let l = opts.l.unwrap_or(opts.rho.len());
        let m = opts.m.unwrap_or(opts.theta.len());
        let n = opts.n.unwrap_or(opts.zeta.len());
        let mut grid = Grid::empty(kind, l, m, n, opts.nfp, opts.sym);
        grid.create_nodes()?;
        grid.finish();
        Ok(grid)
    }

    /// Gauss-Legendre nodes in ρ, equispaced θ and ζ. Weights are exact
    /// quadrature weights and are not rescaled.
    pub fn quadrature(l: usize, m: usize, n: usize, nfp: usize) -> FluxResult<Self> {
        if nfp == 0 {
            return Err(FluxError::ConfigError("NFP must be positive".to_string()));
        }
        let mut grid = Grid::empty(GridKind::Quadrature, l, m, n, nfp, false);
        grid.create_nodes()?;
        grid.finish();
        Ok(grid)
    }

    /// Concentric rings of nodes, the standard collocation set for Zernike bases.
    pub fn concentric(opts: ConcentricGridOptions) -> FluxResult<Self> {
        if opts.nfp == 0 {
            return Err(FluxError::ConfigError("NFP must be positive".to_string()));
        }
        let kind = GridKind::Concentric {
            axis: opts.axis,
            rotation: opts.rotation,
            node_pattern: opts.node_pattern,
        };
        let mut grid = Grid::empty(kind, opts.l, opts.m, opts.n, opts.nfp, opts.sym);
        grid.create_nodes()?;
        grid.finish();
        Ok(grid)
    }

    /// Regenerate nodes at a new resolution. No-op when nothing changes.
    pub fn change_resolution(&mut self, l: usize, m: usize, n: usize, nfp: usize) -> FluxResult<()> {
        if nfp == 0 {
            return Err(FluxError::ConfigError("NFP must be positive".to_string()));
        }
        if l == self.l && m == self.m && n == self.n && nfp == self.nfp {
            return Ok(());
        }
        if matches!(self.kind, GridKind::Custom) {
            return Err(FluxError::ConfigError(
                "a custom grid has no resolution to change".to_string(),
            ));
        }
        if let GridKind::Linear { rho, theta, zeta, .. } = &mut self.kind {
            // explicit coordinate lists no longer describe the new resolution
            *rho = None;
            *theta = None;
            *zeta = None;
        }
        self.l = l;
        self.m = m;
        self.n = n;
        self.nfp = nfp;
        self.create_nodes()?;
        self.finish();
        log::debug!(
            "grid resolution changed to L={l} M={m} N={n} NFP={nfp}: {} nodes",
            self.num_nodes()
        );
        Ok(())
    }

    fn finish(&mut self) {
        self.enforce_symmetry();
        self.sort_nodes();
        self.find_axis();
        self.count_nodes();
        if !matches!(self.kind, GridKind::Quadrature) {
            self.scale_weights();
        } else {
            self.weights = Array1::from_iter(self.spacing.rows().into_iter().map(|s| s.product()));
        }
    }

    fn create_nodes(&mut self) -> FluxResult<()> {
        let (nodes, spacing) = match self.kind.clone() {
            GridKind::Custom => return Ok(()),
            GridKind::Linear {
                axis,
                endpoint,
                rho,
                theta,
                zeta,
            } => self.linear_nodes(axis, endpoint, rho, theta, zeta),
            GridKind::Quadrature => self.quadrature_nodes()?,
            GridKind::Concentric {
                axis,
                rotation,
                node_pattern,
            } => self.concentric_nodes(axis, rotation, node_pattern)?,
        };
        self.nodes = nodes;
        self.spacing = spacing;
        Ok(())
    }

    fn linear_nodes(
        &self,
        axis: bool,
        endpoint: bool,
        rho: Option<Vec<f64>>,
        theta: Option<Vec<f64>>,
        zeta: Option<Vec<f64>>,
    ) -> (Array2<f64>, Array2<f64>) {
        let r = match rho {
            Some(r) => r,
            None => {
                let mut r = linspace(1.0, 0.0, self.l + 1, axis);
                r.reverse();
                r
            }
        };
        let dr = if r.len() > 1 {
            let max = r.iter().cloned().fold(f64::MIN, f64::max);
            let min = r.iter().cloned().fold(f64::MAX, f64::min);
            let dr = (max - min) / r.len() as f64;
            if dr == 0.0 {
                1.0
            } else {
                dr
            }
        } else {
            1.0
        };

        let t = match theta {
            Some(t) => t,
            None => {
                let count = if self.sym { 2 * (self.m + 1) } else { 2 * self.m + 1 };
                let mut t = linspace(0.0, TWO_PI, count, endpoint);
                if self.sym && t.len() > 1 {
                    let shift = t[1] / 2.0;
                    t.iter_mut().for_each(|x| *x += shift);
                }
                t
            }
        };
        let dt = if t.is_empty() { TWO_PI } else { TWO_PI / t.len() as f64 };

        let z = match zeta {
            Some(z) => z,
            None => linspace(0.0, TWO_PI / self.nfp as f64, 2 * self.n + 1, endpoint),
        };
        let dz = if z.is_empty() { TWO_PI } else { TWO_PI / z.len() as f64 };

        let num = r.len() * t.len() * z.len();
        let mut nodes = Array2::zeros((num, 3));
        let mut spacing = Array2::zeros((num, 3));
        let mut k = 0;
        for &ri in &r {
            for &ti in &t {
                for &zi in &z {
                    nodes[[k, 0]] = ri;
                    nodes[[k, 1]] = ti;
                    nodes[[k, 2]] = zi;
                    spacing[[k, 0]] = dr;
                    spacing[[k, 1]] = dt;
                    spacing[[k, 2]] = dz;
                    k += 1;
                }
            }
        }
        (nodes, spacing)
    }

    fn quadrature_nodes(&self) -> FluxResult<(Array2<f64>, Array2<f64>)> {
        // Gauss-Legendre in ρ: the radial weights sum to 1 exactly. Roots of the
        // ρ-weighted Jacobi rule with w/ρ spacing only approximate ∫ dρ = 1.
        let (r, wr) = gauss_legendre_unit(self.l + 1)?;
        let nt = 2 * self.m + 1;
        let nz = 2 * self.n + 1;
        let t = linspace(0.0, TWO_PI, nt, false);
        let z = linspace(0.0, TWO_PI / self.nfp as f64, nz, false);
        let dt = TWO_PI / nt as f64;
        let dz = TWO_PI / nz as f64;

        let num = r.len() * nt * nz;
        let mut nodes = Array2::zeros((num, 3));
        let mut spacing = Array2::zeros((num, 3));
        let mut k = 0;
        for (&ri, &wi) in r.iter().zip(wr.iter()) {
            for &ti in &t {
                for &zi in &z {
                    nodes[[k, 0]] = ri;
                    nodes[[k, 1]] = ti;
                    nodes[[k, 2]] = zi;
                    spacing[[k, 0]] = wi;
                    spacing[[k, 1]] = dt;
                    spacing[[k, 2]] = dz;
                    k += 1;
                }
            }
        }
        Ok((nodes, spacing))
    }

    fn concentric_rho(&self, axis: bool, pattern: NodePattern) -> FluxResult<Vec<f64>> {
        let l = self.l;
        let half = l / 2;
        let mut rho: Vec<f64> = match pattern {
            NodePattern::Linear => linspace(0.0, 1.0, half + 1, true),
            NodePattern::Cheb1 => {
                if half == 0 {
                    vec![1.0]
                } else {
                    (0..=half)
                        .rev()
                        .map(|j| ((j as f64 * PI / half as f64).cos() + 1.0) / 2.0)
                        .collect()
                }
            }
            NodePattern::Cheb2 => {
                if l == 0 {
                    vec![1.0]
                } else {
                    (half..=l)
                        .map(|j| (-(j as f64 * PI / l as f64).cos()).max(0.0))
                        .collect()
                }
            }
            NodePattern::Jacobi => shifted_gauss_jacobi(half + 1, 0.0, 1.0)?.0.to_vec(),
            NodePattern::Ocs => {
                let mut r: Vec<f64> = (1..=half + 1)
                    .map(|j| {
                        let z = ((2 * j - 1) as f64 * PI / (2 * l + 2) as f64).cos();
                        1.1565 * z - 0.76535 * z * z + 0.60517 * z * z * z
                    })
                    .collect();
                r.sort_by(f64::total_cmp);
                r
            }
        };
        rho.sort_by(f64::total_cmp);
        if axis {
            rho[0] = 0.0;
        } else if rho[0] == 0.0 && rho.len() > 1 {
            rho[0] = rho[1] / 10.0;
        }
        Ok(rho)
    }

    fn concentric_nodes(
        &self,
        axis: bool,
        rotation: Rotation,
        pattern: NodePattern,
    ) -> FluxResult<(Array2<f64>, Array2<f64>)> {
        let rho = self.concentric_rho(axis, pattern)?;
        let nr = rho.len();
        let drho: Vec<f64> = if nr > 1 {
            (0..nr)
                .map(|i| {
                    if i == 0 {
                        (rho[0] + rho[1]) / 2.0
                    } else if i == nr - 1 {
                        1.0 - (rho[nr - 2] + rho[nr - 1]) / 2.0
                    } else {
                        (rho[i + 1] - rho[i - 1]) / 2.0
                    }
                })
                .collect()
        } else {
            vec![1.0]
        };

        let ratio = if self.l == 0 {
            0.0
        } else {
            self.m as f64 / self.l as f64
        };
        let mut r = Vec::new();
        let mut t = Vec::new();
        let mut dr = Vec::new();
        let mut dt = Vec::new();
        for iring in (1..=self.l / 2 + 1).rev() {
            let extra = (ratio * (5.0 - 4.0 * iring as f64)).ceil() as i64;
            let ntheta = (2 * self.m as i64 + extra).max(1) as usize;
            let dtheta = TWO_PI / ntheta as f64;
            let offset = match rotation {
                Rotation::None if self.sym => dtheta / 3.0,
                Rotation::None | Rotation::Cos => 0.0,
                Rotation::Sin => dtheta / 4.0,
            };
            let ring = nr.saturating_sub(iring);
            for theta in linspace(0.0, TWO_PI, ntheta, false) {
                r.push(rho[ring]);
                t.push((theta + offset).rem_euclid(TWO_PI));
                dr.push(drho[ring]);
                dt.push(dtheta);
            }
        }

        let z = linspace(0.0, TWO_PI / self.nfp as f64, 2 * self.n + 1, false);
        let dz = TWO_PI / z.len() as f64;
        let dim = r.len();
        let num = dim * z.len();
        let mut nodes = Array2::zeros((num, 3));
        let mut spacing = Array2::zeros((num, 3));
        for (iz, &zi) in z.iter().enumerate() {
            for k in 0..dim {
                let row = iz * dim + k;
                nodes[[row, 0]] = r[k];
                nodes[[row, 1]] = t[k];
                nodes[[row, 2]] = zi;
                spacing[[row, 0]] = dr[k];
                spacing[[row, 1]] = dt[k];
                spacing[[row, 2]] = dz;
            }
        }
        Ok((nodes, spacing))
    }

    /// Drop nodes with θ > π and stretch the θ spacing of the survivors on each
    /// ρ surface by k/k′ so every surface keeps its total θ weight.
    fn enforce_symmetry(&mut self) {
        if !self.sym {
            return;
        }
        let (_, inverse) = unique_indices(self.nodes.column(0));
        let surfaces = inverse.iter().max().map_or(0, |&s| s + 1);
        let mut total = vec![0usize; surfaces];
        let mut removed = vec![0usize; surfaces];
        for (i, &s) in inverse.iter().enumerate() {
            total[s] += 1;
            if self.nodes[[i, 1]] > PI {
                removed[s] += 1;
            }
        }

        let keep: Vec<usize> = (0..self.nodes.nrows())
            .filter(|&i| self.nodes[[i, 1]] <= PI)
            .collect();
        let mut nodes = Array2::zeros((keep.len(), 3));
        let mut spacing = Array2::zeros((keep.len(), 3));
        for (row, &i) in keep.iter().enumerate() {
            let s = inverse[i];
            let scale = total[s] as f64 / (total[s] - removed[s]) as f64;
            nodes.row_mut(row).assign(&self.nodes.row(i));
            spacing.row_mut(row).assign(&self.spacing.row(i));
            spacing[[row, 1]] *= scale;
        }
        self.nodes = nodes;
        self.spacing = spacing;
    }

    /// Lexicographic order by (ζ, ρ, θ).
    fn sort_nodes(&mut self) {
        let nodes = &self.nodes;
        let mut order: Vec<usize> = (0..nodes.nrows()).collect();
        order.sort_by(|&a, &b| {
            nodes[[a, 2]]
                .total_cmp(&nodes[[b, 2]])
                .then(nodes[[a, 0]].total_cmp(&nodes[[b, 0]]))
                .then(nodes[[a, 1]].total_cmp(&nodes[[b, 1]]))
        });
        self.nodes = self.nodes.select(ndarray::Axis(0), &order);
        self.spacing = self.spacing.select(ndarray::Axis(0), &order);
    }

    fn find_axis(&mut self) {
        self.axis = (0..self.nodes.nrows())
            .filter(|&i| self.nodes[[i, 0]] == 0.0)
            .collect();
    }

    fn count_nodes(&mut self) {
        let (rho_idx, rho_inv) = unique_indices(self.nodes.column(0));
        let (theta_idx, _) = unique_indices(self.nodes.column(1));
        let (zeta_idx, zeta_inv) = unique_indices(self.nodes.column(2));
        self.unique_rho_idx = rho_idx;
        self.unique_theta_idx = theta_idx;
        self.unique_zeta_idx = zeta_idx;
        self.inverse_rho_idx = rho_inv;
        self.inverse_zeta_idx = zeta_inv;
    }

    /// Share spacing between nodes that coincide modulo the periods, then scale
    /// so that the weights sum to 4π².
    fn scale_weights(&mut self) {
        let zeta_period = TWO_PI / self.nfp as f64;
        let keys: Vec<(u64, u64, u64)> = self
            .nodes
            .rows()
            .into_iter()
            .map(|row| {
                (
                    float_key(row[0]),
                    float_key(row[1].rem_euclid(TWO_PI)),
                    float_key(row[2].rem_euclid(zeta_period)),
                )
            })
            .collect();
        let mut counts: HashMap<(u64, u64, u64), usize> = HashMap::new();
        for key in &keys {
            *counts.entry(*key).or_insert(0) += 1;
        }
        for (i, key) in keys.iter().enumerate() {
            let c = counts.get(key).copied().unwrap_or(1);
            if c > 1 {
                let factor = (c as f64).powf(1.0 / 3.0);
                self.spacing.row_mut(i).mapv_inplace(|s| s / factor);
            }
        }
        let total: f64 = self.spacing.rows().into_iter().map(|s| s.product()).sum();
        if total > 0.0 {
            let factor = (FOUR_PI_SQ / total).powf(1.0 / 3.0);
            self.spacing.mapv_inplace(|s| s * factor);
        }
        self.weights = Array1::from_iter(self.spacing.rows().into_iter().map(|s| s.product()));
    }

    pub fn kind(&self) -> &GridKind {
        &self.kind
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
    pub fn sym(&self) -> bool {
        self.sym
    }
    /// Node coordinates (ρ, θ, ζ), one row per node.
    pub fn nodes(&self) -> &Array2<f64> {
        &self.nodes
    }
    pub fn spacing(&self) -> &Array2<f64> {
        &self.spacing
    }
    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }
    /// Indices of nodes on the magnetic axis (ρ = 0).
    pub fn axis(&self) -> &[usize] {
        &self.axis
    }
    pub fn has_axis(&self) -> bool {
        !self.axis.is_empty()
    }
    pub fn num_nodes(&self) -> usize {
        self.nodes.nrows()
    }
    pub fn num_rho(&self) -> usize {
        self.unique_rho_idx.len()
    }
    pub fn num_theta(&self) -> usize {
        self.unique_theta_idx.len()
    }
    pub fn num_zeta(&self) -> usize {
        self.unique_zeta_idx.len()
    }
    pub fn unique_rho_idx(&self) -> &[usize] {
        &self.unique_rho_idx
    }
    pub fn unique_theta_idx(&self) -> &[usize] {
        &self.unique_theta_idx
    }
    pub fn unique_zeta_idx(&self) -> &[usize] {
        &self.unique_zeta_idx
    }
    /// For each node, the index of its ρ surface in ascending ρ order.
    pub fn inverse_rho_idx(&self) -> &[usize] {
        &self.inverse_rho_idx
    }
    /// For each node, the index of its ζ plane in ascending ζ order.
    pub fn inverse_zeta_idx(&self) -> &[usize] {
        &self.inverse_zeta_idx
    }
    pub fn rho(&self) -> ArrayView1<'_, f64> {
        self.nodes.column(0)
    }
    pub fn theta(&self) -> ArrayView1<'_, f64> {
        self.nodes.column(1)
    }
    pub fn zeta(&self) -> ArrayView1<'_, f64> {
        self.nodes.column(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight_sum(grid: &Grid) -> f64 {
        grid.weights().sum()
    }

    #[test]
    fn test_linear_grid_layout() {
        let grid = Grid::linear(LinearGridOptions {
            l: Some(3),
            m: Some(2),
            n: Some(1),
            ..Default::default()
        })
        .expect("grid");
        assert_eq!(grid.num_nodes(), 4 * 5 * 3);
        assert_eq!(grid.num_rho(), 4);
        assert_eq!(grid.num_theta(), 5);
        assert_eq!(grid.num_zeta(), 3);
        // ζ is the slowest index after sorting, θ the fastest
        assert!(grid.nodes()[[0, 2]] <= grid.nodes()[[grid.num_nodes() - 1, 2]]);
        assert_eq!(grid.axis().len(), 5 * 3);
        assert!((weight_sum(&grid) - FOUR_PI_SQ).abs() < 1e-10);
    }

    #[test]
    fn test_linear_grid_without_axis() {
        let grid = Grid::linear(LinearGridOptions {
            l: Some(4),
            m: Some(1),
            axis: false,
            ..Default::default()
        })
        .expect("grid");
        assert!(!grid.has_axis());
        let rho_min = grid.rho().iter().cloned().fold(f64::MAX, f64::min);
        assert!((rho_min - 0.2).abs() < 1e-14, "rho_min = {rho_min}");
    }

    #[test]
    fn test_linear_grid_endpoint_duplicates_share_weight() {
        let grid = Grid::linear(LinearGridOptions {
            l: Some(2),
            m: Some(2),
            endpoint: true,
            ..Default::default()
        })
        .expect("grid");
        assert!((weight_sum(&grid) - FOUR_PI_SQ).abs() < 1e-10);
        // θ = 0 and θ = 2π collapse onto the same physical node
        let w0 = grid.weights()[0];
        let w1 = grid.weights()[1];
        assert!(w0 < w1, "duplicated node must carry less weight: {w0} vs {w1}");
    }

    #[test]
    fn test_quadrature_weights_exact() {
        let grid = Grid::quadrature(5, 4, 2, 3).expect("grid");
        assert_eq!(grid.num_rho(), 6);
        assert_eq!(grid.num_nodes(), 6 * 9 * 5);
        assert!((weight_sum(&grid) - FOUR_PI_SQ).abs() < 1e-11);
        // ∫ρ³ dρ dθ dζ = 4π²/4 exactly for a degree-3 integrand
        let integral: f64 = grid
            .rho()
            .iter()
            .zip(grid.weights().iter())
            .map(|(&r, &w)| r.powi(3) * w)
            .sum();
        assert!((integral - FOUR_PI_SQ / 4.0).abs() < 1e-12);
        assert!(!grid.has_axis());

        // three-point Legendre nodes on [0, 1]: 1/2 ∓ √(3/5)/2
        let coarse = Grid::quadrature(2, 1, 0, 1).expect("grid");
        let half_gap = 0.5 * (0.6f64).sqrt();
        let expected = [0.5 - half_gap, 0.5, 0.5 + half_gap];
        for (k, &i) in coarse.unique_rho_idx().iter().enumerate() {
            assert!((coarse.rho()[i] - expected[k]).abs() < 1e-13, "rho[{k}] = {}", coarse.rho()[i]);
        }
        assert!((weight_sum(&coarse) - FOUR_PI_SQ).abs() < 1e-12);
    }

    #[test]
    fn test_concentric_ring_counts() {
        let grid = Grid::concentric(ConcentricGridOptions::new(8, 8, 0)).expect("grid");
        assert_eq!(grid.num_rho(), 5);
        // ring θ counts 2M + ceil((M/L)(5 - 4·iring)) for iring = 5..1
        let expected: usize = (1..=5)
            .map(|iring: i64| (16 + (5 - 4 * iring)) as usize)
            .sum();
        assert_eq!(grid.num_nodes(), expected);
        assert!((weight_sum(&grid) - FOUR_PI_SQ).abs() < 1e-10);
    }

    #[test]
    fn test_concentric_axis_flag() {
        let mut opts = ConcentricGridOptions::new(6, 6, 0);
        opts.axis = true;
        let grid = Grid::concentric(opts.clone()).expect("grid");
        assert!(grid.has_axis());
        opts.axis = false;
        let grid = Grid::concentric(opts).expect("grid");
        assert!(!grid.has_axis());
        assert!(grid.rho().iter().all(|&r| r > 0.0));
    }

    #[test]
    fn test_concentric_all_patterns() {
        for pattern in ["linear", "cheb1", "cheb2", "jacobi", "ocs"] {
            let mut opts = ConcentricGridOptions::new(6, 4, 1);
            opts.node_pattern = pattern.parse().expect("known pattern");
            let grid = Grid::concentric(opts).expect("grid");
            assert!(
                (weight_sum(&grid) - FOUR_PI_SQ).abs() < 1e-10,
                "pattern {pattern}"
            );
            assert!(grid.rho().iter().all(|&r| (0.0..=1.0).contains(&r)));
        }
    }

    #[test]
    fn test_unsupported_node_pattern() {
        match "chebyshev3".parse::<NodePattern>() {
            Err(FluxError::ConfigError(msg)) => {
                assert!(msg.contains("chebyshev3"), "message names the pattern: {msg}")
            }
            other => panic!("Expected ConfigError, got {other:?}"),
        }
        assert!("tan".parse::<Rotation>().is_err());
    }

    #[test]
    fn test_enforce_symmetry_preserves_ring_weight() {
        let mut grid = Grid::empty(
            GridKind::Concentric {
                axis: false,
                rotation: Rotation::None,
                node_pattern: NodePattern::Jacobi,
            },
            8,
            6,
            0,
            1,
            true,
        );
        grid.create_nodes().expect("nodes");
        let rings_before = ring_theta_sums(&grid);
        grid.enforce_symmetry();
        assert!(grid.theta().iter().all(|&t| t <= PI));
        let rings_after = ring_theta_sums(&grid);
        assert_eq!(rings_before.len(), rings_after.len());
        for ((r0, s0), (r1, s1)) in rings_before.iter().zip(rings_after.iter()) {
            assert_eq!(r0, r1);
            assert!((s0 - s1).abs() < 1e-12, "ring ρ={r0}: {s0} vs {s1}");
        }
    }

    fn ring_theta_sums(grid: &Grid) -> Vec<(f64, f64)> {
        let mut sums: Vec<(f64, f64)> = Vec::new();
        for (i, &r) in grid.rho().iter().enumerate() {
            let dt = grid.spacing()[[i, 1]];
            match sums.iter_mut().find(|(rr, _)| *rr == r) {
                Some(entry) => entry.1 += dt,
                None => sums.push((r, dt)),
            }
        }
        sums.sort_by(|a, b| a.0.total_cmp(&b.0));
        sums
    }

    #[test]
    fn test_symmetric_grids_keep_half_plane() {
        let mut opts = ConcentricGridOptions::new(8, 8, 2);
        opts.sym = true;
        let grid = Grid::concentric(opts).expect("grid");
        assert!(grid.theta().iter().all(|&t| t <= PI));
        assert!((weight_sum(&grid) - FOUR_PI_SQ).abs() < 1e-10);

        let grid = Grid::linear(LinearGridOptions {
            l: Some(3),
            m: Some(3),
            sym: true,
            ..Default::default()
        })
        .expect("grid");
        assert_eq!(grid.num_theta(), 4);
        assert!(grid.theta().iter().all(|&t| t <= PI));
    }

    #[test]
    fn test_change_resolution_refreshes_caches() {
        let mut opts = ConcentricGridOptions::new(4, 4, 0);
        opts.axis = true;
        let mut grid = Grid::concentric(opts).expect("grid");
        let before = grid.num_nodes();
        grid.change_resolution(8, 6, 1, 2).expect("resolution change");
        assert!(grid.num_nodes() > before);
        assert_eq!(grid.num_zeta(), 3);
        assert_eq!(grid.num_rho(), 5);
        assert_eq!(grid.axis().len(), grid.num_zeta());
        for &i in grid.axis() {
            assert_eq!(grid.rho()[i], 0.0);
        }
        assert!((weight_sum(&grid) - FOUR_PI_SQ).abs() < 1e-10);

        let snapshot = grid.nodes().clone();
        grid.change_resolution(8, 6, 1, 2).expect("no-op");
        assert_eq!(&snapshot, grid.nodes());
    }

    #[test]
    fn test_custom_grid_keeps_order() {
        let nodes = ndarray::array![[1.0, 0.5, 0.0], [0.5, 0.1, 0.0], [0.0, 0.0, 0.0]];
        let grid = Grid::custom(nodes.clone()).expect("grid");
        assert_eq!(grid.nodes(), &nodes);
        assert_eq!(grid.axis(), &[2]);
        assert!((weight_sum(&grid) - FOUR_PI_SQ).abs() < 1e-10);
        assert!(Grid::custom(Array2::zeros((2, 2))).is_err());
    }
}
