// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Quantity Registry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Static table of every quantity the pipeline can produce.
//!
//! Quantities are registered in dependency order, so the registration index
//! is a topological order of the dependency graph. The table is built once
//! and validated before first use.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use flux_math::basis::Deriv;
use flux_types::error::{FluxError, FluxResult};

use crate::compute::{self, ComputeInputs};
use crate::data::{DataMap, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Nodal,
    Vector,
    Global,
    /// One row per flux surface of the grid.
    Spectral,
}

/// Spectral inputs that leaf quantities are transformed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    R,
    Z,
    Lambda,
    Pressure,
    Iota,
}

impl Source {
    pub const ALL: [Source; 5] = [
        Source::R,
        Source::Z,
        Source::Lambda,
        Source::Pressure,
        Source::Iota,
    ];
}

/// Derivative suffix: `[1, 1, 0]` → `"rt"`.
pub fn suffix(d: Deriv) -> String {
    let mut s = String::with_capacity(d.iter().map(|&k| k as usize).sum());
    for (letter, &count) in ['r', 't', 'z'].iter().zip(d.iter()) {
        for _ in 0..count {
            s.push(*letter);
        }
    }
    s
}

/// Name of ∂^d of `base`: `key("R", [1, 0, 2])` → `"R_rzz"`.
pub fn key(base: &str, d: Deriv) -> String {
    if d == [0, 0, 0] {
        base.to_string()
    } else {
        format!("{base}_{}", suffix(d))
    }
}

pub type EvalFn = Box<dyn Fn(&ComputeInputs<'_>, &DataMap) -> FluxResult<Value> + Send + Sync>;

/// Evaluates a limit at the given axis node indices only; the returned value
/// has one row per index.
pub type AxisFn =
    Box<dyn Fn(&ComputeInputs<'_>, &DataMap, &[usize]) -> FluxResult<Value> + Send + Sync>;

pub enum AxisBehavior {
    /// The bulk formula is finite at ρ = 0.
    Regular,
    /// The bulk formula divides by zero at ρ = 0 and is replaced there.
    Limit { deps: Vec<String>, eval: AxisFn },
    /// No finite value at ρ = 0: not computable on grids with axis nodes.
    Singular,
}

pub struct Quantity {
    pub name: String,
    pub shape: Shape,
    pub units: &'static str,
    pub description: String,
    pub deps: Vec<String>,
    pub source: Option<(Source, Deriv)>,
    pub axis: AxisBehavior,
    eval: EvalFn,
}

impl fmt::Debug for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Quantity")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("units", &self.units)
            .field("deps", &self.deps)
            .field("source", &self.source)
            .finish()
    }
}

impl Quantity {
    pub fn new<F>(
        name: impl Into<String>,
        shape: Shape,
        units: &'static str,
        description: impl Into<String>,
        eval: F,
    ) -> Self
    where
        F: Fn(&ComputeInputs<'_>, &DataMap) -> FluxResult<Value> + Send + Sync + 'static,
    {
        Quantity {
            name: name.into(),
            shape,
            units,
            description: description.into(),
            deps: Vec::new(),
            source: None,
            axis: AxisBehavior::Regular,
            eval: Box::new(eval),
        }
    }

    pub fn deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn source(mut self, source: Source, d: Deriv) -> Self {
        self.source = Some((source, d));
        self
    }

    pub fn axis_limit<I, S, F>(mut self, deps: I, eval: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&ComputeInputs<'_>, &DataMap, &[usize]) -> FluxResult<Value> + Send + Sync + 'static,
    {
        self.axis = AxisBehavior::Limit {
            deps: deps.into_iter().map(Into::into).collect(),
            eval: Box::new(eval),
        };
        self
    }

    pub fn singular_on_axis(mut self) -> Self {
        self.axis = AxisBehavior::Singular;
        self
    }

    pub fn evaluate(&self, inputs: &ComputeInputs<'_>, data: &DataMap) -> FluxResult<Value> {
        (self.eval)(inputs, data)
    }

    /// Dependencies that must be present before the axis limit runs.
    pub fn axis_deps(&self) -> &[String] {
        match &self.axis {
            AxisBehavior::Limit { deps, .. } => deps,
            _ => &[],
        }
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    quantities: Vec<Quantity>,
    index: HashMap<String, usize>,
    errors: Vec<String>,
}

impl Registry {
    pub(crate) fn add(&mut self, q: Quantity) {
        if self.index.contains_key(&q.name) {
            self.errors.push(format!("'{}' registered twice", q.name));
            return;
        }
        for dep in q.deps.iter().chain(q.axis_deps()) {
            if !self.index.contains_key(dep) {
                self.errors.push(format!(
                    "'{}' depends on '{dep}', which is not registered before it",
                    q.name
                ));
            }
        }
        self.index.insert(q.name.clone(), self.quantities.len());
        self.quantities.push(q);
    }

    fn build() -> Result<Registry, String> {
        let mut reg = Registry::default();
        compute::register_all(&mut reg);
        if !reg.errors.is_empty() {
            return Err(reg.errors.join("; "));
        }
        log::debug!("quantity registry built: {} entries", reg.quantities.len());
        Ok(reg)
    }

    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&Quantity> {
        self.index_of(name).map(|i| &self.quantities[i])
    }

    pub fn quantities(&self) -> &[Quantity] {
        &self.quantities
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.quantities.iter().map(|q| q.name.as_str())
    }
}

static REGISTRY: OnceLock<Result<Registry, String>> = OnceLock::new();

/// The process-wide registry, built and validated on first call.
pub fn registry() -> FluxResult<&'static Registry> {
    REGISTRY
        .get_or_init(Registry::build)
        .as_ref()
        .map_err(|e| FluxError::Registry(e.clone()))
}
