// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Compute Planning
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Derivative-requirement checking and two-phase evaluation.
//!
//! `Plan::new` resolves requested keys into the dependency closure that can be
//! evaluated with the available transforms; `Plan::execute` then evaluates the
//! closure in registration order. Keys that cannot be computed are left out
//! of the plan, so their absence from the data map is the signal.

use std::collections::{BTreeMap, BTreeSet};

use flux_math::basis::Deriv;
use flux_math::grid::Grid;
use flux_math::transform::derivatives_up_to;
use flux_types::error::{FluxError, FluxResult};

use crate::axis;
use crate::compute::ComputeInputs;
use crate::data::{DataMap, Value};
use crate::registry::{registry, AxisBehavior, Registry, Shape, Source};

/// Highest derivative order of R, Z and λ any quantity consumes.
pub const MAX_GEOMETRY_ORDER: u8 = 4;
/// Highest radial derivative of the profiles any quantity consumes.
pub const MAX_PROFILE_ORDER: u8 = 2;

/// Derivatives each source transform supports, plus whether the grid holds
/// axis nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Availability {
    derivs: BTreeMap<Source, BTreeSet<Deriv>>,
    has_axis: bool,
}

impl Availability {
    pub fn new(has_axis: bool) -> Self {
        Availability {
            derivs: BTreeMap::new(),
            has_axis,
        }
    }

    pub fn with<I>(mut self, source: Source, derivs: I) -> Self
    where
        I: IntoIterator<Item = Deriv>,
    {
        self.derivs.entry(source).or_default().extend(derivs);
        self
    }

    /// Every derivative any registered quantity could ask for.
    pub fn full(has_axis: bool) -> Self {
        let radial: Vec<Deriv> = (0..=MAX_PROFILE_ORDER).map(|k| [k, 0, 0]).collect();
        Availability::new(has_axis)
            .with(Source::R, derivatives_up_to(MAX_GEOMETRY_ORDER))
            .with(Source::Z, derivatives_up_to(MAX_GEOMETRY_ORDER))
            .with(Source::Lambda, derivatives_up_to(MAX_GEOMETRY_ORDER))
            .with(Source::Pressure, radial.clone())
            .with(Source::Iota, radial)
    }

    pub fn supports(&self, source: Source, d: Deriv) -> bool {
        self.derivs.get(&source).is_some_and(|set| set.contains(&d))
    }

    pub fn has_axis(&self) -> bool {
        self.has_axis
    }
}

/// Computability of every registry entry, in registration order.
fn computable_mask(reg: &Registry, avail: &Availability) -> Vec<bool> {
    let mut mask = vec![false; reg.len()];
    for (i, q) in reg.quantities().iter().enumerate() {
        let leaf_ok = q
            .source
            .map_or(true, |(source, d)| avail.supports(source, d));
        let dep_ok = |name: &String| reg.index_of(name).is_some_and(|j| mask[j]);
        let deps_ok = q.deps.iter().all(dep_ok);
        let axis_ok = !avail.has_axis()
            || match &q.axis {
                AxisBehavior::Regular => true,
                AxisBehavior::Limit { deps, .. } => deps.iter().all(dep_ok),
                AxisBehavior::Singular => false,
            };
        mask[i] = leaf_ok && deps_ok && axis_ok;
    }
    mask
}

/// Whether `key` can be produced with the given transforms. Unknown keys are
/// not computable; this never errors.
pub fn check_derivs(key: &str, avail: &Availability) -> bool {
    let Ok(reg) = registry() else {
        return false;
    };
    match reg.index_of(key) {
        Some(i) => computable_mask(reg, avail)[i],
        None => false,
    }
}

#[derive(Debug, Clone)]
pub struct Plan {
    steps: Vec<usize>,
    has_axis: bool,
}

impl Plan {
    /// Dependency closure of `keys` under `avail`. Typos are errors; keys that
    /// exist but cannot be computed are dropped.
    pub fn new<S: AsRef<str>>(keys: &[S], avail: &Availability) -> FluxResult<Self> {
        let reg = registry()?;
        let mask = computable_mask(reg, avail);
        let mut needed = vec![false; reg.len()];
        let mut stack = Vec::new();

        for key in keys {
            let key = key.as_ref();
            let i = reg
                .index_of(key)
                .ok_or_else(|| FluxError::UnknownQuantity(key.to_string()))?;
            if mask[i] {
                stack.push(i);
            } else {
                log::debug!("plan: '{key}' is not computable with the available transforms");
            }
        }

        while let Some(i) = stack.pop() {
            if needed[i] {
                continue;
            }
            needed[i] = true;
            let q = &reg.quantities()[i];
            let limit_deps = if avail.has_axis() { q.axis_deps() } else { &[] };
            for dep in q.deps.iter().chain(limit_deps) {
                if let Some(j) = reg.index_of(dep) {
                    if !needed[j] {
                        stack.push(j);
                    }
                }
            }
        }

        let steps: Vec<usize> = (0..reg.len()).filter(|&i| needed[i]).collect();
        log::debug!(
            "plan: {} requested keys expand to {} steps",
            keys.len(),
            steps.len()
        );
        Ok(Plan {
            steps,
            has_axis: avail.has_axis(),
        })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Planned keys in evaluation order.
    pub fn keys(&self) -> FluxResult<Vec<&'static str>> {
        let reg = registry()?;
        Ok(self
            .steps
            .iter()
            .map(|&i| reg.quantities()[i].name.as_str())
            .collect())
    }

    pub fn contains(&self, key: &str) -> bool {
        match registry().ok().and_then(|reg| reg.index_of(key)) {
            Some(i) => self.steps.binary_search(&i).is_ok(),
            None => false,
        }
    }

    /// Source derivatives consumed by the planned leaves.
    pub fn leaf_requirements(&self) -> FluxResult<BTreeMap<Source, BTreeSet<Deriv>>> {
        let reg = registry()?;
        let mut out: BTreeMap<Source, BTreeSet<Deriv>> = BTreeMap::new();
        for &i in &self.steps {
            if let Some((source, d)) = reg.quantities()[i].source {
                out.entry(source).or_default().insert(d);
            }
        }
        Ok(out)
    }

    /// Evaluate every planned key not yet present in `data`.
    pub fn execute(&self, inputs: &ComputeInputs<'_>, data: &mut DataMap) -> FluxResult<()> {
        if self.has_axis != inputs.grid.has_axis() {
            return Err(FluxError::ConfigError(format!(
                "plan was built for a grid {} axis nodes",
                if self.has_axis { "with" } else { "without" }
            )));
        }
        let reg = registry()?;
        let axis_idx = inputs.grid.axis();

        for &i in &self.steps {
            let q = &reg.quantities()[i];
            if data.contains(&q.name) {
                continue;
            }
            let mut value = q.evaluate(inputs, data)?;
            check_shape(&q.name, q.shape, &value, inputs.grid)?;
            if let AxisBehavior::Limit { eval, .. } = &q.axis {
                if !axis_idx.is_empty() {
                    let limit = eval(inputs, data, axis_idx)?;
                    value = axis::patch(&q.name, value, limit, axis_idx)?;
                }
            }
            data.insert(q.name.clone(), value)?;
        }
        Ok(())
    }
}

fn check_shape(name: &str, shape: Shape, value: &Value, grid: &Grid) -> FluxResult<()> {
    let num_nodes = grid.num_nodes();
    let ok = match (shape, value) {
        (Shape::Nodal, Value::Nodal(a)) => a.len() == num_nodes,
        (Shape::Vector, Value::Vector(a)) => a.dim() == (num_nodes, 3),
        (Shape::Global, Value::Global(_)) => true,
        (Shape::Spectral, Value::Spectral(a)) => a.nrows() == grid.num_rho(),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(FluxError::ShapeMismatch {
            name: name.to_string(),
            expected: format!("{shape:?} over {num_nodes} nodes"),
            found: value.describe(),
        })
    }
}

/// Source derivatives needed to produce `keys`, assuming every derivative
/// could be supplied. Used to build only the transforms a request needs.
pub fn required_derivatives<S: AsRef<str>>(
    keys: &[S],
    has_axis: bool,
) -> FluxResult<BTreeMap<Source, BTreeSet<Deriv>>> {
    Plan::new(keys, &Availability::full(has_axis))?.leaf_requirements()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_key_not_computable() {
        assert!(!check_derivs("sqrt(h)", &Availability::full(false)));
        match Plan::new(&["sqrt(h)"], &Availability::full(false)) {
            Err(FluxError::UnknownQuantity(k)) => assert_eq!(k, "sqrt(h)"),
            other => panic!("Expected UnknownQuantity, got {other:?}"),
        }
    }

    #[test]
    fn test_zeroth_order_only() {
        let avail = Availability::new(false)
            .with(Source::R, [[0, 0, 0]])
            .with(Source::Z, [[0, 0, 0]]);
        assert!(check_derivs("R", &avail));
        assert!(check_derivs("X", &avail));
        assert!(!check_derivs("R_r", &avail));
        assert!(!check_derivs("e_rho", &avail));
        assert!(!check_derivs("sqrt(g)", &avail));
    }

    #[test]
    fn test_jacobian_needs_first_derivatives() {
        let first = derivatives_up_to(1);
        let avail = Availability::new(false)
            .with(Source::R, first.clone())
            .with(Source::Z, first);
        assert!(check_derivs("sqrt(g)", &avail));
        assert!(!check_derivs("sqrt(g)_r", &avail));
        // ψ_ρ is analytic, so B0 = ψ_ρ/√g needs only the geometry
        assert!(check_derivs("B0", &avail));
        assert!(!check_derivs("iota", &avail));
    }

    #[test]
    fn test_every_key_computable_without_axis() {
        let reg = registry().expect("registry");
        let avail = Availability::full(false);
        for name in reg.names() {
            assert!(check_derivs(name, &avail), "{name} not computable");
        }
    }

    #[test]
    fn test_axis_excludes_singular_keys() {
        let avail = Availability::full(true);
        assert!(check_derivs("sqrt(g)", &avail));
        assert!(check_derivs("e^rho", &avail));
        assert!(check_derivs("B0", &avail));
        assert!(check_derivs("J", &avail));
        assert!(check_derivs("|F|", &avail));
        assert!(!check_derivs("e^theta", &avail));
        assert!(!check_derivs("g^tt", &avail));
        assert!(!check_derivs("J^theta", &avail));
        assert!(!check_derivs("|beta|", &avail));
        assert!(!check_derivs("|B|_mn", &avail));
    }

    #[test]
    fn test_plan_closure_is_ordered() {
        let plan = Plan::new(&["|B|"], &Availability::full(false)).expect("plan");
        let keys = plan.keys().expect("keys");
        let pos = |k: &str| keys.iter().position(|&x| x == k).expect(k);
        assert!(pos("R_r") < pos("e_rho"));
        assert!(pos("sqrt(g)") < pos("B0"));
        assert!(pos("B") < pos("|B|"));
        assert!(!plan.contains("J"));
    }

    #[test]
    fn test_required_derivatives_minimal() {
        let req = required_derivatives(&["sqrt(g)"], false).expect("plan");
        let r = &req[&Source::R];
        assert!(r.contains(&[0, 0, 0]) && r.contains(&[1, 0, 0]));
        assert!(!r.contains(&[2, 0, 0]));
        assert!(!req.contains_key(&Source::Lambda));

        let with_axis = required_derivatives(&["B0"], true).expect("plan");
        assert!(with_axis[&Source::R].contains(&[2, 0, 0]));
    }
}
