// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Magnetic Axis Limits
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Finite values at ρ = 0 for quantities whose bulk formula divides by √g.
//!
//! √g vanishes on the axis together with all of its pure θ/ζ derivatives, so
//! every 0/0 quotient is resolved by one application of L'Hôpital's rule in ρ.
//! Limits are evaluated on the axis rows only and patched over the bulk value.

use flux_math::basis::Deriv;
use flux_types::constants::MU0;
use flux_types::error::{FluxError, FluxResult};
use ndarray::{Array1, Array2, Axis};

use crate::compute::profiles::psi_r_derivative;
use crate::compute::{add, binom, cross, lower, scale, sub, ComputeInputs, DR};
use crate::data::{DataMap, Value};
use crate::registry::key;

/// Overwrite the axis rows of `value` with `limit`.
pub(crate) fn patch(name: &str, value: Value, limit: Value, idx: &[usize]) -> FluxResult<Value> {
    let mismatch = |found: String| FluxError::ShapeMismatch {
        name: name.to_string(),
        expected: format!("axis limit over {} nodes", idx.len()),
        found,
    };
    match (value, limit) {
        (Value::Nodal(mut bulk), Value::Nodal(lim)) => {
            if lim.len() != idx.len() {
                return Err(mismatch(format!("nodal[{}]", lim.len())));
            }
            for (k, &i) in idx.iter().enumerate() {
                bulk[i] = lim[k];
            }
            Ok(Value::Nodal(bulk))
        }
        (Value::Vector(mut bulk), Value::Vector(lim)) => {
            if lim.nrows() != idx.len() {
                return Err(mismatch(format!("vector[{}x{}]", lim.nrows(), lim.ncols())));
            }
            for (k, &i) in idx.iter().enumerate() {
                bulk.row_mut(i).assign(&lim.row(k));
            }
            Ok(Value::Vector(bulk))
        }
        (_, other) => Err(mismatch(other.describe())),
    }
}

fn nodal_at(data: &DataMap, name: &str, idx: &[usize]) -> FluxResult<Array1<f64>> {
    Ok(data.nodal(name)?.select(Axis(0), idx))
}

fn vector_at(data: &DataMap, name: &str, idx: &[usize]) -> FluxResult<Array2<f64>> {
    Ok(data.vector(name)?.select(Axis(0), idx))
}

fn recip(a: &Array1<f64>) -> Array1<f64> {
    a.mapv(|v| 1.0 / v)
}

/// ∇ρ = (e_θ,ρ × e_ζ) / √g_ρ.
pub(crate) fn e_sup_rho(_: &ComputeInputs<'_>, data: &DataMap, idx: &[usize]) -> FluxResult<Value> {
    let num = cross(
        &vector_at(data, "e_theta_r", idx)?,
        &vector_at(data, "e_zeta", idx)?,
    );
    Ok(Value::Vector(scale(&num, &recip(&nodal_at(data, "sqrt(g)_r", idx)?))))
}

/// Dependencies of the ∂^d B0 limit: lower-order B0 and √g up to |d| + 1.
pub(crate) fn b0_deps(d: Deriv) -> Vec<String> {
    let d1 = add(d, DR);
    let mut deps: Vec<String> = lower(d)
        .into_iter()
        .map(|b| key("sqrt(g)", sub(d1, b)))
        .collect();
    deps.extend(lower(d).into_iter().filter(|&b| b != d).map(|b| key("B0", b)));
    deps
}

/// ∂^d B0 on the axis, from ∂^(d+ρ) of ψ_ρ = B0 √g.
pub(crate) fn b0(
    d: Deriv,
) -> impl Fn(&ComputeInputs<'_>, &DataMap, &[usize]) -> FluxResult<Value> + Send + Sync + 'static {
    move |inputs, data, idx| {
        let d1 = add(d, DR);
        let rho = inputs.grid.rho().select(Axis(0), idx);
        let mut num = psi_r_derivative(inputs.psi, rho.view(), d1);
        for b in lower(d).into_iter().filter(|&b| b != d) {
            let term = &nodal_at(data, &key("B0", b), idx)?
                * &nodal_at(data, &key("sqrt(g)", sub(d1, b)), idx)?;
            num.scaled_add(-binom(d1, b), &term);
        }
        let den = nodal_at(data, "sqrt(g)_r", idx)? * binom(d1, d);
        Ok(Value::Nodal(num / den))
    }
}

/// J^ρ = ∂_ρ(√g J^ρ) / √g_ρ.
pub(crate) fn j_sup_rho(_: &ComputeInputs<'_>, data: &DataMap, idx: &[usize]) -> FluxResult<Value> {
    let num = nodal_at(data, "B_zeta_rt", idx)? - nodal_at(data, "B_theta_rz", idx)?;
    Ok(Value::Nodal(num / (nodal_at(data, "sqrt(g)_r", idx)? * MU0)))
}

/// J^ζ = ∂_ρ(√g J^ζ) / √g_ρ.
pub(crate) fn j_sup_zeta(_: &ComputeInputs<'_>, data: &DataMap, idx: &[usize]) -> FluxResult<Value> {
    let num = nodal_at(data, "B_theta_rr", idx)? - nodal_at(data, "B_rho_rt", idx)?;
    Ok(Value::Nodal(num / (nodal_at(data, "sqrt(g)_r", idx)? * MU0)))
}

/// J with e_θ/√g replaced by e_θ,ρ/√g_ρ.
pub(crate) fn j_vector(_: &ComputeInputs<'_>, data: &DataMap, idx: &[usize]) -> FluxResult<Value> {
    let e_theta = scale(
        &vector_at(data, "e_theta_r", idx)?,
        &recip(&nodal_at(data, "sqrt(g)_r", idx)?),
    );
    let j = scale(&vector_at(data, "e_rho", idx)?, &nodal_at(data, "J^rho", idx)?)
        + scale(&e_theta, &nodal_at(data, "sqrt(g)J^theta", idx)?)
        + scale(&vector_at(data, "e_zeta", idx)?, &nodal_at(data, "J^zeta", idx)?);
    Ok(Value::Vector(j))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_patch_replaces_axis_rows() {
        let bulk = Value::Nodal(array![f64::NAN, 2.0, f64::NAN, 4.0]);
        let out = patch("x", bulk, Value::Nodal(array![1.0, 3.0]), &[0, 2]).expect("patch");
        match out {
            Value::Nodal(a) => assert_eq!(a, array![1.0, 2.0, 3.0, 4.0]),
            other => panic!("Expected nodal, got {}", other.describe()),
        }

        let bulk = Value::Vector(Array2::from_elem((2, 3), f64::INFINITY));
        let lim = Value::Vector(array![[1.0, 2.0, 3.0]]);
        let out = patch("v", bulk, lim, &[1]).expect("patch");
        assert!(!out.is_finite());
        match out {
            Value::Vector(a) => assert_eq!(a.row(1), array![1.0, 2.0, 3.0]),
            other => panic!("Expected vector, got {}", other.describe()),
        }
    }

    #[test]
    fn test_patch_rejects_wrong_shape() {
        let bulk = Value::Nodal(array![0.0, 0.0]);
        match patch("x", bulk, Value::Nodal(array![1.0, 2.0]), &[0]) {
            Err(FluxError::ShapeMismatch { name, .. }) => assert_eq!(name, "x"),
            other => panic!("Expected ShapeMismatch, got {other:?}"),
        }
        let bulk = Value::Nodal(array![0.0]);
        assert!(patch("x", bulk, Value::Global(1.0), &[0]).is_err());
    }

    #[test]
    fn test_b0_limit_dependencies() {
        let deps = b0_deps([0, 1, 0]);
        assert!(deps.contains(&"sqrt(g)_r".to_string()));
        assert!(deps.contains(&"sqrt(g)_rt".to_string()));
        assert!(deps.contains(&"B0".to_string()));
        assert!(!deps.contains(&"B0_t".to_string()));
    }
}
