// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Magnetic Field
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Magnetic field in straight-field-line form.
//!
//! B = B0 [(ι − λ_ζ) e_θ + (1 + λ_θ) e_ζ] with B0 = ψ_ρ / √g. Every
//! derivative is expanded with the Leibniz rule so that the curl in
//! `current` can be taken from covariant components alone.

use flux_math::basis::Deriv;
use flux_math::transform::derivatives_up_to;
use flux_types::error::FluxResult;
use ndarray::{Array1, Array2};

use super::profiles::psi_r_derivative;
use super::{add, binom, dot, lower, scale, sub, D0, DT, DZ};
use crate::axis;
use crate::data::{DataMap, Value};
use crate::registry::{key, Quantity, Registry, Shape};

/// Highest derivative order of B and its components.
pub const MAX_FIELD_ORDER: u8 = 2;

pub(crate) fn register(reg: &mut Registry) {
    register_b0(reg);
    register_contravariant(reg);
    register_vector(reg);
    register_covariant(reg);
    register_magnitude(reg);
}

fn strictly_lower(d: Deriv) -> impl Iterator<Item = Deriv> {
    lower(d).into_iter().filter(move |&b| b != d)
}

fn register_b0(reg: &mut Registry) {
    for d in derivatives_up_to(MAX_FIELD_ORDER) {
        let mut deps: Vec<String> = lower(d)
            .into_iter()
            .map(|b| key("sqrt(g)", sub(d, b)))
            .collect();
        deps.extend(strictly_lower(d).map(|b| key("B0", b)));
        reg.add(
            Quantity::new(
                key("B0", d),
                Shape::Nodal,
                "T/m",
                format!("ψ_ρ / √g, derivative {d:?}"),
                move |inputs, data| {
                    let mut num = psi_r_derivative(inputs.psi, inputs.grid.rho(), d);
                    for b in strictly_lower(d) {
                        let term = data.nodal(&key("B0", b))? * data.nodal(&key("sqrt(g)", sub(d, b)))?;
                        num.scaled_add(-binom(d, b), &term);
                    }
                    Ok(Value::Nodal(num / data.nodal("sqrt(g)")?))
                },
            )
            .deps(deps)
            .axis_limit(axis::b0_deps(d), axis::b0(d)),
        );
    }
}

/// ∂^e (ι − λ_ζ); ι depends on ρ only.
fn theta_factor(data: &DataMap, e: Deriv) -> FluxResult<Array1<f64>> {
    let mut out = -data.nodal(&key("lambda", add(e, DZ)))?;
    if e[1] == 0 && e[2] == 0 {
        out += data.nodal(&key("iota", e))?;
    }
    Ok(out)
}

fn theta_factor_deps(e: Deriv) -> Vec<String> {
    let mut deps = vec![key("lambda", add(e, DZ))];
    if e[1] == 0 && e[2] == 0 {
        deps.push(key("iota", e));
    }
    deps
}

/// ∂^e (1 + λ_θ).
fn zeta_factor(data: &DataMap, e: Deriv) -> FluxResult<Array1<f64>> {
    let lam = data.nodal(&key("lambda", add(e, DT)))?;
    Ok(if e == D0 { lam + 1.0 } else { lam.clone() })
}

fn register_contravariant(reg: &mut Registry) {
    reg.add(Quantity::new(
        "B^rho",
        Shape::Nodal,
        "T/m",
        "contravariant radial field, zero on flux surfaces",
        |inputs, _| Ok(Value::Nodal(Array1::zeros(inputs.grid.num_nodes()))),
    ));

    for d in derivatives_up_to(MAX_FIELD_ORDER) {
        let mut deps = Vec::new();
        for b in lower(d) {
            deps.push(key("B0", b));
            deps.extend(theta_factor_deps(sub(d, b)));
        }
        reg.add(
            Quantity::new(
                key("B^theta", d),
                Shape::Nodal,
                "T/m",
                format!("contravariant poloidal field, derivative {d:?}"),
                move |inputs, data| {
                    let mut out = Array1::zeros(inputs.grid.num_nodes());
                    for b in lower(d) {
                        let term = data.nodal(&key("B0", b))? * &theta_factor(data, sub(d, b))?;
                        out.scaled_add(binom(d, b), &term);
                    }
                    Ok(Value::Nodal(out))
                },
            )
            .deps(deps),
        );
    }

    for d in derivatives_up_to(MAX_FIELD_ORDER) {
        let mut deps = Vec::new();
        for b in lower(d) {
            deps.push(key("B0", b));
            deps.push(key("lambda", add(sub(d, b), DT)));
        }
        reg.add(
            Quantity::new(
                key("B^zeta", d),
                Shape::Nodal,
                "T/m",
                format!("contravariant toroidal field, derivative {d:?}"),
                move |inputs, data| {
                    let mut out = Array1::zeros(inputs.grid.num_nodes());
                    for b in lower(d) {
                        let term = data.nodal(&key("B0", b))? * &zeta_factor(data, sub(d, b))?;
                        out.scaled_add(binom(d, b), &term);
                    }
                    Ok(Value::Nodal(out))
                },
            )
            .deps(deps),
        );
    }
}

fn register_vector(reg: &mut Registry) {
    for d in derivatives_up_to(MAX_FIELD_ORDER) {
        let mut deps = Vec::new();
        for b in lower(d) {
            let rest = sub(d, b);
            deps.extend([
                key("B^theta", b),
                key("B^zeta", b),
                key("e_theta", rest),
                key("e_zeta", rest),
            ]);
        }
        reg.add(
            Quantity::new(
                key("B", d),
                Shape::Vector,
                "T",
                format!("magnetic field (R, φ, Z), derivative {d:?}"),
                move |inputs, data| {
                    let mut out = Array2::zeros((inputs.grid.num_nodes(), 3));
                    for b in lower(d) {
                        let rest = sub(d, b);
                        let term = scale(data.vector(&key("e_theta", rest))?, data.nodal(&key("B^theta", b))?)
                            + scale(data.vector(&key("e_zeta", rest))?, data.nodal(&key("B^zeta", b))?);
                        out.scaled_add(binom(d, b), &term);
                    }
                    Ok(Value::Vector(out))
                },
            )
            .deps(deps),
        );
    }

    for (col, name) in ["B_R", "B_phi", "B_Z"].into_iter().enumerate() {
        reg.add(
            Quantity::new(name, Shape::Nodal, "T", "cylindrical field component", move |_, data| {
                Ok(Value::Nodal(data.vector("B")?.column(col).to_owned()))
            })
            .deps(["B"]),
        );
    }
}

fn register_covariant(reg: &mut Registry) {
    for (base, basis) in [
        ("B_rho", "e_rho"),
        ("B_theta", "e_theta"),
        ("B_zeta", "e_zeta"),
    ] {
        for d in derivatives_up_to(MAX_FIELD_ORDER) {
            let mut deps = Vec::new();
            for b in lower(d) {
                deps.push(key("B", b));
                deps.push(key(basis, sub(d, b)));
            }
            reg.add(
                Quantity::new(
                    key(base, d),
                    Shape::Nodal,
                    "T·m",
                    format!("covariant field B · {basis}, derivative {d:?}"),
                    move |inputs, data| {
                        let mut out = Array1::zeros(inputs.grid.num_nodes());
                        for b in lower(d) {
                            let term = dot(data.vector(&key("B", b))?, data.vector(&key(basis, sub(d, b)))?);
                            out.scaled_add(binom(d, b), &term);
                        }
                        Ok(Value::Nodal(out))
                    },
                )
                .deps(deps),
            );
        }
    }
}

fn register_magnitude(reg: &mut Registry) {
    for d in derivatives_up_to(MAX_FIELD_ORDER) {
        if d == D0 {
            reg.add(
                Quantity::new("|B|", Shape::Nodal, "T", "field strength", |_, data| {
                    Ok(Value::Nodal(super::norm(data.vector("B")?)))
                })
                .deps(["B"]),
            );
            continue;
        }
        let mut deps: Vec<String> = lower(d).into_iter().map(|b| key("B", b)).collect();
        deps.extend(strictly_lower(d).map(|b| key("|B|", b)));
        reg.add(
            Quantity::new(
                key("|B|", d),
                Shape::Nodal,
                "T",
                format!("field strength, derivative {d:?}"),
                move |_, data| {
                    let mag = data.nodal("|B|")?;
                    // (|B|²)_d minus the cross terms of |B| · |B|
                    let mut num = Array1::zeros(mag.len());
                    for b in lower(d) {
                        let bb = dot(data.vector(&key("B", b))?, data.vector(&key("B", sub(d, b)))?);
                        num.scaled_add(binom(d, b), &bb);
                        if b != D0 && b != d {
                            let cross = data.nodal(&key("|B|", b))? * data.nodal(&key("|B|", sub(d, b)))?;
                            num.scaled_add(-binom(d, b), &cross);
                        }
                    }
                    Ok(Value::Nodal(num / &(mag * 2.0)))
                },
            )
            .deps(deps),
        );
    }

    reg.add(
        Quantity::new(
            "B*grad(|B|)",
            Shape::Nodal,
            "T^2/m",
            "parallel derivative of the field strength",
            |_, data| {
                Ok(Value::Nodal(
                    data.nodal("B^theta")? * data.nodal("|B|_t")?
                        + data.nodal("B^zeta")? * data.nodal("|B|_z")?,
                ))
            },
        )
        .deps(["B^theta", "|B|_t", "B^zeta", "|B|_z"]),
    );
    for (dir, letter) in [([1u8, 0, 0], "r"), ([0, 1, 0], "t"), ([0, 0, 1], "z")] {
        let (bt, bz) = (key("B^theta", dir), key("B^zeta", dir));
        let (mt, mz) = (key("|B|", add(dir, DT)), key("|B|", add(dir, DZ)));
        let deps = [
            bt.clone(),
            "|B|_t".to_string(),
            "B^theta".to_string(),
            mt.clone(),
            bz.clone(),
            "|B|_z".to_string(),
            "B^zeta".to_string(),
            mz.clone(),
        ];
        reg.add(
            Quantity::new(
                format!("(B*grad(|B|))_{letter}"),
                Shape::Nodal,
                "T^2/m",
                "derivative of the parallel field-strength gradient",
                move |_, data| {
                    Ok(Value::Nodal(
                        data.nodal(&bt)? * data.nodal("|B|_t")?
                            + data.nodal("B^theta")? * data.nodal(&mt)?
                            + data.nodal(&bz)? * data.nodal("|B|_z")?
                            + data.nodal("B^zeta")? * data.nodal(&mz)?,
                    ))
                },
            )
            .deps(deps),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{axis_grid, interior_grid, Circular};
    use std::f64::consts::PI;

    #[test]
    fn test_circular_field() {
        let iota = 0.7;
        let eq = Circular::new(10.0, 1.0, iota, 0.0);
        let grid = interior_grid();
        let data = eq
            .compute(&grid, &["|B|", "|B|_t", "B_phi", "B_R", "B^rho", "(B*grad(|B|))_t"], 3)
            .expect("compute");
        let c = eq.psi / (PI * eq.a * eq.a);
        for i in 0..grid.num_nodes() {
            let (rho, theta) = (grid.rho()[i], grid.theta()[i]);
            let r = eq.r0 + eq.a * rho * theta.cos();
            let arho = eq.a * rho;
            let root = (iota * iota * arho * arho / (r * r) + 1.0).sqrt();
            let mag = c * root;
            assert!((data.nodal("|B|").expect("|B|")[i] - mag).abs() < 1e-10 * mag);
            assert!((data.nodal("B_phi").expect("B_phi")[i] - c).abs() < 1e-10 * c);
            let b_r = -c / r * iota * arho * theta.sin();
            assert!((data.nodal("B_R").expect("B_R")[i] - b_r).abs() < 1e-10 * c);
            let dmag = c * iota * iota * arho * arho * arho * theta.sin() / (r.powi(3) * root);
            assert!((data.nodal("|B|_t").expect("|B|_t")[i] - dmag).abs() < 1e-9 * c);
            assert_eq!(data.nodal("B^rho").expect("B^rho")[i], 0.0);
        }
        assert!(data.nodal("(B*grad(|B|))_t").expect("t").iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_b0_axis_limit() {
        let eq = Circular::new(10.0, 2.0, 1.0, 0.0);
        let grid = axis_grid();
        let data = eq.compute(&grid, &["B0_r", "B0_t", "|B|"], 4).expect("compute");
        let c = eq.psi / (PI * eq.a * eq.a);
        let (b0, b0_r, b0_t) = (
            data.nodal("B0").expect("B0"),
            data.nodal("B0_r").expect("B0_r"),
            data.nodal("B0_t").expect("B0_t"),
        );
        assert!(!grid.axis().is_empty());
        for &i in grid.axis() {
            let theta = grid.theta()[i];
            assert!((b0[i] - c / eq.r0).abs() < 1e-10 * c);
            let expected = -c * eq.a * theta.cos() / (eq.r0 * eq.r0);
            assert!((b0_r[i] - expected).abs() < 1e-9 * c, "{} vs {expected}", b0_r[i]);
            assert!(b0_t[i].abs() < 1e-9 * c);
        }
        assert!(data.nodal("|B|").expect("|B|").iter().all(|v| v.is_finite()));
    }
}
