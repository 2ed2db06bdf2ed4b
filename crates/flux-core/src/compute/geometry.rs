// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Flux-Coordinate Geometry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Coordinates, basis vectors, Jacobian, metric and volume.
//!
//! With φ = ζ the covariant basis in (R, φ, Z) components is
//!   e_ρ = (R_ρ, 0, Z_ρ),  e_θ = (R_θ, 0, Z_θ),  e_ζ = (R_ζ, R, Z_ζ)
//! and √g = e_ρ · (e_θ × e_ζ). Derivatives of √g follow the multinomial
//! Leibniz rule over the three factors.

use std::collections::BTreeSet;

use flux_math::transform::derivatives_up_to;
use ndarray::Array1;

use super::{add, cross, dot, scale, splits3, stack, DR, DT, DZ};
use crate::axis;
use crate::data::Value;
use crate::plan::MAX_GEOMETRY_ORDER;
use crate::registry::{key, Quantity, Registry, Shape, Source};

/// Highest derivative order of the covariant basis vectors and √g.
pub const MAX_BASIS_ORDER: u8 = MAX_GEOMETRY_ORDER - 1;

pub(crate) fn register(reg: &mut Registry) {
    register_coordinates(reg);
    register_covariant_basis(reg);
    register_jacobian(reg);
    register_metric(reg);
    register_volume(reg);
}

fn register_coordinates(reg: &mut Registry) {
    for (source, base, units, label) in [
        (Source::R, "R", "m", "major radius"),
        (Source::Z, "Z", "m", "vertical coordinate"),
        (Source::Lambda, "lambda", "rad", "poloidal stream function"),
    ] {
        for d in derivatives_up_to(MAX_GEOMETRY_ORDER) {
            reg.add(
                Quantity::new(
                    key(base, d),
                    Shape::Nodal,
                    units,
                    format!("{label}, derivative {d:?}"),
                    move |inputs, _| Ok(Value::Nodal(inputs.spectral(source)?.eval(d)?)),
                )
                .source(source, d),
            );
        }
    }

    reg.add(Quantity::new(
        "phi",
        Shape::Nodal,
        "rad",
        "toroidal angle φ = ζ",
        |inputs, _| Ok(Value::Nodal(inputs.grid.zeta().to_owned())),
    ));
    reg.add(
        Quantity::new("X", Shape::Nodal, "m", "Cartesian x", |_, data| {
            Ok(Value::Nodal(data.nodal("R")? * &data.nodal("phi")?.mapv(f64::cos)))
        })
        .deps(["R", "phi"]),
    );
    reg.add(
        Quantity::new("Y", Shape::Nodal, "m", "Cartesian y", |_, data| {
            Ok(Value::Nodal(data.nodal("R")? * &data.nodal("phi")?.mapv(f64::sin)))
        })
        .deps(["R", "phi"]),
    );
}

fn register_covariant_basis(reg: &mut Registry) {
    for d in derivatives_up_to(MAX_BASIS_ORDER) {
        for (base, dir, toroidal) in [
            ("e_rho", DR, false),
            ("e_theta", DT, false),
            ("e_zeta", DZ, true),
        ] {
            let rk = key("R", add(d, dir));
            let zk = key("Z", add(d, dir));
            // ∂^d of the φ component R of e_ζ
            let pk = key("R", d);
            let mut deps = vec![rk.clone(), zk.clone()];
            if toroidal {
                deps.push(pk.clone());
            }
            reg.add(
                Quantity::new(
                    key(base, d),
                    Shape::Vector,
                    "m",
                    format!("covariant basis vector {base}, derivative {d:?}"),
                    move |_, data| {
                        let r = data.nodal(&rk)?;
                        let z = data.nodal(&zk)?;
                        let phi = if toroidal {
                            data.nodal(&pk)?.clone()
                        } else {
                            Array1::zeros(r.len())
                        };
                        Ok(Value::Vector(stack(r, &phi, z)))
                    },
                )
                .deps(deps),
            );
        }
    }
}

fn register_jacobian(reg: &mut Registry) {
    for d in derivatives_up_to(MAX_BASIS_ORDER) {
        let terms: Vec<(String, String, String, f64)> = splits3(d)
            .into_iter()
            .map(|(a, b, c, w)| (key("e_rho", a), key("e_theta", b), key("e_zeta", c), w))
            .collect();
        let deps: BTreeSet<String> = terms
            .iter()
            .flat_map(|(a, b, c, _)| [a.clone(), b.clone(), c.clone()])
            .collect();
        reg.add(
            Quantity::new(
                key("sqrt(g)", d),
                Shape::Nodal,
                "m^3",
                format!("coordinate Jacobian, derivative {d:?}"),
                move |inputs, data| {
                    let mut out = Array1::zeros(inputs.grid.num_nodes());
                    for (a, b, c, w) in &terms {
                        let triple = dot(data.vector(a)?, &cross(data.vector(b)?, data.vector(c)?));
                        out.scaled_add(*w, &triple);
                    }
                    Ok(Value::Nodal(out))
                },
            )
            .deps(deps),
        );
    }
}

fn register_metric(reg: &mut Registry) {
    for (name, a, b) in [
        ("g_rr", "e_rho", "e_rho"),
        ("g_tt", "e_theta", "e_theta"),
        ("g_zz", "e_zeta", "e_zeta"),
        ("g_rt", "e_rho", "e_theta"),
        ("g_rz", "e_rho", "e_zeta"),
        ("g_tz", "e_theta", "e_zeta"),
    ] {
        reg.add(
            Quantity::new(name, Shape::Nodal, "m^2", "covariant metric", move |_, data| {
                Ok(Value::Nodal(dot(data.vector(a)?, data.vector(b)?)))
            })
            .deps([a, b]),
        );
    }

    reg.add(
        Quantity::new(
            "e^rho",
            Shape::Vector,
            "m^-1",
            "contravariant basis vector ∇ρ",
            |_, data| {
                let inv = data.nodal("sqrt(g)")?.mapv(|v| 1.0 / v);
                Ok(Value::Vector(scale(
                    &cross(data.vector("e_theta")?, data.vector("e_zeta")?),
                    &inv,
                )))
            },
        )
        .deps(["e_theta", "e_zeta", "sqrt(g)"])
        .axis_limit(["e_theta_r", "e_zeta", "sqrt(g)_r"], axis::e_sup_rho),
    );
    reg.add(
        Quantity::new(
            "e^theta*sqrt(g)",
            Shape::Vector,
            "m^2",
            "√g ∇θ = e_ζ × e_ρ",
            |_, data| {
                Ok(Value::Vector(cross(
                    data.vector("e_zeta")?,
                    data.vector("e_rho")?,
                )))
            },
        )
        .deps(["e_zeta", "e_rho"]),
    );
    reg.add(
        Quantity::new(
            "e^theta",
            Shape::Vector,
            "m^-1",
            "contravariant basis vector ∇θ",
            |_, data| {
                let inv = data.nodal("sqrt(g)")?.mapv(|v| 1.0 / v);
                Ok(Value::Vector(scale(data.vector("e^theta*sqrt(g)")?, &inv)))
            },
        )
        .deps(["e^theta*sqrt(g)", "sqrt(g)"])
        .singular_on_axis(),
    );
    reg.add(
        Quantity::new(
            "e^zeta",
            Shape::Vector,
            "m^-1",
            "contravariant basis vector ∇ζ = φ̂/R",
            |_, data| {
                let r = data.nodal("R")?;
                let zero = Array1::zeros(r.len());
                Ok(Value::Vector(stack(&zero, &r.mapv(|v| 1.0 / v), &zero)))
            },
        )
        .deps(["R"]),
    );

    for (name, a, b) in [
        ("g^rr", "e^rho", "e^rho"),
        ("g^tt", "e^theta", "e^theta"),
        ("g^zz", "e^zeta", "e^zeta"),
        ("g^rt", "e^rho", "e^theta"),
        ("g^rz", "e^rho", "e^zeta"),
        ("g^tz", "e^theta", "e^zeta"),
    ] {
        reg.add(
            Quantity::new(name, Shape::Nodal, "m^-2", "contravariant metric", move |_, data| {
                Ok(Value::Nodal(dot(data.vector(a)?, data.vector(b)?)))
            })
            .deps([a, b]),
        );
    }
    for (name, g) in [
        ("|grad(rho)|", "g^rr"),
        ("|grad(theta)|", "g^tt"),
        ("|grad(zeta)|", "g^zz"),
    ] {
        reg.add(
            Quantity::new(name, Shape::Nodal, "m^-1", "gradient magnitude", move |_, data| {
                Ok(Value::Nodal(data.nodal(g)?.mapv(f64::sqrt)))
            })
            .deps([g]),
        );
    }
}

fn register_volume(reg: &mut Registry) {
    reg.add(
        Quantity::new("V", Shape::Global, "m^3", "plasma volume", |inputs, data| {
            let sqrt_g = data.nodal("sqrt(g)")?;
            Ok(Value::Global(
                sqrt_g
                    .iter()
                    .zip(inputs.grid.weights().iter())
                    .map(|(g, w)| g.abs() * w)
                    .sum(),
            ))
        })
        .deps(["sqrt(g)"]),
    );
    reg.add(
        Quantity::new(
            "A",
            Shape::Global,
            "m^2",
            "cross-section area averaged over ζ planes",
            |inputs, data| {
                let grid = inputs.grid;
                let sqrt_g = data.nodal("sqrt(g)")?;
                let r = data.nodal("R")?;
                let planes = grid.num_zeta().max(1);
                // strip the toroidal weight 2π/N
                let dzeta = 2.0 * std::f64::consts::PI / planes as f64;
                let mut per_plane = vec![0.0; planes];
                for (i, &plane) in grid.inverse_zeta_idx().iter().enumerate() {
                    per_plane[plane] += (sqrt_g[i] / r[i]).abs() * grid.weights()[i] / dzeta;
                }
                Ok(Value::Global(per_plane.iter().sum::<f64>() / planes as f64))
            },
        )
        .deps(["sqrt(g)", "R"]),
    );
    reg.add(
        Quantity::new("R0", Shape::Global, "m", "major radius V / 2πA", |_, data| {
            Ok(Value::Global(
                data.global("V")? / (2.0 * std::f64::consts::PI * data.global("A")?),
            ))
        })
        .deps(["V", "A"]),
    );
    reg.add(
        Quantity::new("a", Shape::Global, "m", "minor radius √(A/π)", |_, data| {
            Ok(Value::Global((data.global("A")? / std::f64::consts::PI).sqrt()))
        })
        .deps(["A"]),
    );
    reg.add(
        Quantity::new("R0/a", Shape::Global, "~", "aspect ratio", |_, data| {
            Ok(Value::Global(data.global("R0")? / data.global("a")?))
        })
        .deps(["R0", "a"]),
    );
}
