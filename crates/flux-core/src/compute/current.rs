// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Plasma Current
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Current density J = ∇×B / μ0 from the covariant field components.
//!
//! The curl numerators √g J^i are finite everywhere; only the division by √g
//! needs an axis limit.

use flux_types::constants::MU0;

use super::{norm, scale};
use crate::axis;
use crate::data::Value;
use crate::registry::{Quantity, Registry, Shape};

pub(crate) fn register(reg: &mut Registry) {
    for (name, plus, minus) in [
        ("sqrt(g)J^rho", "B_zeta_t", "B_theta_z"),
        ("sqrt(g)J^theta", "B_rho_z", "B_zeta_r"),
        ("sqrt(g)J^zeta", "B_theta_r", "B_rho_t"),
    ] {
        reg.add(
            Quantity::new(name, Shape::Nodal, "A/m", "curl numerator of the current density", move |_, data| {
                Ok(Value::Nodal((data.nodal(plus)? - data.nodal(minus)?) / MU0))
            })
            .deps([plus, minus]),
        );
    }

    reg.add(
        Quantity::new("J^rho", Shape::Nodal, "A/m^3", "contravariant radial current density", |_, data| {
            Ok(Value::Nodal(data.nodal("sqrt(g)J^rho")? / data.nodal("sqrt(g)")?))
        })
        .deps(["sqrt(g)J^rho", "sqrt(g)"])
        .axis_limit(["B_zeta_rt", "B_theta_rz", "sqrt(g)_r"], axis::j_sup_rho),
    );
    reg.add(
        Quantity::new("J^theta", Shape::Nodal, "A/m^3", "contravariant poloidal current density", |_, data| {
            Ok(Value::Nodal(data.nodal("sqrt(g)J^theta")? / data.nodal("sqrt(g)")?))
        })
        .deps(["sqrt(g)J^theta", "sqrt(g)"])
        .singular_on_axis(),
    );
    reg.add(
        Quantity::new("J^zeta", Shape::Nodal, "A/m^3", "contravariant toroidal current density", |_, data| {
            Ok(Value::Nodal(data.nodal("sqrt(g)J^zeta")? / data.nodal("sqrt(g)")?))
        })
        .deps(["sqrt(g)J^zeta", "sqrt(g)"])
        .axis_limit(["B_theta_rr", "B_rho_rt", "sqrt(g)_r"], axis::j_sup_zeta),
    );

    reg.add(
        Quantity::new("J", Shape::Vector, "A/m^2", "current density (R, φ, Z)", |_, data| {
            let inv = data.nodal("sqrt(g)")?.mapv(|v| 1.0 / v);
            let j_theta = data.nodal("sqrt(g)J^theta")? * &inv;
            Ok(Value::Vector(
                scale(data.vector("e_rho")?, data.nodal("J^rho")?)
                    + scale(data.vector("e_theta")?, &j_theta)
                    + scale(data.vector("e_zeta")?, data.nodal("J^zeta")?),
            ))
        })
        .deps([
            "J^rho",
            "sqrt(g)J^theta",
            "sqrt(g)",
            "J^zeta",
            "e_rho",
            "e_theta",
            "e_zeta",
        ])
        .axis_limit(
            ["J^rho", "J^zeta", "sqrt(g)J^theta", "e_rho", "e_theta_r", "e_zeta", "sqrt(g)_r"],
            axis::j_vector,
        ),
    );
    reg.add(
        Quantity::new("|J|", Shape::Nodal, "A/m^2", "current density magnitude", |_, data| {
            Ok(Value::Nodal(norm(data.vector("J")?)))
        })
        .deps(["J"]),
    );
}
