// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Force Balance
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Ideal-MHD force residual F = J×B − ∇p, magnetic pressure gradient and
//! field-line tension.
//!
//! Vectors that would need ∇θ = e^θ are assembled from √g e^θ with the
//! matching √g folded into the coefficient, which keeps F and curl(B)×B
//! finite on the magnetic axis.

use flux_types::constants::MU0;
use flux_types::error::FluxResult;
use ndarray::{Array1, Array2};

use super::{dot, norm, scale};
use crate::data::{DataMap, Value};
use crate::registry::{Quantity, Registry, Shape};

pub(crate) fn register(reg: &mut Registry) {
    register_residual(reg);
    register_pressure_gradient(reg);
    register_tension(reg);
}

/// c_ρ e^ρ + c_θ' (√g e^θ) + c_ζ e^ζ.
fn assemble(
    data: &DataMap,
    rho: &Array1<f64>,
    theta_sqrt_g: &Array1<f64>,
    zeta: &Array1<f64>,
) -> FluxResult<Array2<f64>> {
    Ok(scale(data.vector("e^rho")?, rho)
        + scale(data.vector("e^theta*sqrt(g)")?, theta_sqrt_g)
        + scale(data.vector("e^zeta")?, zeta))
}

fn register_residual(reg: &mut Registry) {
    reg.add(
        Quantity::new("F_rho", Shape::Nodal, "N/m^2", "radial force residual", |_, data| {
            Ok(Value::Nodal(
                data.nodal("B^zeta")? * data.nodal("sqrt(g)J^theta")?
                    - data.nodal("B^theta")? * data.nodal("sqrt(g)J^zeta")?
                    - data.nodal("p_r")?,
            ))
        })
        .deps(["B^zeta", "sqrt(g)J^theta", "B^theta", "sqrt(g)J^zeta", "p_r"]),
    );
    reg.add(
        Quantity::new("F_theta", Shape::Nodal, "N/m^2", "poloidal force residual", |_, data| {
            Ok(Value::Nodal(-(data.nodal("B^zeta")? * data.nodal("sqrt(g)J^rho")?)))
        })
        .deps(["B^zeta", "sqrt(g)J^rho"]),
    );
    reg.add(
        Quantity::new("F_zeta", Shape::Nodal, "N/m^2", "toroidal force residual", |_, data| {
            Ok(Value::Nodal(data.nodal("B^theta")? * data.nodal("sqrt(g)J^rho")?))
        })
        .deps(["B^theta", "sqrt(g)J^rho"]),
    );
    reg.add(
        Quantity::new("F_beta", Shape::Nodal, "A", "helical force residual √g J^ρ", |_, data| {
            Ok(Value::Nodal(data.nodal("sqrt(g)J^rho")?.clone()))
        })
        .deps(["sqrt(g)J^rho"]),
    );
    reg.add(
        Quantity::new("F", Shape::Vector, "N/m^3", "force residual (R, φ, Z)", |_, data| {
            // F_θ e^θ = -B^ζ J^ρ (√g e^θ)
            let theta = -(data.nodal("B^zeta")? * data.nodal("J^rho")?);
            Ok(Value::Vector(assemble(
                data,
                data.nodal("F_rho")?,
                &theta,
                data.nodal("F_zeta")?,
            )?))
        })
        .deps(["F_rho", "B^zeta", "J^rho", "F_zeta", "e^rho", "e^theta*sqrt(g)", "e^zeta"]),
    );
    reg.add(
        Quantity::new("|F|", Shape::Nodal, "N/m^3", "force residual magnitude", |_, data| {
            Ok(Value::Nodal(norm(data.vector("F")?)))
        })
        .deps(["F"]),
    );
    reg.add(
        Quantity::new("|grad(p)|", Shape::Nodal, "N/m^3", "pressure gradient magnitude", |_, data| {
            Ok(Value::Nodal(data.nodal("p_r")?.mapv(f64::abs) * data.nodal("|grad(rho)|")?))
        })
        .deps(["p_r", "|grad(rho)|"]),
    );
    reg.add(
        Quantity::new("|beta|", Shape::Nodal, "T/m^2", "magnitude of B^ζ ∇θ − B^θ ∇ζ", |_, data| {
            let (bt, bz) = (data.nodal("B^theta")?, data.nodal("B^zeta")?);
            let sq = bz * bz * data.nodal("g^tt")? + bt * bt * data.nodal("g^zz")?
                - (bt * bz) * 2.0 * data.nodal("g^tz")?;
            Ok(Value::Nodal(sq.mapv(f64::sqrt)))
        })
        .deps(["B^theta", "B^zeta", "g^tt", "g^zz", "g^tz"]),
    );
}

fn register_pressure_gradient(reg: &mut Registry) {
    for (letter, name) in [("r", "rho"), ("t", "theta"), ("z", "zeta")] {
        let keys = [
            format!("B_theta_{letter}"),
            format!("B^theta_{letter}"),
            format!("B_zeta_{letter}"),
            format!("B^zeta_{letter}"),
        ];
        let deps: Vec<String> = keys
            .iter()
            .cloned()
            .chain(["B^theta", "B_theta", "B^zeta", "B_zeta"].map(String::from))
            .collect();
        reg.add(
            Quantity::new(
                format!("grad(|B|^2)_{name}"),
                Shape::Nodal,
                "T^2",
                "covariant component of the magnetic pressure gradient",
                move |_, data| {
                    let [bt_d, bt_sup_d, bz_d, bz_sup_d] = &keys;
                    Ok(Value::Nodal(
                        data.nodal("B^theta")? * data.nodal(bt_d)?
                            + data.nodal("B_theta")? * data.nodal(bt_sup_d)?
                            + data.nodal("B^zeta")? * data.nodal(bz_d)?
                            + data.nodal("B_zeta")? * data.nodal(bz_sup_d)?,
                    ))
                },
            )
            .deps(deps),
        );
    }
    reg.add(
        Quantity::new("grad(|B|^2)", Shape::Vector, "T^2/m", "magnetic pressure gradient", |_, data| {
            Ok(Value::Vector(
                scale(data.vector("e^rho")?, data.nodal("grad(|B|^2)_rho")?)
                    + scale(data.vector("e^theta")?, data.nodal("grad(|B|^2)_theta")?)
                    + scale(data.vector("e^zeta")?, data.nodal("grad(|B|^2)_zeta")?),
            ))
        })
        .deps([
            "grad(|B|^2)_rho",
            "grad(|B|^2)_theta",
            "grad(|B|^2)_zeta",
            "e^rho",
            "e^theta",
            "e^zeta",
        ]),
    );
    reg.add(
        Quantity::new("|grad(|B|^2)|", Shape::Nodal, "T^2/m", "magnetic pressure gradient magnitude", |_, data| {
            Ok(Value::Nodal(norm(data.vector("grad(|B|^2)")?)))
        })
        .deps(["grad(|B|^2)"]),
    );
}

fn register_tension(reg: &mut Registry) {
    reg.add(
        Quantity::new("(curl(B)xB)_rho", Shape::Nodal, "T^2", "radial curl(B)×B", |_, data| {
            let jxb = data.nodal("B^zeta")? * data.nodal("sqrt(g)J^theta")?
                - data.nodal("B^theta")? * data.nodal("sqrt(g)J^zeta")?;
            Ok(Value::Nodal(jxb * MU0))
        })
        .deps(["B^zeta", "sqrt(g)J^theta", "B^theta", "sqrt(g)J^zeta"]),
    );
    reg.add(
        Quantity::new("(curl(B)xB)_theta", Shape::Nodal, "T^2", "poloidal curl(B)×B", |_, data| {
            Ok(Value::Nodal(data.nodal("B^zeta")? * data.nodal("sqrt(g)J^rho")? * -MU0))
        })
        .deps(["B^zeta", "sqrt(g)J^rho"]),
    );
    reg.add(
        Quantity::new("(curl(B)xB)_zeta", Shape::Nodal, "T^2", "toroidal curl(B)×B", |_, data| {
            Ok(Value::Nodal(data.nodal("B^theta")? * data.nodal("sqrt(g)J^rho")? * MU0))
        })
        .deps(["B^theta", "sqrt(g)J^rho"]),
    );
    reg.add(
        Quantity::new("curl(B)xB", Shape::Vector, "T^2/m", "curl(B)×B (R, φ, Z)", |_, data| {
            let theta = data.nodal("B^zeta")? * data.nodal("J^rho")? * -MU0;
            Ok(Value::Vector(assemble(
                data,
                data.nodal("(curl(B)xB)_rho")?,
                &theta,
                data.nodal("(curl(B)xB)_zeta")?,
            )?))
        })
        .deps([
            "(curl(B)xB)_rho",
            "B^zeta",
            "J^rho",
            "(curl(B)xB)_zeta",
            "e^rho",
            "e^theta*sqrt(g)",
            "e^zeta",
        ]),
    );
    reg.add(
        Quantity::new("(B*grad)B", Shape::Vector, "T^2/m", "field-line tension", |_, data| {
            Ok(Value::Vector(
                data.vector("curl(B)xB")? + &(data.vector("grad(|B|^2)")? * 0.5),
            ))
        })
        .deps(["curl(B)xB", "grad(|B|^2)"]),
    );
    for (name, basis) in [
        ("((B*grad)B)_rho", "e_rho"),
        ("((B*grad)B)_theta", "e_theta"),
        ("((B*grad)B)_zeta", "e_zeta"),
    ] {
        reg.add(
            Quantity::new(name, Shape::Nodal, "T^2", "covariant field-line tension", move |_, data| {
                Ok(Value::Nodal(dot(data.vector("(B*grad)B")?, data.vector(basis)?)))
            })
            .deps(["(B*grad)B", basis]),
        );
    }
    reg.add(
        Quantity::new("|(B*grad)B|", Shape::Nodal, "T^2/m", "field-line tension magnitude", |_, data| {
            Ok(Value::Nodal(norm(data.vector("(B*grad)B")?)))
        })
        .deps(["(B*grad)B"]),
    );
}

#[cfg(test)]
mod tests {
    use super::super::testing::{axis_grid, interior_grid, Circular};
    use super::super::dot;
    use flux_math::basis::{Basis, SpectralIndexing, Symmetry};
    use flux_math::grid::Grid;
    use flux_math::transform::Transform;
    use flux_types::constants::MU0;
    use ndarray::Array1;
    use std::f64::consts::PI;

    #[test]
    fn test_residual_components_match_current() {
        let eq = Circular::new(10.0, 1.0, 1.0, 1.0e4);
        let grid = interior_grid();
        let data = eq
            .compute(&grid, &["F", "|F|", "F_theta", "F_beta", "|grad(p)|", "|beta|"], 3)
            .expect("compute");
        let f = data.vector("F").expect("F");
        // covariant components are recovered by projecting on e_i
        let e_theta = data.vector("e_theta").expect("e_theta");
        let e_rho = data.vector("e_rho").expect("e_rho");
        let f_theta = dot(f, e_theta);
        let f_rho = dot(f, e_rho);
        for i in 0..grid.num_nodes() {
            let expected = data.nodal("F_theta").expect("F_theta")[i];
            assert!((f_theta[i] - expected).abs() < 1e-8 * expected.abs().max(1.0));
            let expected = data.nodal("F_rho").expect("F_rho")[i];
            assert!((f_rho[i] - expected).abs() < 1e-8 * expected.abs().max(1.0));
            let p_r = -2.0e4 * grid.rho()[i];
            let grad_p = p_r.abs() / eq.a;
            assert!((data.nodal("|grad(p)|").expect("|grad(p)|")[i] - grad_p).abs() < 1e-8 * grad_p);
        }
        assert!(data.nodal("|beta|").expect("|beta|").iter().all(|v| v.is_finite() && *v > 0.0));
    }

    #[test]
    fn test_pure_toroidal_field_residual() {
        // ι = 0, p = 0: B = B0 φ̂ with B0 = Ψ/(πa²), so J×B = -(B0²/μ0R) R̂
        let eq = Circular::new(10.0, 1.0, 0.0, 0.0);
        let grid = interior_grid();
        let data = eq.compute(&grid, &["|F|", "F_theta", "R", "R_t"], 3).expect("compute");
        let b0 = eq.psi / (std::f64::consts::PI * eq.a * eq.a);
        let r = data.nodal("R").expect("R");
        let r_t = data.nodal("R_t").expect("R_t");
        let f_theta = data.nodal("F_theta").expect("F_theta");
        for (i, f) in data.nodal("|F|").expect("|F|").iter().enumerate() {
            let expected = b0 * b0 / (MU0 * r[i]);
            assert!((f - expected).abs() < 1e-8 * expected, "|F| = {f}, expected {expected}");
            // F_θ = F·e_θ and R̂·e_θ = R_θ
            let expected = -b0 * b0 * r_t[i] / (MU0 * r[i]);
            let tol = 1e-8 * b0 * b0 * eq.a / (MU0 * r[i]);
            assert!((f_theta[i] - expected).abs() < tol, "F_theta = {}, expected {expected}", f_theta[i]);
        }
    }

    #[test]
    fn test_vacuum_field_has_no_force() {
        // Circles R = R0 + r cos θ, Z = -r sin θ with r² = 2R0κρ² − κ²ρ⁴ hold
        // toroidal flux ∝ ρ². With 1 + λ_θ = (R0 − κρ²)/R the field is B_ζ ∇ζ
        // with B_ζ = Ψ/(2πκ), which is curl free.
        let (r0, a) = (10.0f64, 1.0f64);
        let kappa = r0 - (r0 * r0 - a * a).sqrt();
        let mut eq = Circular::new(r0, a, 0.0, 0.0);
        eq.basis = Basis::fourier_zernike(10, 10, 0, 1, Symmetry::None, SpectralIndexing::Ansi);

        let fit_grid = Grid::quadrature(16, 16, 0, 1).expect("grid");
        let tf = Transform::new(&fit_grid, &eq.basis, &[]).expect("transform");
        let n = fit_grid.num_nodes();
        let (mut r, mut z, mut l) = (Array1::zeros(n), Array1::zeros(n), Array1::zeros(n));
        for i in 0..n {
            let (rho, theta) = (fit_grid.rho()[i], fit_grid.theta()[i]);
            let minor = rho * (2.0 * r0 * kappa - kappa * kappa * rho * rho).sqrt();
            r[i] = r0 + minor * theta.cos();
            z[i] = -minor * theta.sin();
            let half = 0.5 * theta;
            l[i] = 2.0 * ((r0 - minor).sqrt() * half.sin()).atan2((r0 + minor).sqrt() * half.cos()) - theta;
        }
        eq.r = tf.fit(&r).expect("fit R");
        eq.z = tf.fit(&z).expect("fit Z");
        eq.l = tf.fit(&l).expect("fit lambda");

        let grid = interior_grid();
        let data = eq
            .compute(&grid, &["|F|", "F_rho", "F_theta", "F_zeta", "|B|", "B_zeta"], 3)
            .expect("compute");
        let b_zeta = eq.psi / (2.0 * PI * kappa);
        for i in 0..grid.num_nodes() {
            let b = data.nodal("|B|").expect("|B|")[i];
            let scale = b * b / (MU0 * a);
            let f = data.nodal("|F|").expect("|F|")[i];
            assert!(f < 1e-5 * scale, "|F| = {f} against B²/μ0a = {scale}");
            for key in ["F_rho", "F_theta", "F_zeta"] {
                let v = data.nodal(key).expect("component")[i];
                assert!(v.abs() < 1e-5 * scale * r0, "{key} = {v}");
            }
            let bz = data.nodal("B_zeta").expect("B_zeta")[i].abs();
            assert!((bz - b_zeta).abs() < 1e-6 * b_zeta, "B_zeta = {bz}, expected {b_zeta}");
        }
    }

    #[test]
    fn test_tension_decomposition() {
        // (B·∇)B = curl(B)×B + ∇|B|²/2, with curl(B)×B = μ0 J×B
        let eq = Circular::new(10.0, 1.0, 0.5, 0.0);
        let grid = interior_grid();
        let data = eq
            .compute(&grid, &["|(B*grad)B|", "((B*grad)B)_theta", "(curl(B)xB)_theta", "F_theta", "|grad(|B|^2)|"], 3)
            .expect("compute");
        let curl_theta = data.nodal("(curl(B)xB)_theta").expect("curl");
        let f_theta = data.nodal("F_theta").expect("F_theta");
        let grad_theta = data.nodal("grad(|B|^2)_theta").expect("grad");
        let tension_theta = data.nodal("((B*grad)B)_theta").expect("tension");
        for i in 0..grid.num_nodes() {
            assert!((curl_theta[i] - MU0 * f_theta[i]).abs() < 1e-12);
            let expected = curl_theta[i] + 0.5 * grad_theta[i];
            assert!((tension_theta[i] - expected).abs() < 1e-9 * expected.abs().max(1e-3));
        }
    }

    #[test]
    fn test_force_finite_on_axis() {
        let eq = Circular::new(10.0, 1.0, 1.0, 1.0e4);
        let grid = axis_grid();
        let data = eq.compute(&grid, &["|F|", "curl(B)xB", "|beta|", "grad(|B|^2)"], 4).expect("compute");
        assert!(data.nodal("|F|").expect("|F|").iter().all(|v| v.is_finite()));
        assert!(data.get("curl(B)xB").expect("curl(B)xB").is_finite());
        assert!(!data.contains("|beta|"));
        assert!(!data.contains("grad(|B|^2)"));
    }
}
