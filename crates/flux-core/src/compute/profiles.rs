//! Flux, pressure and rotational transform profiles.
//!
//! ψ = Ψ ρ² / 2π is analytic; p(ρ) and ι(ρ) come from power-series transforms.

use flux_math::basis::Deriv;
use ndarray::{Array1, ArrayView1};

use super::ComputeInputs;
use crate::data::Value;
use crate::registry::{key, Quantity, Registry, Shape, Source};

/// ∂^d of ψ_ρ = Ψρ/π at the given radii.
pub(crate) fn psi_r_derivative(psi: f64, rho: ArrayView1<'_, f64>, d: Deriv) -> Array1<f64> {
    match d {
        [0, 0, 0] => rho.mapv(|r| psi * r / std::f64::consts::PI),
        [1, 0, 0] => Array1::from_elem(rho.len(), psi / std::f64::consts::PI),
        _ => Array1::zeros(rho.len()),
    }
}

fn flux(inputs: &ComputeInputs<'_>, order: u8) -> Value {
    let rho = inputs.grid.rho();
    let two_pi = 2.0 * std::f64::consts::PI;
    let psi = inputs.psi;
    Value::Nodal(match order {
        0 => rho.mapv(|r| psi * r * r / two_pi),
        1 => rho.mapv(|r| 2.0 * psi * r / two_pi),
        _ => Array1::from_elem(rho.len(), 2.0 * psi / two_pi),
    })
}

pub(crate) fn register(reg: &mut Registry) {
    for (order, name) in ["psi", "psi_r", "psi_rr"].into_iter().enumerate() {
        reg.add(Quantity::new(
            name,
            Shape::Nodal,
            "Wb",
            format!("toroidal flux, radial derivative {order}"),
            move |inputs, _| Ok(flux(inputs, order as u8)),
        ));
    }

    for (source, base, units, label, max) in [
        (Source::Pressure, "p", "Pa", "pressure", 1u8),
        (Source::Iota, "iota", "~", "rotational transform", 2u8),
    ] {
        for k in 0..=max {
            let d = [k, 0, 0];
            reg.add(
                Quantity::new(
                    key(base, d),
                    Shape::Nodal,
                    units,
                    format!("{label}, radial derivative {k}"),
                    move |inputs, _| Ok(Value::Nodal(inputs.spectral(source)?.eval(d)?)),
                )
                .source(source, d),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{interior_grid, Circular};

    #[test]
    fn test_profiles_on_grid() {
        let eq = Circular::new(10.0, 1.0, 0.8, 2.0e3);
        let grid = interior_grid();
        let data = eq
            .compute(&grid, &["psi_r", "p", "p_r", "iota", "iota_rr"], 1)
            .expect("compute");
        let rho = grid.rho();
        let p = data.nodal("p").expect("p");
        let p_r = data.nodal("p_r").expect("p_r");
        for i in 0..grid.num_nodes() {
            let r = rho[i];
            assert!((p[i] - 2.0e3 * (1.0 - r * r)).abs() < 1e-9);
            assert!((p_r[i] + 4.0e3 * r).abs() < 1e-9);
            assert!((data.nodal("iota").expect("iota")[i] - 0.8).abs() < 1e-14);
            assert!(data.nodal("iota_rr").expect("iota_rr")[i].abs() < 1e-14);
            let psi_r = data.nodal("psi_r").expect("psi_r")[i];
            assert!((psi_r - r / std::f64::consts::PI).abs() < 1e-14);
        }
    }
}
