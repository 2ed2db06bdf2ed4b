// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Quasisymmetry Metrics
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Two-term (flux function) and triple-product quasisymmetry errors.
//!
//! I and G, the poloidal and toroidal covariant field on each surface, are
//! taken as weighted surface averages of B_θ and B_ζ.

use flux_math::grid::Grid;
use ndarray::Array1;

use crate::data::Value;
use crate::registry::{Quantity, Registry, Shape};

/// Weighted average of `f` over each flux surface, broadcast back to nodes.
pub fn surface_average(grid: &Grid, f: &Array1<f64>) -> Array1<f64> {
    let surfaces = grid.num_rho();
    let mut num = vec![0.0; surfaces];
    let mut den = vec![0.0; surfaces];
    for (i, &s) in grid.inverse_rho_idx().iter().enumerate() {
        let w = grid.weights()[i];
        num[s] += f[i] * w;
        den[s] += w;
    }
    grid.inverse_rho_idx()
        .iter()
        .map(|&s| num[s] / den[s])
        .collect()
}

pub(crate) fn register(reg: &mut Registry) {
    for (name, component, label) in [
        ("I", "B_theta", "poloidal"),
        ("G", "B_zeta", "toroidal"),
    ] {
        reg.add(
            Quantity::new(
                name,
                Shape::Nodal,
                "T·m",
                format!("surface-averaged {label} covariant field"),
                move |inputs, data| Ok(Value::Nodal(surface_average(inputs.grid, data.nodal(component)?))),
            )
            .deps([component]),
        );
    }

    reg.add(
        Quantity::new(
            "QS_FF",
            Shape::Nodal,
            "T^3",
            "flux-function quasisymmetry error",
            |inputs, data| {
                let (m, n) = inputs.options.helicity;
                let (m, n) = (f64::from(m), f64::from(n));
                let two_term = data.nodal("B0")?
                    * &(data.nodal("B_zeta")? * data.nodal("|B|_t")?
                        - data.nodal("B_theta")? * data.nodal("|B|_z")?);
                let ratio = (data.nodal("G")? * m + data.nodal("I")? * n)
                    / &data.nodal("iota")?.mapv(|iota| m * iota - n);
                Ok(Value::Nodal(two_term - ratio * data.nodal("B*grad(|B|)")?))
            },
        )
        .deps(["B0", "B_zeta", "|B|_t", "B_theta", "|B|_z", "G", "I", "iota", "B*grad(|B|)"]),
    );
    reg.add(
        Quantity::new(
            "QS_TP",
            Shape::Nodal,
            "T^4/m^2",
            "triple-product quasisymmetry error",
            |_, data| {
                let triple = data.nodal("|B|_t")? * data.nodal("(B*grad(|B|))_z")?
                    - data.nodal("|B|_z")? * data.nodal("(B*grad(|B|))_t")?;
                Ok(Value::Nodal(data.nodal("B0")? * &triple))
            },
        )
        .deps(["B0", "|B|_t", "(B*grad(|B|))_z", "|B|_z", "(B*grad(|B|))_t"]),
    );
}

#[cfg(test)]
mod tests {
    use super::super::testing::{interior_grid, Circular};
    use super::*;
    use flux_math::grid::LinearGridOptions;
    use std::f64::consts::PI;

    #[test]
    fn test_surface_average_is_per_surface() {
        let grid = interior_grid();
        let avg = surface_average(&grid, &grid.rho().to_owned());
        for i in 0..grid.num_nodes() {
            assert!((avg[i] - grid.rho()[i]).abs() < 1e-14);
        }
        let cos = grid.theta().mapv(f64::cos);
        let avg = surface_average(&grid, &cos);
        let direct: f64 = cos.iter().zip(grid.weights()).map(|(c, w)| c * w).sum::<f64>()
            / grid.weights().sum();
        assert!((avg.mean().expect("mean") - direct).abs() < 1e-12);
    }

    #[test]
    fn test_axisymmetric_quasisymmetry() {
        let eq = Circular::new(10.0, 1.0, 0.6, 0.0);
        let grid = Grid::linear(LinearGridOptions {
            m: Some(3),
            rho: vec![0.25, 0.5, 0.75, 1.0],
            zeta: vec![0.0, 1.0],
            ..Default::default()
        })
        .expect("grid");
        let data = eq.compute(&grid, &["QS_FF", "QS_TP"], 3).expect("compute");
        let c = eq.psi / (PI * eq.a * eq.a);
        let g = data.nodal("G").expect("G");
        let qs_ff = data.nodal("QS_FF").expect("QS_FF");
        let b0 = data.nodal("B0").expect("B0");
        let b_zeta = data.nodal("B_zeta").expect("B_zeta");
        let mag_t = data.nodal("|B|_t").expect("|B|_t");
        for i in 0..grid.num_nodes() {
            // equispaced θ average cos θ to zero
            assert!((g[i] - c * eq.r0).abs() < 1e-10 * c * eq.r0);
            // helicity (1, 0) reduces the flux-function error to B0 |B|_θ (B_ζ − G)
            let expected = b0[i] * mag_t[i] * (b_zeta[i] - g[i]);
            assert!((qs_ff[i] - expected).abs() < 1e-10 * expected.abs().max(1e-6));
            assert!(data.nodal("QS_TP").expect("QS_TP")[i].abs() < 1e-10);
        }
    }
}
