//! MHD potential energy W = ∫ (|B|²/2μ0 + p/(γ−1)) dV as grid quadratures.

use flux_types::constants::MU0;
use flux_types::error::FluxResult;
use ndarray::Array1;

use super::ComputeInputs;
use crate::data::{DataMap, Value};
use crate::registry::{Quantity, Registry, Shape};

/// Σ f |√g| w over the grid.
fn volume_integral(inputs: &ComputeInputs<'_>, data: &DataMap, integrand: &Array1<f64>) -> FluxResult<f64> {
    let sqrt_g = data.nodal("sqrt(g)")?;
    Ok(integrand
        .iter()
        .zip(sqrt_g.iter())
        .zip(inputs.grid.weights().iter())
        .map(|((f, g), w)| f * g.abs() * w)
        .sum())
}

pub(crate) fn register(reg: &mut Registry) {
    reg.add(
        Quantity::new("W_B", Shape::Global, "J", "magnetic energy", |inputs, data| {
            let b2 = data.nodal("|B|")?.mapv(|b| b * b);
            Ok(Value::Global(volume_integral(inputs, data, &b2)? / (2.0 * MU0)))
        })
        .deps(["|B|", "sqrt(g)"]),
    );
    reg.add(
        Quantity::new("W_p", Shape::Global, "J", "pressure energy", |inputs, data| {
            Ok(Value::Global(
                volume_integral(inputs, data, data.nodal("p")?)? / (inputs.options.gamma - 1.0),
            ))
        })
        .deps(["p", "sqrt(g)"]),
    );
    reg.add(
        Quantity::new("W", Shape::Global, "J", "total MHD energy", |_, data| {
            Ok(Value::Global(data.global("W_B")? + data.global("W_p")?))
        })
        .deps(["W_B", "W_p"]),
    );
}

#[cfg(test)]
mod tests {
    use super::super::testing::Circular;
    use flux_math::grid::Grid;
    use std::f64::consts::PI;

    #[test]
    fn test_energy_terms() {
        let (r0, a, p0) = (6.0, 1.5, 3.0e3);
        let eq = Circular::new(r0, a, 1.0, p0);
        let grid = Grid::quadrature(4, 4, 0, 1).expect("grid");
        let data = eq.compute(&grid, &["W"], 1).expect("compute");
        let w_b = data.global("W_B").expect("W_B");
        let w_p = data.global("W_p").expect("W_p");
        assert!(w_b > 0.0);
        // γ = 0: W_p = −∫p dV = −π² p0 a² R0
        let expected = -PI * PI * p0 * a * a * r0;
        assert!((w_p - expected).abs() < 1e-9 * expected.abs(), "{w_p} vs {expected}");
        assert!((data.global("W").expect("W") - (w_b + w_p)).abs() < 1e-9 * w_b);
    }
}
