//! Flux-coordinate equilibrium geometry and MHD physics quantities.
//!
//! A spectral equilibrium (R, Z, λ and profile coefficients) is evaluated on a
//! collocation grid through a registry of named quantities. Requests are
//! planned against the available transform derivatives, evaluated in
//! dependency order and patched with finite limits on the magnetic axis.

pub(crate) mod axis;
pub mod compute;
pub mod data;
pub mod equilibrium;
pub mod nested;
pub mod plan;
pub mod registry;

pub use compute::{compute, ComputeInputs, Spectral};
pub use data::{DataMap, Value};
pub use equilibrium::{BoundaryMode, Equilibrium};
pub use nested::NestingCheck;
pub use plan::{check_derivs, required_derivatives, Availability, Plan};
pub use registry::{registry, Quantity, Registry, Shape, Source};
