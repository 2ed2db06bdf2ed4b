//! Numerical foundations for SCPN Fusion Core flux-coordinate geometry.
//!
//! Collocation grids, spectral bases, the transforms between them and the
//! dense linear algebra and quadrature they rest on.

pub mod basis;
pub mod grid;
pub mod linalg;
pub mod quadrature;
pub mod special;
pub mod transform;

pub use basis::{Basis, BasisKind, Deriv, SpectralIndexing, Symmetry};
pub use grid::{ConcentricGridOptions, Grid, GridKind, LinearGridOptions, NodePattern, Rotation};
pub use transform::{derivatives_up_to, Transform};
