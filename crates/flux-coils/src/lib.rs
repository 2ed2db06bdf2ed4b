//! Filamentary coils and their vacuum magnetic field.
//!
//! Coils are closed space curves carrying a current. Fields come from the
//! exact straight-segment Biot-Savart law over the discretized filament;
//! coil sets superpose their members and read and write MAKEGRID coil files.

pub mod biot_savart;
pub mod coil;
pub mod coords;
pub mod curve;
pub mod makegrid;

pub use biot_savart::biot_savart;
pub use coil::{Coil, CoilSet, FieldParams, MagneticField};
pub use coords::CoordBasis;
pub use curve::{Curve, Frame, FourierPlanarCurve, FourierRzCurve, FourierXyzCurve, FrenetFrame, XyzCurve};
