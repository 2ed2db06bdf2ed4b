// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use std::f64::consts::PI;

/// Vacuum permeability (H/m), the pre-2019 exact value 4π·1e-7.
pub const MU0: f64 = 4.0 * PI * 1e-7;

/// μ0 / 4π, the Biot-Savart prefactor (T·m/A).
pub const MU0_OVER_4PI: f64 = 1e-7;

pub const TWO_PI: f64 = 2.0 * PI;

/// Total (θ, ζ, ρ) computational volume of one field period: 2π · 2π · 1.
pub const FOUR_PI_SQ: f64 = 4.0 * PI * PI;
