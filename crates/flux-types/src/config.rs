// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};

use crate::error::{FluxError, FluxResult};

/// Input description of a spectral equilibrium.
///
/// Key names follow the conventional capitalisation (`Psi`, `NFP`, `L`, `M`, `N`)
/// so that existing JSON inputs load without renaming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquilibriumConfig {
    /// Total toroidal flux through the last closed surface (Wb).
    #[serde(rename = "Psi")]
    pub psi: f64,
    #[serde(rename = "NFP", default = "default_nfp")]
    pub nfp: usize,
    #[serde(rename = "L")]
    pub l: usize,
    #[serde(rename = "M")]
    pub m: usize,
    #[serde(rename = "N")]
    pub n: usize,
    /// Rows of `[l, p_l, i_l]`: power-series coefficients of pressure and iota.
    pub profiles: Vec<[f64; 3]>,
    /// Rows of `[l, m, n, Rb, Zb]`.
    pub boundary: Vec<[f64; 5]>,
    #[serde(default)]
    pub sym: bool,
    /// `"ansi"` or `"fringe"`.
    #[serde(default = "default_spectral_indexing")]
    pub spectral_indexing: String,
    /// `"lcfs"` (boundary given on the last closed flux surface) or
    /// `"poincare"` (boundary given on the ζ=0 cross section).
    #[serde(default = "default_bdry_mode")]
    pub bdry_mode: String,
    /// Rows of `[n, R0_n, Z0_n]` for the magnetic axis initial guess.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<Vec<[f64; 3]>>,
    /// Full state vector `[R_lmn, Z_lmn, L_lmn]`; overrides the per-part vectors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<f64>>,
    #[serde(rename = "R_lmn", default, skip_serializing_if = "Option::is_none")]
    pub r_lmn: Option<Vec<f64>>,
    #[serde(rename = "Z_lmn", default, skip_serializing_if = "Option::is_none")]
    pub z_lmn: Option<Vec<f64>>,
    #[serde(rename = "L_lmn", default, skip_serializing_if = "Option::is_none")]
    pub l_lmn: Option<Vec<f64>>,
}

fn default_nfp() -> usize {
    1
}
fn default_spectral_indexing() -> String {
    "fringe".to_string()
}
fn default_bdry_mode() -> String {
    "lcfs".to_string()
}

impl EquilibriumConfig {
    /// Load from a JSON file.
    pub fn from_file(path: &str) -> FluxResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> FluxResult<Self> {
        let config: Self = serde_json::from_str(contents)?;
        Ok(config)
    }

    /// Circular, axisymmetric test case: `R = R0 + a ρ cos θ`, `Z = -a ρ sin θ`,
    /// zero pressure and constant rotational transform.
    pub fn circular_tokamak(psi: f64, major_radius: f64, minor_radius: f64, iota: f64) -> Self {
        EquilibriumConfig {
            psi,
            nfp: 1,
            l: 4,
            m: 4,
            n: 4,
            profiles: vec![[0.0, 0.0, iota]],
            boundary: vec![
                [0.0, 0.0, 0.0, major_radius, 0.0],
                [0.0, 1.0, 0.0, minor_radius, 0.0],
                [0.0, -1.0, 0.0, 0.0, -minor_radius],
            ],
            sym: false,
            spectral_indexing: default_spectral_indexing(),
            bdry_mode: default_bdry_mode(),
            axis: None,
            x: None,
            r_lmn: None,
            z_lmn: None,
            l_lmn: None,
        }
    }
}

/// Caller-selected parameters of the compute pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComputeOptions {
    /// Quasisymmetry helicity (M, N): (1, 0) quasi-axisymmetry, (1, ±NFP) helical.
    #[serde(default = "default_helicity")]
    pub helicity: (i32, i32),
    /// Adiabatic index of the MHD potential energy.
    #[serde(default)]
    pub gamma: f64,
    /// Poloidal resolution of the Boozer spectrum `|B|_mn` and of the fits behind `nu`.
    #[serde(default = "default_boozer_resolution")]
    pub boozer_m: usize,
    /// Toroidal resolution of the Boozer spectrum.
    #[serde(default = "default_boozer_resolution")]
    pub boozer_n: usize,
}

fn default_boozer_resolution() -> usize {
    4
}

fn default_helicity() -> (i32, i32) {
    (1, 0)
}

impl Default for ComputeOptions {
    fn default() -> Self {
        ComputeOptions {
            helicity: default_helicity(),
            gamma: 0.0,
            boozer_m: default_boozer_resolution(),
            boozer_n: default_boozer_resolution(),
        }
    }
}

impl ComputeOptions {
    pub fn validate(&self) -> FluxResult<()> {
        if self.helicity == (0, 0) {
            return Err(FluxError::ConfigError(
                "helicity (0, 0) does not select a symmetry direction".to_string(),
            ));
        }
        if (self.gamma - 1.0).abs() < f64::EPSILON {
            return Err(FluxError::ConfigError(
                "gamma = 1 makes the pressure energy W_p undefined".to_string(),
            ));
        }
        if !self.gamma.is_finite() {
            return Err(FluxError::ConfigError(format!(
                "gamma must be finite, got {}",
                self.gamma
            )));
        }
        Ok(())
    }
}
