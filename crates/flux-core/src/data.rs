// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Quantity Data Map
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Write-once map of computed quantities.

use std::collections::HashMap;

use flux_types::error::{FluxError, FluxResult};
use ndarray::{Array1, Array2};

/// A computed quantity: one value per node, one (R, φ, Z) vector per node,
/// a single volume-integrated number, or one row of spectral coefficients per
/// flux surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nodal(Array1<f64>),
    Vector(Array2<f64>),
    Global(f64),
    Spectral(Array2<f64>),
}

impl Value {
    pub fn describe(&self) -> String {
        match self {
            Value::Nodal(a) => format!("nodal[{}]", a.len()),
            Value::Vector(a) => format!("vector[{}x{}]", a.nrows(), a.ncols()),
            Value::Global(_) => "global".to_string(),
            Value::Spectral(a) => format!("spectral[{}x{}]", a.nrows(), a.ncols()),
        }
    }

    /// True when every entry is finite.
    pub fn is_finite(&self) -> bool {
        match self {
            Value::Nodal(a) => a.iter().all(|v| v.is_finite()),
            Value::Vector(a) => a.iter().all(|v| v.is_finite()),
            Value::Global(v) => v.is_finite(),
            Value::Spectral(a) => a.iter().all(|v| v.is_finite()),
        }
    }
}

/// Quantity name → value. Keys are never overwritten within one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct DataMap {
    values: HashMap<String, Value>,
}

impl DataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> FluxResult<()> {
        let key = key.into();
        if self.values.contains_key(&key) {
            return Err(FluxError::DuplicateQuantity(key));
        }
        self.values.insert(key, value);
        Ok(())
    }

    fn require(&self, key: &str) -> FluxResult<&Value> {
        self.values
            .get(key)
            .ok_or_else(|| FluxError::MissingQuantity(key.to_string()))
    }

    pub fn nodal(&self, key: &str) -> FluxResult<&Array1<f64>> {
        match self.require(key)? {
            Value::Nodal(a) => Ok(a),
            other => Err(FluxError::ShapeMismatch {
                name: key.to_string(),
                expected: "nodal".to_string(),
                found: other.describe(),
            }),
        }
    }

    pub fn vector(&self, key: &str) -> FluxResult<&Array2<f64>> {
        match self.require(key)? {
            Value::Vector(a) => Ok(a),
            other => Err(FluxError::ShapeMismatch {
                name: key.to_string(),
                expected: "vector".to_string(),
                found: other.describe(),
            }),
        }
    }

    /// Surface-by-mode coefficient table.
    pub fn spectral(&self, key: &str) -> FluxResult<&Array2<f64>> {
        match self.require(key)? {
            Value::Spectral(a) => Ok(a),
            other => Err(FluxError::ShapeMismatch {
                name: key.to_string(),
                expected: "spectral".to_string(),
                found: other.describe(),
            }),
        }
    }

    pub fn global(&self, key: &str) -> FluxResult<f64> {
        match self.require(key)? {
            Value::Global(v) => Ok(*v),
            other => Err(FluxError::ShapeMismatch {
                name: key.to_string(),
                expected: "global".to_string(),
                found: other.describe(),
            }),
        }
    }
}
