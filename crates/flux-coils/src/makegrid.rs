// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — MAKEGRID Coil Files
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Plain-text MAKEGRID coil format.
//!
//! ```text
//! periods 1
//! begin filament
//! mirror NIL
//! x y z current        (one line per filament point)
//! x0 y0 z0 0 1 Modular (first point repeated, closes the coil)
//! ...
//! end
//! ```

use std::fs;
use std::path::Path;

use flux_types::error::{FluxError, FluxResult};

use crate::coil::{Coil, CoilSet};
use crate::coords::CoordBasis;
use crate::curve::XyzCurve;

/// Coil group written on every closing line.
const GROUP: usize = 1;

impl CoilSet {
    /// MAKEGRID text of the set; each coil is discretized at its own grid.
    pub fn to_makegrid_string(&self) -> FluxResult<String> {
        let mut out = String::from("periods 1\nbegin filament\nmirror NIL\n");
        for coil in self {
            let pts = coil.compute_coordinates(None, CoordBasis::Xyz)?;
            if pts.nrows() == 0 {
                continue;
            }
            for row in pts.rows() {
                out.push_str(&format!(
                    "{:.22e} {:.22e} {:.22e} {:.22e}\n",
                    row[0],
                    row[1],
                    row[2],
                    coil.current()
                ));
            }
            out.push_str(&format!(
                "{:.22e} {:.22e} {:.22e} {:.22e} {GROUP} Modular\n",
                pts[[0, 0]],
                pts[[0, 1]],
                pts[[0, 2]],
                0.0
            ));
        }
        out.push_str("end\n");
        Ok(out)
    }

    pub fn save_in_makegrid_format(&self, path: impl AsRef<Path>) -> FluxResult<()> {
        let text = self.to_makegrid_string()?;
        fs::write(path.as_ref(), text)?;
        log::info!(
            "saved {} coils in MAKEGRID format to {}",
            self.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Coil set of point curves; `grid` sets the discretization of every coil.
    pub fn from_makegrid_str(text: &str, grid: Option<usize>) -> FluxResult<Self> {
        let mut coils = Vec::new();
        let mut in_body = false;
        let mut points: Vec<[f64; 4]> = Vec::new();
        let mut start_line = 0;

        for (i, raw) in text.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if !in_body {
                if line.starts_with("mirror") {
                    in_body = true;
                }
                continue;
            }
            if line == "end" {
                break;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return Err(FluxError::Parse {
                    line: line_no,
                    message: format!("expected 'x y z current', got '{line}'"),
                });
            }
            let mut row = [0.0; 4];
            for (k, field) in fields.iter().take(4).enumerate() {
                row[k] = field.parse().map_err(|_| FluxError::Parse {
                    line: line_no,
                    message: format!("'{field}' is not a number"),
                })?;
            }
            if points.is_empty() {
                start_line = line_no;
            }
            if line.contains("Modular") || fields.len() > 4 {
                if points.is_empty() {
                    return Err(FluxError::Parse {
                        line: line_no,
                        message: "coil closed before any point".to_string(),
                    });
                }
                let x: Vec<f64> = points.iter().map(|p| p[0]).collect();
                let y: Vec<f64> = points.iter().map(|p| p[1]).collect();
                let z: Vec<f64> = points.iter().map(|p| p[2]).collect();
                let curve = XyzCurve::new(&x, &y, &z).map_err(|e| FluxError::Parse {
                    line: start_line,
                    message: e.to_string(),
                })?;
                let mut coil = Coil::new(curve, points[0][3]);
                coil.set_grid(grid);
                coils.push(coil);
                points.clear();
            } else {
                points.push(row);
            }
        }

        if !in_body {
            return Err(FluxError::Parse {
                line: 0,
                message: "missing 'mirror' header line".to_string(),
            });
        }
        if !points.is_empty() {
            return Err(FluxError::Parse {
                line: start_line,
                message: "coil is not closed by a 'Modular' line".to_string(),
            });
        }
        log::debug!("read {} coils from MAKEGRID text", coils.len());
        Ok(CoilSet::new(coils))
    }

    pub fn from_makegrid_file(path: impl AsRef<Path>, grid: Option<usize>) -> FluxResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_makegrid_str(&text, grid)
    }
}
