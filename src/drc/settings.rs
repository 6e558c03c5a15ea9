//! DRC settings
//!
//! All precision-related values live here and are handed to the checks
//! explicitly; the geometry core itself is unit-agnostic.

use serde::{Deserialize, Serialize};

use super::error::{DrcError, Result};
use crate::geometry::Coord;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrcSettings {
    /// Minimum copper to copper clearance, in board units
    pub min_copper_clearance: Coord,
    /// Subtracted from every clearance to avoid false positives from
    /// rounding, in board units
    pub clearance_tolerance: Coord,
    pub check_copper_clearance: bool,
    pub check_missing_connections: bool,
    /// Worker threads for one run; 0 means available parallelism
    pub thread_count: usize,
    /// Board units per millimeter, used for message text only
    pub units_per_mm: Coord,
}

impl Default for DrcSettings {
    fn default() -> Self {
        Self {
            min_copper_clearance: 200_000, // 0.2mm
            clearance_tolerance: 1,
            check_copper_clearance: true,
            check_missing_connections: true,
            thread_count: 0,
            units_per_mm: 1_000_000,
        }
    }
}

impl DrcSettings {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|source| DrcError::Parse { what: "DRC settings", source })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(DrcError::InvalidSettings { reason });
        if self.min_copper_clearance < 0 {
            return invalid(format!("negative copper clearance {}", self.min_copper_clearance));
        }
        if self.clearance_tolerance < 0 {
            return invalid(format!("negative clearance tolerance {}", self.clearance_tolerance));
        }
        if self.units_per_mm <= 0 {
            return invalid(format!("units per mm must be positive, got {}", self.units_per_mm));
        }
        Ok(())
    }

    /// Clearance actually enforced for a required clearance
    pub fn effective_clearance(&self, required: Coord) -> Coord {
        (required - self.clearance_tolerance).max(0)
    }

    /// Format a length in millimeters, e.g. "0.2"
    pub fn to_mm_string(&self, value: Coord) -> String {
        let mm = value as f64 / self.units_per_mm as f64;
        let text = format!("{:.6}", mm);
        let text = text.trim_end_matches('0').trim_end_matches('.');
        if text.is_empty() || text == "-" { "0".to_string() } else { text.to_string() }
    }
}
