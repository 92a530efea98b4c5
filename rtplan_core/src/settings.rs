//! # Export Settings
//!
//! Site-level knobs for the exporter. Every field has a default, so a
//! settings file only needs to list what it overrides:
//!
//! ```json
//! { "manufacturer": "ACME Planning", "meterset_weight_policy": "Reject" }
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MANUFACTURER;

/// Exporter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Manufacturer written at plan and beam level
    pub manufacturer: String,

    /// Source-axis distance written on every beam (mm)
    pub source_axis_distance_mm: f64,

    /// Plan approval status (e.g., "UNAPPROVED")
    pub approval_status: String,

    /// Allowed deviation of a beam's summed control-point weights from 1
    pub meterset_weight_tolerance: f64,

    /// What to do when the weights fall outside the tolerance
    pub meterset_weight_policy: WeightPolicy,
}

impl Default for ExportSettings {
    fn default() -> Self {
        ExportSettings {
            manufacturer: DEFAULT_MANUFACTURER.to_string(),
            source_axis_distance_mm: 1000.0,
            approval_status: "UNAPPROVED".to_string(),
            meterset_weight_tolerance: 1e-3,
            meterset_weight_policy: WeightPolicy::default(),
        }
    }
}

/// Handling of control-point weights that do not sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeightPolicy {
    /// Rescale the weights so they sum to one
    #[default]
    Normalize,
    /// Fail the translation
    Reject,
}
