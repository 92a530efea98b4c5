//! # Plan Encoding
//!
//! The translation pipeline, leaf to root:
//!
//! - [`wedge`] - wedge descriptor classification
//! - [`geometry`] - beam-limiting device descriptors and MLC leaf boundaries
//! - [`control_point`] - per-point jaw/leaf conversion and meterset weights
//! - [`beam`] - one source beam to one RT Plan beam plus its fraction-group entry
//! - [`plan`] - the whole document
//!
//! Each stage is a pure function of its inputs. Conditions that degrade the
//! export without making it wrong are collected as [`ExportWarning`]s and
//! handed back next to the document; everything that would affect delivered
//! dose is an [`RtPlanError`](crate::errors::RtPlanError).

pub mod beam;
pub mod control_point;
pub mod geometry;
pub mod plan;
pub mod wedge;

#[cfg(test)]
pub(crate) mod fixtures;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::RtPlanDocument;

pub use beam::{encode_beam, EncodedBeam};
pub use plan::{build_plan, build_plan_at};
pub use wedge::{classify_wedge, WedgeClass};

/// Non-fatal condition encountered while encoding a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum ExportWarning {
    /// Wedge name not covered by the classification rules; beam exported without a wedge
    UnclassifiedWedge { beam: String, wedge_name: String },

    /// Named prescription point not found; the isocenter was used instead
    PrescriptionPointFallback { beam: String, point: String },

    /// Control-point weights did not sum to one and were rescaled
    MetersetWeightsNormalized { beam: String, total: f64 },

    /// Beam left out of the document
    BeamSkipped { beam: String, reason: String },

    /// Beams reference prescriptions with different fraction counts
    InconsistentFractionCount { used: u32, found: Vec<u32> },
}

impl fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportWarning::UnclassifiedWedge { beam, wedge_name } => write!(
                f,
                "Beam '{}': wedge '{}' not recognised, exported without wedge",
                beam, wedge_name
            ),
            ExportWarning::PrescriptionPointFallback { beam, point } => write!(
                f,
                "Beam '{}': prescription point '{}' not found, using isocenter",
                beam, point
            ),
            ExportWarning::MetersetWeightsNormalized { beam, total } => write!(
                f,
                "Beam '{}': control point weights summed to {}, normalised to 1",
                beam, total
            ),
            ExportWarning::BeamSkipped { beam, reason } => {
                write!(f, "Beam '{}' skipped: {}", beam, reason)
            }
            ExportWarning::InconsistentFractionCount { used, found } => write!(
                f,
                "Beams disagree on number of fractions {:?}, using {}",
                found, used
            ),
        }
    }
}

/// A finished document together with the warnings raised while building it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanExport {
    pub document: RtPlanDocument,
    pub warnings: Vec<ExportWarning>,
}
