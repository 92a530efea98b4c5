//! # Source Plan
//!
//! The planning-system side of the translation: patient, plan and trial
//! metadata, beams with their control points, and machine calibration.
//! These types are read-only inputs; the translator never mutates them.
//!
//! Positions of reference points and the isocenter are expected in patient
//! coordinates (mm) already. Jaw, leaf and SSD values stay in the planning
//! system's native centimeters and are converted during encoding.
//!
//! ## Structure
//!
//! ```text
//! SourcePlan
//! ├── patient: PatientInfo
//! ├── plan: PlanInfo
//! ├── trial: Trial
//! │   ├── beams: Vec<SourceBeam>
//! │   │   └── control_point_manager: ControlPointManager
//! │   │       └── control_points: Vec<SourceControlPoint>
//! │   └── prescriptions: Vec<Prescription>
//! ├── primary_image: Option<PrimaryImage>
//! ├── machines: Vec<MachineCalibration>
//! └── points, isocenter, structure set / plan UIDs, patient position
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{RtPlanError, RtPlanResult};
use crate::machine::MachineCalibration;

/// Root of the planning-system input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcePlan {
    pub patient: PatientInfo,

    pub plan: PlanInfo,

    pub trial: Trial,

    /// Primary image set the plan was created on. Required for export.
    #[serde(default)]
    pub primary_image: Option<PrimaryImage>,

    /// Calibration data for every machine the trial may reference
    #[serde(default)]
    pub machines: Vec<MachineCalibration>,

    /// Named reference points (prescription points etc.)
    #[serde(default)]
    pub points: Vec<ReferencePoint>,

    /// Isocenter in patient coordinates (mm)
    pub isocenter: [f64; 3],

    /// SOP instance UID of the RT Structure Set exported with this plan
    pub structure_set_uid: String,

    /// SOP instance UID for the plan. Generated when absent.
    #[serde(default)]
    pub plan_instance_uid: Option<String>,

    /// DICOM patient position code (e.g., "HFS")
    pub patient_position: String,
}

/// Patient demographics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientInfo {
    /// Name in DICOM person-name form (e.g., "DOE^JANE")
    pub full_name: String,
    pub medical_record_number: String,
    /// Birth date as YYYYMMDD
    pub date_of_birth: String,
    pub gender: String,
    pub radiation_oncologist: String,
    pub comment: String,
}

impl PatientInfo {
    /// DICOM patient sex code: first letter of the recorded gender.
    pub fn sex_code(&self) -> String {
        self.gender
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase().to_string())
            .unwrap_or_default()
    }
}

/// Plan-level metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanInfo {
    pub plan_name: String,
    /// Planning tool that produced the plan (manufacturer model name)
    pub tool_type: String,
    /// Planning system version string (software versions)
    pub version_description: String,
    /// Last write timestamp, "YYYY-MM-DD HH:MM:SS"
    pub write_timestamp: String,
}

/// The trial: the set of beams being exported plus their prescriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trial {
    #[serde(default)]
    pub name: String,

    /// Last write timestamp of the trial; preferred over the plan's
    #[serde(default)]
    pub write_timestamp: Option<String>,

    #[serde(default)]
    pub beams: Vec<SourceBeam>,

    #[serde(default)]
    pub prescriptions: Vec<Prescription>,
}

impl Trial {
    /// Find a prescription by name.
    pub fn prescription(&self, name: &str) -> Option<&Prescription> {
        self.prescriptions.iter().find(|p| p.name == name)
    }
}

/// A named prescription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub name: String,
    pub number_of_fractions: u32,
}

/// Primary image identifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrimaryImage {
    pub study_instance_uid: String,
    pub frame_of_reference_uid: String,
    pub study_id: String,
}

/// A named point in patient coordinates (mm).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    pub name: String,
    pub position: [f64; 3],
}

/// One beam of the trial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceBeam {
    /// Beam name (written as the beam description)
    pub name: String,

    /// Field id (written as the beam name)
    pub field_id: String,

    /// Modality string, e.g. "Photons" or "Electrons"
    pub modality: String,

    /// Beam type, e.g. "Static", "Step & Shoot MLC", "Dynamic Arc"
    pub set_beam_type: String,

    /// Machine reference, "<name>: <version>"
    pub machine_name_and_version: String,

    /// Energy name, e.g. "6 MV"
    pub machine_energy_name: String,

    pub prescription_name: String,

    /// Name of the point the beam dose is specified at
    #[serde(default)]
    pub prescription_point_name: String,

    /// Dose rate (MU/min); not every beam carries one
    #[serde(default)]
    pub dose_rate: Option<f64>,

    /// Source to surface distance
    pub ssd_cm: f64,

    pub control_point_manager: ControlPointManager,

    pub monitor_unit_info: MonitorUnitInfo,
}

impl SourceBeam {
    /// Number of control points recorded for this beam
    pub fn control_point_count(&self) -> usize {
        self.control_point_manager.control_points.len()
    }
}

/// Holder for a beam's control points and gantry rotation flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlPointManager {
    /// Clockwise rotation flag; only the value 1 means "set"
    #[serde(default)]
    pub gantry_is_cw: Option<i32>,

    /// Counter-clockwise rotation flag; only the value 1 means "set"
    #[serde(default)]
    pub gantry_is_ccw: Option<i32>,

    #[serde(default)]
    pub control_points: Vec<SourceControlPoint>,
}

/// One delivery sample of a beam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceControlPoint {
    pub left_jaw_position_cm: f64,
    pub right_jaw_position_cm: f64,
    pub top_jaw_position_cm: f64,
    pub bottom_jaw_position_cm: f64,

    /// Leaf positions as stored by the planning system: a comma separated
    /// list alternating between the two leaf banks, in cm
    pub mlc_leaf_positions: String,

    pub gantry: f64,
    pub collimator: f64,
    pub couch: f64,

    #[serde(default)]
    pub wedge: WedgeContext,

    /// Fraction of the beam's monitor units delivered by this point
    pub weight: f64,
}

impl SourceControlPoint {
    /// Parse the raw leaf-position list into numbers (cm).
    pub fn leaf_values(&self) -> RtPlanResult<Vec<f64>> {
        parse_leaf_values(&self.mlc_leaf_positions)
    }
}

/// Parse a comma-separated leaf-position list. Blank input yields no values.
pub fn parse_leaf_values(raw: &str) -> RtPlanResult<Vec<f64>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',')
        .map(|p| {
            let p = p.trim();
            p.parse::<f64>().map_err(|e| {
                RtPlanError::invalid_input("mlc_leaf_positions", p, format!("Not a number: {}", e))
            })
        })
        .collect()
}

/// Wedge as recorded on a control point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WedgeContext {
    pub wedge_name: String,
    /// Orientation keyword, e.g. "WedgeBottomToTop"
    pub orientation: String,
    /// Wedge angle in degrees
    pub angle: f64,
}

/// Monitor-unit normalisation data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorUnitInfo {
    /// Prescribed dose per fraction to the beam's point (cGy)
    pub prescription_dose: f64,
    /// Dose per MU at the prescription point, normalised (cGy/MU relative)
    pub normalized_dose: f64,
}
