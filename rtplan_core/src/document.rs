//! # RT Plan Document
//!
//! The translator's output: a statically typed RT Plan with one field per
//! emitted DICOM attribute. Attributes that only exist under some condition
//! are `Option`s (beam dose, wedge entries, first-control-point setup).
//!
//! ## Structure
//!
//! ```text
//! RtPlanDocument
//! ├── file_meta: FileMeta
//! ├── header: PlanHeader (SOP common, patient, study, series, RT general plan)
//! ├── fraction_group: FractionGroup
//! │   └── referenced_beams: Vec<ReferencedBeam>
//! ├── beams: Vec<Beam>
//! │   ├── devices: Vec<BeamLimitingDevice> (ASYMX, ASYMY, MLCX)
//! │   ├── wedges: Vec<Wedge>
//! │   └── control_points: Vec<ControlPoint>
//! ├── patient_setups: Vec<PatientSetup>
//! └── referenced_structure_set: ReferencedStructureSet
//! ```
//!
//! Lengths are millimeters, angles degrees, doses gray.

use serde::{Deserialize, Serialize};

/// A complete RT Plan, ready for the document writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RtPlanDocument {
    pub file_meta: FileMeta,
    pub header: PlanHeader,
    pub fraction_group: FractionGroup,
    pub beams: Vec<Beam>,
    pub patient_setups: Vec<PatientSetup>,
    pub referenced_structure_set: ReferencedStructureSet,
}

impl RtPlanDocument {
    /// SOP instance UID of the plan
    pub fn plan_instance_uid(&self) -> &str {
        &self.header.sop_instance_uid
    }

    /// Find a beam by its beam number
    pub fn beam(&self, number: u32) -> Option<&Beam> {
        self.beams.iter().find(|b| b.number == number)
    }
}

/// File meta information group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMeta {
    pub media_storage_sop_class_uid: String,
    pub media_storage_sop_instance_uid: String,
    pub transfer_syntax_uid: String,
    pub implementation_class_uid: String,
}

/// Plan-level attributes: SOP common, patient, study, series, frame of
/// reference, equipment and RT general plan modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanHeader {
    pub specific_character_set: String,
    /// YYYYMMDD
    pub instance_creation_date: String,
    /// HHMMSS
    pub instance_creation_time: String,
    pub sop_class_uid: String,
    pub sop_instance_uid: String,

    pub study_date: String,
    pub study_time: String,
    pub accession_number: String,
    pub modality: String,
    pub manufacturer: String,
    pub operators_name: String,
    pub manufacturer_model_name: String,
    pub software_versions: String,
    pub physicians_of_record: String,

    pub patient_name: String,
    pub patient_id: String,
    pub patient_birth_date: String,
    pub patient_sex: String,

    pub study_instance_uid: String,
    pub series_instance_uid: String,
    pub study_id: String,
    pub frame_of_reference_uid: String,
    pub position_reference_indicator: String,

    pub rt_plan_label: String,
    pub rt_plan_name: String,
    pub rt_plan_description: String,
    pub rt_plan_date: String,
    pub rt_plan_time: String,
    pub rt_plan_geometry: String,
    pub approval_status: String,
}

/// The (single) fraction group of the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FractionGroup {
    pub number: u32,
    pub number_of_fractions_planned: u32,
    pub number_of_beams: u32,
    pub number_of_brachy_application_setups: u32,
    pub referenced_beams: Vec<ReferencedBeam>,
}

/// Per-beam dose and meterset within the fraction group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencedBeam {
    pub beam_number: u32,
    /// Point the beam dose is specified at (mm)
    pub dose_specification_point: [f64; 3],
    /// Beam dose (Gy); absent when the beam has no normalized dose
    pub beam_dose_gy: Option<f64>,
    /// Monitor units
    pub beam_meterset: f64,
}

/// One treatment beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beam {
    pub number: u32,
    pub name: String,
    pub description: String,
    pub manufacturer: String,
    pub treatment_machine_name: String,
    pub primary_dosimeter_unit: String,
    pub source_axis_distance_mm: f64,
    pub beam_type: String,
    pub radiation_type: RadiationType,
    pub treatment_delivery_type: String,
    pub fluence_mode: String,
    pub referenced_patient_setup_number: u32,
    pub number_of_compensators: u32,
    pub number_of_boli: u32,
    pub number_of_blocks: u32,
    pub wedges: Vec<Wedge>,
    pub devices: Vec<BeamLimitingDevice>,
    pub final_cumulative_meterset_weight: f64,
    pub control_points: Vec<ControlPoint>,
}

impl Beam {
    pub fn number_of_wedges(&self) -> usize {
        self.wedges.len()
    }

    pub fn number_of_control_points(&self) -> usize {
        self.control_points.len()
    }

    /// Device descriptor of the given type
    pub fn device(&self, device_type: DeviceType) -> Option<&BeamLimitingDevice> {
        self.devices.iter().find(|d| d.device_type == device_type)
    }
}

/// Radiation type of a beam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadiationType {
    #[serde(rename = "PHOTON")]
    Photon,
    #[serde(rename = "ELECTRON")]
    Electron,
    /// Modality not recognised; written as an empty value
    #[serde(rename = "")]
    Unknown,
}

impl RadiationType {
    /// Classify a planning-system modality string by substring.
    pub fn from_modality(modality: &str) -> Self {
        if modality.contains("Photons") {
            RadiationType::Photon
        } else if modality.contains("Electrons") {
            RadiationType::Electron
        } else {
            RadiationType::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RadiationType::Photon => "PHOTON",
            RadiationType::Electron => "ELECTRON",
            RadiationType::Unknown => "",
        }
    }
}

/// Beam-limiting device types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    #[serde(rename = "ASYMX")]
    AsymX,
    #[serde(rename = "ASYMY")]
    AsymY,
    #[serde(rename = "MLCX")]
    MlcX,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::AsymX => "ASYMX",
            DeviceType::AsymY => "ASYMY",
            DeviceType::MlcX => "MLCX",
        }
    }
}

/// Static description of one beam-limiting device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamLimitingDevice {
    pub device_type: DeviceType,
    pub source_to_device_distance_mm: f64,
    pub number_of_leaf_jaw_pairs: usize,
    /// Leaf boundaries (mm), MLC only; `number_of_leaf_jaw_pairs + 1` entries
    pub leaf_position_boundaries: Option<Vec<f64>>,
}

/// Wedge declared on a beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wedge {
    pub number: u32,
    pub wedge_type: WedgeType,
    pub id: String,
    pub angle: f64,
    /// Wedge orientation (degrees)
    pub orientation: f64,
}

/// Wedge hardware type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WedgeType {
    #[serde(rename = "STANDARD")]
    Standard,
    #[serde(rename = "DYNAMIC")]
    Dynamic,
}

impl WedgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WedgeType::Standard => "STANDARD",
            WedgeType::Dynamic => "DYNAMIC",
        }
    }
}

/// Rotation direction of gantry, collimator or couch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RotationDirection {
    #[serde(rename = "CW")]
    Clockwise,
    #[serde(rename = "CC")]
    CounterClockwise,
    #[default]
    #[serde(rename = "NONE")]
    None,
}

impl RotationDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationDirection::Clockwise => "CW",
            RotationDirection::CounterClockwise => "CC",
            RotationDirection::None => "NONE",
        }
    }
}

/// One control point of a beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub index: usize,
    /// Weight delivered before this point
    pub cumulative_meterset_weight: f64,
    pub dose_reference: ReferencedDoseReference,
    /// Jaw and leaf positions, in device order ASYMX, ASYMY, MLCX
    pub device_positions: Vec<DevicePosition>,
    pub gantry_angle: f64,
    pub gantry_rotation_direction: RotationDirection,
    pub source_to_surface_distance_mm: f64,
    /// Static beam parameters, declared on the first control point only
    pub setup: Option<ControlPointSetup>,
}

impl ControlPoint {
    /// Positions for the given device type
    pub fn positions(&self, device_type: DeviceType) -> Option<&[f64]> {
        self.device_positions
            .iter()
            .find(|p| p.device_type == device_type)
            .map(|p| p.leaf_jaw_positions.as_slice())
    }
}

/// Referenced dose reference entry of a control point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferencedDoseReference {
    pub referenced_dose_reference_number: u32,
    pub cumulative_dose_reference_coefficient: f64,
}

/// Jaw or leaf positions of one device at one control point (mm).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevicePosition {
    pub device_type: DeviceType,
    pub leaf_jaw_positions: Vec<f64>,
}

/// First-control-point parameters that persist for the whole beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPointSetup {
    pub nominal_beam_energy: f64,
    pub dose_rate_set: f64,
    pub beam_limiting_device_angle: f64,
    pub beam_limiting_device_rotation_direction: RotationDirection,
    pub wedge_position: Option<WedgePosition>,
    pub patient_support_angle: f64,
    pub patient_support_rotation_direction: RotationDirection,
    /// Isocenter (mm)
    pub isocenter_position: [f64; 3],
}

/// Wedge state at a control point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WedgePosition {
    pub referenced_wedge_number: u32,
    /// "IN" or "OUT"
    pub position: String,
}

/// Patient setup entry (one per beam).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSetup {
    pub number: u32,
    pub patient_position: String,
}

/// Reference to the structure set the plan was made on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencedStructureSet {
    pub referenced_sop_class_uid: String,
    pub referenced_sop_instance_uid: String,
}
