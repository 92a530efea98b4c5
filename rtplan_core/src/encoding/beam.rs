//! # Beam Encoding
//!
//! Encodes one source beam: resolves machine, energy calibration and
//! prescription, computes monitor units and beam dose, builds the device
//! descriptors, classifies the wedge and encodes every control point.
//!
//! ## Monitor Units
//!
//! ```text
//! MU        = prescription_dose / (normalized_dose × dose_per_mu_at_calibration)
//! beam dose = prescription_dose / 100   (cGy → Gy)
//! ```
//!
//! A beam whose normalized dose is zero gets 0 MU and no beam dose.
//!
//! ## Example
//!
//! ```rust
//! use rtplan_core::encoding::beam::monitor_units;
//! use rtplan_core::source::MonitorUnitInfo;
//!
//! let info = MonitorUnitInfo { prescription_dose: 200.0, normalized_dose: 100.0 };
//! let (mu, dose_gy) = monitor_units(&info, 1.0);
//! assert_eq!(mu, 2.0);
//! assert_eq!(dose_gy, Some(2.0));
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::WEDGE_NUMBER;
use crate::document::{Beam, RadiationType, ReferencedBeam, RotationDirection, Wedge};
use crate::errors::{RtPlanError, RtPlanResult};
use crate::machine::{find_machine, split_machine_reference, treatment_machine_name};
use crate::settings::ExportSettings;
use crate::source::{ControlPointManager, MonitorUnitInfo, SourceBeam, SourcePlan};
use crate::units::{cm_to_mm, CentiGray, Gray};

use super::control_point::{accumulate_weights, check_weights, encode_control_point, BeamContext};
use super::geometry::build_devices;
use super::wedge::{classify_wedge, WedgeClass};
use super::ExportWarning;

/// Primary dosimeter unit of every exported beam
const PRIMARY_DOSIMETER_UNIT: &str = "MU";
const TREATMENT_DELIVERY_TYPE: &str = "TREATMENT";
const FLUENCE_MODE: &str = "STANDARD";

/// Result of encoding one beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedBeam {
    pub beam: Beam,
    /// Fraction-group entry for the beam
    pub referenced_beam: ReferencedBeam,
    /// Fractions of the prescription the beam belongs to
    pub number_of_fractions: u32,
    pub warnings: Vec<ExportWarning>,
}

/// Encode `source_beam` as beam `number` of the plan.
pub fn encode_beam(
    plan: &SourcePlan,
    source_beam: &SourceBeam,
    number: u32,
    settings: &ExportSettings,
) -> RtPlanResult<EncodedBeam> {
    let beam_name = source_beam.name.as_str();
    let source_points = &source_beam.control_point_manager.control_points;
    if source_points.is_empty() {
        return Err(RtPlanError::no_control_points(beam_name));
    }

    info!(
        beam = beam_name,
        number,
        control_points = source_points.len(),
        "Encoding beam"
    );
    if source_beam.set_beam_type.to_lowercase().contains("step") {
        debug!(
            beam = beam_name,
            beam_type = %source_beam.set_beam_type,
            "Step-and-shoot beam encoded with one control point per source point"
        );
    }

    let mut warnings = Vec::new();

    // Machine, calibration and prescription
    let (machine_name, machine_version) =
        split_machine_reference(&source_beam.machine_name_and_version);
    let machine = find_machine(&plan.machines, machine_name, machine_version)?;
    let dose_per_mu = machine.dose_per_mu(&source_beam.machine_energy_name)?;
    let prescription = plan
        .trial
        .prescription(&source_beam.prescription_name)
        .ok_or_else(|| RtPlanError::UnresolvedPrescription {
            beam: beam_name.to_string(),
            prescription: source_beam.prescription_name.clone(),
        })?;

    let (beam_meterset, beam_dose_gy) = monitor_units(&source_beam.monitor_unit_info, dose_per_mu);
    debug!(beam = beam_name, dose_per_mu, beam_meterset, "Monitor units computed");

    let dose_specification_point = match plan
        .points
        .iter()
        .find(|p| p.name == source_beam.prescription_point_name)
    {
        Some(point) => point.position,
        None => {
            debug!(
                beam = beam_name,
                point = %source_beam.prescription_point_name,
                "Prescription point not found, using isocenter"
            );
            warnings.push(ExportWarning::PrescriptionPointFallback {
                beam: beam_name.to_string(),
                point: source_beam.prescription_point_name.clone(),
            });
            plan.isocenter
        }
    };

    // Leaf values must agree across the beam and with the machine
    let leaf_values = source_points
        .iter()
        .map(|cp| cp.leaf_values())
        .collect::<RtPlanResult<Vec<_>>>()?;
    let raw_leaf_count = leaf_values[0].len();
    if let Some(bad) = leaf_values.iter().find(|v| v.len() != raw_leaf_count) {
        return Err(RtPlanError::LeafCountMismatch {
            beam: beam_name.to_string(),
            expected: raw_leaf_count,
            found: bad.len(),
        });
    }
    let devices = build_devices(machine, beam_name, raw_leaf_count)?;

    let wedge_class = classify_wedge(&source_points[0].wedge);
    if let WedgeClass::Unclassified { name } = &wedge_class {
        warn!(beam = beam_name, wedge = %name, "Unrecognised wedge, exporting without wedge");
        warnings.push(ExportWarning::UnclassifiedWedge {
            beam: beam_name.to_string(),
            wedge_name: name.clone(),
        });
    }
    let wedges: Vec<Wedge> = wedge_class
        .spec()
        .map(|spec| Wedge {
            number: WEDGE_NUMBER,
            wedge_type: spec.wedge_type,
            id: spec.id.clone(),
            angle: spec.angle,
            orientation: spec.orientation.degrees(),
        })
        .into_iter()
        .collect();

    let raw_weights: Vec<f64> = source_points.iter().map(|cp| cp.weight).collect();
    let checked = check_weights(beam_name, &raw_weights, settings)?;
    if let Some(total) = checked.normalized_from {
        warn!(beam = beam_name, total, "Control point weights normalised");
        warnings.push(ExportWarning::MetersetWeightsNormalized {
            beam: beam_name.to_string(),
            total,
        });
    }
    let steps = accumulate_weights(&checked.weights);

    let context = BeamContext {
        nominal_beam_energy: parse_nominal_energy(&source_beam.machine_energy_name)?,
        dose_rate: source_beam.dose_rate.unwrap_or_default(),
        ssd_mm: cm_to_mm(source_beam.ssd_cm),
        gantry_rotation_direction: gantry_rotation_direction(&source_beam.control_point_manager),
        isocenter: plan.isocenter,
        has_wedge: !wedges.is_empty(),
    };

    let control_points: Vec<_> = source_points
        .iter()
        .zip(&leaf_values)
        .zip(&steps)
        .enumerate()
        .map(|(index, ((cp, leaves), step))| encode_control_point(index, cp, leaves, *step, &context))
        .collect();
    let final_cumulative_meterset_weight: f64 = checked.weights.iter().sum();

    let beam = Beam {
        number,
        name: source_beam.field_id.clone(),
        description: source_beam.name.clone(),
        manufacturer: settings.manufacturer.clone(),
        treatment_machine_name: treatment_machine_name(&source_beam.machine_name_and_version)
            .to_string(),
        primary_dosimeter_unit: PRIMARY_DOSIMETER_UNIT.to_string(),
        source_axis_distance_mm: settings.source_axis_distance_mm,
        beam_type: beam_type(&source_beam.set_beam_type),
        radiation_type: RadiationType::from_modality(&source_beam.modality),
        treatment_delivery_type: TREATMENT_DELIVERY_TYPE.to_string(),
        fluence_mode: FLUENCE_MODE.to_string(),
        referenced_patient_setup_number: number,
        number_of_compensators: 0,
        number_of_boli: 0,
        number_of_blocks: 0,
        wedges,
        devices,
        final_cumulative_meterset_weight,
        control_points,
    };

    Ok(EncodedBeam {
        beam,
        referenced_beam: ReferencedBeam {
            beam_number: number,
            dose_specification_point,
            beam_dose_gy,
            beam_meterset,
        },
        number_of_fractions: prescription.number_of_fractions,
        warnings,
    })
}

/// Monitor units and beam dose (Gy) of a beam.
pub fn monitor_units(info: &MonitorUnitInfo, dose_per_mu: f64) -> (f64, Option<f64>) {
    if info.normalized_dose == 0.0 {
        return (0.0, None);
    }
    let mu = info.prescription_dose / (info.normalized_dose * dose_per_mu);
    let dose = Gray::from(CentiGray(info.prescription_dose));
    (mu, Some(dose.0))
}

/// Gantry rotation direction from the manager's CW/CCW flags.
pub fn gantry_rotation_direction(manager: &ControlPointManager) -> RotationDirection {
    if manager.gantry_is_cw == Some(1) {
        RotationDirection::Clockwise
    } else if manager.gantry_is_ccw == Some(1) {
        RotationDirection::CounterClockwise
    } else {
        RotationDirection::None
    }
}

/// "STATIC" for static beams (keeping the source's uppercased wording),
/// "DYNAMIC" for everything else.
pub fn beam_type(set_beam_type: &str) -> String {
    let upper = set_beam_type.to_uppercase();
    if upper.contains("STATIC") {
        upper
    } else {
        "DYNAMIC".to_string()
    }
}

/// First decimal number in an energy name, leading-dot fractions included.
static ENERGY_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-+]?\d*\.\d+|\d+").expect("energy pattern is valid"));

/// Nominal beam energy: the first number in an energy name ("6 MV" → 6).
pub fn parse_nominal_energy(energy_name: &str) -> RtPlanResult<f64> {
    let invalid = || {
        RtPlanError::invalid_input(
            "machine_energy_name",
            energy_name,
            "Energy name carries no nominal energy",
        )
    };

    let number = ENERGY_NUMBER.find(energy_name).ok_or_else(invalid)?;
    number.as_str().parse::<f64>().map_err(|_| invalid())
}
