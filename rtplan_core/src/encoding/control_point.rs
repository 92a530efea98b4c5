//! # Control Point Encoding
//!
//! Turns one planning-system control point into an RT Plan control point.
//!
//! ## Conventions
//!
//! - Jaws: `X1 = -right`, `X2 = left`, `Y1 = -top`, `Y2 = bottom`, all ×10
//!   (cm → mm).
//! - Leaves: the raw list alternates between the two banks. Even-indexed
//!   values form bank A (negated), odd-indexed values bank B. Each bank is
//!   reversed and the result is bank A followed by bank B, ×10.
//! - Weights: the beam's control-point weights are folded into
//!   `(increment, cumulative)` pairs where the cumulative value counts the
//!   points before the current one, so control point 0 starts at zero. The
//!   beam total lands in the beam's final cumulative weight.
//! - Static beam parameters (energy, dose rate, collimator and couch,
//!   wedge position, isocenter) are declared on control point 0 only and
//!   persist implicitly for the rest of the beam.

use serde::{Deserialize, Serialize};

use crate::constants::{DOSE_REFERENCE_NUMBER, WEDGE_NUMBER};
use crate::document::{
    ControlPoint, ControlPointSetup, DevicePosition, DeviceType, ReferencedDoseReference,
    RotationDirection, WedgePosition,
};
use crate::errors::{RtPlanError, RtPlanResult};
use crate::settings::{ExportSettings, WeightPolicy};
use crate::source::SourceControlPoint;
use crate::units::cm_to_mm;

/// Per-beam values every control point of the beam is encoded with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamContext {
    pub nominal_beam_energy: f64,
    pub dose_rate: f64,
    pub ssd_mm: f64,
    pub gantry_rotation_direction: RotationDirection,
    /// Isocenter (mm)
    pub isocenter: [f64; 3],
    /// Whether the beam carries a (classified) wedge
    pub has_wedge: bool,
}

/// Meterset weight of one control point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetersetStep {
    /// Weight delivered by this point
    pub increment: f64,
    /// Running total of the points before this one
    pub cumulative: f64,
}

/// Fold per-point weights into `(increment, cumulative)` steps.
pub fn accumulate_weights(weights: &[f64]) -> Vec<MetersetStep> {
    weights
        .iter()
        .scan(0.0, |total, &increment| {
            let cumulative = *total;
            *total += increment;
            Some(MetersetStep {
                increment,
                cumulative,
            })
        })
        .collect()
}

/// Outcome of checking a beam's weights against the expected total of one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckedWeights {
    pub weights: Vec<f64>,
    /// Original total when the weights had to be rescaled
    pub normalized_from: Option<f64>,
}

/// Validate a beam's control-point weights and apply the weight policy.
///
/// Weights must be finite and non-negative. When their sum deviates from one
/// by more than the configured tolerance they are either rescaled or the
/// beam is rejected, depending on [`WeightPolicy`].
pub fn check_weights(
    beam_name: &str,
    weights: &[f64],
    settings: &ExportSettings,
) -> RtPlanResult<CheckedWeights> {
    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(RtPlanError::invalid_input(
            "weight",
            bad.to_string(),
            format!("Control point weights of beam '{}' must be finite and non-negative", beam_name),
        ));
    }

    let total: f64 = weights.iter().sum();
    if (total - 1.0).abs() <= settings.meterset_weight_tolerance {
        return Ok(CheckedWeights {
            weights: weights.to_vec(),
            normalized_from: None,
        });
    }

    match settings.meterset_weight_policy {
        WeightPolicy::Normalize if total > 0.0 => Ok(CheckedWeights {
            weights: weights.iter().map(|w| w / total).collect(),
            normalized_from: Some(total),
        }),
        _ => Err(RtPlanError::MetersetWeightMismatch {
            beam: beam_name.to_string(),
            total,
        }),
    }
}

/// X and Y jaw positions (mm) in RT Plan sign convention.
pub fn jaw_positions_mm(cp: &SourceControlPoint) -> ([f64; 2], [f64; 2]) {
    (
        [cm_to_mm(-cp.right_jaw_position_cm), cm_to_mm(cp.left_jaw_position_cm)],
        [cm_to_mm(-cp.top_jaw_position_cm), cm_to_mm(cp.bottom_jaw_position_cm)],
    )
}

/// Reorder raw interleaved leaf values (cm) into RT Plan leaf positions (mm).
pub fn leaf_positions_mm(raw_cm: &[f64]) -> Vec<f64> {
    let mut bank_a: Vec<f64> = raw_cm.iter().step_by(2).map(|&v| cm_to_mm(-v)).collect();
    let mut bank_b: Vec<f64> = raw_cm.iter().skip(1).step_by(2).map(|&v| cm_to_mm(v)).collect();
    bank_a.reverse();
    bank_b.reverse();
    bank_a.extend(bank_b);
    bank_a
}

/// Encode one control point.
///
/// `leaf_values_cm` are the already-parsed raw leaf values of `source`.
pub fn encode_control_point(
    index: usize,
    source: &SourceControlPoint,
    leaf_values_cm: &[f64],
    step: MetersetStep,
    beam: &BeamContext,
) -> ControlPoint {
    let (x_jaws, y_jaws) = jaw_positions_mm(source);

    let setup = (index == 0).then(|| ControlPointSetup {
        nominal_beam_energy: beam.nominal_beam_energy,
        dose_rate_set: beam.dose_rate,
        beam_limiting_device_angle: source.collimator,
        beam_limiting_device_rotation_direction: RotationDirection::None,
        wedge_position: beam.has_wedge.then(|| WedgePosition {
            referenced_wedge_number: WEDGE_NUMBER,
            position: "IN".to_string(),
        }),
        patient_support_angle: source.couch,
        patient_support_rotation_direction: RotationDirection::None,
        isocenter_position: beam.isocenter,
    });

    ControlPoint {
        index,
        cumulative_meterset_weight: step.cumulative,
        dose_reference: ReferencedDoseReference {
            referenced_dose_reference_number: DOSE_REFERENCE_NUMBER,
            cumulative_dose_reference_coefficient: step.cumulative,
        },
        device_positions: vec![
            DevicePosition {
                device_type: DeviceType::AsymX,
                leaf_jaw_positions: x_jaws.to_vec(),
            },
            DevicePosition {
                device_type: DeviceType::AsymY,
                leaf_jaw_positions: y_jaws.to_vec(),
            },
            DevicePosition {
                device_type: DeviceType::MlcX,
                leaf_jaw_positions: leaf_positions_mm(leaf_values_cm),
            },
        ],
        gantry_angle: source.gantry,
        gantry_rotation_direction: beam.gantry_rotation_direction,
        source_to_surface_distance_mm: beam.ssd_mm,
        setup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::WedgeContext;

    fn source_cp() -> SourceControlPoint {
        SourceControlPoint {
            left_jaw_position_cm: 3.0,
            right_jaw_position_cm: 2.0,
            top_jaw_position_cm: 1.5,
            bottom_jaw_position_cm: 4.0,
            mlc_leaf_positions: "1.0,2.0,3.0,4.0".to_string(),
            gantry: 90.0,
            collimator: 10.0,
            couch: 350.0,
            wedge: WedgeContext::default(),
            weight: 1.0,
        }
    }

    fn context(has_wedge: bool) -> BeamContext {
        BeamContext {
            nominal_beam_energy: 6.0,
            dose_rate: 400.0,
            ssd_mm: 935.0,
            gantry_rotation_direction: RotationDirection::Clockwise,
            isocenter: [1.0, 2.0, 3.0],
            has_wedge,
        }
    }

    #[test]
    fn test_jaw_sign_convention() {
        let (x, y) = jaw_positions_mm(&source_cp());
        assert_eq!(x, [-20.0, 30.0]);
        assert_eq!(y, [-15.0, 40.0]);
    }

    #[test]
    fn test_leaf_bank_reordering() {
        // bank A (even): 1, 3 -> negated, reversed: -30, -10
        // bank B (odd):  2, 4 -> reversed: 40, 20
        let positions = leaf_positions_mm(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(positions, vec![-30.0, -10.0, 40.0, 20.0]);
    }

    #[test]
    fn test_leaf_positions_empty() {
        assert!(leaf_positions_mm(&[]).is_empty());
    }

    #[test]
    fn test_accumulate_weights() {
        let steps = accumulate_weights(&[0.25, 0.25, 0.5]);
        let cumulative: Vec<f64> = steps.iter().map(|s| s.cumulative).collect();
        assert_eq!(cumulative, vec![0.0, 0.25, 0.5]);
        assert_eq!(steps[2].increment, 0.5);
    }

    #[test]
    fn test_accumulation_law_and_monotonicity() {
        let weights = [0.1, 0.0, 0.3, 0.05, 0.55];
        let steps = accumulate_weights(&weights);
        let total: f64 = steps.iter().map(|s| s.increment).sum();
        assert_eq!(steps[0].cumulative, 0.0);
        let last = steps.last().unwrap();
        assert!((last.cumulative + last.increment - total).abs() < 1e-12);
        for pair in steps.windows(2) {
            assert!(pair[1].cumulative >= pair[0].cumulative);
            assert!((pair[1].cumulative - pair[0].cumulative - pair[0].increment).abs() < 1e-12);
        }
    }

    #[test]
    fn test_check_weights_within_tolerance() {
        let checked = check_weights("AP", &[0.5, 0.5004], &ExportSettings::default()).unwrap();
        assert!(checked.normalized_from.is_none());
        assert_eq!(checked.weights, vec![0.5, 0.5004]);
    }

    #[test]
    fn test_check_weights_normalizes() {
        let checked = check_weights("AP", &[1.0, 1.0, 2.0], &ExportSettings::default()).unwrap();
        assert_eq!(checked.normalized_from, Some(4.0));
        assert_eq!(checked.weights, vec![0.25, 0.25, 0.5]);
    }

    #[test]
    fn test_check_weights_rejects() {
        let settings = ExportSettings {
            meterset_weight_policy: WeightPolicy::Reject,
            ..ExportSettings::default()
        };
        let err = check_weights("AP", &[0.5, 0.2], &settings).unwrap_err();
        assert_eq!(err.error_code(), "METERSET_WEIGHT_MISMATCH");
    }

    #[test]
    fn test_check_weights_zero_total_cannot_normalize() {
        let err = check_weights("AP", &[0.0, 0.0], &ExportSettings::default()).unwrap_err();
        assert_eq!(err.error_code(), "METERSET_WEIGHT_MISMATCH");
    }

    #[test]
    fn test_check_weights_negative_rejected() {
        let err = check_weights("AP", &[1.5, -0.5], &ExportSettings::default()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_first_control_point_carries_setup() {
        let source = source_cp();
        let step = MetersetStep { increment: 1.0, cumulative: 0.0 };
        let cp = encode_control_point(0, &source, &[1.0, 2.0, 3.0, 4.0], step, &context(true));

        assert_eq!(cp.index, 0);
        assert_eq!(cp.gantry_angle, 90.0);
        assert_eq!(cp.gantry_rotation_direction, RotationDirection::Clockwise);
        assert_eq!(cp.source_to_surface_distance_mm, 935.0);
        assert_eq!(cp.cumulative_meterset_weight, 0.0);
        assert_eq!(cp.dose_reference.cumulative_dose_reference_coefficient, 0.0);
        assert_eq!(cp.dose_reference.referenced_dose_reference_number, 1);

        let setup = cp.setup.as_ref().unwrap();
        assert_eq!(setup.nominal_beam_energy, 6.0);
        assert_eq!(setup.dose_rate_set, 400.0);
        assert_eq!(setup.beam_limiting_device_angle, 10.0);
        assert_eq!(setup.beam_limiting_device_rotation_direction, RotationDirection::None);
        assert_eq!(setup.patient_support_angle, 350.0);
        assert_eq!(setup.patient_support_rotation_direction, RotationDirection::None);
        assert_eq!(setup.isocenter_position, [1.0, 2.0, 3.0]);

        let wedge = setup.wedge_position.as_ref().unwrap();
        assert_eq!(wedge.position, "IN");
        assert_eq!(wedge.referenced_wedge_number, 1);
    }

    #[test]
    fn test_later_control_points_omit_setup() {
        let source = source_cp();
        let step = MetersetStep { increment: 0.5, cumulative: 0.75 };
        let cp = encode_control_point(3, &source, &[1.0, 2.0, 3.0, 4.0], step, &context(true));

        assert_eq!(cp.index, 3);
        assert!(cp.setup.is_none());
        assert_eq!(cp.cumulative_meterset_weight, 0.75);
        assert_eq!(cp.dose_reference.cumulative_dose_reference_coefficient, 0.75);
        // Always-emitted fields are still present
        assert_eq!(cp.positions(DeviceType::AsymX), Some(&[-20.0, 30.0][..]));
        assert_eq!(cp.positions(DeviceType::AsymY), Some(&[-15.0, 40.0][..]));
        assert_eq!(cp.positions(DeviceType::MlcX).map(|p| p.len()), Some(4));
        assert_eq!(cp.source_to_surface_distance_mm, 935.0);
    }

    #[test]
    fn test_no_wedge_position_without_wedge() {
        let step = MetersetStep { increment: 1.0, cumulative: 1.0 };
        let cp = encode_control_point(0, &source_cp(), &[], step, &context(false));
        assert!(cp.setup.unwrap().wedge_position.is_none());
    }
}
