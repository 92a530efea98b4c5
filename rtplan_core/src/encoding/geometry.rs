//! # Beam-Limiting Device Geometry
//!
//! Builds the three static device descriptors of a beam from machine
//! calibration: the X jaw pair, the Y jaw pair and the MLC. Source distances
//! and leaf boundaries are converted from centimeters to millimeters.
//!
//! MLC leaf boundaries are found by walking the leaf-pair table: the first
//! boundary is the first leaf's center minus half its width, each further
//! boundary adds that leaf's width.
//!
//! ## Example
//!
//! ```rust
//! use rtplan_core::encoding::geometry::leaf_boundaries_mm;
//! use rtplan_core::machine::LeafPair;
//!
//! let leaves = [
//!     LeafPair { width_cm: 1.0, center_cm: 0.5 },
//!     LeafPair { width_cm: 1.0, center_cm: 1.5 },
//!     LeafPair { width_cm: 1.0, center_cm: 2.5 },
//! ];
//! assert_eq!(leaf_boundaries_mm(&leaves), vec![0.0, 10.0, 20.0, 30.0]);
//! ```

use crate::document::{BeamLimitingDevice, DeviceType};
use crate::errors::{RtPlanError, RtPlanResult};
use crate::machine::{LeafPair, MachineCalibration};
use crate::units::cm_to_mm;

/// Build the ASYMX, ASYMY and MLCX descriptors for a beam.
///
/// `raw_leaf_count` is the number of raw leaf-position values the beam's
/// control points carry (two per leaf pair); it must agree with the
/// machine's leaf table.
pub fn build_devices(
    machine: &MachineCalibration,
    beam_name: &str,
    raw_leaf_count: usize,
) -> RtPlanResult<Vec<BeamLimitingDevice>> {
    if machine.leaf_pairs.is_empty() {
        return Err(RtPlanError::EmptyLeafTable {
            machine: machine.name.clone(),
        });
    }

    let expected = machine.leaf_pair_count() * 2;
    if raw_leaf_count != expected {
        return Err(RtPlanError::LeafCountMismatch {
            beam: beam_name.to_string(),
            expected,
            found: raw_leaf_count,
        });
    }

    let boundaries = leaf_boundaries_mm(&machine.leaf_pairs);

    Ok(vec![
        BeamLimitingDevice {
            device_type: DeviceType::AsymX,
            source_to_device_distance_mm: cm_to_mm(machine.source_to_left_right_jaw_distance_cm),
            number_of_leaf_jaw_pairs: 1,
            leaf_position_boundaries: None,
        },
        BeamLimitingDevice {
            device_type: DeviceType::AsymY,
            source_to_device_distance_mm: cm_to_mm(machine.source_to_top_bottom_jaw_distance_cm),
            number_of_leaf_jaw_pairs: 1,
            leaf_position_boundaries: None,
        },
        BeamLimitingDevice {
            device_type: DeviceType::MlcX,
            source_to_device_distance_mm: cm_to_mm(machine.source_to_mlc_distance_cm),
            number_of_leaf_jaw_pairs: raw_leaf_count / 2,
            leaf_position_boundaries: Some(boundaries),
        },
    ])
}

/// Leaf-pair boundaries in mm; one more entry than there are leaf pairs.
pub fn leaf_boundaries_mm(leaf_pairs: &[LeafPair]) -> Vec<f64> {
    let Some(first) = leaf_pairs.first() else {
        return Vec::new();
    };

    let start = first.center_cm - first.width_cm / 2.0;
    std::iter::once(start)
        .chain(leaf_pairs.iter().scan(start, |edge, leaf| {
            *edge += leaf.width_cm;
            Some(*edge)
        }))
        .map(cm_to_mm)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::EnergyCalibration;

    fn machine(leaf_pairs: Vec<LeafPair>) -> MachineCalibration {
        MachineCalibration {
            name: "Linac1".to_string(),
            version: "1".to_string(),
            source_to_left_right_jaw_distance_cm: 40.6,
            source_to_top_bottom_jaw_distance_cm: 31.9,
            source_to_mlc_distance_cm: 50.9,
            leaf_pairs,
            energies: vec![EnergyCalibration {
                name: "6 MV".to_string(),
                dose_per_mu_at_calibration: 1.0,
            }],
        }
    }

    fn uniform_leaves(count: usize, width_cm: f64) -> Vec<LeafPair> {
        let start = -(count as f64) * width_cm / 2.0;
        (0..count)
            .map(|i| LeafPair {
                width_cm,
                center_cm: start + width_cm * (i as f64 + 0.5),
            })
            .collect()
    }

    #[test]
    fn test_unit_leaf_boundaries() {
        let leaves = vec![
            LeafPair { width_cm: 1.0, center_cm: 0.5 },
            LeafPair { width_cm: 1.0, center_cm: 1.5 },
            LeafPair { width_cm: 1.0, center_cm: 2.5 },
        ];
        assert_eq!(leaf_boundaries_mm(&leaves), vec![0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_mixed_width_boundaries() {
        // Boundaries only depend on the first center and the widths
        let leaves = vec![
            LeafPair { width_cm: 1.0, center_cm: -1.5 },
            LeafPair { width_cm: 0.5, center_cm: -0.75 },
            LeafPair { width_cm: 0.5, center_cm: -0.25 },
            LeafPair { width_cm: 1.0, center_cm: 0.5 },
        ];
        let boundaries = leaf_boundaries_mm(&leaves);
        let expected = [-20.0, -10.0, -5.0, 0.0, 10.0];
        assert_eq!(boundaries.len(), expected.len());
        for (got, want) in boundaries.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{} != {}", got, want);
        }
    }

    #[test]
    fn test_empty_boundaries() {
        assert!(leaf_boundaries_mm(&[]).is_empty());
    }

    #[test]
    fn test_build_devices() {
        let machine = machine(uniform_leaves(60, 1.0));
        let devices = build_devices(&machine, "AP", 120).unwrap();

        assert_eq!(devices.len(), 3);
        assert_eq!(devices[0].device_type, DeviceType::AsymX);
        assert!((devices[0].source_to_device_distance_mm - 406.0).abs() < 1e-9);
        assert_eq!(devices[0].number_of_leaf_jaw_pairs, 1);
        assert!(devices[0].leaf_position_boundaries.is_none());

        assert_eq!(devices[1].device_type, DeviceType::AsymY);
        assert!((devices[1].source_to_device_distance_mm - 319.0).abs() < 1e-9);

        let mlc = &devices[2];
        assert_eq!(mlc.device_type, DeviceType::MlcX);
        assert!((mlc.source_to_device_distance_mm - 509.0).abs() < 1e-9);
        assert_eq!(mlc.number_of_leaf_jaw_pairs, 60);
        let boundaries = mlc.leaf_position_boundaries.as_ref().unwrap();
        assert_eq!(boundaries.len(), 61);
        assert!((boundaries[0] + 300.0).abs() < 1e-9);
        assert!((boundaries[60] - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_leaf_table_rejected() {
        let machine = machine(Vec::new());
        let err = build_devices(&machine, "AP", 0).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_LEAF_TABLE");
    }

    #[test]
    fn test_leaf_count_mismatch_rejected() {
        let machine = machine(uniform_leaves(3, 1.0));
        let err = build_devices(&machine, "AP", 4).unwrap_err();
        assert_eq!(
            err,
            RtPlanError::LeafCountMismatch {
                beam: "AP".to_string(),
                expected: 6,
                found: 4,
            }
        );
    }
}
