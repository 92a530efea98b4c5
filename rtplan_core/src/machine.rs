//! # Machine Calibration
//!
//! Treatment-machine data the translator needs: beam-limiting-device source
//! distances, the MLC leaf-pair table, and per-energy output factors. All
//! lengths are in centimeters as stored by the planning system.
//!
//! Machines are identified by name plus version (the commissioning
//! timestamp); beams reference them through a combined
//! `"<name>: <version>"` string.
//!
//! ## Example
//!
//! ```rust
//! use rtplan_core::machine::{find_machine, EnergyCalibration, LeafPair, MachineCalibration};
//!
//! let machine = MachineCalibration {
//!     name: "Linac1".to_string(),
//!     version: "2019-03-01 10:00:00".to_string(),
//!     source_to_left_right_jaw_distance_cm: 40.6,
//!     source_to_top_bottom_jaw_distance_cm: 31.9,
//!     source_to_mlc_distance_cm: 50.9,
//!     leaf_pairs: vec![LeafPair { width_cm: 1.0, center_cm: -0.5 }, LeafPair { width_cm: 1.0, center_cm: 0.5 }],
//!     energies: vec![EnergyCalibration { name: "6 MV".to_string(), dose_per_mu_at_calibration: 0.667 }],
//! };
//!
//! let machines = vec![machine];
//! let found = find_machine(&machines, "Linac1", "2019-03-01 10:00:00").unwrap();
//! assert_eq!(found.dose_per_mu("6 MV").unwrap(), 0.667);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{RtPlanError, RtPlanResult};

/// Calibration data for one treatment machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineCalibration {
    /// Machine name (e.g., "Linac1")
    pub name: String,

    /// Machine version / commissioning timestamp
    pub version: String,

    /// Source to X (left/right) jaw distance
    pub source_to_left_right_jaw_distance_cm: f64,

    /// Source to Y (top/bottom) jaw distance
    pub source_to_top_bottom_jaw_distance_cm: f64,

    /// Source to MLC distance
    pub source_to_mlc_distance_cm: f64,

    /// MLC leaf pairs, ordered along the leaf-travel-perpendicular axis
    pub leaf_pairs: Vec<LeafPair>,

    /// Output factors per beam energy
    pub energies: Vec<EnergyCalibration>,
}

/// One MLC leaf pair: its width and the position of its center line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeafPair {
    pub width_cm: f64,
    pub center_cm: f64,
}

/// Output factor for one nominal energy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyCalibration {
    /// Energy name as referenced by beams (e.g., "6 MV")
    pub name: String,

    /// Dose (cGy) per monitor unit under calibration conditions
    pub dose_per_mu_at_calibration: f64,
}

impl MachineCalibration {
    /// Look up the dose-per-MU output factor for an energy.
    ///
    /// A missing entry is an error: the caller must never fall back to a
    /// placeholder value, since the result feeds the monitor-unit calculation.
    pub fn dose_per_mu(&self, energy_name: &str) -> RtPlanResult<f64> {
        let energy = self
            .energies
            .iter()
            .find(|e| e.name == energy_name)
            .ok_or_else(|| RtPlanError::unresolved_calibration(&self.name, energy_name))?;

        if energy.dose_per_mu_at_calibration <= 0.0 {
            return Err(RtPlanError::invalid_input(
                "dose_per_mu_at_calibration",
                energy.dose_per_mu_at_calibration.to_string(),
                format!("Output factor for {} on {} must be positive", energy_name, self.name),
            ));
        }

        Ok(energy.dose_per_mu_at_calibration)
    }

    /// Number of MLC leaf pairs on this machine
    pub fn leaf_pair_count(&self) -> usize {
        self.leaf_pairs.len()
    }
}

/// Find a machine by exact name and version.
pub fn find_machine<'a>(
    machines: &'a [MachineCalibration],
    name: &str,
    version: &str,
) -> RtPlanResult<&'a MachineCalibration> {
    machines
        .iter()
        .find(|m| m.name == name && m.version == version)
        .ok_or_else(|| RtPlanError::unresolved_machine(name, version))
}

/// Split a beam's `"<name>: <version>"` machine reference.
///
/// A reference without a version separator yields an empty version.
pub fn split_machine_reference(reference: &str) -> (&str, &str) {
    match reference.split_once(": ") {
        Some((name, version)) => (name, version),
        None => (reference.trim_end_matches(':'), ""),
    }
}

/// Treatment machine name as written into the plan: everything before the
/// first `:` of the machine reference.
pub fn treatment_machine_name(reference: &str) -> &str {
    reference.split(':').next().unwrap_or(reference)
}
