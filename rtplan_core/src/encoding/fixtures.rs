//! Sample planning-system data shared by the encoding tests.

use crate::machine::{EnergyCalibration, LeafPair, MachineCalibration};
use crate::source::{
    ControlPointManager, MonitorUnitInfo, PatientInfo, PlanInfo, Prescription, PrimaryImage,
    ReferencePoint, SourceBeam, SourceControlPoint, SourcePlan, Trial, WedgeContext,
};

pub(crate) fn machine() -> MachineCalibration {
    MachineCalibration {
        name: "Linac1".to_string(),
        version: "2019".to_string(),
        source_to_left_right_jaw_distance_cm: 40.6,
        source_to_top_bottom_jaw_distance_cm: 31.9,
        source_to_mlc_distance_cm: 50.9,
        leaf_pairs: (0..3)
            .map(|i| LeafPair {
                width_cm: 1.0,
                center_cm: -1.0 + i as f64,
            })
            .collect(),
        energies: vec![
            EnergyCalibration {
                name: "6 MV".to_string(),
                dose_per_mu_at_calibration: 1.0,
            },
            EnergyCalibration {
                name: "15 MV".to_string(),
                dose_per_mu_at_calibration: 0.8,
            },
        ],
    }
}

pub(crate) fn control_point(gantry: f64, weight: f64) -> SourceControlPoint {
    SourceControlPoint {
        left_jaw_position_cm: 5.0,
        right_jaw_position_cm: 5.0,
        top_jaw_position_cm: 4.0,
        bottom_jaw_position_cm: 4.0,
        mlc_leaf_positions: "1.0,1.5,2.0,2.5,3.0,3.5".to_string(),
        gantry,
        collimator: 0.0,
        couch: 0.0,
        wedge: WedgeContext::default(),
        weight,
    }
}

pub(crate) fn beam(name: &str) -> SourceBeam {
    SourceBeam {
        name: name.to_string(),
        field_id: format!("{}-1", name),
        modality: "Photons".to_string(),
        set_beam_type: "Static".to_string(),
        machine_name_and_version: "Linac1: 2019".to_string(),
        machine_energy_name: "6 MV".to_string(),
        prescription_name: "Prostate".to_string(),
        prescription_point_name: "PrescPt".to_string(),
        dose_rate: Some(400.0),
        ssd_cm: 93.5,
        control_point_manager: ControlPointManager {
            gantry_is_cw: None,
            gantry_is_ccw: None,
            control_points: vec![control_point(0.0, 0.5), control_point(0.0, 0.5)],
        },
        monitor_unit_info: MonitorUnitInfo {
            prescription_dose: 200.0,
            normalized_dose: 100.0,
        },
    }
}

pub(crate) fn plan() -> SourcePlan {
    SourcePlan {
        patient: PatientInfo {
            full_name: "DOE^JANE".to_string(),
            medical_record_number: "MRN001".to_string(),
            date_of_birth: "19600101".to_string(),
            gender: "Female".to_string(),
            radiation_oncologist: "SMITH^ANN".to_string(),
            comment: "Prostate boost".to_string(),
        },
        plan: PlanInfo {
            plan_name: "Prostate".to_string(),
            tool_type: "Pinnacle".to_string(),
            version_description: "16.2".to_string(),
            write_timestamp: "2024-03-01 08:00:00".to_string(),
        },
        trial: Trial {
            name: "Trial_1".to_string(),
            write_timestamp: Some("2024-03-05 14:30:15".to_string()),
            beams: vec![beam("AP"), beam("PA")],
            prescriptions: vec![Prescription {
                name: "Prostate".to_string(),
                number_of_fractions: 25,
            }],
        },
        primary_image: Some(PrimaryImage {
            study_instance_uid: "1.2.3.4".to_string(),
            frame_of_reference_uid: "1.2.3.5".to_string(),
            study_id: "STUDY1".to_string(),
        }),
        machines: vec![machine()],
        points: vec![ReferencePoint {
            name: "PrescPt".to_string(),
            position: [10.0, 20.0, 30.0],
        }],
        isocenter: [1.0, 2.0, 3.0],
        structure_set_uid: "1.2.3.6".to_string(),
        plan_instance_uid: Some("1.2.3.7".to_string()),
        patient_position: "HFS".to_string(),
    }
}
