//! # Plan Document Builder
//!
//! Top level of the translation. Validates the source plan, assembles the
//! identifiers once, encodes the beams in source order and collects them into
//! an [`RtPlanDocument`] with one fraction group, one patient setup per beam
//! and the structure-set cross-reference.
//!
//! Beams without control points are skipped with a warning; any other beam
//! failure aborts the translation, as does a plan without primary image or
//! without beams. No partially built document is ever returned.

use chrono::{Local, NaiveDateTime};
use tracing::{error, info, warn};

use crate::constants::{
    generate_uid, IMPLEMENTATION_CLASS_UID, RT_PLAN_GEOMETRY, RT_PLAN_MODALITY,
    RT_PLAN_SOP_CLASS_UID, RT_STRUCT_SOP_CLASS_UID, SPECIFIC_CHARACTER_SET, TRANSFER_SYNTAX_UID,
};
use crate::document::{
    FileMeta, FractionGroup, PatientSetup, PlanHeader, ReferencedStructureSet, RtPlanDocument,
};
use crate::errors::{RtPlanError, RtPlanResult};
use crate::settings::ExportSettings;
use crate::source::SourcePlan;

use super::beam::encode_beam;
use super::{ExportWarning, PlanExport};

/// Timestamp format the planning system writes
const SOURCE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DICOM_DATE_FORMAT: &str = "%Y%m%d";
const DICOM_TIME_FORMAT: &str = "%H%M%S";

/// Translate a source plan, stamping the document with the current local time.
pub fn build_plan(plan: &SourcePlan, settings: &ExportSettings) -> RtPlanResult<PlanExport> {
    build_plan_at(plan, settings, Local::now().naive_local())
}

/// Translate a source plan with an explicit instance creation time.
pub fn build_plan_at(
    plan: &SourcePlan,
    settings: &ExportSettings,
    created: NaiveDateTime,
) -> RtPlanResult<PlanExport> {
    let Some(image) = plan.primary_image.as_ref() else {
        error!(plan = %plan.plan.plan_name, "No primary image found for plan");
        return Err(RtPlanError::MissingPrimaryImage);
    };
    if plan.trial.beams.is_empty() {
        error!(trial = %plan.trial.name, "No beams found in trial");
        return Err(RtPlanError::NoBeamsFound);
    }

    let plan_uid = plan
        .plan_instance_uid
        .clone()
        .filter(|uid| !uid.is_empty())
        .unwrap_or_else(generate_uid);
    info!(
        plan = %plan.plan.plan_name,
        trial = %plan.trial.name,
        beams = plan.trial.beams.len(),
        uid = %plan_uid,
        "Building RT Plan"
    );

    let mut warnings = Vec::new();
    let mut beams = Vec::new();
    let mut referenced_beams = Vec::new();
    let mut fraction_counts = Vec::new();
    let mut skipped = 0;

    for source_beam in &plan.trial.beams {
        let number = beams.len() as u32 + 1;
        match encode_beam(plan, source_beam, number, settings) {
            Ok(encoded) => {
                warnings.extend(encoded.warnings);
                fraction_counts.push(encoded.number_of_fractions);
                referenced_beams.push(encoded.referenced_beam);
                beams.push(encoded.beam);
            }
            Err(e) if e.is_beam_local() => {
                error!(beam = %source_beam.name, error = %e, "Skipping beam");
                warnings.push(ExportWarning::BeamSkipped {
                    beam: source_beam.name.clone(),
                    reason: e.to_string(),
                });
                skipped += 1;
            }
            Err(e) => {
                error!(beam = %source_beam.name, error = %e, "Beam encoding failed");
                return Err(e);
            }
        }
    }

    let Some(&number_of_fractions) = fraction_counts.last() else {
        return Err(RtPlanError::NoBeamsEncoded { skipped });
    };
    let mut distinct = fraction_counts.clone();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() > 1 {
        warn!(?distinct, used = number_of_fractions, "Beams disagree on number of fractions");
        warnings.push(ExportWarning::InconsistentFractionCount {
            used: number_of_fractions,
            found: distinct,
        });
    }

    let (study_date, study_time) = study_timestamp(plan);
    let header = PlanHeader {
        specific_character_set: SPECIFIC_CHARACTER_SET.to_string(),
        instance_creation_date: created.format(DICOM_DATE_FORMAT).to_string(),
        instance_creation_time: created.format(DICOM_TIME_FORMAT).to_string(),
        sop_class_uid: RT_PLAN_SOP_CLASS_UID.to_string(),
        sop_instance_uid: plan_uid.clone(),
        study_date: study_date.clone(),
        study_time: study_time.clone(),
        accession_number: String::new(),
        modality: RT_PLAN_MODALITY.to_string(),
        manufacturer: settings.manufacturer.clone(),
        operators_name: String::new(),
        manufacturer_model_name: plan.plan.tool_type.clone(),
        software_versions: plan.plan.version_description.clone(),
        physicians_of_record: plan.patient.radiation_oncologist.clone(),
        patient_name: plan.patient.full_name.clone(),
        patient_id: plan.patient.medical_record_number.clone(),
        patient_birth_date: plan.patient.date_of_birth.clone(),
        patient_sex: plan.patient.sex_code(),
        study_instance_uid: image.study_instance_uid.clone(),
        series_instance_uid: plan_uid.clone(),
        study_id: image.study_id.clone(),
        frame_of_reference_uid: image.frame_of_reference_uid.clone(),
        position_reference_indicator: String::new(),
        rt_plan_label: format!("{}.0", plan.plan.plan_name),
        rt_plan_name: plan.plan.plan_name.clone(),
        rt_plan_description: plan.patient.comment.clone(),
        rt_plan_date: study_date,
        rt_plan_time: study_time,
        rt_plan_geometry: RT_PLAN_GEOMETRY.to_string(),
        approval_status: settings.approval_status.clone(),
    };

    let patient_setups = beams
        .iter()
        .map(|beam| PatientSetup {
            number: beam.referenced_patient_setup_number,
            patient_position: plan.patient_position.clone(),
        })
        .collect();

    let document = RtPlanDocument {
        file_meta: FileMeta {
            media_storage_sop_class_uid: RT_PLAN_SOP_CLASS_UID.to_string(),
            media_storage_sop_instance_uid: plan_uid,
            transfer_syntax_uid: TRANSFER_SYNTAX_UID.to_string(),
            implementation_class_uid: IMPLEMENTATION_CLASS_UID.to_string(),
        },
        header,
        fraction_group: FractionGroup {
            number: 1,
            number_of_fractions_planned: number_of_fractions,
            number_of_beams: beams.len() as u32,
            number_of_brachy_application_setups: 0,
            referenced_beams,
        },
        beams,
        patient_setups,
        referenced_structure_set: ReferencedStructureSet {
            referenced_sop_class_uid: RT_STRUCT_SOP_CLASS_UID.to_string(),
            referenced_sop_instance_uid: plan.structure_set_uid.clone(),
        },
    };

    info!(
        beams = document.beams.len(),
        skipped,
        warnings = warnings.len(),
        "RT Plan built"
    );
    Ok(PlanExport { document, warnings })
}

/// Study date and time (`YYYYMMDD`, `HHMMSS`) from the trial write
/// timestamp, or the plan's when the trial has none. Empty when unparseable.
fn study_timestamp(plan: &SourcePlan) -> (String, String) {
    let raw = plan
        .trial
        .write_timestamp
        .as_deref()
        .filter(|ts| !ts.trim().is_empty())
        .unwrap_or(&plan.plan.write_timestamp);

    match NaiveDateTime::parse_from_str(raw.trim(), SOURCE_TIMESTAMP_FORMAT) {
        Ok(ts) => (
            ts.format(DICOM_DATE_FORMAT).to_string(),
            ts.format(DICOM_TIME_FORMAT).to_string(),
        ),
        Err(e) => {
            warn!(timestamp = raw, error = %e, "Unreadable write timestamp, study date left empty");
            (String::new(), String::new())
        }
    }
}
