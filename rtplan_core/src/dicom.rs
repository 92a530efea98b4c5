//! # DICOM Encoding
//!
//! Renders an [`RtPlanDocument`] as a DICOM RT Plan data set (file meta group
//! included) using `dicom-object`. Only the attributes the document carries
//! are written; conditional ones (beam dose, wedge sequence, first control
//! point setup) are omitted when absent.
//!
//! Numeric attributes are written as decimal strings (DS) of at most 16
//! characters, multi-valued ones joined with `\`.

use dicom_core::value::DataSetSequence;
use dicom_core::{DataElement, PrimitiveValue, Tag, VR};
use dicom_dictionary_std::tags;
use dicom_object::{FileDicomObject, FileMetaTableBuilder, InMemDicomObject};

use crate::document::{
    Beam, BeamLimitingDevice, ControlPoint, FractionGroup, PatientSetup, RtPlanDocument,
    ReferencedBeam, Wedge,
};
use crate::errors::{RtPlanError, RtPlanResult};

/// Maximum length of a DS value
const DS_MAX_LEN: usize = 16;

/// Encode the document as a DICOM file object (data set plus file meta).
pub fn to_file_object(doc: &RtPlanDocument) -> RtPlanResult<FileDicomObject<InMemDicomObject>> {
    let meta = FileMetaTableBuilder::new()
        .transfer_syntax(doc.file_meta.transfer_syntax_uid.as_str())
        .media_storage_sop_class_uid(doc.file_meta.media_storage_sop_class_uid.as_str())
        .media_storage_sop_instance_uid(doc.file_meta.media_storage_sop_instance_uid.as_str())
        .implementation_class_uid(doc.file_meta.implementation_class_uid.as_str());

    plan_data_set(doc)
        .with_meta(meta)
        .map_err(|e| RtPlanError::dicom(e.to_string()))
}

/// Build the RT Plan data set (without file meta).
pub fn plan_data_set(doc: &RtPlanDocument) -> InMemDicomObject {
    let h = &doc.header;
    let mut obj = InMemDicomObject::new_empty();

    put_str(&mut obj, tags::SPECIFIC_CHARACTER_SET, VR::CS, &h.specific_character_set);
    put_str(&mut obj, tags::INSTANCE_CREATION_DATE, VR::DA, &h.instance_creation_date);
    put_str(&mut obj, tags::INSTANCE_CREATION_TIME, VR::TM, &h.instance_creation_time);
    put_str(&mut obj, tags::SOP_CLASS_UID, VR::UI, &h.sop_class_uid);
    put_str(&mut obj, tags::SOP_INSTANCE_UID, VR::UI, &h.sop_instance_uid);
    put_str(&mut obj, tags::STUDY_DATE, VR::DA, &h.study_date);
    put_str(&mut obj, tags::STUDY_TIME, VR::TM, &h.study_time);
    put_str(&mut obj, tags::ACCESSION_NUMBER, VR::SH, &h.accession_number);
    put_str(&mut obj, tags::MODALITY, VR::CS, &h.modality);
    put_str(&mut obj, tags::MANUFACTURER, VR::LO, &h.manufacturer);
    put_str(&mut obj, tags::PHYSICIANS_OF_RECORD, VR::PN, &h.physicians_of_record);
    put_str(&mut obj, tags::OPERATORS_NAME, VR::PN, &h.operators_name);
    put_str(&mut obj, tags::MANUFACTURER_MODEL_NAME, VR::LO, &h.manufacturer_model_name);

    put_str(&mut obj, tags::PATIENT_NAME, VR::PN, &h.patient_name);
    put_str(&mut obj, tags::PATIENT_ID, VR::LO, &h.patient_id);
    put_str(&mut obj, tags::PATIENT_BIRTH_DATE, VR::DA, &h.patient_birth_date);
    put_str(&mut obj, tags::PATIENT_SEX, VR::CS, &h.patient_sex);
    put_str(&mut obj, tags::SOFTWARE_VERSIONS, VR::LO, &h.software_versions);

    put_str(&mut obj, tags::STUDY_INSTANCE_UID, VR::UI, &h.study_instance_uid);
    put_str(&mut obj, tags::SERIES_INSTANCE_UID, VR::UI, &h.series_instance_uid);
    put_str(&mut obj, tags::STUDY_ID, VR::SH, &h.study_id);
    put_str(&mut obj, tags::FRAME_OF_REFERENCE_UID, VR::UI, &h.frame_of_reference_uid);
    put_str(&mut obj, tags::POSITION_REFERENCE_INDICATOR, VR::LO, &h.position_reference_indicator);

    put_str(&mut obj, tags::RT_PLAN_LABEL, VR::SH, &h.rt_plan_label);
    put_str(&mut obj, tags::RT_PLAN_NAME, VR::LO, &h.rt_plan_name);
    put_str(&mut obj, tags::RT_PLAN_DESCRIPTION, VR::ST, &h.rt_plan_description);
    put_str(&mut obj, tags::RT_PLAN_DATE, VR::DA, &h.rt_plan_date);
    put_str(&mut obj, tags::RT_PLAN_TIME, VR::TM, &h.rt_plan_time);
    put_str(&mut obj, tags::RT_PLAN_GEOMETRY, VR::CS, &h.rt_plan_geometry);
    put_str(&mut obj, tags::APPROVAL_STATUS, VR::CS, &h.approval_status);

    put_sequence(&mut obj, tags::FRACTION_GROUP_SEQUENCE, vec![fraction_group_item(&doc.fraction_group)]);
    put_sequence(&mut obj, tags::BEAM_SEQUENCE, doc.beams.iter().map(beam_item).collect());
    put_sequence(
        &mut obj,
        tags::PATIENT_SETUP_SEQUENCE,
        doc.patient_setups.iter().map(patient_setup_item).collect(),
    );

    let mut structure_set = InMemDicomObject::new_empty();
    put_str(
        &mut structure_set,
        tags::REFERENCED_SOP_CLASS_UID,
        VR::UI,
        &doc.referenced_structure_set.referenced_sop_class_uid,
    );
    put_str(
        &mut structure_set,
        tags::REFERENCED_SOP_INSTANCE_UID,
        VR::UI,
        &doc.referenced_structure_set.referenced_sop_instance_uid,
    );
    put_sequence(&mut obj, tags::REFERENCED_STRUCTURE_SET_SEQUENCE, vec![structure_set]);

    obj
}

fn fraction_group_item(group: &FractionGroup) -> InMemDicomObject {
    let mut item = InMemDicomObject::new_empty();
    put_is(&mut item, tags::FRACTION_GROUP_NUMBER, group.number);
    put_is(&mut item, tags::NUMBER_OF_FRACTIONS_PLANNED, group.number_of_fractions_planned);
    put_is(&mut item, tags::NUMBER_OF_BEAMS, group.number_of_beams);
    put_is(
        &mut item,
        tags::NUMBER_OF_BRACHY_APPLICATION_SETUPS,
        group.number_of_brachy_application_setups,
    );
    put_sequence(
        &mut item,
        tags::REFERENCED_BEAM_SEQUENCE,
        group.referenced_beams.iter().map(referenced_beam_item).collect(),
    );
    item
}

fn referenced_beam_item(beam: &ReferencedBeam) -> InMemDicomObject {
    let mut item = InMemDicomObject::new_empty();
    put_is(&mut item, tags::REFERENCED_BEAM_NUMBER, beam.beam_number);
    put_ds_list(&mut item, tags::BEAM_DOSE_SPECIFICATION_POINT, &beam.dose_specification_point);
    if let Some(dose) = beam.beam_dose_gy {
        put_ds(&mut item, tags::BEAM_DOSE, dose);
    }
    put_ds(&mut item, tags::BEAM_METERSET, beam.beam_meterset);
    item
}

fn beam_item(beam: &Beam) -> InMemDicomObject {
    let mut item = InMemDicomObject::new_empty();
    put_str(&mut item, tags::MANUFACTURER, VR::LO, &beam.manufacturer);
    put_is(&mut item, tags::BEAM_NUMBER, beam.number);
    put_str(&mut item, tags::BEAM_NAME, VR::LO, &beam.name);
    put_str(&mut item, tags::BEAM_DESCRIPTION, VR::ST, &beam.description);
    put_str(&mut item, tags::TREATMENT_MACHINE_NAME, VR::SH, &beam.treatment_machine_name);
    put_str(&mut item, tags::PRIMARY_DOSIMETER_UNIT, VR::CS, &beam.primary_dosimeter_unit);
    put_ds(&mut item, tags::SOURCE_AXIS_DISTANCE, beam.source_axis_distance_mm);
    put_str(&mut item, tags::BEAM_TYPE, VR::CS, &beam.beam_type);
    put_str(&mut item, tags::RADIATION_TYPE, VR::CS, beam.radiation_type.as_str());
    put_str(&mut item, tags::TREATMENT_DELIVERY_TYPE, VR::CS, &beam.treatment_delivery_type);

    let mut fluence = InMemDicomObject::new_empty();
    put_str(&mut fluence, tags::FLUENCE_MODE, VR::CS, &beam.fluence_mode);
    put_sequence(&mut item, tags::PRIMARY_FLUENCE_MODE_SEQUENCE, vec![fluence]);

    put_is(&mut item, tags::NUMBER_OF_WEDGES, beam.number_of_wedges());
    if !beam.wedges.is_empty() {
        put_sequence(&mut item, tags::WEDGE_SEQUENCE, beam.wedges.iter().map(wedge_item).collect());
    }
    put_is(&mut item, tags::NUMBER_OF_COMPENSATORS, beam.number_of_compensators);
    put_is(&mut item, tags::NUMBER_OF_BOLI, beam.number_of_boli);
    put_is(&mut item, tags::NUMBER_OF_BLOCKS, beam.number_of_blocks);

    put_sequence(
        &mut item,
        tags::BEAM_LIMITING_DEVICE_SEQUENCE,
        beam.devices.iter().map(device_item).collect(),
    );
    put_ds(&mut item, tags::FINAL_CUMULATIVE_METERSET_WEIGHT, beam.final_cumulative_meterset_weight);
    put_is(&mut item, tags::NUMBER_OF_CONTROL_POINTS, beam.number_of_control_points());
    put_is(&mut item, tags::REFERENCED_PATIENT_SETUP_NUMBER, beam.referenced_patient_setup_number);
    put_sequence(
        &mut item,
        tags::CONTROL_POINT_SEQUENCE,
        beam.control_points.iter().map(control_point_item).collect(),
    );
    item
}

fn wedge_item(wedge: &Wedge) -> InMemDicomObject {
    let mut item = InMemDicomObject::new_empty();
    put_is(&mut item, tags::WEDGE_NUMBER, wedge.number);
    put_str(&mut item, tags::WEDGE_TYPE, VR::CS, wedge.wedge_type.as_str());
    put_str(&mut item, tags::WEDGE_ID, VR::SH, &wedge.id);
    // Wedge angle is an integer string
    put_is(&mut item, tags::WEDGE_ANGLE, wedge.angle.round() as i64);
    put_ds(&mut item, tags::WEDGE_ORIENTATION, wedge.orientation);
    item
}

fn device_item(device: &BeamLimitingDevice) -> InMemDicomObject {
    let mut item = InMemDicomObject::new_empty();
    put_str(&mut item, tags::RT_BEAM_LIMITING_DEVICE_TYPE, VR::CS, device.device_type.as_str());
    put_ds(
        &mut item,
        tags::SOURCE_TO_BEAM_LIMITING_DEVICE_DISTANCE,
        device.source_to_device_distance_mm,
    );
    put_is(&mut item, tags::NUMBER_OF_LEAF_JAW_PAIRS, device.number_of_leaf_jaw_pairs);
    if let Some(boundaries) = &device.leaf_position_boundaries {
        put_ds_list(&mut item, tags::LEAF_POSITION_BOUNDARIES, boundaries);
    }
    item
}

fn control_point_item(cp: &ControlPoint) -> InMemDicomObject {
    let mut item = InMemDicomObject::new_empty();
    put_is(&mut item, tags::CONTROL_POINT_INDEX, cp.index);
    put_ds(&mut item, tags::CUMULATIVE_METERSET_WEIGHT, cp.cumulative_meterset_weight);

    let mut dose_reference = InMemDicomObject::new_empty();
    put_ds(
        &mut dose_reference,
        tags::CUMULATIVE_DOSE_REFERENCE_COEFFICIENT,
        cp.dose_reference.cumulative_dose_reference_coefficient,
    );
    put_is(
        &mut dose_reference,
        tags::REFERENCED_DOSE_REFERENCE_NUMBER,
        cp.dose_reference.referenced_dose_reference_number,
    );
    put_sequence(&mut item, tags::REFERENCED_DOSE_REFERENCE_SEQUENCE, vec![dose_reference]);

    let positions = cp
        .device_positions
        .iter()
        .map(|p| {
            let mut position = InMemDicomObject::new_empty();
            put_str(&mut position, tags::RT_BEAM_LIMITING_DEVICE_TYPE, VR::CS, p.device_type.as_str());
            put_ds_list(&mut position, tags::LEAF_JAW_POSITIONS, &p.leaf_jaw_positions);
            position
        })
        .collect();
    put_sequence(&mut item, tags::BEAM_LIMITING_DEVICE_POSITION_SEQUENCE, positions);

    put_ds(&mut item, tags::GANTRY_ANGLE, cp.gantry_angle);
    put_str(&mut item, tags::GANTRY_ROTATION_DIRECTION, VR::CS, cp.gantry_rotation_direction.as_str());
    put_ds(&mut item, tags::SOURCE_TO_SURFACE_DISTANCE, cp.source_to_surface_distance_mm);

    if let Some(setup) = &cp.setup {
        put_ds(&mut item, tags::NOMINAL_BEAM_ENERGY, setup.nominal_beam_energy);
        put_ds(&mut item, tags::DOSE_RATE_SET, setup.dose_rate_set);
        put_ds(&mut item, tags::BEAM_LIMITING_DEVICE_ANGLE, setup.beam_limiting_device_angle);
        put_str(
            &mut item,
            tags::BEAM_LIMITING_DEVICE_ROTATION_DIRECTION,
            VR::CS,
            setup.beam_limiting_device_rotation_direction.as_str(),
        );
        if let Some(wedge) = &setup.wedge_position {
            let mut wedge_item = InMemDicomObject::new_empty();
            put_str(&mut wedge_item, tags::WEDGE_POSITION, VR::CS, &wedge.position);
            put_is(&mut wedge_item, tags::REFERENCED_WEDGE_NUMBER, wedge.referenced_wedge_number);
            put_sequence(&mut item, tags::WEDGE_POSITION_SEQUENCE, vec![wedge_item]);
        }
        put_ds(&mut item, tags::PATIENT_SUPPORT_ANGLE, setup.patient_support_angle);
        put_str(
            &mut item,
            tags::PATIENT_SUPPORT_ROTATION_DIRECTION,
            VR::CS,
            setup.patient_support_rotation_direction.as_str(),
        );
        put_ds_list(&mut item, tags::ISOCENTER_POSITION, &setup.isocenter_position);
    }
    item
}

fn patient_setup_item(setup: &PatientSetup) -> InMemDicomObject {
    let mut item = InMemDicomObject::new_empty();
    put_str(&mut item, tags::PATIENT_POSITION, VR::CS, &setup.patient_position);
    put_is(&mut item, tags::PATIENT_SETUP_NUMBER, setup.number);
    item
}

fn put_str(obj: &mut InMemDicomObject, tag: Tag, vr: VR, value: &str) {
    obj.put(DataElement::new(tag, vr, PrimitiveValue::from(value)));
}

fn put_is(obj: &mut InMemDicomObject, tag: Tag, value: impl std::fmt::Display) {
    obj.put(DataElement::new(tag, VR::IS, PrimitiveValue::from(value.to_string())));
}

fn put_ds(obj: &mut InMemDicomObject, tag: Tag, value: f64) {
    obj.put(DataElement::new(tag, VR::DS, PrimitiveValue::from(format_ds(value))));
}

fn put_ds_list(obj: &mut InMemDicomObject, tag: Tag, values: &[f64]) {
    obj.put(DataElement::new(tag, VR::DS, PrimitiveValue::from(ds_list(values))));
}

fn put_sequence(obj: &mut InMemDicomObject, tag: Tag, items: Vec<InMemDicomObject>) {
    obj.put(DataElement::new(tag, VR::SQ, DataSetSequence::from(items)));
}

/// Render a value as a DICOM decimal string of at most 16 characters.
pub fn format_ds(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }

    let plain = clean_decimal(format!("{}", value));
    if plain.len() <= DS_MAX_LEN {
        return plain;
    }

    (0..DS_MAX_LEN)
        .rev()
        .map(|precision| clean_decimal(format!("{:.*}", precision, value)))
        .find(|s| s.len() <= DS_MAX_LEN)
        .unwrap_or_else(|| format!("{:.6e}", value))
}

/// Backslash-separated list of decimal strings
pub fn ds_list(values: &[f64]) -> String {
    values.iter().map(|v| format_ds(*v)).collect::<Vec<_>>().join("\\")
}

/// Strip trailing zeros of a fixed-point rendering and normalise negative zero.
fn clean_decimal(mut s: String) -> String {
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}
