//! DICOM identifiers and fixed attribute values written into every RT Plan.

/// RT Plan Storage SOP class
pub const RT_PLAN_SOP_CLASS_UID: &str = "1.2.840.10008.5.1.4.1.1.481.5";

/// RT Structure Set Storage SOP class
pub const RT_STRUCT_SOP_CLASS_UID: &str = "1.2.840.10008.5.1.4.1.1.481.3";

/// Implicit VR Little Endian
pub const TRANSFER_SYNTAX_UID: &str = "1.2.840.10008.1.2";

/// Implementation class UID recorded in the file meta group
pub const IMPLEMENTATION_CLASS_UID: &str = "1.2.826.0.1.3680043.8.498.75006884747854523615841001";

/// Root for UUID-derived UIDs (ISO/IEC 9834-8)
pub const UUID_UID_ROOT: &str = "2.25";

pub const RT_PLAN_MODALITY: &str = "RTPLAN";

pub const DEFAULT_MANUFACTURER: &str = "Pinnacle Philips";

pub const SPECIFIC_CHARACTER_SET: &str = "ISO_IR 100";

pub const RT_PLAN_GEOMETRY: &str = "PATIENT";

/// Dose reference every control point refers back to
pub const DOSE_REFERENCE_NUMBER: u32 = 1;

/// Wedge number used by the (single) wedge of a beam
pub const WEDGE_NUMBER: u32 = 1;

/// Generate a fresh UID of the form `2.25.<decimal UUIDv4>`.
pub fn generate_uid() -> String {
    format!("{}.{}", UUID_UID_ROOT, uuid::Uuid::new_v4().as_u128())
}
