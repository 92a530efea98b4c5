//! # File I/O Module
//!
//! The exporter's only contact with the file system:
//! - **Loading**: source plans and export settings, both JSON
//! - **Atomic writes**: the RT Plan file and its JSON rendering are written to
//!   a `.tmp` sibling, synced, then renamed into place, so a reader never sees
//!   a half-written plan
//!
//! ## File Naming
//!
//! RT Plan files are named `RP.<SOP instance UID>.dcm` inside the export
//! directory.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rtplan_core::encoding::build_plan;
//! use rtplan_core::file_io::{export_rtplan, load_settings, load_source_plan};
//! use std::path::Path;
//!
//! let plan = load_source_plan(Path::new("plan.json"))?;
//! let settings = load_settings(Path::new("settings.json"))?;
//! let export = build_plan(&plan, &settings)?;
//! let written = export_rtplan(&export.document, Path::new("/data/export"))?;
//! println!("Wrote {}", written.display());
//! # Ok::<(), rtplan_core::errors::RtPlanError>(())
//! ```

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::dicom::to_file_object;
use crate::document::RtPlanDocument;
use crate::errors::{RtPlanError, RtPlanResult};
use crate::settings::ExportSettings;
use crate::source::SourcePlan;

/// File name of the RT Plan for a plan instance UID.
pub fn rp_file_name(plan_instance_uid: &str) -> String {
    format!("RP.{}.dcm", plan_instance_uid)
}

/// Encode the document and write it to `<export_dir>/RP.<uid>.dcm`.
///
/// The directory is created when missing. Returns the path written.
pub fn export_rtplan(document: &RtPlanDocument, export_dir: &Path) -> RtPlanResult<PathBuf> {
    fs::create_dir_all(export_dir).map_err(|e| {
        RtPlanError::file_error("create directory", export_dir.display().to_string(), e.to_string())
    })?;

    let path = export_dir.join(rp_file_name(document.plan_instance_uid()));
    let tmp_path = tmp_path_for(&path);
    let file_object = to_file_object(document)?;

    file_object.write_to_file(&tmp_path).map_err(|e| {
        discard_tmp(&tmp_path);
        RtPlanError::dicom(format!("{} ({})", e, tmp_path.display()))
    })?;

    File::open(&tmp_path)
        .and_then(|f| f.sync_all())
        .map_err(|e| {
            discard_tmp(&tmp_path);
            RtPlanError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
        })?;

    rename_into_place(&tmp_path, &path)?;
    info!(path = %path.display(), beams = document.beams.len(), "RT Plan written");
    Ok(path)
}

/// Save the JSON rendering of a document with atomic write semantics.
pub fn save_document_json(document: &RtPlanDocument, path: &Path) -> RtPlanResult<()> {
    let json = serde_json::to_string_pretty(document).map_err(|e| RtPlanError::SerializationError {
        reason: e.to_string(),
    })?;
    write_atomic(path, json.as_bytes())?;
    debug!(path = %path.display(), "Document JSON written");
    Ok(())
}

/// Load a source plan from a JSON file.
pub fn load_source_plan(path: &Path) -> RtPlanResult<SourcePlan> {
    let plan: SourcePlan = read_json(path)?;
    debug!(
        path = %path.display(),
        beams = plan.trial.beams.len(),
        machines = plan.machines.len(),
        "Source plan loaded"
    );
    Ok(plan)
}

/// Load export settings from a JSON file. Missing fields take their defaults.
pub fn load_settings(path: &Path) -> RtPlanResult<ExportSettings> {
    read_json(path)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> RtPlanResult<T> {
    let mut file = File::open(path).map_err(|e| {
        RtPlanError::file_error("open", path.display().to_string(), e.to_string())
    })?;

    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(|e| {
        RtPlanError::file_error("read", path.display().to_string(), e.to_string())
    })?;

    serde_json::from_str(&contents).map_err(|e| RtPlanError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })
}

/// Write bytes to `<path>.tmp`, sync, then rename over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> RtPlanResult<()> {
    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        RtPlanError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(bytes).map_err(|e| {
        discard_tmp(&tmp_path);
        RtPlanError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        discard_tmp(&tmp_path);
        RtPlanError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    rename_into_place(&tmp_path, path)
}

fn rename_into_place(tmp_path: &Path, path: &Path) -> RtPlanResult<()> {
    fs::rename(tmp_path, path).map_err(|e| {
        discard_tmp(tmp_path);
        RtPlanError::file_error("rename to final", path.display().to_string(), e.to_string())
    })
}

/// Remove a temp file left behind by a failed write.
fn discard_tmp(tmp_path: &Path) {
    match fs::remove_file(tmp_path) {
        Ok(()) => debug!(path = %tmp_path.display(), "Temp file removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %tmp_path.display(), error = %e, "Could not remove temp file"),
    }
}

/// `<file>.tmp` next to the target
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
