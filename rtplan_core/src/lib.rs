//! # rtplan_core - Treatment Plan to DICOM RT Plan Translator
//!
//! `rtplan_core` turns a treatment-planning-system plan (patient, trial, beams,
//! control points, machine calibration) into a DICOM RT Plan. All inputs and
//! outputs are JSON-serializable, and the translation itself is a pure
//! function: no I/O, no process-wide state.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: `build_plan` takes a source plan and settings, returns a document
//! - **Typed output**: every emitted DICOM attribute is a struct field, conditional
//!   ones are `Option`s
//! - **Rich Errors**: anything that could change delivered dose is an error, not a default
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rtplan_core::{build_plan, export_rtplan, load_source_plan, ExportSettings};
//! use std::path::Path;
//!
//! let plan = load_source_plan(Path::new("plan.json"))?;
//! let export = build_plan(&plan, &ExportSettings::default())?;
//! for warning in &export.warnings {
//!     eprintln!("warning: {}", warning);
//! }
//! export_rtplan(&export.document, Path::new("out"))?;
//! # Ok::<(), rtplan_core::RtPlanError>(())
//! ```
//!
//! ## Modules
//!
//! - [`source`] - Planning-system input model
//! - [`machine`] - Machine calibration and lookups
//! - [`encoding`] - The translation pipeline (wedge, geometry, control points, beams, plan)
//! - [`document`] - Typed RT Plan document
//! - [`dicom`] - DICOM data set rendering
//! - [`file_io`] - Loading inputs, atomic writes of the RT Plan
//! - [`settings`] - Exporter settings
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types

pub mod constants;
pub mod dicom;
pub mod document;
pub mod encoding;
pub mod errors;
pub mod file_io;
pub mod machine;
pub mod settings;
pub mod source;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use document::RtPlanDocument;
pub use encoding::{build_plan, build_plan_at, ExportWarning, PlanExport};
pub use errors::{RtPlanError, RtPlanResult};
pub use file_io::{export_rtplan, load_settings, load_source_plan, rp_file_name, save_document_json};
pub use settings::{ExportSettings, WeightPolicy};
pub use source::SourcePlan;
