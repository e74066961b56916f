//! xerproj-core
//!
//! Normalized schedule data model for Primavera P6 XER exports (and, at the
//! boundary, MS-Project XML exports): entities, id-based cross-references,
//! the closed error taxonomy, and the diagnostic channel for anomalies that
//! are recorded but never fail a parse.
//!
//! Tasks are modeled as a descriptive record (this module's `Task`) plus a
//! separate `ComputedFields` side-table keyed by task id, written once by
//! the CPM engine and merged into a `TaskView` at analyzer-consumption time.
//! This mirrors how targets without Rust's "rebuild a new immutable value"
//! idiom have to represent "construct once, then receive one write-pass of
//! derived fields".

mod diagnostics;
mod error;
mod model;

pub use diagnostics::{CollectingEmitter, Diagnostic, DiagnosticCode, DiagnosticEmitter, Severity};
pub use error::XerProjError;
pub use model::*;
