//! Structured channel for within-document anomalies that are recorded but
//! never fail a parse: unknown enum tokens, coerced dates, short rows,
//! dangling relationships, cycles, duplicate ids. These need a filterable
//! channel rather than ad hoc `eprintln!`, so they travel as `Diagnostic`
//! values through a `DiagnosticEmitter` sink instead.

use serde::{Deserialize, Serialize};

/// A stable code identifying the kind of anomaly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// No ERMHDR line encountered; parse proceeds anyway.
    MissingHeader,
    /// A `%T`/`%F`/`%R` row shape anomaly that does not abort the parse.
    MalformedRow,
    /// An unknown raw enum token was coerced to its documented default.
    UnknownEnumToken,
    /// A date/time cell failed to parse and was coerced to `None`.
    DateCoerced,
    /// Two rows shared a task id; the later row replaced the earlier one.
    DuplicateTaskId,
    /// A task's `projectId` did not name an existing project.
    OrphanTaskDropped,
    /// A relationship referenced a task id absent from the task set.
    DanglingRelationship,
    /// The task-relationship graph contains a cycle.
    CycleDetected,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::MissingHeader => "missing_header",
            DiagnosticCode::MalformedRow => "malformed_row",
            DiagnosticCode::UnknownEnumToken => "unknown_enum_token",
            DiagnosticCode::DateCoerced => "date_coerced",
            DiagnosticCode::DuplicateTaskId => "duplicate_task_id",
            DiagnosticCode::OrphanTaskDropped => "orphan_task_dropped",
            DiagnosticCode::DanglingRelationship => "dangling_relationship",
            DiagnosticCode::CycleDetected => "cycle_detected",
        }
    }
}

/// Severity of a recorded anomaly. None of these abort the parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
}

/// One recorded anomaly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    /// The task/relationship/table context the anomaly occurred in, if any.
    pub context: Option<String>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Sink for diagnostics emitted during parsing, building, and analysis.
pub trait DiagnosticEmitter {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// An emitter that simply collects every diagnostic it receives, in order.
#[derive(Debug, Default, Clone)]
pub struct CollectingEmitter {
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn by_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.code == code)
    }
}

impl DiagnosticEmitter for CollectingEmitter {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_emitter_preserves_order() {
        let mut emitter = CollectingEmitter::new();
        emitter.emit(Diagnostic::new(
            DiagnosticCode::UnknownEnumToken,
            Severity::Warning,
            "unknown task type PR_??",
        ));
        emitter.emit(Diagnostic::new(
            DiagnosticCode::DateCoerced,
            Severity::Info,
            "malformed date",
        ));

        assert_eq!(emitter.len(), 2);
        assert_eq!(emitter.diagnostics[0].code, DiagnosticCode::UnknownEnumToken);
        assert_eq!(emitter.diagnostics[1].code, DiagnosticCode::DateCoerced);
    }

    #[test]
    fn by_code_filters() {
        let mut emitter = CollectingEmitter::new();
        emitter.emit(Diagnostic::new(
            DiagnosticCode::DuplicateTaskId,
            Severity::Warning,
            "task 1001 duplicated",
        ));
        emitter.emit(Diagnostic::new(
            DiagnosticCode::DuplicateTaskId,
            Severity::Warning,
            "task 1002 duplicated",
        ));
        emitter.emit(Diagnostic::new(
            DiagnosticCode::CycleDetected,
            Severity::Warning,
            "cycle among 1003,1004",
        ));

        assert_eq!(emitter.by_code(DiagnosticCode::DuplicateTaskId).count(), 2);
        assert_eq!(emitter.by_code(DiagnosticCode::CycleDetected).count(), 1);
    }
}
