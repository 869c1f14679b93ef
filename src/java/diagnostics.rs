#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled};
use typed_builder::TypedBuilder;

use super::parsers::parser;

#[derive(Tabled, Serialize, Deserialize, TypedBuilder, Clone, Debug, PartialEq, Eq)]
#[builder(field_defaults(setter(into)))]
#[builder(doc)]
/// A struct representing a javac diagnostic message
pub struct JavacDiagnostic {
    /// * `file_name`: name of the file the diagnostic is about
    #[tabled(rename = "File")]
    file_name:   String,
    /// * `line_number`: line number
    #[tabled(rename = "Line")]
    line_number: u32,
    /// Type of diagnostic (error or warning).
    #[tabled(rename = "Kind")]
    severity:    DiagnosticSeverity,
    /// * `message`: the diagnostic message
    #[tabled(rename = "Message")]
    message:     String,
}

impl JavacDiagnostic {
    /// Returns the file name
    pub fn file_name(&self) -> &str {
        self.file_name.as_ref()
    }

    /// Returns the 1-based line the diagnostic points at.
    pub fn line_number(&self) -> u32 {
        self.line_number
    }

    /// Returns the severity of the diagnostic.
    pub fn severity(&self) -> DiagnosticSeverity {
        self.severity
    }

    /// Returns the message, without the `error:` prefix.
    pub fn message(&self) -> &str {
        self.message.as_ref()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// Severity of a diagnostic emitted by `javac`.
pub enum DiagnosticSeverity {
    /// Diagnostic raised as an error.
    Error,
    /// Diagnostic raised as a warning.
    Warning,
}

impl Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticSeverity::Error => "ERROR",
            DiagnosticSeverity::Warning => "WARNING",
        })
    }
}

/// A source location picked out of a `java` stack trace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineRef {
    /// The file name associated with the frame.
    pub file_name:   String,
    /// The line number within the file.
    pub line_number: usize,
}

/// Picks every diagnostic header line out of javac's output; continuation
/// lines (source excerpt, caret, symbol details) are skipped.
pub fn parse_javac_output(output: &str) -> Vec<JavacDiagnostic> {
    output
        .lines()
        .filter_map(|line| parser::diagnostic(line).ok())
        .collect()
}

/// The innermost stack frame of a runtime failure, if the output has one.
pub fn first_stack_frame(output: &str) -> Option<LineRef> {
    output
        .lines()
        .find_map(|line| parser::stack_frame(line).ok())
}

/// The count from javac's closing `N error(s)` line, if there is one.
pub fn javac_error_count(output: &str) -> Option<u32> {
    output
        .lines()
        .find_map(|line| parser::error_count(line).ok())
}

/// Renders diagnostics as a table.
pub fn diagnostics_table(diags: &[JavacDiagnostic]) -> String {
    Table::new(diags).to_string()
}
