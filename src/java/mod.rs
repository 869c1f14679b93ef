#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Brace placement for puzzle sources.
pub mod bracing;
/// Structured javac diagnostics.
pub mod diagnostics;
/// Compiles and runs reassembled programs with `javac` and `java`.
pub mod facility;
/// Tree-sitter parser wrapper.
pub mod parser;
/// Parsers for javac and java outputs.
pub mod parsers;
/// Tree-sitter query strings used by Java analysis.
pub mod queries;
/// Turns Java source into puzzle tokens.
pub mod tokenizer;
/// Java-specific toolchain helpers.
pub mod util;

pub use bracing::BracingStyle;
pub use diagnostics::{DiagnosticSeverity, JavacDiagnostic, LineRef};
pub use facility::JavaFacility;
pub use parser::Parser;
pub use tokenizer::{class_name, source_file, tokenize};
