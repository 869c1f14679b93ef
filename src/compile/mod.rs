#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use anyhow::Result;
use futures::future::BoxFuture;
use thiserror::Error;

/// The submission state machine.
pub mod runner;
/// Classifying a finished run against the expected output.
pub mod verdict;

pub use runner::{Completion, CompileRunner, RunnerState, Submission};
pub use verdict::{Outcome, Verdict};

/// What a compile-and-run facility reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// True when the program failed to compile or crashed.
    is_error: bool,
    /// Program output, or the error text when `is_error` is set.
    output:   String,
}

impl Execution {
    /// A run that finished normally and printed `output`.
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            is_error: false,
            output:   output.into(),
        }
    }

    /// A run that failed with `message`.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            output:   message.into(),
        }
    }

    /// Whether the run failed.
    pub fn is_error(&self) -> bool {
        self.is_error
    }

    /// Output or error text.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Takes the output or error text.
    pub fn into_output(self) -> String {
        self.output
    }
}

/// Something that can compile and run a program.
///
/// Implementations are handed the full source text and the name of the class
/// to run. An `Err` means the facility itself broke (missing toolchain,
/// unwritable scratch directory); a program that does not compile is an
/// `Ok` with [`Execution::is_error`] set.
pub trait CompileFacility: Send + Sync {
    /// Compiles `source_text` and runs `class_name`.
    fn compile_and_run(
        &self,
        source_text: String,
        class_name: String,
    ) -> BoxFuture<'static, Result<Execution>>;
}

#[derive(Debug, Error)]
/// Errors raised when submitting to a [`CompileRunner`].
pub enum RunnerError {
    /// A submission is already waiting for its result.
    #[error("A compilation is already in progress")]
    CompilationBusy,
    /// Anything else.
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}
