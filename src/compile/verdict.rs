#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt;

use similar::{ChangeTag, TextDiff};

use super::{Completion, Execution};

/// The four ways an attempt can end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Compiled, ran, and printed the expected output.
    Pass,
    /// Compiled and ran, but printed something else.
    FailMismatch,
    /// Did not compile, or crashed.
    FailCompileError,
    /// Took too long.
    Timeout,
}

impl Outcome {
    /// What the player is told.
    pub fn message(self) -> &'static str {
        match self {
            Outcome::Pass => "Congratulations! You have successfully solved the puzzle!",
            Outcome::FailMismatch => {
                "Your program's output does NOT match the expected! Please try again"
            }
            Outcome::FailCompileError => "The program has the following errors:",
            Outcome::Timeout => "Compilation took too long! Please try again!",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::Pass => "PASS",
            Outcome::FailMismatch => "FAIL_MISMATCH",
            Outcome::FailCompileError => "FAIL_COMPILE_ERROR",
            Outcome::Timeout => "TIMEOUT",
        })
    }
}

/// The classified result of one compile attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// How the attempt ended.
    outcome:  Outcome,
    /// Program output or error text; absent after a timeout.
    output:   Option<String>,
    /// What the program should have printed.
    expected: String,
}

impl Verdict {
    /// Classifies `completion` against `expected`.
    ///
    /// Output is compared byte for byte.
    pub fn from_completion(completion: Completion, expected: &str) -> Self {
        let (outcome, output) = match completion {
            Completion::TimedOut => (Outcome::Timeout, None),
            Completion::Completed(execution) => {
                let outcome = classify(&execution, expected);
                (outcome, Some(execution.into_output()))
            }
        };

        Self {
            outcome,
            output,
            expected: expected.to_string(),
        }
    }

    /// Returns the outcome.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// True for [`Outcome::Pass`].
    pub fn is_pass(&self) -> bool {
        self.outcome == Outcome::Pass
    }

    /// Output or error text, if the run finished.
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// The expected output.
    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// Line diff of expected against actual output, for mismatches only.
    pub fn diff(&self) -> Option<String> {
        if self.outcome != Outcome::FailMismatch {
            return None;
        }
        let actual = self.output.as_deref()?;
        let diff = TextDiff::from_lines(self.expected.as_str(), actual);

        let mut rendered = String::new();
        for change in diff.iter_all_changes() {
            let prefix = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            rendered.push_str(&format!("{prefix} {change}"));
            if change.missing_newline() {
                rendered.push('\n');
            }
        }
        Some(rendered)
    }
}

/// Error, else exact match, else mismatch.
fn classify(execution: &Execution, expected: &str) -> Outcome {
    if execution.is_error() {
        Outcome::FailCompileError
    } else if execution.output() == expected {
        Outcome::Pass
    } else {
        Outcome::FailMismatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_output_passes() {
        let verdict = Verdict::from_completion(
            Completion::Completed(Execution::success("hi\n")),
            "hi\n",
        );
        assert_eq!(verdict.outcome(), Outcome::Pass);
        assert_eq!(verdict.output(), Some("hi\n"));
        assert!(verdict.diff().is_none());
    }

    #[test]
    fn trailing_newline_matters() {
        let verdict =
            Verdict::from_completion(Completion::Completed(Execution::success("hi")), "hi\n");
        assert_eq!(verdict.outcome(), Outcome::FailMismatch);
    }

    #[test]
    fn errors_win_over_matching_output() {
        let verdict =
            Verdict::from_completion(Completion::Completed(Execution::error("hi\n")), "hi\n");
        assert_eq!(verdict.outcome(), Outcome::FailCompileError);
        assert_eq!(verdict.output(), Some("hi\n"));
    }

    #[test]
    fn timeouts_carry_no_output() {
        let verdict = Verdict::from_completion(Completion::TimedOut, "hi\n");
        assert_eq!(verdict.outcome(), Outcome::Timeout);
        assert_eq!(verdict.output(), None);
        assert_eq!(verdict.outcome().to_string(), "TIMEOUT");
    }

    #[test]
    fn mismatch_diff_marks_changed_lines() {
        let verdict = Verdict::from_completion(
            Completion::Completed(Execution::success("1\n3\n")),
            "1\n2\n",
        );
        let diff = verdict.diff().unwrap();
        assert!(diff.contains("- 2"));
        assert!(diff.contains("+ 3"));
        assert!(diff.contains("  1"));
    }
}
