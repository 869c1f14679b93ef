#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use anyhow::Context;
use tokio::{
    runtime::Handle,
    sync::oneshot,
    time::{Instant, timeout_at},
};

use super::{CompileFacility, Execution, RunnerError, Verdict};
use crate::{config, puzzle::SourceFile};

/// Where the runner is between submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// Ready for a submission.
    Idle,
    /// A submission is waiting for its result.
    Submitted,
}

/// How a submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The facility answered before the deadline.
    Completed(Execution),
    /// The deadline passed first.
    TimedOut,
}

/// Sends programs to a [`CompileFacility`], one at a time, and waits a bounded
/// time for each answer.
///
/// Cloning gives another handle on the same runner.
#[derive(Clone)]
pub struct CompileRunner {
    /// Does the actual compiling.
    facility: Arc<dyn CompileFacility>,
    /// How long a submission may take.
    timeout:  Duration,
    /// The exclusive submission slot.
    state:    Arc<Mutex<RunnerState>>,
}

impl fmt::Debug for CompileRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileRunner")
            .field("timeout", &self.timeout)
            .field("state", &self.state())
            .finish()
    }
}

impl CompileRunner {
    /// A runner that gives `facility` at most `timeout` per submission.
    pub fn new(facility: Arc<dyn CompileFacility>, timeout: Duration) -> Self {
        Self {
            facility,
            timeout,
            state: Arc::new(Mutex::new(RunnerState::Idle)),
        }
    }

    /// A runner using the configured compile timeout.
    pub fn with_configured_timeout(facility: Arc<dyn CompileFacility>) -> Self {
        Self::new(facility, config::get().compile_timeout())
    }

    /// Returns the per-submission timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the current state.
    pub fn state(&self) -> RunnerState {
        *lock(&self.state)
    }

    /// Starts compiling `source_text` in the background.
    ///
    /// Returns immediately; the deadline starts counting now. Must be called
    /// from within a tokio runtime. Fails with
    /// [`RunnerError::CompilationBusy`] while another submission is pending.
    pub fn submit(
        &self,
        source_text: String,
        class_name: String,
    ) -> Result<Submission, RunnerError> {
        let runtime =
            Handle::try_current().context("Compile submissions need a running tokio runtime")?;

        {
            let mut state = lock(&self.state);
            if *state == RunnerState::Submitted {
                return Err(RunnerError::CompilationBusy);
            }
            *state = RunnerState::Submitted;
        }
        let release = Release(Arc::clone(&self.state));

        let deadline = Instant::now() + self.timeout;
        let (tx, rx) = oneshot::channel();
        let facility = Arc::clone(&self.facility);

        tracing::debug!("submitting {class_name} ({} bytes)", source_text.len());
        runtime.spawn(async move {
            let result = facility.compile_and_run(source_text, class_name).await;
            if Instant::now() >= deadline || tx.send(result).is_err() {
                tracing::warn!("Discarding a compile result that arrived after its deadline");
            }
        });

        Ok(Submission {
            rx,
            deadline,
            timeout: self.timeout,
            _release: release,
        })
    }

    /// Submits `source_text` as a solution to `source` and classifies the
    /// outcome.
    pub async fn run(&self, source_text: String, source: &SourceFile) -> Result<Verdict, RunnerError> {
        let submission = self.submit(source_text, source.class_name().to_string())?;
        Ok(Verdict::from_completion(
            submission.wait().await,
            source.expected_output(),
        ))
    }
}

/// Locks the submission slot, ignoring poisoning; the slot holds a plain
/// enum that is always valid.
fn lock(state: &Mutex<RunnerState>) -> MutexGuard<'_, RunnerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Puts the runner back to idle when dropped.
struct Release(Arc<Mutex<RunnerState>>);

impl Drop for Release {
    fn drop(&mut self) {
        *lock(&self.0) = RunnerState::Idle;
    }
}

/// A pending submission. Dropping it without waiting frees the runner.
pub struct Submission {
    /// Receives the facility's answer.
    rx:       oneshot::Receiver<anyhow::Result<Execution>>,
    /// When the submission stops waiting.
    deadline: Instant,
    /// The runner's timeout, for logs.
    timeout:  Duration,
    /// Frees the runner once this submission is done with.
    _release: Release,
}

impl fmt::Debug for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submission")
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl Submission {
    /// Waits for the result or the deadline, whichever comes first.
    ///
    /// Resolves exactly once. Results that arrive after the deadline are
    /// dropped even if nobody was waiting yet. A facility that fails, panics,
    /// or goes away yields a completed run flagged as an error. The runner is
    /// idle again by the time this returns.
    pub async fn wait(self) -> Completion {
        let Submission {
            rx,
            deadline,
            timeout,
            _release,
        } = self;

        match timeout_at(deadline, rx).await {
            Ok(Ok(Ok(execution))) => Completion::Completed(execution),
            Ok(Ok(Err(err))) => {
                tracing::warn!("Compile facility failed: {err:#}");
                Completion::Completed(Execution::error(format!("{err:#}")))
            }
            Ok(Err(_)) if Instant::now() >= deadline => {
                tracing::warn!("Compilation took longer than {timeout:?}");
                Completion::TimedOut
            }
            Ok(Err(_)) => {
                tracing::warn!("Compile task ended without reporting a result");
                Completion::Completed(Execution::error(
                    "Something went wrong while compiling; the compile task stopped without a \
                     result",
                ))
            }
            Err(_) => {
                tracing::warn!("Compilation took longer than {timeout:?}");
                Completion::TimedOut
            }
        }
    }
}
