#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    ffi::{OsStr, OsString},
    path::PathBuf,
    process::{ExitStatus, Stdio},
    time::Duration,
};

use anyhow::{Context, Result};
use bon::Builder;
use tokio::{
    io::AsyncReadExt,
    process::{Child, Command},
    time::timeout,
};

/// Kills the wrapped child when dropped, unless it was disarmed first.
struct KillOnDrop(Option<Child>);

impl KillOnDrop {
    /// Returns a mutable reference to the underlying child process.
    fn child_mut(&mut self) -> Result<&mut Child> {
        self.0
            .as_mut()
            .context("child process already taken from guard")
    }

    /// Prevents the guard from killing the process on drop.
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        if let Some(child) = self.0.as_mut() {
            let _ = child.start_kill();
        }
    }
}

/// Output of a finished subprocess.
#[derive(Debug)]
pub struct Captured {
    /// Exit status returned by the process.
    pub status: ExitStatus,
    /// Everything written to stdout, decoded lossily.
    pub stdout: String,
    /// Everything written to stderr, decoded lossily.
    pub stderr: String,
}

impl Captured {
    /// True when the process exited with status zero.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// stderr followed by stdout.
    pub fn combined(&self) -> String {
        [self.stderr.as_str(), self.stdout.as_str()].concat()
    }
}

/// One subprocess to run to completion.
#[derive(Debug, Builder)]
pub struct Invocation {
    /// Program to start.
    #[builder(into)]
    program:  OsString,
    /// Arguments passed to the program.
    #[builder(default)]
    args:     Vec<OsString>,
    /// Working directory, if not the current one.
    #[builder(into)]
    cwd:      Option<PathBuf>,
    /// The process is killed once this much time has passed.
    deadline: Option<Duration>,
}

impl Invocation {
    /// Appends one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Program and arguments, space separated, for logs.
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Spawns the process with a null stdin and collects stdout/stderr.
    ///
    /// Fails if the process cannot be spawned or outlives its deadline; a
    /// process that runs but exits non-zero is not an error.
    pub async fn run(self) -> Result<Captured> {
        tracing::debug!("running {}", self.display());

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let mut guard = KillOnDrop(Some(cmd.spawn().with_context(|| {
            format!("failed to spawn {}", self.program.to_string_lossy())
        })?));

        let mut stdout = guard
            .child_mut()?
            .stdout
            .take()
            .context("missing stdout pipe")?;
        let mut stderr = guard
            .child_mut()?
            .stderr
            .take()
            .context("missing stderr pipe")?;

        let out_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            stdout
                .read_to_end(&mut buf)
                .await
                .context("failed to read stdout")?;
            Ok::<Vec<u8>, anyhow::Error>(buf)
        });
        let err_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            stderr
                .read_to_end(&mut buf)
                .await
                .context("failed to read stderr")?;
            Ok::<Vec<u8>, anyhow::Error>(buf)
        });

        let wait = async move {
            let mut guard = guard;
            let status = guard
                .child_mut()?
                .wait()
                .await
                .context("failed to wait on process")?;
            let stdout = out_task.await.context("stdout task join error")??;
            let stderr = err_task.await.context("stderr task join error")??;
            guard.disarm();
            Ok(Captured {
                status,
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
            })
        };

        match self.deadline {
            Some(limit) => timeout(limit, wait)
                .await
                .with_context(|| format!("subprocess did not finish within {limit:?}"))?,
            None => wait.await,
        }
    }
}
