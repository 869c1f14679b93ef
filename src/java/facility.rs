#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use uuid::Uuid;

use super::{
    diagnostics::parse_javac_output,
    util::{java_path, javac_path, simple_class_name},
};
use crate::{
    compile::{CompileFacility, Execution},
    config,
    constants::{OUTPUT_LIMIT, SCRATCH_PREFIX},
    process::Invocation,
    util::truncate_with_notice,
};

/// Compiles programs with `javac` and runs them with `java`, each in a fresh
/// scratch directory that is removed afterwards.
#[derive(Debug, Clone)]
pub struct JavaFacility {
    /// Parent of the per-run scratch directories.
    scratch_root:  PathBuf,
    /// Ceiling for each `javac`/`java` process.
    process_limit: Duration,
}

impl JavaFacility {
    /// A facility compiling under `scratch_root`.
    pub fn new(scratch_root: impl Into<PathBuf>, process_limit: Duration) -> Self {
        Self {
            scratch_root: scratch_root.into(),
            process_limit,
        }
    }

    /// A facility using the configured scratch directory and process limit.
    pub fn from_config() -> Self {
        let cfg = config::get();
        Self::new(cfg.scratch_dir(), cfg.process_limit())
    }

    /// Returns the scratch root.
    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }
}

impl CompileFacility for JavaFacility {
    fn compile_and_run(
        &self,
        source_text: String,
        class_name: String,
    ) -> BoxFuture<'static, Result<Execution>> {
        let root = self.scratch_root.clone();
        let limit = self.process_limit;
        Box::pin(async move { run_in_scratch(root, limit, source_text, class_name).await })
    }
}

/// Creates a scratch directory, compiles and runs there, and cleans up.
async fn run_in_scratch(
    root: PathBuf,
    limit: Duration,
    source_text: String,
    class_name: String,
) -> Result<Execution> {
    let javac = javac_path()?;
    let java = java_path()?;

    let dir = root.join(format!("{SCRATCH_PREFIX}-{}", Uuid::new_v4()));
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Could not create scratch directory {}", dir.display()))?;

    let result = compile_then_run(&dir, javac, java, limit, source_text, &class_name).await;

    if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
        tracing::warn!("Could not remove scratch directory {}: {e}", dir.display());
    }
    result
}

/// Writes the source, compiles it, and runs the class if compilation worked.
async fn compile_then_run(
    dir: &Path,
    javac: OsString,
    java: OsString,
    limit: Duration,
    source_text: String,
    class_name: &str,
) -> Result<Execution> {
    let file = dir.join(format!("{}.java", simple_class_name(class_name)));
    tokio::fs::write(&file, source_text)
        .await
        .with_context(|| format!("Could not write {}", file.display()))?;

    let compiled = Invocation::builder()
        .program(javac)
        .cwd(dir)
        .deadline(limit)
        .build()
        .arg("-encoding")
        .arg("UTF-8")
        .arg("-d")
        .arg(dir)
        .arg(&file)
        .run()
        .await
        .context("javac did not finish")?;

    if !compiled.success() {
        let report = strip_scratch_dir(&compiled.combined(), dir);
        let diagnostics = parse_javac_output(&report);
        tracing::info!("{class_name} failed to compile ({} diagnostics)", diagnostics.len());
        return Ok(Execution::error(truncate_with_notice(&report, OUTPUT_LIMIT)));
    }

    let ran = Invocation::builder()
        .program(java)
        .cwd(dir)
        .deadline(limit)
        .build()
        .arg("-cp")
        .arg(dir)
        .arg(class_name)
        .run()
        .await
        .context("java did not finish")?;

    if ran.success() {
        Ok(Execution::success(ran.stdout))
    } else {
        tracing::info!("{class_name} exited with {}", ran.status);
        Ok(Execution::error(truncate_with_notice(
            &ran.combined(),
            OUTPUT_LIMIT,
        )))
    }
}

/// Drops the scratch directory prefix from compiler messages.
fn strip_scratch_dir(report: &str, dir: &Path) -> String {
    let prefix = format!("{}{}", dir.display(), std::path::MAIN_SEPARATOR);
    report.replace(&prefix, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_paths_are_hidden_from_players() {
        let dir = Path::new("/tmp/tokanagrammar-abc");
        let report = format!(
            "{}{}Hello.java:3: error: ';' expected\n1 error\n",
            dir.display(),
            std::path::MAIN_SEPARATOR
        );
        assert_eq!(
            strip_scratch_dir(&report, dir),
            "Hello.java:3: error: ';' expected\n1 error\n"
        );
    }
}
