#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{ffi::OsString, path::PathBuf};

use anyhow::{Context, Result};
use which::which;

/// Finds and returns the path to the javac binary.
pub fn javac_path() -> Result<OsString> {
    which("javac")
        .map(PathBuf::into_os_string)
        .context("Cannot find a Java Compiler on path (javac)")
}

/// Finds and returns the path to the java binary.
pub fn java_path() -> Result<OsString> {
    which("java")
        .map(PathBuf::into_os_string)
        .context("Cannot find a Java runtime on path (java)")
}

/// True when both `javac` and `java` can be found.
pub fn toolchain_available() -> bool {
    javac_path().is_ok() && java_path().is_ok()
}

/// The last segment of a possibly package-qualified class name; this is what
/// the source file has to be called.
pub fn simple_class_name(class_name: &str) -> &str {
    class_name.rsplit('.').next().unwrap_or(class_name)
}
