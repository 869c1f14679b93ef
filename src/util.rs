#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;

/// A glob utility function to find paths to files with certain extension
///
/// * `extension`: the file extension to find paths for
/// * `search_depth`: how many folders deep to search for
/// * `root_dir`: the root directory where search starts
pub fn find_files(extension: &str, search_depth: i8, root_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pattern = root_dir.to_path_buf();

    for _ in 0..search_depth {
        pattern.push("**");
    }

    pattern.push(format!("*.{extension}"));
    let pattern = pattern
        .to_str()
        .context("Could not convert root_dir to string")?
        .to_string();

    let mut found: Vec<PathBuf> = glob(&pattern)
        .context("Could not create glob")?
        .filter_map(Result::ok)
        .collect();
    found.sort();
    found.dedup();

    Ok(found)
}

/// Truncates `content` to `limit` bytes on a line boundary, appending a notice
/// when something was cut.
pub fn truncate_with_notice(content: &str, limit: usize) -> String {
    if content.len() <= limit {
        return content.to_string();
    }

    let mut end = limit;
    while end > 0 && !content.is_char_boundary(end) {
        end -= 1;
    }

    let mut truncated = content[..end].to_string();
    if let Some(index) = truncated.rfind('\n') {
        truncated.truncate(index);
    }

    truncated.push_str("\n...[TRUNCATED]");
    truncated
}
