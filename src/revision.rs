//! Revision lookup: the commit the code under test was built from.

use std::{
    io,
    path::{Path, PathBuf},
    process::Command,
};

/// Errors resolving the current revision.
#[derive(Debug, thiserror::Error)]
pub enum RevisionError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] io::Error),

    #[error("no git revision found from {}: {stderr}", dir.display())]
    NotARepository { dir: PathBuf, stderr: String },

    #[error("git returned an empty revision in {}", dir.display())]
    Empty { dir: PathBuf },
}

/// Full hash of `HEAD` for the repository containing `dir`.
///
/// Git searches `dir` and its ancestors for the repository.
pub fn current_revision(dir: &Path) -> Result<String, RevisionError> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["rev-parse", "HEAD"])
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(RevisionError::NotARepository {
            dir: dir.to_path_buf(),
            stderr,
        });
    }

    let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if sha.is_empty() {
        return Err(RevisionError::Empty {
            dir: dir.to_path_buf(),
        });
    }
    Ok(sha)
}

/// First eight characters of a revision, for display.
pub fn short(revision: &str) -> &str {
    revision
        .char_indices()
        .nth(8)
        .map_or(revision, |(end, _)| &revision[..end])
}
