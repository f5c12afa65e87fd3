//! Output file handling
//!
//! Overwrite checks run before any tile is requested, so a refused overwrite
//! costs no network traffic.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::core::config::OverwriteBehavior;
use crate::core::error::{Error, Result};

/// Decide whether `path` may be written, asking on the terminal if needed
pub fn check_overwrite_permission(path: &Path, behavior: OverwriteBehavior) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    match behavior {
        OverwriteBehavior::Force => {
            warn!("Overwriting existing file: {}", path.display());
            Ok(())
        }
        OverwriteBehavior::NeverOverwrite => Err(Error::IoError(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("File already exists: {} (use --force to overwrite)", path.display()),
        ))),
        OverwriteBehavior::Prompt => {
            eprintln!("⚠️  File already exists: {}", path.display());
            eprint!("Overwrite? [y/N]: ");
            std::io::stderr().flush()?;

            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;

            match input.trim().to_lowercase().as_str() {
                "y" | "yes" => Ok(()),
                _ => Err(Error::IoError(std::io::Error::new(
                    std::io::ErrorKind::Interrupted,
                    "Map build cancelled by user",
                ))),
            }
        }
    }
}

/// Write every `(path, contents)` pair, or none of them
///
/// Each file is staged under a sibling temporary name first. Renaming into
/// place starts only once all of them are staged, and any failure removes
/// the staged files. Renames already done are not rolled back.
pub async fn write_outputs(files: &[(&Path, &[u8])]) -> Result<()> {
    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(files.len());

    for &(path, contents) in files {
        let temp = staging_path(path);
        if let Err(source) = tokio::fs::write(&temp, contents).await {
            discard(&staged).await;
            return Err(Error::OutputWriteFailed {
                path: path.to_path_buf(),
                source,
            });
        }
        staged.push((temp, path));
    }

    for (index, (temp, path)) in staged.iter().enumerate() {
        if let Err(source) = tokio::fs::rename(temp, path).await {
            discard(&staged[index..]).await;
            return Err(Error::OutputWriteFailed {
                path: path.to_path_buf(),
                source,
            });
        }
        debug!("Moved {} into place", path.display());
    }

    Ok(())
}

/// Hidden temporary next to `path`, so the final rename stays on one filesystem
fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}

async fn discard(staged: &[(PathBuf, &Path)]) {
    for (temp, _) in staged {
        if let Err(err) = tokio::fs::remove_file(temp).await {
            warn!("Could not remove {}: {}", temp.display(), err);
        }
    }
}
