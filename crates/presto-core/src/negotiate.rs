//! Deciding whether the target directory may be used

use crate::error::{CreateError, Result};
use crate::interact::{Interaction, OverwriteChoice};
use colored::Colorize;
use std::path::Path;
use tracing::info;

/// Outcome of the target directory check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negotiation {
    Proceed,
    /// The user declined; stop quietly without side effects
    Abort,
}

/// Decide what happens to an existing `target_dir` before any file is written
///
/// - `force`: remove whatever is inside and proceed without asking
/// - missing directory: proceed
/// - current directory: ask to generate in place
/// - anything else: ask to overwrite (emptying the directory) or cancel
pub async fn negotiate_target_directory(
    target_dir: &Path,
    force: bool,
    in_current_directory: bool,
    ui: &dyn Interaction,
) -> Result<Negotiation> {
    if force {
        remove_existing(target_dir).await?;
        return Ok(Negotiation::Proceed);
    }

    if !target_dir.exists() {
        return Ok(Negotiation::Proceed);
    }

    if in_current_directory {
        let ok = ui.confirm("Generate project in current directory?", true)?;
        return Ok(if ok {
            Negotiation::Proceed
        } else {
            Negotiation::Abort
        });
    }

    let message = format!(
        "Target directory {} already exists. Pick an action:",
        target_dir.display().to_string().cyan()
    );
    match ui.choose_overwrite(&message)? {
        OverwriteChoice::Overwrite => {
            ui.info(&format!("Removing {}...", target_dir.display()));
            remove_existing(target_dir).await?;
            Ok(Negotiation::Proceed)
        }
        OverwriteChoice::Cancel => Ok(Negotiation::Abort),
    }
}

/// Empty `target_dir`, keeping the directory itself (it may be `cwd`)
async fn remove_existing(target_dir: &Path) -> Result<()> {
    let metadata = match tokio::fs::symlink_metadata(target_dir).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(CreateError::Io(e)),
    };

    info!(dir = %target_dir.display(), "removing existing target contents");
    if !metadata.is_dir() {
        tokio::fs::remove_file(target_dir).await?;
        return Ok(());
    }

    let mut entries = tokio::fs::read_dir(target_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            tokio::fs::remove_dir_all(entry.path()).await?;
        } else {
            tokio::fs::remove_file(entry.path()).await?;
        }
    }
    Ok(())
}
