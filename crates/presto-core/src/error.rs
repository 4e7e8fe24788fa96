//! Error types for project creation

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using presto-core's error type
pub type Result<T> = std::result::Result<T, CreateError>;

/// Everything that can stop (or, for commits, degrade) a project creation
#[derive(Error, Debug)]
pub enum CreateError {
    /// Project name is not a valid package name
    #[error("Invalid project name \"{name}\":\n{}", format_problems(.problems))]
    Validation { name: String, problems: Vec<String> },

    /// Preset could not be resolved by name
    #[error("Preset \"{name}\" not found")]
    PresetNotFound { name: String },

    /// Preset download or clone failed
    #[error("Failed fetching remote preset {name}: {message}")]
    Fetch { name: String, message: String },

    /// Copying or writing project files failed
    #[error("Failed to write project files into {}: {message}", .path.display())]
    Materialization { path: PathBuf, message: String },

    /// Package manager name outside the supported set
    #[error("Unknown package manager: {0}")]
    UnsupportedPackageManager(String),

    /// Dependency install exited unsuccessfully
    #[error("command failed: {command} {}", .args.join(" "))]
    InstallFailure { command: String, args: Vec<String> },

    /// Initial commit failed; reported as a warning, never fatal
    #[error("git commit failed: {0}")]
    VcsCommitFailure(String),

    /// Interactive prompt was cancelled or could not be shown
    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CreateError {
    pub fn materialization(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Materialization {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn fetch(name: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Fetch {
            name: name.into(),
            message: err.to_string(),
        }
    }

    /// Whether the creation must stop when this error occurs
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CreateError::VcsCommitFailure(_))
    }
}

fn format_problems(problems: &[String]) -> String {
    problems
        .iter()
        .map(|p| format!("  - {}", p))
        .collect::<Vec<_>>()
        .join("\n")
}
