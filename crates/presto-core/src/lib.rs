//! Presto Core - Shared library for the presto project scaffolder
//!
//! This library creates new JavaScript projects from presets: it checks the
//! target directory, materializes a preset, writes `package.json`, installs
//! dependencies with npm, yarn, or pnpm, and initializes a git repository.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Collaborators** - Preset fetching and copying, the dependency
//!   installer, the environment probe, and git commands
//! - **Layer 2: Orchestration** - [`Creator`] drives one creation through its
//!   states and emits [`CreationEvent`]s; every prompt goes through
//!   [`Interaction`]
//! - **Layer 3: CLI/TUI Interface** - Optional cliclack-based prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based [`Interaction`] and the `run` entry points
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use presto_core::{create_project, Collaborators, CreationOptions, CreationRequest};
//!
//! let request = CreationRequest::resolve("demo-app", &cwd, CreationOptions::default())?;
//! let deps = Collaborators::system(&MyConfig, my_ui, progress, cwd.clone())?;
//! let outcome = create_project(request, deps, "my project".into()).await?;
//! ```

pub mod creator;
pub mod error;
pub mod install;
pub mod interact;
pub mod negotiate;
pub mod options;
pub mod page;
pub mod preset;
pub mod product;
pub mod runtime;
pub mod vcs;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use creator::{
    create_project, Collaborators, CreationEvent, CreationOutcome, CreationState, Creator,
};
pub use error::{CreateError, Result};
pub use install::{DependencyInstaller, InstallProgress, PackageManager};
pub use interact::{Interaction, OverwriteChoice};
pub use options::{CreationOptions, CreationRequest, GitOption};
pub use page::PageCreator;
pub use preset::{Preset, PresetFetcher};
pub use product::ProductConfig;
pub use runtime::{Environment, SystemEnvironment};

#[cfg(feature = "tui")]
pub use tui::{run, run_page};
