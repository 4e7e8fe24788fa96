//! Dependency installation
//!
//! This module provides:
//! - Package manager profiles and selection (yarn > pnpm 3+ > npm)
//! - Install argument construction, including registry overrides
//! - The install subprocess with yarn output parsing and progress reporting
//! - Settlement of the two completion signals into one result

pub mod mirror;
pub mod process;
pub mod profile;
pub mod progress;

use crate::error::{CreateError, Result};
use mirror::{MirrorPolicy, MIRROR_DIST_URL, MIRROR_REGISTRY};
use process::{SettleCell, SpawnedProcess, Spawner, TokioSpawner};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use mirror::{FixedMirrorPolicy, MirrorMode, RegistryMirrorPolicy};
pub use process::{Completion, CompletionKind};
pub use profile::{PackageManager, PackageManagerProfile};
pub use progress::{InstallProgress, NoProgress, TerminalProgress};

/// Install arguments: the manager's template plus at most one registry override
pub fn build_install_args(
    package_manager: PackageManager,
    registry: Option<&str>,
    use_mirror: bool,
) -> Vec<String> {
    let mut args: Vec<String> = package_manager
        .profile()
        .install_deps
        .iter()
        .map(|s| s.to_string())
        .collect();

    let alt_registry = registry.or(use_mirror.then_some(MIRROR_REGISTRY));
    if let Some(alt) = alt_registry {
        args.push(format!("--registry={}", alt));
        if alt == MIRROR_REGISTRY {
            args.push(format!("--disturl={}", MIRROR_DIST_URL));
        }
    }

    args
}

/// Runs `<package manager> install` in a project directory
pub struct DependencyInstaller {
    spawner: Arc<dyn Spawner>,
    mirror: Arc<dyn MirrorPolicy>,
}

impl DependencyInstaller {
    pub fn new(spawner: Arc<dyn Spawner>, mirror: Arc<dyn MirrorPolicy>) -> Self {
        Self { spawner, mirror }
    }

    /// Installer spawning real processes with the given mirror policy
    pub fn system(mirror: Arc<dyn MirrorPolicy>) -> Self {
        Self::new(Arc::new(TokioSpawner), mirror)
    }

    /// Install dependencies in `target_dir`.
    ///
    /// Fails with `UnsupportedPackageManager` before spawning anything when
    /// the name is unknown, and with `InstallFailure` when the process does
    /// not exit with code 0.
    pub async fn install(
        &self,
        target_dir: &Path,
        package_manager: &str,
        registry: Option<&str>,
        progress: &dyn InstallProgress,
    ) -> Result<()> {
        let package_manager: PackageManager = package_manager.parse()?;

        let use_mirror =
            registry.is_none() && self.mirror.should_use_mirror(package_manager).await;
        let args = build_install_args(package_manager, registry, use_mirror);
        let command = package_manager.command().to_string();
        let failure = || CreateError::InstallFailure {
            command: command.clone(),
            args: args.clone(),
        };

        progress.reset();
        info!(command = %command, ?args, dir = %target_dir.display(), "installing dependencies");

        let intercept_stderr = package_manager == PackageManager::Yarn;
        let process = self
            .spawner
            .spawn(&command, &args, target_dir, intercept_stderr)
            .map_err(|e| {
                warn!(error = %e, "failed to spawn {}", command);
                failure()
            })?;

        let succeeded = wait_for_settlement(process, progress).await;
        progress.reset();

        if succeeded {
            Ok(())
        } else {
            Err(failure())
        }
    }
}

/// Settle on the first completion signal, then keep forwarding diagnostics
/// until stderr ends or the close signal arrives. Later signals are fed to
/// the cell and ignored.
async fn wait_for_settlement(mut process: SpawnedProcess, progress: &dyn InstallProgress) -> bool {
    let cell = SettleCell::new();
    let mut stderr = process.stderr.take();
    let mut closed = false;

    while cell.get().is_none() {
        tokio::select! {
            line = next_line(&mut stderr) => match line {
                Some(line) => forward_line(&line, progress),
                None => stderr = None,
            },
            completion = process.completions.recv() => match completion {
                Some(completion) => {
                    debug!(?completion, "install settled");
                    closed = completion.kind == CompletionKind::Close;
                    cell.settle(completion.succeeded());
                }
                // Sender dropped without reporting; treat as failure
                None => {
                    closed = true;
                    cell.settle(false);
                }
            },
        }
    }

    // The exit signal can beat the last lines still in the pipe
    while !closed && stderr.is_some() {
        tokio::select! {
            line = next_line(&mut stderr) => match line {
                Some(line) => forward_line(&line, progress),
                None => stderr = None,
            },
            completion = process.completions.recv() => match completion {
                Some(completion) => {
                    closed = completion.kind == CompletionKind::Close;
                    if !cell.settle(completion.succeeded()) {
                        debug!(?completion, "ignoring completion after settlement");
                    }
                }
                None => closed = true,
            },
        }
    }

    // Close is only sent once the reader finished, so the rest is queued
    if let Some(rx) = stderr.as_mut() {
        while let Ok(line) = rx.try_recv() {
            forward_line(&line, progress);
        }
    }
    while let Ok(completion) = process.completions.try_recv() {
        if !cell.settle(completion.succeeded()) {
            debug!(?completion, "ignoring completion after settlement");
        }
    }

    cell.into_inner().unwrap_or(false)
}

async fn next_line(
    stderr: &mut Option<tokio::sync::mpsc::UnboundedReceiver<String>>,
) -> Option<String> {
    match stderr {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn forward_line(line: &str, progress: &dyn InstallProgress) {
    match progress::parse_yarn_line(line) {
        progress::YarnLine::Suppressed => {}
        progress::YarnLine::Progress { curr, total } => progress.update(curr, total),
        progress::YarnLine::Passthrough(line) => progress.log(&line),
    }
}
