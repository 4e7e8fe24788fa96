//! Project creation orchestration
//!
//! [`Creator`] walks one project through a fixed sequence of states:
//!
//! ```text
//! ResolvingPreset -> CollectingMetadata -> MaterializingFiles
//!   -> WritingPackageDescriptor -> SelectingPackageManager -> InstallingDeps
//!   -> (InitializingVcs -> StagingAndCommitting)? -> Done
//! ```
//!
//! Any fatal error stops the sequence. Completed steps are not rolled back.
//! A failed initial commit is reported as a warning after success.

use crate::error::{CreateError, Result};
use crate::install::{DependencyInstaller, InstallProgress, PackageManager, RegistryMirrorPolicy};
use crate::interact::Interaction;
use crate::negotiate::{negotiate_target_directory, Negotiation};
use crate::options::CreationRequest;
use crate::preset::copier::{render_package_descriptor, PACKAGE_FILE};
use crate::preset::{
    builtin_default_preset, copy_preset, generate_readme, write_file_tree, Preset, PresetFetcher,
    RegistryPresetFetcher, DEFAULT_PRESET,
};
use crate::product::ProductConfig;
use crate::runtime::{Environment, SystemEnvironment};
use crate::vcs::{should_init_vcs, CommandRunner, Git, TokioCommandRunner};
use colored::Colorize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Default version offered in the metadata prompt
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Lifecycle notifications for progress UIs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationEvent {
    Creating,
    FetchRemotePreset,
    GitInit,
    Done,
}

impl CreationEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreationEvent::Creating => "creating",
            CreationEvent::FetchRemotePreset => "fetch-remote-preset",
            CreationEvent::GitInit => "git-init",
            CreationEvent::Done => "done",
        }
    }
}

/// Where a creation currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationState {
    Pending,
    ResolvingPreset,
    CollectingMetadata,
    MaterializingFiles,
    WritingPackageDescriptor,
    SelectingPackageManager,
    InstallingDeps,
    InitializingVcs,
    StagingAndCommitting,
    Done,
}

/// Result of a successful creation
#[derive(Debug)]
pub struct CreationOutcome {
    pub package_manager: PackageManager,
    pub vcs_initialized: bool,
    /// Set when the project was created but the initial commit was not
    pub commit_warning: Option<CreateError>,
}

/// Everything the creation flow talks to
#[derive(Clone)]
pub struct Collaborators {
    pub ui: Arc<dyn Interaction>,
    pub fetcher: Arc<dyn PresetFetcher>,
    pub env: Arc<dyn Environment>,
    pub installer: Arc<DependencyInstaller>,
    pub progress: Arc<dyn InstallProgress>,
    pub commands: Arc<dyn CommandRunner>,
}

impl Collaborators {
    /// Real implementations for a product; relative preset paths resolve
    /// against `base_dir`
    pub fn system<C: ProductConfig>(
        config: &C,
        ui: Arc<dyn Interaction>,
        progress: Arc<dyn InstallProgress>,
        base_dir: PathBuf,
    ) -> Result<Self> {
        let fetcher = RegistryPresetFetcher::from_config(config, base_dir)?;
        let mirror = RegistryMirrorPolicy::from_env(config.user_agent());
        Ok(Self {
            ui,
            fetcher: Arc::new(fetcher),
            env: Arc::new(SystemEnvironment::new()),
            installer: Arc::new(DependencyInstaller::system(Arc::new(mirror))),
            progress,
            commands: Arc::new(TokioCommandRunner),
        })
    }
}

/// Check the target directory, then run the creation.
///
/// Returns `Ok(None)` when the user declined to touch an existing
/// directory; nothing has been written in that case.
pub async fn create_project(
    request: CreationRequest,
    deps: Collaborators,
    default_description: String,
) -> Result<Option<CreationOutcome>> {
    let negotiation = negotiate_target_directory(
        &request.target_directory,
        request.options.force,
        request.in_current_directory,
        deps.ui.as_ref(),
    )
    .await?;

    if negotiation == Negotiation::Abort {
        info!("creation aborted by user");
        return Ok(None);
    }

    let mut creator = Creator::new(request, deps).with_default_description(default_description);
    creator.create().await.map(Some)
}

/// Runs one project creation
pub struct Creator {
    request: CreationRequest,
    deps: Collaborators,
    events: broadcast::Sender<CreationEvent>,
    state: CreationState,
    default_description: String,
}

impl Creator {
    pub fn new(request: CreationRequest, deps: Collaborators) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            request,
            deps,
            events,
            state: CreationState::Pending,
            default_description: "project created by presto".to_string(),
        }
    }

    pub fn with_default_description(mut self, description: impl Into<String>) -> Self {
        self.default_description = description.into();
        self
    }

    /// Receive lifecycle events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<CreationEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> CreationState {
        self.state
    }

    /// Run every step. Any spinner is stopped before an error is returned.
    pub async fn create(&mut self) -> Result<CreationOutcome> {
        let result = self.run().await;
        if let Err(e) = &result {
            self.deps.ui.stop_step("");
            debug!(state = ?self.state, error = %e, "creation failed");
        }
        result
    }

    async fn run(&mut self) -> Result<CreationOutcome> {
        let ui = Arc::clone(&self.deps.ui);
        let target_dir = self.request.target_directory.clone();

        self.enter(CreationState::ResolvingPreset);
        let preset_name = self
            .request
            .options
            .preset
            .clone()
            .unwrap_or_else(|| DEFAULT_PRESET.to_string());
        let use_clone = self.request.options.clone;
        let preset = self.resolve_preset(&preset_name, use_clone).await?;

        ui.start_step(&format!(
            "Creating project in {}.",
            target_dir.display().to_string().yellow()
        ));
        self.emit(CreationEvent::Creating);
        ui.stop_step("Project directory ready");

        self.enter(CreationState::CollectingMetadata);
        let version = ui.input("Project version", DEFAULT_VERSION)?;
        let description = ui.input("Project description", &self.default_description)?;

        self.enter(CreationState::MaterializingFiles);
        let mut pkg = copy_preset(preset.source_dir(), &preset.target_dir).await?;
        // Temporary preset files are no longer needed
        drop(preset);
        pkg.insert(
            "name".to_string(),
            Value::String(self.request.project_name.clone()),
        );
        pkg.insert("version".to_string(), Value::String(version));
        pkg.insert("description".to_string(), Value::String(description));

        self.enter(CreationState::WritingPackageDescriptor);
        ui.start_step(&format!("Writing {} and template files", PACKAGE_FILE.yellow()));
        write_file_tree(&target_dir, &[(PACKAGE_FILE, render_package_descriptor(&pkg)?)]).await?;

        self.enter(CreationState::SelectingPackageManager);
        let package_manager = PackageManager::detect(self.deps.env.as_ref());
        info!(%package_manager, "selected package manager");
        write_file_tree(
            &target_dir,
            &[("README.md", generate_readme(&pkg, package_manager))],
        )
        .await?;
        ui.stop_step("Project files written");

        self.enter(CreationState::InstallingDeps);
        ui.start_step("Installing dependencies");
        self.deps
            .installer
            .install(
                &target_dir,
                package_manager.command(),
                self.request.options.registry.as_deref(),
                self.deps.progress.as_ref(),
            )
            .await?;
        ui.stop_step("Dependencies installed");

        let mut vcs_initialized = false;
        let mut commit_warning = None;
        if should_init_vcs(self.deps.env.as_ref(), &self.request.options, &target_dir) {
            self.enter(CreationState::InitializingVcs);
            ui.start_step("Initializing git repository");
            self.emit(CreationEvent::GitInit);
            let commands = Arc::clone(&self.deps.commands);
            let git = Git::new(commands.as_ref(), &target_dir);

            match git.init().await {
                Ok(out) if out.success => {
                    vcs_initialized = true;
                    self.enter(CreationState::StagingAndCommitting);
                    commit_warning = self.commit(&git).await.err();
                    ui.stop_step("Git repository initialized");
                }
                Ok(out) => {
                    ui.stop_step("Git repository not initialized");
                    warn!(stderr = %out.stderr, "git init failed");
                    ui.warn(&format!("git init failed: {}", out.stderr));
                }
                Err(e) => {
                    ui.stop_step("Git repository not initialized");
                    warn!(error = %e, "git init failed");
                    ui.warn(&format!("git init failed: {}", e));
                }
            }
        }

        self.enter(CreationState::Done);
        ui.success(&format!(
            "Successfully created project {}.",
            self.request.project_name.yellow()
        ));
        if !self.request.options.skip_get_started {
            ui.note(&self.next_steps(package_manager));
        }
        self.emit(CreationEvent::Done);

        if let Some(warning) = &commit_warning {
            ui.warn(&format!(
                "{}\nSkipped the initial commit. Check your git user.name and user.email, then commit manually.",
                warning
            ));
        }

        Ok(CreationOutcome {
            package_manager,
            vcs_initialized,
            commit_warning,
        })
    }

    /// Resolve `name` through the fetch collaborator
    ///
    /// The literal "default" falls back to the built-in preset when nothing
    /// else provides it; any other unresolved name is an error.
    async fn resolve_preset(&self, name: &str, clone: bool) -> Result<Preset> {
        let ui = &self.deps.ui;
        ui.start_step(&format!("Fetching remote preset {}...", name.cyan()));
        self.emit(CreationEvent::FetchRemotePreset);

        let fetched = self
            .deps
            .fetcher
            .fetch(name, &self.request.target_directory, clone)
            .await;
        ui.stop_step("");

        let preset = match fetched {
            Ok(preset) => preset,
            Err(e) => {
                ui.error(&format!("Failed fetching remote preset {}:", name.cyan()));
                return Err(e);
            }
        };

        match preset {
            Some(preset) => Ok(preset),
            None if name == DEFAULT_PRESET => {
                debug!("using built-in default preset");
                builtin_default_preset(&self.request.target_directory).await
            }
            None => Err(CreateError::PresetNotFound {
                name: name.to_string(),
            }),
        }
    }

    async fn commit(&self, git: &Git<'_>) -> Result<()> {
        match git.stage_all().await {
            Ok(out) if out.success => {}
            Ok(out) => return Err(CreateError::VcsCommitFailure(out.stderr)),
            Err(e) => return Err(CreateError::VcsCommitFailure(e.to_string())),
        }

        let message = self.request.options.git.commit_message();
        git.commit(message).await.map_err(|stderr| {
            warn!(%stderr, "initial commit failed");
            CreateError::VcsCommitFailure(stderr)
        })
    }

    fn next_steps(&self, package_manager: PackageManager) -> Vec<String> {
        let mut steps = vec!["Get started with the following commands:".to_string(), String::new()];
        if !self.request.in_current_directory {
            steps.push(format!(
                " {} {}",
                "$".dimmed(),
                format!("cd {}", self.request.project_name).cyan()
            ));
        }
        steps.push(format!(
            " {} {}",
            "$".dimmed(),
            package_manager.start_command().cyan()
        ));
        steps
    }

    fn enter(&mut self, state: CreationState) {
        debug!(from = ?self.state, to = ?state, "creation state");
        self.state = state;
    }

    fn emit(&self, event: CreationEvent) {
        debug!(event = event.as_str(), "creation event");
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
