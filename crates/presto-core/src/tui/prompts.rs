//! Charm-style CLI prompts using cliclack

use crate::creator::{create_project, Collaborators, CreationOutcome};
use crate::error::{CreateError, Result as CreateResult};
use crate::install::progress::TerminalProgress;
use crate::interact::{Interaction, OverwriteChoice};
use crate::options::{CreationOptions, CreationRequest};
use crate::page::PageCreator;
use crate::product::ProductConfig;
use anyhow::Result;
use cliclack::ProgressBar;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// CLI arguments for the create command
#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    /// Project name as typed; "." creates the project in `cwd`
    pub name: String,

    /// Working directory; the process directory when absent
    pub cwd: Option<PathBuf>,

    pub options: CreationOptions,
}

fn prompt_error(e: std::io::Error) -> CreateError {
    CreateError::Prompt(e.to_string())
}

/// [`Interaction`] backed by cliclack prompts and a single spinner
#[derive(Default)]
pub struct CliclackInteraction {
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliclackInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    fn take_spinner(&self) -> Option<ProgressBar> {
        self.spinner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }
}

impl Interaction for CliclackInteraction {
    fn confirm(&self, message: &str, default: bool) -> CreateResult<bool> {
        cliclack::confirm(message)
            .initial_value(default)
            .interact()
            .map_err(prompt_error)
    }

    fn input(&self, message: &str, default: &str) -> CreateResult<String> {
        cliclack::input(message)
            .placeholder(default)
            .default_input(default)
            .interact()
            .map_err(prompt_error)
    }

    fn choose_overwrite(&self, message: &str) -> CreateResult<OverwriteChoice> {
        cliclack::select(message)
            .item(OverwriteChoice::Overwrite, "Overwrite", "remove existing files")
            .item(OverwriteChoice::Cancel, "Cancel", "")
            .interact()
            .map_err(prompt_error)
    }

    fn start_step(&self, message: &str) {
        let mut slot = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.take() {
            previous.stop("");
        }
        let spinner = cliclack::spinner();
        spinner.start(message);
        *slot = Some(spinner);
    }

    fn stop_step(&self, message: &str) {
        if let Some(spinner) = self.take_spinner() {
            if message.is_empty() {
                spinner.clear();
            } else {
                spinner.stop(message);
            }
        }
    }

    fn info(&self, message: &str) {
        let _ = cliclack::log::info(message);
    }

    fn warn(&self, message: &str) {
        let _ = cliclack::log::warning(message);
    }

    fn success(&self, message: &str) {
        let _ = cliclack::log::success(message);
    }

    fn error(&self, message: &str) {
        let _ = cliclack::log::error(message);
    }

    fn note(&self, lines: &[String]) {
        println!();
        for line in lines {
            println!("  {}", line);
        }
        println!();
    }
}

fn resolve_cwd(cwd: Option<PathBuf>) -> Result<PathBuf> {
    let current = std::env::current_dir()?;
    Ok(match cwd {
        Some(dir) if dir.is_absolute() => dir,
        Some(dir) => current.join(dir),
        None => current,
    })
}

/// Run the create command with interactive prompts
pub async fn run<C: ProductConfig>(config: &C, args: CreateArgs) -> Result<()> {
    cliclack::intro(config.display_name())?;

    let cwd = resolve_cwd(args.cwd)?;
    // Validation problems are listed once, by the caller's error report
    let request = CreationRequest::resolve(&args.name, &cwd, args.options)?;

    let ui = Arc::new(CliclackInteraction::new());
    let deps = Collaborators::system(
        config,
        ui.clone(),
        Arc::new(TerminalProgress::new()),
        cwd,
    )?;

    match create_project(request, deps, config.default_description()).await {
        Ok(outcome) => {
            if let Some(message) = outro_message(outcome.as_ref()) {
                cliclack::outro(message)?;
            }
            Ok(())
        }
        Err(e) => {
            ui.stop_step("");
            Err(e.into())
        }
    }
}

/// Closing line for a finished run; a declined directory ends silently
fn outro_message(outcome: Option<&CreationOutcome>) -> Option<&'static str> {
    outcome.map(|_| "Happy coding!")
}

/// Run the page command: add a page folder under `cwd`
pub async fn run_page(name: &str, cwd: Option<PathBuf>) -> Result<()> {
    let cwd = resolve_cwd(cwd)?;
    let creator = PageCreator::new(name, &cwd);

    let spinner = cliclack::spinner();
    spinner.start(format!("Creating page {}...", name.cyan()));
    match creator.create().await {
        Ok(files) => {
            spinner.stop(format!(
                "Created {} files in {}",
                files.len(),
                creator.page_dir().display()
            ));
            Ok(())
        }
        Err(e) => {
            spinner.error(format!("Failed creating page {}", name));
            Err(e.into())
        }
    }
}
