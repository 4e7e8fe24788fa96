//! Presto CLI - Project scaffolding from presets

use anyhow::Result;
use clap::{ArgAction, CommandFactory, FromArgMatches, Parser, Subcommand};
use colored::Colorize;
use presto_core::tui::CreateArgs;
use presto_core::{CreationOptions, GitOption, ProductConfig};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Presto product configuration
#[derive(Clone)]
pub struct PrestoConfig;

impl ProductConfig for PrestoConfig {
    fn name(&self) -> &'static str {
        "presto"
    }

    fn display_name(&self) -> &'static str {
        "Presto"
    }

    fn cli_description(&self) -> &'static str {
        "CLI for creating JavaScript projects from presets"
    }

    fn preset_registry_env(&self) -> &'static str {
        "PRESTO_PRESETS"
    }

    fn user_agent(&self) -> &'static str {
        concat!("presto/", env!("CARGO_PKG_VERSION"))
    }
}

#[derive(Parser, Debug)]
#[command(name = "presto")]
#[command(version)]
pub struct Args {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new project
    Create(CliCreateArgs),
    /// Add a page (component, store, io, styles) to the current project
    Page(PageArgs),
}

#[derive(Parser, Debug)]
pub struct CliCreateArgs {
    /// Project name; "." creates the project in the current directory
    #[arg(required = true, num_args = 1..)]
    pub names: Vec<String>,

    /// Named preset to use instead of the default one
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Use the default preset
    #[arg(short, long)]
    pub default: bool,

    /// Overwrite the target directory if it exists
    #[arg(short, long)]
    pub force: bool,

    /// Initialize git with an optional initial commit message
    #[arg(short, long, num_args = 0..=1, value_name = "MESSAGE")]
    pub git: Option<Option<String>>,

    /// Skip git initialization
    #[arg(short = 'n', long = "no-git", conflicts_with = "git")]
    pub no_git: bool,

    /// Initialize git even inside an existing repository
    #[arg(long = "force-git")]
    pub force_git: bool,

    /// Package registry URL used when installing dependencies
    #[arg(short, long)]
    pub registry: Option<String>,

    /// Fetch remote presets with git clone
    #[arg(short, long)]
    pub clone: bool,

    /// Do not print the get-started instructions
    #[arg(long = "skip-get-started")]
    pub skip_get_started: bool,

    /// Directory to create the project in (defaults to the current directory)
    #[arg(long)]
    pub cwd: Option<PathBuf>,
}

impl CliCreateArgs {
    fn git_option(&self) -> GitOption {
        if self.no_git {
            return GitOption::Disabled;
        }
        match &self.git {
            None => GitOption::Default,
            Some(value) => GitOption::from_flag_value(value.as_deref()),
        }
    }
}

impl From<CliCreateArgs> for CreateArgs {
    fn from(args: CliCreateArgs) -> Self {
        let git = args.git_option();
        CreateArgs {
            name: args.names.into_iter().next().unwrap_or_default(),
            cwd: args.cwd,
            options: CreationOptions {
                preset: args.preset,
                default: args.default,
                force: args.force,
                git,
                force_git: args.force_git,
                registry: args.registry,
                clone: args.clone,
                skip_get_started: args.skip_get_started,
            },
        }
    }
}

#[derive(Parser, Debug)]
pub struct PageArgs {
    /// Page name; the folder and component use it with a capital first letter
    pub name: String,

    /// Directory the page folder is created in
    #[arg(long)]
    pub cwd: Option<PathBuf>,
}

/// Command line definition with product branding applied
fn cli(config: &PrestoConfig) -> clap::Command {
    Args::command().about(config.cli_description())
}

/// Initialize tracing; `RUST_LOG` wins over `-v`
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        // Keep diagnostics out of the prompts unless asked for
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn dispatch(config: &PrestoConfig, command: Command) -> Result<()> {
    debug!(?command, "dispatching");
    match command {
        Command::Create(create_args) => {
            if create_args.names.len() > 1 {
                println!(
                    "{}",
                    "Info: You provided more than one argument. The first one will be used as the app's name, the rest are ignored."
                        .yellow()
                );
            }
            presto_core::run(config, create_args.into()).await
        }
        Command::Page(page_args) => presto_core::run_page(&page_args.name, page_args.cwd).await,
    }
}

#[tokio::main]
async fn main() {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let config = PrestoConfig;
    let args = Args::from_arg_matches(&cli(&config).get_matches()).unwrap_or_else(|e| e.exit());
    init_tracing(args.verbose);

    let result = dispatch(&config, args.command).await;

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
