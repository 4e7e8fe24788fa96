//! Git repository initialization for new projects

use crate::options::CreationOptions;
use crate::runtime::Environment;
use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command as TokioCommand;
use tracing::debug;

/// Output of a finished command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub stderr: String,
}

/// Runs short-lived commands in a working directory
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[&str], cwd: &Path) -> io::Result<CommandOutput>;
}

/// Runs commands as real subprocesses
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str], cwd: &Path) -> io::Result<CommandOutput> {
        debug!(program, ?args, cwd = %cwd.display(), "running command");
        let output = TokioCommand::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;
        Ok(CommandOutput {
            success: output.status.success(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Whether to run `git init` for a project in `target_dir`
///
/// Never without git. `force_git` wins over everything else; otherwise an
/// explicit opt-out or an enclosing repository skips initialization.
pub fn should_init_vcs(env: &dyn Environment, options: &CreationOptions, target_dir: &Path) -> bool {
    if !env.has_git() {
        return false;
    }
    if options.force_git {
        return true;
    }
    if options.git.is_disabled() {
        return false;
    }
    !env.has_project_git(target_dir)
}

/// Git operations against one project directory
pub struct Git<'a> {
    runner: &'a dyn CommandRunner,
    dir: &'a Path,
}

impl<'a> Git<'a> {
    pub fn new(runner: &'a dyn CommandRunner, dir: &'a Path) -> Self {
        Self { runner, dir }
    }

    pub async fn init(&self) -> io::Result<CommandOutput> {
        self.runner.run("git", &["init"], self.dir).await
    }

    pub async fn stage_all(&self) -> io::Result<CommandOutput> {
        self.runner.run("git", &["add", "-A"], self.dir).await
    }

    /// Commit staged files. A failure (for example an unset author
    /// identity) is returned as the error message.
    pub async fn commit(&self, message: &str) -> Result<(), String> {
        match self.runner.run("git", &["commit", "-m", message], self.dir).await {
            Ok(out) if out.success => Ok(()),
            Ok(out) => Err(out.stderr),
            Err(e) => Err(e.to_string()),
        }
    }
}
