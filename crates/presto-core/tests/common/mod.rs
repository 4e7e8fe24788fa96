//! Scripted collaborators for driving a creation without a terminal,
//! network, or subprocesses

#![allow(dead_code)]

use async_trait::async_trait;
use presto_core::install::process::{SpawnedProcess, Spawner};
use presto_core::install::{Completion, FixedMirrorPolicy, NoProgress};
use presto_core::preset::copier::read_package_descriptor;
use presto_core::vcs::{CommandOutput, CommandRunner};
use presto_core::{
    Collaborators, CreateError, DependencyInstaller, Environment, Interaction, OverwriteChoice,
    Preset, PresetFetcher, Result,
};
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Answers prompts from a script and records everything shown
pub struct ScriptedUi {
    pub confirm: bool,
    pub overwrite: OverwriteChoice,
    inputs: Mutex<VecDeque<String>>,
    pub questions: Mutex<Vec<String>>,
    pub warnings: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
    pub notes: Mutex<Vec<String>>,
}

impl ScriptedUi {
    pub fn new() -> Self {
        Self {
            confirm: true,
            overwrite: OverwriteChoice::Overwrite,
            inputs: Mutex::new(VecDeque::new()),
            questions: Mutex::new(Vec::new()),
            warnings: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            notes: Mutex::new(Vec::new()),
        }
    }

    pub fn overwrite(mut self, choice: OverwriteChoice) -> Self {
        self.overwrite = choice;
        self
    }

    /// Answers for `input` prompts, in order; the default is used once they run out
    pub fn inputs(self, answers: &[&str]) -> Self {
        *self.inputs.lock().unwrap() = answers.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

impl Interaction for ScriptedUi {
    fn confirm(&self, message: &str, _default: bool) -> Result<bool> {
        self.questions.lock().unwrap().push(message.to_string());
        Ok(self.confirm)
    }

    fn input(&self, message: &str, default: &str) -> Result<String> {
        self.questions.lock().unwrap().push(message.to_string());
        Ok(self
            .inputs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| default.to_string()))
    }

    fn choose_overwrite(&self, message: &str) -> Result<OverwriteChoice> {
        self.questions.lock().unwrap().push(message.to_string());
        Ok(self.overwrite)
    }

    fn start_step(&self, _message: &str) {}
    fn stop_step(&self, _message: &str) {}
    fn info(&self, _message: &str) {}

    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }

    fn success(&self, _message: &str) {}

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn note(&self, lines: &[String]) {
        self.notes.lock().unwrap().extend(lines.iter().cloned());
    }
}

/// What the scripted fetcher does when asked for a preset
pub enum FetchScript {
    NotFound,
    Local(PathBuf),
    Fail(String),
}

pub struct ScriptedFetcher {
    script: FetchScript,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new(script: FetchScript) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PresetFetcher for ScriptedFetcher {
    async fn fetch(&self, name: &str, target_dir: &Path, _clone: bool) -> Result<Option<Preset>> {
        self.calls.lock().unwrap().push(name.to_string());
        match &self.script {
            FetchScript::NotFound => Ok(None),
            FetchScript::Local(dir) => {
                let metadata = read_package_descriptor(dir).await?;
                Ok(Some(Preset::from_local(
                    name,
                    dir.clone(),
                    target_dir.to_path_buf(),
                    metadata,
                )))
            }
            FetchScript::Fail(message) => Err(CreateError::fetch(name, message)),
        }
    }
}

pub struct FakeEnv {
    pub yarn: bool,
    pub pnpm: bool,
    pub git: bool,
    pub in_repo: bool,
}

impl FakeEnv {
    /// npm only, git available, not inside a repository
    pub fn npm_with_git() -> Self {
        Self {
            yarn: false,
            pnpm: false,
            git: true,
            in_repo: false,
        }
    }
}

impl Environment for FakeEnv {
    fn has_yarn(&self) -> bool {
        self.yarn
    }
    fn has_pnpm3_or_later(&self) -> bool {
        self.pnpm
    }
    fn has_git(&self) -> bool {
        self.git
    }
    fn has_project_git(&self, _dir: &Path) -> bool {
        self.in_repo
    }
}

/// Records spawns and replays completion signals
pub struct ScriptedSpawner {
    completions: Vec<Completion>,
    pub calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl ScriptedSpawner {
    pub fn succeeding() -> Self {
        Self::new(vec![Completion::exit(Some(0), None), Completion::close(Some(0), None)])
    }

    pub fn new(completions: Vec<Completion>) -> Self {
        Self {
            completions,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Spawner for ScriptedSpawner {
    fn spawn(
        &self,
        program: &str,
        args: &[String],
        _cwd: &Path,
        intercept_stderr: bool,
    ) -> io::Result<SpawnedProcess> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));
        let (tx, rx) = mpsc::unbounded_channel();
        for completion in &self.completions {
            tx.send(completion.clone()).unwrap();
        }
        let stderr = intercept_stderr.then(|| mpsc::unbounded_channel().1);
        Ok(SpawnedProcess {
            stderr,
            completions: rx,
        })
    }
}

/// Records git invocations; the subcommand named in `fail` exits non-zero
pub struct RecordingCommands {
    fail: Option<&'static str>,
    pub calls: Mutex<Vec<Vec<String>>>,
}

impl RecordingCommands {
    pub fn new() -> Self {
        Self {
            fail: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(subcommand: &'static str) -> Self {
        Self {
            fail: Some(subcommand),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingCommands {
    async fn run(&self, program: &str, args: &[&str], _cwd: &Path) -> io::Result<CommandOutput> {
        let mut call = vec![program.to_string()];
        call.extend(args.iter().map(|a| a.to_string()));
        self.calls.lock().unwrap().push(call);

        if args.first().copied() == self.fail {
            return Ok(CommandOutput {
                success: false,
                stderr: "Please tell me who you are.".to_string(),
            });
        }
        Ok(CommandOutput {
            success: true,
            stderr: String::new(),
        })
    }
}

/// Handles on every scripted collaborator plus the bundle the creator uses
pub struct Harness {
    pub ui: Arc<ScriptedUi>,
    pub fetcher: Arc<ScriptedFetcher>,
    pub spawner: Arc<ScriptedSpawner>,
    pub commands: Arc<RecordingCommands>,
    pub deps: Collaborators,
}

impl Harness {
    pub fn new(
        ui: ScriptedUi,
        fetcher: ScriptedFetcher,
        env: FakeEnv,
        spawner: ScriptedSpawner,
        commands: RecordingCommands,
    ) -> Self {
        let ui = Arc::new(ui);
        let fetcher = Arc::new(fetcher);
        let spawner = Arc::new(spawner);
        let commands = Arc::new(commands);
        let installer = DependencyInstaller::new(spawner.clone(), Arc::new(FixedMirrorPolicy(false)));
        let deps = Collaborators {
            ui: ui.clone(),
            fetcher: fetcher.clone(),
            env: Arc::new(env),
            installer: Arc::new(installer),
            progress: Arc::new(NoProgress),
            commands: commands.clone(),
        };
        Self {
            ui,
            fetcher,
            spawner,
            commands,
            deps,
        }
    }

    /// Built-in preset, npm, git available, install succeeds
    pub fn default_setup() -> Self {
        Self::new(
            ScriptedUi::new(),
            ScriptedFetcher::new(FetchScript::NotFound),
            FakeEnv::npm_with_git(),
            ScriptedSpawner::succeeding(),
            RecordingCommands::new(),
        )
    }
}
