//! Package manager subprocesses and completion settlement
//!
//! A spawned process reports completion twice: once when it exits and once
//! when its stdio streams have closed. Either may arrive first in practice,
//! so the installer settles on whichever comes first and ignores the other.

use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::OnceLock;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Which completion signal fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    /// The process terminated
    Exit,
    /// The process terminated and its stdio streams closed
    Close,
}

/// One completion signal: an exit code and/or a terminating signal name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub kind: CompletionKind,
    pub code: Option<i32>,
    pub signal: Option<String>,
}

impl Completion {
    pub fn exit(code: Option<i32>, signal: Option<&str>) -> Self {
        Self {
            kind: CompletionKind::Exit,
            code,
            signal: signal.map(str::to_string),
        }
    }

    pub fn close(code: Option<i32>, signal: Option<&str>) -> Self {
        Self {
            kind: CompletionKind::Close,
            code,
            signal: signal.map(str::to_string),
        }
    }

    fn from_status(kind: CompletionKind, status: &ExitStatus) -> Self {
        Self {
            kind,
            code: status.code(),
            signal: signal_name(status),
        }
    }

    /// Only a zero exit code counts as success
    pub fn succeeded(&self) -> bool {
        self.code == Some(0)
    }
}

#[cfg(unix)]
fn signal_name(status: &ExitStatus) -> Option<String> {
    use std::os::unix::process::ExitStatusExt;

    status.signal().map(|sig| {
        let name = match sig {
            1 => "SIGHUP",
            2 => "SIGINT",
            3 => "SIGQUIT",
            6 => "SIGABRT",
            9 => "SIGKILL",
            13 => "SIGPIPE",
            15 => "SIGTERM",
            _ => return format!("SIG{}", sig),
        };
        name.to_string()
    })
}

#[cfg(not(unix))]
fn signal_name(_status: &ExitStatus) -> Option<String> {
    None
}

/// A running package manager process, seen through channels
pub struct SpawnedProcess {
    /// Diagnostic lines, present only when stderr is intercepted
    pub stderr: Option<mpsc::UnboundedReceiver<String>>,
    /// Completion signals in the order they fired
    pub completions: mpsc::UnboundedReceiver<Completion>,
}

/// Starts package manager processes
pub trait Spawner: Send + Sync {
    /// Spawn `program args` in `cwd`. When `intercept_stderr` is false the
    /// child inherits stderr.
    fn spawn(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
        intercept_stderr: bool,
    ) -> io::Result<SpawnedProcess>;
}

/// Spawns real processes on the tokio runtime
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSpawner;

impl Spawner for TokioSpawner {
    fn spawn(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
        intercept_stderr: bool,
    ) -> io::Result<SpawnedProcess> {
        let mut child = TokioCommand::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(if intercept_stderr {
                Stdio::piped()
            } else {
                Stdio::inherit()
            })
            .spawn()?;
        debug!(program, ?args, cwd = %cwd.display(), "spawned package manager");

        let (done_tx, done_rx) = mpsc::unbounded_channel();

        let (stderr_rx, reader) = match child.stderr.take() {
            Some(stderr) => {
                let (line_tx, line_rx) = mpsc::unbounded_channel();
                let reader = tokio::spawn(async move {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        if line_tx.send(line).is_err() {
                            break;
                        }
                    }
                });
                (Some(line_rx), Some(reader))
            }
            None => (None, None),
        };

        tokio::spawn(async move {
            let exit = match child.wait().await {
                Ok(status) => Completion::from_status(CompletionKind::Exit, &status),
                Err(e) => {
                    debug!(error = %e, "failed waiting for package manager");
                    Completion::exit(None, None)
                }
            };
            trace!(?exit, "package manager exited");
            let _ = done_tx.send(exit.clone());

            if let Some(reader) = reader {
                let _ = reader.await;
            }
            let _ = done_tx.send(Completion {
                kind: CompletionKind::Close,
                ..exit
            });
        });

        Ok(SpawnedProcess {
            stderr: stderr_rx,
            completions: done_rx,
        })
    }
}

/// Single-assignment result cell: the first settlement wins
#[derive(Debug)]
pub struct SettleCell<T> {
    value: OnceLock<T>,
}

impl<T> Default for SettleCell<T> {
    fn default() -> Self {
        Self {
            value: OnceLock::new(),
        }
    }
}

impl<T> SettleCell<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` unless already settled. Returns whether this call settled.
    pub fn settle(&self, value: T) -> bool {
        self.value.set(value).is_ok()
    }

    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    pub fn into_inner(self) -> Option<T> {
        self.value.into_inner()
    }
}
