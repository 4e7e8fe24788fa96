//! User interaction seam
//!
//! The creation flow never talks to a terminal directly. Every question and
//! every status line goes through [`Interaction`], so the state machine can be
//! driven by the cliclack UI (see `tui`) or by scripted answers in tests.

use crate::error::Result;

/// Answer to the "target directory already exists" question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteChoice {
    Overwrite,
    Cancel,
}

/// Prompts and progress output used by the creation flow
pub trait Interaction: Send + Sync {
    /// Yes/no question
    fn confirm(&self, message: &str, default: bool) -> Result<bool>;

    /// Free-text question with a default answer
    fn input(&self, message: &str, default: &str) -> Result<String>;

    /// Ask what to do about an existing target directory
    fn choose_overwrite(&self, message: &str) -> Result<OverwriteChoice>;

    /// Start a long-running step (spinner)
    fn start_step(&self, message: &str);

    /// Stop the current step, if any. Must be safe to call when nothing runs.
    fn stop_step(&self, message: &str);

    fn info(&self, message: &str);

    fn warn(&self, message: &str);

    fn success(&self, message: &str);

    fn error(&self, message: &str);

    /// Plain lines printed verbatim (next-step instructions)
    fn note(&self, lines: &[String]);
}
