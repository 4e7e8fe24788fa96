//! Install progress reporting and yarn output parsing

use console::Term;
use regex::Regex;
use std::sync::{Mutex, OnceLock};

/// Columns reserved for the brackets and padding around the bar
const BAR_OVERHEAD: usize = 3;

/// Fallback when the terminal width cannot be detected
const DEFAULT_COLUMNS: usize = 80;

/// Receives progress for exactly one install invocation
pub trait InstallProgress: Send + Sync {
    /// Disable progress (value -1); called before and after every install
    fn reset(&self);

    /// A `curr/total` tick parsed from the package manager's output
    fn update(&self, curr: u64, total: u64);

    /// A diagnostic line forwarded untouched
    fn log(&self, line: &str);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl InstallProgress for NoProgress {
    fn reset(&self) {}
    fn update(&self, _curr: u64, _total: u64) {}
    fn log(&self, _line: &str) {}
}

/// Progress value in `[-1, 100]`, where -1 means disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    value: i8,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self { value: -1 }
    }
}

impl ProgressState {
    pub fn value(&self) -> i8 {
        self.value
    }

    pub fn enabled(&self) -> bool {
        self.value != -1
    }

    pub fn disable(&mut self) {
        self.value = -1;
    }

    pub fn set_ratio(&mut self, curr: u64, total: u64) {
        let percent = if total == 0 {
            100
        } else {
            (curr.min(total) * 100 / total) as i8
        };
        self.value = percent;
    }
}

/// Draws a textual progress bar on stderr, sized to the terminal
pub struct TerminalProgress {
    term: Term,
    state: Mutex<ProgressState>,
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
            state: Mutex::new(ProgressState::default()),
        }
    }

    pub fn state(&self) -> ProgressState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn columns(&self) -> usize {
        match self.term.size_checked() {
            Some((_rows, cols)) => cols as usize,
            None => DEFAULT_COLUMNS,
        }
    }
}

impl InstallProgress for TerminalProgress {
    fn reset(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.enabled() {
            let _ = self.term.clear_line();
        }
        state.disable();
    }

    fn update(&self, curr: u64, total: u64) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .set_ratio(curr, total);
        let bar = render_progress_bar(curr, total, self.columns());
        let _ = self.term.clear_line();
        let _ = self.term.write_str(&bar);
    }

    fn log(&self, line: &str) {
        let _ = self.term.write_line(line);
    }
}

/// Render `[####----] curr/total` to fit in `columns`
///
/// The bar is `min(total, columns - overhead)` cells wide with
/// `round(width * curr / total)` of them filled.
pub fn render_progress_bar(curr: u64, total: u64, columns: usize) -> String {
    let ratio = if total == 0 {
        1.0
    } else {
        (curr as f64 / total as f64).clamp(0.0, 1.0)
    };
    let counter = format!(" {}/{}", curr, total);
    let available = columns.saturating_sub(counter.len() + BAR_OVERHEAD);
    let width = (total.min(usize::MAX as u64) as usize).min(available);
    let complete = ((width as f64) * ratio).round() as usize;

    format!(
        "[{}{}]{}",
        "#".repeat(complete),
        "-".repeat(width - complete),
        counter
    )
}

/// How a single line of yarn's stderr should be handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YarnLine {
    /// Contains "warning"; dropped
    Suppressed,
    Progress { curr: u64, total: u64 },
    Passthrough(String),
}

fn progress_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[.*\] (\d+)/(\d+)").expect("progress pattern is valid"))
}

/// Classify one line of yarn diagnostic output
pub fn parse_yarn_line(line: &str) -> YarnLine {
    if line.contains("warning") {
        return YarnLine::Suppressed;
    }

    if let Some(caps) = progress_pattern().captures(line) {
        let curr = caps[1].parse::<u64>();
        let total = caps[2].parse::<u64>();
        if let (Ok(curr), Ok(total)) = (curr, total) {
            return YarnLine::Progress { curr, total };
        }
    }

    YarnLine::Passthrough(line.to_string())
}
