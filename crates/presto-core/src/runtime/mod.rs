//! Environment probing
//!
//! This module provides:
//! - Memoized presence checks for yarn, pnpm (3.0.0 or later) and git
//! - A bounded, time-limited cache for per-directory repository checks
//! - Version parsing for tool `--version` output

pub mod cache;
pub mod check;
pub mod version;

pub use cache::{Clock, SystemClock, TtlCache};
pub use check::{check_tool, Environment, SystemEnvironment, ToolInfo};
