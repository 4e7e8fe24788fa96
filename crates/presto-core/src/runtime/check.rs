//! Environment probes for package managers and git

use super::cache::TtlCache;
use super::version;
use semver::Version;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

/// How long a "is this directory inside a repository" answer stays valid
const PROJECT_GIT_TTL: Duration = Duration::from_secs(1);

/// How many directories the repository check remembers
const PROJECT_GIT_CAPACITY: usize = 10;

/// Tool probe result
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: &'static str,
    pub version: Option<String>,
    pub available: bool,
}

/// Check whether `binary --version` runs successfully
pub fn check_tool(binary: &'static str) -> ToolInfo {
    let output = Command::new(binary)
        .arg("--version")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();

    match output {
        Ok(out) if out.status.success() => {
            let version = String::from_utf8_lossy(&out.stdout).trim().to_string();
            ToolInfo {
                name: binary,
                version: Some(version),
                available: true,
            }
        }
        _ => ToolInfo {
            name: binary,
            version: None,
            available: false,
        },
    }
}

/// Facts about the machine the creation flow depends on
pub trait Environment: Send + Sync {
    fn has_yarn(&self) -> bool;

    /// pnpm 2 has install bugs severe enough to skip it entirely
    fn has_pnpm3_or_later(&self) -> bool;

    fn has_git(&self) -> bool;

    /// Whether `dir` already lives inside a git work tree
    fn has_project_git(&self, dir: &Path) -> bool;
}

/// Probes the real system, memoizing results for the process lifetime
pub struct SystemEnvironment {
    yarn: OnceLock<bool>,
    pnpm3: OnceLock<bool>,
    git: OnceLock<bool>,
    project_git: TtlCache<PathBuf, bool>,
}

impl Default for SystemEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemEnvironment {
    pub fn new() -> Self {
        Self {
            yarn: OnceLock::new(),
            pnpm3: OnceLock::new(),
            git: OnceLock::new(),
            project_git: TtlCache::new(PROJECT_GIT_CAPACITY, PROJECT_GIT_TTL),
        }
    }
}

impl Environment for SystemEnvironment {
    fn has_yarn(&self) -> bool {
        *self.yarn.get_or_init(|| {
            let info = check_tool("yarn");
            debug!(available = info.available, "probed yarn");
            info.available
        })
    }

    fn has_pnpm3_or_later(&self) -> bool {
        *self.pnpm3.get_or_init(|| {
            let info = check_tool("pnpm");
            let supported = info
                .version
                .as_deref()
                .is_some_and(|v| version::is_at_least(v, &Version::new(3, 0, 0)));
            debug!(version = ?info.version, supported, "probed pnpm");
            supported
        })
    }

    fn has_git(&self) -> bool {
        *self.git.get_or_init(|| {
            let info = check_tool("git");
            debug!(available = info.available, "probed git");
            info.available
        })
    }

    fn has_project_git(&self, dir: &Path) -> bool {
        self.project_git.get_or_insert_with(dir.to_path_buf(), || {
            let inside = Command::new("git")
                .arg("status")
                .current_dir(dir)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .is_ok_and(|s| s.success());
            debug!(dir = %dir.display(), inside, "probed project git");
            inside
        })
    }
}
