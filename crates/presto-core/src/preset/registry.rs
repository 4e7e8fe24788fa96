//! Preset registry file and preset source parsing

use crate::product::ProductConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Name that always resolves, falling back to the built-in preset
pub const DEFAULT_PRESET: &str = "default";

/// Named presets known to this installation (YAML)
///
/// ```yaml
/// default: my-org/web-starter
/// presets:
///   mobx: my-org/mobx-starter#next
///   local: ./presets/local
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PresetRegistry {
    /// Source of the `default` preset
    #[serde(default)]
    pub default: Option<String>,

    /// Preset name to source
    #[serde(default)]
    pub presets: BTreeMap<String, String>,
}

impl PresetRegistry {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse preset registry {}", path.display()))
    }

    /// Load the file named by the product's registry env var, or start empty.
    /// The product's default source fills in a missing `default` entry.
    pub fn from_config<C: ProductConfig>(config: &C) -> Result<Self> {
        let mut registry = match std::env::var(config.preset_registry_env()) {
            Ok(path) if !path.is_empty() => Self::load(Path::new(&path))?,
            _ => Self::default(),
        };
        if registry.default.is_none() {
            registry.default = config.default_preset_source().map(str::to_string);
        }
        Ok(registry)
    }

    /// Source registered for `name`
    pub fn lookup(&self, name: &str) -> Option<&str> {
        if name == DEFAULT_PRESET {
            self.default.as_deref()
        } else {
            self.presets.get(name).map(String::as_str)
        }
    }
}

/// Where a preset's files come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetSource {
    /// A directory already on disk
    Local(PathBuf),
    /// `owner/repo[#branch]`
    GitHub {
        owner: String,
        repo: String,
        branch: Option<String>,
    },
    /// A zip archive served over HTTP(S)
    Archive(Url),
}

impl PresetSource {
    /// Interpret a source string; relative paths resolve against `base`.
    ///
    /// Returns `None` when the string is neither an existing directory, a
    /// URL, nor a GitHub shorthand.
    pub fn parse(source: &str, base: &Path) -> Option<Self> {
        if source.starts_with("http://") || source.starts_with("https://") {
            return Url::parse(source).ok().map(PresetSource::Archive);
        }

        let path = base.join(source);
        if path.is_dir() {
            return Some(PresetSource::Local(path));
        }

        let shorthand = source.strip_prefix("github:").unwrap_or(source);
        let (repo_path, branch) = match shorthand.split_once('#') {
            Some((path, branch)) if !branch.is_empty() => (path, Some(branch.to_string())),
            Some((path, _)) => (path, None),
            None => (shorthand, None),
        };
        let (owner, repo) = repo_path.split_once('/')?;
        if is_repo_segment(owner) && is_repo_segment(repo) {
            Some(PresetSource::GitHub {
                owner: owner.to_string(),
                repo: repo.to_string(),
                branch,
            })
        } else {
            None
        }
    }

    /// Zip archive URL for downloads
    pub fn archive_url(&self) -> Option<Url> {
        match self {
            PresetSource::Archive(url) => Some(url.clone()),
            PresetSource::GitHub {
                owner,
                repo,
                branch,
            } => Url::parse(&format!(
                "https://codeload.github.com/{}/{}/zip/{}",
                owner,
                repo,
                branch.as_deref().unwrap_or("HEAD")
            ))
            .ok(),
            PresetSource::Local(_) => None,
        }
    }

    /// Clone URL for `git clone`
    pub fn clone_url(&self) -> Option<String> {
        match self {
            PresetSource::GitHub { owner, repo, .. } => {
                Some(format!("https://github.com/{}/{}.git", owner, repo))
            }
            _ => None,
        }
    }
}

fn is_repo_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
