//! Creation request, options, and project-name validation

use crate::error::{CreateError, Result};
use std::path::{Path, PathBuf};

/// Maximum length npm accepts for a package name
const MAX_NAME_LENGTH: usize = 214;

/// Names npm refuses outright
const RESERVED_NAMES: &[&str] = &["node_modules", "favicon.ico"];

/// What the user asked for regarding version control
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GitOption {
    /// Flag absent: initialize unless already inside a repository
    #[default]
    Default,
    /// `--git` without a message
    Enabled,
    /// `--no-git` or `--git false`
    Disabled,
    /// `--git <message>`: initialize and use this initial commit message
    Message(String),
}

impl GitOption {
    /// Interpret a raw `--git` value, where the literal "false" disables VCS
    pub fn from_flag_value(value: Option<&str>) -> Self {
        match value {
            None => GitOption::Enabled,
            Some("false") => GitOption::Disabled,
            Some("true") | Some("") => GitOption::Enabled,
            Some(msg) => GitOption::Message(msg.to_string()),
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, GitOption::Disabled)
    }

    /// Initial commit message: the user's string, or "init"
    pub fn commit_message(&self) -> &str {
        match self {
            GitOption::Message(msg) => msg,
            _ => "init",
        }
    }
}

/// Options recognized by the creation flow
#[derive(Debug, Clone, Default)]
pub struct CreationOptions {
    /// Named preset to resolve instead of the default one
    pub preset: Option<String>,
    /// Use the default preset (also what happens when `preset` is absent)
    pub default: bool,
    /// Overwrite the target directory without asking
    pub force: bool,
    pub git: GitOption,
    /// Initialize a repository even inside an existing one
    pub force_git: bool,
    /// Package registry URL passed to the install command
    pub registry: Option<String>,
    /// Fetch presets with `git clone` instead of an archive download
    pub clone: bool,
    /// Do not print the "next steps" instructions
    pub skip_get_started: bool,
}

/// A fully-resolved request to create one project
#[derive(Debug, Clone)]
pub struct CreationRequest {
    pub project_name: String,
    pub target_directory: PathBuf,
    /// True when the project is generated into `cwd` itself (name ".")
    pub in_current_directory: bool,
    pub options: CreationOptions,
}

impl CreationRequest {
    /// Build a request from the name typed on the command line.
    ///
    /// A name of "." creates the project in `cwd` and takes the directory's
    /// basename as the project name. The name is validated before anything
    /// touches the disk.
    pub fn resolve(raw_name: &str, cwd: &Path, options: CreationOptions) -> Result<Self> {
        let in_current_directory = raw_name == ".";
        let project_name = if in_current_directory {
            cwd.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            raw_name.to_string()
        };

        validate_project_name(&project_name)?;

        let target_directory = if in_current_directory {
            cwd.to_path_buf()
        } else {
            cwd.join(raw_name)
        };

        Ok(Self {
            project_name,
            target_directory,
            in_current_directory,
            options,
        })
    }
}

/// Check a project name against the rules for new npm packages
pub fn validate_project_name(name: &str) -> Result<()> {
    let mut problems = Vec::new();

    if name.is_empty() {
        problems.push("name length must be greater than zero".to_string());
    }
    if name.len() > MAX_NAME_LENGTH {
        problems.push(format!(
            "name can no longer contain more than {} characters",
            MAX_NAME_LENGTH
        ));
    }
    if name.starts_with('.') {
        problems.push("name cannot start with a period".to_string());
    }
    if name.starts_with('_') {
        problems.push("name cannot start with an underscore".to_string());
    }
    if name.trim() != name {
        problems.push("name cannot contain leading or trailing spaces".to_string());
    }
    if RESERVED_NAMES.contains(&name.to_lowercase().as_str()) {
        problems.push(format!("{} is a blacklisted name", name));
    }
    if name.chars().any(|c| c.is_uppercase()) {
        problems.push("name can no longer contain capital letters".to_string());
    }
    if !is_url_safe(name) {
        problems.push("name can only contain URL-friendly characters".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(CreateError::Validation {
            name: name.to_string(),
            problems,
        })
    }
}

fn is_url_safe(name: &str) -> bool {
    let safe_part = |part: &str| {
        !part.is_empty()
            && part.chars().all(|c| {
                c.is_ascii_lowercase()
                    || c.is_ascii_digit()
                    || matches!(c, '-' | '.' | '_' | '~')
            })
    };

    // Scoped names are the only form allowed to carry '@' and '/'
    match name.strip_prefix('@') {
        Some(scoped) => match scoped.split_once('/') {
            Some((scope, pkg)) => safe_part(scope) && safe_part(pkg),
            None => false,
        },
        None => name.is_empty() || safe_part(name),
    }
}
