//! Package manager profiles and selection

use crate::error::CreateError;
use crate::runtime::Environment;
use std::fmt;
use std::str::FromStr;

/// Fixed argument templates for one package manager
#[derive(Debug)]
pub struct PackageManagerProfile {
    pub install_deps: &'static [&'static str],
    pub install_package: &'static [&'static str],
    pub uninstall_package: &'static [&'static str],
    pub update_package: &'static [&'static str],
}

static NPM: PackageManagerProfile = PackageManagerProfile {
    install_deps: &["install", "--loglevel", "error"],
    install_package: &["install", "--loglevel", "error"],
    uninstall_package: &["uninstall", "--loglevel", "error"],
    update_package: &["update", "--loglevel", "error"],
};

static PNPM: PackageManagerProfile = PackageManagerProfile {
    install_deps: &["install", "--loglevel", "error", "--shamefully-flatten"],
    install_package: &["install", "--loglevel", "error"],
    uninstall_package: &["uninstall", "--loglevel", "error"],
    update_package: &["update", "--loglevel", "error"],
};

static YARN: PackageManagerProfile = PackageManagerProfile {
    install_deps: &[],
    install_package: &["add"],
    uninstall_package: &["remove"],
    update_package: &["upgrade"],
};

/// Supported package managers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    Npm,
    Yarn,
    Pnpm,
}

impl PackageManager {
    pub const ALL: [PackageManager; 3] =
        [PackageManager::Npm, PackageManager::Yarn, PackageManager::Pnpm];

    /// Binary name
    pub fn command(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
        }
    }

    pub fn profile(&self) -> &'static PackageManagerProfile {
        match self {
            PackageManager::Npm => &NPM,
            PackageManager::Yarn => &YARN,
            PackageManager::Pnpm => &PNPM,
        }
    }

    /// Command that starts the generated project
    pub fn start_command(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm start",
            PackageManager::Yarn => "yarn start",
            PackageManager::Pnpm => "pnpm run start",
        }
    }

    /// yarn if present, else pnpm 3.0.0 or later, else npm
    pub fn detect(env: &dyn Environment) -> Self {
        if env.has_yarn() {
            PackageManager::Yarn
        } else if env.has_pnpm3_or_later() {
            PackageManager::Pnpm
        } else {
            PackageManager::Npm
        }
    }
}

impl FromStr for PackageManager {
    type Err = CreateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PackageManager::ALL
            .into_iter()
            .find(|pm| pm.command() == s)
            .ok_or_else(|| CreateError::UnsupportedPackageManager(s.to_string()))
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command())
    }
}
