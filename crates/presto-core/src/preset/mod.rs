//! Presets: resolving, fetching, and materializing project templates
//!
//! This module provides:
//! - The [`Preset`] descriptor and the [`PresetFetcher`] seam
//! - A registry-backed fetcher for local, GitHub, and zip-URL presets
//! - The built-in default preset
//! - File copying, file-tree writing, and README generation

pub mod copier;
pub mod fetcher;
pub mod readme;
pub mod registry;

use crate::error::{CreateError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub use copier::{copy_preset, write_file_tree, PackageDescriptor};
pub use fetcher::RegistryPresetFetcher;
pub use readme::generate_readme;
pub use registry::{PresetRegistry, PresetSource, DEFAULT_PRESET};

/// Files of the built-in default preset
const BUILTIN_FILES: &[(&str, &str)] = &[
    ("package.json", include_str!("../../presets/default/package.json")),
    ("index.js", include_str!("../../presets/default/index.js")),
    (".gitignore", include_str!("../../presets/default/gitignore")),
];

/// Where a preset's files live until they are copied
#[derive(Debug)]
enum PresetDir {
    /// Downloaded or generated; removed when the preset is dropped
    Temp(TempDir),
    /// A directory owned by the user; never removed
    Local(PathBuf),
}

/// A resolved template, owned by one creation
#[derive(Debug)]
pub struct Preset {
    pub name: String,
    source: PresetDir,
    pub target_dir: PathBuf,
    pub package_metadata: PackageDescriptor,
}

impl Preset {
    pub fn from_local(
        name: impl Into<String>,
        dir: PathBuf,
        target_dir: PathBuf,
        package_metadata: PackageDescriptor,
    ) -> Self {
        Self {
            name: name.into(),
            source: PresetDir::Local(dir),
            target_dir,
            package_metadata,
        }
    }

    pub fn from_temp(
        name: impl Into<String>,
        dir: TempDir,
        target_dir: PathBuf,
        package_metadata: PackageDescriptor,
    ) -> Self {
        Self {
            name: name.into(),
            source: PresetDir::Temp(dir),
            target_dir,
            package_metadata,
        }
    }

    /// Directory holding the preset's files
    pub fn source_dir(&self) -> &Path {
        match &self.source {
            PresetDir::Temp(dir) => dir.path(),
            PresetDir::Local(path) => path,
        }
    }

    /// True when dropping the preset deletes its files
    pub fn is_temporary(&self) -> bool {
        matches!(self.source, PresetDir::Temp(_))
    }
}

/// Resolves a preset name into files on disk
#[async_trait]
pub trait PresetFetcher: Send + Sync {
    /// `Ok(None)` when nothing is known by that name
    async fn fetch(&self, name: &str, target_dir: &Path, clone: bool) -> Result<Option<Preset>>;
}

/// Write the built-in default preset into a temporary directory
pub async fn builtin_default_preset(target_dir: &Path) -> Result<Preset> {
    let dir = tempfile::Builder::new()
        .prefix("presto-default-")
        .tempdir()
        .map_err(|e| CreateError::materialization(std::env::temp_dir(), e))?;

    write_file_tree(dir.path(), BUILTIN_FILES).await?;
    let metadata = copier::read_package_descriptor(dir.path()).await?;

    Ok(Preset::from_temp(
        DEFAULT_PRESET,
        dir,
        target_dir.to_path_buf(),
        metadata,
    ))
}
