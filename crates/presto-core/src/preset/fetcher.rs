//! Preset fetching from local directories, GitHub, or zip URLs
//!
//! Remote presets are either downloaded as a zip archive and unpacked, or
//! shallow-cloned with git. Both land in a temporary directory that lives
//! as long as the returned [`Preset`].

use super::copier::read_package_descriptor;
use super::registry::{PresetRegistry, PresetSource, DEFAULT_PRESET};
use super::{Preset, PresetFetcher};
use crate::error::{CreateError, Result};
use crate::product::ProductConfig;
use anyhow::Context;
use async_trait::async_trait;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::Command as TokioCommand;
use tracing::{debug, info};
use url::Url;
use zip::ZipArchive;

/// Fetches presets named in a [`PresetRegistry`]
pub struct RegistryPresetFetcher {
    registry: PresetRegistry,
    client: reqwest::Client,
    /// Base for relative local preset paths
    base_dir: PathBuf,
}

impl RegistryPresetFetcher {
    /// Create a new fetcher with a custom user agent
    pub fn new(registry: PresetRegistry, base_dir: PathBuf, user_agent: &str) -> Self {
        Self {
            registry,
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_dir,
        }
    }

    /// Create a fetcher from a product config
    pub fn from_config<C: ProductConfig>(config: &C, base_dir: PathBuf) -> Result<Self> {
        let registry = PresetRegistry::from_config(config)
            .map_err(|e| CreateError::fetch(DEFAULT_PRESET, format!("{:#}", e)))?;
        Ok(Self::new(registry, base_dir, config.user_agent()))
    }

    /// Source string for `name`: the registry entry, or the name itself.
    /// An unregistered `default` has no source.
    fn source_for<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        match self.registry.lookup(name) {
            Some(source) => Some(source),
            None if name == DEFAULT_PRESET => None,
            None => Some(name),
        }
    }

    async fn download(&self, url: &Url) -> anyhow::Result<Vec<u8>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch preset archive from {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to fetch preset archive from {}: HTTP {}",
                url,
                response.status()
            );
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn git_clone(source: &PresetSource, dest: &Path) -> anyhow::Result<()> {
        let url = source
            .clone_url()
            .context("Only GitHub presets can be cloned")?;

        let mut cmd = TokioCommand::new("git");
        cmd.arg("clone").arg("--depth").arg("1");
        if let PresetSource::GitHub {
            branch: Some(branch),
            ..
        } = source
        {
            cmd.arg("--branch").arg(branch);
        }
        cmd.arg(&url)
            .arg(dest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        debug!(%url, dest = %dest.display(), "cloning preset");
        let output = cmd.output().await.context("Failed to run git clone")?;
        if !output.status.success() {
            anyhow::bail!(
                "git clone {} failed: {}",
                url,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    async fn materialize(
        &self,
        source: &PresetSource,
        clone: bool,
    ) -> anyhow::Result<TempDir> {
        let dir = tempfile::Builder::new()
            .prefix("presto-preset-")
            .tempdir()
            .context("Failed to create temporary directory")?;

        if clone && source.clone_url().is_some() {
            Self::git_clone(source, dir.path()).await?;
        } else {
            let url = source
                .archive_url()
                .context("Preset has no downloadable archive")?;
            let bytes = self.download(&url).await?;
            extract_zip(&bytes, dir.path())?;
        }

        Ok(dir)
    }
}

#[async_trait]
impl PresetFetcher for RegistryPresetFetcher {
    async fn fetch(&self, name: &str, target_dir: &Path, clone: bool) -> Result<Option<Preset>> {
        let Some(source_str) = self.source_for(name) else {
            debug!(name, "no source registered");
            return Ok(None);
        };
        let source = match PresetSource::parse(source_str, &self.base_dir) {
            Some(source) => source,
            None => {
                debug!(name, source = source_str, "preset source not recognized");
                return Ok(None);
            }
        };
        info!(name, ?source, clone, "fetching preset");

        match source {
            PresetSource::Local(dir) => {
                let metadata = read_package_descriptor(&dir).await?;
                Ok(Some(Preset::from_local(
                    name,
                    dir,
                    target_dir.to_path_buf(),
                    metadata,
                )))
            }
            remote => {
                let dir = self
                    .materialize(&remote, clone)
                    .await
                    .map_err(|e| CreateError::fetch(name, format!("{:#}", e)))?;
                let metadata = read_package_descriptor(dir.path()).await?;
                Ok(Some(Preset::from_temp(
                    name,
                    dir,
                    target_dir.to_path_buf(),
                    metadata,
                )))
            }
        }
    }
}

/// Unpack a zip into `dest`, dropping the single top-level directory that
/// GitHub archives wrap everything in
pub fn extract_zip(zip_bytes: &[u8], dest: &Path) -> anyhow::Result<()> {
    let mut archive =
        ZipArchive::new(Cursor::new(zip_bytes)).context("Failed to read preset zip archive")?;

    let mut entries: Vec<PathBuf> = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive.by_index(i)?;
        let path = file
            .enclosed_name()
            .with_context(|| format!("Unsafe path in preset archive: {}", file.name()))?;
        entries.push(path);
    }
    let prefix = common_root(&entries);

    for (i, path) in entries.iter().enumerate() {
        let mut file = archive.by_index(i)?;
        let relative = match &prefix {
            Some(prefix) => path.strip_prefix(prefix).unwrap_or(path),
            None => path.as_path(),
        };
        if relative.as_os_str().is_empty() {
            continue;
        }
        let out_path = dest.join(relative);

        if file.is_dir() {
            std::fs::create_dir_all(&out_path)
                .with_context(|| format!("Failed to create {}", out_path.display()))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        std::fs::write(&out_path, &contents)
            .with_context(|| format!("Failed to write {}", out_path.display()))?;
    }

    Ok(())
}

/// The first path component, if every entry shares it and at least one
/// entry lives below it
fn common_root(entries: &[PathBuf]) -> Option<PathBuf> {
    let first = entries.first()?.components().next()?;
    let shared = entries
        .iter()
        .all(|p| p.components().next() == Some(first));
    let nested = entries.iter().any(|p| p.components().count() > 1);
    (shared && nested).then(|| PathBuf::from(first.as_os_str()))
}
