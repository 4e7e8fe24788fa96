//! Page generator: adds a page folder (component, store, io, styles) to an
//! existing project

use crate::creator::CreationEvent;
use crate::error::{CreateError, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast;
use tracing::{debug, info};

const IO_TEMPLATE: &str = include_str!("../presets/page/io.js");
const PAGE_TEMPLATE: &str = include_str!("../presets/page/page.js");
const STORE_TEMPLATE: &str = include_str!("../presets/page/store.js");
const STYLE_TEMPLATE: &str = include_str!("../presets/page/page.less");

/// `name` with its first character upper-cased
pub fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `name` with its first character lower-cased
pub fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn render(template: &str, upper: &str, lower: &str) -> String {
    template
        .replace("{{upperName}}", upper)
        .replace("{{lowerName}}", lower)
}

/// Generates `<base_dir>/<Name>/` for one page
pub struct PageCreator {
    name: String,
    base_dir: PathBuf,
    events: broadcast::Sender<CreationEvent>,
}

impl PageCreator {
    pub fn new(name: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(4);
        Self {
            name: name.into(),
            base_dir: base_dir.into(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CreationEvent> {
        self.events.subscribe()
    }

    /// Directory the page files land in
    pub fn page_dir(&self) -> PathBuf {
        self.base_dir.join(upper_first(&self.name))
    }

    /// Write the page files and return their paths.
    ///
    /// Existing files are appended to, never truncated.
    pub async fn create(&self) -> Result<Vec<PathBuf>> {
        if self.name.is_empty() {
            return Err(CreateError::Validation {
                name: self.name.clone(),
                problems: vec!["page name can not be empty".to_string()],
            });
        }

        let upper = upper_first(&self.name);
        let lower = lower_first(&self.name);
        let dir = self.page_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| CreateError::materialization(&dir, e))?;

        let _ = self.events.send(CreationEvent::Creating);
        info!(page = %upper, dir = %dir.display(), "creating page");

        let files = [
            ("io.js".to_string(), IO_TEMPLATE),
            (format!("{}.js", upper), PAGE_TEMPLATE),
            (format!("store-{}.js", lower), STORE_TEMPLATE),
            (format!("{}.less", upper), STYLE_TEMPLATE),
        ];

        let mut written = Vec::with_capacity(files.len());
        for (file_name, template) in files {
            let path = dir.join(file_name);
            append(&path, &render(template, &upper, &lower)).await?;
            written.push(path);
        }
        Ok(written)
    }
}

async fn append(path: &Path, contents: &str) -> Result<()> {
    debug!(path = %path.display(), "appending page file");
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| CreateError::materialization(path, e))?;
    file.write_all(contents.as_bytes())
        .await
        .map_err(|e| CreateError::materialization(path, e))?;
    file.flush()
        .await
        .map_err(|e| CreateError::materialization(path, e))?;
    Ok(())
}
