//! Copying preset files and writing generated files

use crate::error::{CreateError, Result};
use serde_json::{Map, Value};
use std::path::Path;
use tokio::fs;
use walkdir::WalkDir;

/// The project's `package.json` as a JSON object
pub type PackageDescriptor = Map<String, Value>;

/// File holding the package descriptor
pub const PACKAGE_FILE: &str = "package.json";

/// Copy a preset's files into `target_dir` and return its package descriptor
///
/// The preset's own `.git` directory is never copied, nor is `target_dir`
/// when it sits inside the preset. Existing files in `target_dir` are
/// overwritten.
pub async fn copy_preset(source_dir: &Path, target_dir: &Path) -> Result<PackageDescriptor> {
    fs::create_dir_all(target_dir)
        .await
        .map_err(|e| CreateError::materialization(target_dir, e))?;

    let walker = WalkDir::new(source_dir)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git" && entry.path() != target_dir);

    for entry in walker {
        let entry = entry.map_err(|e| CreateError::materialization(source_dir, e))?;
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|e| CreateError::materialization(entry.path(), e))?;
        let target_path = target_dir.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target_path)
                .await
                .map_err(|e| CreateError::materialization(&target_path, e))?;
        } else {
            if let Some(parent) = target_path.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| CreateError::materialization(parent, e))?;
            }
            fs::copy(entry.path(), &target_path)
                .await
                .map_err(|e| CreateError::materialization(&target_path, e))?;
        }
    }

    read_package_descriptor(source_dir).await
}

/// Read `package.json` from `dir`; a missing file yields an empty descriptor
pub async fn read_package_descriptor(dir: &Path) -> Result<PackageDescriptor> {
    let path = dir.join(PACKAGE_FILE);
    let content = match fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(CreateError::materialization(&path, e)),
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CreateError::materialization(
            &path,
            "package.json is not a JSON object",
        )),
        Err(e) => Err(CreateError::materialization(&path, e)),
    }
}

/// Write `files` (relative path, content) under `base_dir`, creating
/// intermediate directories and overwriting existing files
pub async fn write_file_tree<P, C>(base_dir: &Path, files: &[(P, C)]) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    for (relative, content) in files {
        let target_path = base_dir.join(relative);
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CreateError::materialization(parent, e))?;
        }
        fs::write(&target_path, content)
            .await
            .map_err(|e| CreateError::materialization(&target_path, e))?;
    }
    Ok(())
}

/// Pretty-printed descriptor, two-space indented like npm writes it
pub fn render_package_descriptor(pkg: &PackageDescriptor) -> Result<String> {
    serde_json::to_string_pretty(pkg).map_err(|e| CreateError::materialization(PACKAGE_FILE, e))
}
