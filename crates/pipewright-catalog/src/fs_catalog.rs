use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use pipewright_resolver::{CATALOG_DIRECTORIES, LocalScript, RemoteScript, ScriptSource, SourceError};
use tokio::fs;
use tracing::debug;

/// Filesystem-based script source.
///
/// Scripts are stored in a directory structure:
/// ```text
/// {root}/
/// ├── scripts.json          (local library: [{id, name, type, content}])
/// └── catalog/
///     ├── bash_scripts/
///     │   └── deploy.sh
///     ├── python_scripts/
///     ├── ansible_playbooks/
///     └── pipelines/
/// ```
pub struct FsScriptCatalog {
  root: PathBuf,
}

impl FsScriptCatalog {
  /// Create a new filesystem catalog at the given root path.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Get the root directory of the catalog.
  pub fn root(&self) -> &Path {
    &self.root
  }

  fn library_path(&self) -> PathBuf {
    self.root.join("scripts.json")
  }

  fn catalog_dir(&self) -> PathBuf {
    self.root.join("catalog")
  }

  /// Map a catalog path like "bash_scripts/deploy.sh" to a file under the
  /// catalog directory. Paths outside the known directories are refused.
  fn resolve_path(&self, path: &str) -> Result<PathBuf, SourceError> {
    let relative = Path::new(path);
    let mut components = relative.components();

    let top = match components.next() {
      Some(Component::Normal(dir)) => dir.to_str().unwrap_or_default(),
      _ => return Err(SourceError::NotFound(path.to_string())),
    };

    let escapes = components.any(|c| !matches!(c, Component::Normal(_)));
    if escapes || !CATALOG_DIRECTORIES.contains(&top) {
      return Err(SourceError::NotFound(path.to_string()));
    }

    Ok(self.catalog_dir().join(relative))
  }

  /// Write a document into the catalog, creating or replacing it.
  ///
  /// Used to publish compiled pipelines under `pipelines/`.
  pub async fn write_remote(&self, path: &str, content: &str) -> Result<PathBuf, SourceError> {
    let target = self.resolve_path(path)?;
    if let Some(parent) = target.parent() {
      fs::create_dir_all(parent).await?;
    }
    fs::write(&target, content).await?;

    debug!(path = %path, "wrote catalog entry");
    Ok(target)
  }
}

#[async_trait]
impl ScriptSource for FsScriptCatalog {
  async fn list_local_scripts(&self) -> Result<Vec<LocalScript>, SourceError> {
    let path = self.library_path();
    if !path.exists() {
      return Ok(Vec::new());
    }

    let content = fs::read_to_string(&path).await?;
    let scripts: Vec<LocalScript> = serde_json::from_str(&content)?;
    Ok(scripts)
  }

  async fn list_remote_scripts(&self) -> Result<Vec<RemoteScript>, SourceError> {
    let mut scripts = Vec::new();

    for directory in CATALOG_DIRECTORIES {
      let dir = self.catalog_dir().join(directory);
      if !dir.is_dir() {
        // A missing directory just means no scripts of that type.
        debug!(directory, "catalog directory not found, skipping");
        continue;
      }

      let mut names = Vec::new();
      let mut entries = fs::read_dir(&dir).await?;
      while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !path.is_file() {
          continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
          names.push(name.to_string());
        }
      }

      names.sort();
      scripts.extend(names.into_iter().map(|name| RemoteScript {
        path: format!("{}/{}", directory, name),
        name,
        script_type: directory.to_string(),
        sha: None,
      }));
    }

    Ok(scripts)
  }

  async fn fetch_remote_content(&self, path: &str) -> Result<String, SourceError> {
    let file = self.resolve_path(path)?;
    if !file.is_file() {
      return Err(SourceError::NotFound(path.to_string()));
    }

    Ok(fs::read_to_string(&file).await?)
  }
}
