//! Resource bundle backed by a directory on disk.

use async_trait::async_trait;
use bridge_traits::{
    bundle::ResourceBundle,
    error::{BridgeError, Result},
};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Directory-backed bundle.
///
/// Resources are looked up as `<root>/<name>.<extension>`. Names are flat:
/// anything that would escape the root directory is rejected.
#[derive(Debug, Clone)]
pub struct DirectoryBundle {
    root: PathBuf,
}

impl DirectoryBundle {
    /// Create a bundle rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Bundle under the platform data directory.
    pub fn default_location() -> Self {
        let root = dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join("playback-core")
            .join("bundle");

        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resource_path(&self, name: &str, extension: &str) -> Result<PathBuf> {
        let file_name = if extension.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", name, extension)
        };

        let relative = Path::new(&file_name);
        let mut components = relative.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(relative)),
            _ => Err(BridgeError::OperationFailed(format!(
                "invalid bundle resource name: {:?}",
                file_name
            ))),
        }
    }
}

impl Default for DirectoryBundle {
    fn default() -> Self {
        Self::default_location()
    }
}

#[async_trait]
impl ResourceBundle for DirectoryBundle {
    async fn locate(&self, name: &str, extension: &str) -> Result<Option<PathBuf>> {
        if name.trim().is_empty() {
            return Ok(None);
        }

        let path = self.resource_path(name, extension)?;
        if fs::try_exists(&path).await? {
            debug!(path = ?path, "Located bundled resource");
            Ok(Some(path))
        } else {
            debug!(name, extension, root = ?self.root, "Bundled resource not found");
            Ok(None)
        }
    }
}
