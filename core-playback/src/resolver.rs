//! Default [`SourceResolver`]: remote tracks by URL, local tracks through the
//! host's [`ResourceBundle`].

use crate::error::{PlaybackError, Result};
use crate::traits::SourceResolver;
use crate::types::Track;
use async_trait::async_trait;
use bridge_traits::{Locator, ResourceBundle};
use core_runtime::logging::strip_path;
use std::sync::Arc;
use tracing::debug;
use url::Url;

const SUPPORTED_SCHEMES: &[&str] = &["http", "https", "file"];

/// Resolves remote locators as URLs and local ones as `<name>.<extension>`
/// inside a resource bundle.
pub struct BundleSourceResolver {
    bundle: Arc<dyn ResourceBundle>,
    extension: String,
}

impl BundleSourceResolver {
    pub fn new(bundle: Arc<dyn ResourceBundle>, extension: impl Into<String>) -> Self {
        Self {
            bundle,
            extension: extension.into(),
        }
    }

    fn resolve_remote(&self, track: &Track) -> Result<Locator> {
        let raw = track.locator.trim();
        let url = Url::parse(raw).map_err(|e| {
            PlaybackError::InvalidSource(format!("{:?} is not a valid URL: {}", raw, e))
        })?;

        if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
            return Err(PlaybackError::InvalidSource(format!(
                "unsupported URL scheme {:?}",
                url.scheme()
            )));
        }

        Ok(Locator::Remote(url))
    }

    async fn resolve_local(&self, track: &Track) -> Result<Locator> {
        let name = track.locator.trim();
        let located = self
            .bundle
            .locate(name, &self.extension)
            .await
            .map_err(|e| PlaybackError::InvalidSource(e.to_string()))?;

        match located {
            Some(path) => {
                debug!(
                    track_id = %track.id,
                    file = %strip_path(&path.to_string_lossy()),
                    "Resolved bundled track"
                );
                Ok(Locator::Bundled(path))
            }
            None => Err(PlaybackError::InvalidSource(format!(
                "no bundled resource named {}.{}",
                name, self.extension
            ))),
        }
    }
}

impl std::fmt::Debug for BundleSourceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleSourceResolver")
            .field("extension", &self.extension)
            .finish()
    }
}

#[async_trait]
impl SourceResolver for BundleSourceResolver {
    async fn resolve(&self, track: &Track) -> Result<Locator> {
        if track.is_local {
            self.resolve_local(track).await
        } else {
            self.resolve_remote(track)
        }
    }
}
