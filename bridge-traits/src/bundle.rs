//! Bundled resource lookup.
//!
//! Local tracks are shipped with the host application and addressed by name.
//! The host decides where its bundle lives (an app bundle on iOS, an assets
//! directory on desktop, a static path on the web).

use crate::error::Result;
use std::path::PathBuf;

/// Read-only namespace of resources bundled with the host application.
#[async_trait::async_trait]
pub trait ResourceBundle: Send + Sync {
    /// Locate `<name>.<extension>`.
    ///
    /// Returns `Ok(None)` when the bundle has no such resource; errors are
    /// reserved for failures of the lookup itself.
    async fn locate(&self, name: &str, extension: &str) -> Result<Option<PathBuf>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        Bundle {}

        #[async_trait]
        impl ResourceBundle for Bundle {
            async fn locate(&self, name: &str, extension: &str) -> Result<Option<PathBuf>>;
        }
    }

    #[tokio::test]
    async fn bundle_lookup_reports_missing_resource() {
        let mut bundle = MockBundle::new();
        bundle
            .expect_locate()
            .with(eq("intro"), eq("mp3"))
            .times(1)
            .returning(|_, _| Ok(Some(PathBuf::from("/bundle/intro.mp3"))));
        bundle
            .expect_locate()
            .with(eq("missing"), eq("mp3"))
            .times(1)
            .returning(|_, _| Ok(None));

        let bundle: &dyn ResourceBundle = &bundle;
        assert_eq!(
            bundle.locate("intro", "mp3").await.unwrap(),
            Some(PathBuf::from("/bundle/intro.mp3"))
        );
        assert_eq!(bundle.locate("missing", "mp3").await.unwrap(), None);
    }

    #[tokio::test]
    async fn bundle_lookup_propagates_errors() {
        let mut bundle = MockBundle::new();
        bundle
            .expect_locate()
            .returning(|_, _| Err(BridgeError::NotAvailable("bundle unmounted".into())));

        let err = bundle.locate("intro", "mp3").await.unwrap_err();
        assert!(matches!(err, BridgeError::NotAvailable(_)));
    }
}
