use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{FetchedComponent, Retriever};
use crate::error::{io_err, HostError};

/// Reads component content from disk.
#[derive(Debug, Clone)]
pub struct FsRetriever {
    base_dir: PathBuf,
}

impl FsRetriever {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// `locator` joined onto the base directory; absolute locators win.
    pub fn resolve(&self, locator: &str) -> PathBuf {
        self.base_dir.join(Path::new(locator))
    }
}

#[async_trait]
impl Retriever for FsRetriever {
    async fn retrieve(&self, locator: &str) -> Result<FetchedComponent, HostError> {
        let path = self.resolve(locator);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| io_err(&path, e))?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "component retrieved");
        Ok(FetchedComponent {
            locator: locator.to_string(),
            content,
        })
    }
}
