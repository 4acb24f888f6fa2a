use std::time::Duration;

use async_trait::async_trait;

use super::{FetchedComponent, Retriever};
use crate::error::HostError;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn is_http_locator(locator: &str) -> bool {
    locator.starts_with("http://") || locator.starts_with("https://")
}

/// Fetches component content over HTTP on a blocking thread.
#[derive(Debug, Clone)]
pub struct HttpRetriever {
    timeout: Duration,
}

impl Default for HttpRetriever {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl HttpRetriever {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn retrieve(&self, locator: &str) -> Result<FetchedComponent, HostError> {
        let url = locator.to_string();
        let timeout = self.timeout;
        let content = tokio::task::spawn_blocking(move || fetch(&url, timeout))
            .await
            .map_err(|err| HostError::Join(err.to_string()))??;
        Ok(FetchedComponent {
            locator: locator.to_string(),
            content,
        })
    }
}

fn fetch(url: &str, timeout: Duration) -> Result<String, HostError> {
    let http_err = |message: String| HostError::Http {
        locator: url.to_string(),
        message,
    };
    let response = ureq::get(url)
        .timeout(timeout)
        .call()
        .map_err(|err| http_err(err.to_string()))?;
    response
        .into_string()
        .map_err(|err| http_err(format!("failed to read body: {err}")))
}
