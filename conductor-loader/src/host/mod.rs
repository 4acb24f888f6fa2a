//! Host primitives consumed by the loader.
//!
//! Retrieval fetches a component's content from its locator; activation runs
//! the fetched content against a [`ComponentContext`]. Both may suspend.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use conductor_core::{ComponentDescriptor, Directory, ResourceTracker};

use crate::error::HostError;

pub mod declarative;
pub mod fs;
pub mod http;

pub use declarative::{ComponentScript, DeclarativeActivator};
pub use fs::FsRetriever;
pub use http::HttpRetriever;

/// Content fetched for one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedComponent {
    pub locator: String,
    pub content: String,
}

/// What an activated component receives: its own descriptor plus the shared
/// directory and resource ledger of the suite.
#[derive(Debug, Clone)]
pub struct ComponentContext {
    pub descriptor: ComponentDescriptor,
    pub directory: Directory,
    pub tracker: Arc<ResourceTracker>,
}

#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, locator: &str) -> Result<FetchedComponent, HostError>;
}

#[async_trait]
pub trait Activator: Send + Sync {
    async fn activate(
        &self,
        component: FetchedComponent,
        context: ComponentContext,
    ) -> Result<(), HostError>;
}

/// The retrieval and activation primitives a suite runs against.
#[derive(Clone)]
pub struct Host {
    pub retriever: Arc<dyn Retriever>,
    pub activator: Arc<dyn Activator>,
}

impl Host {
    pub fn new(retriever: Arc<dyn Retriever>, activator: Arc<dyn Activator>) -> Self {
        Self {
            retriever,
            activator,
        }
    }

    /// Filesystem + HTTP retrieval with declarative component scripts.
    /// Relative file locators resolve against `base_dir`.
    pub fn declarative(base_dir: impl Into<PathBuf>) -> Self {
        Self::new(
            Arc::new(RoutingRetriever::new(
                FsRetriever::new(base_dir),
                HttpRetriever::default(),
            )),
            Arc::new(DeclarativeActivator),
        )
    }
}

/// Dispatches `http://` / `https://` locators to HTTP, everything else to the
/// filesystem.
#[derive(Debug, Clone)]
pub struct RoutingRetriever {
    fs: FsRetriever,
    http: HttpRetriever,
}

impl RoutingRetriever {
    pub fn new(fs: FsRetriever, http: HttpRetriever) -> Self {
        Self { fs, http }
    }
}

#[async_trait]
impl Retriever for RoutingRetriever {
    async fn retrieve(&self, locator: &str) -> Result<FetchedComponent, HostError> {
        if http::is_http_locator(locator) {
            self.http.retrieve(locator).await
        } else {
            self.fs.retrieve(locator).await
        }
    }
}
