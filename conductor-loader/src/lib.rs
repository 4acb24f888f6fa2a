//! Sequential component loading: host primitives, the loader itself, progress
//! notification and the suite bootstrap/teardown entry points.

mod config;
pub mod error;
pub mod host;
pub mod loader;
pub mod progress;
pub mod report;
pub mod suite;

pub use config::{
    LoaderConfig, ACTIVATION_TIMEOUT, READINESS_POLL_INTERVAL, READINESS_TIMEOUT, SETTLE_DELAY,
};
pub use error::{HostError, SuiteError};
pub use host::{
    Activator, ComponentContext, ComponentScript, DeclarativeActivator, FetchedComponent,
    FsRetriever, Host, HttpRetriever, Retriever, RoutingRetriever,
};
pub use loader::SequentialLoader;
pub use progress::{NoopObserver, ProgressObserver, ProgressStatus};
pub use report::{LoadOutcome, LoadResult, SuiteClassification, SuiteResult};
pub use suite::{build_runtime, init_tracing, run_blocking, Suite, TeardownReport};
