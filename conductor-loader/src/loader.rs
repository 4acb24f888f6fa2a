//! Sequential component loader.
//!
//! Walks a manifest strictly in order. Descriptor `i + 1` is not retrieved
//! until descriptor `i` has resolved (success, failure or timeout). Every
//! failure is converted into a [`LoadResult`]; nothing escapes a run.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use conductor_core::{
    panic_message, ComponentDescriptor, ComponentId, Directory, Manifest, ResourceTracker,
};
use tokio::sync::oneshot;
use tokio::time::{timeout, Instant, MissedTickBehavior};

use crate::config::LoaderConfig;
use crate::error::HostError;
use crate::host::{ComponentContext, Host};
use crate::progress::{ProgressObserver, ProgressStatus};
use crate::report::{LoadOutcome, LoadResult, SuiteResult};

pub struct SequentialLoader {
    directory: Directory,
    tracker: Arc<ResourceTracker>,
    host: Host,
    config: LoaderConfig,
    observers: Vec<Arc<dyn ProgressObserver>>,
}

impl SequentialLoader {
    pub fn new(
        directory: Directory,
        tracker: Arc<ResourceTracker>,
        host: Host,
        config: LoaderConfig,
    ) -> Self {
        Self {
            directory,
            tracker,
            host,
            config,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load every descriptor of `manifest`, in order.
    ///
    /// May be called again after completion; a second run re-walks the whole
    /// manifest without consulting earlier results.
    pub async fn run(&self, manifest: &Manifest) -> SuiteResult {
        let started = Instant::now();
        let descriptors = manifest.descriptors();
        let mut suite = SuiteResult::default();

        tracing::info!(components = descriptors.len(), "suite load started");

        for (index, descriptor) in descriptors.iter().enumerate() {
            self.notify(descriptors, index, ProgressStatus::Starting);

            let result = self.load_component(descriptor).await;
            log_result(&result);

            let status = ProgressStatus::Settled {
                outcome: result.outcome,
                error: result.error_message.clone(),
                loaded: suite.successful.len() + usize::from(result.outcome.is_success()),
                failed: suite.failed.len() + usize::from(!result.outcome.is_success()),
            };
            suite.record(result);
            self.notify(descriptors, index, status);
        }

        suite.total_elapsed_ms = started.elapsed().as_millis();
        let classification = suite.classification();

        tracing::info!(
            loaded = suite.successful.len(),
            failed = suite.failed.len(),
            unconfirmed = suite.unconfirmed().count(),
            elapsed_ms = suite.total_elapsed_ms,
            classification = %classification,
            "suite load finished",
        );

        self.notify(
            descriptors,
            descriptors.len(),
            ProgressStatus::Completed {
                loaded: suite.successful.len(),
                failed: suite.failed.len(),
                elapsed_ms: suite.total_elapsed_ms,
            },
        );
        self.notify(
            descriptors,
            descriptors.len(),
            ProgressStatus::Classified(classification),
        );
        suite
    }

    async fn load_component(&self, descriptor: &ComponentDescriptor) -> LoadResult {
        let started = Instant::now();
        let attempt = self.spawn_attempt(descriptor);

        let activation = match timeout(self.config.activation_timeout, attempt).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(err))) => Err(err.to_string()),
            Ok(Err(_)) => Err("activation aborted before resolving (task panicked)".to_string()),
            Err(_) => Err(format!(
                "retrieval/activation timed out after {} ms",
                self.config.activation_timeout.as_millis()
            )),
        };

        if let Err(message) = activation {
            return LoadResult::failed(descriptor, message, started.elapsed());
        }

        let outcome = if descriptor.critical {
            if self.await_registration(&descriptor.id).await {
                LoadOutcome::Confirmed
            } else {
                LoadOutcome::Unconfirmed
            }
        } else {
            tokio::time::sleep(self.config.settle_delay).await;
            LoadOutcome::Loaded
        };

        let missing = self.directory.missing_dependencies(descriptor.id.as_str());
        if !missing.is_empty() {
            tracing::warn!(
                component = %descriptor.id,
                missing = ?missing,
                "component loaded with unregistered dependencies",
            );
        }
        LoadResult::succeeded(descriptor, outcome, started.elapsed(), missing)
    }

    /// Retrieve + activate on a separate task.
    ///
    /// The result comes back over a oneshot channel. Once the loader has
    /// stopped waiting (timeout) the receiver is gone, so a late resolution
    /// fails to send and is dropped instead of being applied a second time.
    fn spawn_attempt(
        &self,
        descriptor: &ComponentDescriptor,
    ) -> oneshot::Receiver<Result<(), HostError>> {
        let (tx, rx) = oneshot::channel();
        let host = self.host.clone();
        let locator = descriptor.retrieval_locator.clone();
        let id = descriptor.id.clone();
        let context = ComponentContext {
            descriptor: descriptor.clone(),
            directory: self.directory.clone(),
            tracker: self.tracker.clone(),
        };

        tokio::spawn(async move {
            let result = retrieve_and_activate(&host, &locator, context).await;
            if tx.send(result).is_err() {
                tracing::debug!(component = %id, "late activation result ignored");
            }
        });
        rx
    }

    /// Poll the directory until `id` is registered or the readiness timeout
    /// elapses.
    async fn await_registration(&self, id: &ComponentId) -> bool {
        if self.directory.has(id.as_str()) {
            return true;
        }
        let poll = async {
            let mut interval = tokio::time::interval(self.config.readiness_poll);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if self.directory.has(id.as_str()) {
                    break;
                }
            }
        };
        timeout(self.config.readiness_timeout, poll).await.is_ok()
    }

    /// Observers are passive; one that panics is logged and skipped.
    fn notify(&self, descriptors: &[ComponentDescriptor], index: usize, status: ProgressStatus) {
        for observer in &self.observers {
            let delivered = catch_unwind(AssertUnwindSafe(|| {
                observer.on_progress(descriptors, index, &status)
            }));
            if let Err(panic) = delivered {
                tracing::warn!(
                    index,
                    error = %panic_message(panic.as_ref()),
                    "progress observer panicked",
                );
            }
        }
    }
}

async fn retrieve_and_activate(
    host: &Host,
    locator: &str,
    context: ComponentContext,
) -> Result<(), HostError> {
    let fetched = host.retriever.retrieve(locator).await?;
    host.activator.activate(fetched, context).await
}

fn log_result(result: &LoadResult) {
    let id = &result.descriptor.id;
    let error = result.error_message.as_deref().unwrap_or_default();
    match (result.outcome, result.descriptor.critical) {
        (LoadOutcome::Failed, true) => {
            tracing::error!(component = %id, error, "critical component failed to load; dependents will be degraded");
        }
        (LoadOutcome::Failed, false) => {
            tracing::debug!(component = %id, error, "optional component failed to load");
        }
        (LoadOutcome::Unconfirmed, _) => {
            tracing::warn!(component = %id, elapsed_ms = result.elapsed_ms, "critical component did not confirm registration");
        }
        (outcome, _) => {
            tracing::info!(component = %id, %outcome, elapsed_ms = result.elapsed_ms, "component loaded");
        }
    }
}
