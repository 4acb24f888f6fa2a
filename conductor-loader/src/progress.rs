//! Loader progress notifications.
//!
//! Observers are passive: the loader never reads anything back from them, so
//! attaching or removing one cannot change a run's result.

use conductor_core::ComponentDescriptor;

use crate::report::{LoadOutcome, SuiteClassification};

/// A loader state transition.
///
/// For a manifest of `n` descriptors an observer sees, in order:
/// `Starting` and `Settled` for each index `0..n`, then `Completed` and
/// `Classified` at index `n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressStatus {
    Starting,
    Settled {
        outcome: LoadOutcome,
        error: Option<String>,
        loaded: usize,
        failed: usize,
    },
    Completed {
        loaded: usize,
        failed: usize,
        elapsed_ms: u128,
    },
    Classified(SuiteClassification),
}

pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, descriptors: &[ComponentDescriptor], index: usize, status: &ProgressStatus);
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&self, _: &[ComponentDescriptor], _: usize, _: &ProgressStatus) {}
}
