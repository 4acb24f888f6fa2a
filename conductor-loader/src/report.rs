//! Per-component and per-run load results.

use std::fmt;
use std::time::Duration;

use conductor_core::ComponentDescriptor;
use serde::Serialize;

/// How one component's load attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOutcome {
    /// Optional component activated; no registration check is made.
    Loaded,
    /// Critical component activated and registered itself.
    Confirmed,
    /// Critical component activated but did not register within the readiness
    /// timeout. Counted as a success.
    Unconfirmed,
    Failed,
}

impl LoadOutcome {
    pub fn is_success(self) -> bool {
        !matches!(self, LoadOutcome::Failed)
    }
}

impl fmt::Display for LoadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadOutcome::Loaded => write!(f, "loaded"),
            LoadOutcome::Confirmed => write!(f, "confirmed"),
            LoadOutcome::Unconfirmed => write!(f, "unconfirmed"),
            LoadOutcome::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadResult {
    pub descriptor: ComponentDescriptor,
    pub outcome: LoadOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub elapsed_ms: u128,
    /// Declared dependencies that were absent once this component loaded.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_dependencies: Vec<String>,
}

impl LoadResult {
    pub(crate) fn succeeded(
        descriptor: &ComponentDescriptor,
        outcome: LoadOutcome,
        elapsed: Duration,
        missing_dependencies: Vec<String>,
    ) -> Self {
        Self {
            descriptor: descriptor.clone(),
            outcome,
            error_message: None,
            elapsed_ms: elapsed.as_millis(),
            missing_dependencies,
        }
    }

    pub(crate) fn failed(descriptor: &ComponentDescriptor, message: String, elapsed: Duration) -> Self {
        Self {
            descriptor: descriptor.clone(),
            outcome: LoadOutcome::Failed,
            error_message: Some(message),
            elapsed_ms: elapsed.as_millis(),
            missing_dependencies: vec![],
        }
    }

    pub fn id(&self) -> &str {
        self.descriptor.id.as_str()
    }
}

/// Terminal state of a suite run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuiteClassification {
    Success,
    /// Only optional components failed.
    Degraded,
    /// At least one critical component failed.
    CriticalFailure,
}

impl fmt::Display for SuiteClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuiteClassification::Success => write!(f, "success"),
            SuiteClassification::Degraded => write!(f, "degraded"),
            SuiteClassification::CriticalFailure => write!(f, "critical-failure"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuiteResult {
    pub successful: Vec<LoadResult>,
    pub failed: Vec<LoadResult>,
    pub total_elapsed_ms: u128,
}

impl SuiteResult {
    pub fn classification(&self) -> SuiteClassification {
        if self.failed.iter().any(|r| r.descriptor.critical) {
            SuiteClassification::CriticalFailure
        } else if !self.failed.is_empty() {
            SuiteClassification::Degraded
        } else {
            SuiteClassification::Success
        }
    }

    pub fn unconfirmed(&self) -> impl Iterator<Item = &LoadResult> {
        self.successful
            .iter()
            .filter(|r| r.outcome == LoadOutcome::Unconfirmed)
    }

    /// Number of descriptors the run attempted.
    pub fn attempted(&self) -> usize {
        self.successful.len() + self.failed.len()
    }

    pub(crate) fn record(&mut self, result: LoadResult) {
        if result.outcome.is_success() {
            self.successful.push(result);
        } else {
            self.failed.push(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, critical: bool, outcome: LoadOutcome) -> LoadResult {
        let descriptor = ComponentDescriptor::new(id, id, format!("{id}.yaml"), critical);
        match outcome {
            LoadOutcome::Failed => {
                LoadResult::failed(&descriptor, "boom".to_string(), Duration::ZERO)
            }
            other => LoadResult::succeeded(&descriptor, other, Duration::ZERO, vec![]),
        }
    }

    #[test]
    fn classification_follows_failure_criticality() {
        let mut suite = SuiteResult::default();
        suite.record(result("core", true, LoadOutcome::Unconfirmed));
        assert_eq!(suite.classification(), SuiteClassification::Success);

        suite.record(result("fab", false, LoadOutcome::Failed));
        assert_eq!(suite.classification(), SuiteClassification::Degraded);

        suite.record(result("settings", true, LoadOutcome::Failed));
        assert_eq!(suite.classification(), SuiteClassification::CriticalFailure);
        assert_eq!(suite.attempted(), 3);
        assert_eq!(suite.unconfirmed().count(), 1);
    }

    #[test]
    fn classification_serializes_kebab_case() {
        let json = serde_json::to_string(&SuiteClassification::CriticalFailure).expect("json");
        assert_eq!(json, "\"critical-failure\"");
    }
}
