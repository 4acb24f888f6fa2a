//! Ordered component manifest.
//!
//! # File layout
//!
//! ```text
//! settings:                       # optional loader timing overrides
//!   activation_timeout_ms: 30000
//!   readiness_timeout_ms: 10000
//!   readiness_poll_ms: 100
//!   settle_delay_ms: 500
//! components:
//!   - id: core
//!     name: Core Utilities
//!     locator: components/core.yaml
//!     critical: true
//! ```
//!
//! Manifest order is the load order. No dependency graph is computed; authors
//! list collaborators before their dependents.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;
use crate::types::ComponentDescriptor;

// ---------------------------------------------------------------------------
// 1. Manifest
// ---------------------------------------------------------------------------

/// Validated, read-only, ordered sequence of descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    descriptors: Vec<ComponentDescriptor>,
}

impl Manifest {
    /// Build a manifest, rejecting blank ids, blank locators and duplicate ids.
    pub fn new(descriptors: Vec<ComponentDescriptor>) -> Result<Self, ManifestError> {
        validate(&descriptors)?;
        Ok(Self { descriptors })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ComponentDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn descriptors(&self) -> &[ComponentDescriptor] {
        &self.descriptors
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ComponentDescriptor;
    type IntoIter = std::slice::Iter<'a, ComponentDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn validate(descriptors: &[ComponentDescriptor]) -> Result<(), ManifestError> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(descriptors.len());
    for (index, descriptor) in descriptors.iter().enumerate() {
        let id = descriptor.id.as_str();
        if id.trim().is_empty() {
            return Err(ManifestError::EmptyId { index });
        }
        if descriptor.retrieval_locator.trim().is_empty() {
            return Err(ManifestError::EmptyLocator { id: id.to_string() });
        }
        if let Some(first) = seen.insert(id, index) {
            return Err(ManifestError::DuplicateId {
                id: id.to_string(),
                first,
                second: index,
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// 2. File format
// ---------------------------------------------------------------------------

/// Optional loader timing overrides, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_poll_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    settings: ManifestSettings,
    #[serde(default)]
    components: Vec<ComponentDescriptor>,
}

/// A manifest read from disk, with its settings and the directory relative
/// locators resolve against.
#[derive(Debug, Clone)]
pub struct LoadedManifest {
    pub manifest: Manifest,
    pub settings: ManifestSettings,
    pub base_dir: PathBuf,
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// Load and validate the manifest at `path`.
///
/// Returns `ManifestError::NotFound` if absent, `ManifestError::Parse` (with
/// path + line context) if malformed YAML, and the validation variants for
/// configuration mistakes.
pub fn load_at(path: &Path) -> Result<LoadedManifest, ManifestError> {
    if !path.exists() {
        return Err(ManifestError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    let file: ManifestFile = serde_yaml::from_str(&contents).map_err(|e| ManifestError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(LoadedManifest {
        manifest: Manifest::new(file.components)?,
        settings: file.settings,
        base_dir,
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
