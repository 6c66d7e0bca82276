//! Persisted resource state
//!
//! Each managed object lives in its own JSON document:
//!
//! ```json
//! {
//!   "kind": "group",
//!   "id": "c6a0...",
//!   "attributes": { "id": "c6a0...", "name": "Analysts" },
//!   "last_updated": "2026-01-02T03:04:05Z"
//! }
//! ```

use crate::resource::ResourceKind;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

// ============================================================================
// State Document
// ============================================================================

/// State of one managed object
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StateDocument {
    /// Resource type that owns these attributes
    pub kind: ResourceKind,

    /// Resource ID, also present in `attributes`
    pub id: String,

    /// Adapter attributes as of the last create, update or read
    pub attributes: Value,

    /// Last time the object was written through this tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl StateDocument {
    /// Wrap adapter attributes, taking the ID from `attributes.id`
    pub fn new(kind: ResourceKind, attributes: Value) -> Result<Self> {
        let id = attributes
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .with_context(|| format!("{kind} attributes carry no ID"))?
            .to_string();
        Ok(Self {
            kind,
            id,
            attributes,
            last_updated: None,
        })
    }

    /// Replace the attributes, keeping kind and timestamp
    pub fn with_attributes(self, attributes: Value) -> Result<Self> {
        Ok(Self {
            last_updated: self.last_updated,
            ..Self::new(self.kind, attributes)?
        })
    }

    /// Stamp `last_updated` with the current time
    pub fn touch(&mut self) {
        self.last_updated = Some(Utc::now());
    }

    /// Load a state document
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        let state: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;
        log::debug!("Loaded {} state from {}", state.kind, path.display());
        Ok(state)
    }

    /// Save the document, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize state")?;
        fs::write(path, content + "\n")
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;
        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Remove the document; a missing file is not an error
    pub fn remove(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove state file: {}", path.display())),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
