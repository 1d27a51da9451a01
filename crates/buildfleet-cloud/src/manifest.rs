//! Deployment manifests.
//!
//! The manifest is the serialized handoff to the external provisioning
//! engine: a versioned, timestamped snapshot of every declared resource.

use crate::error::Result;
use crate::resource::{ResourceConfig, ResourceSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MANIFEST_VERSION: u32 = 1;

/// A complete, ordered resource declaration for one deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version
    pub version: u32,

    /// Deployment name
    pub deployment: String,

    /// Target region
    pub region: String,

    /// When this manifest was synthesized
    pub generated_at: DateTime<Utc>,

    /// Declared resources, ordered by type:id
    pub resources: Vec<ResourceConfig>,
}

impl Manifest {
    pub fn new(deployment: impl Into<String>, region: impl Into<String>, set: ResourceSet) -> Self {
        Self {
            version: MANIFEST_VERSION,
            deployment: deployment.into(),
            region: region.into(),
            generated_at: Utc::now(),
            resources: set.into_sorted(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the manifest to a file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            resources = self.resources.len(),
            "wrote manifest"
        );
        Ok(())
    }
}
