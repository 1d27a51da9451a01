//! Buildfleet cloud declaration layer.
//!
//! Synthesizes a parsed deployment into the declarative resource graph an
//! external provisioning engine consumes. This crate declares resources; it
//! never creates them. Diffing, rollout and rollback belong to the engine.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               buildfleet CLI                 │
//! │             (synth / validate)               │
//! └──────────────────┬──────────────────────────┘
//!                    │ Deployment
//! ┌──────────────────▼──────────────────────────┐
//! │             buildfleet-cloud                 │
//! │  resolve fleets -> ResourceSet -> Manifest   │
//! │  render controller configuration payload     │
//! └──────────────────┬──────────────────────────┘
//!                    │ manifest.json
//! ┌──────────────────▼──────────────────────────┐
//! │       external provisioning engine           │
//! └─────────────────────────────────────────────┘
//! ```

pub mod controller;
pub mod error;
pub mod manifest;
pub mod resource;
pub mod synth;

// Re-exports
pub use controller::{
    desktop_host_env, fleet_group_env, fleet_template_env, render_controller_config,
};
pub use error::{CloudError, Result};
pub use manifest::{MANIFEST_VERSION, Manifest};
pub use resource::{ResourceConfig, ResourceSet, attr_ref};
pub use synth::{Synthesis, synthesize};
