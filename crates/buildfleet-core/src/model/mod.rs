//! Data model for buildfleet deployments.
//!
//! Everything here is an immutable value tree: the parser and resolver build
//! fresh structures and never share mutable state.

mod deployment;
mod descriptor;
mod fleet;
mod placement;
mod platform;
mod volume;

// Re-exports
pub use deployment::*;
pub use descriptor::*;
pub use fleet::*;
pub use placement::*;
pub use platform::*;
pub use volume::*;
