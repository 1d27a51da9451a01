//! Placement definition

use serde::{Deserialize, Serialize};

/// An availability-zone-scoped subnet that fleet instances may be launched
/// into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Subnet identifier
    pub subnet_id: String,

    /// Availability zone the subnet lives in
    pub availability_zone: String,
}

impl Placement {
    pub fn new(subnet_id: impl Into<String>, availability_zone: impl Into<String>) -> Self {
        Self {
            subnet_id: subnet_id.into(),
            availability_zone: availability_zone.into(),
        }
    }
}
