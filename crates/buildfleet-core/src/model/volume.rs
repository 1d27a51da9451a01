//! Volume pool definitions

use serde::{Deserialize, Serialize};

/// One durable slot in a fleet's data volume pool.
///
/// Pool entries are derived, never user-supplied: the resolver creates
/// `ceil(max_capacity / placement_count)` entries per placement. A pool
/// volume survives the instance attached to it and is only destroyed when
/// the entry itself is removed from the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumePoolEntry {
    /// Stable identifier of the pool entry
    pub id: String,

    /// Availability zone the volume is created in
    pub availability_zone: String,

    /// Volume size (GiB)
    pub size_gb: u32,

    pub iops: u32,
    pub throughput_mbps: u32,

    /// Correlation tag agents use to locate a free pool volume at boot
    pub kind_tag: String,
}
