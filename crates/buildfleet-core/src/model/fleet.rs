//! Sparse fleet requests as supplied by the user.

use super::placement::Placement;
use super::platform::Platform;
use serde::{Deserialize, Serialize};

/// A partially-specified build agent fleet.
///
/// Every field except the identity may be omitted; the resolver fills the
/// gaps from the platform default record. The instance count between
/// `min_capacity` and `max_capacity` is controlled at runtime by the CI
/// controller, not by this tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetRequest {
    /// Unique identifier for this fleet
    pub name: String,

    /// Node label the controller schedules jobs onto
    pub label: String,

    /// Operating-system family, selected by the caller
    #[serde(default)]
    pub platform: Platform,

    pub min_capacity: Option<u32>,
    pub max_capacity: Option<u32>,

    /// Candidate hardware profiles, tried in order by the engine
    #[serde(default)]
    pub instance_types: Vec<String>,

    /// Root volume size (GiB)
    pub root_volume_gb: Option<u32>,

    /// Persistent secondary volume shared across instance generations
    pub data_volume: Option<DataVolumeRequest>,

    /// Subnets the fleet may launch into
    #[serde(default)]
    pub placements: Vec<Placement>,

    /// Machine image override
    pub image_id: Option<String>,

    /// Directory the agent works under
    pub fs_root: Option<String>,

    /// Fragment prepended to the agent launch command
    pub command_prefix: Option<String>,

    /// Fragment appended to the agent launch command
    pub command_suffix: Option<String>,

    /// Concurrent executors per node
    pub executors: Option<u32>,

    /// SSH connect tuning for the controller -> agent link
    pub connect: Option<ConnectTuning>,
}

/// Request for a fleet's persistent data volume.
///
/// A data volume is not deleted when its attaching instance is terminated;
/// it is picked up again by replacement instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataVolumeRequest {
    /// Volume size (GiB)
    pub size_gb: u32,

    pub iops: Option<u32>,
    pub throughput_mbps: Option<u32>,
}

/// Sparse SSH connect tuning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectTuning {
    pub timeout_secs: Option<u32>,
    pub max_retries: Option<u32>,
    pub retry_wait_secs: Option<u32>,
}
