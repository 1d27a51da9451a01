//! Resolved agent fleet descriptors.

use super::fleet::{ConnectTuning, DataVolumeRequest, FleetRequest};
use super::placement::Placement;
use super::platform::Platform;
use super::volume::VolumePoolEntry;
use serde::{Deserialize, Serialize};

/// Fully-resolved, defaults-applied configuration for one fleet, ready to be
/// handed to the provisioning engine and to the controller configuration
/// payload. Carries no unresolved optional fields: an absent `data_volume`
/// means the fleet has no persistent data drive, not "unspecified".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub name: String,
    pub label: String,
    pub platform: Platform,

    pub min_capacity: u32,
    pub max_capacity: u32,
    pub instance_types: Vec<String>,

    pub image_id: String,
    pub root_device: String,
    pub root_volume_gb: u32,
    pub data_volume: Option<DataVolumeSpec>,

    pub placements: Vec<Placement>,

    pub fs_root: String,
    pub command_prefix: String,
    pub command_suffix: String,
    pub credentials_id: String,
    pub executors: u32,
    pub connect: ConnectSettings,

    /// Tag correlating pool volumes with their owning fleet
    pub kind_tag: String,

    /// Derived data volume pool (empty without a data volume)
    pub volume_pool: Vec<VolumePoolEntry>,
}

/// Resolved data volume parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataVolumeSpec {
    pub size_gb: u32,
    pub iops: u32,
    pub throughput_mbps: u32,
}

/// Resolved SSH connect behavior for the controller -> agent link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectSettings {
    pub timeout_secs: u32,
    pub max_retries: u32,
    pub retry_wait_secs: u32,
}

impl From<&AgentDescriptor> for FleetRequest {
    /// Reinterpret a resolved descriptor as a (fully-specified) request.
    /// Resolution is a fixed point over this conversion.
    fn from(d: &AgentDescriptor) -> Self {
        FleetRequest {
            name: d.name.clone(),
            label: d.label.clone(),
            platform: d.platform,
            min_capacity: Some(d.min_capacity),
            max_capacity: Some(d.max_capacity),
            instance_types: d.instance_types.clone(),
            root_volume_gb: Some(d.root_volume_gb),
            data_volume: d.data_volume.as_ref().map(|v| DataVolumeRequest {
                size_gb: v.size_gb,
                iops: Some(v.iops),
                throughput_mbps: Some(v.throughput_mbps),
            }),
            placements: d.placements.clone(),
            image_id: Some(d.image_id.clone()),
            fs_root: Some(d.fs_root.clone()),
            command_prefix: Some(d.command_prefix.clone()),
            command_suffix: Some(d.command_suffix.clone()),
            executors: Some(d.executors),
            connect: Some(ConnectTuning {
                timeout_secs: Some(d.connect.timeout_secs),
                max_retries: Some(d.connect.max_retries),
                retry_wait_secs: Some(d.connect.retry_wait_secs),
            }),
        }
    }
}
