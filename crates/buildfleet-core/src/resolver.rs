//! Fleet configuration resolution.
//!
//! Merges a sparse [`FleetRequest`] with the platform default record into a
//! complete [`AgentDescriptor`]. One deterministic precedence rule applies to
//! every field: explicit user value, else platform default, else baseline.
//! The resolver is a pure transform: it runs once per fleet declaration,
//! touches nothing outside its inputs, and either returns a complete
//! descriptor or a configuration error with no partial output.

use crate::error::{FleetError, Result};
use crate::model::{
    AgentDescriptor, ConnectSettings, DataVolumeSpec, FleetRequest, Placement, VolumePoolEntry,
};
use tracing::debug;

/// Root volume size applied when neither the request nor the platform says
/// otherwise (GiB).
pub const BASELINE_ROOT_VOLUME_GB: u32 = 30;

/// Hardware profile used when the request names none.
pub const BASELINE_INSTANCE_TYPE: &str = "t3.medium";

/// Data volume performance applied when the request leaves it open.
pub const BASELINE_DATA_VOLUME_IOPS: u32 = 3000;
pub const BASELINE_DATA_VOLUME_THROUGHPUT_MBPS: u32 = 200;

const BASELINE_CAPACITY: u32 = 1;
const BASELINE_EXECUTORS: u32 = 1;

/// Resolve a sparse fleet request into a complete descriptor.
///
/// `deployment` namespaces the correlation tag so fleets of different
/// deployments never claim each other's pool volumes.
pub fn resolve(deployment: &str, request: &FleetRequest) -> Result<AgentDescriptor> {
    if request.placements.is_empty() {
        return Err(FleetError::NoPlacements {
            fleet: request.name.clone(),
        });
    }

    let min_capacity = request.min_capacity.unwrap_or(BASELINE_CAPACITY);
    let max_capacity = request.max_capacity.unwrap_or(BASELINE_CAPACITY);
    if max_capacity < min_capacity {
        return Err(FleetError::InvalidConfig(format!(
            "fleet '{}': max capacity {} is below min capacity {}",
            request.name, max_capacity, min_capacity
        )));
    }

    let defaults = request.platform.defaults(request.data_volume.is_some());
    let kind_tag = format!("{}-{}", deployment, request.name);

    let data_volume = request.data_volume.as_ref().map(|req| DataVolumeSpec {
        size_gb: req.size_gb,
        iops: req.iops.unwrap_or(BASELINE_DATA_VOLUME_IOPS),
        throughput_mbps: req
            .throughput_mbps
            .unwrap_or(BASELINE_DATA_VOLUME_THROUGHPUT_MBPS),
    });

    let volume_pool = match &data_volume {
        Some(spec) => volume_pool(
            &request.name,
            &kind_tag,
            spec,
            max_capacity,
            &request.placements,
        ),
        None => Vec::new(),
    };

    let instance_types = if request.instance_types.is_empty() {
        vec![BASELINE_INSTANCE_TYPE.to_string()]
    } else {
        request.instance_types.clone()
    };

    let connect = request.connect.clone().unwrap_or_default();

    let descriptor = AgentDescriptor {
        name: request.name.clone(),
        label: request.label.clone(),
        platform: request.platform,
        min_capacity,
        max_capacity,
        instance_types,
        image_id: request
            .image_id
            .clone()
            .unwrap_or_else(|| defaults.image_id.to_string()),
        root_device: defaults.root_device.to_string(),
        root_volume_gb: request.root_volume_gb.unwrap_or(BASELINE_ROOT_VOLUME_GB),
        data_volume,
        placements: request.placements.clone(),
        fs_root: request
            .fs_root
            .clone()
            .unwrap_or_else(|| defaults.fs_root.to_string()),
        command_prefix: request
            .command_prefix
            .clone()
            .unwrap_or_else(|| defaults.command_prefix.to_string()),
        command_suffix: request
            .command_suffix
            .clone()
            .unwrap_or_else(|| defaults.command_suffix.to_string()),
        credentials_id: defaults.credentials_id.to_string(),
        executors: request.executors.unwrap_or(BASELINE_EXECUTORS),
        connect: ConnectSettings {
            timeout_secs: connect.timeout_secs.unwrap_or(defaults.connect_timeout_secs),
            max_retries: connect.max_retries.unwrap_or(defaults.connect_max_retries),
            retry_wait_secs: connect
                .retry_wait_secs
                .unwrap_or(defaults.connect_retry_wait_secs),
        },
        kind_tag,
        volume_pool,
    };

    debug!(
        fleet = %descriptor.name,
        platform = %descriptor.platform,
        pool_volumes = descriptor.volume_pool.len(),
        "resolved fleet"
    );

    Ok(descriptor)
}

/// Slots per placement: `ceil(max_capacity / placement_count)`, so the pool
/// covers the fleet even at max capacity with an uneven zone spread.
fn slots_per_placement(max_capacity: u32, placement_count: usize) -> u32 {
    max_capacity.div_ceil(placement_count as u32)
}

fn volume_pool(
    fleet: &str,
    kind_tag: &str,
    spec: &DataVolumeSpec,
    max_capacity: u32,
    placements: &[Placement],
) -> Vec<VolumePoolEntry> {
    let slots = slots_per_placement(max_capacity, placements.len());

    let mut pool = Vec::with_capacity(placements.len() * slots as usize);
    for (zone_index, placement) in placements.iter().enumerate() {
        for slot in 0..slots {
            pool.push(VolumePoolEntry {
                id: format!("{}-data-{}-{}", fleet, zone_index, slot),
                availability_zone: placement.availability_zone.clone(),
                size_gb: spec.size_gb,
                iops: spec.iops,
                throughput_mbps: spec.throughput_mbps,
                kind_tag: kind_tag.to_string(),
            });
        }
    }
    pool
}
