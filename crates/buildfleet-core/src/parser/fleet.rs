//! Fleet node parsing.

use super::{arg_string, arg_strings, arg_u32, prop_string, prop_u32};
use crate::error::{FleetError, Result};
use crate::model::{ConnectTuning, DataVolumeRequest, FleetRequest, Platform};
use kdl::KdlNode;

/// Parse a `fleet` node into a sparse request plus its subnet references.
/// Subnet references are linked against the network after the whole document
/// has been read.
pub fn parse_fleet(node: &KdlNode) -> Result<(FleetRequest, Vec<String>)> {
    let name = arg_string(node, 0)
        .ok_or_else(|| FleetError::InvalidConfig("fleet requires a name".to_string()))?
        .to_string();

    let platform = match prop_string(node, "platform") {
        Some(value) => Platform::parse(&value).ok_or_else(|| {
            FleetError::InvalidConfig(format!(
                "fleet '{name}': unknown platform '{value}' (expected linux or windows)"
            ))
        })?,
        None => Platform::default(),
    };

    let mut request = FleetRequest {
        // the label defaults to the fleet name
        label: prop_string(node, "label").unwrap_or_else(|| name.clone()),
        name: name.clone(),
        platform,
        ..Default::default()
    };
    let mut subnet_refs = Vec::new();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "capacity" => {
                    request.min_capacity = prop_u32(child, "min");
                    request.max_capacity = prop_u32(child, "max");
                }
                "instance-types" | "instance_types" | "instance-type" | "instance_type" => {
                    request.instance_types = arg_strings(child);
                }
                "root-volume" | "root_volume" => {
                    request.root_volume_gb = arg_u32(child, 0);
                }
                "data-volume" | "data_volume" => {
                    let size_gb = arg_u32(child, 0).ok_or_else(|| {
                        FleetError::InvalidConfig(format!(
                            "fleet '{name}': data-volume requires a size in GiB"
                        ))
                    })?;
                    request.data_volume = Some(DataVolumeRequest {
                        size_gb,
                        iops: prop_u32(child, "iops"),
                        throughput_mbps: prop_u32(child, "throughput"),
                    });
                }
                "subnets" | "subnet" => {
                    subnet_refs.extend(arg_strings(child));
                }
                "image" => {
                    request.image_id = arg_string(child, 0).map(str::to_string);
                }
                "fs-root" | "fs_root" => {
                    request.fs_root = arg_string(child, 0).map(str::to_string);
                }
                "command-prefix" | "command_prefix" => {
                    request.command_prefix = arg_string(child, 0).map(str::to_string);
                }
                "command-suffix" | "command_suffix" => {
                    request.command_suffix = arg_string(child, 0).map(str::to_string);
                }
                "executors" => {
                    request.executors = arg_u32(child, 0);
                }
                "connect" => {
                    request.connect = Some(ConnectTuning {
                        timeout_secs: prop_u32(child, "timeout"),
                        max_retries: prop_u32(child, "retries"),
                        retry_wait_secs: prop_u32(child, "wait"),
                    });
                }
                "label" => {
                    if let Some(label) = arg_string(child, 0) {
                        request.label = label.to_string();
                    }
                }
                _ => {
                    // unknown children are skipped
                }
            }
        }
    }

    Ok((request, subnet_refs))
}
