//! Network, controller, cache node and desktop node parsing.

use super::{arg_string, arg_strings, arg_u32, prop_string, prop_u32};
use crate::error::{FleetError, Result};
use crate::model::{ControllerSettings, NetworkSettings, Placement};
use kdl::KdlNode;

const DEFAULT_CACHE_INSTANCE_TYPE: &str = "t3.large";
const DEFAULT_DESKTOP_INSTANCE_TYPE: &str = "mac2.metal";
const DEFAULT_DESKTOP_VOLUME_GB: u32 = 200;

/// parse a `network` node
pub fn parse_network(node: &KdlNode) -> Result<NetworkSettings> {
    let mut network = NetworkSettings {
        network_id: prop_string(node, "id"),
        ..Default::default()
    };
    if let Some(cidr) = prop_string(node, "cidr") {
        network.cidr = cidr;
    }

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "subnet" => {
                    let subnet_id = arg_string(child, 0).ok_or_else(|| {
                        FleetError::InvalidConfig("subnet requires an id".to_string())
                    })?;
                    let zone = prop_string(child, "zone").ok_or_else(|| {
                        FleetError::InvalidConfig(format!(
                            "subnet '{subnet_id}' requires zone=\"...\""
                        ))
                    })?;
                    network.subnets.push(Placement::new(subnet_id, zone));
                }
                "allow" | "allow-cidr" | "allow_cidr" => {
                    network.allowed_cidrs.extend(arg_strings(child));
                }
                _ => {}
            }
        }
    }

    Ok(network)
}

/// parse a `controller` node
pub fn parse_controller(node: &KdlNode) -> Result<ControllerSettings> {
    let mut controller = ControllerSettings::default();

    if let Some(cpu) = prop_u32(node, "cpu") {
        controller.cpu = cpu;
    }
    if let Some(memory) = prop_u32(node, "memory") {
        controller.memory_mib = memory;
    }

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "certificate" => {
                    controller.certificate_arn = arg_string(child, 0).map(str::to_string);
                }
                "license-server" | "license_server" => {
                    controller.license_server_url = arg_string(child, 0).map(str::to_string);
                }
                _ => {}
            }
        }
    }

    Ok(controller)
}

/// Cache node before subnet linking.
pub struct RawCacheNode {
    pub volume_gb: u32,
    pub instance_type: String,
    pub subnet_ref: Option<String>,
}

/// parse a `cache-node` node
pub fn parse_cache_node(node: &KdlNode) -> Result<RawCacheNode> {
    let mut volume_gb = prop_u32(node, "volume");
    let mut instance_type = None;
    let mut subnet_ref = None;

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "volume" => volume_gb = arg_u32(child, 0),
                "instance-type" | "instance_type" => {
                    instance_type = arg_string(child, 0).map(str::to_string);
                }
                "subnet" => subnet_ref = arg_string(child, 0).map(str::to_string),
                _ => {}
            }
        }
    }

    Ok(RawCacheNode {
        volume_gb: volume_gb.ok_or_else(|| {
            FleetError::InvalidConfig("cache-node requires a volume size in GiB".to_string())
        })?,
        instance_type: instance_type.unwrap_or_else(|| DEFAULT_CACHE_INSTANCE_TYPE.to_string()),
        subnet_ref,
    })
}

/// Desktop agent before subnet linking.
pub struct RawDesktop {
    pub name: String,
    pub image_id: String,
    pub instance_type: String,
    pub volume_gb: u32,
    pub subnet_ref: Option<String>,
}

/// parse a `desktop` node
pub fn parse_desktop(node: &KdlNode) -> Result<RawDesktop> {
    let name = arg_string(node, 0)
        .ok_or_else(|| FleetError::InvalidConfig("desktop requires a name".to_string()))?
        .to_string();

    let mut image_id = prop_string(node, "image");
    let mut instance_type = None;
    let mut volume_gb = None;
    let mut subnet_ref = None;

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "image" => image_id = arg_string(child, 0).map(str::to_string),
                "instance-type" | "instance_type" => {
                    instance_type = arg_string(child, 0).map(str::to_string);
                }
                "volume" => volume_gb = arg_u32(child, 0),
                "subnet" => subnet_ref = arg_string(child, 0).map(str::to_string),
                _ => {}
            }
        }
    }

    Ok(RawDesktop {
        image_id: image_id.ok_or_else(|| {
            FleetError::InvalidConfig(format!("desktop '{name}': image is required"))
        })?,
        name,
        instance_type: instance_type.unwrap_or_else(|| DEFAULT_DESKTOP_INSTANCE_TYPE.to_string()),
        volume_gb: volume_gb.unwrap_or(DEFAULT_DESKTOP_VOLUME_GB),
        subnet_ref,
    })
}
