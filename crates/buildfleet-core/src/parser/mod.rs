//! KDL deployment parser.
//!
//! Parses `fleet.kdl` deployment files into a [`Deployment`] tree. Each node
//! kind has its own parse function; unknown nodes are skipped so deployment
//! files can carry annotations for other tooling.
//!
//! ```kdl
//! deployment "unity-ci" region="us-east-2"
//!
//! network cidr="10.0.0.0/16" {
//!     subnet "subnet-0a" zone="us-east-2a"
//!     subnet "subnet-0b" zone="us-east-2b"
//!     allow "203.0.113.0/24"
//! }
//!
//! fleet "linux" platform="linux" label="linux" {
//!     capacity min=1 max=4
//!     instance-types "c5.xlarge" "c5a.xlarge"
//!     data-volume 200
//! }
//! ```

mod fleet;
mod infra;

use fleet::parse_fleet;
use infra::{parse_cache_node, parse_controller, parse_desktop, parse_network};

use crate::error::{FleetError, Result};
use crate::model::{CacheNodeSettings, Deployment, DesktopRequest, Placement};
use kdl::{KdlDocument, KdlNode};
use std::fs;
use std::path::Path;

/// Parse a deployment file.
pub fn parse_deployment_file<P: AsRef<Path>>(path: P) -> Result<Deployment> {
    let content = fs::read_to_string(path.as_ref()).map_err(|e| FleetError::Io {
        path: path.as_ref().to_path_buf(),
        message: e.to_string(),
    })?;
    parse_deployment_str(&content)
}

/// Parse a deployment from KDL text.
pub fn parse_deployment_str(content: &str) -> Result<Deployment> {
    let doc: KdlDocument = content.parse()?;

    let mut name = None;
    let mut region = None;
    let mut network = None;
    let mut controller = None;
    let mut cache_raw = None;
    let mut fleets_raw = Vec::new();
    let mut desktops_raw = Vec::new();

    for node in doc.nodes() {
        match node.name().value() {
            "deployment" => {
                name = arg_string(node, 0).map(str::to_string);
                region = prop_string(node, "region");
            }
            "network" => network = Some(parse_network(node)?),
            "controller" => controller = Some(parse_controller(node)?),
            "cache-node" | "cache_node" => cache_raw = Some(parse_cache_node(node)?),
            "fleet" => fleets_raw.push(parse_fleet(node)?),
            "desktop" => desktops_raw.push(parse_desktop(node)?),
            _ => {
                // unknown nodes are skipped
            }
        }
    }

    let name = name.ok_or_else(|| {
        FleetError::InvalidConfig("a deployment node with a name is required".to_string())
    })?;
    let region = region.ok_or_else(|| {
        FleetError::InvalidConfig("deployment requires region=\"...\"".to_string())
    })?;

    let network = network.unwrap_or_default();
    let controller = controller.unwrap_or_default();

    // Link subnet references now that the network is known.
    let mut fleets = Vec::with_capacity(fleets_raw.len());
    for (mut request, subnet_refs) in fleets_raw {
        request.placements = if subnet_refs.is_empty() {
            // fleets without an explicit placement spread over every subnet
            network.subnets.clone()
        } else {
            subnet_refs
                .iter()
                .map(|id| lookup_subnet(&network.subnets, &request.name, id))
                .collect::<Result<Vec<_>>>()?
        };
        fleets.push(request);
    }

    let cache_node = match cache_raw {
        Some(raw) => Some(CacheNodeSettings {
            volume_gb: raw.volume_gb,
            instance_type: raw.instance_type,
            placement: default_placement(&network.subnets, "cache-node", raw.subnet_ref)?,
        }),
        None => None,
    };

    let mut desktops = Vec::with_capacity(desktops_raw.len());
    for raw in desktops_raw {
        desktops.push(DesktopRequest {
            placement: default_placement(&network.subnets, &raw.name, raw.subnet_ref)?,
            name: raw.name,
            image_id: raw.image_id,
            instance_type: raw.instance_type,
            volume_gb: raw.volume_gb,
        });
    }

    Ok(Deployment {
        name,
        region,
        network,
        controller,
        cache_node,
        fleets,
        desktops,
    })
}

fn lookup_subnet(subnets: &[Placement], node: &str, subnet_id: &str) -> Result<Placement> {
    subnets
        .iter()
        .find(|p| p.subnet_id == subnet_id)
        .cloned()
        .ok_or_else(|| FleetError::UnknownSubnet {
            node: node.to_string(),
            subnet: subnet_id.to_string(),
        })
}

/// Single-instance nodes default to the first declared subnet.
fn default_placement(
    subnets: &[Placement],
    node: &str,
    subnet_ref: Option<String>,
) -> Result<Placement> {
    match subnet_ref {
        Some(id) => lookup_subnet(subnets, node, &id),
        None => subnets.first().cloned().ok_or_else(|| {
            FleetError::InvalidConfig(format!(
                "'{node}' needs at least one subnet declared in the network"
            ))
        }),
    }
}

// Entry helpers shared by the node parsers. KDL entries mix positional
// arguments (no name) and properties (named); these keep the distinction
// straight.

pub(crate) fn arg_string(node: &KdlNode, index: usize) -> Option<&str> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .nth(index)
        .and_then(|e| e.value().as_string())
}

pub(crate) fn arg_strings(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string().map(str::to_string))
        .collect()
}

pub(crate) fn arg_u32(node: &KdlNode, index: usize) -> Option<u32> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .nth(index)
        .and_then(|e| e.value().as_integer())
        .map(|v| v as u32)
}

pub(crate) fn prop_string(node: &KdlNode, key: &str) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().map(|n| n.value()) == Some(key))
        .and_then(|e| e.value().as_string())
        .map(str::to_string)
}

pub(crate) fn prop_u32(node: &KdlNode, key: &str) -> Option<u32> {
    node.entries()
        .iter()
        .find(|e| e.name().map(|n| n.value()) == Some(key))
        .and_then(|e| e.value().as_integer())
        .map(|v| v as u32)
}

#[cfg(test)]
mod tests;
