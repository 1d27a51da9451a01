//! Deployment tree: everything one `fleet.kdl` file declares.

use super::fleet::FleetRequest;
use super::placement::Placement;
use serde::{Deserialize, Serialize};

/// Port the build-acceleration cache listens on.
pub const CACHE_PORT: u16 = 10080;

/// A complete deployment declaration: network, controller, optional cache
/// node, agent fleets and dedicated-host desktop agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    /// Deployment name, used to namespace resource and tag names
    pub name: String,

    /// Region the deployment targets
    pub region: String,

    pub network: NetworkSettings,
    pub controller: ControllerSettings,
    pub cache_node: Option<CacheNodeSettings>,

    #[serde(default)]
    pub fleets: Vec<FleetRequest>,

    #[serde(default)]
    pub desktops: Vec<DesktopRequest>,
}

impl Deployment {
    /// Look up a declared subnet by id.
    pub fn subnet(&self, subnet_id: &str) -> Option<&Placement> {
        self.network
            .subnets
            .iter()
            .find(|p| p.subnet_id == subnet_id)
    }
}

/// Network placement and web ingress settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Existing network to deploy into; a fresh one is declared when absent
    pub network_id: Option<String>,

    /// Address range of the network
    pub cidr: String,

    /// Private subnets available for placement
    #[serde(default)]
    pub subnets: Vec<Placement>,

    /// Address ranges allowed to reach the controller web UI
    #[serde(default)]
    pub allowed_cidrs: Vec<String>,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            network_id: None,
            cidr: "10.0.0.0/16".to_string(),
            subnets: Vec::new(),
            allowed_cidrs: Vec::new(),
        }
    }
}

/// Controller service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerSettings {
    /// CPU units for the controller container
    pub cpu: u32,

    /// Memory limit (MiB)
    pub memory_mib: u32,

    /// TLS certificate for the web endpoint; plain HTTP when absent
    pub certificate_arn: Option<String>,

    /// Base URL of the build license server, if any
    pub license_server_url: Option<String>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            cpu: 1024,
            memory_mib: 2048,
            certificate_arn: None,
            license_server_url: None,
        }
    }
}

/// Peer-to-peer build-acceleration cache node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheNodeSettings {
    /// Cache volume size (GiB)
    pub volume_gb: u32,

    /// Subnet the node is placed in. Placing it next to the busiest agents
    /// can improve cache performance.
    pub placement: Placement,

    pub instance_type: String,
}

/// A dedicated-host desktop-class build agent (single machine, not a fleet).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesktopRequest {
    /// Unique agent name
    pub name: String,

    /// Machine image id; desktop images are always pinned per region
    pub image_id: String,

    pub instance_type: String,

    /// Root volume size (GiB)
    pub volume_gb: u32,

    /// Not every availability zone offers desktop hardware; pick a subnet
    /// whose zone does.
    pub placement: Placement,
}
