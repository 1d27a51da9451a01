//! Deployment synthesis.
//!
//! Turns a parsed [`Deployment`] into the declarative resource graph handed
//! to the provisioning engine. Synthesis is a single synchronous pass: each
//! fleet is resolved independently, resources are fresh value trees, and a
//! configuration error aborts the whole pass with no partial manifest.

use crate::controller::{
    desktop_host_env, fleet_group_env, fleet_template_env, render_controller_config,
};
use crate::error::Result;
use crate::manifest::Manifest;
use crate::resource::{ResourceConfig, ResourceSet, attr_ref};
use buildfleet_core::model::CACHE_PORT;
use buildfleet_core::{
    AgentDescriptor, CacheNodeSettings, Deployment, DesktopRequest, LINUX_DEFAULT_IMAGE,
    TemplateRenderer, resolve, scripts,
};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::info;

/// Managed policy granting the baseline instance management access every
/// agent and the cache node receive.
const CORE_INSTANCE_POLICY: &str = "core-instance-management";

/// Output of a full deployment synthesis.
#[derive(Debug, Clone)]
pub struct Synthesis {
    /// Resource declaration for the provisioning engine
    pub manifest: Manifest,

    /// Resolved fleet descriptors, in declaration order
    pub fleets: Vec<AgentDescriptor>,

    /// Rendered controller configuration payload
    pub controller_config: String,

    /// Rendered startup scripts, keyed by fleet name
    pub user_data: BTreeMap<String, String>,
}

/// Synthesize a deployment into its resource graph.
pub fn synthesize(deployment: &Deployment) -> Result<Synthesis> {
    let mut set = ResourceSet::new();

    synth_network(deployment, &mut set);
    synth_buckets(&mut set);
    synth_registry(&mut set);
    synth_key_pair(deployment, &mut set);
    synth_namespace(&mut set);

    let mut env: BTreeMap<String, String> = BTreeMap::new();
    env.insert("REGION".to_string(), deployment.region.clone());
    env.insert(
        "CONTROLLER_URL".to_string(),
        attr_ref("container-service", "controller", "url"),
    );
    env.insert(
        "ARTIFACT_BUCKET_NAME".to_string(),
        attr_ref("bucket", "artifacts", "name"),
    );
    env.insert(
        "REGISTRY_URL".to_string(),
        attr_ref("container-registry", "main", "url"),
    );
    env.insert(
        "LICENSE_SERVER_URL".to_string(),
        deployment
            .controller
            .license_server_url
            .clone()
            .unwrap_or_default(),
    );

    if let Some(cache) = &deployment.cache_node {
        let endpoint = synth_cache_node(deployment, cache, &mut set);
        env.insert("CACHE_ENDPOINT".to_string(), endpoint);
    }

    let mut fleets = Vec::with_capacity(deployment.fleets.len());
    let mut user_data = BTreeMap::new();
    for request in &deployment.fleets {
        let descriptor = resolve(&deployment.name, request)?;
        let script = synth_fleet(&descriptor, &mut set)?;
        user_data.insert(descriptor.name.clone(), script);
        env.insert(
            fleet_group_env(&descriptor.name),
            attr_ref("scaling-group", &descriptor.name, "name"),
        );
        env.insert(
            fleet_template_env(&descriptor.name),
            attr_ref("launch-template", &descriptor.name, "id"),
        );
        fleets.push(descriptor);
    }

    for desktop in &deployment.desktops {
        synth_desktop(desktop, &mut set)?;
        env.insert(
            desktop_host_env(&desktop.name),
            attr_ref("instance", &desktop.name, "private_ip"),
        );
    }

    let env_keys: Vec<String> = env.keys().cloned().collect();
    let controller_config =
        render_controller_config(&deployment.name, &env_keys, &fleets, &deployment.desktops)?;
    synth_controller(deployment, &env, &mut set);

    info!(
        deployment = %deployment.name,
        resources = set.len(),
        fleets = fleets.len(),
        "synthesized deployment"
    );

    Ok(Synthesis {
        manifest: Manifest::new(&deployment.name, &deployment.region, set),
        fleets,
        controller_config,
        user_data,
    })
}

fn synth_network(deployment: &Deployment, set: &mut ResourceSet) {
    // an existing network is referenced, never declared
    if deployment.network.network_id.is_some() {
        return;
    }
    set.add(ResourceConfig::new(
        "network",
        "main",
        json!({
            "cidr": deployment.network.cidr,
            "nat_gateways": 1,
        }),
    ));
}

fn synth_buckets(set: &mut ResourceSet) {
    // access logs from the controller endpoint and the artifact bucket
    set.add(ResourceConfig::new(
        "bucket",
        "logs",
        json!({
            "encryption": "managed",
            "enforce_tls": true,
            "block_public_access": true,
            "auto_delete_objects": true,
            "removal": "destroy",
        }),
    ));

    // artifacts shared between build stages, readable from every agent
    set.add(ResourceConfig::new(
        "bucket",
        "artifacts",
        json!({
            "encryption": "managed",
            "enforce_tls": true,
            "block_public_access": true,
            "auto_delete_objects": true,
            "removal": "destroy",
            "access_logs": {"bucket": "logs", "prefix": "artifact-access/"},
        }),
    ));
}

fn synth_registry(set: &mut ResourceSet) {
    set.add(ResourceConfig::new(
        "container-registry",
        "main",
        json!({
            "scan_on_push": true,
            "removal": "destroy",
        }),
    ));
}

fn synth_key_pair(deployment: &Deployment, set: &mut ResourceSet) {
    // the controller reaches agents over SSH with this key; the private half
    // lives in a secret parameter, never in the manifest
    set.add(ResourceConfig::new(
        "key-pair",
        "agents",
        json!({
            "private_key_parameter": format!("/{}/agents/private-key", deployment.name),
        }),
    ));
}

fn synth_namespace(set: &mut ResourceSet) {
    set.add(ResourceConfig::new(
        "dns-namespace",
        "build",
        json!({"name": "build"}),
    ));
}

/// Declare the build-acceleration cache node and its DNS service entry.
/// Returns the stable endpoint agents use to reach the cache.
fn synth_cache_node(
    deployment: &Deployment,
    cache: &CacheNodeSettings,
    set: &mut ResourceSet,
) -> String {
    set.add(ResourceConfig::new(
        "instance",
        "cache-node",
        json!({
            "image_id": LINUX_DEFAULT_IMAGE,
            "instance_type": cache.instance_type,
            "subnet": cache.placement.subnet_id,
            "availability_zone": cache.placement.availability_zone,
            "root_volume": {"size_gb": cache.volume_gb, "volume_type": "gp3", "encrypted": true},
            "user_data": scripts::CACHE_NODE_SETUP,
            "managed_policies": [CORE_INSTANCE_POLICY],
            "ingress": [{"port": CACHE_PORT, "from": deployment.network.cidr}],
        }),
    ));

    set.add(ResourceConfig::new(
        "dns-service",
        "cache",
        json!({
            "namespace": "build",
            "name": "cache",
            "instance_ip": attr_ref("instance", "cache-node", "private_ip"),
        }),
    ));

    format!("cache.build:{CACHE_PORT}")
}

/// Declare a fleet's launch template, scaling group and volume pool.
/// Returns the rendered startup script embedded in the launch template.
fn synth_fleet(descriptor: &AgentDescriptor, set: &mut ResourceSet) -> Result<String> {
    let defaults = descriptor
        .platform
        .defaults(descriptor.data_volume.is_some());

    let mut renderer = TemplateRenderer::new();
    renderer.insert("kind_tag", &descriptor.kind_tag);
    let user_data = renderer.render_str(defaults.user_data_template)?;

    let mut statements = Vec::new();
    if !descriptor.volume_pool.is_empty() {
        // agents search the pool by tag, then attach the volume they claimed
        statements.push(json!({
            "actions": ["ec2:DescribeVolumes"],
            "resources": ["*"],
        }));
        let volume_arns: Vec<String> = descriptor
            .volume_pool
            .iter()
            .map(|v| attr_ref("volume", &v.id, "arn"))
            .collect();
        statements.push(json!({
            "actions": ["ec2:AttachVolume", "ec2:DetachVolume"],
            "resources": volume_arns,
        }));
    }

    set.add(ResourceConfig::new(
        "launch-template",
        &descriptor.name,
        json!({
            "image_id": descriptor.image_id,
            "key_pair": "agents",
            "user_data": &user_data,
            "root_device": descriptor.root_device,
            "root_volume": {
                "size_gb": descriptor.root_volume_gb,
                "volume_type": "gp3",
                "encrypted": true,
                "throughput_mbps": 150,
            },
            "role": {
                "managed_policies": [CORE_INSTANCE_POLICY],
                "statements": statements,
            },
            "grants": ["bucket:artifacts:read-write"],
            "ingress": [{"port": 22, "from": "container-service:controller"}],
        }),
    ));

    set.add(ResourceConfig::new(
        "scaling-group",
        &descriptor.name,
        json!({
            "launch_template": descriptor.name,
            "min_capacity": descriptor.min_capacity,
            "max_capacity": descriptor.max_capacity,
            "subnets": descriptor
                .placements
                .iter()
                .map(|p| p.subnet_id.clone())
                .collect::<Vec<_>>(),
            "instance_type_overrides": descriptor.instance_types,
            "spot": {
                "on_demand_base_capacity": 0,
                "on_demand_percentage_above_base": 0,
                "allocation_strategy": "price-capacity-optimized",
            },
        }),
    ));

    for volume in &descriptor.volume_pool {
        set.add(ResourceConfig::new(
            "volume",
            &volume.id,
            json!({
                "availability_zone": volume.availability_zone,
                "size_gb": volume.size_gb,
                "volume_type": "gp3",
                "iops": volume.iops,
                "throughput_mbps": volume.throughput_mbps,
                "encrypted": true,
                "removal": "destroy",
                "tags": {"Kind": volume.kind_tag},
            }),
        ));
    }

    Ok(user_data)
}

fn synth_desktop(desktop: &DesktopRequest, set: &mut ResourceSet) -> Result<()> {
    set.add(ResourceConfig::new(
        "dedicated-host",
        &desktop.name,
        json!({
            "availability_zone": desktop.placement.availability_zone,
            "instance_type": desktop.instance_type,
            // a dedicated host cannot be released within 24h of allocation
            "removal": "retain",
        }),
    ));

    // Homebrew lives under a different prefix on Apple-silicon images
    let brew_prefix = if desktop.instance_type.starts_with("mac2") {
        "/opt/homebrew"
    } else {
        "/usr/local"
    };
    let mut renderer = TemplateRenderer::new();
    renderer.insert("brew_prefix", &brew_prefix);
    let user_data = renderer.render_str(scripts::DESKTOP_AGENT_SETUP)?;

    set.add(ResourceConfig::new(
        "instance",
        &desktop.name,
        json!({
            "image_id": desktop.image_id,
            "instance_type": desktop.instance_type,
            "tenancy": "host",
            "host": attr_ref("dedicated-host", &desktop.name, "id"),
            "subnet": desktop.placement.subnet_id,
            "availability_zone": desktop.placement.availability_zone,
            "key_pair": "agents",
            "root_device": "/dev/sda1",
            "root_volume": {"size_gb": desktop.volume_gb, "volume_type": "gp3", "encrypted": true},
            "user_data": user_data,
            "managed_policies": [CORE_INSTANCE_POLICY],
            "grants": ["bucket:artifacts:read-write"],
            "ingress": [{"port": 22, "from": "container-service:controller"}],
        }),
    ));

    Ok(())
}

fn synth_controller(deployment: &Deployment, env: &BTreeMap<String, String>, set: &mut ResourceSet) {
    let controller = &deployment.controller;
    let scheme = if controller.certificate_arn.is_some() {
        "https"
    } else {
        "http"
    };

    // shared home directory so controller state survives task replacement
    set.add(ResourceConfig::new(
        "file-system",
        "controller-home",
        json!({
            "performance_mode": "general-purpose",
            "removal": "destroy",
            "access_point": {
                "path": "/controller-home",
                "owner_uid": 1000,
                "owner_gid": 1000,
                "permissions": "755",
            },
            "ingress": [{"port": 2049, "from": "container-service:controller"}],
        }),
    ));

    let mut allowed_cidrs = deployment.network.allowed_cidrs.clone();
    // agents inside the network always need to reach the controller
    allowed_cidrs.push(deployment.network.cidr.clone());

    set.add(ResourceConfig::new(
        "container-service",
        "controller",
        json!({
            "desired_count": 1,
            "cpu": controller.cpu,
            "memory_mib": controller.memory_mib,
            "image": {
                "build_context": "controller",
                "config_file": format!("controller.{}.yaml", deployment.name),
            },
            "protocol": scheme,
            "certificate_arn": controller.certificate_arn,
            "allowed_cidrs": allowed_cidrs,
            "health_check": {
                "path": "/login",
                "interval_secs": 15,
                "healthy_threshold": 2,
                "unhealthy_threshold": 4,
                "healthy_codes": "200",
            },
            "health_check_grace_secs": 60,
            "deregistration_delay_secs": 10,
            "circuit_breaker_rollback": true,
            "environment": env,
            "secrets": {
                "PRIVATE_KEY": attr_ref("key-pair", "agents", "private_key_parameter"),
            },
            "mounts": [{
                "file_system": "controller-home",
                "container_path": "/var/controller-home",
            }],
            "policy_statements": [
                {
                    // fleet plugin permissions: inspect and scale agent pools
                    "actions": [
                        "ec2:CreateTags",
                        "ec2:DescribeInstances",
                        "ec2:DescribeInstanceStatus",
                        "ec2:DescribeRegions",
                        "ec2:DescribeSpotFleetInstances",
                        "ec2:DescribeSpotFleetRequests",
                        "ec2:ModifySpotFleetRequest",
                        "ec2:TerminateInstances",
                        "autoscaling:DescribeAutoScalingGroups",
                        "autoscaling:UpdateAutoScalingGroup",
                        "iam:ListInstanceProfiles",
                        "iam:ListRoles",
                    ],
                    "resources": ["*"],
                },
                {
                    "actions": ["iam:PassRole"],
                    "resources": [attr_ref("container-service", "controller", "task_role_arn")],
                    "conditions": {"StringEquals": {"iam:PassedToService": ["ec2.amazonaws.com"]}},
                },
            ],
            "grants": [
                "bucket:artifacts:read-write",
                "container-registry:main:pull",
                "file-system:controller-home:client-full",
            ],
            "access_logs": {"bucket": "logs", "prefix": "controller-access-log"},
        }),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildfleet_core::{
        ControllerSettings, DataVolumeRequest, FleetError, FleetRequest, NetworkSettings,
        Placement, Platform,
    };

    fn network(subnet_count: usize) -> NetworkSettings {
        NetworkSettings {
            subnets: (0..subnet_count)
                .map(|i| {
                    Placement::new(
                        format!("subnet-{i}"),
                        format!("us-east-2{}", (b'a' + i as u8) as char),
                    )
                })
                .collect(),
            allowed_cidrs: vec!["203.0.113.0/24".to_string()],
            ..Default::default()
        }
    }

    fn deployment(subnet_count: usize, fleets: Vec<FleetRequest>) -> Deployment {
        let network = network(subnet_count);
        let fleets = fleets
            .into_iter()
            .map(|mut f| {
                if f.placements.is_empty() {
                    f.placements = network.subnets.clone();
                }
                f
            })
            .collect();
        Deployment {
            name: "ci".to_string(),
            region: "us-east-2".to_string(),
            network,
            controller: ControllerSettings::default(),
            cache_node: None,
            fleets,
            desktops: Vec::new(),
        }
    }

    fn linux_fleet(name: &str) -> FleetRequest {
        FleetRequest {
            name: name.to_string(),
            label: name.to_string(),
            platform: Platform::Linux,
            ..Default::default()
        }
    }

    #[test]
    fn test_base_resources_are_always_declared() {
        let synthesis = synthesize(&deployment(2, vec![])).unwrap();
        let manifest = &synthesis.manifest;

        let keys: Vec<String> = manifest.resources.iter().map(|r| r.key()).collect();
        for expected in [
            "network:main",
            "bucket:logs",
            "bucket:artifacts",
            "container-registry:main",
            "key-pair:agents",
            "dns-namespace:build",
            "file-system:controller-home",
            "container-service:controller",
        ] {
            assert!(keys.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn test_volume_pool_only_with_data_volume() {
        let plain = synthesize(&deployment(2, vec![linux_fleet("agents")])).unwrap();
        assert!(plain.manifest.resources.iter().all(|r| r.resource_type != "volume"));

        let pooled = synthesize(&deployment(
            2,
            vec![FleetRequest {
                max_capacity: Some(4),
                data_volume: Some(DataVolumeRequest {
                    size_gb: 200,
                    iops: None,
                    throughput_mbps: None,
                }),
                ..linux_fleet("agents")
            }],
        ))
        .unwrap();

        let volumes: Vec<_> = pooled
            .manifest
            .resources
            .iter()
            .filter(|r| r.resource_type == "volume")
            .collect();
        // ceil(4 / 2) = 2 per zone, 2 zones
        assert_eq!(volumes.len(), 4);
        for volume in volumes {
            assert_eq!(
                volume.config["tags"]["Kind"],
                serde_json::json!("ci-agents")
            );
        }
    }

    #[test]
    fn test_controller_env_names_every_fleet() {
        let synthesis = synthesize(&deployment(
            2,
            vec![linux_fleet("linux-large"), linux_fleet("linux-small")],
        ))
        .unwrap();

        let controller = synthesis
            .manifest
            .resources
            .iter()
            .find(|r| r.key() == "container-service:controller")
            .unwrap();
        let env = &controller.config["environment"];
        assert!(env.get("FLEET_GROUP_NAME_LINUX_LARGE").is_some());
        assert!(env.get("FLEET_GROUP_NAME_LINUX_SMALL").is_some());
        assert!(env.get("FLEET_LAUNCH_TEMPLATE_ID_LINUX_LARGE").is_some());
        assert_eq!(env["REGION"], serde_json::json!("us-east-2"));
        // no cache node declared, no endpoint exported
        assert!(env.get("CACHE_ENDPOINT").is_none());
    }

    #[test]
    fn test_cache_node_exports_endpoint() {
        let mut d = deployment(2, vec![]);
        d.cache_node = Some(CacheNodeSettings {
            volume_gb: 300,
            instance_type: "t3.large".to_string(),
            placement: d.network.subnets[0].clone(),
        });

        let synthesis = synthesize(&d).unwrap();
        let controller = synthesis
            .manifest
            .resources
            .iter()
            .find(|r| r.key() == "container-service:controller")
            .unwrap();
        assert_eq!(
            controller.config["environment"]["CACHE_ENDPOINT"],
            serde_json::json!("cache.build:10080")
        );
        assert!(
            synthesis
                .manifest
                .resources
                .iter()
                .any(|r| r.key() == "dns-service:cache")
        );
    }

    #[test]
    fn test_config_payload_names_every_fleet_label() {
        let synthesis = synthesize(&deployment(
            2,
            vec![
                FleetRequest {
                    label: "linux".to_string(),
                    ..linux_fleet("linux-large")
                },
                FleetRequest {
                    label: "win".to_string(),
                    platform: Platform::Windows,
                    ..linux_fleet("windows")
                },
            ],
        ))
        .unwrap();

        assert!(synthesis.controller_config.contains("label: linux"));
        assert!(synthesis.controller_config.contains("label: win"));
    }

    #[test]
    fn test_user_data_substitutes_kind_tag() {
        let synthesis = synthesize(&deployment(1, vec![linux_fleet("agents")])).unwrap();
        let template = synthesis
            .manifest
            .resources
            .iter()
            .find(|r| r.key() == "launch-template:agents")
            .unwrap();
        let user_data = template.config["user_data"].as_str().unwrap();
        assert!(user_data.contains("Values=ci-agents"));
        assert!(!user_data.contains("{{"));
        // the same rendered script is exposed for writing to disk
        assert_eq!(synthesis.user_data["agents"], user_data);
    }

    #[test]
    fn test_fleet_without_placements_aborts_synthesis() {
        let mut d = deployment(0, vec![]);
        d.fleets.push(linux_fleet("agents"));

        match synthesize(&d) {
            Err(crate::error::CloudError::Fleet(FleetError::NoPlacements { fleet })) => {
                assert_eq!(fleet, "agents");
            }
            other => panic!("expected NoPlacements, got {other:?}"),
        }
    }

    #[test]
    fn test_existing_network_is_not_declared() {
        let mut d = deployment(1, vec![]);
        d.network.network_id = Some("vpc-1234".to_string());

        let synthesis = synthesize(&d).unwrap();
        assert!(
            synthesis
                .manifest
                .resources
                .iter()
                .all(|r| r.resource_type != "network")
        );
    }

    #[test]
    fn test_https_requires_certificate() {
        let mut d = deployment(1, vec![]);
        d.controller.certificate_arn = Some("arn:aws:acm:us-east-2:1:certificate/x".to_string());

        let synthesis = synthesize(&d).unwrap();
        let controller = synthesis
            .manifest
            .resources
            .iter()
            .find(|r| r.key() == "container-service:controller")
            .unwrap();
        assert_eq!(controller.config["protocol"], serde_json::json!("https"));
    }
}
