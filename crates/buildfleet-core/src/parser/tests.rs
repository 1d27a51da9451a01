use super::*;
use crate::model::Platform;

const FULL_DEPLOYMENT: &str = r#"
deployment "unity-ci" region="us-east-2"

network cidr="10.1.0.0/16" {
    subnet "subnet-0a" zone="us-east-2a"
    subnet "subnet-0b" zone="us-east-2b"
    subnet "subnet-0c" zone="us-east-2c"
    allow "203.0.113.0/24" "198.51.100.0/24"
}

controller cpu=2048 memory=4096 {
    certificate "arn:aws:acm:us-east-2:123456789012:certificate/abc"
    license-server "http://10.1.0.100:8080"
}

cache-node volume=300 {
    subnet "subnet-0b"
}

fleet "linux-large" platform="linux" label="linux" {
    capacity min=1 max=4
    instance-types "c5.xlarge" "c5a.xlarge"
    root-volume 50
    data-volume 200 iops=4000 throughput=250
    subnets "subnet-0a" "subnet-0b"
    executors 2
}

fleet "windows" platform="windows" {
    capacity max=2
}

desktop "mac-arm" image="ami-013846afc111c94b0" {
    instance-type "mac2.metal"
    volume 400
    subnet "subnet-0c"
}
"#;

#[test]
fn test_parse_full_deployment() {
    let deployment = parse_deployment_str(FULL_DEPLOYMENT).unwrap();

    assert_eq!(deployment.name, "unity-ci");
    assert_eq!(deployment.region, "us-east-2");
    assert_eq!(deployment.network.cidr, "10.1.0.0/16");
    assert_eq!(deployment.network.subnets.len(), 3);
    assert_eq!(deployment.network.allowed_cidrs.len(), 2);

    assert_eq!(deployment.controller.cpu, 2048);
    assert_eq!(deployment.controller.memory_mib, 4096);
    assert!(deployment.controller.certificate_arn.is_some());
    assert_eq!(
        deployment.controller.license_server_url.as_deref(),
        Some("http://10.1.0.100:8080")
    );

    let cache = deployment.cache_node.as_ref().unwrap();
    assert_eq!(cache.volume_gb, 300);
    assert_eq!(cache.placement.subnet_id, "subnet-0b");
    assert_eq!(cache.instance_type, "t3.large");

    assert_eq!(deployment.fleets.len(), 2);
    assert_eq!(deployment.desktops.len(), 1);
}

#[test]
fn test_parse_fleet_fields() {
    let deployment = parse_deployment_str(FULL_DEPLOYMENT).unwrap();
    let fleet = &deployment.fleets[0];

    assert_eq!(fleet.name, "linux-large");
    assert_eq!(fleet.label, "linux");
    assert_eq!(fleet.platform, Platform::Linux);
    assert_eq!(fleet.min_capacity, Some(1));
    assert_eq!(fleet.max_capacity, Some(4));
    assert_eq!(fleet.instance_types, vec!["c5.xlarge", "c5a.xlarge"]);
    assert_eq!(fleet.root_volume_gb, Some(50));
    assert_eq!(fleet.executors, Some(2));

    let data = fleet.data_volume.as_ref().unwrap();
    assert_eq!(data.size_gb, 200);
    assert_eq!(data.iops, Some(4000));
    assert_eq!(data.throughput_mbps, Some(250));

    // explicit subnets resolve to their placements, in order
    assert_eq!(fleet.placements.len(), 2);
    assert_eq!(fleet.placements[0].availability_zone, "us-east-2a");
    assert_eq!(fleet.placements[1].availability_zone, "us-east-2b");
}

#[test]
fn test_sparse_fleet_stays_sparse() {
    let deployment = parse_deployment_str(FULL_DEPLOYMENT).unwrap();
    let fleet = &deployment.fleets[1];

    assert_eq!(fleet.platform, Platform::Windows);
    // label falls back to the fleet name
    assert_eq!(fleet.label, "windows");
    assert!(fleet.min_capacity.is_none());
    assert_eq!(fleet.max_capacity, Some(2));
    assert!(fleet.instance_types.is_empty());
    assert!(fleet.root_volume_gb.is_none());
    assert!(fleet.data_volume.is_none());
    assert!(fleet.fs_root.is_none());
    assert!(fleet.connect.is_none());

    // no explicit subnets: the fleet spreads over every network subnet
    assert_eq!(fleet.placements.len(), 3);
}

#[test]
fn test_desktop_parsing() {
    let deployment = parse_deployment_str(FULL_DEPLOYMENT).unwrap();
    let desktop = &deployment.desktops[0];

    assert_eq!(desktop.name, "mac-arm");
    assert_eq!(desktop.image_id, "ami-013846afc111c94b0");
    assert_eq!(desktop.instance_type, "mac2.metal");
    assert_eq!(desktop.volume_gb, 400);
    assert_eq!(desktop.placement.subnet_id, "subnet-0c");
}

#[test]
fn test_parse_deployment_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fleet.kdl");
    std::fs::write(&path, FULL_DEPLOYMENT).unwrap();

    let deployment = parse_deployment_file(&path).unwrap();
    assert_eq!(deployment.name, "unity-ci");
}

#[test]
fn test_missing_file_is_an_io_error() {
    let result = parse_deployment_file("/nonexistent/fleet.kdl");
    assert!(matches!(result, Err(crate::error::FleetError::Io { .. })));
}

#[test]
fn test_unknown_subnet_is_rejected() {
    let kdl = r#"
        deployment "ci" region="us-east-1"
        network {
            subnet "subnet-0a" zone="us-east-1a"
        }
        fleet "agents" {
            subnets "subnet-missing"
        }
    "#;

    match parse_deployment_str(kdl) {
        Err(crate::error::FleetError::UnknownSubnet { node, subnet }) => {
            assert_eq!(node, "agents");
            assert_eq!(subnet, "subnet-missing");
        }
        other => panic!("expected UnknownSubnet, got {other:?}"),
    }
}

#[test]
fn test_missing_region_is_rejected() {
    let result = parse_deployment_str(r#"deployment "ci""#);
    assert!(matches!(
        result,
        Err(crate::error::FleetError::InvalidConfig(_))
    ));
}

#[test]
fn test_missing_deployment_node_is_rejected() {
    let result = parse_deployment_str(r#"network { subnet "s" zone="z" }"#);
    assert!(matches!(
        result,
        Err(crate::error::FleetError::InvalidConfig(_))
    ));
}

#[test]
fn test_unknown_platform_is_rejected() {
    let kdl = r#"
        deployment "ci" region="us-east-1"
        fleet "agents" platform="beos"
    "#;
    assert!(matches!(
        parse_deployment_str(kdl),
        Err(crate::error::FleetError::InvalidConfig(_))
    ));
}

#[test]
fn test_unknown_nodes_are_skipped() {
    let kdl = r#"
        deployment "ci" region="us-east-1"
        annotations {
            owner "build-infra"
        }
    "#;

    let deployment = parse_deployment_str(kdl).unwrap();
    assert_eq!(deployment.name, "ci");
    assert!(deployment.fleets.is_empty());
}

#[test]
fn test_cache_node_defaults_to_first_subnet() {
    let kdl = r#"
        deployment "ci" region="us-east-1"
        network {
            subnet "subnet-0a" zone="us-east-1a"
            subnet "subnet-0b" zone="us-east-1b"
        }
        cache-node volume=120
    "#;

    let deployment = parse_deployment_str(kdl).unwrap();
    let cache = deployment.cache_node.unwrap();
    assert_eq!(cache.placement.subnet_id, "subnet-0a");
}

#[test]
fn test_cache_node_without_subnets_is_rejected() {
    let kdl = r#"
        deployment "ci" region="us-east-1"
        cache-node volume=120
    "#;

    assert!(matches!(
        parse_deployment_str(kdl),
        Err(crate::error::FleetError::InvalidConfig(_))
    ));
}

#[test]
fn test_fleet_without_network_subnets_parses_with_empty_placements() {
    // rejected later by the resolver, not by the parser
    let kdl = r#"
        deployment "ci" region="us-east-1"
        fleet "agents"
    "#;

    let deployment = parse_deployment_str(kdl).unwrap();
    assert!(deployment.fleets[0].placements.is_empty());
}
