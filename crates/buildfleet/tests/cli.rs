use assert_cmd::Command;
use predicates::prelude::*;

const FLEET_KDL: &str = r#"
deployment "unity-ci" region="us-east-2"

network {
    subnet "subnet-0a" zone="us-east-2a"
    subnet "subnet-0b" zone="us-east-2b"
    allow "203.0.113.0/24"
}

cache-node volume=300

fleet "linux-large" platform="linux" label="linux" {
    capacity min=1 max=4
    instance-types "c5.xlarge"
    data-volume 200
}
"#;

fn buildfleet() -> Command {
    let mut cmd = Command::cargo_bin("buildfleet").unwrap();
    cmd.env_remove("FLEET_CONFIG_PATH");
    cmd
}

#[test]
fn test_validate_reports_ok() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fleet.kdl"), FLEET_KDL).unwrap();

    buildfleet()
        .current_dir(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"))
        .stdout(predicate::str::contains("1 fleets"));
}

#[test]
fn test_synth_writes_manifest_and_payload() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fleet.kdl"), FLEET_KDL).unwrap();

    buildfleet()
        .current_dir(dir.path())
        .args(["synth", "--out", "dist"])
        .assert()
        .success()
        .stdout(predicate::str::contains("synthesized"));

    let manifest = std::fs::read_to_string(dir.path().join("dist/manifest.json")).unwrap();
    assert!(manifest.contains("\"deployment\": \"unity-ci\""));
    assert!(manifest.contains("scaling-group"));

    let payload = std::fs::read_to_string(dir.path().join("dist/controller.unity-ci.yaml")).unwrap();
    assert!(payload.contains("label: linux"));
    assert!(payload.contains("CACHE_ENDPOINT"));

    let user_data =
        std::fs::read_to_string(dir.path().join("dist/user-data.linux-large.sh")).unwrap();
    assert!(user_data.contains("Values=unity-ci-linux-large"));
}

#[test]
fn test_fleets_prints_resolved_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fleet.kdl"), FLEET_KDL).unwrap();

    buildfleet()
        .current_dir(dir.path())
        .arg("fleets")
        .assert()
        .success()
        .stdout(predicate::str::contains("linux-large"))
        .stdout(predicate::str::contains("capacity: 1-4"))
        .stdout(predicate::str::contains("data volume: 200 GiB"));
}

#[test]
fn test_validate_rejects_fleet_without_subnets() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("fleet.kdl"),
        r#"
        deployment "ci" region="us-east-1"
        fleet "agents"
        "#,
    )
    .unwrap();

    buildfleet()
        .current_dir(dir.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no placement subnets"));
}

#[test]
fn test_missing_deployment_file_fails_with_hint() {
    let dir = tempfile::tempdir().unwrap();

    buildfleet()
        .current_dir(dir.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no deployment file found"));
}
