//! Built-in startup scripts for build agents.
//!
//! Each agent script is a template with a single substitutable
//! `{{ kind_tag }}` placeholder: the tag that correlates a fleet's pool
//! volumes with its instances. Scripts are opaque payloads as far as the
//! resolver is concerned; they are rendered once at synthesis time.

/// Linux agent bootstrap.
///
/// Installs the build tooling, then looks for a free pool volume carrying
/// this fleet's kind tag in the instance's availability zone, attaches it,
/// formats it on first use, and mounts it under /data.
pub const LINUX_AGENT_SETUP: &str = r#"#!/bin/bash
set -euo pipefail

dnf install -y java-17-amazon-corretto-headless git git-lfs docker jq
systemctl enable --now docker
usermod -aG docker ec2-user
chmod 666 /var/run/docker.sock
# not necessary, but useful when debugging an agent over SSM
dnf install -y tmux htop

TOKEN=$(curl -sX PUT "http://169.254.169.254/latest/api/token" \
  -H "X-aws-ec2-metadata-token-ttl-seconds: 300")
INSTANCE_ID=$(curl -s -H "X-aws-ec2-metadata-token: $TOKEN" \
  http://169.254.169.254/latest/meta-data/instance-id)
AZ=$(curl -s -H "X-aws-ec2-metadata-token: $TOKEN" \
  http://169.254.169.254/latest/meta-data/placement/availability-zone)

# claim a free pool volume for this fleet, if the fleet has one
VOLUME_ID=$(aws ec2 describe-volumes \
  --filters "Name=tag:Kind,Values={{ kind_tag }}" \
            "Name=availability-zone,Values=$AZ" \
            "Name=status,Values=available" \
  --query 'Volumes[0].VolumeId' --output text)

if [ "$VOLUME_ID" != "None" ] && [ -n "$VOLUME_ID" ]; then
  aws ec2 attach-volume --volume-id "$VOLUME_ID" \
    --instance-id "$INSTANCE_ID" --device /dev/xvdf
  aws ec2 wait volume-in-use --volume-ids "$VOLUME_ID"
  while [ ! -e /dev/xvdf ]; do sleep 1; done
  # blank volumes report "data"; anything else already has a filesystem
  if [ "$(file -b -s /dev/xvdf)" = "data" ]; then
    mkfs -t xfs /dev/xvdf
  fi
  mkdir -p /data
  mount /dev/xvdf /data
fi

mkdir -p /data/build-agent
chown ec2-user:ec2-user /data/build-agent
"#;

/// Windows agent bootstrap (launch-agent task format).
///
/// Claims a pool volume the same way the Linux script does, brings it online
/// as drive D: and prepares the agent working directory.
pub const WINDOWS_AGENT_SETUP: &str = r#"version: 1.1
tasks:
  - task: executeScript
    inputs:
      - frequency: once
        type: powershell
        runAs: localSystem
        content: |-
          $token = Invoke-RestMethod -Method Put -Headers @{'X-aws-ec2-metadata-token-ttl-seconds'='300'} -Uri http://169.254.169.254/latest/api/token
          $meta = @{'X-aws-ec2-metadata-token'=$token}
          $instanceId = Invoke-RestMethod -Headers $meta -Uri http://169.254.169.254/latest/meta-data/instance-id
          $az = Invoke-RestMethod -Headers $meta -Uri http://169.254.169.254/latest/meta-data/placement/availability-zone

          $volumeId = aws ec2 describe-volumes --filters "Name=tag:Kind,Values={{ kind_tag }}" "Name=availability-zone,Values=$az" "Name=status,Values=available" --query 'Volumes[0].VolumeId' --output text
          if ($volumeId -and $volumeId -ne 'None') {
            aws ec2 attach-volume --volume-id $volumeId --instance-id $instanceId --device xvdf
            aws ec2 wait volume-in-use --volume-ids $volumeId
            Start-Sleep -Seconds 5
            Get-Disk | Where-Object PartitionStyle -Eq 'RAW' |
              Initialize-Disk -PartitionStyle GPT -PassThru |
              New-Partition -DriveLetter D -UseMaximumSize |
              Format-Volume -FileSystem NTFS -Confirm:$false
            Set-Disk -Number (Get-Disk | Where-Object IsOffline | Select-Object -First 1 -ExpandProperty Number) -IsOffline $false -ErrorAction SilentlyContinue
            New-Item -ItemType Directory -Force -Path D:\build-agent | Out-Null
          }
          New-Item -ItemType Directory -Force -Path C:\build-agent | Out-Null
"#;

/// Build-acceleration cache node bootstrap (cloud-config).
///
/// Runs the cache as a container with its storage on the instance volume.
pub const CACHE_NODE_SETUP: &str = r#"#cloud-config
packages:
  - docker
runcmd:
  - systemctl enable --now docker
  - mkdir -p /data/agent-cache
  - >
    docker run -d --restart always --name accelerator
    -p 10080:10080 -v /data/agent-cache:/agent-cache
    unitytechnologies/accelerator:latest
"#;

/// Desktop agent bootstrap.
///
/// `{{ brew_prefix }}` differs between Intel and Apple-silicon images.
pub const DESKTOP_AGENT_SETUP: &str = r#"#!/bin/zsh
su ec2-user -c '{{ brew_prefix }}/bin/brew install openjdk@17 jq'
ln -sfn {{ brew_prefix }}/opt/openjdk@17/libexec/openjdk.jdk \
  /Library/Java/JavaVirtualMachines/openjdk-17.jdk
java -version

# grow the filesystem to match the attached volume
PDISK=$(diskutil list physical external | head -n1 | cut -d" " -f1)
APFSCONT=$(diskutil list physical external | grep "Apple_APFS" | tr -s " " | cut -d" " -f8)
yes | diskutil repairDisk $PDISK
diskutil apfs resizeContainer $APFSCONT 0

# enable remote management so the instance can be reached for maintenance
/System/Library/CoreServices/RemoteManagement/ARDAgent.app/Contents/Resources/kickstart \
  -activate -configure -access -on -restart -agent -privs -all
"#;

/// Get the script template for a built-in script name.
pub fn get_builtin_script(name: &str) -> Option<&'static str> {
    match name {
        "linux-agent-setup" => Some(LINUX_AGENT_SETUP),
        "windows-agent-setup" => Some(WINDOWS_AGENT_SETUP),
        "cache-node-setup" => Some(CACHE_NODE_SETUP),
        "desktop-agent-setup" => Some(DESKTOP_AGENT_SETUP),
        _ => None,
    }
}

/// Check if a script name is a built-in script.
pub fn is_builtin_script(name: &str) -> bool {
    get_builtin_script(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        assert!(is_builtin_script("linux-agent-setup"));
        assert!(!is_builtin_script("solaris-agent-setup"));
    }

    #[test]
    fn test_agent_scripts_carry_kind_tag_placeholder() {
        assert!(LINUX_AGENT_SETUP.contains("{{ kind_tag }}"));
        assert!(WINDOWS_AGENT_SETUP.contains("{{ kind_tag }}"));
        assert!(!CACHE_NODE_SETUP.contains("{{"));
    }
}
