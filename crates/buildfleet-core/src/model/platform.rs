//! Platform profiles for build agent fleets.
//!
//! Defaults are explicit value records selected by the caller. There is no
//! inheritance: each platform variant owns one record, and Windows carries a
//! second record for fleets with a persistent data volume.

use crate::scripts;
use serde::{Deserialize, Serialize};

/// Rolling "latest" image alias for Linux agents, resolved by the
/// provisioning engine at deploy time.
pub const LINUX_DEFAULT_IMAGE: &str =
    "resolve:ssm:/aws/service/ami-amazon-linux-latest/al2023-ami-kernel-default-x86_64";

/// Pinned Windows Server 2019 (containers) image used when no image id is
/// given. Windows images have no stable "latest" alias we can resolve.
pub const WINDOWS_DEFAULT_IMAGE: &str = "ami-0a249b7e15c3c080e";

/// Operating-system family of a build agent fleet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[default]
    Linux,
    Windows,
}

impl Platform {
    /// Parse a platform name from configuration.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linux" => Some(Self::Linux),
            "windows" => Some(Self::Windows),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }

    /// The default-value record for this platform.
    ///
    /// On Windows the filesystem root and the agent command prefix depend on
    /// whether the fleet has a persistent data volume: with one, the agent
    /// works from the data drive; without one, from the system drive.
    pub fn defaults(self, has_data_volume: bool) -> PlatformDefaults {
        match self {
            Self::Linux => PlatformDefaults {
                image_id: LINUX_DEFAULT_IMAGE,
                root_device: "/dev/xvda",
                fs_root: "/data/build-agent",
                command_prefix: "",
                command_suffix: "",
                credentials_id: "instance-ssh-key-ec2-user",
                connect_timeout_secs: 60,
                connect_max_retries: 10,
                connect_retry_wait_secs: 15,
                user_data_template: scripts::LINUX_AGENT_SETUP,
            },
            Self::Windows => PlatformDefaults {
                image_id: WINDOWS_DEFAULT_IMAGE,
                root_device: "/dev/sda1",
                fs_root: if has_data_volume {
                    "D:\\build-agent"
                } else {
                    "C:\\build-agent"
                },
                command_prefix: if has_data_volume {
                    // move onto the data drive before launching the agent
                    "cd /d D:\\ &&"
                } else {
                    ""
                },
                command_suffix: "",
                credentials_id: "instance-ssh-key-administrator",
                // Windows instances take considerably longer to accept SSH
                connect_timeout_secs: 60,
                connect_max_retries: 30,
                connect_retry_wait_secs: 30,
                user_data_template: scripts::WINDOWS_AGENT_SETUP,
            },
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Explicit default-value record for one platform family.
#[derive(Debug, Clone, Copy)]
pub struct PlatformDefaults {
    /// Machine image reference (pinned id or rolling alias)
    pub image_id: &'static str,

    /// Device name of the root block device
    pub root_device: &'static str,

    /// Directory the agent works under
    pub fs_root: &'static str,

    /// Fragment prepended to the agent launch command
    pub command_prefix: &'static str,

    /// Fragment appended to the agent launch command
    pub command_suffix: &'static str,

    /// Id of the SSH credentials the controller uses for this platform
    pub credentials_id: &'static str,

    /// SSH connect timeout (seconds)
    pub connect_timeout_secs: u32,

    /// SSH connect attempts before giving up
    pub connect_max_retries: u32,

    /// Wait between SSH connect attempts (seconds)
    pub connect_retry_wait_secs: u32,

    /// Startup-script template for this platform
    pub user_data_template: &'static str,
}
