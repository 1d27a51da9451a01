//! Deployment file discovery for buildfleet.

pub mod error;

pub use error::*;

use std::path::PathBuf;

/// Per-user configuration directory for buildfleet.
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("buildfleet");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Find the deployment file for the current project.
///
/// Search order:
/// 1. FLEET_CONFIG_PATH environment variable (direct path)
/// 2. current directory: fleet.local.kdl, .fleet.local.kdl, fleet.kdl, .fleet.kdl
/// 3. the ./.buildfleet/ directory, same candidates
/// 4. ~/.config/buildfleet/fleet.kdl (global fallback)
pub fn find_fleet_file() -> Result<PathBuf> {
    // 1. explicit override
    if let Ok(config_path) = std::env::var("FLEET_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;
    let candidates = [
        "fleet.local.kdl",
        ".fleet.local.kdl",
        "fleet.kdl",
        ".fleet.kdl",
    ];

    // 2. current directory
    for filename in &candidates {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    // 3. ./.buildfleet/ directory
    let fleet_dir = current_dir.join(".buildfleet");
    if fleet_dir.is_dir() {
        for filename in &candidates {
            let path = fleet_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    // 4. global fallback (~/.config/buildfleet/fleet.kdl)
    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("buildfleet").join("fleet.kdl");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::FleetFileNotFound)
}
