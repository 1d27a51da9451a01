use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("user configuration directory could not be determined")]
    ConfigDirNotFound,

    #[error(
        "no deployment file found. Checked, in order:\n\
        - current directory: fleet.local.kdl, .fleet.local.kdl, fleet.kdl, .fleet.kdl\n\
        - the ./.buildfleet/ directory\n\
        - ~/.config/buildfleet/fleet.kdl\n\
        The FLEET_CONFIG_PATH environment variable overrides the search"
    )]
    FleetFileNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
