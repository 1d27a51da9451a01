use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("KDL parse error: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("IO error: {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("fleet '{fleet}' has no placement subnets")]
    NoPlacements { fleet: String },

    #[error("'{node}' references unknown subnet '{subnet}'")]
    UnknownSubnet { node: String, subnet: String },

    #[error("template render error: {0}")]
    TemplateRender(String),
}

pub type Result<T> = std::result::Result<T, FleetError>;
