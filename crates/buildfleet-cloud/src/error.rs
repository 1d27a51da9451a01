//! Cloud declaration error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudError {
    #[error("fleet configuration error: {0}")]
    Fleet(#[from] buildfleet_core::FleetError),

    #[error("invalid deployment: {0}")]
    InvalidDeployment(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
