use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("No nearby nodes found for snapping")]
    NoNearbyNodes,
    #[error("Invalid time of day: {0}")]
    InvalidTime(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Graph build failed: {0}")]
    GraphBuild(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, RoutingError>;
