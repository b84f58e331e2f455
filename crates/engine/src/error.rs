use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, LensError>;

#[derive(Error, Debug)]
pub enum LensError {
    /// A panel container the update needs is not present
    #[error("Panel container missing: {0}")]
    MissingContainer(&'static str),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Scan(#[from] lens_scanner::ScanError),

    #[error(transparent)]
    Search(#[from] lens_search::SearchError),

    #[error(transparent)]
    Protocol(#[from] lens_protocol::ProtocolError),

    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),
}
