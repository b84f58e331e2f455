use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid annotation attribute name: {0:?}")]
    InvalidAttribute(String),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}
