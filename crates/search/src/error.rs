use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search term too large: {0}")]
    Pattern(#[from] regex::Error),
}
