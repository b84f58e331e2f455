use thiserror::Error;

use crate::ElementId;

pub type Result<T> = std::result::Result<T, PageError>;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Malformed page snapshot: {0}")]
    MalformedSnapshot(#[from] serde_json::Error),

    #[error("Unknown element: {0}")]
    UnknownElement(ElementId),

    #[error("Element {child} cannot be appended to {parent}")]
    InvalidAppend { parent: ElementId, child: ElementId },
}
