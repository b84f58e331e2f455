//! # Lens Page
//!
//! The page boundary of Source Lens. The engine never owns page elements; it
//! holds [`ElementId`] handles and looks them up through the [`Document`]
//! trait, checking [`Document::is_attached`] before acting on a stored handle.
//!
//! [`PageDocument`] is an in-memory arena implementation used by tests and by
//! the CLI (loaded from a JSON page snapshot).

mod document;
mod error;
mod markup;
mod snapshot;

pub use document::{Document, ElementId, PageDocument};
pub use error::{PageError, Result};
pub use markup::escape_attribute;
pub use snapshot::{ElementSnapshot, PageSnapshot};
