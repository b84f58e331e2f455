mod error;
mod navigator;
mod render;
mod text;

pub use error::{Result, SearchError};
pub use navigator::{MatchHandle, SearchNavigator, SearchState};
pub use render::{ACTIVE_MATCH_CLASS, FOCUS_LINE_CLASS, LINE_NUMBER_CLASS, MATCH_CLASS};
pub use text::DisplayedText;
