use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod path_filters;

pub use path_filters::{filters_active, normalize_source_path, path_allowed, source_segments};

/// Default attribute carrying the annotated source file path.
pub const DEFAULT_FILE_ATTRIBUTE: &str = "data-source-file";

/// Default attribute carrying the annotated 1-based line number.
pub const DEFAULT_LINE_ATTRIBUTE: &str = "data-source-line";

/// Location extracted from a page annotation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceLocation {
    pub file_path: String,
    pub line_number: u32,
}

impl SourceLocation {
    /// Parse raw attribute values. Returns `None` when the path is empty
    /// or the line is not a positive integer.
    pub fn from_attributes(file: &str, line: &str) -> Option<Self> {
        let file_path = normalize_source_path(file);
        if file_path.is_empty() {
            return None;
        }
        let line_number = line.trim().parse::<u32>().ok().filter(|n| *n > 0)?;
        Some(Self {
            file_path,
            line_number,
        })
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file_path, self.line_number)
    }
}

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unsupported action: {0}")]
    UnsupportedAction(String),
}

/// Message delivered over the cross-process channel.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HostMessage {
    Toggle { checked: bool },
}

impl HostMessage {
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let action = value
            .get("action")
            .and_then(|a| a.as_str())
            .unwrap_or_default()
            .to_string();
        if action != "toggle" {
            return Err(ProtocolError::UnsupportedAction(action));
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Read-only view of what the panel currently shows, handed to the chat
/// collaborator.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DisplayedSnapshot {
    pub file_path: String,
    pub text: String,
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn location_requires_positive_line() {
        assert!(SourceLocation::from_attributes("src/a.rs", "0").is_none());
        assert!(SourceLocation::from_attributes("src/a.rs", "x").is_none());
        assert!(SourceLocation::from_attributes("", "3").is_none());
        assert_eq!(
            SourceLocation::from_attributes("/src/a.rs", " 12 "),
            Some(SourceLocation {
                file_path: "src/a.rs".to_string(),
                line_number: 12,
            })
        );
    }

    #[test]
    fn toggle_message_parses() {
        let msg = HostMessage::parse(r#"{"action":"toggle","checked":false}"#).unwrap();
        assert_eq!(msg, HostMessage::Toggle { checked: false });
    }

    #[test]
    fn unknown_action_is_rejected() {
        let err = HostMessage::parse(r#"{"action":"reload"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnsupportedAction(a) if a == "reload"));
        assert!(matches!(
            HostMessage::parse("not json"),
            Err(ProtocolError::Malformed(_))
        ));
    }
}
