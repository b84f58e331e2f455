use crate::error::{LensError, Result};
use lens_protocol::{DEFAULT_FILE_ATTRIBUTE, DEFAULT_LINE_ATTRIBUTE};
use lens_scanner::ScanScheduleConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Class names the engine puts on page elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightClasses {
    pub hover: String,
    pub element_lock: String,
    pub file_match: String,
}

impl Default for HighlightClasses {
    fn default() -> Self {
        Self {
            hover: "lens-hover".to_string(),
            element_lock: "lens-locked".to_string(),
            file_match: "lens-file-match".to_string(),
        }
    }
}

impl HighlightClasses {
    pub fn all(&self) -> [&str; 3] {
        [&self.hover, &self.element_lock, &self.file_match]
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Attribute carrying the source file path
    pub file_attribute: String,

    /// Attribute carrying the 1-based source line
    pub line_attribute: String,

    /// Single key toggling the element lock (matched case-insensitively)
    pub lock_key: String,

    /// Quiet period for debounced rescans, in milliseconds
    pub debounce_ms: u64,

    /// Upper bound on how long a debounced rescan may be postponed
    pub max_wait_ms: u64,

    /// Staggered rescans after initialization, offsets in milliseconds
    pub initial_retry_ms: Vec<u64>,

    pub classes: HighlightClasses,

    /// Fixed height of one tree row, in pixels
    pub tree_row_height: f64,

    /// Visible height of the tree container, in pixels
    pub tree_viewport_height: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            file_attribute: DEFAULT_FILE_ATTRIBUTE.to_string(),
            line_attribute: DEFAULT_LINE_ATTRIBUTE.to_string(),
            lock_key: "l".to_string(),
            debounce_ms: 300,
            max_wait_ms: 2_000,
            initial_retry_ms: vec![500, 1_000, 2_000, 4_000],
            classes: HighlightClasses::default(),
            tree_row_height: 22.0,
            tree_viewport_height: 400.0,
        }
    }
}

impl EngineConfig {
    /// Config for tests and scripted replays: no initial retries, short debounce
    pub fn for_replay() -> Self {
        Self {
            debounce_ms: 10,
            max_wait_ms: 50,
            initial_retry_ms: Vec::new(),
            ..Default::default()
        }
    }

    /// Parse JSON, falling back to TOML.
    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = match serde_json::from_str(raw) {
            Ok(config) => config,
            Err(json_err) => toml::from_str(raw).map_err(|toml_err| {
                LensError::ConfigParse(format!(
                    "not valid JSON ({json_err}) or TOML ({toml_err})"
                ))
            })?,
        };
        config.validate().map_err(LensError::InvalidConfig)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.file_attribute.trim().is_empty() || self.line_attribute.trim().is_empty() {
            return Err("attribute names must not be empty".to_string());
        }

        if self.file_attribute == self.line_attribute {
            return Err("file_attribute and line_attribute must differ".to_string());
        }

        if self.lock_key.chars().count() != 1 {
            return Err(format!("lock_key must be a single key, got {:?}", self.lock_key));
        }

        if self.debounce_ms > self.max_wait_ms {
            return Err(format!(
                "debounce_ms ({}) must not exceed max_wait_ms ({})",
                self.debounce_ms, self.max_wait_ms
            ));
        }

        if self.tree_row_height <= 0.0 || !self.tree_row_height.is_finite() {
            return Err("tree_row_height must be positive".to_string());
        }

        if self.tree_viewport_height < 0.0 || !self.tree_viewport_height.is_finite() {
            return Err("tree_viewport_height must not be negative".to_string());
        }

        let classes = self.classes.all();
        if classes.iter().any(|c| c.trim().is_empty() || c.contains(char::is_whitespace)) {
            return Err("highlight classes must be single non-empty tokens".to_string());
        }

        Ok(())
    }

    pub fn schedule_config(&self) -> ScanScheduleConfig {
        ScanScheduleConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            max_wait: Duration::from_millis(self.max_wait_ms),
            initial_retries: self
                .initial_retry_ms
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect(),
        }
    }

    pub fn is_lock_key(&self, key: &str) -> bool {
        key.eq_ignore_ascii_case(&self.lock_key)
    }
}
