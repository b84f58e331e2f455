use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("source not found: {0}")]
    NotFound(String),

    #[error("path escapes the source root: {0}")]
    OutsideRoot(String),

    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },
}

/// Retrieves file contents for the panel. This is the only asynchronous
/// collaborator of the engine.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch_source(&self, path: &str) -> Result<String, FetchError>;
}

/// Identifies one fetch. Only the latest issued ticket may update the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub token: u64,
    pub path: String,
}

/// Monotonic fetch tokens.
#[derive(Debug, Default)]
pub struct FetchTracker {
    latest: u64,
}

impl FetchTracker {
    pub fn issue(&mut self, path: &str) -> FetchTicket {
        self.latest += 1;
        FetchTicket {
            token: self.latest,
            path: path.to_string(),
        }
    }

    pub const fn latest(&self) -> u64 {
        self.latest
    }

    pub const fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.token == self.latest
    }

    /// Invalidate every outstanding ticket without issuing a new one.
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }
}

/// Reads sources from a directory on disk; page paths are taken relative to it.
#[derive(Debug, Clone)]
pub struct DirectoryFetcher {
    root: PathBuf,
}

impl DirectoryFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(FetchError::OutsideRoot(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl SourceFetcher for DirectoryFetcher {
    async fn fetch_source(&self, path: &str) -> Result<String, FetchError> {
        let full = self.resolve(path)?;
        match tokio::fs::read_to_string(&full).await {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::NotFound(path.to_string()))
            }
            Err(err) => Err(FetchError::Read {
                path: path.to_string(),
                message: err.to_string(),
            }),
        }
    }
}

/// In-memory sources keyed by normalized path.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    sources: HashMap<String, String>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_source(mut self, path: &str, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: &str, text: impl Into<String>) {
        self.sources
            .insert(lens_protocol::normalize_source_path(path), text.into());
    }
}

#[async_trait]
impl SourceFetcher for MemoryFetcher {
    async fn fetch_source(&self, path: &str) -> Result<String, FetchError> {
        self.sources
            .get(&lens_protocol::normalize_source_path(path))
            .cloned()
            .ok_or_else(|| FetchError::NotFound(path.to_string()))
    }
}
