//! # Lens Engine
//!
//! Ties page, scanner, tree and search together into one page session.
//!
//! ## Architecture
//!
//! ```text
//! page events (hover / leave / key / tree click / toggle message)
//!     │
//!     ├──> machine::step ──> EngineContext.lock / hovered
//!     │        └─> effects: show source, reveal tree node, scroll page
//!     │
//!     ├──> highlight::sync (strip everything, re-apply from context)
//!     │
//!     ├──> FetchTicket ──> SourceFetcher (async) ──> complete_fetch
//!     │                                     stale tokens are dropped
//!     │
//!     └──> Panel (tree rows, source markup, search counter)
//!
//! LensSession
//!     ├─ Arc<Mutex<Engine>>, never locked across a fetch
//!     └─ rescan loop: ScanSchedule + tokio::select! / sleep_until
//! ```

mod config;
mod context;
mod engine;
mod error;
mod fetch;
mod highlight;
mod machine;
mod panel;
mod session;
mod settings;
mod tree_view;

pub use config::{EngineConfig, HighlightClasses};
pub use context::{
    ContentState, DisplayedFile, EngineContext, LockMode, PanelGeometry, PanelTab,
};
pub use engine::Engine;
pub use error::{LensError, Result};
pub use fetch::{
    DirectoryFetcher, FetchError, FetchTicket, FetchTracker, MemoryFetcher, SourceFetcher,
};
pub use highlight::{elements_for_file, strip_page, sync, SyncReport};
pub use machine::{step, Effect, LockEvent, Transition};
pub use panel::{Panel, PanelStatus, SOURCE_CONTAINER, TREE_CONTAINER};
pub use session::{LensSession, ScanUpdate};
pub use settings::{resolve_enabled, FileSettings, MemorySettings, SettingsStore};
pub use tree_view::{center_scroll_top, TreeRow, TreeView};
