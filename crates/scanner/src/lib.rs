//! # Lens Scanner
//!
//! Source discovery for annotated pages.
//!
//! ## Pipeline
//!
//! ```text
//! Document
//!     │
//!     ├──> Structured pass (annotated element query)
//!     │      └─> path → lines
//!     │
//!     ├──> Raw-text pass (regex over serialized markup)
//!     │      └─> path → lines (may see content the query cannot)
//!     │
//!     └──> Merge + normalize ──> ScanTracker (deep equality)
//!                                   └─> Changed | Unchanged
//! ```
//!
//! Rescans are paced by [`ScanSchedule`]: explicit refreshes run at once,
//! navigation and head-mutation triggers are debounced, and a staggered set
//! of retries covers pages that render annotated content late.
//!
//! ## Example
//!
//! ```
//! use lens_page::PageDocument;
//! use lens_scanner::{ScanOutcome, ScanTracker, SourceScanner};
//!
//! let mut doc = PageDocument::new();
//! let root = doc.root();
//! doc.append_element(
//!     root,
//!     "div",
//!     &[("data-source-file", "/src/App.tsx"), ("data-source-line", "3")],
//! )
//! .unwrap();
//!
//! let scanner = SourceScanner::with_default_attributes().unwrap();
//! let mut tracker = ScanTracker::new();
//! let map = scanner.scan(&doc);
//! assert_eq!(tracker.accept(map), ScanOutcome::Changed);
//! assert_eq!(tracker.accept(scanner.scan(&doc)), ScanOutcome::Unchanged);
//! ```

mod error;
mod scanner;
mod schedule;
mod tracker;

pub use error::{Result, ScanError};
pub use scanner::{ScanMap, ScanReport, SourceScanner};
pub use schedule::{ScanReason, ScanSchedule, ScanScheduleConfig};
pub use tracker::{ScanOutcome, ScanTracker};
