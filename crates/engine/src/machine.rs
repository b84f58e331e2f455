//! Lock/hover transitions over [`EngineContext`].
//!
//! ```text
//!            enter(el)               lock key
//!   Idle ───────────────> Hovering ───────────> ElementLocked(el)
//!    ^  <─────────────── (el)     <───────────        │
//!    │      leave(el)              lock key           │
//!    │                                                │ tree click
//!    │  same tree click / disable                     v
//!    └──────────────────────────────────────── FileLocked(path)
//! ```
//!
//! Transitions only touch the context; the engine turns the returned effects
//! into fetches, scrolls and a highlight sync.

use crate::context::{EngineContext, LockMode};
use lens_page::ElementId;
use lens_protocol::SourceLocation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockEvent {
    /// Pointer entered an annotated element.
    Enter {
        element: ElementId,
        location: SourceLocation,
    },
    Leave(ElementId),
    LockKey,
    /// Click on a file node in the tree; `first_line` is its smallest known line.
    SelectFile {
        path: String,
        first_line: Option<u32>,
    },
    Disable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ShowSource {
        path: String,
        focus_line: Option<u32>,
    },
    RevealInTree(String),
    ScrollPageToFile {
        path: String,
        first_line: Option<u32>,
    },
    ClearPanel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: &'static str,
    pub to: &'static str,
    pub effects: Vec<Effect>,
}

impl Transition {
    pub fn changed_lock(&self) -> bool {
        self.from != self.to
    }
}

/// Apply one event. Element references in the event must already be
/// validated against the document.
pub fn step(ctx: &mut EngineContext, event: LockEvent) -> Transition {
    let from = ctx.lock.label();
    let effects = match event {
        LockEvent::Enter { element, location } => {
            if !ctx.enabled || !ctx.lock.is_idle() {
                Vec::new()
            } else {
                ctx.hovered = Some(element);
                vec![
                    Effect::ShowSource {
                        path: location.file_path.clone(),
                        focus_line: Some(location.line_number),
                    },
                    Effect::RevealInTree(location.file_path),
                ]
            }
        }
        LockEvent::Leave(element) => {
            if ctx.lock.is_idle() && ctx.hovered == Some(element) {
                ctx.hovered = None;
            }
            Vec::new()
        }
        LockEvent::LockKey => {
            match ctx.lock {
                LockMode::Idle => {
                    if let Some(element) = ctx.hovered.take() {
                        ctx.lock = LockMode::ElementLocked(element);
                    }
                }
                LockMode::ElementLocked(element) => {
                    ctx.lock = LockMode::Idle;
                    ctx.hovered = Some(element);
                }
                LockMode::FileLocked(_) => {}
            }
            Vec::new()
        }
        LockEvent::SelectFile { path, first_line } => {
            if !ctx.enabled {
                Vec::new()
            } else if ctx.locked_path() == Some(path.as_str()) {
                ctx.lock = LockMode::Idle;
                Vec::new()
            } else {
                ctx.hovered = None;
                ctx.lock = LockMode::FileLocked(path.clone());
                vec![
                    Effect::ShowSource {
                        path: path.clone(),
                        focus_line: first_line,
                    },
                    Effect::ScrollPageToFile {
                        path: path.clone(),
                        first_line,
                    },
                    Effect::RevealInTree(path),
                ]
            }
        }
        LockEvent::Disable => {
            ctx.enabled = false;
            ctx.clear_interaction();
            ctx.clear_page_state();
            vec![Effect::ClearPanel]
        }
    };

    let to = ctx.lock.label();
    if from != to {
        log::info!("Lock {from} -> {to}");
    }
    Transition { from, to, effects }
}
