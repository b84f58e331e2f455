use crate::context::{ContentState, EngineContext};
use crate::error::{LensError, Result};
use crate::tree_view::TreeView;
use lens_page::escape_attribute;
use serde::Serialize;
use std::fmt::Write;

pub const TREE_CONTAINER: &str = "tree";
pub const SOURCE_CONTAINER: &str = "source";

/// What the source half of the panel is showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PanelStatus {
    Empty,
    NoFilesFound,
    Loading { path: String },
    Showing { path: String },
    LoadFailed { path: String, message: String },
}

/// Renders the tree and the displayed source into their containers. A
/// missing container aborts that update with [`LensError::MissingContainer`].
#[derive(Debug, Clone)]
pub struct Panel {
    tree_container: bool,
    source_container: bool,
    status: PanelStatus,
    tree_markup: String,
    source_markup: String,
    counter: String,
    scroll_line: Option<u32>,
}

impl Default for Panel {
    fn default() -> Self {
        Self::new()
    }
}

impl Panel {
    pub fn new() -> Self {
        Self {
            tree_container: true,
            source_container: true,
            status: PanelStatus::Empty,
            tree_markup: String::new(),
            source_markup: String::new(),
            counter: String::new(),
            scroll_line: None,
        }
    }

    /// Record which containers the host currently provides.
    pub fn set_containers(&mut self, tree: bool, source: bool) {
        self.tree_container = tree;
        self.source_container = source;
    }

    pub const fn status(&self) -> &PanelStatus {
        &self.status
    }

    pub fn tree_markup(&self) -> &str {
        &self.tree_markup
    }

    pub fn source_markup(&self) -> &str {
        &self.source_markup
    }

    pub fn counter(&self) -> &str {
        &self.counter
    }

    /// Source line the panel last scrolled to.
    pub const fn scroll_line(&self) -> Option<u32> {
        self.scroll_line
    }

    pub fn render_tree(&mut self, ctx: &EngineContext, view: &TreeView) -> Result<()> {
        if !self.tree_container {
            return Err(LensError::MissingContainer(TREE_CONTAINER));
        }

        self.tree_markup.clear();
        for row in view.rows(&ctx.file_tree) {
            let mut class = String::from("lens-tree-row");
            class.push_str(if row.is_directory { " lens-tree-dir" } else { " lens-tree-file" });
            if row.expanded {
                class.push_str(" lens-tree-open");
            }
            if row.hovered {
                class.push_str(" lens-tree-hover");
            }
            let _ = write!(
                self.tree_markup,
                "<div class=\"{class}\" data-path=\"{}\" data-depth=\"{}\">{}",
                escape_attribute(&row.path),
                row.depth,
                escape_attribute(&row.name)
            );
            if row.locked {
                self.tree_markup.push_str("<span class=\"lens-lock-icon\"></span>");
            }
            self.tree_markup.push_str("</div>\n");
        }
        Ok(())
    }

    pub fn render_source(&mut self, ctx: &EngineContext) -> Result<()> {
        if !self.source_container {
            return Err(LensError::MissingContainer(SOURCE_CONTAINER));
        }

        self.counter = ctx.search.counter();
        let Some(displayed) = &ctx.displayed else {
            self.source_markup.clear();
            self.scroll_line = None;
            self.status = if ctx.enabled && ctx.initialized && ctx.file_tree.is_empty() {
                PanelStatus::NoFilesFound
            } else {
                PanelStatus::Empty
            };
            return Ok(());
        };

        let path = displayed.path.clone();
        match &displayed.content {
            ContentState::Pending(_) => {
                self.source_markup.clear();
                self.status = PanelStatus::Loading { path };
            }
            ContentState::Ready => {
                self.source_markup = ctx.search.render(displayed.focus_line);
                self.status = PanelStatus::Showing { path };
            }
            ContentState::Failed(message) => {
                self.source_markup.clear();
                self.status = PanelStatus::LoadFailed {
                    path,
                    message: message.clone(),
                };
            }
        }
        Ok(())
    }

    pub fn scroll_source_to(&mut self, line: u32) -> Result<()> {
        if !self.source_container {
            return Err(LensError::MissingContainer(SOURCE_CONTAINER));
        }
        self.scroll_line = Some(line);
        Ok(())
    }
}
