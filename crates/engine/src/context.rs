use lens_page::ElementId;
use lens_scanner::ScanMap;
use lens_search::SearchNavigator;
use lens_tree::{TreeNode, TreeWarning};
use serde::{Deserialize, Serialize};

/// Exactly one lock mode is active at a time; the locked element or path
/// lives inside the variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LockMode {
    #[default]
    Idle,
    ElementLocked(ElementId),
    FileLocked(String),
}

impl LockMode {
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ElementLocked(_) => "element-locked",
            Self::FileLocked(_) => "file-locked",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelTab {
    #[default]
    Source,
    Chat,
}

/// Panel size; survives navigation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelGeometry {
    pub width: f64,
    /// Share of the panel height given to the tree, `0.0..=1.0`
    pub tree_fraction: f64,
}

impl Default for PanelGeometry {
    fn default() -> Self {
        Self {
            width: 420.0,
            tree_fraction: 0.4,
        }
    }
}

impl PanelGeometry {
    pub const MIN_WIDTH: f64 = 240.0;

    pub fn resized(self, width: f64, tree_fraction: f64) -> Self {
        Self {
            width: if width.is_finite() { width.max(Self::MIN_WIDTH) } else { self.width },
            tree_fraction: if tree_fraction.is_finite() {
                tree_fraction.clamp(0.1, 0.9)
            } else {
                self.tree_fraction
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentState {
    /// Waiting on the fetch carrying this token
    Pending(u64),
    Ready,
    Failed(String),
}

/// The source file currently shown in the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedFile {
    pub path: String,
    pub focus_line: Option<u32>,
    pub content: ContentState,
}

/// Per-page session state. Owned by the engine and handed by `&mut` to the
/// machine, highlight and panel functions.
#[derive(Debug, Clone)]
pub struct EngineContext {
    pub enabled: bool,
    pub initialized: bool,
    pub lock: LockMode,
    /// Only meaningful while `lock` is `Idle`.
    pub hovered: Option<ElementId>,
    pub scan_map: ScanMap,
    pub file_tree: TreeNode,
    pub tree_warnings: Vec<TreeWarning>,
    pub search: SearchNavigator,
    pub displayed: Option<DisplayedFile>,
    pub panel_geometry: PanelGeometry,
    pub active_tab: PanelTab,
    pub rebuild_count: u64,
}

impl EngineContext {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            initialized: false,
            lock: LockMode::Idle,
            hovered: None,
            scan_map: ScanMap::new(),
            file_tree: TreeNode::empty_root(),
            tree_warnings: Vec::new(),
            search: SearchNavigator::default(),
            displayed: None,
            panel_geometry: PanelGeometry::default(),
            active_tab: PanelTab::Source,
            rebuild_count: 0,
        }
    }

    /// Forget everything derived from the current page.
    pub fn clear_page_state(&mut self) {
        self.scan_map.clear();
        self.file_tree = TreeNode::empty_root();
        self.tree_warnings.clear();
        self.search = SearchNavigator::default();
        self.displayed = None;
    }

    pub fn clear_interaction(&mut self) {
        self.lock = LockMode::Idle;
        self.hovered = None;
    }

    pub fn locked_path(&self) -> Option<&str> {
        match &self.lock {
            LockMode::FileLocked(path) => Some(path),
            _ => None,
        }
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new(true)
    }
}
