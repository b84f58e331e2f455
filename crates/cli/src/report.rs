use crate::replay::ReplaySummary;
use lens_engine::PanelStatus;
use lens_scanner::{ScanMap, ScanReport};
use lens_search::{MatchHandle, SearchNavigator};
use lens_tree::{render_tree, BuiltTree, TreeNode, TreeWarning};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

#[derive(Debug, Serialize)]
pub struct ScanOutput {
    pub files: BTreeMap<String, Vec<u32>>,
    pub tree: TreeNode,
    pub warnings: Vec<TreeWarning>,
    pub report: ScanReport,
}

impl ScanOutput {
    pub fn new(map: &ScanMap, built: BuiltTree, report: ScanReport) -> Self {
        Self {
            files: map
                .iter()
                .map(|(path, lines)| (path.clone(), lines.iter().copied().collect()))
                .collect(),
            tree: built.root,
            warnings: built.warnings,
            report,
        }
    }
}

pub fn render_scan(out: &ScanOutput) -> String {
    if out.files.is_empty() {
        return "No annotated source files found.".to_string();
    }

    let mut text = render_tree(&out.tree);
    for warning in &out.warnings {
        let _ = writeln!(text, "warning: {warning}");
    }
    let locations: usize = out.files.values().map(Vec::len).sum();
    let _ = write!(
        text,
        "{} files, {} locations ({} raw-only)",
        out.files.len(),
        locations,
        out.report.raw_only
    );
    text
}

#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub term: String,
    pub total: usize,
    pub counter: String,
    pub active: Option<MatchHandle>,
    pub active_line: Option<String>,
}

impl SearchOutput {
    pub fn new(navigator: &SearchNavigator) -> Self {
        let active = navigator.active();
        Self {
            term: navigator.term().to_string(),
            total: navigator.matches().len(),
            counter: navigator.counter(),
            active,
            active_line: active
                .and_then(|m| navigator.text().line(m.line))
                .map(str::to_string),
        }
    }
}

pub fn render_search(out: &SearchOutput) -> String {
    match (&out.active, &out.active_line) {
        (Some(hit), Some(line)) => format!(
            "{} {}:{} {}",
            out.counter,
            hit.line,
            hit.start + 1,
            line.trim()
        ),
        _ => format!("{} no matches for {:?}", out.counter, out.term),
    }
}

pub fn render_summary(summary: &ReplaySummary) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "enabled: {}", summary.enabled);
    let _ = writeln!(text, "lock: {}", summary.lock);
    if let Some(hovered) = &summary.hovered {
        let _ = writeln!(text, "hovered: {hovered}");
    }
    let _ = writeln!(
        text,
        "files: {} (rebuilds: {})",
        summary.files, summary.rebuild_count
    );

    let highlights = [
        ("hover", &summary.highlights.hover),
        ("locked", &summary.highlights.locked),
        ("file-match", &summary.highlights.file_match),
    ];
    for (label, names) in highlights {
        if !names.is_empty() {
            let _ = writeln!(text, "{label}: {}", names.join(", "));
        }
    }

    let panel = match &summary.panel {
        PanelStatus::Empty => "empty".to_string(),
        PanelStatus::NoFilesFound => "no files found".to_string(),
        PanelStatus::Loading { path } => format!("loading {path}"),
        PanelStatus::Showing { path } => format!("showing {path}"),
        PanelStatus::LoadFailed { path, message } => format!("failed {path}: {message}"),
    };
    let _ = writeln!(text, "panel: {panel}");
    if let Some(displayed) = &summary.displayed {
        let focus = displayed
            .focus_line
            .map_or_else(|| "-".to_string(), |line| line.to_string());
        let _ = writeln!(
            text,
            "displayed: {} ({} lines, focus {focus})",
            displayed.path, displayed.lines
        );
    }
    if !summary.search_counter.is_empty() {
        let _ = writeln!(text, "search: {}", summary.search_counter);
    }
    text.push_str(&summary.tree);
    text.trim_end().to_string()
}
