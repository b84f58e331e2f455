use crate::config::EngineConfig;
use crate::context::{ContentState, DisplayedFile, EngineContext, LockMode, PanelTab};
use crate::error::{LensError, Result};
use crate::fetch::{FetchError, FetchTicket, FetchTracker};
use crate::highlight::{self, SyncReport};
use crate::machine::{self, Effect, LockEvent, Transition};
use crate::panel::Panel;
use crate::settings::{self, SettingsStore};
use crate::tree_view::TreeView;
use lens_page::{Document, ElementId};
use lens_protocol::{normalize_source_path, DisplayedSnapshot, HostMessage, ProtocolError};
use lens_scanner::{ScanOutcome, ScanReason, ScanTracker, SourceScanner};
use lens_search::{DisplayedText, MatchHandle};
use lens_tree::build_tree;

/// One page session: the document plus everything the lens derives from it.
///
/// Entry points never fail towards the host. Panel problems are logged and
/// the affected update is skipped.
pub struct Engine<D: Document> {
    ctx: EngineContext,
    doc: D,
    config: EngineConfig,
    scanner: SourceScanner,
    tracker: ScanTracker,
    tree_view: TreeView,
    panel: Panel,
    fetches: FetchTracker,
    settings: Option<Box<dyn SettingsStore>>,
}

impl<D: Document> Engine<D> {
    pub fn new(doc: D, config: EngineConfig) -> Result<Self> {
        Self::with_settings(doc, config, None)
    }

    /// The stored toggle decides whether the engine starts enabled; without
    /// a store it does.
    pub fn with_settings(
        doc: D,
        config: EngineConfig,
        settings: Option<Box<dyn SettingsStore>>,
    ) -> Result<Self> {
        config.validate().map_err(LensError::InvalidConfig)?;
        let scanner = SourceScanner::new(&config.file_attribute, &config.line_attribute)?;
        let enabled = settings::resolve_enabled(settings.as_deref());
        let tree_view = TreeView::new(config.tree_row_height, config.tree_viewport_height);

        Ok(Self {
            ctx: EngineContext::new(enabled),
            doc,
            config,
            scanner,
            tracker: ScanTracker::new(),
            tree_view,
            panel: Panel::new(),
            fetches: FetchTracker::default(),
            settings,
        })
    }

    pub const fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub const fn document(&self) -> &D {
        &self.doc
    }

    /// Host-side page mutations. Call [`Engine::rescan`] or
    /// [`Engine::navigated`] afterwards as appropriate.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub const fn scanner(&self) -> &SourceScanner {
        &self.scanner
    }

    pub const fn tree_view(&self) -> &TreeView {
        &self.tree_view
    }

    pub const fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut Panel {
        &mut self.panel
    }

    pub const fn is_enabled(&self) -> bool {
        self.ctx.enabled
    }

    pub const fn rebuild_count(&self) -> u64 {
        self.ctx.rebuild_count
    }

    /// First scan after page load.
    pub fn initialize(&mut self) -> ScanOutcome {
        self.ctx.initialized = true;
        self.rescan(ScanReason::Refresh)
    }

    pub fn refresh(&mut self) -> ScanOutcome {
        self.rescan(ScanReason::Refresh)
    }

    /// Scan the page and rebuild the tree when the map changed.
    pub fn rescan(&mut self, reason: ScanReason) -> ScanOutcome {
        if !self.ctx.enabled {
            log::debug!("Skipping {reason:?} scan while disabled");
            return ScanOutcome::Unchanged;
        }
        self.ctx.initialized = true;

        let (map, report) = self.scanner.scan_with_report(&self.doc);
        let outcome = self.tracker.accept(map.clone());
        if outcome == ScanOutcome::Changed {
            let built = build_tree(&map);
            self.ctx.rebuild_count += 1;
            self.ctx.scan_map = map;
            self.ctx.file_tree = built.root;
            self.ctx.tree_warnings = built.warnings;
            self.tree_view.retain_existing(&self.ctx.file_tree);
            self.release_missing_file_lock();
            log::info!(
                "Rebuilt source tree ({reason:?}): {} files, {} locations",
                report.files,
                report.locations
            );
        } else {
            log::debug!("{reason:?} scan unchanged");
        }

        self.revalidate();
        self.refresh_view();
        outcome
    }

    /// The page navigated in place. Derived page state is dropped. An element
    /// lock lasts while its element stays attached; a file lock lasts until an
    /// accepted scan no longer contains the file.
    pub fn navigated(&mut self) {
        log::debug!("Navigation detected; clearing page state");
        self.ctx.clear_page_state();
        self.tracker.reset();
        self.fetches.invalidate();
        self.tree_view.reset();
        self.revalidate();
        self.refresh_view();
    }

    /// Pointer entered `element`. Returns the fetch to run when the panel
    /// needs new content.
    pub fn hover(&mut self, element: ElementId) -> Option<FetchTicket> {
        if !self.ctx.enabled {
            return None;
        }
        self.revalidate();
        if !self.doc.is_attached(element) {
            return None;
        }
        let location = self.scanner.element_location(&self.doc, element)?;
        let transition = machine::step(&mut self.ctx, LockEvent::Enter { element, location });
        self.apply(transition)
    }

    pub fn leave(&mut self, element: ElementId) {
        self.revalidate();
        let transition = machine::step(&mut self.ctx, LockEvent::Leave(element));
        self.apply(transition);
    }

    /// Keyboard input. Only the configured lock key does anything.
    pub fn press_key(&mut self, key: &str) -> bool {
        self.config.is_lock_key(key) && self.toggle_lock()
    }

    /// Returns whether the lock mode changed.
    pub fn toggle_lock(&mut self) -> bool {
        if !self.ctx.enabled {
            return false;
        }
        if self.doc.focus_in_text_entry() {
            log::debug!("Lock key ignored: focus is in a text entry");
            return false;
        }
        self.revalidate();
        let transition = machine::step(&mut self.ctx, LockEvent::LockKey);
        let changed = transition.changed_lock();
        self.apply(transition);
        changed
    }

    /// Tree file click: lock onto every element of `path`, or unlock when
    /// the same file is already locked.
    pub fn select_file(&mut self, path: &str) -> Option<FetchTicket> {
        let path = normalize_source_path(path);
        self.revalidate();
        let known = self.ctx.file_tree.find_file(&path).is_some();
        if !known && self.ctx.locked_path() != Some(path.as_str()) {
            log::debug!("Ignoring selection of {path:?}: not a file in the tree");
            return None;
        }
        let first_line = self.ctx.file_tree.first_line(&path);
        let transition = machine::step(&mut self.ctx, LockEvent::SelectFile { path, first_line });
        self.apply(transition)
    }

    pub fn toggle_directory(&mut self, path: &str) -> bool {
        let toggled = self
            .tree_view
            .toggle_directory(&self.ctx.file_tree, &normalize_source_path(path));
        if toggled {
            self.render_panel();
        }
        toggled
    }

    pub fn disable(&mut self) {
        self.persist_enabled(false);
        let transition = machine::step(&mut self.ctx, LockEvent::Disable);
        self.apply(transition);
        log::info!("Lens disabled");
    }

    pub fn enable(&mut self) -> ScanOutcome {
        self.persist_enabled(true);
        if !self.ctx.enabled {
            self.ctx.enabled = true;
            log::info!("Lens enabled");
        }
        self.rescan(ScanReason::Enabled)
    }

    /// Cross-process message. Returns the enabled state after a recognized
    /// toggle; anything else is logged and ignored.
    pub fn handle_message(&mut self, raw: &str) -> Option<bool> {
        match HostMessage::parse(raw) {
            Ok(HostMessage::Toggle { checked }) => {
                if checked {
                    self.enable();
                } else {
                    self.disable();
                }
                Some(self.ctx.enabled)
            }
            Err(ProtocolError::UnsupportedAction(action)) => {
                log::debug!("Ignoring message with action {action:?}");
                None
            }
            Err(err) => {
                log::debug!("Ignoring message: {err}");
                None
            }
        }
    }

    /// Deliver a fetch result. Returns `false` when the ticket is stale and
    /// the result was discarded.
    pub fn complete_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: std::result::Result<String, FetchError>,
    ) -> bool {
        if !self.fetches.is_current(ticket) {
            log::debug!(
                "Discarding stale fetch of {} (token {}, latest {})",
                ticket.path,
                ticket.token,
                self.fetches.latest()
            );
            return false;
        }
        let Some(displayed) = self
            .ctx
            .displayed
            .as_mut()
            .filter(|displayed| displayed.path == ticket.path)
        else {
            log::debug!("Discarding fetch of {}: no longer displayed", ticket.path);
            return false;
        };

        let focus_line = displayed.focus_line;
        match result {
            Ok(text) => {
                displayed.content = ContentState::Ready;
                self.ctx.search.replace_text(DisplayedText::new(&text));
                log::debug!("Loaded {} ({} lines)", ticket.path, self.ctx.search.text().line_count());
            }
            Err(err) => {
                log::warn!("Failed to load {}: {err}", ticket.path);
                displayed.content = ContentState::Failed(err.to_string());
            }
        }

        self.render_panel();
        if let Some(line) = focus_line {
            self.scroll_source(line);
        }
        true
    }

    pub fn set_search_term(&mut self, term: &str) -> Result<usize> {
        let count = self.ctx.search.set_term(term)?;
        self.render_panel();
        Ok(count)
    }

    pub fn search_next(&mut self) -> Option<MatchHandle> {
        let found = self.ctx.search.next();
        self.after_search_step(found)
    }

    pub fn search_previous(&mut self) -> Option<MatchHandle> {
        let found = self.ctx.search.previous();
        self.after_search_step(found)
    }

    pub fn clear_search(&mut self) {
        self.ctx.search.clear();
        self.render_panel();
    }

    /// Explicit click on a line of the displayed source.
    pub fn click_source_line(&mut self, line: u32) {
        self.ctx.search.click_line(line);
    }

    pub fn set_active_tab(&mut self, tab: PanelTab) {
        self.ctx.active_tab = tab;
    }

    pub fn resize_panel(&mut self, width: f64, tree_fraction: f64) {
        self.ctx.panel_geometry = self.ctx.panel_geometry.resized(width, tree_fraction);
    }

    /// Copy of the displayed source for read-only collaborators.
    pub fn displayed_snapshot(&self) -> Option<DisplayedSnapshot> {
        let displayed = self.ctx.displayed.as_ref()?;
        if displayed.content != ContentState::Ready {
            return None;
        }
        Some(DisplayedSnapshot {
            file_path: displayed.path.clone(),
            text: self.ctx.search.text().text(),
        })
    }

    /// Re-apply page classes and tree markers from the context.
    pub fn sync_highlights(&mut self) -> SyncReport {
        highlight::sync(
            &self.ctx,
            &mut self.doc,
            &mut self.tree_view,
            &self.scanner,
            &self.config.classes,
        )
    }

    /// Drop element references that no longer point into the page.
    fn revalidate(&mut self) {
        if let Some(hovered) = self.ctx.hovered {
            if !self.doc.is_attached(hovered) {
                log::debug!("Hovered element {hovered} detached");
                self.ctx.hovered = None;
            }
        }
        if let LockMode::ElementLocked(locked) = self.ctx.lock {
            if !self.doc.is_attached(locked) {
                log::info!("Locked element {locked} detached; unlocking");
                self.ctx.lock = LockMode::Idle;
            }
        }
    }

    fn release_missing_file_lock(&mut self) {
        if let Some(path) = self.ctx.locked_path() {
            if self.ctx.file_tree.find_file(path).is_none() {
                log::info!("Locked file {path} is gone from the page; unlocking");
                self.ctx.lock = LockMode::Idle;
            }
        }
    }

    fn apply(&mut self, transition: Transition) -> Option<FetchTicket> {
        let mut ticket = None;
        for effect in transition.effects {
            match effect {
                Effect::ShowSource { path, focus_line } => {
                    if let Some(issued) = self.show_source(&path, focus_line) {
                        ticket = Some(issued);
                    }
                }
                Effect::RevealInTree(path) => {
                    self.tree_view.reveal(&self.ctx.file_tree, &path);
                }
                Effect::ScrollPageToFile { path, first_line } => {
                    self.scroll_page_to_file(&path, first_line);
                }
                Effect::ClearPanel => {
                    self.tree_view.reset();
                    self.tracker.reset();
                    self.fetches.invalidate();
                }
            }
        }
        self.refresh_view();
        ticket
    }

    fn show_source(&mut self, path: &str, focus_line: Option<u32>) -> Option<FetchTicket> {
        if let Some(displayed) = self.ctx.displayed.as_mut() {
            let reusable = !matches!(displayed.content, ContentState::Failed(_));
            if displayed.path == path && reusable {
                displayed.focus_line = focus_line;
                let ready = displayed.content == ContentState::Ready;
                if let (true, Some(line)) = (ready, focus_line) {
                    self.scroll_source(line);
                }
                return None;
            }
        }

        let ticket = self.fetches.issue(path);
        log::debug!("Fetching {path} (token {})", ticket.token);
        self.ctx.search.replace_text(DisplayedText::default());
        self.ctx.displayed = Some(DisplayedFile {
            path: path.to_string(),
            focus_line,
            content: ContentState::Pending(ticket.token),
        });
        Some(ticket)
    }

    /// Scroll the page to the element annotated with the file's first known
    /// line, else to the first element of the file.
    fn scroll_page_to_file(&mut self, path: &str, first_line: Option<u32>) {
        let elements = highlight::elements_for_file(&self.doc, &self.scanner, path);
        let exact = first_line.and_then(|line| {
            elements.iter().copied().find(|id| {
                self.scanner
                    .element_location(&self.doc, *id)
                    .is_some_and(|location| location.line_number == line)
            })
        });
        match exact.or_else(|| elements.first().copied()) {
            Some(target) => self.doc.scroll_into_view(target),
            None => log::debug!("No element on the page for {path}"),
        }
    }

    fn after_search_step(&mut self, found: Option<MatchHandle>) -> Option<MatchHandle> {
        if let Some(hit) = found {
            self.scroll_source(hit.line);
        }
        self.render_panel();
        found
    }

    fn scroll_source(&mut self, line: u32) {
        if let Err(err) = self.panel.scroll_source_to(line) {
            log::error!("Source scroll aborted: {err}");
        }
    }

    fn refresh_view(&mut self) {
        self.sync_highlights();
        self.render_panel();
    }

    fn render_panel(&mut self) {
        if let Err(err) = self.panel.render_tree(&self.ctx, &self.tree_view) {
            log::error!("Tree update aborted: {err}");
        }
        if let Err(err) = self.panel.render_source(&self.ctx) {
            log::error!("Source update aborted: {err}");
        }
    }

    fn persist_enabled(&mut self, enabled: bool) {
        if let Some(store) = self.settings.as_mut() {
            if let Err(err) = store.store_enabled(enabled) {
                log::warn!("Failed to persist enabled={enabled}: {err}");
            }
        }
    }
}

impl<D: Document + std::fmt::Debug> std::fmt::Debug for Engine<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("ctx", &self.ctx)
            .field("doc", &self.doc)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
