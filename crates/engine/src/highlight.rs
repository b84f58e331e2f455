use crate::config::HighlightClasses;
use crate::context::{EngineContext, LockMode};
use crate::tree_view::TreeView;
use lens_page::{Document, ElementId};
use lens_protocol::normalize_source_path;
use lens_scanner::SourceScanner;

/// What the last sync left on the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub stripped: usize,
    pub applied: usize,
}

/// Remove every lens highlight class from the whole document.
pub fn strip_page(doc: &mut dyn Document, classes: &HighlightClasses) -> usize {
    let mut stripped = 0;
    for class in classes.all() {
        for id in doc.elements_with_class(class) {
            if doc.remove_class(id, class) {
                stripped += 1;
            }
        }
    }
    stripped
}

/// Annotated elements whose normalized path equals `path`, in document order.
pub fn elements_for_file(doc: &dyn Document, scanner: &SourceScanner, path: &str) -> Vec<ElementId> {
    let wanted = normalize_source_path(path);
    doc.annotated_elements(scanner.file_attribute(), scanner.line_attribute())
        .into_iter()
        .filter(|id| {
            doc.attribute(*id, scanner.file_attribute())
                .is_some_and(|raw| normalize_source_path(raw) == wanted)
        })
        .collect()
}

/// Bring page classes and tree markers in line with the context. Everything
/// is cleared first and then re-applied from `ctx.lock` / `ctx.hovered`.
pub fn sync(
    ctx: &EngineContext,
    doc: &mut dyn Document,
    view: &mut TreeView,
    scanner: &SourceScanner,
    classes: &HighlightClasses,
) -> SyncReport {
    let mut report = SyncReport {
        stripped: strip_page(doc, classes),
        applied: 0,
    };
    view.clear_markers();

    match &ctx.lock {
        LockMode::Idle => {
            let Some(id) = ctx.hovered else {
                return report;
            };
            if !doc.is_attached(id) {
                return report;
            }
            if doc.add_class(id, &classes.hover) {
                report.applied += 1;
            }
            if let Some(location) = scanner.element_location(doc, id) {
                view.set_hover_marker(&location.file_path);
            }
        }
        LockMode::ElementLocked(id) => {
            if doc.is_attached(*id) && doc.add_class(*id, &classes.element_lock) {
                report.applied += 1;
            }
            if let Some(location) = scanner.element_location(doc, *id) {
                view.set_lock_marker(&location.file_path);
            }
        }
        LockMode::FileLocked(path) => {
            for id in elements_for_file(doc, scanner, path) {
                if doc.add_class(id, &classes.file_match) {
                    report.applied += 1;
                }
            }
            view.set_lock_marker(path);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use lens_page::PageDocument;
    use pretty_assertions::assert_eq;

    struct Fixture {
        doc: PageDocument,
        a1: ElementId,
        a2: ElementId,
        b: ElementId,
    }

    fn fixture() -> Fixture {
        let mut doc = PageDocument::new();
        let root = doc.root();
        let attrs = |file: &'static str, line: &'static str| {
            [("data-source-file", file), ("data-source-line", line)]
        };
        let a1 = doc.append_element(root, "div", &attrs("/src/a.tsx", "3")).unwrap();
        let a2 = doc.append_element(root, "span", &attrs("src/a.tsx", "9")).unwrap();
        let b = doc.append_element(root, "p", &attrs("src/b.tsx", "1")).unwrap();
        Fixture { doc, a1, a2, b }
    }

    fn classes() -> HighlightClasses {
        HighlightClasses::default()
    }

    fn scanner() -> SourceScanner {
        SourceScanner::with_default_attributes().unwrap()
    }

    #[test]
    fn hover_marks_one_element_and_tree_node() {
        let mut f = fixture();
        let mut view = TreeView::new(20.0, 100.0);
        let mut ctx = EngineContext::default();
        ctx.hovered = Some(f.b);

        let report = sync(&ctx, &mut f.doc, &mut view, &scanner(), &classes());
        assert_eq!(report.applied, 1);
        assert!(f.doc.has_class(f.b, "lens-hover"));
        assert_eq!(view.hover_marker(), Some("src/b.tsx"));
        assert_eq!(view.lock_marker(), None);
    }

    #[test]
    fn switching_to_element_lock_clears_hover_first() {
        let mut f = fixture();
        let mut view = TreeView::new(20.0, 100.0);
        let scanner = scanner();
        let mut ctx = EngineContext::default();
        ctx.hovered = Some(f.a1);
        sync(&ctx, &mut f.doc, &mut view, &scanner, &classes());

        ctx.hovered = None;
        ctx.lock = LockMode::ElementLocked(f.a1);
        let report = sync(&ctx, &mut f.doc, &mut view, &scanner, &classes());
        assert_eq!(report, SyncReport { stripped: 1, applied: 1 });
        assert!(!f.doc.has_class(f.a1, "lens-hover"));
        assert!(f.doc.has_class(f.a1, "lens-locked"));
        assert_eq!(view.lock_marker(), Some("src/a.tsx"));
        assert_eq!(view.hover_marker(), None);
    }

    #[test]
    fn file_lock_matches_normalized_paths() {
        let mut f = fixture();
        let mut view = TreeView::new(20.0, 100.0);
        let mut ctx = EngineContext::default();
        ctx.lock = LockMode::FileLocked("src/a.tsx".to_string());

        sync(&ctx, &mut f.doc, &mut view, &scanner(), &classes());
        assert_eq!(f.doc.elements_with_class("lens-file-match"), vec![f.a1, f.a2]);
        assert!(!f.doc.has_class(f.b, "lens-file-match"));
    }

    #[test]
    fn strip_removes_every_lens_class() {
        let mut f = fixture();
        f.doc.add_class(f.a1, "lens-hover");
        f.doc.add_class(f.a2, "lens-locked");
        f.doc.add_class(f.b, "lens-file-match");
        f.doc.add_class(f.b, "unrelated");

        assert_eq!(strip_page(&mut f.doc, &classes()), 3);
        assert!(f.doc.has_class(f.b, "unrelated"));
        for class in classes().all() {
            assert!(f.doc.elements_with_class(class).is_empty());
        }
    }

    #[test]
    fn detached_hover_target_is_not_marked() {
        let mut f = fixture();
        f.doc.detach(f.a2).unwrap();
        let mut view = TreeView::new(20.0, 100.0);
        let mut ctx = EngineContext::default();
        ctx.hovered = Some(f.a2);

        let report = sync(&ctx, &mut f.doc, &mut view, &scanner(), &classes());
        assert_eq!(report.applied, 0);
        assert_eq!(view.hover_marker(), None);
    }
}
