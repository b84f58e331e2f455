use crate::scanner::ScanMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Structurally equal to the last accepted map; nothing to rebuild.
    Unchanged,
    Changed,
}

/// Remembers the last accepted scan so no-op rescans do not rebuild the tree.
#[derive(Debug, Default)]
pub struct ScanTracker {
    last: Option<ScanMap>,
}

impl ScanTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, map: ScanMap) -> ScanOutcome {
        if self.last.as_ref() == Some(&map) {
            return ScanOutcome::Unchanged;
        }
        self.last = Some(map);
        ScanOutcome::Changed
    }

    /// Forget the last map (page navigation). The next scan always counts as
    /// changed, even when empty.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn map(entries: &[(&str, &[u32])]) -> ScanMap {
        entries
            .iter()
            .map(|(path, lines)| (path.to_string(), lines.iter().copied().collect::<BTreeSet<_>>()))
            .collect()
    }

    #[test]
    fn equal_maps_are_unchanged() {
        let mut tracker = ScanTracker::new();
        assert_eq!(tracker.accept(map(&[("a", &[1, 2])])), ScanOutcome::Changed);
        assert_eq!(tracker.accept(map(&[("a", &[2, 1])])), ScanOutcome::Unchanged);
        assert_eq!(tracker.accept(map(&[("a", &[1])])), ScanOutcome::Changed);
    }

    #[test]
    fn first_empty_scan_counts_as_changed() {
        let mut tracker = ScanTracker::new();
        assert_eq!(tracker.accept(ScanMap::new()), ScanOutcome::Changed);
        assert_eq!(tracker.accept(ScanMap::new()), ScanOutcome::Unchanged);
        tracker.reset();
        assert_eq!(tracker.accept(ScanMap::new()), ScanOutcome::Changed);
    }
}
