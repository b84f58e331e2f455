use crate::error::Result;
use crate::render;
use crate::text::DisplayedText;
use regex::RegexBuilder;
use serde::Serialize;

/// One occurrence of the search term: 1-based line, byte range in that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchHandle {
    pub line: u32,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchState {
    pub term: String,
    pub matches: Vec<MatchHandle>,
    /// `None` when no match is active; otherwise `< matches.len()`.
    pub active_index: Option<usize>,
    /// Last line clicked in the panel, consumed by the next navigation.
    pub last_clicked_line: Option<u32>,
}

impl SearchState {
    pub fn active(&self) -> Option<MatchHandle> {
        self.active_index.and_then(|idx| self.matches.get(idx).copied())
    }

    /// Anchor for next/previous: the unconsumed click, else the active match.
    pub fn reference_line(&self) -> Option<u32> {
        self.last_clicked_line
            .or_else(|| self.active().map(|m| m.line))
    }
}

/// Find/next/previous over the displayed source only.
#[derive(Debug, Clone, Default)]
pub struct SearchNavigator {
    text: DisplayedText,
    state: SearchState,
}

impl SearchNavigator {
    pub fn new(text: DisplayedText) -> Self {
        Self {
            text,
            state: SearchState::default(),
        }
    }

    /// Swap in a newly displayed source; any search is reset.
    pub fn replace_text(&mut self, text: DisplayedText) {
        self.text = text;
        self.state = SearchState::default();
    }

    pub const fn text(&self) -> &DisplayedText {
        &self.text
    }

    pub const fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn term(&self) -> &str {
        &self.state.term
    }

    pub fn matches(&self) -> &[MatchHandle] {
        &self.state.matches
    }

    pub fn active(&self) -> Option<MatchHandle> {
        self.state.active()
    }

    /// Apply a new term. Re-applying the current term is a no-op. The first
    /// match becomes active without any scroll. Returns the match count.
    pub fn set_term(&mut self, term: &str) -> Result<usize> {
        if term == self.state.term {
            return Ok(self.state.matches.len());
        }

        self.restore_pristine();
        self.state.term = term.to_string();
        if term.is_empty() {
            return Ok(0);
        }

        let pattern = RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build()?;

        let mut matches = Vec::new();
        for (line, content) in self.text.numbered_lines() {
            for found in pattern.find_iter(content) {
                if found.start() == found.end() {
                    continue;
                }
                matches.push(MatchHandle {
                    line,
                    start: found.start(),
                    end: found.end(),
                });
            }
        }

        log::debug!("Search {term:?}: {} matches", matches.len());
        self.state.active_index = (!matches.is_empty()).then_some(0);
        self.state.matches = matches;
        Ok(self.state.matches.len())
    }

    /// Record an explicit click on a panel line; it anchors the next step.
    pub fn click_line(&mut self, line: u32) {
        self.state.last_clicked_line = Some(line);
    }

    /// Step to the first match after the reference line (wrapping to the
    /// first match). Returns the match to scroll to.
    pub fn next(&mut self) -> Option<MatchHandle> {
        let matches = &self.state.matches;
        if matches.is_empty() {
            return None;
        }

        let target = match self.state.reference_line() {
            None => 0,
            Some(reference) => matches
                .iter()
                .position(|m| m.line > reference)
                .unwrap_or(0),
        };
        self.activate(target)
    }

    /// Step to the last match before the reference line (wrapping to the last
    /// match). Returns the match to scroll to.
    pub fn previous(&mut self) -> Option<MatchHandle> {
        let matches = &self.state.matches;
        if matches.is_empty() {
            return None;
        }

        let last = matches.len() - 1;
        let target = match self.state.reference_line() {
            None => last,
            Some(reference) => matches
                .iter()
                .rposition(|m| m.line < reference)
                .unwrap_or(last),
        };
        self.activate(target)
    }

    /// Restore pristine text and forget the term, matches and counter.
    pub fn clear(&mut self) {
        self.restore_pristine();
        self.state.term.clear();
    }

    /// "active/total", "0/0" without matches, empty without a term.
    pub fn counter(&self) -> String {
        if self.state.term.is_empty() {
            return String::new();
        }
        match self.state.active_index {
            Some(idx) => format!("{}/{}", idx + 1, self.state.matches.len()),
            None => format!("0/{}", self.state.matches.len()),
        }
    }

    /// Panel markup: line-number gutter plus source text with match markers.
    pub fn render(&self, focus_line: Option<u32>) -> String {
        render::render_lines(&self.text, &self.state, focus_line)
    }

    fn activate(&mut self, idx: usize) -> Option<MatchHandle> {
        self.state.active_index = Some(idx);
        self.state.last_clicked_line = None;
        self.state.matches.get(idx).copied()
    }

    fn restore_pristine(&mut self) {
        self.state.matches.clear();
        self.state.active_index = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // "foo" twice on line 3, once on lines 7 and 10
    fn sample() -> SearchNavigator {
        let mut lines = vec!["-"; 10];
        lines[2] = "foo and Foo";
        lines[6] = "  FOO";
        lines[9] = "end foo";
        SearchNavigator::new(DisplayedText::new(&lines.join("\n")))
    }

    fn lines_of(nav: &SearchNavigator) -> Vec<u32> {
        nav.matches().iter().map(|m| m.line).collect()
    }

    #[test]
    fn set_term_is_case_insensitive_and_activates_first_match() {
        let mut nav = sample();
        assert_eq!(nav.set_term("foo").unwrap(), 4);
        assert_eq!(lines_of(&nav), vec![3, 3, 7, 10]);
        assert_eq!(nav.state().active_index, Some(0));
        assert_eq!(nav.counter(), "1/4");
        assert_eq!(
            nav.matches()[1],
            MatchHandle {
                line: 3,
                start: 8,
                end: 11
            }
        );
    }

    #[test]
    fn term_is_literal_not_a_pattern() {
        let mut nav = SearchNavigator::new(DisplayedText::new("a.b\naxb\n(x)"));
        assert_eq!(nav.set_term("a.b").unwrap(), 1);
        assert_eq!(nav.set_term("(x)").unwrap(), 1);
    }

    #[test]
    fn next_wraps_from_last_line_to_first_match() {
        let mut nav = sample();
        nav.set_term("foo").unwrap();
        nav.click_line(10);
        assert_eq!(nav.next().map(|m| (m.line, m.start)), Some((3, 0)));
        assert_eq!(nav.state().active_index, Some(0));
    }

    #[test]
    fn previous_wraps_from_first_line_to_last_match() {
        let mut nav = sample();
        nav.set_term("foo").unwrap();
        nav.click_line(3);
        assert_eq!(nav.previous().map(|m| m.line), Some(10));
        assert_eq!(nav.state().active_index, Some(3));
    }

    #[test]
    fn next_skips_remaining_matches_on_reference_line() {
        let mut nav = sample();
        nav.set_term("foo").unwrap();
        // active match is on line 3, so next jumps to line 7
        assert_eq!(nav.next().map(|m| m.line), Some(7));
        assert_eq!(nav.next().map(|m| m.line), Some(10));
        assert_eq!(nav.next().map(|m| m.line), Some(3));
        assert_eq!(nav.state().active_index, Some(0));
    }

    #[test]
    fn previous_picks_last_match_on_the_line() {
        let mut nav = sample();
        nav.set_term("foo").unwrap();
        nav.click_line(5);
        assert_eq!(nav.previous(), Some(nav.matches()[1]));
        assert_eq!(nav.counter(), "2/4");
    }

    #[test]
    fn click_reference_is_consumed_after_one_step() {
        let mut nav = sample();
        nav.set_term("foo").unwrap();
        nav.click_line(8);
        assert_eq!(nav.next().map(|m| m.line), Some(10));
        assert_eq!(nav.state().last_clicked_line, None);
        // steps from the active match now, not from the old click
        assert_eq!(nav.previous().map(|m| m.line), Some(7));
        assert_eq!(nav.previous().map(|m| (m.line, m.start)), Some((3, 8)));
    }

    #[test]
    fn no_reference_jumps_to_ends() {
        let mut nav = sample();
        nav.set_term("foo").unwrap();
        nav.state.active_index = None;
        assert_eq!(nav.next().map(|m| m.line), Some(3));
        nav.state.active_index = None;
        assert_eq!(nav.previous().map(|m| m.line), Some(10));
    }

    #[test]
    fn same_term_is_a_no_op() {
        let mut nav = sample();
        nav.set_term("foo").unwrap();
        nav.next();
        assert_eq!(nav.set_term("foo").unwrap(), 4);
        assert_eq!(nav.state().active_index, Some(2));
    }

    #[test]
    fn no_matches_reports_zero_counter() {
        let mut nav = sample();
        assert_eq!(nav.set_term("absent").unwrap(), 0);
        assert_eq!(nav.counter(), "0/0");
        assert_eq!(nav.next(), None);
        assert_eq!(nav.previous(), None);
        assert_eq!(nav.state().active_index, None);
    }

    #[test]
    fn clear_works_without_a_prior_search() {
        let mut nav = sample();
        nav.clear();
        assert_eq!(nav.state(), &SearchState::default());

        nav.set_term("foo").unwrap();
        nav.clear();
        assert!(nav.matches().is_empty());
        assert_eq!(nav.counter(), "");
        assert_eq!(nav.state().active_index, None);
        // a cleared term can be applied again
        assert_eq!(nav.set_term("foo").unwrap(), 4);
    }

    #[test]
    fn empty_term_clears_matches() {
        let mut nav = sample();
        nav.set_term("foo").unwrap();
        assert_eq!(nav.set_term("").unwrap(), 0);
        assert!(nav.matches().is_empty());
        assert_eq!(nav.counter(), "");
    }
}
