/// Pristine text of the displayed source, split into lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayedText {
    lines: Vec<String>,
}

impl DisplayedText {
    pub fn new(text: &str) -> Self {
        let mut lines: Vec<String> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        // a trailing newline does not start another line
        if lines.len() > 1 && lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        if text.is_empty() {
            lines.clear();
        }
        Self { lines }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// 1-based line lookup.
    pub fn line(&self, number: u32) -> Option<&str> {
        let idx = usize::try_from(number).ok()?.checked_sub(1)?;
        self.lines.get(idx).map(String::as_str)
    }

    /// Lines paired with their 1-based numbers.
    pub fn numbered_lines(&self) -> impl Iterator<Item = (u32, &str)> {
        self.lines
            .iter()
            .enumerate()
            .map(|(idx, line)| (u32::try_from(idx + 1).unwrap_or(u32::MAX), line.as_str()))
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_lines_and_drops_carriage_returns() {
        let text = DisplayedText::new("a\r\nb\n\nc\n");
        assert_eq!(text.line_count(), 4);
        assert_eq!(text.line(1), Some("a"));
        assert_eq!(text.line(3), Some(""));
        assert_eq!(text.line(4), Some("c"));
        assert_eq!(text.line(0), None);
        assert_eq!(text.line(5), None);
    }

    #[test]
    fn empty_text_has_no_lines() {
        assert!(DisplayedText::new("").is_empty());
        assert_eq!(DisplayedText::new("\n").line_count(), 1);
    }
}
