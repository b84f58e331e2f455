use crate::navigator::SearchState;
use crate::text::DisplayedText;
use std::fmt::Write;

pub const LINE_NUMBER_CLASS: &str = "lens-line-number";
pub const FOCUS_LINE_CLASS: &str = "lens-line-focus";
pub const MATCH_CLASS: &str = "lens-search-match";
pub const ACTIVE_MATCH_CLASS: &str = "lens-search-active";

fn escape(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

/// Gutter numbers are written outside the searched text so match markers
/// never touch them.
pub(crate) fn render_lines(
    text: &DisplayedText,
    state: &SearchState,
    focus_line: Option<u32>,
) -> String {
    let active = state.active();
    let mut out = String::new();
    let mut matches = state.matches.iter().peekable();

    for (number, content) in text.numbered_lines() {
        if focus_line == Some(number) {
            let _ = write!(out, "<div class=\"lens-line {FOCUS_LINE_CLASS}\">");
        } else {
            out.push_str("<div class=\"lens-line\">");
        }
        let _ = write!(out, "<span class=\"{LINE_NUMBER_CLASS}\">{number}</span>");
        out.push_str("<span class=\"lens-code\">");

        let mut cursor = 0;
        while let Some(found) = matches.next_if(|m| m.line == number) {
            escape(&content[cursor..found.start], &mut out);
            if active == Some(*found) {
                let _ = write!(out, "<mark class=\"{MATCH_CLASS} {ACTIVE_MATCH_CLASS}\">");
            } else {
                let _ = write!(out, "<mark class=\"{MATCH_CLASS}\">");
            }
            escape(&content[found.start..found.end], &mut out);
            out.push_str("</mark>");
            cursor = found.end;
        }
        escape(&content[cursor..], &mut out);
        out.push_str("</span></div>\n");
    }
    out
}
