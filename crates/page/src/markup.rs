use crate::document::{ElementId, PageDocument};

/// Escape an attribute value for double-quoted serialization.
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn serialize(doc: &PageDocument) -> String {
    let mut out = String::new();
    write_element(doc, ElementId::root_handle(), &mut out);
    for fragment in &doc.inert_markup {
        out.push_str("<template>");
        out.push_str(fragment);
        out.push_str("</template>");
    }
    out
}

fn write_element(doc: &PageDocument, id: ElementId, out: &mut String) {
    let node = &doc.nodes[id.index()];
    out.push('<');
    out.push_str(&node.tag);
    for (name, value) in &node.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attribute(value));
        out.push('"');
    }
    if !node.classes.is_empty() {
        let joined: Vec<&str> = node.classes.iter().map(String::as_str).collect();
        out.push_str(" class=\"");
        out.push_str(&escape_attribute(&joined.join(" ")));
        out.push('"');
    }
    out.push('>');
    if let Some(text) = &node.text {
        out.push_str(&escape_text(text));
    }
    for child in &node.children {
        write_element(doc, *child, out);
    }
    out.push_str("</");
    out.push_str(&node.tag);
    out.push('>');
}
