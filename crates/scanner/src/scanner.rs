use crate::error::{Result, ScanError};
use lens_page::{Document, ElementId};
use lens_protocol::{SourceLocation, DEFAULT_FILE_ATTRIBUTE, DEFAULT_LINE_ATTRIBUTE};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Normalized source path → sorted unique 1-based lines.
pub type ScanMap = BTreeMap<String, BTreeSet<u32>>;

static START_TAG: Lazy<std::result::Result<Regex, regex::Error>> = Lazy::new(|| {
    Regex::new(r#"<[A-Za-z][A-Za-z0-9-]*(?:\s+(?:[^\s"'>=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+))?))*\s*/?>"#)
});

/// Counters for one scan, logged at debug level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub elements: usize,
    pub raw_tags: usize,
    pub files: usize,
    pub locations: usize,
    /// Locations only the raw-text pass found.
    pub raw_only: usize,
}

/// Finds annotated elements and produces a flat path → lines map.
#[derive(Debug, Clone)]
pub struct SourceScanner {
    file_attr: String,
    line_attr: String,
    start_tag: Regex,
    file_value: Regex,
    line_value: Regex,
}

impl SourceScanner {
    pub fn new(file_attr: &str, line_attr: &str) -> Result<Self> {
        let start_tag = START_TAG.as_ref().map_err(Clone::clone)?.clone();
        Ok(Self {
            start_tag,
            file_value: attribute_pattern(file_attr)?,
            line_value: attribute_pattern(line_attr)?,
            file_attr: file_attr.to_string(),
            line_attr: line_attr.to_string(),
        })
    }

    /// Scanner for `data-source-file` / `data-source-line`.
    pub fn with_default_attributes() -> Result<Self> {
        Self::new(DEFAULT_FILE_ATTRIBUTE, DEFAULT_LINE_ATTRIBUTE)
    }

    pub fn file_attribute(&self) -> &str {
        &self.file_attr
    }

    pub fn line_attribute(&self) -> &str {
        &self.line_attr
    }

    /// Scan the document with both passes and merge the results.
    pub fn scan(&self, doc: &dyn Document) -> ScanMap {
        self.scan_with_report(doc).0
    }

    pub fn scan_with_report(&self, doc: &dyn Document) -> (ScanMap, ScanReport) {
        let mut report = ScanReport::default();
        let mut map = ScanMap::new();

        for id in doc.annotated_elements(&self.file_attr, &self.line_attr) {
            report.elements += 1;
            if let Some(location) = self.element_location(doc, id) {
                insert(&mut map, location);
            }
        }

        let markup = doc.serialized_markup();
        for location in self.raw_locations(&markup, &mut report) {
            if !contains(&map, &location) {
                report.raw_only += 1;
                insert(&mut map, location);
            }
        }

        report.files = map.len();
        report.locations = map.values().map(BTreeSet::len).sum();
        log::debug!(
            "Scan found {} annotated elements, {} raw tags, {} files, {} locations ({} raw-only)",
            report.elements,
            report.raw_tags,
            report.files,
            report.locations,
            report.raw_only
        );
        (map, report)
    }

    /// Location of a single element, if it carries a valid annotation.
    pub fn element_location(&self, doc: &dyn Document, id: ElementId) -> Option<SourceLocation> {
        let file = doc.attribute(id, &self.file_attr)?;
        let line = doc.attribute(id, &self.line_attr)?;
        let location = SourceLocation::from_attributes(file, line);
        if location.is_none() {
            log::debug!("Ignoring element {id} with invalid annotation {file:?}:{line:?}");
        }
        location
    }

    fn raw_locations(&self, markup: &str, report: &mut ScanReport) -> Vec<SourceLocation> {
        let mut out = Vec::new();
        for tag in self.start_tag.find_iter(markup) {
            let tag = tag.as_str();
            let Some(file) = capture_value(&self.file_value, tag) else {
                continue;
            };
            let Some(line) = capture_value(&self.line_value, tag) else {
                continue;
            };
            report.raw_tags += 1;
            if let Some(location) =
                SourceLocation::from_attributes(&decode_entities(&file), &decode_entities(&line))
            {
                out.push(location);
            }
        }
        out
    }
}

fn attribute_pattern(name: &str) -> Result<Regex> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'));
    if !valid {
        return Err(ScanError::InvalidAttribute(name.to_string()));
    }
    let pattern = format!(
        r#"\s{}\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#,
        regex::escape(name)
    );
    Ok(Regex::new(&pattern)?)
}

fn capture_value(pattern: &Regex, tag: &str) -> Option<String> {
    let caps = pattern.captures(tag)?;
    (1..=3)
        .find_map(|i| caps.get(i))
        .map(|m| m.as_str().to_string())
}

fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn insert(map: &mut ScanMap, location: SourceLocation) {
    map.entry(location.file_path)
        .or_default()
        .insert(location.line_number);
}

fn contains(map: &ScanMap, location: &SourceLocation) -> bool {
    map.get(&location.file_path)
        .is_some_and(|lines| lines.contains(&location.line_number))
}
