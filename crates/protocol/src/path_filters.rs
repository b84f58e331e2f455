/// Canonical key of an annotated source path. Both separators are accepted
/// and empty segments dropped, so `"/a/b"`, `"a//b"` and `"a\\b"` share a key.
/// The scan map, the file tree and highlight matching all use this form.
pub fn normalize_source_path(raw: &str) -> String {
    source_segments(raw).collect::<Vec<_>>().join("/")
}

/// Non-empty segments of a source path, in order.
pub fn source_segments(raw: &str) -> impl Iterator<Item = &str> {
    raw.trim().split(['/', '\\']).filter(|s| !s.is_empty())
}

/// Whether any include/exclude prefix or pattern would actually filter.
pub fn filters_active(
    include_paths: &[String],
    exclude_paths: &[String],
    file_pattern: Option<&str>,
) -> bool {
    include_paths
        .iter()
        .chain(exclude_paths)
        .any(|p| !normalize_filter_path(p).is_empty())
        || file_pattern.map(str::trim).is_some_and(|p| !p.is_empty())
}

/// Whether a normalized source path survives include/exclude prefixes and an
/// optional substring or glob pattern.
pub fn path_allowed(
    source_path: &str,
    include_paths: &[String],
    exclude_paths: &[String],
    file_pattern: Option<&str>,
) -> bool {
    let source_path = normalize_source_path(source_path);

    if !include_paths.is_empty() {
        let mut has_valid_include = false;
        let mut matched = false;
        for include in include_paths {
            let normalized = normalize_filter_path(include);
            if normalized.is_empty() {
                continue;
            }
            has_valid_include = true;
            if path_prefix_matches_normalized(&normalized, &source_path) {
                matched = true;
                break;
            }
        }
        if has_valid_include && !matched {
            return false;
        }
    }

    for exclude in exclude_paths {
        let normalized = normalize_filter_path(exclude);
        if normalized.is_empty() {
            continue;
        }
        if path_prefix_matches_normalized(&normalized, &source_path) {
            return false;
        }
    }

    matches_file_pattern(
        &source_path,
        file_pattern.map(str::trim).filter(|p| !p.is_empty()),
    )
}

fn normalize_filter_path(raw: &str) -> String {
    let mut value = raw.trim().replace('\\', "/");
    while let Some(rest) = value.strip_prefix("./") {
        value = rest.to_string();
    }
    let value = value.trim_matches('/');
    if value == "." {
        return String::new();
    }
    value.to_string()
}

fn path_prefix_matches_normalized(prefix: &str, path: &str) -> bool {
    if path == prefix {
        return true;
    }

    if !path.starts_with(prefix) {
        return false;
    }

    path.as_bytes().get(prefix.len()) == Some(&b'/')
}

fn matches_file_pattern(path: &str, pattern: Option<&str>) -> bool {
    let Some(pattern) = pattern else {
        return true;
    };

    if !pattern.contains('*') && !pattern.contains('?') {
        return path.contains(pattern);
    }

    glob::Pattern::new(pattern)
        .map(|p| p.matches(path))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_and_empty_segments_collapse() {
        assert_eq!(normalize_source_path("/a/b.tsx"), "a/b.tsx");
        assert_eq!(normalize_source_path("a/b.tsx"), "a/b.tsx");
        assert_eq!(normalize_source_path("\\a\\b.tsx"), "a/b.tsx");
        assert_eq!(normalize_source_path("//a"), "a");
        assert_eq!(normalize_source_path("src//App.tsx"), "src/App.tsx");
        assert_eq!(normalize_source_path(" src/ui/ "), "src/ui");
    }

    #[test]
    fn include_is_prefix_match_on_components() {
        let include = vec!["src".to_string()];
        assert!(path_allowed("src/app.tsx", &include, &[], None));
        assert!(path_allowed("/src/app.tsx", &include, &[], None));
        assert!(!path_allowed("src2/app.tsx", &include, &[], None));
    }

    #[test]
    fn exclude_wins_and_patterns_apply() {
        let include = vec!["src".to_string()];
        let exclude = vec!["src/gen".to_string()];
        assert!(!path_allowed("src/gen/api.ts", &include, &exclude, None));
        assert!(path_allowed("src/ui/Button.tsx", &[], &[], Some("src/*/*.tsx")));
        assert!(!path_allowed("src/ui/Button.css", &[], &[], Some("*.tsx")));
        assert!(path_allowed("src/ui/Button.tsx", &[], &[], Some("Button")));
    }

    #[test]
    fn empty_prefixes_do_not_activate_filters() {
        let include = vec!["".to_string(), "./".to_string(), "/".to_string()];
        assert!(!filters_active(&include, &[], None));
        assert!(filters_active(&[], &[], Some("*.rs")));
    }
}
