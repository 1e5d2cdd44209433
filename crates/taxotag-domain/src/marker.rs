//! Marker module - the leading character every tag carries

/// The marker character required at the start of every valid tag
pub const MARKER: char = '#';

/// Check whether a tag already starts with the marker
pub fn has_marker(tag: &str) -> bool {
    tag.starts_with(MARKER)
}

/// Trim a tag and prefix it with the marker if it is missing
///
/// Applying this to an already-prefixed tag returns it unchanged (modulo
/// surrounding whitespace), so repeated normalization is a no-op.
///
/// # Examples
///
/// ```
/// use taxotag_domain::marker::ensure_marker;
///
/// assert_eq!(ensure_marker("rust"), "#rust");
/// assert_eq!(ensure_marker("#rust"), "#rust");
/// assert_eq!(ensure_marker(&ensure_marker("rust")), "#rust");
/// ```
pub fn ensure_marker(tag: &str) -> String {
    let trimmed = tag.trim();
    if has_marker(trimmed) {
        trimmed.to_string()
    } else {
        format!("{MARKER}{trimmed}")
    }
}

/// Case-insensitive tag equality
///
/// Uses full Unicode lowercasing so non-ASCII vocabularies compare correctly.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}
