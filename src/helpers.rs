//! Shared string helpers for job names and upstream URL segments.

/// Lowercase `s` and join its alphanumeric runs with `_`.
///
/// "Abu Dhabi Grand Prix" → "abu_dhabi_grand_prix", "Practice 1" → "practice_1".
pub(crate) fn slugify(s: &str) -> String {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Whether `s` can be placed into an upstream URL path as-is.
pub(crate) fn is_safe_path_segment(s: &str) -> bool {
    !s.is_empty() && s.len() <= 16 && s.chars().all(|c| c.is_ascii_alphanumeric())
}
