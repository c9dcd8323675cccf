// Path strings and node-name validation.

use super::TreeError;

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Split `path` into its non-empty segments.
///
/// Leading, trailing and repeated separators are ignored, so `""`, `"/"`
/// and `"//"` all denote the start branch itself.
pub fn segments(path: &str) -> impl DoubleEndedIterator<Item = &str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty())
}

/// Check that `name` can be used as a node name.
pub fn validate_name(name: &str) -> Result<(), TreeError> {
    if name.is_empty() || name.contains(SEPARATOR) {
        return Err(TreeError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Split a path into its parent path and final segment.
///
/// `"a/b/c.bin"` becomes `("a/b", "c.bin")`. Returns `None` when the path
/// has no segments at all.
pub fn split_last(path: &str) -> Option<(String, &str)> {
    let mut parts: Vec<&str> = segments(path).collect();
    let last = parts.pop()?;
    Some((parts.join("/"), last))
}
