//! Value transforms and integer coercion.
//!
//! All functions are pure and return `None` when the input cannot be
//! cleaned, leaving the decision (reject and log) to the caller.

use vax_model::ValueTransform;

/// Applies one declared transform to a cell value.
///
/// Returns `None` if the transform cannot be applied (a suffix wider than
/// the value).
pub fn apply_transform(value: &str, transform: &ValueTransform) -> Option<String> {
    match transform {
        ValueTransform::DropSuffix { width } => drop_suffix(value, *width).map(str::to_string),
        ValueTransform::StripChars { chars } => {
            Some(value.chars().filter(|ch| !chars.contains(*ch)).collect())
        }
        ValueTransform::Replace { from, to } => {
            if from.is_empty() {
                Some(value.to_string())
            } else {
                Some(value.replace(from.as_str(), to))
            }
        }
    }
}

/// Drops the trailing `width` characters of a composite identifier.
///
/// The value must be strictly longer than `width` so that something is
/// left of the identifier.
pub fn drop_suffix(value: &str, width: usize) -> Option<&str> {
    let count = value.chars().count();
    if count <= width {
        return None;
    }
    let keep = count - width;
    let end = value
        .char_indices()
        .nth(keep)
        .map_or(value.len(), |(idx, _)| idx);
    Some(&value[..end])
}

/// Parses a non-negative count after removing grouping separators.
pub fn parse_count(value: &str, separators: &[char]) -> Option<u64> {
    let cleaned = strip_separators(value, separators);
    if cleaned.is_empty() || !cleaned.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    cleaned.parse().ok()
}

/// Parses a survey year after removing grouping separators.
pub fn parse_year(value: &str, separators: &[char]) -> Option<i32> {
    strip_separators(value, separators).parse().ok()
}

fn strip_separators(value: &str, separators: &[char]) -> String {
    value
        .trim()
        .chars()
        .filter(|ch| !separators.contains(ch))
        .collect()
}
