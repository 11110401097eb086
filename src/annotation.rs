//! Label and enum extraction from column comments.
//!
//! Comments follow the convention `label（0 meaning 1 meaning）`: the text before the
//! full-width opening bracket is the human label and every digit run inside the brackets
//! is one allowed value.

use once_cell::sync::Lazy;
use regex::Regex;

/// Full-width opening bracket.
pub const OPEN_BRACKET: char = '（';
/// Full-width closing bracket.
pub const CLOSE_BRACKET: char = '）';
/// Byte offset from the opening bracket to the annotation body (the bracket's UTF-8 width).
pub const BODY_OFFSET: usize = 3;

/// The space-joined enum set that marks a boolean column.
pub const BOOL_ENUMS: &str = "0 1";

#[allow(clippy::expect_used)]
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("Failed to compile digit regex"));

/// A parsed comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    /// Comment text before the bracket, trimmed.
    pub label: String,
    /// Digit runs of the bracket body joined by single spaces, or empty.
    pub enums: String,
}

impl Annotation {
    pub fn has_enums(&self) -> bool {
        !self.enums.is_empty()
    }

    /// Whether the enum set is exactly `0 1`.
    pub fn is_bool_enum(&self) -> bool {
        self.enums == BOOL_ENUMS
    }
}

/// Locate the bracket body, or `None` when the brackets are missing or unbalanced.
fn bracket_body(comment: &str) -> Option<(usize, &str)> {
    let start = comment.find(OPEN_BRACKET)?;
    let end = comment.rfind(CLOSE_BRACKET)?;
    let body_start = start + BODY_OFFSET;
    if end < body_start {
        return None;
    }
    comment.get(body_start..end).map(|body| (start, body))
}

/// Split a comment into its label and enum set.
///
/// ```rust
/// use grom::annotation::extract_annotation;
///
/// let a = extract_annotation("状态（0 正常 1 禁用）");
/// assert_eq!(a.label, "状态");
/// assert_eq!(a.enums, "0 1");
/// ```
pub fn extract_annotation(comment: &str) -> Annotation {
    match bracket_body(comment) {
        Some((start, body)) => Annotation {
            label: comment[..start].trim().to_string(),
            enums: DIGITS
                .find_iter(body)
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        },
        None => {
            if comment.contains(OPEN_BRACKET) || comment.contains(CLOSE_BRACKET) {
                tracing::debug!(comment, "unbalanced annotation brackets, treating as plain comment");
            }
            Annotation {
                label: comment.trim().to_string(),
                enums: String::new(),
            }
        }
    }
}

/// Label part of a comment (the whole comment when it has no annotation).
pub fn label_of(comment: &str) -> String {
    extract_annotation(comment).label
}

/// Enum set of a comment.
pub fn enums_of(comment: &str) -> String {
    extract_annotation(comment).enums
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_label_and_enums() {
        let a = extract_annotation("状态（0 正常 1 禁用）");
        assert_eq!(a.label, "状态");
        assert_eq!(a.enums, "0 1");
        assert!(a.is_bool_enum());

        let a = extract_annotation("  类型（1 个人 2 企业 10 机构） ");
        assert_eq!(a.label, "类型");
        assert_eq!(a.enums, "1 2 10");
        assert!(!a.is_bool_enum());
    }

    #[test]
    fn test_body_without_digits() {
        let a = extract_annotation("用户名称（必填）");
        assert_eq!(a.label, "用户名称");
        assert_eq!(a.enums, "");
        assert!(!a.has_enums());
    }

    #[test]
    fn test_no_brackets() {
        let a = extract_annotation("  用户id ");
        assert_eq!(a.label, "用户id");
        assert_eq!(a.enums, "");
        assert_eq!(extract_annotation(""), Annotation::default());
    }

    #[test]
    fn test_ascii_parentheses_are_not_annotations() {
        let a = extract_annotation("status (0 off 1 on)");
        assert_eq!(a.label, "status (0 off 1 on)");
        assert_eq!(a.enums, "");
    }

    #[test]
    fn test_unbalanced_brackets_degrade() {
        assert_eq!(label_of("状态（0 正常"), "状态（0 正常");
        assert_eq!(enums_of("状态（0 正常"), "");
        assert_eq!(enums_of("状态）0 1（"), "");
        assert_eq!(label_of("状态）0 1（"), "状态）0 1（");
        assert_eq!(extract_annotation("状态（）").enums, "");
        assert_eq!(extract_annotation("状态（）").label, "状态");
    }
}
