use std::sync::LazyLock;

use regex::Regex;

static BOUNDARY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)boundary=["']?([^"'\s]+)["']?"#).expect("valid boundary regex")
});

/// Finds the first MIME `boundary=` token declared anywhere in `raw`.
///
/// The whole input is searched (not only the header section) so that a
/// boundary declared on a folded `Content-Type` continuation line is still
/// found. Quotes around the token are optional.
///
/// # Examples
///
/// ```rust
/// assert_eq!(
///     mailscrub_utils::find_boundary(
///         "Content-Type: multipart/mixed;\n\tboundary=\"XYZ\"\n\n--XYZ"
///     ),
///     Some("XYZ".to_string())
/// );
/// ```
///
/// Matching is case-insensitive on the parameter name:
///
/// ```rust
/// assert_eq!(
///     mailscrub_utils::find_boundary("Content-Type: multipart/alternative; BOUNDARY=abc_123"),
///     Some("abc_123".to_string())
/// );
/// ```
///
/// ```rust
/// assert_eq!(mailscrub_utils::find_boundary("Subject: Hello\n\nBody"), None);
/// ```
pub fn find_boundary(raw: &str) -> Option<String> {
    BOUNDARY_REGEX
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str().to_string())
}

/// Whether `line` opens a MIME part delimited by `boundary`.
///
/// ```rust
/// assert!(mailscrub_utils::is_boundary_line("--XYZ", "XYZ"));
/// assert!(mailscrub_utils::is_boundary_line("--XYZ--", "XYZ"));
/// assert!(!mailscrub_utils::is_boundary_line("XYZ", "XYZ"));
/// ```
pub fn is_boundary_line(line: &str, boundary: &str) -> bool {
    line.starts_with("--") && line.contains(boundary)
}

/// Whether `line` continues a folded header (RFC 5322 section 2.2.3).
///
/// ```rust
/// assert!(mailscrub_utils::is_continuation("\tby mx.example.com"));
/// assert!(mailscrub_utils::is_continuation(" id 42"));
/// assert!(!mailscrub_utils::is_continuation("Subject: hi"));
/// assert!(!mailscrub_utils::is_continuation(""));
/// ```
pub fn is_continuation(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t')
}
