use std::sync::LazyLock;

use regex::Regex;

use crate::Placeholders;

static FROM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)From:\s*(?:"([^"]*)"|([^<]*))\s*<(.+?)>"#).expect("valid From regex")
});

/// Rewrites a `From:` header line to a `noreply` sender, keeping a brand
/// name inferred from the display name.
///
/// Lines without an angle-bracketed address fall back to an anonymous
/// `From: <noreply@...>`.
pub fn rewrite_from(line: &str, placeholders: &Placeholders) -> String {
    let address = placeholders.noreply_address();
    let captures = match FROM_REGEX.captures(line) {
        Some(captures) => captures,
        None => return format!("From: <{address}>"),
    };
    let name_part = captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|name| name.as_str().trim())
        .unwrap_or_default();
    format!("From: \"{}\" <{address}>", derive_display_name(name_part))
}

/// Infers a brand name from an email-shaped or dot-shaped display name.
///
/// ```rust
/// use mailscrub_utils::derive_display_name;
///
/// assert_eq!(derive_display_name("hello@news.example.com"), "Example");
/// assert_eq!(derive_display_name("shop.brand.io"), "Brand");
/// assert_eq!(derive_display_name("acme"), "Acme");
/// ```
pub fn derive_display_name(name_part: &str) -> String {
    let clean_name = if name_part.contains('@') {
        let domain = name_part.split('@').nth(1).unwrap_or_default();
        if domain.contains('.') {
            second_to_last_label(domain)
        } else {
            domain
        }
    } else if name_part.contains('.') {
        second_to_last_label(name_part)
    } else {
        name_part
    };
    capitalize(clean_name)
}

/// Only called on values holding at least one `.`, so two labels exist.
fn second_to_last_label(value: &str) -> &str {
    value.rsplit('.').nth(1).unwrap_or_default()
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
