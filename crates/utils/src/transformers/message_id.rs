use crate::Placeholders;

const FIELD_NAME: &str = "Message-ID:";

/// Rewrites a `Message-ID:` header line (any case) by inserting the
/// configured marker in the middle of the local part.
///
/// The marker is only inserted once, values that already carry it keep
/// their local part untouched. Values without `@` get the configured
/// random-domain placeholder as domain. The output always uses the
/// canonical `Message-ID:` spelling and angle brackets.
pub fn rewrite_message_id(line: &str, placeholders: &Placeholders) -> String {
    let value = extract_id(line);
    let (local_part, domain) = value
        .split_once('@')
        .unwrap_or((value, placeholders.random_domain.as_str()));

    let local_part = if local_part.contains(&placeholders.marker) {
        local_part.to_string()
    } else {
        insert_at_midpoint(local_part, &placeholders.marker)
    };
    format!("{FIELD_NAME} <{local_part}@{domain}>")
}

/// Extracts the identifier between `<` and `>`, or the trimmed remainder
/// of the line when the value is not bracketed.
fn extract_id(line: &str) -> &str {
    let rest = line.get(FIELD_NAME.len()..).unwrap_or_default();
    let rest = match rest.find('<') {
        Some(start) => &rest[start + 1..],
        None => rest,
    };
    rest.split('>').next().unwrap_or_default().trim()
}

fn insert_at_midpoint(value: &str, marker: &str) -> String {
    let midpoint = value.chars().count() / 2;
    let index = value
        .char_indices()
        .nth(midpoint)
        .map(|(index, _)| index)
        .unwrap_or(value.len());
    let mut result = String::with_capacity(value.len() + marker.len());
    result.push_str(&value[..index]);
    result.push_str(marker);
    result.push_str(&value[index..]);
    result
}
