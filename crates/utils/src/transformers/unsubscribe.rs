use tracing::debug;

use crate::{LineTransformer, Placeholders, ScanSummary};

/// Canonical `List-Unsubscribe-Post` line paired with every unsubscribe header.
pub const LIST_UNSUBSCRIBE_POST: &str = "List-Unsubscribe-Post: List-Unsubscribe=One-Click";

const LIST_UNSUBSCRIBE_PREFIX: &str = "List-Unsubscribe:";

/// Transformer guaranteeing a single `List-Unsubscribe` header directly
/// followed by the canonical [`LIST_UNSUBSCRIBE_POST`] line.
///
/// When the scan already emitted a `List-Unsubscribe` header only the
/// `Post` line is added after it. Otherwise the pair is inserted after the
/// `Sender:` header, the `From:` header, or at the end of the header
/// section, whichever is found first. Only the header section is searched,
/// body lines are never touched.
pub struct UnsubscribeTransformer {
    header: String,
}

impl UnsubscribeTransformer {
    /// Creates a new [`UnsubscribeTransformer`] using the placeholder
    /// unsubscribe targets.
    pub fn new(placeholders: &Placeholders) -> Self {
        Self {
            header: format!(
                "{LIST_UNSUBSCRIBE_PREFIX} {}",
                placeholders.unsubscribe_value()
            ),
        }
    }

    /// Returns the full `List-Unsubscribe` line this transformer inserts.
    pub fn header(&self) -> &str {
        &self.header
    }
}

impl LineTransformer for UnsubscribeTransformer {
    fn transform(&self, lines: &mut Vec<String>, summary: &mut ScanSummary) {
        let header_len = summary.header_len.min(lines.len());
        let headers = &lines[..header_len];

        let existing = if summary.seen_list_unsubscribe {
            headers
                .iter()
                .position(|line| line.starts_with(LIST_UNSUBSCRIBE_PREFIX))
        } else {
            None
        };

        match existing {
            Some(index) => {
                debug!(index, "Pairing existing List-Unsubscribe header");
                lines.insert(index + 1, LIST_UNSUBSCRIBE_POST.to_string());
                summary.header_len = header_len + 1;
            }
            None => {
                let index = find_after(headers, "Sender:")
                    .or_else(|| find_after(headers, "From:"))
                    .unwrap_or(header_len);
                debug!(index, "Injecting List-Unsubscribe header");
                lines.splice(
                    index..index,
                    [self.header.clone(), LIST_UNSUBSCRIBE_POST.to_string()],
                );
                summary.header_len = header_len + 2;
                summary.seen_list_unsubscribe = true;
            }
        }
    }

    fn name(&self) -> &str {
        "unsubscribe"
    }
}

fn find_after(headers: &[String], prefix: &str) -> Option<usize> {
    headers
        .iter()
        .position(|line| line.starts_with(prefix))
        .map(|index| index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn run(mut output: Vec<String>, header_len: usize, seen: bool) -> Vec<String> {
        let transformer = UnsubscribeTransformer::new(&Placeholders::default());
        let mut summary = ScanSummary {
            header_len,
            seen_list_unsubscribe: seen,
        };
        transformer.transform(&mut output, &mut summary);
        assert!(summary.seen_list_unsubscribe);
        output
    }

    #[test]
    fn test_header_value() {
        let transformer = UnsubscribeTransformer::new(&Placeholders::default());
        assert_eq!(
            transformer.header(),
            "List-Unsubscribe: <mailto:unsubscribe@[REDACTED_DOMAIN]>, <http://[REDACTED_DOMAIN]/[OPTDOWN]>"
        );
        assert_eq!(transformer.name(), "unsubscribe");
    }

    #[test]
    fn test_inserts_after_from() {
        let output = run(lines(&["From: a", "Subject: hi", "", "body"]), 2, false);
        assert_eq!(output[0], "From: a");
        assert!(output[1].starts_with("List-Unsubscribe: <mailto:"));
        assert_eq!(output[2], LIST_UNSUBSCRIBE_POST);
        assert_eq!(output[3], "Subject: hi");
        assert_eq!(output.len(), 6);
    }

    #[test]
    fn test_inserts_after_sender_first() {
        let output = run(lines(&["From: a", "Sender: b", "Subject: hi"]), 3, false);
        assert_eq!(output[1], "Sender: b");
        assert!(output[2].starts_with("List-Unsubscribe:"));
        assert_eq!(output[3], LIST_UNSUBSCRIBE_POST);
    }

    #[test]
    fn test_inserts_at_end_of_headers() {
        let output = run(lines(&["Subject: hi", "", "From: in body"]), 1, false);
        assert_eq!(output[0], "Subject: hi");
        assert!(output[1].starts_with("List-Unsubscribe:"));
        assert_eq!(output[2], LIST_UNSUBSCRIBE_POST);
        assert_eq!(output[3], "");
        assert_eq!(output[4], "From: in body");
    }

    #[test]
    fn test_inserts_into_empty_output() {
        let output = run(Vec::new(), 0, false);
        assert_eq!(output.len(), 2);
        assert_eq!(output[1], LIST_UNSUBSCRIBE_POST);
    }

    #[test]
    fn test_pairs_existing_header() {
        let existing = UnsubscribeTransformer::new(&Placeholders::default())
            .header()
            .to_string();
        let output = run(
            lines(&["From: a", existing.as_str(), "Subject: hi", "", "body"]),
            3,
            true,
        );
        assert_eq!(output[1], existing);
        assert_eq!(output[2], LIST_UNSUBSCRIBE_POST);
        assert_eq!(output[3], "Subject: hi");
        assert_eq!(output.len(), 6);
    }
}
