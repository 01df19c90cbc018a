//! Line-oriented views over raw and scrubbed email sources.
//!
//! [`RawMessage`] is the immutable input the scrubber walks, one
//! source line at a time. [`assemble`] joins the scrubbed lines back
//! into a single text blob and [`ScrubReport`] carries that text together
//! with line statistics.

use std::fmt::Display;

/// Raw email source split on `\n`.
///
/// Lines are stored as they appear in the source. [`RawMessage::lines`]
/// yields them right-trimmed (dropping the `\r` of CRLF sources) so that
/// classification never depends on trailing whitespace, while
/// [`RawMessage::raw_lines`] keeps the leading whitespace that marks a
/// folded continuation, even on lines holding nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    lines: Vec<String>,
}

impl RawMessage {
    pub fn parse(raw: &str) -> Self {
        Self {
            lines: raw.split('\n').map(String::from).collect(),
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.trim_end())
    }

    pub fn raw_lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of lines holding anything other than whitespace.
    pub fn content_lines(&self) -> usize {
        count_content_lines(self.lines.iter().map(String::as_str))
    }
}

/// Joins scrubbed lines with `\n`, without adding a trailing newline.
///
/// ```rust
/// let lines = vec!["Subject: hi".to_string(), String::new(), "Body".to_string()];
/// assert_eq!(mailscrub_utils::assemble(&lines), "Subject: hi\n\nBody");
/// ```
pub fn assemble(lines: &[String]) -> String {
    lines.join("\n")
}

fn count_content_lines<'a>(lines: impl Iterator<Item = &'a str>) -> usize {
    lines.filter(|line| !line.trim().is_empty()).count()
}

/// Result of scrubbing a single message, with before/after line counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrubReport {
    /// The scrubbed message text.
    pub output: String,

    /// Non-blank lines in the input.
    pub input_lines: usize,

    /// Non-blank lines in the output.
    pub output_lines: usize,
}

impl ScrubReport {
    pub fn new(input: &RawMessage, output: String) -> Self {
        let output_lines = count_content_lines(output.split('\n'));
        Self {
            input_lines: input.content_lines(),
            output_lines,
            output,
        }
    }

    /// Percentage of non-blank lines removed, `0.0` for an empty input.
    ///
    /// Negative when the scrubber added more lines than it removed, which
    /// happens for tiny inputs that receive the unsubscribe pair.
    pub fn reduction(&self) -> f64 {
        if self.input_lines == 0 {
            return 0.0;
        }
        (self.input_lines as f64 - self.output_lines as f64) / self.input_lines as f64 * 100.0
    }
}

impl Display for ScrubReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {} lines ({:.1}% reduction)",
            self.input_lines,
            self.output_lines,
            self.reduction()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_message_trims_trailing_whitespace() {
        let message = RawMessage::parse("Subject: hi  \r\n\tfolded \r\n\r\nBody\t");
        assert_eq!(
            message.lines().collect::<Vec<_>>(),
            vec!["Subject: hi", "\tfolded", "", "Body"]
        );
    }

    #[test]
    fn test_raw_message_keeps_folding_whitespace() {
        let message = RawMessage::parse("Received: from a\n\t\r\n\nbody");
        assert_eq!(message.raw_lines()[1], "\t\r");
        assert_eq!(message.lines().nth(1), Some(""));
    }

    #[test]
    fn test_raw_message_empty_input() {
        let message = RawMessage::parse("");
        assert_eq!(message.len(), 1);
        assert_eq!(message.content_lines(), 0);
    }

    #[test]
    fn test_raw_message_keeps_trailing_empty_line() {
        let message = RawMessage::parse("A: b\n");
        assert_eq!(message.lines().collect::<Vec<_>>(), vec!["A: b", ""]);
    }

    #[test]
    fn test_assemble_empty() {
        assert_eq!(assemble(&[]), "");
    }

    #[test]
    fn test_scrub_report_reduction() {
        let input = RawMessage::parse("A: 1\nB: 2\nC: 3\nD: 4\n\nbody");
        let report = ScrubReport::new(&input, "A: 1\n\nbody".to_string());
        assert_eq!(report.input_lines, 5);
        assert_eq!(report.output_lines, 2);
        assert!((report.reduction() - 60.0).abs() < 1e-9);
        assert_eq!(report.to_string(), "5 -> 2 lines (60.0% reduction)");
    }

    #[test]
    fn test_scrub_report_empty_input() {
        let report = ScrubReport::new(&RawMessage::parse("   "), String::new());
        assert_eq!(report.reduction(), 0.0);
    }
}
