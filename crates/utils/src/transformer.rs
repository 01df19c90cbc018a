//! Post-pass transformations over scrubbed header lines.
//!
//! Transformers run once the scrubber has walked every input line and
//! before the lines are assembled, allowing headers to be injected or
//! reordered in the header section. Concrete implementations live in the
//! [`transformers`](crate::transformers) module.

use tracing::debug;

/// Facts gathered by the scan that post-pass transformers rely on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Number of leading output lines forming the header section, the
    /// body separator (blank or boundary line) is the first line after it.
    pub header_len: usize,

    /// Whether a `List-Unsubscribe` header was emitted.
    pub seen_list_unsubscribe: bool,
}

/// Trait for transformers that modify the scrubbed lines in place.
///
/// Implementations must keep [`ScanSummary::header_len`] in sync with the
/// lines they insert or remove in the header section.
pub trait LineTransformer: Send + Sync {
    /// Transforms the output lines in place.
    fn transform(&self, lines: &mut Vec<String>, summary: &mut ScanSummary);

    /// Returns the name of this transformer.
    fn name(&self) -> &str;
}

/// Applies a list of transformers to the output lines in order.
pub fn apply_transformers(
    transformers: &[Box<dyn LineTransformer>],
    lines: &mut Vec<String>,
    summary: &mut ScanSummary,
) {
    for transformer in transformers {
        debug!(transformer = transformer.name(), "Applying transformer");
        transformer.transform(lines, summary);
    }
}
