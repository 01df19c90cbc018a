//! Single-pass header scrubbing state machine.
//!
//! [`HeaderScrubber`] walks a raw message line by line, starting in
//! [`Mode::Header`] and switching once (and for good) to [`Mode::Body`] at
//! the first MIME boundary line or at the first blank line following some
//! output. Header lines are classified with [`HeaderKind`] and either
//! rewritten, copied or discarded; body lines are copied as they are. The
//! per-line transition lives in [`HeaderScrubber::step`], with all mutable
//! data held in an explicit [`ScanState`].

use std::fmt::Debug;

use tracing::{debug, info};

use crate::{
    apply_transformers, assemble, find_boundary, is_boundary_line, is_continuation,
    rewrite_from, rewrite_message_id, DerivedField, FieldPolicy, FixedField, HeaderKind,
    LineTransformer, Placeholders, RawMessage, RedactedField, ScanSummary, ScrubConfig,
    ScrubReport, UnsubscribeTransformer, VerbatimField,
};

/// Section of the message the scan is in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Header,
    Body,
}

/// Mutable state threaded through the scan of a single message.
#[derive(Debug, Clone, Default)]
pub struct ScanState {
    mode: Mode,
    boundary: Option<String>,
    /// Fold group being collected, continuation lines are appended while
    /// it is non-empty.
    pending: Vec<String>,
    seen_list_unsubscribe: bool,
    output: Vec<String>,
    /// Index of the body separator line, set on the switch to body mode.
    separator: Option<usize>,
}

impl ScanState {
    pub fn new(boundary: Option<String>) -> Self {
        Self {
            boundary,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn boundary(&self) -> Option<&str> {
        self.boundary.as_deref()
    }

    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    fn emit(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    fn flush(&mut self) {
        self.output.append(&mut self.pending);
    }

    /// Switches to body mode, the next emitted line is the separator.
    fn enter_body(&mut self) {
        self.flush();
        self.separator = Some(self.output.len());
        self.mode = Mode::Body;
    }

    /// Flushes any pending fold group and returns the output lines with
    /// the facts post-pass transformers need.
    pub fn finish(mut self) -> (Vec<String>, ScanSummary) {
        self.flush();
        let summary = ScanSummary {
            header_len: self.separator.unwrap_or(self.output.len()),
            seen_list_unsubscribe: self.seen_list_unsubscribe,
        };
        (self.output, summary)
    }
}

/// Rewrites the header block of raw email sources under a [`FieldPolicy`].
///
/// The scrubber is immutable once built and can be shared between threads
/// to scrub independent messages concurrently.
pub struct HeaderScrubber {
    policy: FieldPolicy,
    placeholders: Placeholders,
    transformers: Vec<Box<dyn LineTransformer>>,
}

impl Debug for HeaderScrubber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderScrubber")
            .field("policy", &self.policy)
            .field("placeholders", &self.placeholders)
            .field("transformers", &self.transformers.len())
            .finish()
    }
}

impl HeaderScrubber {
    /// Creates a new [`HeaderScrubber`] with the default post-pass
    /// transformers (the [`UnsubscribeTransformer`]).
    pub fn new(policy: FieldPolicy, placeholders: Placeholders) -> Self {
        let transformers: Vec<Box<dyn LineTransformer>> =
            vec![Box::new(UnsubscribeTransformer::new(&placeholders))];
        Self::with_transformers(policy, placeholders, transformers)
    }

    /// Creates a new [`HeaderScrubber`] with an explicit list of post-pass
    /// transformers, applied in order.
    pub fn with_transformers(
        policy: FieldPolicy,
        placeholders: Placeholders,
        transformers: Vec<Box<dyn LineTransformer>>,
    ) -> Self {
        info!(
            removed = policy.removed_fields().count(),
            transformers = transformers.len(),
            "Header scrubber initialized"
        );
        Self {
            policy,
            placeholders,
            transformers,
        }
    }

    /// Creates a new [`HeaderScrubber`] from the scrub configuration.
    pub fn from_config(config: &ScrubConfig) -> Self {
        Self::new(config.policy(), config.placeholders.clone())
    }

    pub fn policy(&self) -> &FieldPolicy {
        &self.policy
    }

    pub fn placeholders(&self) -> &Placeholders {
        &self.placeholders
    }

    /// Scrubs a raw message, returning the rewritten text.
    ///
    /// ```rust
    /// use mailscrub_utils::{HeaderScrubber, Placeholders, Preset};
    ///
    /// let scrubber = HeaderScrubber::new(Preset::Standard.policy(), Placeholders::default());
    /// let output = scrubber.scrub("From: a@b.com\nX-Mailer: foo\nSubject: hi\n\nBody");
    /// assert_eq!(
    ///     output,
    ///     "From: <noreply@[REDACTED_DOMAIN]>\n\
    ///      List-Unsubscribe: <mailto:unsubscribe@[REDACTED_DOMAIN]>, <http://[REDACTED_DOMAIN]/[OPTDOWN]>\n\
    ///      List-Unsubscribe-Post: List-Unsubscribe=One-Click\n\
    ///      Subject: hi\n\nBody"
    /// );
    /// ```
    pub fn scrub(&self, raw: &str) -> String {
        assemble(&self.scrub_lines(raw))
    }

    /// Scrubs a raw message, returning the rewritten text with line
    /// statistics.
    pub fn scrub_report(&self, raw: &str) -> ScrubReport {
        let message = RawMessage::parse(raw);
        let lines = self.scrub_message(&message, find_boundary(raw));
        ScrubReport::new(&message, assemble(&lines))
    }

    /// Scrubs a raw message, returning the ordered output lines.
    pub fn scrub_lines(&self, raw: &str) -> Vec<String> {
        self.scrub_message(&RawMessage::parse(raw), find_boundary(raw))
    }

    fn scrub_message(&self, message: &RawMessage, boundary: Option<String>) -> Vec<String> {
        let mut state = ScanState::new(boundary);
        for line in message.raw_lines() {
            self.step(&mut state, line);
        }
        let body_found = state.mode() == Mode::Body;
        let (mut lines, mut summary) = state.finish();
        apply_transformers(&self.transformers, &mut lines, &mut summary);
        debug!(
            input_lines = message.len(),
            output_lines = lines.len(),
            header_lines = summary.header_len,
            body_found,
            "Scrubbed message"
        );
        lines
    }

    /// Processes a single input line as read from the source.
    ///
    /// Trailing whitespace is trimmed before the line is classified or
    /// emitted. Leading whitespace is checked on the untrimmed line, so a
    /// whitespace-only line inside a fold group joins it (as an empty
    /// continuation) instead of ending the header section.
    pub fn step(&self, state: &mut ScanState, raw_line: &str) {
        let line = raw_line.trim_end();
        if state.mode == Mode::Body {
            state.emit(line);
            return;
        }

        let at_boundary = state
            .boundary()
            .is_some_and(|boundary| is_boundary_line(line, boundary));
        if at_boundary {
            state.enter_body();
            state.emit(line);
            return;
        }

        if !state.pending.is_empty() && is_continuation(raw_line) {
            state.pending.push(line.to_string());
            return;
        }

        if line.is_empty() {
            state.flush();
            if !state.output.is_empty() {
                state.enter_body();
                state.emit(line);
            }
            return;
        }

        state.flush();
        self.emit_header(state, line);
    }

    fn emit_header(&self, state: &mut ScanState, line: &str) {
        let kind = HeaderKind::classify(line, &self.policy);
        if !kind.is_kept() {
            debug!(?kind, "Discarding header line");
            return;
        }
        match kind {
            HeaderKind::Folded(_) => state.pending.push(line.to_string()),
            HeaderKind::Verbatim(VerbatimField::Date) => match &self.placeholders.date {
                Some(date) => state.emit(format!("Date: {date}")),
                None => state.emit(line),
            },
            HeaderKind::Verbatim(_) => state.emit(line),
            HeaderKind::Redacted(RedactedField::To) => {
                state.emit(format!("To: {}", self.placeholders.recipient))
            }
            HeaderKind::Derived(DerivedField::From) => {
                state.emit(rewrite_from(line, &self.placeholders))
            }
            HeaderKind::Derived(DerivedField::MessageId) => {
                state.emit(rewrite_message_id(line, &self.placeholders))
            }
            HeaderKind::FixedValue(FixedField::ListUnsubscribe) => {
                if state.seen_list_unsubscribe {
                    debug!("Dropping duplicate List-Unsubscribe header");
                } else {
                    state.emit(format!(
                        "List-Unsubscribe: {}",
                        self.placeholders.unsubscribe_value()
                    ));
                    state.seen_list_unsubscribe = true;
                }
            }
            HeaderKind::Removed(_) | HeaderKind::Dropped(_) | HeaderKind::Unrecognized => {}
        }
    }
}
