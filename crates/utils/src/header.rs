//! Classification of header lines into a closed set of kinds.
//!
//! The scrubber is a default-deny allowlist: only the kinds returned here
//! for explicitly named fields produce output, everything that classifies
//! as [`HeaderKind::Unrecognized`] is discarded. The [`FieldPolicy`] can
//! only remove more, it never lets an unlisted field through.

use crate::{FieldPolicy, RemovableField};

/// Fields starting a fold group, kept together with their continuation lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldedField {
    /// `Received: from`
    Received,
    /// `Content-Type:`
    ContentType,
}

/// Fields whose value is replaced by a fixed redaction token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedactedField {
    To,
}

/// Fields whose value is derived from the original one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedField {
    From,
    MessageId,
}

/// Fields whose value is replaced with a fixed, configured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedField {
    ListUnsubscribe,
}

/// Fields copied as a single line, without their continuations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbatimField {
    Date,
    MimeVersion,
    Subject,
    ReplyTo,
    FeedbackId,
    XSesOutgoing,
    ContentTransferEncoding,
}

/// Fields dropped unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DroppedField {
    /// Re-added in canonical form by the unsubscribe transformer.
    ListUnsubscribePost,
}

/// Kind of a header line, decides what the scrubber emits for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Removed(RemovableField),
    Folded(FoldedField),
    Redacted(RedactedField),
    Derived(DerivedField),
    FixedValue(FixedField),
    Verbatim(VerbatimField),
    Dropped(DroppedField),
    Unrecognized,
}

const VERBATIM_FIELDS: [(&str, VerbatimField); 6] = [
    ("MIME-Version:", VerbatimField::MimeVersion),
    ("Subject:", VerbatimField::Subject),
    ("Reply-To:", VerbatimField::ReplyTo),
    ("Feedback-ID:", VerbatimField::FeedbackId),
    ("X-SES-Outgoing:", VerbatimField::XSesOutgoing),
    (
        "Content-Transfer-Encoding:",
        VerbatimField::ContentTransferEncoding,
    ),
];

impl HeaderKind {
    /// Classifies a (right-trimmed) header line, first match wins.
    ///
    /// Prefixes are case-sensitive except for `Message-ID:`, which is
    /// recognized in any case.
    ///
    /// ```rust
    /// use mailscrub_utils::{DerivedField, HeaderKind, Preset, RemovableField};
    ///
    /// let policy = Preset::Standard.policy();
    /// assert_eq!(
    ///     HeaderKind::classify("message-id: <a@b>", &policy),
    ///     HeaderKind::Derived(DerivedField::MessageId)
    /// );
    /// assert_eq!(
    ///     HeaderKind::classify("DKIM-Signature: v=1", &policy),
    ///     HeaderKind::Removed(RemovableField::DkimSignature)
    /// );
    /// assert_eq!(HeaderKind::classify("Cc: a@b.com", &policy), HeaderKind::Unrecognized);
    /// ```
    pub fn classify(line: &str, policy: &FieldPolicy) -> HeaderKind {
        if let Some(field) = policy.removal_for(line) {
            return HeaderKind::Removed(field);
        }
        if line.starts_with("Received: from") {
            return HeaderKind::Folded(FoldedField::Received);
        }
        if line.starts_with("Date:") {
            return HeaderKind::Verbatim(VerbatimField::Date);
        }
        if line.starts_with("To:") {
            return HeaderKind::Redacted(RedactedField::To);
        }
        if line.starts_with("From:") {
            return HeaderKind::Derived(DerivedField::From);
        }
        if starts_with_ignore_case(line, "Message-ID:") {
            return HeaderKind::Derived(DerivedField::MessageId);
        }
        if line.starts_with("List-Unsubscribe:") {
            return HeaderKind::FixedValue(FixedField::ListUnsubscribe);
        }
        if line.starts_with("Content-Type:") {
            return HeaderKind::Folded(FoldedField::ContentType);
        }
        if let Some((_, field)) = VERBATIM_FIELDS
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix))
        {
            return HeaderKind::Verbatim(*field);
        }
        if line.starts_with("List-Unsubscribe-Post:") {
            return HeaderKind::Dropped(DroppedField::ListUnsubscribePost);
        }
        HeaderKind::Unrecognized
    }

    /// Whether lines of this kind produce any output.
    pub fn is_kept(&self) -> bool {
        !matches!(
            self,
            HeaderKind::Removed(_) | HeaderKind::Dropped(_) | HeaderKind::Unrecognized
        )
    }
}

fn starts_with_ignore_case(line: &str, prefix: &str) -> bool {
    line.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Preset;

    fn classify(line: &str) -> HeaderKind {
        HeaderKind::classify(line, &Preset::Standard.policy())
    }

    #[test]
    fn test_classify_folded() {
        assert_eq!(
            classify("Received: from mx.example.com (10.0.0.1)"),
            HeaderKind::Folded(FoldedField::Received)
        );
        assert_eq!(
            classify("Content-Type: text/plain; charset=utf-8"),
            HeaderKind::Folded(FoldedField::ContentType)
        );
    }

    #[test]
    fn test_classify_policy_first() {
        assert_eq!(
            classify("Received: by 2002:a05 with SMTP id"),
            HeaderKind::Removed(RemovableField::ReceivedBy)
        );
        assert_eq!(
            classify("X-original-To: someone@example.com"),
            HeaderKind::Removed(RemovableField::XOriginalTo)
        );
    }

    #[test]
    fn test_classify_policy_can_remove_nothing_else() {
        let policy = Preset::Custom.policy();
        assert_eq!(
            HeaderKind::classify("DKIM-Signature: v=1", &policy),
            HeaderKind::Unrecognized
        );
    }

    #[test]
    fn test_classify_rewritten_fields() {
        assert_eq!(classify("To: a@b.com"), HeaderKind::Redacted(RedactedField::To));
        assert_eq!(
            classify("From: \"A\" <a@b.com>"),
            HeaderKind::Derived(DerivedField::From)
        );
        assert_eq!(
            classify("Message-Id: <x@y>"),
            HeaderKind::Derived(DerivedField::MessageId)
        );
        assert_eq!(
            classify("MESSAGE-ID: <x@y>"),
            HeaderKind::Derived(DerivedField::MessageId)
        );
        assert_eq!(
            classify("List-Unsubscribe: <mailto:x@y>"),
            HeaderKind::FixedValue(FixedField::ListUnsubscribe)
        );
    }

    #[test]
    fn test_classify_verbatim() {
        assert_eq!(
            classify("Date: Mon, 1 Jan 2024 00:00:00 +0000"),
            HeaderKind::Verbatim(VerbatimField::Date)
        );
        assert_eq!(
            classify("MIME-Version: 1.0"),
            HeaderKind::Verbatim(VerbatimField::MimeVersion)
        );
        assert_eq!(
            classify("Subject: hello"),
            HeaderKind::Verbatim(VerbatimField::Subject)
        );
        assert_eq!(
            classify("X-SES-Outgoing: 2024.01.01"),
            HeaderKind::Verbatim(VerbatimField::XSesOutgoing)
        );
        assert_eq!(
            classify("Content-Transfer-Encoding: 7bit"),
            HeaderKind::Verbatim(VerbatimField::ContentTransferEncoding)
        );
    }

    #[test]
    fn test_classify_dropped_and_unrecognized() {
        assert_eq!(
            classify("List-Unsubscribe-Post: List-Unsubscribe=One-Click"),
            HeaderKind::Dropped(DroppedField::ListUnsubscribePost)
        );
        assert_eq!(classify("Sender: x@y.com"), HeaderKind::Unrecognized);
        assert_eq!(classify("X-Mailer: foo"), HeaderKind::Unrecognized);
        assert_eq!(classify("subject: lowercase"), HeaderKind::Unrecognized);
        assert_eq!(classify("\tcontinuation"), HeaderKind::Unrecognized);
        assert_eq!(classify("Received: with no from"), HeaderKind::Unrecognized);
    }

    #[test]
    fn test_is_kept() {
        assert!(classify("Subject: hi").is_kept());
        assert!(!classify("Cc: a@b.com").is_kept());
        assert!(!classify("DKIM-Signature: v=1").is_kept());
        assert!(!classify("List-Unsubscribe-Post: x").is_kept());
    }

    #[test]
    fn test_starts_with_ignore_case_non_ascii() {
        assert!(!starts_with_ignore_case("Mé", "Message-ID:"));
        assert!(!starts_with_ignore_case("Message-ÏD: x", "Message-ID:"));
    }
}
