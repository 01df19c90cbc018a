//! Field removal policy for the header scrubber.
//!
//! A [`FieldPolicy`] maps the closed set of [`RemovableField`] prefixes to
//! a "remove" flag. Note that the policy only ever *removes* lines: the
//! scrubber keeps nothing that is not named in its own allowlist (see
//! [`HeaderKind`](crate::HeaderKind)), so clearing a flag for a field such as
//! `Cc:` does not make that field survive.

use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use serde::Deserialize;
use tracing::warn;

/// Header prefixes the policy is able to remove.
///
/// Keys are matched as literal, case-sensitive line prefixes. Some keys
/// carry no trailing colon (`X-original-To`, `References`) and therefore
/// also match longer field names sharing the same prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RemovableField {
    DeliveredTo,
    ReceivedBy,
    XGoogleSmtpSource,
    XReceived,
    XOriginalTo,
    ArcSeal,
    ArcMessageSignature,
    ArcAuthenticationResults,
    ReturnPath,
    ReceivedSpf,
    References,
    AuthenticationResults,
    DkimSignature,
    XSgEid,
    Cc,
    XEntityId,
}

impl RemovableField {
    /// Every removable field, in the order they are checked.
    pub const ALL: [RemovableField; 16] = [
        RemovableField::DeliveredTo,
        RemovableField::ReceivedBy,
        RemovableField::XGoogleSmtpSource,
        RemovableField::XReceived,
        RemovableField::XOriginalTo,
        RemovableField::ArcSeal,
        RemovableField::ArcMessageSignature,
        RemovableField::ArcAuthenticationResults,
        RemovableField::ReturnPath,
        RemovableField::ReceivedSpf,
        RemovableField::References,
        RemovableField::AuthenticationResults,
        RemovableField::DkimSignature,
        RemovableField::XSgEid,
        RemovableField::Cc,
        RemovableField::XEntityId,
    ];

    /// Returns the line prefix this field matches, which is also its
    /// configuration key.
    pub fn key(&self) -> &'static str {
        match self {
            RemovableField::DeliveredTo => "Delivered-To:",
            RemovableField::ReceivedBy => "Received: by",
            RemovableField::XGoogleSmtpSource => "X-Google-Smtp-Source:",
            RemovableField::XReceived => "X-Received:",
            RemovableField::XOriginalTo => "X-original-To",
            RemovableField::ArcSeal => "ARC-Seal:",
            RemovableField::ArcMessageSignature => "ARC-Message-Signature:",
            RemovableField::ArcAuthenticationResults => "ARC-Authentication-Results:",
            RemovableField::ReturnPath => "Return-Path:",
            RemovableField::ReceivedSpf => "Received-SPF:",
            RemovableField::References => "References",
            RemovableField::AuthenticationResults => "Authentication-Results:",
            RemovableField::DkimSignature => "DKIM-Signature:",
            RemovableField::XSgEid => "X-SG-EID:",
            RemovableField::Cc => "Cc:",
            RemovableField::XEntityId => "X-Entity-ID:",
        }
    }

    /// Looks up a field by its exact configuration key.
    ///
    /// ```rust
    /// use mailscrub_utils::RemovableField;
    ///
    /// assert_eq!(RemovableField::from_key("Cc:"), Some(RemovableField::Cc));
    /// assert_eq!(RemovableField::from_key("cc:"), None);
    /// ```
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Whether `line` starts with this field's prefix.
    pub fn matches(&self, line: &str) -> bool {
        line.starts_with(self.key())
    }
}

impl Display for RemovableField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Mapping of removable fields to their "remove" flag.
///
/// Fields absent from the mapping are treated as not flagged, which is
/// how the [`Preset::Custom`] policy starts out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPolicy {
    flags: BTreeMap<RemovableField, bool>,
}

impl FieldPolicy {
    /// Creates an empty policy, nothing flagged for removal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a policy from `(key, flag)` pairs, ignoring (with a warning)
    /// keys that are not part of the recognized prefix set.
    pub fn from_flags<'a, I>(flags: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let mut policy = Self::new();
        policy.apply_overrides(flags);
        policy
    }

    /// Applies `(key, flag)` overrides on top of the current flags.
    pub fn apply_overrides<'a, I>(&mut self, flags: I)
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        for (key, remove) in flags {
            match RemovableField::from_key(key) {
                Some(field) => self.set(field, remove),
                None => warn!(key = %key, "Ignoring unrecognized policy field"),
            }
        }
    }

    /// Sets the remove flag of `field`.
    pub fn set(&mut self, field: RemovableField, remove: bool) {
        self.flags.insert(field, remove);
    }

    /// Builder variant of [`set`](Self::set).
    pub fn with(mut self, field: RemovableField, remove: bool) -> Self {
        self.set(field, remove);
        self
    }

    /// Returns whether `field` is flagged for removal.
    pub fn is_removed(&self, field: RemovableField) -> bool {
        self.flags.get(&field).copied().unwrap_or(false)
    }

    /// Returns the first flagged field whose prefix starts `line`.
    pub fn removal_for(&self, line: &str) -> Option<RemovableField> {
        RemovableField::ALL
            .into_iter()
            .find(|field| self.is_removed(*field) && field.matches(line))
    }

    /// Iterates over the fields currently flagged for removal.
    pub fn removed_fields(&self) -> impl Iterator<Item = RemovableField> + '_ {
        self.flags
            .iter()
            .filter(|(_, remove)| **remove)
            .map(|(field, _)| *field)
    }
}

/// Built-in policy presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Removes tracking and authentication headers, flags `Cc:` as kept.
    #[default]
    Standard,
    /// Same as standard, but also flags `Cc:` for removal.
    Minimal,
    /// Empty mapping, to be filled field by field.
    Custom,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Standard, Preset::Minimal, Preset::Custom];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Standard => "Standard",
            Preset::Minimal => "Minimal",
            Preset::Custom => "Custom",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Preset::Standard => "Remove common tracking and authentication headers",
            Preset::Minimal => "Keep only essential headers",
            Preset::Custom => "Configure your own settings",
        }
    }

    /// Returns the policy for this preset.
    pub fn policy(&self) -> FieldPolicy {
        match self {
            Preset::Standard => RemovableField::ALL
                .into_iter()
                .fold(FieldPolicy::new(), |policy, field| {
                    policy.with(field, field != RemovableField::Cc)
                }),
            Preset::Minimal => RemovableField::ALL
                .into_iter()
                .fold(FieldPolicy::new(), |policy, field| policy.with(field, true)),
            Preset::Custom => FieldPolicy::new(),
        }
    }
}

/// Error returned when a preset name cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    UnknownPreset(String),
}

impl Display for PolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyError::UnknownPreset(name) => write!(f, "Unknown preset: {name}"),
        }
    }
}

impl std::error::Error for PolicyError {}

impl FromStr for Preset {
    type Err = PolicyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "standard" => Ok(Preset::Standard),
            "minimal" => Ok(Preset::Minimal),
            "custom" => Ok(Preset::Custom),
            _ => Err(PolicyError::UnknownPreset(value.to_string())),
        }
    }
}
