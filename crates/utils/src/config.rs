use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;

use crate::{FieldPolicy, Preset};

/// Top-level configuration for the Mailscrub tools.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scrub: ScrubConfig,
}

/// Scrubber configuration.
#[derive(Debug, Deserialize)]
pub struct ScrubConfig {
    /// Preset the field policy starts from.
    #[serde(default)]
    pub preset: Preset,

    /// Per-field overrides applied on top of the preset, keyed by the
    /// field prefix (e.g. `"Cc:"`).
    #[serde(default)]
    pub fields: BTreeMap<String, bool>,

    #[serde(default)]
    pub placeholders: Placeholders,

    /// Maximum number of messages scrubbed concurrently by batch callers.
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            preset: Preset::default(),
            fields: BTreeMap::new(),
            placeholders: Placeholders::default(),
            max_batch: default_max_batch(),
        }
    }
}

impl ScrubConfig {
    /// Resolves the effective field policy (preset plus overrides).
    pub fn policy(&self) -> FieldPolicy {
        let mut policy = self.preset.policy();
        policy.apply_overrides(
            self.fields
                .iter()
                .map(|(key, remove)| (key.as_str(), *remove)),
        );
        policy
    }
}

/// Literal tokens written into rewritten headers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Placeholders {
    /// Domain used for the `noreply` sender and unsubscribe targets.
    #[serde(default = "default_redacted_domain")]
    pub redacted_domain: String,

    /// Marker inserted into Message-ID local parts.
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Domain used for Message-ID values that carry no `@`.
    #[serde(default = "default_random_domain")]
    pub random_domain: String,

    /// Replacement value of the `To:` header.
    #[serde(default = "default_recipient")]
    pub recipient: String,

    /// Path of the HTTP one-click unsubscribe target.
    #[serde(default = "default_unsubscribe_path")]
    pub unsubscribe_path: String,

    /// Replacement value of the `Date:` header, kept verbatim when unset.
    #[serde(default)]
    pub date: Option<String>,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            redacted_domain: default_redacted_domain(),
            marker: default_marker(),
            random_domain: default_random_domain(),
            recipient: default_recipient(),
            unsubscribe_path: default_unsubscribe_path(),
            date: None,
        }
    }
}

impl Placeholders {
    /// Fixed two-target `List-Unsubscribe` value.
    pub fn unsubscribe_value(&self) -> String {
        format!(
            "<mailto:unsubscribe@{domain}>, <http://{domain}/{path}>",
            domain = self.redacted_domain,
            path = self.unsubscribe_path
        )
    }

    /// Address every rewritten `From:` header points to.
    pub fn noreply_address(&self) -> String {
        format!("noreply@{}", self.redacted_domain)
    }
}

/// Loads configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Parses configuration from a TOML string.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    toml::from_str(content).map_err(ConfigError::Parse)
}

/// Errors that can occur while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O error occurred reading the file.
    Io(std::io::Error),
    /// A parse error occurred deserializing TOML.
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "Config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

fn default_max_batch() -> usize {
    20
}

fn default_redacted_domain() -> String {
    "[REDACTED_DOMAIN]".to_string()
}

fn default_marker() -> String {
    "[MARKER]".to_string()
}

fn default_random_domain() -> String {
    "[RANDOM_DOMAIN]".to_string()
}

fn default_recipient() -> String {
    "[*to]".to_string()
}

fn default_unsubscribe_path() -> String {
    "[OPTDOWN]".to_string()
}
