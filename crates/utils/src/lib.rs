//! Header scrubbing for raw email sources.
//!
//! The [`HeaderScrubber`] rewrites the RFC 5322 header block of a message
//! under a [`FieldPolicy`], keeping only an explicit allowlist of fields,
//! redacting or deriving some of their values, and pairing every message
//! with a single one-click `List-Unsubscribe` header. Body lines are copied
//! without inspection.

pub mod config;
pub mod header;
pub mod message;
pub mod mime;
pub mod policy;
pub mod scrubber;
pub mod transformer;
pub mod transformers;

pub use config::*;
pub use header::*;
pub use message::*;
pub use mime::*;
pub use policy::*;
pub use scrubber::*;
pub use transformer::*;
pub use transformers::*;
