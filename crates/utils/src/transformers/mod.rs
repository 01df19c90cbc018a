//! Built-in header transformations used by the scrubber.
//!
//! Contains the derived-value rewrites applied while scanning
//! ([`rewrite_from`], [`rewrite_message_id`]) and the
//! [`UnsubscribeTransformer`] post-pass that pairs every message with a
//! single one-click unsubscribe header.

pub mod from;
pub mod message_id;
pub mod unsubscribe;

pub use from::*;
pub use message_id::*;
pub use unsubscribe::*;
