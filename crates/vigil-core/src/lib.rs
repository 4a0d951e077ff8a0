//! Foundational types and utilities shared across Vigil crates.
//!
//! Provides the immutable relay configuration, the confidence/choice
//! vocabulary carried through button payloads, atomic file-write helpers,
//! and unix-time utilities used for store persistence and message ids.

pub mod atomic_io;
pub mod config;
pub mod time_utils;
pub mod vocab;

pub use atomic_io::write_text_atomic;
pub use config::RelayConfig;
pub use time_utils::{current_unix_timestamp, current_unix_timestamp_ms};
pub use vocab::{ConfidenceLevel, UserChoice};
