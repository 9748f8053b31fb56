//! Cache Module
//!
//! Expiring, file-backed memo of remote conversions.
//!
//! ## Responsibilities
//! - Map each reading to its latest conversion and insertion time
//! - Treat entries older than the TTL as absent (they are kept, not evicted)
//! - Lazily load the persisted file on first access
//! - Rewrite the whole file after every insert
//!
//! ## File Format
//! ```text
//! <unix-epoch-seconds>\t<reading>\t<conversion>\n
//! ```
//! UTF-8, one record per line, sorted by reading. Lines missing a field or
//! carrying a non-numeric timestamp are skipped on load.

mod entry;
mod store;

pub use entry::{unix_now, CacheEntry};
pub use store::CacheStore;

/// Default freshness window: one day
pub const DEFAULT_TTL_SECS: u64 = 86_400;
