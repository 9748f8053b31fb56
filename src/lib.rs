//! # skkbridge
//!
//! An skkserv-protocol dictionary server for Japanese input methods with:
//! - Conversions fetched from a remote transliteration API
//! - A one-day expiring cache persisted as a flat tab-separated file
//! - One command per connection, served on a single thread
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │            (one connection at a time, one command)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Connection Handler                           │
//! │          (frame decode → dispatch → one reply)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ REQUEST
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Lookup Service                              │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │ fresh?                           │ miss
//!            ▼                                  ▼
//!   ┌─────────────────┐                ┌──────────────────┐
//!   │   Cache Store   │◀─── fill ──────│  Transliterator  │
//!   │ (TTL, TSV file) │                │  (HTTP, 10s)     │
//!   └─────────────────┘                └──────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod cache;
pub mod remote;
pub mod lookup;
pub mod network;
pub mod protocol;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BridgeError, Result};
pub use config::Config;
pub use cache::CacheStore;
pub use lookup::LookupService;
pub use remote::{HttpTransliterator, Transliterator};

// =============================================================================
// Version Info
// =============================================================================

/// Server name reported by the VERSION command
pub const SERVER_NAME: &str = env!("CARGO_PKG_NAME");

/// Current version of skkbridge
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
