//! Remote Lookup Module
//!
//! Client side of the external transliteration provider.
//!
//! ## Request
//! ```text
//! GET <endpoint>?langpair=ja-Hira|ja&text=<shaped reading>
//! ```
//!
//! ## Response
//! ```text
//! [["ねこ", ["猫", "根古", ...]], ...]
//! ```
//! Candidates of the first segment are joined with `/`.
//!
//! Every failure (timeout, HTTP status, bad payload) is logged and reported
//! to the caller as "no conversion".

mod client;

pub use client::{parse_candidates, shape_query, HttpTransliterator, LANGPAIR};

/// Source of conversions for readings that are not cached
///
/// Implementations make at most one outbound attempt per call and never
/// surface errors: `None` means "no conversion found" for any reason.
pub trait Transliterator {
    fn transliterate(&self, reading: &str) -> Option<String>;
}

impl<T: Transliterator + ?Sized> Transliterator for Box<T> {
    fn transliterate(&self, reading: &str) -> Option<String> {
        (**self).transliterate(reading)
    }
}
