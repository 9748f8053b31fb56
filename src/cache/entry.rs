//! Cache entry
//!
//! A single cached conversion and its line representation.

use std::borrow::Cow;
use std::time::{SystemTime, UNIX_EPOCH};

/// Field separator in the persisted file
const FIELD_SEPARATOR: char = '\t';

/// A cached conversion. The reading is the key in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Converted form, candidates joined with `/`
    pub conversion: String,

    /// Insertion time of this conversion (Unix seconds)
    pub created_at: u64,
}

impl CacheEntry {
    pub fn new(conversion: impl Into<String>, created_at: u64) -> Self {
        Self {
            conversion: conversion.into(),
            created_at,
        }
    }

    /// Fresh while `now < created_at + ttl`; stale at exactly the TTL.
    pub fn is_fresh(&self, now: u64, ttl_secs: u64) -> bool {
        now < self.created_at.saturating_add(ttl_secs)
    }

    /// Parse one persisted line into `(reading, entry)`
    ///
    /// Returns `None` for malformed lines:
    /// - fewer than three tab-separated fields
    /// - a timestamp that is not an unsigned integer
    pub fn parse_line(line: &str) -> Option<(String, CacheEntry)> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let mut fields = line.split(FIELD_SEPARATOR);

        let created_at = fields.next()?.trim().parse::<u64>().ok()?;
        let reading = unescape_field(fields.next()?);
        let conversion = unescape_field(fields.next()?);

        Some((reading, CacheEntry::new(conversion, created_at)))
    }

    /// Render as a persisted line (newline included)
    ///
    /// Tabs, line breaks and backslashes inside fields are escaped so every
    /// entry stays on one line with exactly three fields.
    pub fn to_line(&self, reading: &str) -> String {
        format!(
            "{}{sep}{}{sep}{}\n",
            self.created_at,
            escape_field(reading),
            escape_field(&self.conversion),
            sep = FIELD_SEPARATOR
        )
    }
}

fn escape_field(field: &str) -> Cow<'_, str> {
    if !field.contains(&['\\', '\t', '\n', '\r'][..]) {
        return Cow::Borrowed(field);
    }

    let mut escaped = String::with_capacity(field.len() + 4);
    for c in field.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Inverse of `escape_field`; an unknown escape is kept as written
fn unescape_field(field: &str) -> String {
    let mut unescaped = String::with_capacity(field.len());
    let mut chars = field.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => unescaped.push('\\'),
            Some('t') => unescaped.push('\t'),
            Some('n') => unescaped.push('\n'),
            Some('r') => unescaped.push('\r'),
            Some(other) => {
                unescaped.push('\\');
                unescaped.push(other);
            }
            None => unescaped.push('\\'),
        }
    }
    unescaped
}

/// Current time as Unix seconds (0 if the clock is before the epoch)
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
