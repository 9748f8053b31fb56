//! HTTP transliteration client

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{BridgeError, Result};

use super::Transliterator;

/// Language pair sent with every query (hiragana to Japanese)
pub const LANGPAIR: &str = "ja-Hira|ja";

/// Separator between joined candidates
const CANDIDATE_SEPARATOR: &str = "/";

/// One segment of the provider's reply: `[reading, [candidate, ...]]`
#[derive(Debug, Deserialize)]
struct Segment(String, Vec<String>);

/// Transliterator backed by the remote HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpTransliterator {
    client: Client,
    endpoint: String,
}

impl HttpTransliterator {
    /// Create a client for `endpoint` with a per-request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.endpoint.clone(), config.lookup_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Single request/response exchange; errors are returned, not logged
    fn fetch(&self, reading: &str) -> Result<Option<String>> {
        let text = shape_query(reading);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("langpair", LANGPAIR), ("text", text.as_str())])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Remote(format!("HTTP {}", status)));
        }

        let body = response.text()?;
        parse_candidates(&body)
    }
}

impl Transliterator for HttpTransliterator {
    fn transliterate(&self, reading: &str) -> Option<String> {
        match self.fetch(reading) {
            Ok(Some(conversion)) => {
                tracing::debug!("Remote conversion for {:?}: {:?}", reading, conversion);
                Some(conversion)
            }
            Ok(None) => {
                tracing::debug!("Remote returned no candidates for {:?}", reading);
                None
            }
            Err(e) => {
                tracing::warn!("Remote lookup for {:?} failed: {}", reading, e);
                None
            }
        }
    }
}

/// Shape a reading for the provider
///
/// A single trailing lowercase ASCII letter (an okurigana hint such as the
/// `r` in `たべr`) is split off with a comma: `たべr` becomes `たべ,r`.
/// Anything else, including all-ASCII readings, is sent unchanged.
pub fn shape_query(reading: &str) -> String {
    let mut chars = reading.chars().rev();

    let last = match chars.next() {
        Some(c) if c.is_ascii_lowercase() => c,
        _ => return reading.to_string(),
    };

    match chars.next() {
        Some(prev) if !prev.is_ascii_alphabetic() => {
            let stem = &reading[..reading.len() - last.len_utf8()];
            format!("{},{}", stem, last)
        }
        _ => reading.to_string(),
    }
}

/// Extract the joined candidates of the first segment from a reply body
///
/// `Ok(None)` when the reply is well formed but offers nothing.
pub fn parse_candidates(body: &str) -> Result<Option<String>> {
    let segments: Vec<Segment> = serde_json::from_str(body)
        .map_err(|e| BridgeError::Remote(format!("malformed payload: {}", e)))?;

    let candidates = match segments.into_iter().next() {
        Some(Segment(segment, candidates)) => {
            tracing::trace!("First segment {:?} has {} candidates", segment, candidates.len());
            candidates
        }
        None => return Ok(None),
    };

    if candidates.is_empty() {
        return Ok(None);
    }

    Ok(Some(candidates.join(CANDIDATE_SEPARATOR)))
}
