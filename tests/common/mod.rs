//! Shared test helpers

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use skkbridge::Transliterator;

/// Canned transliterator that counts how often it is asked
#[derive(Debug, Clone, Default)]
pub struct StubTransliterator {
    answers: HashMap<String, String>,
    calls: Arc<AtomicUsize>,
}

impl StubTransliterator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(mut self, reading: &str, conversion: &str) -> Self {
        self.answers.insert(reading.to_string(), conversion.to_string());
        self
    }

    /// Shared call counter (survives moving the stub into a server)
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transliterator for StubTransliterator {
    fn transliterate(&self, reading: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers.get(reading).cloned()
    }
}
