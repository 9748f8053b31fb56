//! Cache Store
//!
//! In-memory map of readings to conversions, backed by a flat file.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{BridgeError, Result};

use super::{CacheEntry, DEFAULT_TTL_SECS};

/// Expiring conversion cache
///
/// ## Ownership
/// One store per server, owned by the lookup service and only ever touched
/// from the accept loop thread, so no locking is involved. The backing file
/// is single-writer: concurrent external edits are not supported.
///
/// ## Growth
/// Stale entries are ignored on read but stay in memory (and on disk) until
/// the same reading is filled again. Nothing bounds the map's size.
#[derive(Debug)]
pub struct CacheStore {
    /// Backing file
    path: PathBuf,

    /// Freshness window in seconds
    ttl_secs: u64,

    /// Entries keyed by reading; `None` until first access
    /// (BTreeMap keeps the persisted output sorted by reading)
    entries: Option<BTreeMap<String, CacheEntry>>,
}

impl CacheStore {
    /// Create a store for `path` with the default one-day TTL
    ///
    /// The file is not read until the first `get` or `put`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_ttl(path, DEFAULT_TTL_SECS)
    }

    /// Create a store with an explicit TTL
    pub fn with_ttl(path: impl Into<PathBuf>, ttl_secs: u64) -> Self {
        Self {
            path: path.into(),
            ttl_secs,
            entries: None,
        }
    }

    /// Read a persisted cache file
    ///
    /// A missing file yields an empty map. Malformed lines, including lines
    /// that are not valid UTF-8, are skipped.
    pub fn load(path: &Path) -> Result<BTreeMap<String, CacheEntry>> {
        let contents = match fs::read(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No cache file at {}, starting empty", path.display());
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = BTreeMap::new();
        let mut skipped = 0usize;

        for raw in contents.split(|&b| b == b'\n') {
            if raw.is_empty() {
                continue;
            }
            let parsed = std::str::from_utf8(raw)
                .ok()
                .and_then(CacheEntry::parse_line);

            match parsed {
                Some((reading, entry)) => {
                    entries.insert(reading, entry);
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::debug!("Skipped {} malformed cache lines in {}", skipped, path.display());
        }
        tracing::info!("Loaded {} cache entries from {}", entries.len(), path.display());

        Ok(entries)
    }

    /// Get a fresh entry for `reading`
    ///
    /// Returns `Ok(None)` if the reading is unknown or its entry is stale.
    pub fn get(&mut self, reading: &str, now: u64) -> Result<Option<&CacheEntry>> {
        let ttl_secs = self.ttl_secs;
        let entries = self.entries_mut()?;

        Ok(entries
            .get(reading)
            .filter(|entry| entry.is_fresh(now, ttl_secs)))
    }

    /// Insert or replace the entry for `reading`, then rewrite the file
    pub fn put(&mut self, reading: &str, conversion: &str, now: u64) -> Result<()> {
        self.entries_mut()?
            .insert(reading.to_string(), CacheEntry::new(conversion, now));
        self.persist()
    }

    /// Rewrite the backing file with every entry, sorted by reading
    pub fn persist(&self) -> Result<()> {
        match &self.entries {
            Some(entries) => Self::write_entries(&self.path, entries),
            None => Ok(()),
        }
    }

    /// Write `entries` to `path` through a temporary sibling file
    fn write_entries(path: &Path, entries: &BTreeMap<String, CacheEntry>) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = Self::tmp_path(path);
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            for (reading, entry) in entries {
                writer.write_all(entry.to_line(reading).as_bytes())?;
            }
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, path)?;

        tracing::trace!("Persisted {} cache entries to {}", entries.len(), path.display());
        Ok(())
    }

    /// `<file>.tmp` next to the target
    fn tmp_path(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        path.with_file_name(name)
    }

    /// Loaded entries, reading the file on first use
    fn entries_mut(&mut self) -> Result<&mut BTreeMap<String, CacheEntry>> {
        if self.entries.is_none() {
            self.entries = Some(Self::load(&self.path)?);
        }
        self.entries
            .as_mut()
            .ok_or_else(|| BridgeError::Cache("cache entries not loaded".to_string()))
    }

    /// Number of entries held in memory, stale ones included
    pub fn len(&mut self) -> Result<usize> {
        Ok(self.entries_mut()?.len())
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Freshness window in seconds
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }
}
