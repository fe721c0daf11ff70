//! Durable-tier storage backends.
//!
//! The cache talks to its durable tier through the `DurableStore` trait.
//! `FileStore` keeps one JSON file per record in a directory that may also
//! hold unrelated files; `DisabledStore` is the fallback selected when the
//! construction-time probe finds the filesystem unusable.

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::debug;

use crate::error::StoreError;

/// Outcome of the construction-time capability probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable(String),
}

/// Durable key/value backend for serialized cache records.
///
/// Implementations speak logical keys; namespacing and on-disk layout are
/// backend concerns. `keys()` must only ever report keys the backend owns,
/// so bulk operations built on it cannot touch foreign data.
pub trait DurableStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Memory-only fallback: reads miss, writes and removals are no-ops.
#[derive(Debug, Default)]
pub struct DisabledStore;

impl DurableStore for DisabledStore {
    fn read(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn write(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(Vec::new())
    }
}

/// Logical key reserved for the write-then-delete capability probe.
const PROBE_KEY: &str = "__probe__";

/// Filesystem-backed store: one JSON file per record.
///
/// File names are the percent-encoded full key (`<namespace>:<logical
/// key>`) plus a `.json` suffix. The encoding is reversible, so `keys()`
/// can recover logical keys from a directory listing, and files outside
/// the namespace (or that do not decode) are never touched.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    namespace: String,
}

impl FileStore {
    pub fn new(dir: PathBuf, namespace: String) -> Self {
        Self { dir, namespace }
    }

    /// Check whether the directory is usable: create it, write a sentinel
    /// record through the normal path, and delete it again. Any failure
    /// means the durable tier stays disabled for the cache's lifetime.
    pub fn probe(&self) -> Availability {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            return Availability::Unavailable(format!(
                "cannot create {}: {}",
                self.dir.display(),
                e
            ));
        }
        if let Err(e) = self.write(PROBE_KEY, "{}") {
            return Availability::Unavailable(format!(
                "cannot write to {}: {}",
                self.dir.display(),
                e
            ));
        }
        if let Err(e) = self.remove(PROBE_KEY) {
            return Availability::Unavailable(format!(
                "cannot delete from {}: {}",
                self.dir.display(),
                e
            ));
        }
        Availability::Available
    }

    fn namespace_prefix(&self) -> String {
        format!("{}:", self.namespace)
    }

    fn record_path(&self, key: &str) -> PathBuf {
        let full_key = format!("{}{}", self.namespace_prefix(), key);
        self.dir.join(format!("{}.json", encode_name(&full_key)))
    }
}

impl DurableStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.record_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::write(self.record_path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.record_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let prefix = self.namespace_prefix();
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(encoded) = name.strip_suffix(".json") else {
                continue;
            };
            let Some(full_key) = decode_name(encoded) else {
                debug!(file = name, "Skipping file with undecodable name");
                continue;
            };
            if let Some(key) = full_key.strip_prefix(&prefix) {
                keys.push(key.to_string());
            }
        }
        Ok(keys)
    }
}

/// Make an arbitrary key safe as a file name. Alphanumerics plus `.`,
/// `_` and `-` pass through; every other byte becomes `%XX`.
fn encode_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

/// Reverse of `encode_name`. Returns `None` for names this store could
/// not have produced.
fn decode_name(name: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(name.len());
    let mut iter = name.bytes();
    while let Some(byte) = iter.next() {
        if byte == b'%' {
            let hi = iter.next()?;
            let lo = iter.next()?;
            let hex = [hi, lo];
            let hex = std::str::from_utf8(&hex).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
        } else {
            bytes.push(byte);
        }
    }
    String::from_utf8(bytes).ok()
}

// ============================================================================
// Tests
// ============================================================================
