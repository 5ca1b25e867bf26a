//! Operation → key mapping and its JSON persistence
//!
//! The map is kept as a sequence ordered by [`Operation`], so iteration,
//! serialization and key resolution all follow operation order. A key bound
//! to several operations resolves to the first one in that order.
//!
//! File format:
//!
//! ```json
//! { "keys": [ { "operation": "buttonA", "key": "A" }, ... ] }
//! ```

use crate::error::{PadError, Result};
use crate::keys::Key;
use crate::operation::Operation;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Default key-map filename inside the per-user config directory
pub const KEYMAP_FILENAME: &str = "vigem_keys.json";

#[derive(Debug, Deserialize)]
struct KeymapFile {
    keys: Vec<serde_json::Value>,
}

/// `(operation, key)` text of one array element, if it is shaped like one
fn entry_fields(entry: &serde_json::Value) -> Option<(&str, &str)> {
    let operation = entry.get("operation")?.as_str()?;
    let key = entry.get("key").and_then(serde_json::Value::as_str).unwrap_or("");
    Some((operation, key))
}

/// Partial mapping from operations to keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMap {
    bindings: Vec<(Operation, Key)>,
}

impl KeyMap {
    /// Empty map that resolves no key
    pub fn new() -> Self {
        Self::default()
    }

    /// Letters `A`..`Z` in operation order; `Y` is left free so the connect
    /// operation has no key, `Z` disconnects.
    pub fn create_default() -> Self {
        let mut map = Self::new();
        let letters = ('A'..='Z').filter(|c| *c != 'Y');
        let ops = Operation::ALL.iter().filter(|op| **op != Operation::Connect);
        for (op, letter) in ops.zip(letters) {
            map.bind(*op, Key::Char(letter));
        }
        map
    }

    /// Bind `op` to `key`, replacing any previous key for `op`
    ///
    /// `Invalid` is never stored. Keys are stored normalized.
    pub fn bind(&mut self, op: Operation, key: Key) {
        if op == Operation::Invalid {
            return;
        }
        let key = key.normalized();
        match self.bindings.binary_search_by_key(&op, |(o, _)| *o) {
            Ok(idx) => self.bindings[idx].1 = key,
            Err(idx) => self.bindings.insert(idx, (op, key)),
        }
    }

    pub fn unbind(&mut self, op: Operation) -> Option<Key> {
        let idx = self.bindings.binary_search_by_key(&op, |(o, _)| *o).ok()?;
        Some(self.bindings.remove(idx).1)
    }

    pub fn key_for(&self, op: Operation) -> Option<Key> {
        self.bindings
            .binary_search_by_key(&op, |(o, _)| *o)
            .ok()
            .map(|idx| self.bindings[idx].1)
    }

    /// Whether any operation is bound to `key`
    pub fn resolvable_key(&self, key: Key) -> bool {
        self.bindings.iter().any(|(_, k)| *k == key)
    }

    /// First operation bound to `key`, or [`Operation::Invalid`]
    pub fn resolve_key(&self, key: Key) -> Operation {
        self.bindings
            .iter()
            .find(|(_, k)| *k == key)
            .map(|(op, _)| *op)
            .unwrap_or(Operation::Invalid)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Operation, Key)> + '_ {
        self.bindings.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// JSON document form
    pub fn to_json(&self) -> serde_json::Value {
        let keys: Vec<serde_json::Value> = self
            .bindings
            .iter()
            .map(|(op, key)| {
                serde_json::json!({
                    "operation": op.name(),
                    "key": key.to_portable(),
                })
            })
            .collect();
        serde_json::json!({ "keys": keys })
    }

    /// Build a fresh map from a JSON document
    ///
    /// Entries that are not objects with a string `operation`, or that carry
    /// an unknown operation name or unparsable key text, are skipped. Later entries for the same operation win. A document that is
    /// not shaped like a key map is a [`PadError::Config`].
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let file: KeymapFile = serde_json::from_value(value)
            .map_err(|e| PadError::Config(format!("malformed key map: {}", e)))?;

        let mut map = Self::new();
        for entry in &file.keys {
            let Some((name, text)) = entry_fields(entry) else {
                debug!("Ignoring malformed entry {}", entry);
                continue;
            };
            let op = Operation::from_name(name);
            if op == Operation::Invalid {
                debug!("Ignoring unknown operation {:?}", name);
                continue;
            }
            match Key::parse_portable(text) {
                Ok(key) => map.bind(op, key),
                Err(e) => warn!("Ignoring key {:?} for {}: {}", text, op, e),
            }
        }
        Ok(map)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| PadError::Config(format!("malformed key map: {}", e)))?;
        Self::from_json(value)
    }

    /// Strictly load a key-map file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Load a key-map file, falling back to [`KeyMap::create_default`] when
    /// it is missing, unreadable or malformed
    pub fn create_from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No key map at {}, using defaults", path.display());
            return Self::create_default();
        }
        match Self::load(path) {
            Ok(map) => {
                info!("Loaded {} key bindings from {}", map.len(), path.display());
                map
            }
            Err(e) => {
                warn!(
                    "Failed to load key map {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::create_default()
            }
        }
    }

    /// Write the map as pretty JSON, creating parent directories
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating key map directory: {}", parent.display());
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.to_json())?;
        std::fs::write(path, json)?;
        debug!("Key map written to {}", path.display());
        Ok(())
    }
}
