// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Key-value persistence for the workspace collections.
//!
//! Each collection is one JSON array under a fixed key and is always read
//! and written whole. There is no schema version; the few migrations happen
//! while reading.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::model::StickyNote;

/// String store the workspace is loaded from and flushed to.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

/// The persisted collections and their storage keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Tasks,
    Lists,
    Tags,
    CalendarEvents,
    StickyNotes,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Tasks,
        Collection::Lists,
        Collection::Tags,
        Collection::CalendarEvents,
        Collection::StickyNotes,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Lists => "lists",
            Self::Tags => "tags",
            Self::CalendarEvents => "calendarEvents",
            Self::StickyNotes => "stickyNotes",
        }
    }
}

/// Result of reading one collection.
#[derive(Debug)]
pub struct Loaded<T> {
    pub items: Vec<T>,
    /// The key held no value at all.
    pub missing: bool,
    /// The stored value was migrated and should be written back.
    pub needs_rewrite: bool,
}

impl<T> Default for Loaded<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            missing: true,
            needs_rewrite: false,
        }
    }
}

/// Reads a collection, falling back to an empty one on any failure.
///
/// Failures are logged, never returned: a corrupt value must not keep the
/// rest of the workspace from loading.
pub fn load_collection<T, S>(store: &S, collection: Collection) -> Loaded<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = match store.get(collection.key()) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Loaded::default(),
        Err(e) => {
            warn!("Error loading {}: {}", collection.key(), e);
            return Loaded::default();
        }
    };

    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(items) => {
            debug!("Loaded {} {}", items.len(), collection.key());
            Loaded {
                items,
                missing: false,
                needs_rewrite: false,
            }
        }
        Err(e) => {
            warn!("Error parsing {}: {}", collection.key(), e);
            Loaded {
                items: Vec::new(),
                missing: false,
                needs_rewrite: false,
            }
        }
    }
}

/// Reads the sticky notes, dropping the `x`/`y` coordinates older boards
/// stored. When any note still had them the collection must be rewritten.
pub fn load_sticky_notes<S>(store: &S) -> Loaded<StickyNote>
where
    S: KeyValueStore + ?Sized,
{
    let loaded = load_collection::<serde_json::Value, S>(store, Collection::StickyNotes);
    let had_coordinates = loaded
        .items
        .iter()
        .any(|note| note.get("x").is_some() || note.get("y").is_some());

    let total = loaded.items.len();
    let items: Vec<StickyNote> = loaded
        .items
        .into_iter()
        .filter_map(|note| match serde_json::from_value(note) {
            Ok(note) => Some(note),
            Err(e) => {
                warn!("Dropping unreadable sticky note: {}", e);
                None
            }
        })
        .collect();

    if had_coordinates {
        debug!("Stripping legacy coordinates from {} sticky notes", total);
    }
    Loaded {
        needs_rewrite: had_coordinates || items.len() != total,
        missing: loaded.missing,
        items,
    }
}

/// Overwrites a whole collection.
pub fn save_collection<T, S>(store: &mut S, collection: Collection, items: &[T]) -> Result<(), StoreError>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let value = serde_json::to_string(items).map_err(|source| StoreError::Serialize {
        key: collection.key(),
        source,
    })?;
    store.set(collection.key(), value)
}

/// In-memory store that remembers which keys were written.
///
/// The server loads a user's rows into one of these, runs the workspace
/// against it and writes the dirty keys back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    dirty: BTreeSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from already persisted entries; nothing is dirty.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
            dirty: BTreeSet::new(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// The entries written since the store was built, in key order.
    pub fn dirty_entries(&self) -> Vec<(&str, &str)> {
        self.dirty
            .iter()
            .filter_map(|key| {
                self.entries
                    .get(key)
                    .map(|value| (key.as_str(), value.as_str()))
            })
            .collect()
    }

    pub fn mark_clean(&mut self) {
        self.dirty.clear();
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        self.dirty.insert(key.to_string());
        Ok(())
    }
}
