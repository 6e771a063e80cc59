// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-node value storage, one slot per pin index.

use crate::value::{FromValue, Value};
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

/// Value slots keyed by pin index (or by name, for node scratch data)
#[derive(Debug, Clone, Serialize)]
pub struct ValueStore<K: Eq + Hash = usize> {
    values: HashMap<K, Value>,
}

impl<K: Eq + Hash> ValueStore<K> {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Store a value, replacing whatever was there
    pub fn set(&mut self, key: K, value: impl Into<Value>) {
        self.values.insert(key, value.into());
    }

    /// Get the raw stored value
    pub fn value(&self, key: &K) -> Option<&Value> {
        self.values.get(key)
    }

    /// Typed read. Returns `fallback` when the slot is empty or holds another kind.
    pub fn get<T: FromValue>(&self, key: &K, fallback: T) -> T {
        self.values
            .get(key)
            .and_then(T::from_value)
            .unwrap_or(fallback)
    }

    /// Clear a slot
    pub fn remove(&mut self, key: &K) -> Option<Value> {
        self.values.remove(key)
    }

    /// Whether the slot holds a value
    pub fn contains(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate over all stored values
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Value)> {
        self.values.iter()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no slot is occupied
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Eq + Hash> Default for ValueStore<K> {
    fn default() -> Self {
        Self::new()
    }
}
