//! Insertion-ordered frequency counter
//!
//! Keeps keys in first-seen order so `most_common` ties are stable and the
//! report is byte-identical across runs over the same store.

use super::json_fields::coerce_int;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyCounter {
    index: HashMap<String, usize>,
    entries: Vec<(String, i64)>,
}

impl FrequencyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, amount: i64) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&slot) => {
                let count = &mut self.entries[slot].1;
                *count = count.saturating_add(amount);
            }
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, amount));
            }
        }
    }

    /// Add every entry of a JSON frequency map.
    ///
    /// Values that cannot be coerced to an integer are skipped.
    pub fn add_json_counts(&mut self, counts: &Map<String, Value>) {
        for (key, value) in counts {
            match coerce_int(value) {
                Some(amount) => self.add(key.as_str(), amount),
                None => log::debug!("Skipping non-integer count for key {}", key),
            }
        }
    }

    pub fn from_json_counts(counts: &Map<String, Value>) -> Self {
        let mut counter = Self::new();
        counter.add_json_counts(counts);
        counter
    }

    /// Rename every key; keys that collide after renaming are summed
    pub fn remap<'a, F>(&'a self, rename: F) -> Self
    where
        F: Fn(&'a str) -> &'a str,
    {
        let mut remapped = Self::new();
        for (key, amount) in &self.entries {
            remapped.add(rename(key.as_str()), *amount);
        }
        remapped
    }

    pub fn get(&self, key: &str) -> i64 {
        self.index.get(key).map_or(0, |&slot| self.entries[slot].1)
    }

    pub fn total(&self) -> i64 {
        self.entries
            .iter()
            .fold(0i64, |total, (_, amount)| total.saturating_add(*amount))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (key, count) pairs by descending count; ties keep first-seen order
    pub fn most_common(&self) -> Vec<(String, i64)> {
        let mut pairs = self.entries.clone();
        pairs.sort_by(|a, b| b.1.cmp(&a.1));
        pairs
    }

    /// Ascending by key
    pub fn sorted_by_key(&self) -> Vec<(String, i64)> {
        let mut pairs = self.entries.clone();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }

    pub fn to_map(&self) -> BTreeMap<String, i64> {
        self.entries.iter().cloned().collect()
    }
}
