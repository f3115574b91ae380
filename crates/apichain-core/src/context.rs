//! Run context: identifiers learned while executing endpoints
//!
//! A [`RunContext`] is a plain value. Batches take a snapshot, work on it
//! privately, and hand back a new one. [`SharedContext`] wraps the single
//! ambient instance and is the only place updates are serialized.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Flat `name -> value` mapping produced by extraction and aliasing.
pub type Identifiers = BTreeMap<String, String>;

/// Learned identifier values, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RunContext {
    values: Identifiers,
}

impl RunContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value. Empty strings count as absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Overwrite-merge: every key in `other` replaces the current value.
    pub fn merge<I, K, V>(&mut self, other: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in other {
            self.values.insert(k.into(), v.into());
        }
    }

    pub fn reset(&mut self) {
        self.values.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn as_map(&self) -> &Identifiers {
        &self.values
    }
}

impl From<Identifiers> for RunContext {
    fn from(values: Identifiers) -> Self {
        Self { values }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RunContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Self::new();
        ctx.merge(iter);
        ctx
    }
}

impl<'a> IntoIterator for &'a RunContext {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// The ambient context shared by concurrent batches and manual runs.
///
/// Readers only ever see whole snapshots; writers merge under the lock.
#[derive(Debug, Default)]
pub struct SharedContext {
    inner: Mutex<RunContext>,
}

impl SharedContext {
    #[must_use]
    pub fn new(initial: RunContext) -> Self {
        Self {
            inner: Mutex::new(initial),
        }
    }

    // A panic in another batch must not make the learned ids unreachable.
    fn lock(&self) -> MutexGuard<'_, RunContext> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn snapshot(&self) -> RunContext {
        self.lock().clone()
    }

    /// Merge a finished batch's context back (overwrite, no conflict detection).
    pub fn commit(&self, finished: &RunContext) {
        self.lock().merge(finished);
    }

    /// Merge a small set of freshly learned identifiers.
    pub fn learn(&self, learned: Identifiers) {
        self.lock().merge(learned);
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    #[must_use]
    pub fn into_inner(self) -> RunContext {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overwrites() {
        let mut ctx: RunContext = [("id", "1"), ("name", "Amy")].into_iter().collect();
        ctx.merge([("id", "2")]);
        assert_eq!(ctx.get("id"), Some("2"));
        assert_eq!(ctx.get("name"), Some("Amy"));
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn empty_value_reads_as_absent() {
        let mut ctx = RunContext::new();
        ctx.insert("id", "");
        assert_eq!(ctx.get("id"), None);
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn reset_clears_everything() {
        let mut ctx: RunContext = [("id", "1")].into_iter().collect();
        ctx.reset();
        assert!(ctx.is_empty());
    }

    #[test]
    fn serializes_as_flat_sorted_object() {
        let ctx: RunContext = [("b", "2"), ("a", "1")].into_iter().collect();
        let json = serde_json::to_string(&ctx).unwrap();
        assert_eq!(json, r#"{"a":"1","b":"2"}"#);

        let back: RunContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ctx);
    }

    #[test]
    fn shared_snapshot_is_isolated() {
        let shared = SharedContext::new([("id", "1")].into_iter().collect());
        let mut snap = shared.snapshot();
        snap.insert("id", "99");
        assert_eq!(shared.snapshot().get("id"), Some("1"));

        shared.commit(&snap);
        assert_eq!(shared.snapshot().get("id"), Some("99"));
    }

    #[test]
    fn shared_commit_keeps_keys_from_other_writers() {
        let shared = SharedContext::default();
        let batch_a: RunContext = [("driver_id", "1")].into_iter().collect();
        let batch_b: RunContext = [("vehicle_id", "7")].into_iter().collect();
        shared.commit(&batch_a);
        shared.commit(&batch_b);

        let ctx = shared.into_inner();
        assert_eq!(ctx.get("driver_id"), Some("1"));
        assert_eq!(ctx.get("vehicle_id"), Some("7"));
    }

    #[test]
    fn shared_learn_and_reset() {
        let shared = SharedContext::default();
        shared.learn(Identifiers::from([("id".to_string(), "5".to_string())]));
        assert_eq!(shared.snapshot().get("id"), Some("5"));
        shared.reset();
        assert!(shared.snapshot().is_empty());
    }
}
