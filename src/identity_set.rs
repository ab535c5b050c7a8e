//! Durable ordered set of chat identities.
//!
//! A duplicate-free list of short strings kept in a [`StoragePort`]
//! namespace under a fixed key prefix:
//!
//! | Key            | Value                          |
//! |----------------|--------------------------------|
//! | `<prefix>.c`   | element count `n` (i32 LE)     |
//! | `<prefix>.<i>` | element at position `i < n`    |
//!
//! Positions `>= n` may hold stale values left by `remove` or `clear`;
//! they are never read.
//!
//! ## Crash ordering
//!
//! `add` writes the element before bumping the count, and `remove`
//! shifts survivors down before shrinking it.  A reset between the two
//! writes leaves at most an unreferenced slot or one duplicated survivor
//! at the tail, never a counted slot that was not written.

use crate::app::ports::{KeyValueStore, StorageError, StoragePort};

/// A named, persistent, insertion-ordered set of identities.
///
/// The set holds no data itself; every call goes to the store, so two
/// `DurableSet`s with the same namespace and prefix are the same set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurableSet {
    namespace: &'static str,
    prefix: &'static str,
}

impl DurableSet {
    pub const fn new(namespace: &'static str, prefix: &'static str) -> Self {
        Self { namespace, prefix }
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    fn count_key(&self) -> String {
        format!("{}.c", self.prefix)
    }

    fn slot_key(&self, index: usize) -> String {
        format!("{}.{}", self.prefix, index)
    }

    fn set_len(&self, store: &mut impl StoragePort, len: usize) -> Result<(), StorageError> {
        store.put_int(self.namespace, &self.count_key(), len as i32)
    }

    /// Number of elements; an absent or unreadable counter counts as 0.
    pub fn size(&self, store: &impl StoragePort) -> usize {
        store.get_int(self.namespace, &self.count_key(), 0).max(0) as usize
    }

    /// Element at `index`.  Only meaningful for `index < size()`; an
    /// unreadable slot comes back empty.
    pub fn get(&self, store: &impl StoragePort, index: usize) -> String {
        store.get_string(self.namespace, &self.slot_key(index))
    }

    pub fn exists(&self, store: &impl StoragePort, value: &str) -> bool {
        self.position(store, value).is_some()
    }

    fn position(&self, store: &impl StoragePort, value: &str) -> Option<usize> {
        (0..self.size(store)).find(|&i| self.get(store, i) == value)
    }

    /// Append `value` unless it is already present.
    pub fn add(&self, store: &mut impl StoragePort, value: &str) -> Result<(), StorageError> {
        if self.exists(store, value) {
            return Ok(());
        }
        let len = self.size(store);
        store.put_string(self.namespace, &self.slot_key(len), value)?;
        self.set_len(store, len + 1)
    }

    /// Remove the first occurrence of `value`, keeping survivors in order.
    pub fn remove(&self, store: &mut impl StoragePort, value: &str) -> Result<(), StorageError> {
        let Some(found) = self.position(store, value) else {
            return Ok(());
        };
        let len = self.size(store);
        for i in found..len - 1 {
            let next = self.get(store, i + 1);
            store.put_string(self.namespace, &self.slot_key(i), &next)?;
        }
        self.set_len(store, len - 1)
    }

    /// Forget every element.  Slot entries are left behind as garbage.
    pub fn clear(&self, store: &mut impl StoragePort) -> Result<(), StorageError> {
        self.set_len(store, 0)
    }

    /// Snapshot of all elements in stored order.
    pub fn to_vec(&self, store: &impl StoragePort) -> Vec<String> {
        (0..self.size(store)).map(|i| self.get(store, i)).collect()
    }
}
