//! Separate-chaining hash table keyed by strings.
//!
//! Buckets are a fixed-size array of singly-linked chains. A key lands in
//! bucket `polynomial_hash(key, capacity)`; new keys are pushed to the front
//! of their chain, so within one bucket the most recently inserted entry
//! comes first.
//!
//! The table does not resize unless it was built with
//! [`ResizePolicy::Grow`]. With the default [`ResizePolicy::Fixed`] chains
//! simply get longer as the table fills up.

use std::fmt;
use std::mem;

use log::debug;

use crate::error::{IndexError, IndexResult};

/// Bucket count used by [`KeyedStore::new`].
pub const DEFAULT_CAPACITY: usize = 100;

const HASH_MULTIPLIER: u128 = 31;

/// Whether the bucket array may grow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizePolicy {
    /// Keep the bucket count chosen at construction.
    Fixed,
    /// Double the bucket count once `len / capacity` exceeds the threshold.
    Grow { max_load_factor: f64 },
}

/// Construction parameters for a [`KeyedStore`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreConfig {
    /// Number of buckets.
    pub capacity: usize,
    pub resize: ResizePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            resize: ResizePolicy::Fixed,
        }
    }
}

impl StoreConfig {
    fn validate(&self) -> IndexResult<()> {
        if self.capacity == 0 {
            return Err(IndexError::ZeroCapacity);
        }
        if let ResizePolicy::Grow { max_load_factor } = self.resize {
            if !max_load_factor.is_finite() || max_load_factor <= 0.0 {
                return Err(IndexError::InvalidLoadFactor(max_load_factor));
            }
        }
        Ok(())
    }
}

/// Polynomial rolling hash `acc = acc * 31 + codepoint`, reduced modulo
/// `modulus` after every character.
///
/// `modulus` must be non-zero.
pub fn polynomial_hash(key: &str, modulus: usize) -> usize {
    debug_assert!(modulus > 0);
    let m = modulus as u128;
    let mut acc: u128 = 0;
    for ch in key.chars() {
        acc = (acc * HASH_MULTIPLIER + u128::from(u32::from(ch))) % m;
    }
    acc as usize
}

// =============================================================================
// Chain
// =============================================================================

type Link<V> = Option<Box<ChainNode<V>>>;

struct ChainNode<V> {
    key: String,
    value: V,
    next: Link<V>,
}

/// One bucket: a singly-linked list, most recent entry at the head.
struct Chain<V> {
    head: Link<V>,
}

impl<V> Chain<V> {
    const fn new() -> Self {
        Self { head: None }
    }

    fn get(&self, key: &str) -> Option<&V> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let mut cur = self.head.as_deref_mut();
        while let Some(node) = cur {
            if node.key == key {
                return Some(&mut node.value);
            }
            cur = node.next.as_deref_mut();
        }
        None
    }

    fn push_front(&mut self, key: String, value: V) {
        let next = self.head.take();
        self.head = Some(Box::new(ChainNode { key, value, next }));
    }

    /// Overwrites in place when `key` is present, otherwise prepends.
    fn insert(&mut self, key: String, value: V) -> Option<V> {
        if let Some(slot) = self.get_mut(&key) {
            return Some(mem::replace(slot, value));
        }
        self.push_front(key, value);
        None
    }

    /// Unlinks the first node carrying `key`.
    fn remove(&mut self, key: &str) -> Option<V> {
        let mut link = &mut self.head;
        while link.as_ref().is_some_and(|node| node.key != key) {
            link = &mut link.as_mut()?.next;
        }
        let node = link.take()?;
        let ChainNode { value, next, .. } = *node;
        *link = next;
        Some(value)
    }

    fn len(&self) -> usize {
        self.iter().count()
    }

    /// Empties the chain, returning entries in chain order.
    fn drain(&mut self) -> Vec<(String, V)> {
        let mut out = Vec::new();
        let mut link = self.head.take();
        while let Some(node) = link {
            let ChainNode { key, value, next } = *node;
            out.push((key, value));
            link = next;
        }
        out
    }

    fn iter(&self) -> ChainIter<'_, V> {
        ChainIter {
            next: self.head.as_deref(),
        }
    }
}

impl<V> Drop for Chain<V> {
    fn drop(&mut self) {
        // Unlink iteratively so long chains cannot exhaust the stack.
        let mut link = self.head.take();
        while let Some(mut node) = link {
            link = node.next.take();
        }
    }
}

struct ChainIter<'a, V> {
    next: Option<&'a ChainNode<V>>,
}

impl<'a, V> Iterator for ChainIter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.next.as_deref();
        Some((node.key.as_str(), &node.value))
    }
}

// =============================================================================
// KeyedStore
// =============================================================================

/// String-keyed associative container backed by chained buckets.
pub struct KeyedStore<V> {
    buckets: Vec<Chain<V>>,
    len: usize,
    config: StoreConfig,
}

fn empty_buckets<V>(capacity: usize) -> Vec<Chain<V>> {
    (0..capacity).map(|_| Chain::new()).collect()
}

impl<V> KeyedStore<V> {
    /// Creates an empty store with [`DEFAULT_CAPACITY`] fixed buckets.
    pub fn new() -> Self {
        let config = StoreConfig::default();
        Self {
            buckets: empty_buckets(config.capacity),
            len: 0,
            config,
        }
    }

    /// Creates an empty store with `capacity` fixed buckets.
    pub fn with_capacity(capacity: usize) -> IndexResult<Self> {
        Self::with_config(StoreConfig {
            capacity,
            ..StoreConfig::default()
        })
    }

    pub fn with_config(config: StoreConfig) -> IndexResult<Self> {
        config.validate()?;
        Ok(Self {
            buckets: empty_buckets(config.capacity),
            len: 0,
            config,
        })
    }

    /// Number of distinct keys stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current number of buckets.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.capacity() as f64
    }

    /// Chain length of every bucket, in bucket order.
    pub fn bucket_lengths(&self) -> Vec<usize> {
        self.buckets.iter().map(Chain::len).collect()
    }

    #[inline]
    fn bucket_index(&self, key: &str) -> usize {
        polynomial_hash(key, self.buckets.len())
    }

    /// Stores `value` under `key`.
    ///
    /// An existing entry is overwritten in place and its previous value is
    /// returned; the chain layout and `len` do not change in that case.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        let idx = self.bucket_index(&key);
        let old = self.buckets[idx].insert(key, value);
        if old.is_none() {
            self.len += 1;
            self.grow_if_needed();
        }
        old
    }

    pub fn search(&self, key: &str) -> Option<&V> {
        self.buckets[self.bucket_index(key)].get(key)
    }

    pub fn search_mut(&mut self, key: &str) -> Option<&mut V> {
        let idx = self.bucket_index(key);
        self.buckets[idx].get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.search(key).is_some()
    }

    /// Removes `key`, returning its value, or `None` when it is absent.
    pub fn delete(&mut self, key: &str) -> Option<V> {
        let idx = self.bucket_index(key);
        let removed = self.buckets[idx].remove(key);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// All values, bucket by bucket, most recent first within a bucket.
    pub fn get_all_values(&self) -> Vec<&V> {
        let mut out = Vec::with_capacity(self.len);
        out.extend(self.iter().map(|(_, v)| v));
        out
    }

    /// `(key, value)` pairs in the same order as [`Self::get_all_values`].
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> + '_ {
        self.buckets.iter().flat_map(Chain::iter)
    }

    /// Drops every entry, keeping the current bucket count.
    pub fn clear(&mut self) {
        for chain in &mut self.buckets {
            *chain = Chain::new();
        }
        self.len = 0;
    }

    fn grow_if_needed(&mut self) {
        let ResizePolicy::Grow { max_load_factor } = self.config.resize else {
            return;
        };
        if self.load_factor() > max_load_factor {
            self.rehash(self.capacity() * 2);
        }
    }

    fn rehash(&mut self, new_capacity: usize) {
        debug!(
            "rehashing keyed store: {} -> {} buckets ({} keys)",
            self.capacity(),
            new_capacity,
            self.len
        );
        let old = mem::replace(&mut self.buckets, empty_buckets(new_capacity));
        for mut chain in old {
            // Re-prepend back to front so entries from one chain keep their
            // relative order in the new bucket.
            let mut entries = chain.drain();
            while let Some((key, value)) = entries.pop() {
                let idx = polynomial_hash(&key, new_capacity);
                self.buckets[idx].push_front(key, value);
            }
        }
    }
}

impl<V> Default for KeyedStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for KeyedStore<V> {
    fn clone(&self) -> Self {
        let mut buckets = empty_buckets(self.capacity());
        for (dst, src) in buckets.iter_mut().zip(&self.buckets) {
            let entries: Vec<_> = src.iter().collect();
            for (key, value) in entries.into_iter().rev() {
                dst.push_front(key.to_owned(), value.clone());
            }
        }
        Self {
            buckets,
            len: self.len,
            config: self.config,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for KeyedStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>, V> Extend<(K, V)> for KeyedStore<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}
