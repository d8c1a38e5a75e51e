//! Merge sort and frequency counting over container snapshots.
//!
//! Nothing here touches the containers themselves: callers pass the
//! `Vec<&V>` returned by [`crate::KeyedStore::get_all_values`] or
//! [`crate::OrderedIndex::inorder`] and get a new sequence back.

use std::fmt;

use log::warn;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    #[inline]
    pub fn is_descending(self) -> bool {
        matches!(self, SortOrder::Descending)
    }
}

/// Sorts `items` by the elements themselves. See [`merge_sort_by_key`].
pub fn merge_sort<T>(items: &[T], order: SortOrder) -> Vec<T>
where
    T: Clone + PartialOrd,
{
    merge_sort_by_key(items, |item| item.clone(), order)
}

/// Top-down merge sort returning a new vector.
///
/// The slice is split at `len / 2`; while merging, the head of the left run
/// is taken iff `(key(left) <= key(right)) != descending`. Ascending sorts are
/// therefore stable. A descending sort takes from the right run on ties, so
/// equal keys come out in reverse input order per merge step.
pub fn merge_sort_by_key<T, K, F>(items: &[T], key: F, order: SortOrder) -> Vec<T>
where
    T: Clone,
    K: PartialOrd,
    F: Fn(&T) -> K,
{
    sort_slice(items, &key, order.is_descending())
}

fn sort_slice<T, K, F>(items: &[T], key: &F, descending: bool) -> Vec<T>
where
    T: Clone,
    K: PartialOrd,
    F: Fn(&T) -> K,
{
    if items.len() <= 1 {
        return items.to_vec();
    }
    let (left, right) = items.split_at(items.len() / 2);
    let left = sort_slice(left, key, descending);
    let right = sort_slice(right, key, descending);
    merge(left, right, key, descending)
}

fn merge<T, K, F>(left: Vec<T>, right: Vec<T>, key: &F, descending: bool) -> Vec<T>
where
    K: PartialOrd,
    F: Fn(&T) -> K,
{
    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => (key(l) <= key(r)) != descending,
            _ => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        out.extend(next);
    }
    out.extend(left);
    out.extend(right);
    out
}

/// An attribute value extracted from a record by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldValue {
    /// Attribute exists but holds no value.
    Empty,
    Int(i64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => f.write_str("-"),
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Empty, Into::into)
    }
}

/// Name-based attribute lookup used by [`count_frequencies`].
pub trait Fields {
    /// Returns `None` when the record has no attribute called `name`.
    fn field(&self, name: &str) -> Option<FieldValue>;
}

impl<T: Fields + ?Sized> Fields for &T {
    fn field(&self, name: &str) -> Option<FieldValue> {
        (**self).field(name)
    }
}

/// Counts distinct values of attribute `name`, in first-seen order.
///
/// Objects without the attribute are skipped with a warning.
pub fn count_frequencies<T: Fields>(objects: &[T], name: &str) -> Vec<(FieldValue, usize)> {
    count_frequencies_by(objects, |obj| {
        let value = obj.field(name);
        if value.is_none() {
            warn!("frequency count: object has no attribute {name:?}, skipped");
        }
        value
    })
}

/// Counts the keys produced by `key`, in first-seen order. `None` keys are
/// skipped.
///
/// The tally is an association list probed linearly, which keeps discovery
/// order without any hashing.
pub fn count_frequencies_by<T, K, F>(objects: &[T], mut key: F) -> Vec<(K, usize)>
where
    K: PartialEq,
    F: FnMut(&T) -> Option<K>,
{
    let mut tally: Vec<(K, usize)> = Vec::new();
    for obj in objects {
        let Some(k) = key(obj) else {
            continue;
        };
        match tally.iter_mut().find(|(seen, _)| *seen == k) {
            Some((_, count)) => *count += 1,
            None => tally.push((k, 1)),
        }
    }
    tally
}
