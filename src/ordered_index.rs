//! AVL tree keyed by small ordered keys (loan ids).
//!
//! Insertion rebalances every ancestor on the way back up, picking the
//! rotation by comparing the inserted key with the heavy child's key.
//! Deletion recomputes heights on the return path; whether it also rotates
//! is controlled by [`DeletePolicy`].

use std::cmp::Ordering;
use std::fmt;
use std::mem;

use log::trace;

use crate::error::{IndexError, IndexResult};

/// What deletion does on the way back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Recompute heights only. The tree stays a valid BST, but heavy
    /// deletion can leave nodes with a balance factor beyond ±1.
    #[default]
    HeightOnly,
    /// Recompute heights and rotate wherever the balance factor exceeds ±1.
    Rebalance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexConfig {
    pub delete_policy: DeletePolicy,
}

type Tree<K, V> = Option<Box<Node<K, V>>>;

#[derive(Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    height: usize,
    left: Tree<K, V>,
    right: Tree<K, V>,
}

#[inline]
fn height<K, V>(tree: &Tree<K, V>) -> usize {
    tree.as_ref().map_or(0, |n| n.height)
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            height: 1,
            left: None,
            right: None,
        }
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }

    fn balance_factor(&self) -> isize {
        height(&self.left) as isize - height(&self.right) as isize
    }
}

fn rotate_right<K, V>(mut y: Box<Node<K, V>>) -> Box<Node<K, V>> {
    let Some(mut x) = y.left.take() else {
        return y;
    };
    y.left = x.right.take();
    y.update_height();
    x.right = Some(y);
    x.update_height();
    x
}

fn rotate_left<K, V>(mut x: Box<Node<K, V>>) -> Box<Node<K, V>> {
    let Some(mut y) = x.right.take() else {
        return x;
    };
    x.right = y.left.take();
    x.update_height();
    y.left = Some(x);
    y.update_height();
    y
}

/// Balance-factor driven rebalance, used after deletion.
fn rebalance<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    node.update_height();
    let bf = node.balance_factor();
    if bf > 1 {
        if node.left.as_ref().is_some_and(|l| l.balance_factor() < 0) {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    } else if bf < -1 {
        if node.right.as_ref().is_some_and(|r| r.balance_factor() > 0) {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }
    node
}

/// Ordered associative container with O(log n) insert and lookup.
pub struct OrderedIndex<K, V> {
    root: Tree<K, V>,
    len: usize,
    config: IndexConfig,
}

impl<K: Ord + Copy + fmt::Debug, V> OrderedIndex<K, V> {
    pub fn new() -> Self {
        Self::with_config(IndexConfig::default())
    }

    pub fn with_config(config: IndexConfig) -> Self {
        Self {
            root: None,
            len: 0,
            config,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Height of the root; 0 for an empty tree.
    #[inline]
    pub fn height(&self) -> usize {
        height(&self.root)
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Inserts `value` under `key`, returning the previous value if the key
    /// was already present. Overwriting leaves the tree shape untouched.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (root, old) = Self::insert_node(self.root.take(), key, value);
        self.root = Some(root);
        if old.is_none() {
            self.len += 1;
        }
        old
    }

    fn insert_node(tree: Tree<K, V>, key: K, value: V) -> (Box<Node<K, V>>, Option<V>) {
        let mut node = match tree {
            Some(n) => n,
            None => return (Box::new(Node::new(key, value)), None),
        };
        match key.cmp(&node.key) {
            Ordering::Less => {
                let (child, old) = Self::insert_node(node.left.take(), key, value);
                node.left = Some(child);
                if old.is_some() {
                    return (node, old);
                }
            }
            Ordering::Greater => {
                let (child, old) = Self::insert_node(node.right.take(), key, value);
                node.right = Some(child);
                if old.is_some() {
                    return (node, old);
                }
            }
            Ordering::Equal => {
                let old = mem::replace(&mut node.value, value);
                return (node, Some(old));
            }
        }
        (Self::rebalance_insert(node, key), None)
    }

    fn rebalance_insert(mut node: Box<Node<K, V>>, key: K) -> Box<Node<K, V>> {
        node.update_height();
        let balance = node.balance_factor();
        if balance > 1 {
            if let Some(left_key) = node.left.as_ref().map(|l| l.key) {
                if key < left_key {
                    trace!("LL rotation at {:?}", node.key);
                    return rotate_right(node);
                }
                if key > left_key {
                    trace!("LR rotation at {:?}", node.key);
                    node.left = node.left.take().map(rotate_left);
                    return rotate_right(node);
                }
            }
        } else if balance < -1 {
            if let Some(right_key) = node.right.as_ref().map(|r| r.key) {
                if key > right_key {
                    trace!("RR rotation at {:?}", node.key);
                    return rotate_left(node);
                }
                if key < right_key {
                    trace!("RL rotation at {:?}", node.key);
                    node.right = node.right.take().map(rotate_right);
                    return rotate_left(node);
                }
            }
        }
        node
    }

    pub fn search(&self, key: &K) -> Option<&V> {
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            match key.cmp(&node.key) {
                Ordering::Less => cur = node.left.as_deref(),
                Ordering::Greater => cur = node.right.as_deref(),
                Ordering::Equal => return Some(&node.value),
            }
        }
        None
    }

    pub fn search_mut(&mut self, key: &K) -> Option<&mut V> {
        let mut cur = self.root.as_deref_mut();
        while let Some(node) = cur {
            match key.cmp(&node.key) {
                Ordering::Less => cur = node.left.as_deref_mut(),
                Ordering::Greater => cur = node.right.as_deref_mut(),
                Ordering::Equal => return Some(&mut node.value),
            }
        }
        None
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    /// Removes `key`, returning its value, or `None` when it is absent.
    pub fn delete(&mut self, key: &K) -> Option<V> {
        let policy = self.config.delete_policy;
        let (root, removed) = Self::delete_node(self.root.take(), key, policy);
        self.root = root;
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    fn delete_node(tree: Tree<K, V>, key: &K, policy: DeletePolicy) -> (Tree<K, V>, Option<V>) {
        let Some(mut node) = tree else {
            return (None, None);
        };
        let removed = match key.cmp(&node.key) {
            Ordering::Less => {
                let (child, removed) = Self::delete_node(node.left.take(), key, policy);
                node.left = child;
                removed
            }
            Ordering::Greater => {
                let (child, removed) = Self::delete_node(node.right.take(), key, policy);
                node.right = child;
                removed
            }
            Ordering::Equal => match (node.left.take(), node.right.take()) {
                (None, right) => {
                    let Node { value, .. } = *node;
                    return (right, Some(value));
                }
                (left, None) => {
                    let Node { value, .. } = *node;
                    return (left, Some(value));
                }
                (Some(left), Some(right)) => {
                    // Two children: pull up the in-order successor.
                    let (succ_key, succ_value, rest) = Self::take_min(right, policy);
                    node.left = Some(left);
                    node.right = rest;
                    node.key = succ_key;
                    Some(mem::replace(&mut node.value, succ_value))
                }
            },
        };
        if removed.is_none() {
            return (Some(node), None);
        }
        (Some(Self::fix_after_delete(node, policy)), removed)
    }

    /// Detaches the minimum node of `node`'s subtree.
    fn take_min(mut node: Box<Node<K, V>>, policy: DeletePolicy) -> (K, V, Tree<K, V>) {
        match node.left.take() {
            None => {
                let Node {
                    key, value, right, ..
                } = *node;
                (key, value, right)
            }
            Some(left) => {
                let (key, value, rest) = Self::take_min(left, policy);
                node.left = rest;
                (key, value, Some(Self::fix_after_delete(node, policy)))
            }
        }
    }

    fn fix_after_delete(mut node: Box<Node<K, V>>, policy: DeletePolicy) -> Box<Node<K, V>> {
        match policy {
            DeletePolicy::HeightOnly => {
                node.update_height();
                node
            }
            DeletePolicy::Rebalance => rebalance(node),
        }
    }

    /// Values in ascending key order.
    pub fn inorder(&self) -> Vec<&V> {
        let mut out = Vec::with_capacity(self.len);
        out.extend(self.iter().map(|(_, v)| v));
        out
    }

    pub fn keys(&self) -> Vec<K> {
        self.iter().map(|(k, _)| *k).collect()
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter {
            stack: Vec::with_capacity(self.height()),
        };
        iter.push_left(self.root.as_deref());
        iter
    }

    /// Visits every entry in ascending key order with mutable access to the
    /// value. Keys are not mutable, so the ordering cannot be broken.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&K, &mut V)) {
        fn visit<K, V>(tree: &mut Tree<K, V>, f: &mut impl FnMut(&K, &mut V)) {
            if let Some(node) = tree {
                visit(&mut node.left, f);
                f(&node.key, &mut node.value);
                visit(&mut node.right, f);
            }
        }
        visit(&mut self.root, &mut f);
    }

    pub fn min_key(&self) -> Option<K> {
        let mut node = self.root.as_deref()?;
        while let Some(left) = node.left.as_deref() {
            node = left;
        }
        Some(node.key)
    }

    pub fn max_key(&self) -> Option<K> {
        let mut node = self.root.as_deref()?;
        while let Some(right) = node.right.as_deref() {
            node = right;
        }
        Some(node.key)
    }

    /// Verifies key ordering, stored heights and the entry count.
    pub fn check_structure(&self) -> IndexResult<()> {
        let count = Self::check_subtree(&self.root, None, None, false)?.1;
        if count != self.len {
            return Err(IndexError::InvariantViolation {
                key: "<root>".into(),
                detail: format!("tree holds {count} nodes but len is {}", self.len),
            });
        }
        Ok(())
    }

    /// [`Self::check_structure`] plus the AVL balance condition at every node.
    pub fn check_invariants(&self) -> IndexResult<()> {
        self.check_structure()?;
        Self::check_subtree(&self.root, None, None, true).map(|_| ())
    }

    /// Returns `(height, node count)` of a verified subtree.
    fn check_subtree(
        tree: &Tree<K, V>,
        lower: Option<K>,
        upper: Option<K>,
        balanced: bool,
    ) -> IndexResult<(usize, usize)> {
        let Some(node) = tree else {
            return Ok((0, 0));
        };
        if lower.is_some_and(|lo| node.key <= lo) || upper.is_some_and(|hi| node.key >= hi) {
            return Err(IndexError::invariant(node.key, "key out of search-tree order"));
        }
        let (lh, lc) = Self::check_subtree(&node.left, lower, Some(node.key), balanced)?;
        let (rh, rc) = Self::check_subtree(&node.right, Some(node.key), upper, balanced)?;
        let h = 1 + lh.max(rh);
        if node.height != h {
            return Err(IndexError::invariant(
                node.key,
                format!("stored height {} but subtree height is {h}", node.height),
            ));
        }
        if balanced && lh.abs_diff(rh) > 1 {
            return Err(IndexError::invariant(
                node.key,
                format!("balance factor {}", lh as isize - rh as isize),
            ));
        }
        Ok((h, lc + rc + 1))
    }
}

impl<K: Ord + Copy + fmt::Debug, V> Default for OrderedIndex<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> Clone for OrderedIndex<K, V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            len: self.len,
            config: self.config,
        }
    }
}

impl<K: Ord + Copy + fmt::Debug, V: fmt::Debug> fmt::Debug for OrderedIndex<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord + Copy + fmt::Debug, V> Extend<(K, V)> for OrderedIndex<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

/// In-order iterator over an [`OrderedIndex`].
pub struct Iter<'a, K, V> {
    stack: Vec<&'a Node<K, V>>,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn push_left(&mut self, mut tree: Option<&'a Node<K, V>>) {
        while let Some(node) = tree {
            self.stack.push(node);
            tree = node.left.as_deref();
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        Some((&node.key, &node.value))
    }
}
