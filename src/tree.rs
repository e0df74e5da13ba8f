//! Bucket representation for collision-heavy tables: a binary search tree
//! ordered by the cached 32-bit hash.
//!
//! Nodes carry no parent links. Every walk (lookup, insertion, removal,
//! traversal, teardown) runs on an explicit cursor or stack, so a skewed tree
//! never recurses.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cmp::Ordering;

use tracing::trace;

/// One hash slot of the tree.
///
/// Values sharing the exact same hash live together in `value` and `twins`;
/// the key comparison only happens inside the slot.
pub(crate) struct TreeNode<V> {
    pub(crate) hash: u32,
    pub(crate) value: V,
    pub(crate) twins: Vec<V>,
    pub(crate) left: Root<V>,
    pub(crate) right: Root<V>,
}

pub(crate) type Root<V> = Option<Box<TreeNode<V>>>;

enum SlotTake<V> {
    Missing,
    Taken(V),
    Emptied,
}

impl<V> TreeNode<V> {
    fn leaf(hash: u32, value: V) -> Box<Self> {
        Box::new(Self {
            hash,
            value,
            twins: Vec::new(),
            left: None,
            right: None,
        })
    }

    fn slot(&self) -> impl Iterator<Item = &V> {
        core::iter::once(&self.value).chain(self.twins.iter())
    }

    fn slot_len(&self) -> usize {
        1 + self.twins.len()
    }

    fn find_in_slot_mut(&mut self, eq: impl Fn(&V) -> bool) -> Option<&mut V> {
        if eq(&self.value) {
            return Some(&mut self.value);
        }
        self.twins.iter_mut().find(|v| eq(v))
    }

    fn upsert(&mut self, value: V, eq: impl Fn(&V, &V) -> bool) -> Option<V> {
        if let Some(slot) = self.find_in_slot_mut(|stored| eq(stored, &value)) {
            return Some(core::mem::replace(slot, value));
        }
        self.twins.push(value);
        None
    }

    fn take_from_slot(&mut self, eq: impl Fn(&V) -> bool) -> SlotTake<V> {
        if eq(&self.value) {
            return match self.twins.pop() {
                Some(twin) => SlotTake::Taken(core::mem::replace(&mut self.value, twin)),
                None => SlotTake::Emptied,
            };
        }
        match self.twins.iter().position(|v| eq(v)) {
            Some(index) => SlotTake::Taken(self.twins.swap_remove(index)),
            None => SlotTake::Missing,
        }
    }

    fn absorb(&mut self, other: Box<Self>) {
        debug_assert!(other.left.is_none() && other.right.is_none());
        let TreeNode { value, twins, .. } = *other;
        self.twins.push(value);
        self.twins.extend(twins);
    }
}

pub(crate) fn find<'a, V>(
    root: &'a Root<V>,
    hash: u32,
    eq: impl Fn(&V) -> bool,
) -> Option<&'a V> {
    let mut cursor = root.as_deref();
    while let Some(node) = cursor {
        cursor = match hash.cmp(&node.hash) {
            Ordering::Less => node.left.as_deref(),
            Ordering::Greater => node.right.as_deref(),
            Ordering::Equal => return node.slot().find(|v| eq(v)),
        };
    }
    None
}

pub(crate) fn find_mut<'a, V>(
    root: &'a mut Root<V>,
    hash: u32,
    eq: impl Fn(&V) -> bool,
) -> Option<&'a mut V> {
    let mut cursor = root.as_deref_mut();
    while let Some(node) = cursor {
        cursor = match hash.cmp(&node.hash) {
            Ordering::Less => node.left.as_deref_mut(),
            Ordering::Greater => node.right.as_deref_mut(),
            Ordering::Equal => return node.find_in_slot_mut(eq),
        };
    }
    None
}

/// Standard BST insertion keyed on `hash`.
///
/// At a node with the same hash, a stored value satisfying
/// `eq(stored, &value)` is overwritten and returned; otherwise the value joins
/// the slot. Without a matching hash a new leaf is attached.
pub(crate) fn insert<V>(
    root: &mut Root<V>,
    hash: u32,
    value: V,
    eq: impl Fn(&V, &V) -> bool,
) -> Option<V> {
    let mut link = root;
    while let Some(node) = link {
        link = match hash.cmp(&node.hash) {
            Ordering::Less => &mut node.left,
            Ordering::Greater => &mut node.right,
            Ordering::Equal => return node.upsert(value, eq),
        };
    }
    *link = Some(TreeNode::leaf(hash, value));
    None
}

/// Removes the value matching `hash` and `eq`.
///
/// When this empties a slot, the node is cut out of the tree and every node of
/// its two subtrees is re-linked under `root`, parents before children. Node
/// identities below the removed slot are not preserved.
pub(crate) fn remove<V>(root: &mut Root<V>, hash: u32, eq: impl Fn(&V) -> bool) -> Option<V> {
    let mut link = &mut *root;
    loop {
        let order = hash.cmp(&link.as_deref()?.hash);
        link = match order {
            Ordering::Less => &mut link.as_mut()?.left,
            Ordering::Greater => &mut link.as_mut()?.right,
            Ordering::Equal => break,
        };
    }

    let taken = link.as_mut()?.take_from_slot(eq);
    match taken {
        SlotTake::Missing => None,
        SlotTake::Taken(value) => Some(value),
        SlotTake::Emptied => {
            let node = link.take()?;
            let TreeNode {
                value, left, right, ..
            } = *node;
            let moved = reattach(root, left, right);
            trace!(hash, moved, "detached tree node");
            Some(value)
        }
    }
}

fn reattach<V>(root: &mut Root<V>, left: Root<V>, right: Root<V>) -> usize {
    let mut stack: Vec<Box<TreeNode<V>>> = Vec::new();
    stack.extend(right);
    stack.extend(left);

    let mut moved = 0;
    while let Some(mut node) = stack.pop() {
        stack.extend(node.right.take());
        stack.extend(node.left.take());
        attach(root, node);
        moved += 1;
    }
    moved
}

fn attach<V>(root: &mut Root<V>, node: Box<TreeNode<V>>) {
    let mut link = root;
    while let Some(existing) = link {
        link = match node.hash.cmp(&existing.hash) {
            Ordering::Less => &mut existing.left,
            Ordering::Greater => &mut existing.right,
            Ordering::Equal => {
                existing.absorb(node);
                return;
            }
        };
    }
    *link = Some(node);
}

pub(crate) fn len<V>(root: &Root<V>) -> usize {
    nodes(root).map(TreeNode::slot_len).sum()
}

fn nodes<V>(root: &Root<V>) -> Nodes<'_, V> {
    Nodes {
        stack: root.as_deref().into_iter().collect(),
    }
}

/// Pre-order walk over nodes: node, left subtree, right subtree.
struct Nodes<'a, V> {
    stack: Vec<&'a TreeNode<V>>,
}

impl<'a, V> Iterator for Nodes<'a, V> {
    type Item = &'a TreeNode<V>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.right.as_deref());
        self.stack.extend(node.left.as_deref());
        Some(node)
    }
}

pub(crate) fn iter<V>(root: &Root<V>) -> Iter<'_, V> {
    Iter {
        nodes: nodes(root),
        hash: 0,
        twins: Default::default(),
    }
}

/// Pre-order walk over `(hash, value)` pairs, slot by slot.
pub(crate) struct Iter<'a, V> {
    nodes: Nodes<'a, V>,
    hash: u32,
    twins: core::slice::Iter<'a, V>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (u32, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(twin) = self.twins.next() {
            return Some((self.hash, twin));
        }
        let node = self.nodes.next()?;
        self.hash = node.hash;
        self.twins = node.twins.iter();
        Some((node.hash, &node.value))
    }
}

/// Owning pre-order walk. Children are unlinked before their parent is
/// dropped, which also makes this the teardown path for whole trees.
pub(crate) struct Drain<V> {
    stack: Vec<Box<TreeNode<V>>>,
    hash: u32,
    twins: alloc::vec::IntoIter<V>,
}

impl<V> Drain<V> {
    pub(crate) fn new(root: Root<V>) -> Self {
        Self {
            stack: root.into_iter().collect(),
            hash: 0,
            twins: Vec::new().into_iter(),
        }
    }
}

impl<V> Iterator for Drain<V> {
    type Item = (u32, V);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(twin) = self.twins.next() {
            return Some((self.hash, twin));
        }
        let mut node = self.stack.pop()?;
        self.stack.extend(node.right.take());
        self.stack.extend(node.left.take());
        let TreeNode {
            hash, value, twins, ..
        } = *node;
        self.hash = hash;
        self.twins = twins.into_iter();
        Some((hash, value))
    }
}

impl<V> Drop for Drain<V> {
    fn drop(&mut self) {
        for _ in self {}
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn same_key(a: &(u32, i32), b: &(u32, i32)) -> bool {
        a.0 == b.0
    }

    /// Builds a tree where each key is its own hash.
    fn build(hashes: &[u32]) -> Root<(u32, i32)> {
        let mut root = None;
        for (i, &hash) in hashes.iter().enumerate() {
            assert!(insert(&mut root, hash, (hash, i as i32), same_key).is_none());
        }
        root
    }

    fn pre_order(root: &Root<(u32, i32)>) -> Vec<u32> {
        iter(root).map(|(_, (k, _))| *k).collect()
    }

    fn assert_ordered(root: &Root<(u32, i32)>) {
        let mut stack = vec![(root.as_deref(), 0u64, u64::MAX)];
        while let Some((node, low, high)) = stack.pop() {
            let Some(node) = node else { continue };
            let hash = node.hash as u64;
            assert!(low <= hash && hash < high, "{hash} outside [{low}, {high})");
            stack.push((node.left.as_deref(), low, hash));
            stack.push((node.right.as_deref(), hash + 1, high));
        }
    }

    #[test]
    fn insert_orders_by_hash() {
        let root = build(&[50, 30, 70, 20, 40, 60, 80]);
        assert_ordered(&root);
        assert_eq!(pre_order(&root), [50, 30, 20, 40, 70, 60, 80]);
        assert_eq!(len(&root), 7);
    }

    #[test]
    fn find_descends_by_hash() {
        let root = build(&[50, 30, 70, 20, 40]);
        for hash in [50, 30, 70, 20, 40] {
            assert_eq!(find(&root, hash, |v| v.0 == hash).map(|v| v.0), Some(hash));
        }
        assert!(find(&root, 45, |v| v.0 == 45).is_none());
        assert!(find(&root, 40, |v| v.0 == 41).is_none());
    }

    #[test]
    fn insert_overwrites_equal_key() {
        let mut root = build(&[50, 30, 70]);
        let previous = insert(&mut root, 30, (30, 99), same_key);
        assert_eq!(previous, Some((30, 1)));
        assert_eq!(len(&root), 3);
        assert_eq!(find(&root, 30, |v| v.0 == 30), Some(&(30, 99)));
    }

    #[test]
    fn colliding_hashes_share_a_slot() {
        let mut root = build(&[50, 30]);
        // Distinct keys 1000 and 2000 both hashing to 30.
        assert!(insert(&mut root, 30, (1000, 7), same_key).is_none());
        assert!(insert(&mut root, 30, (2000, 8), same_key).is_none());
        assert_eq!(len(&root), 4);

        assert_eq!(find(&root, 30, |v| v.0 == 1000), Some(&(1000, 7)));
        assert_eq!(find(&root, 30, |v| v.0 == 2000), Some(&(2000, 8)));
        assert_eq!(find(&root, 30, |v| v.0 == 30), Some(&(30, 1)));

        assert_eq!(insert(&mut root, 30, (2000, 9), same_key), Some((2000, 8)));
        assert_eq!(len(&root), 4);
    }

    #[test]
    fn find_mut_updates_in_place() {
        let mut root = build(&[50, 30, 70]);
        insert(&mut root, 70, (700, 0), same_key);
        if let Some(v) = find_mut(&mut root, 70, |v| v.0 == 700) {
            v.1 = 42;
        }
        assert_eq!(find(&root, 70, |v| v.0 == 700), Some(&(700, 42)));
        assert!(find_mut(&mut root, 71, |v| v.0 == 71).is_none());
    }

    #[test]
    fn remove_leaf() {
        let mut root = build(&[50, 30, 70, 20]);
        assert_eq!(remove(&mut root, 20, |v| v.0 == 20), Some((20, 3)));
        assert_eq!(pre_order(&root), [50, 30, 70]);
    }

    #[test]
    fn remove_inner_node_reattaches_subtrees() {
        let mut root = build(&[50, 30, 70, 20, 40, 60, 80]);
        assert_eq!(remove(&mut root, 30, |v| v.0 == 30), Some((30, 1)));
        assert_ordered(&root);
        assert_eq!(pre_order(&root), [50, 20, 40, 70, 60, 80]);
        for hash in [50, 20, 40, 70, 60, 80] {
            assert!(find(&root, hash, |v| v.0 == hash).is_some());
        }
    }

    #[test]
    fn remove_root() {
        let mut root = build(&[50, 30, 70, 20, 40, 60, 80]);
        assert_eq!(remove(&mut root, 50, |v| v.0 == 50), Some((50, 0)));
        assert_ordered(&root);
        assert_eq!(len(&root), 6);
        assert_eq!(pre_order(&root), [30, 20, 40, 70, 60, 80]);

        let mut single = build(&[5]);
        assert_eq!(remove(&mut single, 5, |v| v.0 == 5), Some((5, 0)));
        assert!(single.is_none());
    }

    #[test]
    fn remove_from_shared_slot_keeps_node() {
        let mut root = build(&[50, 30, 70]);
        insert(&mut root, 30, (1000, 5), same_key);

        assert_eq!(remove(&mut root, 30, |v| v.0 == 30), Some((30, 1)));
        assert_eq!(len(&root), 3);
        assert_eq!(find(&root, 30, |v| v.0 == 1000), Some(&(1000, 5)));
        assert_eq!(pre_order(&root), [50, 1000, 70]);

        assert_eq!(remove(&mut root, 30, |v| v.0 == 1000), Some((1000, 5)));
        assert_eq!(pre_order(&root), [50, 70]);
    }

    #[test]
    fn remove_missing() {
        let mut root = build(&[50, 30, 70]);
        assert_eq!(remove(&mut root, 31, |v| v.0 == 31), None);
        assert_eq!(remove(&mut root, 30, |v| v.0 == 31), None);
        assert_eq!(len(&root), 3);

        let mut empty: Root<(u32, i32)> = None;
        assert_eq!(remove(&mut empty, 1, |_| true), None);
    }

    #[test]
    fn drain_is_pre_order() {
        let mut root = build(&[50, 30, 70, 20]);
        insert(&mut root, 30, (300, 9), same_key);
        let drained: Vec<u32> = Drain::new(root).map(|(_, (k, _))| k).collect();
        assert_eq!(drained, [50, 30, 300, 20, 70]);
    }

    #[test]
    fn skewed_tree_operations_do_not_recurse() {
        let hashes: Vec<u32> = (0..4_000).collect();
        let mut root = build(&hashes);
        assert_eq!(len(&root), 4_000);
        assert!(find(&root, 3_999, |v| v.0 == 3_999).is_some());
        assert_eq!(remove(&mut root, 0, |v| v.0 == 0), Some((0, 0)));
        assert_eq!(len(&root), 3_999);
        drop(Drain::new(root));
    }
}
