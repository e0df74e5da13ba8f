//! Singly-linked bucket representation used while collisions stay rare.

use alloc::boxed::Box;

pub(crate) struct ChainNode<V> {
    pub(crate) hash: u32,
    pub(crate) value: V,
    pub(crate) next: Link<V>,
}

/// A bucket root, or the successor slot of a node.
pub(crate) type Link<V> = Option<Box<ChainNode<V>>>;

/// Result of [`insert`]: the overwritten value, if any, and the chain length
/// after the call.
pub(crate) struct ChainInsert<V> {
    pub(crate) previous: Option<V>,
    pub(crate) len: usize,
}

pub(crate) fn find<'a, V>(
    head: &'a Link<V>,
    hash: u32,
    eq: impl Fn(&V) -> bool,
) -> Option<&'a V> {
    let mut cursor = head.as_deref();
    while let Some(node) = cursor {
        if node.hash == hash && eq(&node.value) {
            return Some(&node.value);
        }
        cursor = node.next.as_deref();
    }
    None
}

pub(crate) fn find_mut<'a, V>(
    head: &'a mut Link<V>,
    hash: u32,
    eq: impl Fn(&V) -> bool,
) -> Option<&'a mut V> {
    let mut cursor = head.as_deref_mut();
    while let Some(node) = cursor {
        if node.hash == hash && eq(&node.value) {
            return Some(&mut node.value);
        }
        cursor = node.next.as_deref_mut();
    }
    None
}

/// Overwrites the entry whose stored value satisfies `eq(stored, &value)`, or
/// appends a new entry at the tail.
pub(crate) fn insert<V>(
    head: &mut Link<V>,
    hash: u32,
    value: V,
    eq: impl Fn(&V, &V) -> bool,
) -> ChainInsert<V> {
    if let Some(slot) = find_mut(head, hash, |stored| eq(stored, &value)) {
        let previous = core::mem::replace(slot, value);
        return ChainInsert {
            previous: Some(previous),
            len: len(head),
        };
    }

    let mut count = 1;
    let mut tail = head;
    while let Some(node) = tail {
        count += 1;
        tail = &mut node.next;
    }
    *tail = Some(Box::new(ChainNode {
        hash,
        value,
        next: None,
    }));

    ChainInsert {
        previous: None,
        len: count,
    }
}

/// Unlinks the first entry matching `hash` and `eq`, splicing its successor
/// into the predecessor (or the bucket root).
pub(crate) fn remove<V>(head: &mut Link<V>, hash: u32, eq: impl Fn(&V) -> bool) -> Option<V> {
    let mut cursor = head;
    loop {
        let hit = match cursor.as_deref() {
            Some(node) => node.hash == hash && eq(&node.value),
            None => return None,
        };
        if hit {
            let removed = cursor.take()?;
            let ChainNode { value, next, .. } = *removed;
            *cursor = next;
            return Some(value);
        }
        cursor = &mut cursor.as_mut()?.next;
    }
}

pub(crate) fn len<V>(head: &Link<V>) -> usize {
    iter(head).count()
}

pub(crate) fn iter<V>(head: &Link<V>) -> Iter<'_, V> {
    Iter {
        cursor: head.as_deref(),
    }
}

/// Borrowing walk from head to tail.
pub(crate) struct Iter<'a, V> {
    cursor: Option<&'a ChainNode<V>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (u32, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.cursor?;
        self.cursor = node.next.as_deref();
        Some((node.hash, &node.value))
    }
}

/// Owning walk from head to tail. Each node is unlinked before it is dropped,
/// so long chains never recurse on drop.
pub(crate) struct Drain<V> {
    cursor: Link<V>,
}

impl<V> Drain<V> {
    pub(crate) fn new(head: Link<V>) -> Self {
        Self { cursor: head }
    }
}

impl<V> Iterator for Drain<V> {
    type Item = (u32, V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.cursor.take()?;
        let ChainNode { hash, value, next } = *node;
        self.cursor = next;
        Some((hash, value))
    }
}

impl<V> Drop for Drain<V> {
    fn drop(&mut self) {
        for _ in self {}
    }
}
