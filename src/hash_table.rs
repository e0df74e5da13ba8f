use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use tracing::debug;

use crate::chain;
use crate::config::Config;
use crate::config::DEFAULT_CAPACITY;
use crate::error::Result;
use crate::hashing::bucket_index;
use crate::tree;

/// The bucket representation a table is currently using.
///
/// The representation is table-wide: every bucket is a chain, or every
/// bucket is a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// A chained table holding no entries, as built by a constructor or left
    /// by `clear()`.
    Empty,
    /// Every bucket is a singly-linked chain.
    Chain,
    /// Every bucket is a binary search tree ordered by hash.
    Tree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repr {
    Chain,
    Tree,
}

enum Buckets<V> {
    Chain(Vec<chain::Link<V>>),
    Tree(Vec<tree::Root<V>>),
}

impl<V> Buckets<V> {
    fn empty(repr: Repr, capacity: usize) -> Self {
        match repr {
            Repr::Chain => Buckets::Chain((0..capacity).map(|_| None).collect()),
            Repr::Tree => Buckets::Tree((0..capacity).map(|_| None).collect()),
        }
    }

    fn repr(&self) -> Repr {
        match self {
            Buckets::Chain(_) => Repr::Chain,
            Buckets::Tree(_) => Repr::Tree,
        }
    }
}

/// Snapshot of a table's shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TableStats {
    /// Number of entries in the table
    pub len: usize,
    /// Number of buckets
    pub capacity: usize,
    /// Active bucket representation
    pub mode: Mode,
    /// Number of buckets holding at least one entry
    pub occupied_buckets: usize,
    /// Entry count of the fullest bucket
    pub longest_bucket: usize,
    /// Load (len / capacity)
    pub load: f64,
    /// Bucket utilization (occupied_buckets / capacity)
    pub bucket_utilization: f64,
}

impl TableStats {
    /// Pretty-print the statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Statistics ===");
        println!("Mode: {:?}", self.mode);
        println!(
            "Population: {}/{} buckets ({:.2}% load)",
            self.len,
            self.capacity,
            self.load * 100.0
        );
        println!(
            "Bucket Usage: {}/{} ({:.2}% utilization)",
            self.occupied_buckets,
            self.capacity,
            self.bucket_utilization * 100.0
        );
        println!("Longest Bucket: {} entries", self.longest_bucket);
    }
}

/// A hash table whose buckets are linked chains while collisions stay rare
/// and hash-ordered binary search trees once they pile up.
///
/// `HashTable<V>` stores values of type `V`. Like a raw hash table, it never
/// hashes anything itself: every operation takes the 32-bit hash of the value
/// and an equality predicate. [`HashMap`](crate::HashMap) layers keys and a
/// hasher on top.
///
/// ## Growth and representation
///
/// - The table doubles its bucket count as soon as an insertion pushes the
///   entry count above `capacity * load_factor`. Every entry is re-indexed
///   with its cached hash; nothing is rehashed.
/// - When an insertion makes a bucket reach
///   [`treeify_threshold`](Config::treeify_threshold) entries, every bucket is
///   rebuilt as a tree. When the longest bucket drops to
///   [`untreeify_threshold`](Config::untreeify_threshold) or below, every
///   bucket is rebuilt as a chain.
/// - The bucket count never shrinks, except that `clear()` returns to the
///   default of 16.
///
/// ## Example
///
/// ```rust
/// use adaptive_hash::HashTable;
/// use adaptive_hash::Mode;
///
/// let mut table: HashTable<(u32, &str)> = HashTable::new();
///
/// // With 16 buckets, every multiple of 16 lands in bucket 0.
/// for key in 0..8u32 {
///     table.insert(key * 16, (key * 16, "collides"), |a, b| a.0 == b.0);
/// }
/// assert_eq!(table.mode(), Mode::Tree);
/// assert_eq!(table.find(32, |v| v.0 == 32), Some(&(32, "collides")));
/// ```
pub struct HashTable<V> {
    buckets: Buckets<V>,
    lens: Vec<usize>,
    /// Buckets longer than the untreeify threshold.
    crowded: usize,
    len: usize,
    config: Config,
}

impl<V> Debug for HashTable<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashTable")
            .field("mode", &self.mode())
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("longest_bucket", &self.longest_bucket())
            .field("bucket_lens", &self.lens)
            .finish()
    }
}

impl<V> Clone for HashTable<V>
where
    V: Clone,
{
    fn clone(&self) -> Self {
        let mut table = Self::empty(self.config, self.capacity(), self.buckets.repr());

        // Replaying in iteration order rebuilds chains in the same order and
        // trees with the same shape.
        let mut entries = self.iter();
        while let Some((hash, value)) = entries.next_entry() {
            table.place(hash, value.clone());
        }
        table.len = self.len;

        debug_assert_eq!(table.crowded, self.crowded);
        debug_assert_eq!(table.lens, self.lens);
        table
    }
}

impl<V> Drop for HashTable<V> {
    fn drop(&mut self) {
        let buckets = core::mem::replace(&mut self.buckets, Buckets::Chain(Vec::new()));
        drop(Entries::new(buckets));
    }
}

impl<V> Default for HashTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> HashTable<V> {
    /// Creates an empty table with the default configuration: 16 buckets,
    /// load factor 0.75, treeify at 8, untreeify at 6.
    pub fn new() -> Self {
        Self::from_valid_config(Config::default())
    }

    /// Creates an empty table with exactly `capacity` buckets (at least one)
    /// and the default load factor and thresholds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use adaptive_hash::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::with_capacity(100);
    /// assert_eq!(table.capacity(), 100);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_valid_config(Config::default().with_capacity(capacity.max(1)))
    }

    /// Creates an empty table from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) when the
    /// configuration fails [`Config::validate`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use adaptive_hash::Config;
    /// # use adaptive_hash::HashTable;
    /// #
    /// let config = Config::default().with_capacity(10).with_load_factor(0.5);
    /// let table: HashTable<u64> = HashTable::with_config(config).unwrap();
    /// assert_eq!(table.capacity(), 10);
    ///
    /// assert!(HashTable::<u64>::with_config(Config::default().with_capacity(0)).is_err());
    /// ```
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: Config) -> Self {
        Self::empty(config, config.capacity, Repr::Chain)
    }

    fn empty(config: Config, capacity: usize, repr: Repr) -> Self {
        Self {
            buckets: Buckets::empty(repr, capacity),
            lens: vec![0; capacity],
            crowded: 0,
            len: 0,
            config,
        }
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of buckets.
    pub fn capacity(&self) -> usize {
        self.lens.len()
    }

    /// Returns the configuration the table was built with.
    ///
    /// `config().capacity` is the initial bucket count, which the table may
    /// have outgrown; see [`capacity`](Self::capacity).
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the load factor above which the table grows.
    pub fn load_factor(&self) -> f32 {
        self.config.load_factor
    }

    /// Returns the active bucket representation.
    pub fn mode(&self) -> Mode {
        match self.buckets {
            Buckets::Tree(_) => Mode::Tree,
            Buckets::Chain(_) if self.len == 0 => Mode::Empty,
            Buckets::Chain(_) => Mode::Chain,
        }
    }

    /// Returns the entry count of the fullest bucket.
    pub fn longest_bucket(&self) -> usize {
        self.lens.iter().copied().max().unwrap_or(0)
    }

    /// Counts entries by walking every bucket, without trusting the cached
    /// length.
    pub fn reachable_len(&self) -> usize {
        match &self.buckets {
            Buckets::Chain(chains) => chains.iter().map(chain::len).sum(),
            Buckets::Tree(trees) => trees.iter().map(tree::len).sum(),
        }
    }

    /// Returns statistics describing the current shape of the table.
    pub fn stats(&self) -> TableStats {
        let capacity = self.capacity();
        let occupied_buckets = self.lens.iter().filter(|&&len| len > 0).count();
        TableStats {
            len: self.len,
            capacity,
            mode: self.mode(),
            occupied_buckets,
            longest_bucket: self.longest_bucket(),
            load: self.len as f64 / capacity as f64,
            bucket_utilization: occupied_buckets as f64 / capacity as f64,
        }
    }

    /// Returns an iterator over all values in the table.
    ///
    /// The iteration order is unspecified and changes whenever the table
    /// resizes or converts.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use adaptive_hash::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.insert(1, "one", |a, b| a == b);
    /// table.insert(2, "two", |a, b| a == b);
    ///
    /// let mut values: Vec<_> = table.iter().copied().collect();
    /// values.sort();
    /// assert_eq!(values, ["one", "two"]);
    /// ```
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            buckets: match &self.buckets {
                Buckets::Chain(chains) => BucketIter::Chain(chains.iter()),
                Buckets::Tree(trees) => BucketIter::Tree(trees.iter()),
            },
            current: Cursor::Idle,
            remaining: self.len,
        }
    }

    /// Removes every value from the table and returns them as an owning
    /// iterator.
    ///
    /// The table keeps its bucket count and is left in [`Mode::Empty`].
    /// Values not consumed from the iterator are dropped with it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use adaptive_hash::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.insert(7, 7u64, |a, b| a == b);
    ///
    /// let values: Vec<u64> = table.drain().collect();
    /// assert!(table.is_empty());
    /// assert_eq!(values, [7]);
    /// ```
    pub fn drain(&mut self) -> Drain<V> {
        let capacity = self.capacity();
        let buckets = core::mem::replace(&mut self.buckets, Buckets::empty(Repr::Chain, capacity));
        let remaining = core::mem::replace(&mut self.len, 0);
        self.lens.fill(0);
        self.crowded = 0;
        Drain {
            entries: Entries::new(buckets),
            remaining,
        }
    }

    /// Removes every value and returns the table to the default bucket count.
    ///
    /// A capacity chosen at construction is not restored; the load factor and
    /// thresholds are kept.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use adaptive_hash::HashTable;
    /// # use adaptive_hash::Mode;
    /// #
    /// let mut table = HashTable::with_capacity(64);
    /// table.insert(1, 1u8, |a, b| a == b);
    ///
    /// table.clear();
    /// assert!(table.is_empty());
    /// assert_eq!(table.capacity(), 16);
    /// assert_eq!(table.mode(), Mode::Empty);
    /// ```
    pub fn clear(&mut self) {
        let buckets = core::mem::replace(
            &mut self.buckets,
            Buckets::empty(Repr::Chain, DEFAULT_CAPACITY),
        );
        drop(Entries::new(buckets));
        self.lens.clear();
        self.lens.resize(DEFAULT_CAPACITY, 0);
        self.crowded = 0;
        self.len = 0;
    }

    /// Grows the table, if needed, so that `additional` more entries fit
    /// without another resize.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use adaptive_hash::HashTable;
    /// #
    /// let mut table: HashTable<u32> = HashTable::new();
    /// table.reserve(100);
    /// assert!(table.capacity() as f32 * table.load_factor() >= 100.0);
    /// ```
    pub fn reserve(&mut self, additional: usize) {
        let required = self.len.saturating_add(additional);
        let mut capacity = self.capacity();
        while self.config.max_len(capacity) < required {
            match capacity.checked_mul(2) {
                Some(doubled) => capacity = doubled,
                None => break,
            }
        }
        if capacity != self.capacity() {
            self.resize(capacity);
        }
    }

    /// Finds the value with the given hash satisfying `eq`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use adaptive_hash::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.insert(42, (42u32, "answer"), |a, b| a.0 == b.0);
    ///
    /// assert_eq!(table.find(42, |v| v.0 == 42), Some(&(42, "answer")));
    /// assert_eq!(table.find(43, |v| v.0 == 43), None);
    /// ```
    pub fn find(&self, hash: u32, eq: impl Fn(&V) -> bool) -> Option<&V> {
        let index = self.index(hash);
        match &self.buckets {
            Buckets::Chain(chains) => chain::find(&chains[index], hash, eq),
            Buckets::Tree(trees) => tree::find(&trees[index], hash, eq),
        }
    }

    /// Finds the value with the given hash satisfying `eq`, for in-place
    /// modification.
    ///
    /// The part of the value `eq` inspects must not be changed through the
    /// returned reference.
    pub fn find_mut(&mut self, hash: u32, eq: impl Fn(&V) -> bool) -> Option<&mut V> {
        let index = self.index(hash);
        match &mut self.buckets {
            Buckets::Chain(chains) => chain::find_mut(&mut chains[index], hash, eq),
            Buckets::Tree(trees) => tree::find_mut(&mut trees[index], hash, eq),
        }
    }

    /// Inserts `value` under `hash`.
    ///
    /// `eq(stored, &value)` decides whether a stored value is the same entry;
    /// if one is found it is replaced and returned. Otherwise the value is
    /// added, after which the table may grow and then may switch
    /// representation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use adaptive_hash::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// let same_key = |a: &(u32, i32), b: &(u32, i32)| a.0 == b.0;
    ///
    /// assert_eq!(table.insert(5, (5, 1), same_key), None);
    /// assert_eq!(table.insert(5, (5, 2), same_key), Some((5, 1)));
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn insert(&mut self, hash: u32, value: V, eq: impl Fn(&V, &V) -> bool) -> Option<V> {
        let index = self.index(hash);
        match &mut self.buckets {
            Buckets::Chain(chains) => {
                let outcome = chain::insert(&mut chains[index], hash, value, eq);
                if outcome.previous.is_some() {
                    return outcome.previous;
                }
                debug_assert_eq!(outcome.len, self.lens[index] + 1);
            }
            Buckets::Tree(trees) => {
                if let Some(previous) = tree::insert(&mut trees[index], hash, value, eq) {
                    return Some(previous);
                }
            }
        }

        self.len += 1;
        self.grow_bucket(index);

        if self.len > self.config.max_len(self.capacity()) {
            self.resize(self.capacity().saturating_mul(2));
        } else if self.buckets.repr() == Repr::Chain
            && self.lens[index] >= self.config.treeify_threshold
        {
            self.convert(Repr::Tree);
        }
        None
    }

    /// Removes and returns the value with the given hash satisfying `eq`.
    ///
    /// A tree table whose longest bucket drops to the untreeify threshold
    /// converts back to chains before this returns.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use adaptive_hash::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.insert(42, 42u64, |a, b| a == b);
    ///
    /// assert_eq!(table.remove(42, |&n| n == 42), Some(42));
    /// assert!(table.is_empty());
    /// assert_eq!(table.remove(42, |&n| n == 42), None);
    /// ```
    pub fn remove(&mut self, hash: u32, eq: impl Fn(&V) -> bool) -> Option<V> {
        if self.len == 0 {
            return None;
        }

        let index = self.index(hash);
        let removed = match &mut self.buckets {
            Buckets::Chain(chains) => chain::remove(&mut chains[index], hash, eq),
            Buckets::Tree(trees) => tree::remove(&mut trees[index], hash, eq),
        }?;

        self.len -= 1;
        self.shrink_bucket(index);

        if self.buckets.repr() == Repr::Tree && self.crowded == 0 {
            self.convert(Repr::Chain);
        }
        Some(removed)
    }

    #[inline(always)]
    fn index(&self, hash: u32) -> usize {
        bucket_index(hash, self.capacity())
    }

    fn grow_bucket(&mut self, index: usize) {
        self.lens[index] += 1;
        if self.lens[index] == self.config.untreeify_threshold + 1 {
            self.crowded += 1;
        }
    }

    fn shrink_bucket(&mut self, index: usize) {
        if self.lens[index] == self.config.untreeify_threshold + 1 {
            self.crowded -= 1;
        }
        self.lens[index] -= 1;
    }

    fn resize(&mut self, capacity: usize) {
        debug!(
            from = self.capacity(),
            to = capacity,
            len = self.len,
            "resizing table"
        );
        self.rebuild(capacity, self.buckets.repr());
        self.settle_mode();
    }

    /// Re-evaluates the representation against the whole table.
    fn settle_mode(&mut self) {
        match self.buckets.repr() {
            Repr::Chain if self.longest_bucket() >= self.config.treeify_threshold => {
                self.convert(Repr::Tree)
            }
            Repr::Tree if self.crowded == 0 => self.convert(Repr::Chain),
            _ => {}
        }
    }

    fn convert(&mut self, repr: Repr) {
        debug!(
            from = ?self.mode(),
            to = ?repr,
            longest_bucket = self.longest_bucket(),
            len = self.len,
            "converting bucket representation"
        );
        self.rebuild(self.capacity(), repr);
    }

    /// Moves every entry, bucket by bucket in index order, into a fresh
    /// bucket array of the given size and representation.
    fn rebuild(&mut self, capacity: usize, repr: Repr) {
        let old = core::mem::replace(&mut self.buckets, Buckets::empty(repr, capacity));
        self.lens.clear();
        self.lens.resize(capacity, 0);
        self.crowded = 0;

        for (hash, value) in Entries::new(old) {
            self.place(hash, value);
        }
        debug_assert_eq!(self.lens.iter().sum::<usize>(), self.len);
    }

    /// Adds an entry known to be absent, through the active representation's
    /// insertion. Does not touch `len`.
    fn place(&mut self, hash: u32, value: V) {
        let index = self.index(hash);
        match &mut self.buckets {
            Buckets::Chain(chains) => {
                chain::insert(&mut chains[index], hash, value, |_, _| false);
            }
            Buckets::Tree(trees) => {
                tree::insert(&mut trees[index], hash, value, |_, _| false);
            }
        }
        self.grow_bucket(index);
    }
}

impl<'a, V> IntoIterator for &'a HashTable<V> {
    type Item = &'a V;
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V> IntoIterator for HashTable<V> {
    type Item = V;
    type IntoIter = Drain<V>;

    fn into_iter(mut self) -> Self::IntoIter {
        self.drain()
    }
}

enum BucketIter<'a, V> {
    Chain(core::slice::Iter<'a, chain::Link<V>>),
    Tree(core::slice::Iter<'a, tree::Root<V>>),
}

enum Cursor<'a, V> {
    Idle,
    Chain(chain::Iter<'a, V>),
    Tree(tree::Iter<'a, V>),
}

/// An iterator over the values of a [`HashTable`].
///
/// Buckets are visited in index order; chains head to tail, trees in
/// pre-order.
pub struct Iter<'a, V> {
    buckets: BucketIter<'a, V>,
    current: Cursor<'a, V>,
    remaining: usize,
}

impl<'a, V> Iter<'a, V> {
    fn next_entry(&mut self) -> Option<(u32, &'a V)> {
        loop {
            let entry = match &mut self.current {
                Cursor::Idle => None,
                Cursor::Chain(entries) => entries.next(),
                Cursor::Tree(entries) => entries.next(),
            };
            if entry.is_some() {
                self.remaining = self.remaining.saturating_sub(1);
                return entry;
            }

            self.current = match &mut self.buckets {
                BucketIter::Chain(chains) => {
                    Cursor::Chain(chain::iter(chains.find(|head| head.is_some())?))
                }
                BucketIter::Tree(trees) => {
                    Cursor::Tree(tree::iter(trees.find(|root| root.is_some())?))
                }
            };
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

enum OwnedBuckets<V> {
    Chain(alloc::vec::IntoIter<chain::Link<V>>),
    Tree(alloc::vec::IntoIter<tree::Root<V>>),
}

enum OwnedCursor<V> {
    Idle,
    Chain(chain::Drain<V>),
    Tree(tree::Drain<V>),
}

/// Owning walk over `(hash, value)` pairs of a detached bucket array. Dropping
/// it tears down whatever is left without recursion.
struct Entries<V> {
    buckets: OwnedBuckets<V>,
    current: OwnedCursor<V>,
}

impl<V> Entries<V> {
    fn new(buckets: Buckets<V>) -> Self {
        Self {
            buckets: match buckets {
                Buckets::Chain(chains) => OwnedBuckets::Chain(chains.into_iter()),
                Buckets::Tree(trees) => OwnedBuckets::Tree(trees.into_iter()),
            },
            current: OwnedCursor::Idle,
        }
    }
}

impl<V> Iterator for Entries<V> {
    type Item = (u32, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match &mut self.current {
                OwnedCursor::Idle => None,
                OwnedCursor::Chain(entries) => entries.next(),
                OwnedCursor::Tree(entries) => entries.next(),
            };
            if entry.is_some() {
                return entry;
            }

            self.current = match &mut self.buckets {
                OwnedBuckets::Chain(chains) => {
                    OwnedCursor::Chain(chain::Drain::new(chains.find(Option::is_some)?))
                }
                OwnedBuckets::Tree(trees) => {
                    OwnedCursor::Tree(tree::Drain::new(trees.find(Option::is_some)?))
                }
            };
        }
    }
}

impl<V> Drop for Entries<V> {
    fn drop(&mut self) {
        for _ in self {}
    }
}

/// An owning iterator over the values removed from a [`HashTable`] by
/// [`drain`](HashTable::drain) or `into_iter`.
pub struct Drain<V> {
    entries: Entries<V>,
    remaining: usize,
}

impl<V> Iterator for Drain<V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        let (_, value) = self.entries.next()?;
        self.remaining = self.remaining.saturating_sub(1);
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Drain<V> {}
