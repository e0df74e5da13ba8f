use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;

use crate::config::Config;
use crate::error::Error;
use crate::error::Result;
use crate::hash_table::HashTable;
use crate::hash_table::Mode;
use crate::hash_table::TableStats;
use crate::hashing::hash_key;

/// A hash map built on the adaptive [`HashTable`].
///
/// `HashMap<K, V, S>` stores key-value pairs where keys implement `Hash + Eq`
/// and uses a configurable hasher builder `S` to hash keys. Each key's hash is
/// computed once, on insertion, and cached next to the entry.
///
/// Buckets start as short linked chains. When collisions pile up in one
/// bucket, the whole table switches to hash-ordered trees, and it switches back
/// once the collisions go away; see [`Mode`].
///
/// # Performance Characteristics
///
/// - **Memory**: one heap node per entry, holding `(K, V)`, the 32-bit hash,
///   and one (chain) or two (tree) child pointers
/// - **Lookups**: expected O(1); a bucket degenerates to O(log n) in tree mode
///   rather than O(n)
pub struct HashMap<K, V, S> {
    table: HashTable<(K, V)>,
    hash_builder: S,
}

impl<K, V, S> Clone for HashMap<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<K, V, S> Debug for HashMap<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.table.iter() {
            map.entry(k, v);
        }
        map.finish()
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates an empty map with the default configuration and the given
    /// hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use adaptive_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, _> = HashMap::with_hasher(SimpleHasher);
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 16);
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            table: HashTable::new(),
            hash_builder,
        }
    }

    /// Creates an empty map with exactly `capacity` buckets (at least one) and
    /// the given hasher builder.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            hash_builder,
        }
    }

    /// Creates an empty map from an explicit configuration and hasher builder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when `config` fails
    /// [`Config::validate`].
    pub fn with_config_and_hasher(config: Config, hash_builder: S) -> Result<Self> {
        Ok(Self {
            table: HashTable::with_config(config)?,
            hash_builder,
        })
    }

    /// Rebuilds a map from the entries of a raw table.
    ///
    /// `declared_len` is the entry count the caller expects the table to hold.
    /// The table is walked in full; when the number of reachable entries
    /// differs, nothing is built. Otherwise every entry is cloned and inserted
    /// into a fresh map with the table's bucket count, load factor and
    /// thresholds, hashing each key with `hash_builder`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when `declared_len` does not match
    /// the reachable entry count.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use adaptive_hash::DefaultHashBuilder;
    /// # use adaptive_hash::Error;
    /// # use adaptive_hash::HashMap;
    /// #
    /// let mut map: HashMap<u32, &str, DefaultHashBuilder> = HashMap::new();
    /// map.insert(1, "one");
    /// map.insert(2, "two");
    ///
    /// let copy = HashMap::try_from_table(map.table(), 2, DefaultHashBuilder::default()).unwrap();
    /// assert_eq!(copy, map);
    ///
    /// let err = HashMap::try_from_table(map.table(), 3, DefaultHashBuilder::default());
    /// assert_eq!(err.unwrap_err(), Error::InvalidArgument { declared: 3, reachable: 2 });
    /// ```
    pub fn try_from_table(
        table: &HashTable<(K, V)>,
        declared_len: usize,
        hash_builder: S,
    ) -> Result<Self>
    where
        K: Clone,
        V: Clone,
    {
        let reachable = table.reachable_len();
        if reachable != declared_len {
            return Err(Error::InvalidArgument {
                declared: declared_len,
                reachable,
            });
        }

        let config = table.config().with_capacity(table.capacity());
        let mut map = Self::with_config_and_hasher(config, hash_builder)?;
        for (k, v) in table.iter() {
            map.insert(k.clone(), v.clone());
        }
        Ok(map)
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the current number of buckets.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the load factor above which the map grows.
    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }

    /// Returns the bucket representation currently in use.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use adaptive_hash::DefaultHashBuilder;
    /// # use adaptive_hash::HashMap;
    /// # use adaptive_hash::Mode;
    /// #
    /// let mut map: HashMap<u64, u64, DefaultHashBuilder> = HashMap::new();
    /// assert_eq!(map.mode(), Mode::Empty);
    ///
    /// map.insert(1, 1);
    /// assert_eq!(map.mode(), Mode::Chain);
    /// ```
    pub fn mode(&self) -> Mode {
        self.table.mode()
    }

    /// Returns the configuration the map was built with.
    pub fn config(&self) -> &Config {
        self.table.config()
    }

    /// Returns statistics describing the shape of the underlying table.
    pub fn stats(&self) -> TableStats {
        self.table.stats()
    }

    /// Returns the underlying raw table.
    pub fn table(&self) -> &HashTable<(K, V)> {
        &self.table
    }

    /// Returns a reference to the map's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Removes all elements and returns the map to the default bucket count
    /// of 16, keeping its load factor and thresholds.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Grows the map, if needed, so that `additional` more entries fit without
    /// another resize.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the key was already present its value is replaced and the old value
    /// returned; the stored key is left untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use adaptive_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.insert(37, "b"), Some("a"));
    /// assert_eq!(map.get(&37), Ok(&"b"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = hash_key(&self.hash_builder, &key);
        if let Some((_, stored)) = self.table.find_mut(hash, |(k, _)| k == &key) {
            return Some(core::mem::replace(stored, value));
        }
        self.table
            .insert(hash, (key, value), |a, b| a.0 == b.0)
            .map(|(_, v)| v)
    }

    /// Inserts every pair from `entries`, in order. Later pairs win on equal
    /// keys.
    pub fn insert_all(&mut self, entries: impl IntoIterator<Item = (K, V)>) {
        for (k, v) in entries {
            self.insert(k, v);
        }
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use adaptive_hash::DefaultHashBuilder;
    /// # use adaptive_hash::Error;
    /// # use adaptive_hash::HashMap;
    /// #
    /// let mut map: HashMap<i32, &str, DefaultHashBuilder> = HashMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.get(&1), Ok(&"a"));
    /// assert_eq!(map.get(&2), Err(Error::NotFound));
    /// ```
    pub fn get(&self, key: &K) -> Result<&V> {
        let hash = hash_key(&self.hash_builder, key);
        self.table
            .find(hash, |(k, _)| k == key)
            .map(|(_, v)| v)
            .ok_or(Error::NotFound)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the key is absent.
    pub fn get_mut(&mut self, key: &K) -> Result<&mut V> {
        let hash = hash_key(&self.hash_builder, key);
        self.table
            .find_mut(hash, |(k, _)| k == key)
            .map(|(_, v)| v)
            .ok_or(Error::NotFound)
    }

    /// Returns `true` if the map contains a value for the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_ok()
    }

    /// Returns `true` if any entry holds a value equal to `value`.
    ///
    /// This walks the whole table.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.values().any(|v| v == value)
    }

    /// Removes a key from the map, returning its value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the key is absent; the map is left
    /// unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use adaptive_hash::DefaultHashBuilder;
    /// # use adaptive_hash::Error;
    /// # use adaptive_hash::HashMap;
    /// #
    /// let mut map: HashMap<i32, &str, DefaultHashBuilder> = HashMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.remove(&1), Ok("a"));
    /// assert_eq!(map.remove(&1), Err(Error::NotFound));
    /// ```
    pub fn remove(&mut self, key: &K) -> Result<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes a key from the map, returning the stored key and value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the key is absent.
    pub fn remove_entry(&mut self, key: &K) -> Result<(K, V)> {
        let hash = hash_key(&self.hash_builder, key);
        self.table
            .remove(hash, |(k, _)| k == key)
            .ok_or(Error::NotFound)
    }

    /// An iterator visiting all key-value pairs in arbitrary order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use adaptive_hash::DefaultHashBuilder;
    /// # use adaptive_hash::HashMap;
    /// #
    /// let mut map: HashMap<&str, i32, DefaultHashBuilder> = HashMap::new();
    /// map.insert("a", 1);
    /// map.insert("b", 2);
    ///
    /// let mut pairs: Vec<_> = map.iter().collect();
    /// pairs.sort();
    /// assert_eq!(pairs, [(&"a", &1), (&"b", &2)]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// An iterator visiting all keys in arbitrary order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// An iterator visiting all values in arbitrary order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Clears the map, returning all key-value pairs as an iterator. The map
    /// keeps its bucket count.
    pub fn drain(&mut self) -> Drain<K, V> {
        Drain {
            inner: self.table.drain(),
        }
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates an empty map with 16 buckets, load factor 0.75 and the default
    /// hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use adaptive_hash::HashMap;
    /// #
    /// # #[derive(Default)]
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, SimpleHasher> = HashMap::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates an empty map with exactly `capacity` buckets (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }

    /// Creates an empty map with the given bucket count and load factor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when `capacity` is zero or
    /// `load_factor` is outside `(0, 1]`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use adaptive_hash::DefaultHashBuilder;
    /// # use adaptive_hash::HashMap;
    /// #
    /// let map = HashMap::<u8, u8, DefaultHashBuilder>::with_capacity_and_load_factor(10, 0.5)
    ///     .unwrap();
    /// assert_eq!(map.capacity(), 10);
    /// assert_eq!(map.load_factor(), 0.5);
    ///
    /// assert!(HashMap::<u8, u8, DefaultHashBuilder>::with_capacity_and_load_factor(0, 0.5).is_err());
    /// ```
    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f32) -> Result<Self> {
        let config = Config::default()
            .with_capacity(capacity)
            .with_load_factor(load_factor);
        Self::with_config(config)
    }

    /// Creates an empty map from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when `config` fails
    /// [`Config::validate`].
    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_config_and_hasher(config, S::default())
    }
}

impl<K, V, S> Default for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> PartialEq for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_ok_and(|theirs| v == theirs))
    }
}

impl<K, V, S> Eq for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> Extend<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        self.insert_all(iter);
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.insert_all(iter);
        map
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> IntoIterator for HashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = Drain<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        Drain {
            inner: self.table.into_iter(),
        }
    }
}

/// An iterator over the key-value pairs of a `HashMap`.
pub struct Iter<'a, K, V> {
    inner: crate::hash_table::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// An iterator over the keys of a `HashMap`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// An iterator over the values of a `HashMap`.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// An owning iterator over the key-value pairs removed from a `HashMap`.
pub struct Drain<K, V> {
    inner: crate::hash_table::Drain<(K, V)>,
}

impl<K, V> Iterator for Drain<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Drain<K, V> {}
