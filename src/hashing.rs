//! Conversion of keys into the 32-bit hashes stored on every entry, and of
//! those hashes into bucket indexes.

use core::hash::BuildHasher;
use core::hash::Hash;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used by [`HashMap::new`](crate::HashMap::new).
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The hasher builder used by [`HashMap::new`](crate::HashMap::new).
        pub type DefaultHashBuilder = std::collections::hash_map::RandomState;
    }
}

/// Reduces a 64-bit hasher output to the 32-bit hash cached on entries.
///
/// Both halves contribute so that hashers with weak low bits still spread
/// across buckets.
#[inline(always)]
pub fn fold_hash(hash: u64) -> u32 {
    (hash ^ (hash >> 32)) as u32
}

/// Hashes `key` with `hash_builder` and folds the result to 32 bits.
#[inline]
pub fn hash_key<S, Q>(hash_builder: &S, key: &Q) -> u32
where
    S: BuildHasher,
    Q: Hash + ?Sized,
{
    fold_hash(hash_builder.hash_one(key))
}

/// Maps a hash onto a bucket in `[0, capacity)`.
///
/// Power-of-two capacities use a mask. Tables explicitly configured with any
/// other capacity fall back to a remainder, so their capacity sequence stays
/// the configured value times powers of two. A hash of zero always lands in
/// bucket 0.
///
/// `capacity` must be non-zero.
#[inline(always)]
pub fn bucket_index(hash: u32, capacity: usize) -> usize {
    debug_assert!(capacity > 0);
    if capacity.is_power_of_two() {
        hash as usize & (capacity - 1)
    } else {
        hash as usize % capacity
    }
}

#[cfg(test)]
mod tests {
    use siphasher::sip::SipHasher;

    use super::*;

    #[derive(Default)]
    struct SipBuilder;

    impl BuildHasher for SipBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new()
        }
    }

    #[test]
    fn fold_mixes_both_halves() {
        assert_eq!(fold_hash(0), 0);
        assert_eq!(fold_hash(0x0000_0001_0000_0000), 1);
        assert_eq!(fold_hash(0xFFFF_FFFF_FFFF_FFFF), 0);
        assert_eq!(fold_hash(0x1234_5678), 0x1234_5678);
    }

    #[test]
    fn hash_key_is_stable() {
        let builder = SipBuilder;
        assert_eq!(hash_key(&builder, &42u64), hash_key(&builder, &42u64));
        assert_eq!(hash_key(&builder, "abc"), hash_key(&builder, "abc"));
    }

    #[test]
    fn index_masks_power_of_two() {
        assert_eq!(bucket_index(0, 16), 0);
        assert_eq!(bucket_index(17, 16), 1);
        assert_eq!(bucket_index(u32::MAX, 32), 31);
    }

    #[test]
    fn index_wraps_other_capacities() {
        assert_eq!(bucket_index(0, 10), 0);
        assert_eq!(bucket_index(25, 10), 5);
        assert_eq!(bucket_index(25, 20), 5);
        for hash in 0..1000 {
            assert!(bucket_index(hash, 10) < 10);
        }
    }
}
