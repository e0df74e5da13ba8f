use crate::error::Error;
use crate::error::Result;

/// Bucket count of a table built with [`Config::default`], and the capacity a
/// table returns to on `clear()`.
pub const DEFAULT_CAPACITY: usize = 16;

/// Load factor of a table built with [`Config::default`].
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// Bucket length at which a chained table converts to tree buckets.
pub const TREEIFY_THRESHOLD: usize = 8;

/// Bucket length at or below which a tree table converts back to chains.
pub const UNTREEIFY_THRESHOLD: usize = 6;

/// Construction parameters for a [`HashTable`](crate::HashTable) or
/// [`HashMap`](crate::HashMap).
///
/// The two thresholds form a hysteresis band: a table switches to tree
/// buckets once its longest bucket reaches `treeify_threshold`, and switches
/// back only when the longest bucket shrinks to `untreeify_threshold` or less.
///
/// # Examples
///
/// ```rust
/// use adaptive_hash::Config;
///
/// let config = Config::default().with_capacity(10).with_load_factor(0.5);
/// assert!(config.validate().is_ok());
///
/// let bad = Config::default().with_load_factor(1.5);
/// assert!(bad.validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Initial number of buckets.
    pub capacity: usize,
    /// Maximum ratio of entries to buckets before the table doubles.
    pub load_factor: f32,
    /// Longest-bucket length that turns chains into trees.
    pub treeify_threshold: usize,
    /// Longest-bucket length that turns trees back into chains.
    pub untreeify_threshold: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
            treeify_threshold: TREEIFY_THRESHOLD,
            untreeify_threshold: UNTREEIFY_THRESHOLD,
        }
    }
}

impl Config {
    /// Sets the initial bucket count.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the load factor.
    pub fn with_load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Sets both representation thresholds.
    pub fn with_thresholds(mut self, treeify: usize, untreeify: usize) -> Self {
        self.treeify_threshold = treeify;
        self.untreeify_threshold = untreeify;
        self
    }

    /// Checks that the configuration describes a usable table.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidConfig("capacity must be non-zero"));
        }
        if !(self.load_factor > 0.0 && self.load_factor <= 1.0) {
            return Err(Error::InvalidConfig("load factor must be in (0, 1]"));
        }
        if self.untreeify_threshold >= self.treeify_threshold {
            return Err(Error::InvalidConfig(
                "untreeify threshold must be below the treeify threshold",
            ));
        }
        Ok(())
    }

    /// Largest entry count the given bucket count may hold without growing.
    ///
    /// The product is taken in `f32`, so a load factor such as 0.7 yields
    /// exactly 7 for 10 buckets instead of flooring 6.9999998 down to 6.
    pub(crate) fn max_len(&self, capacity: usize) -> usize {
        (capacity as f32 * self.load_factor) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = Config::default();
        assert_eq!(config.capacity, 16);
        assert_eq!(config.load_factor, 0.75);
        assert!(config.validate().is_ok());
        assert_eq!(config.max_len(16), 12);
    }

    #[test]
    fn rejects_zero_capacity() {
        assert_eq!(
            Config::default().with_capacity(0).validate(),
            Err(Error::InvalidConfig("capacity must be non-zero"))
        );
    }

    #[test]
    fn rejects_load_factor_out_of_range() {
        for lf in [0.0, -0.5, 1.01, f32::NAN] {
            assert!(
                Config::default().with_load_factor(lf).validate().is_err(),
                "{lf}"
            );
        }
        assert!(Config::default().with_load_factor(1.0).validate().is_ok());
    }

    #[test]
    fn rejects_thresholds_without_hysteresis() {
        assert!(Config::default().with_thresholds(6, 6).validate().is_err());
        assert!(Config::default().with_thresholds(4, 8).validate().is_err());
        assert!(Config::default().with_thresholds(4, 2).validate().is_ok());
    }

    #[test]
    fn max_len_for_odd_capacity() {
        let config = Config::default().with_capacity(10).with_load_factor(0.5);
        assert_eq!(config.max_len(10), 5);
        assert_eq!(config.max_len(20), 10);
    }

    #[test]
    fn max_len_for_inexact_load_factors() {
        let config = Config::default().with_load_factor(0.7);
        assert_eq!(config.max_len(10), 7);
        assert_eq!(config.max_len(100), 70);
        assert_eq!(config.max_len(20), 14);

        let config = Config::default().with_load_factor(0.9);
        assert_eq!(config.max_len(10), 9);
    }
}
