#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod chain;
mod tree;

/// Construction parameters and their defaults.
pub mod config;

/// Errors returned by fallible operations.
pub mod error;

/// A keyed map over the adaptive table.
///
/// This module provides a `HashMap` that wraps the `HashTable` and provides
/// a standard key-value map interface with configurable hashers.
pub mod hash_map;

/// The raw table, driven by caller-supplied hashes and equality predicates.
pub mod hash_table;

pub mod hashing;

pub use config::Config;
pub use error::Error;
pub use error::Result;
pub use hash_map::HashMap;
pub use hash_table::HashTable;
pub use hash_table::Mode;
pub use hash_table::TableStats;
#[cfg(any(feature = "std", feature = "foldhash"))]
pub use hashing::DefaultHashBuilder;
