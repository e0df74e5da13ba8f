use thiserror::Error;

/// Errors returned by fallible table and map operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The requested key is not present.
    #[error("key not found")]
    NotFound,

    /// A table handed to [`HashMap::try_from_table`] does not hold the number
    /// of entries it was declared to hold.
    ///
    /// [`HashMap::try_from_table`]: crate::HashMap::try_from_table
    #[error("declared {declared} entries but {reachable} are reachable")]
    InvalidArgument {
        /// The entry count the caller claimed.
        declared: usize,
        /// The entry count found by walking every bucket.
        reachable: usize,
    },

    /// A [`Config`](crate::Config) failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Shorthand for results produced by this crate.
pub type Result<T> = core::result::Result<T, Error>;
