//! Error taxonomy for grouped reductions.
//!
//! Public functions return [`anyhow::Result`]; the kinds below are raised
//! through it and can be recovered by the caller with
//! `err.downcast_ref::<GroupbyError>()`.
//!
//! ```
//! use groupbeam::{optimal_partitioning, GroupbyError};
//!
//! let err = optimal_partitioning(&[2, 2], &[0, 1, 0, 1]).unwrap_err();
//! assert!(matches!(
//!     err.downcast_ref::<GroupbyError>(),
//!     Some(GroupbyError::InvalidArgument(_))
//! ));
//! ```

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GroupbyError {
    /// Multi-key grouping was requested while one of the keys is deferred.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Group identity cannot be determined from the supplied input.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// The aggregation is unknown, or has no merge rule and partitions share groups.
    #[error("aggregation error: {0}")]
    Aggregation(String),

    /// Internal post-condition failed. Always a defect.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Malformed caller input (mismatched lengths, zero-sized chunks, unsorted labels).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Blockwise reduction was requested but a group spans more than one partition.
    #[error("group code {code} spans partitions {first} and {second}; blockwise reduction needs group-aligned partitions")]
    UnalignedPartitions {
        code: i64,
        first: usize,
        second: usize,
    },
}

impl GroupbyError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
