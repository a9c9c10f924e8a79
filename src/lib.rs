//! # Groupbeam
//!
//! **Group-wise reductions over chunk-partitioned arrays.** Groupbeam reduces a
//! multi-dimensional array along one dimension by one or more label arrays,
//! processing each partition of that dimension independently and merging the
//! partials into a dense, canonically ordered result.
//!
//! ## Key Features
//!
//! - **Group-aligned rechunking** - move partition boundaries to group edges so
//!   every group lives in exactly one partition
//! - **Multi-key grouping** - the Cartesian product of several keys is
//!   linearized into one code and expanded back into one axis per key
//! - **Blockwise or merged reduction** - finish partitions independently, or
//!   merge per-partition accumulators deterministically
//! - **Built-in aggregations** - sum, prod, count, mean, var, std, min, max,
//!   first, last, median
//! - **Sequential and parallel execution** - partitions run on Rayon by default
//!
//! ## Quick Start
//!
//! ```
//! use groupbeam::*;
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! // nine hourly readings in three chunks, bucketed into three periods
//! let data = ChunkedArray::with_chunks(
//!     vec!["time"],
//!     vec![9],
//!     vec![vec![4, 3, 2]],
//!     vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
//! )?;
//! let period = GroupKey::materialized("period", [0, 0, 0, 1, 1, 1, 1, 2, 2]);
//!
//! let opts = ReduceOptions::default().blockwise(true);
//! let (out, _) = reduce(&data, &[period], Aggregation::Mean, &opts)?;
//! assert_eq!(out.values, vec![2.0, 5.5, 8.5]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Group codes
//!
//! [`factorize`](fn@factorize) maps every element along the grouping dimension to an integer
//! code. With several keys the per-key indices are combined row-major (last key
//! fastest) and the output gets one axis per key. Elements outside the expected
//! groups get [`NO_GROUP`].
//!
//! ### Partitions
//!
//! A [`ChunkedArray`] carries partition sizes per dimension. For sequential
//! labels, [`optimal_partitioning`] computes boundaries that split no group and
//! [`align_to_groups`] applies them, rechunking only when something changes.
//!
//! ### Reduction
//!
//! [`reduce_partitions`] runs one task per partition. In blockwise mode each
//! partition is finished on its own; otherwise accumulators are merged in
//! partition order with the aggregation's merge rule. [`densify`](fn@densify) then scatters
//! the partials into the full code space with a fill value.
//!
//! ## Module Overview
//!
//! - [`array`] - chunked array and its partitioning
//! - [`key`] - group keys, group values and expected groups
//! - [`factorize`](mod@factorize) - keys to codes
//! - [`boundaries`] - group-aligned partition boundaries
//! - [`rechunk`] - applying the boundaries to an array
//! - [`aggregation`] - built-in aggregations and their merge rules
//! - [`runner`] - sequential and parallel partition execution
//! - [`driver`] - partition-local reduction
//! - [`densify`](mod@densify) - dense canonical output
//! - [`reduce`](mod@reduce) - end-to-end entry points
//! - [`config`] - reduction options
//! - [`testing`] - assertions, builders and fixtures for tests

pub mod aggregation;
pub mod array;
pub mod boundaries;
pub mod config;
pub mod densify;
pub mod driver;
pub mod error;
pub mod factorize;
pub mod key;
pub mod rechunk;
pub mod reduce;
pub mod runner;
pub mod testing;

pub use aggregation::{Accumulator, Aggregation, MergeRule};
pub use array::{ChunkedArray, Chunks};
pub use boundaries::{labels_from_run_lengths, optimal_partitioning};
pub use config::ReduceOptions;
pub use densify::{CanonicalResult, densify};
pub use driver::{PartialResult, Reduction, reduce_partitions};
pub use error::GroupbyError;
pub use factorize::{Factorized, NO_GROUP, factorize, ravel_index, unravel_code};
pub use key::{ExpectedGroups, GroupKey, GroupValue};
pub use rechunk::{RechunkPlan, align_to_groups, plan_rechunk};
pub use reduce::{groupby_reduce, reduce, resample_reduce};
pub use runner::{ExecMode, Runner};
