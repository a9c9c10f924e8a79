//! Testing utilities for grouped reductions.
//!
//! - **Assertions**: NaN-aware value comparison, dense-result checks, and
//!   partitioning checks
//! - **Builders**: sequential label arrays and chunked arrays
//! - **Fixtures**: small canonical datasets
//!
//! # Quick Start
//!
//! ```
//! use groupbeam::*;
//! use groupbeam::testing::*;
//!
//! let labels = LabelBuilder::new().run(3).run(4).run(2).build();
//! let chunks = optimal_partitioning(&[4, 3, 2], &labels).unwrap();
//! assert_partitioning_valid(&chunks, &labels);
//! ```

pub mod assertions;
pub mod builders;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
