//! Pre-built datasets for common reduction scenarios.

use crate::array::ChunkedArray;
use crate::key::GroupKey;
use anyhow::Result;

/// Labels of three sequential groups of sizes 3, 4 and 2.
///
/// ```
/// use groupbeam::testing::three_runs;
///
/// assert_eq!(three_runs(), vec![0, 0, 0, 1, 1, 1, 1, 2, 2]);
/// ```
#[must_use]
pub fn three_runs() -> Vec<i64> {
    vec![0, 0, 0, 1, 1, 1, 1, 2, 2]
}

/// Hourly readings over two stations: dims `("station", "time")`, shape `(2, 9)`,
/// chunked `(4, 3, 2)` along time. Station 1 reads ten times station 0.
pub fn station_readings() -> Result<ChunkedArray<f64>> {
    let base: Vec<f64> = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
    let values: Vec<f64> = base.iter().copied().chain(base.iter().map(|v| v * 10.0)).collect();
    ChunkedArray::with_chunks(
        vec!["station", "time"],
        vec![2, 9],
        vec![vec![2], vec![4, 3, 2]],
        values,
    )
}

/// Two keys over six elements: `color` (`blue`/`red`) and `size` (always `2`).
/// With expected sizes `[1, 2, 3]` only the `(blue, 2)` and `(red, 2)` cells
/// of the `2 × 3` grid are observed.
#[must_use]
pub fn sparse_two_keys() -> (GroupKey, GroupKey) {
    let color = GroupKey::materialized("color", ["blue", "red", "blue", "red", "blue", "red"]);
    let size = GroupKey::materialized("size", [2, 2, 2, 2, 2, 2]);
    (color, size)
}
