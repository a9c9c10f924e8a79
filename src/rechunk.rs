//! Applying group-aligned partitioning to an array.

use crate::array::{ChunkedArray, Chunks};
use crate::boundaries::optimal_partitioning;
use anyhow::Result;
use tracing::{debug, trace};

/// Current and proposed partitioning along one dimension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RechunkPlan {
    pub dim: String,
    pub current: Chunks,
    pub proposed: Chunks,
}

impl RechunkPlan {
    pub fn is_noop(&self) -> bool {
        self.current == self.proposed
    }

    /// Repartition `array` along the plan's dimension, or hand back a clone of
    /// the same view when nothing changes.
    pub fn apply<T: Clone>(&self, array: &ChunkedArray<T>) -> Result<ChunkedArray<T>> {
        if self.is_noop() {
            trace!(dim = %self.dim, chunks = ?self.current, "rechunk skipped");
            return Ok(array.clone());
        }
        debug!(dim = %self.dim, from = ?self.current, to = ?self.proposed, "rechunking to group boundaries");
        array.rechunk(&self.dim, &self.proposed)
    }
}

/// Work out the group-aligned partitioning for `array` along `dim`.
pub fn plan_rechunk<T>(array: &ChunkedArray<T>, dim: &str, labels: &[i64]) -> Result<RechunkPlan> {
    let current = array.chunks(dim)?.to_vec();
    let proposed = optimal_partitioning(&current, labels)?;
    Ok(RechunkPlan {
        dim: dim.to_string(),
        current,
        proposed,
    })
}

/// Rechunk `array` so group boundaries along `dim` line up with chunk
/// boundaries, allowing partition-local group reductions.
///
/// Only valid for sequential labels such as `[0, 0, 0, 1, 1, 1, 1, 2, 2]`.
pub fn align_to_groups<T: Clone>(array: &ChunkedArray<T>, dim: &str, labels: &[i64]) -> Result<ChunkedArray<T>> {
    plan_rechunk(array, dim, labels)?.apply(array)
}
