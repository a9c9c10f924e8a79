//! Partition-local group reduction.
//!
//! The grouping dimension is cut along the array's partitions; each partition
//! is reduced independently (in parallel under [`ExecMode::Parallel`]) into
//! per-code accumulators. Afterwards either
//!
//! - **blockwise**: every partition is finished on its own. Valid only when no
//!   group code appears in more than one partition, which is checked; or
//! - **general**: accumulators of all partitions are merged, in partition
//!   order, with the aggregation's merge rule and then finished.
//!
//! All dimensions other than the grouping one are kept and flattened into
//! "rows" in their original order.
//!
//! [`ExecMode::Parallel`]: crate::runner::ExecMode::Parallel

use crate::aggregation::{Accumulator, Aggregation, MergeRule};
use crate::array::ChunkedArray;
use crate::error::GroupbyError;
use crate::factorize::NO_GROUP;
use crate::runner::Runner;
use anyhow::{Result, bail};
use std::collections::{BTreeSet, HashMap};
use std::ops::Range;
use tracing::{debug, trace};

/// Reduced values for a subset of group codes.
#[derive(Clone, Debug, PartialEq)]
pub struct PartialResult {
    /// Codes covered, ascending.
    pub codes: Vec<i64>,
    /// `rows × codes.len()`, row-major.
    pub values: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reduction {
    /// One entry per partition in blockwise mode, a single merged entry otherwise.
    pub partials: Vec<PartialResult>,
    /// Every code observed in any partition, ascending.
    pub observed: Vec<i64>,
    /// Product of the non-grouped dimension lengths.
    pub rows: usize,
}

/// Accumulators of one partition before finishing.
struct PartitionAccs {
    index: usize,
    codes: Vec<i64>,
    accs: Vec<Accumulator>,
}

struct Layout {
    outer: usize,
    len: usize,
    inner: usize,
}

impl Layout {
    fn rows(&self) -> usize {
        self.outer * self.inner
    }
}

fn partition_ranges(chunks: &[usize]) -> Vec<Range<usize>> {
    let mut start = 0;
    chunks
        .iter()
        .map(|&c| {
            let r = start..start + c;
            start += c;
            r
        })
        .collect()
}

fn reduce_one<T>(
    values: &[T],
    codes: &[i64],
    layout: &Layout,
    agg: Aggregation,
    index: usize,
    range: Range<usize>,
) -> PartitionAccs
where
    T: Copy + Into<f64>,
{
    let present: BTreeSet<i64> = codes[range.clone()].iter().copied().filter(|&c| c != NO_GROUP).collect();
    let local: Vec<i64> = present.into_iter().collect();
    let col: HashMap<i64, usize> = local.iter().enumerate().map(|(i, &c)| (c, i)).collect();
    let ncodes = local.len();

    let mut accs: Vec<Accumulator> = (0..layout.rows() * ncodes).map(|_| agg.create()).collect();
    for o in 0..layout.outer {
        for g in range.clone() {
            let Some(&c) = col.get(&codes[g]) else { continue };
            let base = (o * layout.len + g) * layout.inner;
            for i in 0..layout.inner {
                let row = o * layout.inner + i;
                agg.add_input(&mut accs[row * ncodes + c], g, values[base + i].into());
            }
        }
    }
    trace!(partition = index, ?range, groups = ncodes, "reduced partition");
    PartitionAccs {
        index,
        codes: local,
        accs,
    }
}

fn finish(agg: Aggregation, part: PartitionAccs) -> PartialResult {
    PartialResult {
        codes: part.codes,
        values: part.accs.into_iter().map(|a| agg.finish(a)).collect(),
    }
}

/// First code found in two partitions, as `(code, first_partition, second_partition)`.
fn shared_code(parts: &[PartitionAccs]) -> Option<(i64, usize, usize)> {
    let mut owner: HashMap<i64, usize> = HashMap::new();
    for p in parts {
        for &c in &p.codes {
            if let Some(&first) = owner.get(&c) {
                return Some((c, first, p.index));
            }
            owner.insert(c, p.index);
        }
    }
    None
}

fn merge_all(agg: Aggregation, parts: Vec<PartitionAccs>, rows: usize) -> Result<PartialResult> {
    let union: Vec<i64> = parts
        .iter()
        .flat_map(|p| p.codes.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let col: HashMap<i64, usize> = union.iter().enumerate().map(|(i, &c)| (c, i)).collect();
    let width = union.len();

    let mut merged: Vec<Accumulator> = (0..rows * width).map(|_| agg.create()).collect();
    for part in parts {
        let local = part.codes.len();
        for (k, acc) in part.accs.into_iter().enumerate() {
            let (row, j) = (k / local, k % local);
            let target = row * width + col[&part.codes[j]];
            agg.merge(&mut merged[target], acc)?;
        }
    }
    Ok(PartialResult {
        codes: union,
        values: merged.into_iter().map(|a| agg.finish(a)).collect(),
    })
}

/// Reduce `array` along `dim` by `codes`, one task per partition.
///
/// `codes` holds one group code per element along `dim` (or [`NO_GROUP`]);
/// `ngroups` bounds the code space.
///
/// # Errors
/// - [`GroupbyError::InvalidArgument`] if `codes` does not match the dimension or a code is out of range.
/// - [`GroupbyError::UnalignedPartitions`] in blockwise mode when a group spans partitions.
/// - [`GroupbyError::Aggregation`] in general mode when the aggregation cannot merge and a group spans partitions.
/// - Any error raised while reducing a partition.
pub fn reduce_partitions<T>(
    array: &ChunkedArray<T>,
    dim: &str,
    codes: &[i64],
    ngroups: usize,
    agg: Aggregation,
    blockwise: bool,
    runner: &Runner,
) -> Result<Reduction>
where
    T: Copy + Into<f64> + Send + Sync,
{
    let axis = array.axis_of(dim)?;
    let (outer, len, inner) = array.split_around(axis);
    if codes.len() != len {
        bail!(GroupbyError::invalid(format!(
            "{} group codes for dimension {dim:?} of length {len}",
            codes.len()
        )));
    }
    if let Some(&bad) = codes.iter().find(|&&c| c < NO_GROUP || c >= ngroups as i64) {
        bail!(GroupbyError::invalid(format!("group code {bad} outside [0, {ngroups})")));
    }

    let layout = Layout { outer, len, inner };
    let values = array.values();
    let ranges: Vec<(usize, Range<usize>)> = partition_ranges(array.chunks_at(axis)).into_iter().enumerate().collect();
    let parts = runner.map_partitions(ranges, |(index, range)| {
        Ok(reduce_one(values, codes, &layout, agg, index, range))
    })?;

    let observed: Vec<i64> = parts
        .iter()
        .flat_map(|p| p.codes.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let shared = shared_code(&parts);
    let rows = layout.rows();

    let partials = match (blockwise, shared) {
        (true, Some((code, first, second))) => bail!(GroupbyError::UnalignedPartitions { code, first, second }),
        (false, Some((code, first, second))) if agg.merge_rule() == MergeRule::NotMergeable => {
            bail!(GroupbyError::Aggregation(format!(
                "{agg} has no merge rule but group code {code} spans partitions {first} and {second}"
            )))
        }
        (false, _) if agg.merge_rule() == MergeRule::Combine => vec![merge_all(agg, parts, rows)?],
        _ => parts.into_iter().map(|p| finish(agg, p)).collect(),
    };

    debug!(
        aggregation = %agg,
        partitions = array.chunks_at(axis).len(),
        observed = observed.len(),
        ngroups,
        blockwise,
        "partition reduction finished"
    );
    Ok(Reduction {
        partials,
        observed,
        rows,
    })
}
