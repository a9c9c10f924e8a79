//! End-to-end grouped reduction.
//!
//! [`reduce`] ties the pieces together:
//!
//! 1. factorize the keys into one code per element,
//! 2. for blockwise runs over sequential codes, move partition boundaries to
//!    group edges,
//! 3. reduce every partition (in parallel by default),
//! 4. densify the partials into the canonical shape with the fill value.
//!
//! ```
//! use groupbeam::{reduce, Aggregation, ChunkedArray, GroupKey, ReduceOptions};
//!
//! let data = ChunkedArray::with_chunks(
//!     vec!["time"],
//!     vec![6],
//!     vec![vec![3, 3]],
//!     vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
//! )?;
//! let key = GroupKey::materialized("season", ["a", "a", "b", "b", "b", "c"]);
//! let (out, groups) = reduce(&data, &[key], Aggregation::Sum, &ReduceOptions::default())?;
//! assert_eq!(out.dims, vec!["season".to_string()]);
//! assert_eq!(out.values, vec![3.0, 12.0, 6.0]);
//! assert_eq!(groups[0].len(), 3);
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::aggregation::Aggregation;
use crate::array::ChunkedArray;
use crate::config::ReduceOptions;
use crate::densify::{CanonicalResult, densify};
use crate::driver::reduce_partitions;
use crate::error::GroupbyError;
use crate::factorize::factorize;
use crate::key::{ExpectedGroups, GroupKey, GroupValue};
use crate::rechunk::align_to_groups;
use crate::runner::Runner;
use anyhow::{Result, bail};
use tracing::debug;

/// Reduce `array` over the groups defined by `keys`.
///
/// Returns the dense result (kept dimensions first, then one axis per key)
/// and the group values labelling each key axis.
///
/// # Errors
/// Propagates factorization, alignment, and partition errors; see
/// [`GroupbyError`] for the kinds.
pub fn reduce<T>(
    array: &ChunkedArray<T>,
    keys: &[GroupKey],
    aggregation: Aggregation,
    options: &ReduceOptions,
) -> Result<(CanonicalResult, Vec<Vec<GroupValue>>)>
where
    T: Copy + Into<f64> + Send + Sync,
{
    let dim = match &options.dim {
        Some(d) => d.clone(),
        None => match array.dims().last() {
            Some(d) => d.clone(),
            None => bail!(GroupbyError::invalid("cannot reduce a zero-dimensional array")),
        },
    };
    let axis = array.axis_of(&dim)?;
    let len = array.shape()[axis];
    if let Some(k) = keys.iter().find(|k| k.len() != len) {
        bail!(GroupbyError::invalid(format!(
            "key {:?} has length {}, dimension {dim:?} has length {len}",
            k.name(),
            k.len()
        )));
    }

    let factorized = factorize(keys, options.expected_groups.as_deref())?;

    let aligned = if options.blockwise && array.chunks_at(axis).len() > 1 && factorized.is_sequential() {
        align_to_groups(array, &dim, &factorized.codes)?
    } else {
        array.clone()
    };

    let runner = Runner::new(options.exec_mode);
    let reduction = reduce_partitions(
        &aligned,
        &dim,
        &factorized.codes,
        factorized.ngroups(),
        aggregation,
        options.blockwise,
        &runner,
    )?;

    let fill = options.fill_value.unwrap_or_else(|| aggregation.fill_value());
    let dense = densify(&reduction.partials, reduction.rows, &factorized.shape, fill)?;

    let kept: Vec<(String, usize)> = array
        .dims()
        .iter()
        .zip(array.shape())
        .filter(|(d, _)| **d != dim)
        .map(|(d, &n)| (d.clone(), n))
        .collect();
    let grouped: Vec<(String, Vec<GroupValue>)> = factorized
        .names
        .iter()
        .cloned()
        .zip(factorized.groups.iter().cloned())
        .collect();
    let result = CanonicalResult::from_dense(kept, grouped, dense)?;

    debug!(
        %dim,
        keys = keys.len(),
        aggregation = %aggregation,
        shape = ?result.shape,
        observed = reduction.observed.len(),
        "grouped reduction complete"
    );
    Ok((result, factorized.groups))
}

/// Reduce over a single key whose group list is already known.
///
/// The output axis is named after the key and ordered like `groups`.
pub fn groupby_reduce<T>(
    array: &ChunkedArray<T>,
    dim: &str,
    key: &GroupKey,
    groups: Vec<GroupValue>,
    aggregation: Aggregation,
    blockwise: bool,
) -> Result<CanonicalResult>
where
    T: Copy + Into<f64> + Send + Sync,
{
    let options = ReduceOptions::new()
        .with_dim(dim)
        .with_expected_groups(vec![Some(ExpectedGroups::Values(groups))])
        .blockwise(blockwise);
    let (result, _) = reduce(array, std::slice::from_ref(key), aggregation, &options)?;
    Ok(result)
}

/// Reduce consecutive runs along `dim`, one output bucket per run.
///
/// `run_lengths[i]` elements belong to bucket `labels[i]`. Partitions are first
/// moved to bucket boundaries so every bucket is reduced inside one partition.
/// The output axis keeps the name `dim`.
pub fn resample_reduce<T>(
    array: &ChunkedArray<T>,
    dim: &str,
    run_lengths: &[usize],
    labels: Vec<GroupValue>,
    aggregation: Aggregation,
) -> Result<CanonicalResult>
where
    T: Copy + Into<f64> + Send + Sync,
{
    if run_lengths.len() != labels.len() {
        bail!(GroupbyError::invalid(format!(
            "{} run lengths for {} bucket labels",
            run_lengths.len(),
            labels.len()
        )));
    }
    let len = array.shape()[array.axis_of(dim)?];
    let covered: usize = run_lengths.iter().sum();
    if covered != len {
        bail!(GroupbyError::invalid(format!(
            "runs cover {covered} elements, dimension {dim:?} has length {len}"
        )));
    }

    let bucket_of_element: Vec<GroupValue> = run_lengths
        .iter()
        .zip(&labels)
        .flat_map(|(&n, label)| std::iter::repeat_n(label.clone(), n))
        .collect();
    let key = GroupKey::materialized(dim, bucket_of_element);
    groupby_reduce(array, dim, &key, labels, aggregation, true)
}
