//! Group-aligned partition boundaries.
//!
//! [`optimal_partitioning`] moves the boundaries of an existing partitioning so
//! that no group run is split across two partitions, while keeping each
//! boundary as close as possible to where it was. Labels must be sequential
//! (non-decreasing), which is the pattern resampling produces:
//!
//! ```
//! use groupbeam::optimal_partitioning;
//!
//! let labels = [0, 0, 0, 1, 1, 1, 1, 2, 2];
//! // already aligned: chunk ends (2, 6, 8) are group ends
//! assert_eq!(optimal_partitioning(&[3, 4, 2], &labels)?, vec![3, 4, 2]);
//! // the boundary after index 3 splits group 1 and snaps to its start
//! assert_eq!(optimal_partitioning(&[4, 3, 2], &labels)?, vec![3, 4, 2]);
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::array::Chunks;
use crate::error::GroupbyError;
use anyhow::{Result, bail};
use std::collections::HashMap;
use tracing::{debug, trace};

/// First and last element index of every group present in `labels`.
fn group_extents(labels: &[i64]) -> HashMap<i64, (usize, usize)> {
    let mut extents: HashMap<i64, (usize, usize)> = HashMap::new();
    for (i, &label) in labels.iter().enumerate() {
        extents
            .entry(label)
            .and_modify(|(_, last)| *last = i)
            .or_insert((i, i));
    }
    extents
}

fn validate(chunks: &[usize], labels: &[i64]) -> Result<()> {
    if chunks.contains(&0) {
        bail!(GroupbyError::invalid(format!("zero-sized chunk in {chunks:?}")));
    }
    let total: usize = chunks.iter().sum();
    if total != labels.len() {
        bail!(GroupbyError::invalid(format!(
            "chunks {chunks:?} cover {total} elements but there are {} labels",
            labels.len()
        )));
    }
    if let Some(pos) = labels.windows(2).position(|w| w[1] < w[0]) {
        bail!(GroupbyError::invalid(format!(
            "labels must be non-decreasing; label {} at index {} follows {}",
            labels[pos + 1],
            pos + 1,
            labels[pos]
        )));
    }
    Ok(())
}

/// Compute a partitioning of `labels` whose boundaries never fall inside a
/// group, starting from `chunks`.
///
/// Each original boundary moves to the nearer edge of the group it falls in:
/// the group's first element when that is strictly closer and does not step
/// back over a boundary already placed, otherwise one past the group's last
/// element. Exact ties go to the group end. Boundaries swallowed by an earlier
/// move are dropped, and the final boundary is always the sequence end.
///
/// Returns `chunks` unchanged when it is already aligned.
///
/// # Errors
/// [`GroupbyError::InvalidArgument`] if the chunks do not cover `labels`
/// exactly, contain a zero, or the labels decrease anywhere.
pub fn optimal_partitioning(chunks: &[usize], labels: &[i64]) -> Result<Chunks> {
    validate(chunks, labels)?;
    if chunks.len() <= 1 {
        return Ok(chunks.to_vec());
    }

    // index of the last element in each chunk
    let chunkidx: Vec<usize> = chunks
        .iter()
        .scan(0usize, |end, &c| {
            *end += c;
            Some(*end - 1)
        })
        .collect();

    let extents = group_extents(labels);
    let bounds: Vec<(usize, usize, usize)> = chunkidx
        .iter()
        .map(|&c| {
            let (first, last) = extents[&labels[c]];
            (c, first, last)
        })
        .collect();

    if bounds.iter().all(|&(c, _, last)| c == last) {
        trace!(?chunks, "chunks already aligned to group boundaries");
        return Ok(chunks.to_vec());
    }

    let mut newchunkidx: Vec<usize> = vec![0];
    for &(c, first, last) in &bounds {
        let prev = newchunkidx[newchunkidx.len() - 1];
        if c == 0 || prev > last {
            continue;
        }
        let to_first = c.abs_diff(first);
        let to_last = c.abs_diff(last);
        if to_first < to_last && first > prev {
            newchunkidx.push(first);
        } else {
            newchunkidx.push(last + 1);
        }
    }
    let end = labels.len();
    if newchunkidx[newchunkidx.len() - 1] != end {
        newchunkidx.push(end);
    }

    let newchunks: Chunks = newchunkidx.windows(2).map(|w| w[1] - w[0]).collect();
    let total: usize = newchunks.iter().sum();
    if total != end || newchunks.contains(&0) {
        bail!(GroupbyError::InvariantViolation(format!(
            "recomputed chunks {newchunks:?} from {chunks:?} do not partition {end} elements"
        )));
    }

    debug!(from = ?chunks, to = ?newchunks, "moved chunk boundaries to group edges");
    Ok(newchunks)
}

/// Sequential labels from per-group run lengths: `[3, 2]` gives `[0, 0, 0, 1, 1]`.
pub fn labels_from_run_lengths(run_lengths: &[usize]) -> Vec<i64> {
    run_lengths
        .iter()
        .enumerate()
        .flat_map(|(g, &n)| std::iter::repeat_n(g as i64, n))
        .collect()
}
