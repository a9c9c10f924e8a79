//! Expanding partial results into the dense canonical output.
//!
//! Partials report values only for the codes they observed. [`densify`]
//! scatters them into a buffer covering the full code space, filling
//! unobserved codes with a caller-chosen value. [`CanonicalResult`] then views
//! the flat code axis as one axis per grouping key.

use crate::driver::PartialResult;
use crate::error::GroupbyError;
use crate::key::GroupValue;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Scatter `partials` into a `rows × product(group_shape)` buffer.
///
/// Output positions are keyed by code, so the order of `partials` does not
/// matter.
///
/// # Errors
/// [`GroupbyError::InvariantViolation`] if a partial's value count does not
/// match its codes, a code is outside the code space, or two partials report
/// the same code.
pub fn densify(partials: &[PartialResult], rows: usize, group_shape: &[usize], fill_value: f64) -> Result<Vec<f64>> {
    let ngroups: usize = group_shape.iter().product();
    let mut dense = vec![fill_value; rows * ngroups];
    let mut seen = vec![false; ngroups];

    for (p, partial) in partials.iter().enumerate() {
        let width = partial.codes.len();
        if partial.values.len() != rows * width {
            bail!(GroupbyError::InvariantViolation(format!(
                "partial {p} has {} values for {rows} rows and {width} codes",
                partial.values.len()
            )));
        }
        for (j, &code) in partial.codes.iter().enumerate() {
            let slot = usize::try_from(code)
                .ok()
                .filter(|&c| c < ngroups)
                .ok_or_else(|| GroupbyError::InvariantViolation(format!("code {code} outside [0, {ngroups})")))?;
            if std::mem::replace(&mut seen[slot], true) {
                bail!(GroupbyError::InvariantViolation(format!(
                    "code {code} reported by more than one partial"
                )));
            }
            for r in 0..rows {
                dense[r * ngroups + slot] = partial.values[r * width + j];
            }
        }
    }
    Ok(dense)
}

/// Dense reduction output: non-grouped dimensions first, then one axis per key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalResult {
    pub dims: Vec<String>,
    pub shape: Vec<usize>,
    /// Row-major values.
    pub values: Vec<f64>,
    /// Group labels for each grouped axis, in axis order.
    pub coords: Vec<(String, Vec<GroupValue>)>,
}

impl CanonicalResult {
    /// Assemble from the kept dimensions, the grouped axes with their labels,
    /// and a dense buffer as produced by [`densify`].
    pub fn from_dense(
        kept: Vec<(String, usize)>,
        grouped: Vec<(String, Vec<GroupValue>)>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let mut dims: Vec<String> = kept.iter().map(|(d, _)| d.clone()).collect();
        let mut shape: Vec<usize> = kept.iter().map(|&(_, n)| n).collect();
        for (name, labels) in &grouped {
            if dims.contains(name) {
                bail!(GroupbyError::invalid(format!(
                    "grouped axis {name:?} collides with an existing dimension"
                )));
            }
            dims.push(name.clone());
            shape.push(labels.len());
        }
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            bail!(GroupbyError::InvariantViolation(format!(
                "dense buffer has {} values, shape {shape:?} needs {expected}",
                values.len()
            )));
        }
        Ok(Self {
            dims,
            shape,
            values,
            coords: grouped,
        })
    }

    /// Value at a full index tuple, or `None` when out of bounds.
    pub fn get(&self, idx: &[usize]) -> Option<f64> {
        if idx.len() != self.shape.len() {
            return None;
        }
        let mut flat = 0usize;
        for (&i, &n) in idx.iter().zip(&self.shape) {
            if i >= n {
                return None;
            }
            flat = flat * n + i;
        }
        self.values.get(flat).copied()
    }

    /// Labels along a grouped axis.
    pub fn coord(&self, name: &str) -> Option<&[GroupValue]> {
        self.coords.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_slice())
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}
