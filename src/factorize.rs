//! Group factorization.
//!
//! Turns one or more aligned key arrays into a single dense integer code per
//! element, plus the canonical output shape (one axis per key). Multiple keys
//! are linearized row-major in key order, so the last key varies fastest:
//!
//! ```
//! use groupbeam::{factorize, GroupKey};
//!
//! let a = GroupKey::materialized("a", ["x", "x", "y"]);
//! let b = GroupKey::materialized("b", [1, 3, 2]);
//! let f = factorize(&[a, b], None)?;
//! assert_eq!(f.shape, vec![2, 3]);
//! assert_eq!(f.codes, vec![0, 2, 4]);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Elements whose value is outside the expected domain (or NaN) get the
//! sentinel code [`NO_GROUP`].

use crate::error::GroupbyError;
use crate::key::{ExpectedGroups, GroupKey, GroupValue};
use anyhow::{Result, bail};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Code assigned to elements that belong to no group.
pub const NO_GROUP: i64 = -1;

/// Output of [`factorize`].
#[derive(Clone, Debug, PartialEq)]
pub struct Factorized {
    /// One code per element along the grouping dimension.
    pub codes: Vec<i64>,
    /// Group count per key.
    pub shape: Vec<usize>,
    /// Group values per key, in output-axis order.
    pub groups: Vec<Vec<GroupValue>>,
    /// Key names, one per output axis.
    pub names: Vec<String>,
}

impl Factorized {
    /// Size of the flattened code space, `product(shape)`.
    pub fn ngroups(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether codes never decrease along the grouping dimension, i.e. every
    /// group occupies one contiguous run.
    pub fn is_sequential(&self) -> bool {
        self.codes.windows(2).all(|w| w[0] <= w[1])
    }
}

/// Level set of one key plus the rule mapping a raw value to its level index.
enum Levels {
    Lookup {
        groups: Vec<GroupValue>,
        index: HashMap<GroupValue, i64>,
    },
    Bins {
        edges: Vec<f64>,
        groups: Vec<GroupValue>,
    },
}

impl Levels {
    fn observed(values: &[GroupValue]) -> Self {
        let uniq: BTreeSet<&GroupValue> = values.iter().filter(|v| !v.is_nan()).collect();
        Self::lookup(uniq.into_iter().cloned().collect())
    }

    fn lookup(groups: Vec<GroupValue>) -> Self {
        let index = groups
            .iter()
            .enumerate()
            .map(|(i, g)| (g.clone(), i as i64))
            .collect();
        Self::Lookup { groups, index }
    }

    fn expected(name: &str, expected: &ExpectedGroups) -> Result<Self> {
        match expected {
            ExpectedGroups::Values(vals) => {
                let distinct: BTreeSet<&GroupValue> = vals.iter().collect();
                if distinct.len() != vals.len() {
                    bail!(GroupbyError::invalid(format!(
                        "expected groups for key {name:?} contain duplicates"
                    )));
                }
                Ok(Self::lookup(vals.clone()))
            }
            ExpectedGroups::Bins(edges) => {
                if edges.len() < 2 {
                    bail!(GroupbyError::invalid(format!(
                        "bins for key {name:?} need at least two edges, got {}",
                        edges.len()
                    )));
                }
                if edges.iter().any(|e| !e.is_finite()) || edges.windows(2).any(|w| w[0] >= w[1]) {
                    bail!(GroupbyError::invalid(format!(
                        "bin edges for key {name:?} must be finite and strictly increasing: {edges:?}"
                    )));
                }
                let groups = edges.windows(2).map(|w| GroupValue::interval(w[0], w[1])).collect();
                Ok(Self::Bins {
                    edges: edges.clone(),
                    groups,
                })
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Lookup { groups, .. } | Self::Bins { groups, .. } => groups.len(),
        }
    }

    fn index_of(&self, v: &GroupValue) -> i64 {
        match self {
            Self::Lookup { index, .. } => index.get(v).copied().unwrap_or(NO_GROUP),
            Self::Bins { edges, .. } => v.as_f64().map_or(NO_GROUP, |x| bin_index(x, edges)),
        }
    }

    fn into_groups(self) -> Vec<GroupValue> {
        match self {
            Self::Lookup { groups, .. } | Self::Bins { groups, .. } => groups,
        }
    }
}

/// Right-closed bins; the first bin also includes its left edge.
fn bin_index(x: f64, edges: &[f64]) -> i64 {
    let (first, last) = (edges[0], edges[edges.len() - 1]);
    if x.is_nan() || x < first || x > last {
        return NO_GROUP;
    }
    if x == first {
        return 0;
    }
    let upper = edges.partition_point(|&e| e < x);
    (upper - 1) as i64
}

/// Factorize `keys` into a single code array.
///
/// `expected`, when given, holds one optional domain per key. Keys without a
/// domain use their sorted unique values, which requires them to be resident.
///
/// # Errors
/// - [`GroupbyError::Configuration`] if there are several keys and any of them is deferred.
/// - [`GroupbyError::UnsupportedInput`] if a deferred key has no expected groups.
/// - [`GroupbyError::InvalidArgument`] for zero keys, unequal key lengths, or malformed domains.
pub fn factorize(keys: &[GroupKey], expected: Option<&[Option<ExpectedGroups>]>) -> Result<Factorized> {
    if keys.is_empty() {
        bail!(GroupbyError::invalid("at least one group key is required"));
    }
    if let Some(exp) = expected {
        if exp.len() != keys.len() {
            bail!(GroupbyError::invalid(format!(
                "got {} expected-group entries for {} keys",
                exp.len(),
                keys.len()
            )));
        }
    }

    let deferred: Vec<&str> = keys.iter().filter(|k| !k.is_materialized()).map(GroupKey::name).collect();
    if keys.len() > 1 && !deferred.is_empty() {
        bail!(GroupbyError::Configuration(format!(
            "grouping by multiple keys would realize deferred keys {deferred:?}; materialize them first or group by one key at a time"
        )));
    }

    let len = keys[0].len();
    if let Some(k) = keys.iter().find(|k| k.len() != len) {
        bail!(GroupbyError::invalid(format!(
            "key {:?} has length {}, key {:?} has length {len}",
            k.name(),
            k.len(),
            keys[0].name()
        )));
    }

    let mut per_key: Vec<(Levels, Vec<i64>)> = Vec::with_capacity(keys.len());
    for (i, key) in keys.iter().enumerate() {
        let exp = expected.and_then(|e| e[i].as_ref());
        if exp.is_none() && !key.is_materialized() {
            bail!(GroupbyError::UnsupportedInput(format!(
                "key {:?} is deferred; supply its expected groups",
                key.name()
            )));
        }
        let values = key.realize()?;
        let levels = match exp {
            Some(e) => Levels::expected(key.name(), e)?,
            None => Levels::observed(&values),
        };
        let idx = values.iter().map(|v| levels.index_of(v)).collect();
        per_key.push((levels, idx));
    }

    let shape: Vec<usize> = per_key.iter().map(|(l, _)| l.len()).collect();
    let total = shape
        .iter()
        .try_fold(1usize, |acc, &n| acc.checked_mul(n))
        .filter(|&n| i64::try_from(n).is_ok());
    if total.is_none() {
        bail!(GroupbyError::invalid(format!("group space {shape:?} overflows the code range")));
    }

    let codes = if per_key.len() == 1 {
        per_key[0].1.clone()
    } else {
        (0..len)
            .map(|pos| {
                let mut code = 0i64;
                for ((_, idx), &n) in per_key.iter().zip(&shape) {
                    let i = idx[pos];
                    if i == NO_GROUP {
                        return NO_GROUP;
                    }
                    code = code * n as i64 + i;
                }
                code
            })
            .collect()
    };

    debug!(keys = keys.len(), ?shape, len, "factorized group keys");

    Ok(Factorized {
        codes,
        shape,
        groups: per_key.into_iter().map(|(l, _)| l.into_groups()).collect(),
        names: keys.iter().map(|k| k.name().to_string()).collect(),
    })
}

/// Linear code for a per-key index tuple, or `None` if out of range.
pub fn ravel_index(idx: &[usize], shape: &[usize]) -> Option<usize> {
    if idx.len() != shape.len() {
        return None;
    }
    idx.iter().zip(shape).try_fold(0usize, |code, (&i, &n)| {
        if i >= n {
            None
        } else {
            code.checked_mul(n)?.checked_add(i)
        }
    })
}

/// Per-key index tuple for a linear code. Inverse of [`ravel_index`].
pub fn unravel_code(mut code: usize, shape: &[usize]) -> Vec<usize> {
    let mut idx = vec![0; shape.len()];
    for (slot, &n) in idx.iter_mut().zip(shape).rev() {
        if n == 0 {
            continue;
        }
        *slot = code % n;
        code /= n;
    }
    idx
}
