//! Grouping keys and their values.
//!
//! A [`GroupKey`] is one label array aligned with the grouping dimension. Its
//! values are either resident ([`GroupKey::materialized`]) or produced on demand
//! by a thunk ([`GroupKey::deferred`]), which models a lazily computed source
//! that the caller may not want realized implicitly.

use anyhow::Result;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// One discrete group identity.
///
/// Identity is numeric across `Int` and `Float`: `Int(1)` and `Float(1.0)` are
/// the same group and sort as numbers. Numbers sort before strings, strings
/// before intervals.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupValue {
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(String),
    /// Half-open bin `(lo, hi]` produced by binning a numeric key.
    Interval {
        lo: OrderedFloat<f64>,
        hi: OrderedFloat<f64>,
    },
}

impl GroupValue {
    pub fn interval(lo: f64, hi: f64) -> Self {
        Self::Interval {
            lo: OrderedFloat(lo),
            hi: OrderedFloat(hi),
        }
    }

    /// Numeric view used for binning. Strings and intervals have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(f.0),
            Self::Str(_) | Self::Interval { .. } => None,
        }
    }

    pub(crate) fn is_nan(&self) -> bool {
        matches!(self, Self::Float(f) if f.0.is_nan())
    }

    fn canonical(&self) -> Canonical<'_> {
        match self {
            Self::Int(i) => Canonical::Int(*i),
            Self::Float(f) => match integral(f.0) {
                Some(i) => Canonical::Int(i),
                None => Canonical::Float(*f),
            },
            Self::Str(s) => Canonical::Str(s),
            Self::Interval { lo, hi } => Canonical::Interval(*lo, *hi),
        }
    }
}

/// `x` as an integer when it is integral and inside the `i64` range.
#[allow(clippy::cast_possible_truncation)]
fn integral(x: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63
    (x.fract() == 0.0 && (-LIMIT..LIMIT).contains(&x)).then(|| x as i64)
}

/// Comparison form of a [`GroupValue`]; integral floats become integers.
#[derive(PartialEq, Eq, Hash)]
enum Canonical<'a> {
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(&'a str),
    Interval(OrderedFloat<f64>, OrderedFloat<f64>),
}

impl Canonical<'_> {
    fn rank(&self) -> u8 {
        match self {
            Self::Int(_) | Self::Float(_) => 0,
            Self::Str(_) => 1,
            Self::Interval(..) => 2,
        }
    }
}

/// Order of an integer against a non-integral (or out-of-range) float. Never equal.
#[allow(clippy::cast_precision_loss)]
fn int_vs_float(i: i64, f: OrderedFloat<f64>) -> Ordering {
    OrderedFloat(i as f64).cmp(&f).then(Ordering::Less)
}

impl Ord for Canonical<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.cmp(b),
            (Self::Int(a), Self::Float(b)) => int_vs_float(*a, *b),
            (Self::Float(a), Self::Int(b)) => int_vs_float(*b, *a).reverse(),
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            (Self::Interval(a0, a1), Self::Interval(b0, b1)) => (a0, a1).cmp(&(b0, b1)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Canonical<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GroupValue {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for GroupValue {}

impl Hash for GroupValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl Ord for GroupValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical().cmp(&other.canonical())
    }
}

impl PartialOrd for GroupValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for GroupValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{}", x.0),
            Self::Str(s) => write!(f, "{s}"),
            Self::Interval { lo, hi } => write!(f, "({}, {}]", lo.0, hi.0),
        }
    }
}

impl From<i64> for GroupValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for GroupValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for GroupValue {
    fn from(v: f64) -> Self {
        Self::Float(OrderedFloat(v))
    }
}

impl From<&str> for GroupValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for GroupValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

type KeyThunk = Arc<dyn Fn() -> Result<Vec<GroupValue>> + Send + Sync>;

#[derive(Clone)]
enum KeySource {
    Materialized(Arc<Vec<GroupValue>>),
    Deferred { len: usize, thunk: KeyThunk },
}

/// A named label array along the grouping dimension.
#[derive(Clone)]
pub struct GroupKey {
    name: String,
    source: KeySource,
}

impl GroupKey {
    pub fn materialized<S, V>(name: S, values: impl IntoIterator<Item = V>) -> Self
    where
        S: Into<String>,
        V: Into<GroupValue>,
    {
        Self {
            name: name.into(),
            source: KeySource::Materialized(Arc::new(values.into_iter().map(Into::into).collect())),
        }
    }

    /// A key whose values are only produced when `thunk` runs. `len` must match
    /// what the thunk returns.
    pub fn deferred<S, F>(name: S, len: usize, thunk: F) -> Self
    where
        S: Into<String>,
        F: Fn() -> Result<Vec<GroupValue>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            source: KeySource::Deferred {
                len,
                thunk: Arc::new(thunk),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        match &self.source {
            KeySource::Materialized(v) => v.len(),
            KeySource::Deferred { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_materialized(&self) -> bool {
        matches!(self.source, KeySource::Materialized(_))
    }

    /// Resident values, if any.
    pub fn values(&self) -> Option<&[GroupValue]> {
        match &self.source {
            KeySource::Materialized(v) => Some(v.as_slice()),
            KeySource::Deferred { .. } => None,
        }
    }

    /// Evaluate the key. For a deferred key this runs its thunk.
    pub fn realize(&self) -> Result<Arc<Vec<GroupValue>>> {
        match &self.source {
            KeySource::Materialized(v) => Ok(Arc::clone(v)),
            KeySource::Deferred { len, thunk } => {
                let values = thunk()?;
                anyhow::ensure!(
                    values.len() == *len,
                    "deferred key {:?} produced {} values, declared {len}",
                    self.name,
                    values.len()
                );
                Ok(Arc::new(values))
            }
        }
    }
}

impl Debug for GroupKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupKey")
            .field("name", &self.name)
            .field("len", &self.len())
            .field("materialized", &self.is_materialized())
            .finish()
    }
}

/// The caller-declared domain of one key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedGroups {
    /// Explicit group values; their order becomes the output axis order.
    Values(Vec<GroupValue>),
    /// Bin edges, strictly increasing. Yields `edges.len() - 1` interval groups.
    Bins(Vec<f64>),
}

impl ExpectedGroups {
    pub fn values<V: Into<GroupValue>>(vals: impl IntoIterator<Item = V>) -> Self {
        Self::Values(vals.into_iter().map(Into::into).collect())
    }
}
