//! Built-in aggregations.
//!
//! Every [`Aggregation`] follows the combiner shape used across the crate:
//! [`create`](Aggregation::create) an accumulator, [`add_input`](Aggregation::add_input)
//! values into it, [`merge`](Aggregation::merge) accumulators from different
//! partitions, and [`finish`](Aggregation::finish) to a value.
//!
//! | Aggregation | Accumulator | Merge | Default fill |
//! |---|---|---|---|
//! | `Sum` | running sum | sum | `0` |
//! | `Prod` | running product | product | `1` |
//! | `Count` | non-NaN count | sum | `0` |
//! | `Mean` | `(sum, count)` | weighted | NaN |
//! | `Var` / `Std` | `(count, mean, m2)` | parallel variance | NaN |
//! | `Min` / `Max` | running extreme | min / max | NaN |
//! | `First` / `Last` | `(position, value)` | lowest / highest position | NaN |
//! | `Median` | all values | none | NaN |
//!
//! NaN inputs are skipped by every kernel. All merges are associative and
//! commutative, so combining partials in any order gives the same result.
//!
//! ```
//! use groupbeam::Aggregation;
//!
//! let agg: Aggregation = "mean".parse()?;
//! let mut a = agg.create();
//! agg.add_input(&mut a, 0, 1.0);
//! let mut b = agg.create();
//! agg.add_input(&mut b, 1, 3.0);
//! agg.add_input(&mut b, 2, 5.0);
//! agg.merge(&mut a, b)?;
//! assert_eq!(agg.finish(a), 3.0);
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::error::GroupbyError;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// How partial accumulators from different partitions combine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeRule {
    /// Accumulators merge associatively and commutatively.
    Combine,
    /// No merge exists; each group must be reduced inside a single partition.
    NotMergeable,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Prod,
    Count,
    Mean,
    Var { ddof: u32 },
    Std { ddof: u32 },
    Min,
    Max,
    First,
    Last,
    Median,
}

/// Per-group running state.
#[derive(Clone, Debug, PartialEq)]
pub enum Accumulator {
    Sum(f64),
    Prod(f64),
    Count(u64),
    Mean { sum: f64, count: u64 },
    Moments { count: u64, mean: f64, m2: f64 },
    Extreme(Option<f64>),
    /// Value tagged with its position along the grouping dimension.
    Positioned(Option<(usize, f64)>),
    Values(Vec<f64>),
}

impl Aggregation {
    /// Look up an aggregation by name.
    ///
    /// Every aggregation skips NaN inputs, so a `nan`-prefixed name (`nansum`,
    /// `nanmean`, …) is an alias of the plain one: `sum` and `nansum` both
    /// ignore NaN rather than propagating it.
    ///
    /// # Errors
    /// [`GroupbyError::Aggregation`] for an unknown name.
    pub fn from_name(name: &str) -> Result<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        let base = lowered.strip_prefix("nan").unwrap_or(&lowered);
        Ok(match base {
            "sum" => Self::Sum,
            "prod" | "product" => Self::Prod,
            "count" => Self::Count,
            "mean" | "avg" => Self::Mean,
            "var" => Self::Var { ddof: 0 },
            "std" => Self::Std { ddof: 0 },
            "min" => Self::Min,
            "max" => Self::Max,
            "first" => Self::First,
            "last" => Self::Last,
            "median" => Self::Median,
            _ => bail!(GroupbyError::Aggregation(format!("unknown aggregation {name:?}"))),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Prod => "prod",
            Self::Count => "count",
            Self::Mean => "mean",
            Self::Var { .. } => "var",
            Self::Std { .. } => "std",
            Self::Min => "min",
            Self::Max => "max",
            Self::First => "first",
            Self::Last => "last",
            Self::Median => "median",
        }
    }

    pub fn merge_rule(&self) -> MergeRule {
        match self {
            Self::Median => MergeRule::NotMergeable,
            _ => MergeRule::Combine,
        }
    }

    /// Value reported for groups with no observations.
    pub fn fill_value(&self) -> f64 {
        match self {
            Self::Sum | Self::Count => 0.0,
            Self::Prod => 1.0,
            _ => f64::NAN,
        }
    }

    pub fn create(&self) -> Accumulator {
        match self {
            Self::Sum => Accumulator::Sum(0.0),
            Self::Prod => Accumulator::Prod(1.0),
            Self::Count => Accumulator::Count(0),
            Self::Mean => Accumulator::Mean { sum: 0.0, count: 0 },
            Self::Var { .. } | Self::Std { .. } => Accumulator::Moments {
                count: 0,
                mean: 0.0,
                m2: 0.0,
            },
            Self::Min | Self::Max => Accumulator::Extreme(None),
            Self::First | Self::Last => Accumulator::Positioned(None),
            Self::Median => Accumulator::Values(Vec::new()),
        }
    }

    /// Fold one value, found at `pos` along the grouping dimension, into `acc`.
    pub fn add_input(&self, acc: &mut Accumulator, pos: usize, v: f64) {
        if v.is_nan() {
            return;
        }
        match acc {
            Accumulator::Sum(s) => *s += v,
            Accumulator::Prod(p) => *p *= v,
            Accumulator::Count(n) => *n += 1,
            Accumulator::Mean { sum, count } => {
                *sum += v;
                *count += 1;
            }
            Accumulator::Moments { count, mean, m2 } => {
                // Welford
                *count += 1;
                let delta = v - *mean;
                *mean += delta / *count as f64;
                *m2 += delta * (v - *mean);
            }
            Accumulator::Extreme(cur) => self.add_input_extreme(cur, v),
            Accumulator::Positioned(cur) => {
                if self.takes_position(cur.map(|(p, _)| p), pos) {
                    *cur = Some((pos, v));
                }
            }
            Accumulator::Values(vals) => vals.push(v),
        }
    }

    fn takes_position(&self, current: Option<usize>, candidate: usize) -> bool {
        match current {
            None => true,
            Some(p) if matches!(self, Self::Last) => candidate > p,
            Some(p) => candidate < p,
        }
    }

    /// Merge `other` into `acc`.
    ///
    /// # Errors
    /// [`GroupbyError::Aggregation`] when the aggregation has no merge rule,
    /// [`GroupbyError::InvariantViolation`] when the accumulators do not match.
    pub fn merge(&self, acc: &mut Accumulator, other: Accumulator) -> Result<()> {
        if self.merge_rule() == MergeRule::NotMergeable {
            bail!(GroupbyError::Aggregation(format!(
                "{} has no merge rule for partial results",
                self.name()
            )));
        }
        match (acc, other) {
            (Accumulator::Sum(a), Accumulator::Sum(b)) => *a += b,
            (Accumulator::Prod(a), Accumulator::Prod(b)) => *a *= b,
            (Accumulator::Count(a), Accumulator::Count(b)) => *a += b,
            (Accumulator::Mean { sum, count }, Accumulator::Mean { sum: s2, count: c2 }) => {
                *sum += s2;
                *count += c2;
            }
            (
                Accumulator::Moments { count, mean, m2 },
                Accumulator::Moments {
                    count: nb,
                    mean: mb,
                    m2: m2b,
                },
            ) => {
                if nb == 0 {
                    return Ok(());
                }
                let na = *count as f64;
                let n = na + nb as f64;
                let delta = mb - *mean;
                *mean += delta * nb as f64 / n;
                *m2 += m2b + delta * delta * na * nb as f64 / n;
                *count += nb;
            }
            (Accumulator::Extreme(a), Accumulator::Extreme(Some(v))) => self.add_input_extreme(a, v),
            (Accumulator::Extreme(_), Accumulator::Extreme(None)) => {}
            (Accumulator::Positioned(a), Accumulator::Positioned(Some((pos, v)))) => {
                if self.takes_position(a.map(|(p, _)| p), pos) {
                    *a = Some((pos, v));
                }
            }
            (Accumulator::Positioned(_), Accumulator::Positioned(None)) => {}
            (a, b) => bail!(GroupbyError::InvariantViolation(format!(
                "cannot merge {b:?} into {a:?} for {}",
                self.name()
            ))),
        }
        Ok(())
    }

    fn add_input_extreme(&self, cur: &mut Option<f64>, v: f64) {
        *cur = Some(match *cur {
            None => v,
            Some(c) if matches!(self, Self::Max) => c.max(v),
            Some(c) => c.min(v),
        });
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn finish(&self, acc: Accumulator) -> f64 {
        match acc {
            Accumulator::Sum(s) => s,
            Accumulator::Prod(p) => p,
            Accumulator::Count(n) => n as f64,
            Accumulator::Mean { count: 0, .. } => f64::NAN,
            Accumulator::Mean { sum, count } => sum / count as f64,
            Accumulator::Moments { count, m2, .. } => {
                let ddof = match self {
                    Self::Var { ddof } | Self::Std { ddof } => u64::from(*ddof),
                    _ => 0,
                };
                if count <= ddof {
                    return f64::NAN;
                }
                let var = m2 / (count - ddof) as f64;
                if matches!(self, Self::Std { .. }) { var.sqrt() } else { var }
            }
            Accumulator::Extreme(v) => v.unwrap_or(f64::NAN),
            Accumulator::Positioned(v) => v.map_or(f64::NAN, |(_, x)| x),
            Accumulator::Values(mut vals) => median(&mut vals),
        }
    }
}

fn median(vals: &mut [f64]) -> f64 {
    if vals.is_empty() {
        return f64::NAN;
    }
    vals.sort_by(f64::total_cmp);
    let mid = vals.len() / 2;
    if vals.len() % 2 == 0 {
        (vals[mid - 1] + vals[mid]) / 2.0
    } else {
        vals[mid]
    }
}

impl FromStr for Aggregation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl Display for Aggregation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var { ddof } | Self::Std { ddof } if *ddof != 0 => write!(f, "{}(ddof={ddof})", self.name()),
            _ => f.write_str(self.name()),
        }
    }
}
