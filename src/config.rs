//! Options for [`reduce`](crate::reduce::reduce).
//!
//! Options can be built in code or loaded from JSON:
//!
//! ```
//! use groupbeam::{ExecMode, ReduceOptions};
//!
//! let opts = ReduceOptions::from_json_str(r#"{
//!     "dim": "time",
//!     "fill_value": -1.0,
//!     "blockwise": true,
//!     "exec_mode": "sequential"
//! }"#)?;
//! assert_eq!(opts.dim.as_deref(), Some("time"));
//! assert_eq!(opts.exec_mode, ExecMode::Sequential);
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::key::ExpectedGroups;
use crate::runner::ExecMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReduceOptions {
    /// Grouping dimension. Defaults to the array's last dimension.
    pub dim: Option<String>,
    /// One optional domain per key.
    pub expected_groups: Option<Vec<Option<ExpectedGroups>>>,
    /// Value for groups with no observations. Defaults to the aggregation's fill.
    pub fill_value: Option<f64>,
    /// Reduce each partition independently; requires group-aligned partitions.
    pub blockwise: bool,
    pub exec_mode: ExecMode,
}

impl ReduceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_dim(mut self, dim: impl Into<String>) -> Self {
        self.dim = Some(dim.into());
        self
    }

    /// Expected groups for every key, in key order.
    #[must_use]
    pub fn with_expected_groups(mut self, groups: Vec<Option<ExpectedGroups>>) -> Self {
        self.expected_groups = Some(groups);
        self
    }

    #[must_use]
    pub fn with_fill_value(mut self, fill: f64) -> Self {
        self.fill_value = Some(fill);
        self
    }

    #[must_use]
    pub fn blockwise(mut self, on: bool) -> Self {
        self.blockwise = on;
        self
    }

    #[must_use]
    pub fn with_exec_mode(mut self, mode: ExecMode) -> Self {
        self.exec_mode = mode;
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("parsing reduce options")
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("reading reduce options from {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("in {}", path.display()))
    }
}
