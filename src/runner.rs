//! Execution of partition-local work.
//!
//! A [`Runner`] maps a function over partitions either on the calling thread or
//! on a Rayon pool. Results always come back in partition order, independent of
//! which partition finished first, so downstream merges are deterministic.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecMode {
    Sequential,
    /// `threads: None` uses the global Rayon pool.
    Parallel { threads: Option<usize> },
}

impl Default for ExecMode {
    fn default() -> Self {
        Self::Parallel { threads: None }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Runner {
    pub mode: ExecMode,
}

impl Runner {
    pub fn new(mode: ExecMode) -> Self {
        Self { mode }
    }

    pub fn sequential() -> Self {
        Self::new(ExecMode::Sequential)
    }

    /// Number of workers a parallel run would use.
    pub fn workers(&self) -> usize {
        match self.mode {
            ExecMode::Sequential => 1,
            ExecMode::Parallel { threads: Some(t) } => t.max(1),
            ExecMode::Parallel { threads: None } => num_cpus::get().max(1),
        }
    }

    /// Apply `f` to every partition and collect the results in input order.
    /// The first failing partition fails the whole call.
    pub fn map_partitions<I, O, F>(&self, parts: Vec<I>, f: F) -> Result<Vec<O>>
    where
        I: Send,
        O: Send,
        F: Fn(I) -> Result<O> + Send + Sync,
    {
        trace!(partitions = parts.len(), mode = ?self.mode, "running partition-local work");
        match self.mode {
            ExecMode::Sequential => parts.into_iter().map(f).collect(),
            ExecMode::Parallel { threads } => run_parallel(parts, f, threads),
        }
    }
}

#[cfg(feature = "parallel")]
fn run_parallel<I, O, F>(parts: Vec<I>, f: F, threads: Option<usize>) -> Result<Vec<O>>
where
    I: Send,
    O: Send,
    F: Fn(I) -> Result<O> + Send + Sync,
{
    use anyhow::Context;
    use rayon::prelude::*;

    match threads {
        None => parts.into_par_iter().map(f).collect(),
        Some(t) => {
            // scoped pool; the global pool stays untouched
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(t.max(1))
                .build()
                .context("building partition worker pool")?;
            pool.install(|| parts.into_par_iter().map(f).collect())
        }
    }
}

#[cfg(not(feature = "parallel"))]
fn run_parallel<I, O, F>(parts: Vec<I>, f: F, _threads: Option<usize>) -> Result<Vec<O>>
where
    I: Send,
    O: Send,
    F: Fn(I) -> Result<O> + Send + Sync,
{
    parts.into_iter().map(f).collect()
}
