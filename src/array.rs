//! In-memory chunked N-dimensional array.
//!
//! [`ChunkedArray`] is the minimal partitioned-array surface the reduction core
//! needs: named dimensions, per-dimension partition sizes, and a `rechunk`
//! operation that returns a new logical view over the same values.
//!
//! Values are stored row-major and shared behind an [`Arc`], so rechunking
//! never copies data.
//!
//! ```
//! use groupbeam::ChunkedArray;
//!
//! let a = ChunkedArray::from_vec(vec!["time"], vec![6], (0..6).map(f64::from).collect())?;
//! let b = a.rechunk("time", &[2, 4])?;
//! assert_eq!(b.chunks("time")?, &[2, 4]);
//! assert_eq!(a.chunks("time")?, &[6]);
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::error::GroupbyError;
use anyhow::Result;
use std::sync::Arc;

/// A partitioning: ordered, positive partition sizes summing to a dimension length.
pub type Chunks = Vec<usize>;

#[derive(Clone, Debug)]
pub struct ChunkedArray<T> {
    dims: Vec<String>,
    shape: Vec<usize>,
    chunks: Vec<Chunks>,
    values: Arc<Vec<T>>,
}

impl<T> ChunkedArray<T> {
    /// Build an array with a single chunk along every dimension.
    pub fn from_vec<S: Into<String>>(dims: Vec<S>, shape: Vec<usize>, values: Vec<T>) -> Result<Self> {
        let chunks = shape.iter().map(|&n| if n == 0 { Vec::new() } else { vec![n] }).collect();
        Self::with_chunks(dims, shape, chunks, values)
    }

    /// Build an array with explicit partition sizes per dimension.
    pub fn with_chunks<S: Into<String>>(
        dims: Vec<S>,
        shape: Vec<usize>,
        chunks: Vec<Chunks>,
        values: Vec<T>,
    ) -> Result<Self> {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        if dims.len() != shape.len() || chunks.len() != shape.len() {
            return Err(GroupbyError::invalid(format!(
                "got {} dims, {} shape entries and {} chunk specs",
                dims.len(),
                shape.len(),
                chunks.len()
            ))
            .into());
        }
        for (i, d) in dims.iter().enumerate() {
            if dims[..i].contains(d) {
                return Err(GroupbyError::invalid(format!("duplicate dimension {d:?}")).into());
            }
        }
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(GroupbyError::invalid(format!(
                "shape {shape:?} needs {expected} values, got {}",
                values.len()
            ))
            .into());
        }
        for ((d, &n), c) in dims.iter().zip(&shape).zip(&chunks) {
            validate_chunks(d, n, c)?;
        }
        Ok(Self {
            dims,
            shape,
            chunks,
            values: Arc::new(values),
        })
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Position of the named dimension.
    pub fn axis_of(&self, dim: &str) -> Result<usize> {
        self.dims
            .iter()
            .position(|d| d == dim)
            .ok_or_else(|| GroupbyError::invalid(format!("no dimension named {dim:?} in {:?}", self.dims)).into())
    }

    /// Partition sizes along `dim`.
    pub fn chunks(&self, dim: &str) -> Result<&[usize]> {
        let axis = self.axis_of(dim)?;
        Ok(&self.chunks[axis])
    }

    pub fn chunks_at(&self, axis: usize) -> &[usize] {
        &self.chunks[axis]
    }

    /// True when values are resident. Always the case for this in-memory array.
    pub fn is_materialized(&self) -> bool {
        true
    }

    /// Same values, new partitioning along `dim`. Every other dimension keeps its chunks.
    pub fn rechunk(&self, dim: &str, sizes: &[usize]) -> Result<Self> {
        let axis = self.axis_of(dim)?;
        validate_chunks(dim, self.shape[axis], sizes)?;
        let mut chunks = self.chunks.clone();
        chunks[axis] = sizes.to_vec();
        Ok(Self {
            dims: self.dims.clone(),
            shape: self.shape.clone(),
            chunks,
            values: Arc::clone(&self.values),
        })
    }

    /// `(outer, len, inner)` strides for viewing the array as a 3-d block around `axis`.
    pub(crate) fn split_around(&self, axis: usize) -> (usize, usize, usize) {
        let outer = self.shape[..axis].iter().product();
        let inner = self.shape[axis + 1..].iter().product();
        (outer, self.shape[axis], inner)
    }

    /// Whether two arrays share the same underlying value buffer.
    pub fn shares_values_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }
}

fn validate_chunks(dim: &str, len: usize, chunks: &[usize]) -> Result<()> {
    if chunks.iter().any(|&c| c == 0) {
        return Err(GroupbyError::invalid(format!("zero-sized chunk along {dim:?}: {chunks:?}")).into());
    }
    let total: usize = chunks.iter().sum();
    if total != len {
        return Err(GroupbyError::invalid(format!(
            "chunks {chunks:?} along {dim:?} sum to {total}, dimension has length {len}"
        ))
        .into());
    }
    Ok(())
}
