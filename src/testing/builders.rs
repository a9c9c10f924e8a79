//! Builders for labels and chunked arrays.

use crate::array::ChunkedArray;
use crate::boundaries::labels_from_run_lengths;
use anyhow::Result;

/// Fluent builder for sequential (resample-style) label arrays.
///
/// # Example
///
/// ```
/// use groupbeam::testing::LabelBuilder;
///
/// let labels = LabelBuilder::new().run(2).runs(&[1, 3]).build();
/// assert_eq!(labels, vec![0, 0, 1, 2, 2, 2]);
/// ```
#[derive(Default)]
pub struct LabelBuilder {
    runs: Vec<usize>,
}

impl LabelBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self { runs: Vec::new() }
    }

    /// Add one group spanning `len` elements.
    #[must_use]
    pub fn run(mut self, len: usize) -> Self {
        self.runs.push(len);
        self
    }

    #[must_use]
    pub fn runs(mut self, lens: &[usize]) -> Self {
        self.runs.extend_from_slice(lens);
        self
    }

    /// Total number of elements the labels will cover.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.iter().sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn build(self) -> Vec<i64> {
        labels_from_run_lengths(&self.runs)
    }
}

/// Fluent builder for `f64` chunked arrays.
///
/// Dimensions are added in order; values default to `0, 1, 2, …` in row-major
/// order and every dimension defaults to a single chunk.
///
/// # Example
///
/// ```
/// use groupbeam::testing::ArrayBuilder;
///
/// let a = ArrayBuilder::new()
///     .dim("x", 2)
///     .dim("time", 5)
///     .chunks("time", &[2, 3])
///     .build()?;
/// assert_eq!(a.shape(), &[2, 5]);
/// assert_eq!(a.chunks("time")?, &[2, 3]);
/// assert_eq!(a.values()[7], 7.0);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Default)]
pub struct ArrayBuilder {
    dims: Vec<(String, usize, Option<Vec<usize>>)>,
    values: Option<Vec<f64>>,
}

impl ArrayBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn dim(mut self, name: &str, len: usize) -> Self {
        self.dims.push((name.to_string(), len, None));
        self
    }

    /// Partition sizes for a dimension added earlier. Unknown names are ignored.
    #[must_use]
    pub fn chunks(mut self, name: &str, sizes: &[usize]) -> Self {
        if let Some(d) = self.dims.iter_mut().find(|(n, _, _)| n == name) {
            d.2 = Some(sizes.to_vec());
        }
        self
    }

    #[must_use]
    pub fn values(mut self, values: Vec<f64>) -> Self {
        self.values = Some(values);
        self
    }

    pub fn build(self) -> Result<ChunkedArray<f64>> {
        let shape: Vec<usize> = self.dims.iter().map(|(_, n, _)| *n).collect();
        let total: usize = shape.iter().product();
        #[allow(clippy::cast_precision_loss)]
        let values = self.values.unwrap_or_else(|| (0..total).map(|i| i as f64).collect());
        let chunks = self
            .dims
            .iter()
            .map(|(_, n, c)| c.clone().unwrap_or_else(|| if *n == 0 { Vec::new() } else { vec![*n] }))
            .collect();
        let names = self.dims.into_iter().map(|(n, _, _)| n).collect();
        ChunkedArray::with_chunks(names, shape, chunks, values)
    }
}
