//! Assertion functions for reduction outputs.

use crate::densify::CanonicalResult;

/// Whether `a` and `b` agree within `tol`, treating two NaNs as equal.
pub fn values_close(a: f64, b: f64, tol: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a == b || (a - b).abs() <= tol
}

/// Assert element-wise closeness of two value slices. NaN matches NaN.
///
/// # Panics
///
/// Panics if lengths differ or any pair differs by more than `tol`.
///
/// # Example
///
/// ```
/// use groupbeam::testing::assert_values_close;
///
/// assert_values_close(&[1.0, f64::NAN], &[1.0 + 1e-12, f64::NAN], 1e-9);
/// ```
pub fn assert_values_close(actual: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Value length mismatch:\n  Expected length: {}\n  Actual length: {}\n  Expected: {expected:?}\n  Actual: {actual:?}",
        expected.len(),
        actual.len()
    );
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            values_close(*a, *e, tol),
            "Value mismatch at index {i}:\n  Expected: {e}\n  Actual: {a}\n  Full expected: {expected:?}\n  Full actual: {actual:?}"
        );
    }
}

/// Assert a dense result's shape and values (NaN-aware, exact up to `1e-9`).
///
/// # Panics
///
/// Panics on a shape or value mismatch.
pub fn assert_dense_eq(result: &CanonicalResult, shape: &[usize], values: &[f64]) {
    assert_eq!(
        result.shape, shape,
        "Shape mismatch for dims {:?}:\n  Expected: {shape:?}\n  Actual: {:?}",
        result.dims, result.shape
    );
    assert_values_close(&result.values, values, 1e-9);
}

/// Assert that `chunks` is a valid partitioning of `labels` that splits no group.
///
/// # Panics
///
/// Panics if a chunk is empty, the chunks do not cover `labels`, or a chunk
/// boundary falls between two elements with the same label.
///
/// # Example
///
/// ```
/// use groupbeam::testing::assert_partitioning_valid;
///
/// assert_partitioning_valid(&[3, 2], &[0, 0, 0, 1, 1]);
/// ```
pub fn assert_partitioning_valid(chunks: &[usize], labels: &[i64]) {
    assert!(
        chunks.iter().all(|&c| c > 0),
        "Partitioning contains an empty chunk: {chunks:?}"
    );
    let total: usize = chunks.iter().sum();
    assert_eq!(
        total,
        labels.len(),
        "Partitioning {chunks:?} covers {total} elements, labels have {}",
        labels.len()
    );
    let mut end = 0;
    for &c in &chunks[..chunks.len().saturating_sub(1)] {
        end += c;
        assert_ne!(
            labels[end - 1],
            labels[end],
            "Chunk boundary at {end} splits group {}:\n  Chunks: {chunks:?}\n  Labels: {labels:?}",
            labels[end]
        );
    }
}
