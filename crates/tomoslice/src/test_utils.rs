//! Shared test utilities for synthetic projection stacks.

use ndarray::Array3;

use crate::volume::ProjectionStack;

/// Build a strictly increasing ramp stack of shape `(angles, rows, cols)`.
///
/// Values run `0, 1, 2, ...` in row-major order, so the stack always has
/// non-zero dynamic range and a unique min/max pair.
pub(crate) fn ramp_stack(angles: usize, rows: usize, cols: usize) -> ProjectionStack {
    let mut stack = Array3::zeros((angles, rows, cols));
    for (i, v) in stack.iter_mut().enumerate() {
        *v = i as f32;
    }
    stack
}
