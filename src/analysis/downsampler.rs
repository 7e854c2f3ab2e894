//! Stride decimation of plotted series.
//!
//! One plan is computed per analysis and applied to every series (time axis,
//! errors, temperature traces) so they stay index-aligned.

/// Decimation parameters for a series of `original_length` points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimationPlan {
    stride: usize,
    original_length: usize,
    downsampled: bool,
}

impl DecimationPlan {
    /// `stride = len / max_points` when `len > max_points`, else 1.
    /// `max_points` of zero is treated as 1.
    pub fn new(original_length: usize, max_points: usize) -> Self {
        let max_points = max_points.max(1);
        let downsampled = original_length > max_points;
        let stride = if downsampled {
            original_length / max_points
        } else {
            1
        };
        Self {
            stride,
            original_length,
            downsampled,
        }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn original_length(&self) -> usize {
        self.original_length
    }

    /// True whenever the input was longer than the budget, even if the
    /// stride came out as 1.
    pub fn is_downsampled(&self) -> bool {
        self.downsampled
    }

    /// Length of every decimated series, `ceil(len / stride)`.
    pub fn output_length(&self) -> usize {
        self.original_length.div_ceil(self.stride)
    }

    /// Keep positions `0, stride, 2*stride, ...`.
    pub fn apply<T: Clone>(&self, series: &[T]) -> Vec<T> {
        series.iter().step_by(self.stride).cloned().collect()
    }

    /// Original indices of the kept points.
    pub fn sampled_indices(&self) -> Vec<usize> {
        (0..self.original_length).step_by(self.stride).collect()
    }

    /// Position of original index `i` in the decimated series, if kept.
    pub fn remap_index(&self, i: usize) -> Option<usize> {
        (i < self.original_length && i % self.stride == 0).then(|| i / self.stride)
    }

    /// Remap anomaly indices, dropping those that fall between samples.
    pub fn remap_indices(&self, indices: &[usize]) -> Vec<usize> {
        indices.iter().filter_map(|&i| self.remap_index(i)).collect()
    }
}
