//! Fixed 3×3 edge-detection filters for convolution layers.
//!
//! Built once on first use and never mutated; layers take their own copies.
use crate::tensor::Tensor;
use std::sync::LazyLock;

fn filter(rows: [[f32; 3]; 3]) -> Tensor {
    let mut tensor = Tensor::zeros_2d(3, 3);
    tensor.apply_function(|_, _, row, col| rows[row][col]);
    tensor
}

/// Emphasises vertical edges.
pub static VERTICAL_EDGES: LazyLock<Tensor> =
    LazyLock::new(|| filter([[-1.0, 0.0, 1.0], [-1.0, 0.0, 1.0], [-1.0, 0.0, 1.0]]));

/// Emphasises horizontal edges.
pub static HORIZONTAL_EDGES: LazyLock<Tensor> =
    LazyLock::new(|| filter([[-1.0, -1.0, -1.0], [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]));
