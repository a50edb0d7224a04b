//! Error types shared by the tensor engine, the layers and the networks.
use std::fmt;
use thiserror::Error;

/// Extents of a tensor as (frames, rows, cols).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dims {
    pub frames: usize,
    pub rows: usize,
    pub cols: usize,
}

impl Dims {
    pub const fn new(frames: usize, rows: usize, cols: usize) -> Self {
        Self { frames, rows, cols }
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.frames, self.rows, self.cols)
    }
}

/// Every recoverable failure in the library.
///
/// Errors propagate unchanged: a failure in any layer aborts the whole
/// forward or backward pass and is returned to the caller of the network.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NnError {
    /// Operands of an arithmetic or copy operation have incompatible extents.
    #[error("dimensions must match: {left} != {right}")]
    DimensionMismatch { left: Dims, right: Dims },

    /// A layer does not fit the stack, or a destination buffer has the wrong shape.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: Dims, actual: Dims },

    /// Element index outside the tensor extents.
    #[error("index {index} out of bounds for tensor of extent {extent}")]
    OutOfBounds { index: Dims, extent: Dims },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Structural change refused by an autoencoder.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

pub type NnResult<T> = Result<T, NnError>;
