//! Pooling layer: reduces non-overlapping square blocks of every frame.
use super::{Layer, LayerShape, LayerType, PoolingData};
use crate::error::{NnError, NnResult};
use crate::pooling::PoolingMethod;
use crate::tensor::Tensor;

/// Downsamples each frame by `pool_size` in both directions.
///
/// Output extents are `floor(rows / pool_size) × floor(cols / pool_size)`
/// with the same number of frames; trailing rows and columns that do not
/// fill a whole block are ignored. Nothing is learned, so `back_propagate`
/// returns the cached input.
#[derive(Debug, Clone)]
pub struct PoolingLayer {
    input_shape: LayerShape,
    output_shape: LayerShape,
    inputs: Tensor,
    outputs: Tensor,
    pool_size: usize,
    method: PoolingMethod,
}

impl PoolingLayer {
    pub fn new(
        input_rows: usize,
        input_cols: usize,
        input_frames: usize,
        pool_size: usize,
        method: PoolingMethod,
    ) -> NnResult<Self> {
        if pool_size == 0 || pool_size > input_rows || pool_size > input_cols {
            return Err(NnError::InvalidArgument(format!(
                "pool size {pool_size} must be between 1 and {}",
                input_rows.min(input_cols)
            )));
        }
        let input_shape = LayerShape::new(input_rows, input_cols, input_frames);
        let output_shape = LayerShape::new(input_rows / pool_size, input_cols / pool_size, input_frames);
        Ok(Self {
            input_shape,
            output_shape,
            inputs: input_shape.zeros(),
            outputs: output_shape.zeros(),
            pool_size,
            method,
        })
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn method(&self) -> PoolingMethod {
        self.method
    }

    pub(crate) fn to_data(&self) -> PoolingData {
        PoolingData {
            input_rows: self.input_shape.rows,
            input_cols: self.input_shape.cols,
            input_frames: self.input_shape.frames,
            pool_size: self.pool_size,
            pooling: self.method,
        }
    }

    pub(crate) fn from_data(data: PoolingData) -> NnResult<Self> {
        Self::new(data.input_rows, data.input_cols, data.input_frames, data.pool_size, data.pooling)
    }
}

impl Layer for PoolingLayer {
    fn layer_type(&self) -> LayerType {
        LayerType::Pooling
    }

    fn input_shape(&self) -> LayerShape {
        self.input_shape
    }

    fn output_shape(&self) -> LayerShape {
        self.output_shape
    }

    fn feed_forward(&mut self, input: &Tensor) -> NnResult<Tensor> {
        self.inputs.set_all(input)?;
        let (rows, cols) = (self.input_shape.rows, self.input_shape.cols);
        let plane_size = rows * cols;
        let (pool_size, method) = (self.pool_size, self.method);
        let source = input.as_slice();
        self.outputs.apply_function(|_, frame, row, col| {
            let plane = &source[frame * plane_size..(frame + 1) * plane_size];
            method.pooled_value(plane, cols, row * pool_size, col * pool_size, pool_size)
        });
        Ok(self.outputs.clone())
    }

    fn back_propagate(&mut self, _delta: &Tensor, _learning_rate: f32, _momentum: f32) -> NnResult<Tensor> {
        Ok(self.inputs.clone())
    }
}
