//! Flatten layer: reshapes any input into a single row.
use super::{FlattenData, Layer, LayerShape, LayerType};
use crate::error::NnResult;
use crate::tensor::Tensor;

/// Copies all input values, frame by frame then row by row, into a
/// `1 × (rows·cols·frames) × 1` tensor so a dense layer can follow a
/// convolution or pooling stage.
#[derive(Debug, Clone)]
pub struct FlattenLayer {
    input_shape: LayerShape,
    output_shape: LayerShape,
    inputs: Tensor,
}

impl FlattenLayer {
    pub fn new(input_rows: usize, input_cols: usize, input_frames: usize) -> Self {
        let input_shape = LayerShape::new(input_rows, input_cols, input_frames);
        Self {
            input_shape,
            output_shape: LayerShape::new(1, input_shape.size(), 1),
            inputs: input_shape.zeros(),
        }
    }

    pub(crate) fn to_data(&self) -> FlattenData {
        FlattenData {
            input_rows: self.input_shape.rows,
            input_cols: self.input_shape.cols,
            input_frames: self.input_shape.frames,
        }
    }

    pub(crate) fn from_data(data: FlattenData) -> NnResult<Self> {
        Ok(Self::new(data.input_rows, data.input_cols, data.input_frames))
    }
}

impl Layer for FlattenLayer {
    fn layer_type(&self) -> LayerType {
        LayerType::Flatten
    }

    fn input_shape(&self) -> LayerShape {
        self.input_shape
    }

    fn output_shape(&self) -> LayerShape {
        self.output_shape
    }

    fn feed_forward(&mut self, input: &Tensor) -> NnResult<Tensor> {
        self.inputs.set_all(input)?;
        let values = input.as_slice();
        let mut output = self.output_shape.zeros();
        output.apply_function(|_, _, _, col| values[col]);
        Ok(output)
    }

    fn back_propagate(&mut self, _delta: &Tensor, _learning_rate: f32, _momentum: f32) -> NnResult<Tensor> {
        Ok(self.inputs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_frames_in_order() {
        let mut input = Tensor::zeros(3, 2, 3);
        input.apply_function(|_, frame, row, col| (frame * 6 + row * 3 + col + 1) as f32);
        let mut layer = FlattenLayer::new(2, 3, 3);
        let out = layer.feed_forward(&input).unwrap();
        let expected: Vec<f32> = (1..=18).map(|v| v as f32).collect();
        assert_eq!(out, Tensor::from_1d(&expected));
        assert_eq!(layer.back_propagate(&out, 0.1, 0.0).unwrap(), input);
    }

    #[test]
    fn rejects_mismatched_input() {
        let mut layer = FlattenLayer::new(2, 2, 1);
        assert!(layer.feed_forward(&Tensor::zeros_1d(4)).is_err());
    }

    #[test]
    fn zero_extent_output_matches_declared_shape() {
        let mut layer = FlattenLayer::new(2, 0, 3);
        assert_eq!(layer.output_shape(), LayerShape::new(1, 0, 1));
        let out = layer.feed_forward(&Tensor::zeros(3, 2, 0)).unwrap();
        assert_eq!((out.frames(), out.rows(), out.cols()), (1, 1, 0));
        assert!(out.is_empty());
    }
}
