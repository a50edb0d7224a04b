//! Convolution layer with fixed (untrained) filters.
use super::{ConvolutionData, Layer, LayerShape, LayerType};
use crate::activations::Activation;
use crate::error::{NnError, NnResult};
use crate::tensor::Tensor;

/// Applies every filter to every input frame as a zero-padded
/// cross-correlation centred on the filter midpoint, then activates the
/// whole output once.
///
/// Filter `k` applied to input frame `f` lands in output frame
/// `k * input_frames + f`, so the output has `input_frames * filters` frames
/// of the same rows and columns as the input.
///
/// Filters are never updated: `back_propagate` hands back the cached input.
#[derive(Debug, Clone)]
pub struct ConvolutionLayer {
    input_shape: LayerShape,
    output_shape: LayerShape,
    inputs: Tensor,
    outputs: Tensor,
    filters: Vec<Tensor>,
    activation: Activation,
}

impl ConvolutionLayer {
    pub fn new(
        input_rows: usize,
        input_cols: usize,
        input_frames: usize,
        filters: Vec<Tensor>,
        activation: Activation,
    ) -> NnResult<Self> {
        if filters.is_empty() {
            return Err(NnError::InvalidArgument("convolution needs at least one filter".into()));
        }
        for filter in &filters {
            if filter.frames() != 1 || filter.rows() % 2 == 0 || filter.cols() % 2 == 0 {
                return Err(NnError::InvalidArgument(format!(
                    "filters must be a single frame with odd rows and cols, got {}",
                    filter.dims()
                )));
            }
        }
        let input_shape = LayerShape::new(input_rows, input_cols, input_frames);
        let output_shape = LayerShape::new(input_rows, input_cols, input_frames * filters.len());
        Ok(Self {
            input_shape,
            output_shape,
            inputs: input_shape.zeros(),
            outputs: output_shape.zeros(),
            filters,
            activation,
        })
    }

    pub fn filters(&self) -> &[Tensor] {
        &self.filters
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub(crate) fn to_data(&self) -> ConvolutionData {
        ConvolutionData {
            input_rows: self.input_shape.rows,
            input_cols: self.input_shape.cols,
            input_frames: self.input_shape.frames,
            filters: self
                .filters
                .iter()
                .map(|filter| filter.to_nested().into_iter().next().unwrap_or_default())
                .collect(),
            activation: self.activation,
        }
    }

    pub(crate) fn from_data(data: ConvolutionData) -> NnResult<Self> {
        if data.filters.iter().any(|filter| filter.iter().all(Vec::is_empty)) {
            return Err(NnError::InvalidArgument("saved filters must not be empty".into()));
        }
        let filters = data
            .filters
            .iter()
            .map(|filter| Tensor::from_2d(filter))
            .collect::<NnResult<Vec<_>>>()?;
        Self::new(data.input_rows, data.input_cols, data.input_frames, filters, data.activation)
    }
}

/// Zero-padded cross-correlation of one `rows × cols` plane with `filter`,
/// centred at (`row`, `col`).
fn correlate(plane: &[f32], rows: usize, cols: usize, row: usize, col: usize, filter: &Tensor) -> f32 {
    let (half_rows, half_cols) = (filter.rows() / 2, filter.cols() / 2);
    let weights = filter.as_slice();
    let mut sum = 0.0f32;
    for fr in 0..filter.rows() {
        let Some(r) = (row + fr).checked_sub(half_rows).filter(|&r| r < rows) else {
            continue;
        };
        for fc in 0..filter.cols() {
            let Some(c) = (col + fc).checked_sub(half_cols).filter(|&c| c < cols) else {
                continue;
            };
            sum += plane[r * cols + c] * weights[fr * filter.cols() + fc];
        }
    }
    sum
}

impl Layer for ConvolutionLayer {
    fn layer_type(&self) -> LayerType {
        LayerType::Convolution
    }

    fn input_shape(&self) -> LayerShape {
        self.input_shape
    }

    fn output_shape(&self) -> LayerShape {
        self.output_shape
    }

    fn feed_forward(&mut self, input: &Tensor) -> NnResult<Tensor> {
        self.inputs.set_all(input)?;
        let (rows, cols, frames) = (self.input_shape.rows, self.input_shape.cols, self.input_shape.frames);
        let plane_size = rows * cols;
        let source = input.as_slice();
        let filters = &self.filters;
        self.outputs.apply_function(|_, out_frame, row, col| {
            let filter = &filters[out_frame / frames];
            let start = (out_frame % frames) * plane_size;
            correlate(&source[start..start + plane_size], rows, cols, row, col, filter)
        });
        self.activation.function(&mut self.outputs);
        Ok(self.outputs.clone())
    }

    fn back_propagate(&mut self, _delta: &Tensor, _learning_rate: f32, _momentum: f32) -> NnResult<Tensor> {
        Ok(self.inputs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{HORIZONTAL_EDGES, VERTICAL_EDGES};

    fn sample() -> Tensor {
        Tensor::from_2d(&[
            vec![0.0, 1.0, 0.5, 1.0, 0.0],
            vec![0.5, 1.0, 0.5, 1.0, 0.5],
            vec![0.0, 0.5, 0.5, 0.5, 0.0],
            vec![0.5, 1.0, 1.0, 1.0, 0.5],
            vec![0.0, 0.0, 0.5, 0.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn vertical_edges_with_relu() {
        let mut layer =
            ConvolutionLayer::new(5, 5, 1, vec![VERTICAL_EDGES.clone()], Activation::Relu).unwrap();
        let out = layer.feed_forward(&sample()).unwrap();
        let expected = Tensor::from_2d(&[
            vec![2.0, 0.5, 0.0, 0.0, 0.0],
            vec![2.5, 1.0, 0.0, 0.0, 0.0],
            vec![2.5, 1.0, 0.0, 0.0, 0.0],
            vec![1.5, 1.5, 0.0, 0.0, 0.0],
            vec![1.0, 1.0, 0.0, 0.0, 0.0],
        ])
        .unwrap();
        assert_eq!(out, expected);
        assert_eq!(layer.back_propagate(&out, 0.0, 0.0).unwrap(), sample());
    }

    #[test]
    fn each_filter_gets_its_own_frame() {
        let filters = vec![VERTICAL_EDGES.clone(), HORIZONTAL_EDGES.clone()];
        let mut layer = ConvolutionLayer::new(5, 5, 1, filters, Activation::Relu).unwrap();
        assert_eq!(layer.output_shape(), LayerShape::new(5, 5, 2));
        let out = layer.feed_forward(&sample()).unwrap();
        assert_eq!(out.frame(0).unwrap()[0], vec![2.0, 0.5, 0.0, 0.0, 0.0]);
        assert_eq!(out.frame(1).unwrap()[0], vec![1.5, 2.0, 2.5, 2.0, 1.5]);
        assert_eq!(out.frame(1).unwrap()[2], vec![0.0, 0.5, 0.5, 0.5, 0.0]);
    }

    #[test]
    fn rejects_even_filters() {
        let even = Tensor::zeros_2d(2, 2);
        assert!(matches!(
            ConvolutionLayer::new(4, 4, 1, vec![even], Activation::Relu),
            Err(NnError::InvalidArgument(_))
        ));
        assert!(ConvolutionLayer::new(4, 4, 1, vec![], Activation::Relu).is_err());
    }

    #[test]
    fn empty_saved_filter_is_rejected() {
        let mut data = ConvolutionLayer::new(4, 4, 1, vec![VERTICAL_EDGES.clone()], Activation::Relu)
            .unwrap()
            .to_data();
        data.filters.push(vec![]);
        assert!(matches!(ConvolutionLayer::from_data(data.clone()), Err(NnError::InvalidArgument(_))));
        data.filters[1] = vec![vec![]];
        assert!(matches!(ConvolutionLayer::from_data(data), Err(NnError::InvalidArgument(_))));
    }
}
