//! Dense layer implementation with weights, bias, momentum and an activation function.
use super::{check_shape, DenseData, Layer, LayerShape, LayerType};
use crate::activations::Activation;
use crate::error::{Dims, NnError, NnResult};
use crate::linalg::{matrix_multiply, matrix_transpose};
use crate::tensor::Tensor;
use rand::Rng;

/// A fully-connected layer: `output = activation(input · weights + bias)`.
///
/// This is the only layer with learnable parameters. Training is plain
/// gradient descent with momentum on the previous weight update.
#[derive(Debug, Clone)]
pub struct DenseLayer {
    input_shape: LayerShape,
    output_shape: LayerShape,
    inputs: Tensor,
    outputs: Tensor,
    weights: Tensor,
    bias: Tensor,
    previous_update: Tensor,
    activation: Activation,
}

impl DenseLayer {
    /// Create a new dense layer with weights and bias drawn uniformly from [-1, 1).
    pub fn new(input_size: usize, output_size: usize, activation: Activation) -> NnResult<Self> {
        Self::with_rng(input_size, output_size, activation, &mut rand::thread_rng())
    }

    /// Same as [`DenseLayer::new`] with an explicit random source.
    pub fn with_rng<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        rng: &mut R,
    ) -> NnResult<Self> {
        if input_size == 0 || output_size == 0 {
            return Err(NnError::InvalidArgument(format!(
                "dense layer sizes must be positive: {input_size} -> {output_size}"
            )));
        }
        let mut weights = Tensor::zeros_2d(input_size, output_size);
        weights.set_random(-1.0, 1.0, rng)?;
        let mut bias = Tensor::zeros_1d(output_size);
        bias.set_random(-1.0, 1.0, rng)?;
        Ok(Self::assemble(weights, bias, activation))
    }

    /// Rebuild a layer from stored parameters. The momentum buffer starts at zero.
    ///
    /// `weights` must be a single frame of `input_size × output_size` and
    /// `bias` a single row of `output_size`.
    pub fn from_parameters(weights: Tensor, bias: Tensor, activation: Activation) -> NnResult<Self> {
        if weights.frames() != 1 || weights.is_empty() {
            return Err(NnError::InvalidArgument(format!(
                "dense weights must be one non-empty frame, got {}",
                weights.dims()
            )));
        }
        let expected_bias = Dims::new(1, 1, weights.cols());
        if bias.dims() != expected_bias {
            return Err(NnError::ShapeMismatch {
                expected: expected_bias,
                actual: bias.dims(),
            });
        }
        Ok(Self::assemble(weights, bias, activation))
    }

    fn assemble(weights: Tensor, bias: Tensor, activation: Activation) -> Self {
        let (input_size, output_size) = (weights.rows(), weights.cols());
        Self {
            input_shape: LayerShape::new(1, input_size, 1),
            output_shape: LayerShape::new(1, output_size, 1),
            inputs: Tensor::zeros_1d(input_size),
            outputs: Tensor::zeros_1d(output_size),
            previous_update: Tensor::zeros_2d(input_size, output_size),
            weights,
            bias,
            activation,
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_shape.cols
    }

    pub fn output_size(&self) -> usize {
        self.output_shape.cols
    }

    pub fn weights(&self) -> &Tensor {
        &self.weights
    }

    pub fn bias(&self) -> &Tensor {
        &self.bias
    }

    /// Weight change applied by the most recent backward pass.
    pub fn previous_update(&self) -> &Tensor {
        &self.previous_update
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Activated output of the most recent forward pass.
    pub fn outputs(&self) -> &Tensor {
        &self.outputs
    }

    pub(crate) fn to_data(&self) -> DenseData {
        DenseData {
            input_size: self.input_size(),
            output_size: self.output_size(),
            weights: self.weights.to_nested().into_iter().next().unwrap_or_default(),
            bias: self.bias.as_slice().to_vec(),
            activation: self.activation,
        }
    }

    pub(crate) fn from_data(data: DenseData) -> NnResult<Self> {
        let weights = Tensor::from_2d(&data.weights)?;
        let expected = Dims::new(1, data.input_size, data.output_size);
        if weights.dims() != expected {
            return Err(NnError::ShapeMismatch {
                expected,
                actual: weights.dims(),
            });
        }
        Self::from_parameters(weights, Tensor::from_1d(&data.bias), data.activation)
    }
}

impl Layer for DenseLayer {
    fn layer_type(&self) -> LayerType {
        LayerType::Dense
    }

    fn input_shape(&self) -> LayerShape {
        self.input_shape
    }

    fn output_shape(&self) -> LayerShape {
        self.output_shape
    }

    fn feed_forward(&mut self, input: &Tensor) -> NnResult<Tensor> {
        check_shape(self.input_shape, input)?;
        self.inputs.set_all(input)?;
        let mut outputs = matrix_multiply(&self.inputs, &self.weights, None)?;
        outputs.add_tensor(&self.bias)?;
        self.activation.function(&mut outputs);
        self.outputs.set_all(&outputs)?;
        Ok(outputs)
    }

    /// Updates weights and bias from `delta` (target minus output at this
    /// layer) and returns `delta · weightsᵀ` computed with the weights as they
    /// were before this update.
    fn back_propagate(&mut self, delta: &Tensor, learning_rate: f32, momentum: f32) -> NnResult<Tensor> {
        check_shape(self.output_shape, delta)?;
        // gradient = act'(output) ⊙ delta · lr
        let mut gradient = self.outputs.clone();
        self.activation.derivative(&mut gradient);
        gradient.scale_tensor(delta)?;
        gradient.scale(learning_rate);

        let transposed_inputs = matrix_transpose(&self.inputs, None)?;
        let weight_change = matrix_multiply(&transposed_inputs, &gradient, None)?;
        let transposed_weights = matrix_transpose(&self.weights, None)?;
        let next_delta = matrix_multiply(delta, &transposed_weights, None)?;

        self.weights.add_tensor(&weight_change)?;
        self.previous_update.scale(momentum);
        self.weights.add_tensor(&self.previous_update)?;
        self.previous_update.set_all(&weight_change)?;
        self.bias.add_tensor(&gradient)?;
        Ok(next_delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixed_layer() -> DenseLayer {
        let weights = Tensor::from_2d(&[vec![0.5, -0.5], vec![0.25, 0.75]]).unwrap();
        let bias = Tensor::from_1d(&[0.1, -0.1]);
        DenseLayer::from_parameters(weights, bias, Activation::Relu).unwrap()
    }

    #[test]
    fn forward_computes_affine_then_activation() {
        let mut layer = fixed_layer();
        let out = layer.feed_forward(&Tensor::from_1d(&[1.0, 2.0])).unwrap();
        // [1*0.5 + 2*0.25 + 0.1, 1*-0.5 + 2*0.75 - 0.1] = [1.1, 0.9]
        assert!((out.as_slice()[0] - 1.1).abs() < 1e-6);
        assert!((out.as_slice()[1] - 0.9).abs() < 1e-6);
        assert_eq!(layer.outputs(), &out);
    }

    #[test]
    fn backward_applies_gradient_and_returns_pre_update_delta() {
        let mut layer = fixed_layer();
        layer.feed_forward(&Tensor::from_1d(&[1.0, 2.0])).unwrap();
        let delta = Tensor::from_1d(&[1.0, -1.0]);
        let next = layer.back_propagate(&delta, 0.5, 0.0).unwrap();

        // ReLU' = 1 for both outputs, gradient = delta * 0.5 = [0.5, -0.5]
        // weight change = inputsᵀ · gradient = [[0.5, -0.5], [1.0, -1.0]]
        let expected = Tensor::from_2d(&[vec![1.0, -1.0], vec![1.25, -0.25]]).unwrap();
        assert!(layer.weights().max_abs_diff(&expected).unwrap() < 1e-6);
        assert!(layer.bias().max_abs_diff(&Tensor::from_1d(&[0.6, -0.6])).unwrap() < 1e-6);
        // delta · original weightsᵀ = [0.5 + 0.5, 0.25 - 0.75]
        assert!(next.max_abs_diff(&Tensor::from_1d(&[1.0, -0.5])).unwrap() < 1e-6);
    }

    #[test]
    fn momentum_reapplies_previous_update() {
        let mut layer = fixed_layer();
        let input = Tensor::from_1d(&[1.0, 0.0]);
        layer.feed_forward(&input).unwrap();
        layer.back_propagate(&Tensor::from_1d(&[1.0, 1.0]), 0.1, 0.0).unwrap();
        let first_update = layer.previous_update().clone();
        let before = layer.weights().clone();

        layer.feed_forward(&input).unwrap();
        layer.back_propagate(&Tensor::from_1d(&[0.0, 0.0]), 0.1, 0.5).unwrap();
        let mut expected = before;
        let mut carried = first_update;
        carried.scale(0.5);
        expected.add_tensor(&carried).unwrap();
        assert!(layer.weights().max_abs_diff(&expected).unwrap() < 1e-6);
        assert_eq!(layer.previous_update(), &Tensor::zeros_2d(2, 2));
    }

    #[test]
    fn rejects_multi_frame_input() {
        let mut layer = fixed_layer();
        let err = layer.feed_forward(&Tensor::zeros(2, 1, 2)).unwrap_err();
        assert!(matches!(err, NnError::DimensionMismatch { .. }));
    }

    #[test]
    fn seeded_layers_are_reproducible() {
        let a = DenseLayer::with_rng(3, 2, Activation::Sigmoid, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = DenseLayer::with_rng(3, 2, Activation::Sigmoid, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(a.weights(), b.weights());
        assert_eq!(a.bias(), b.bias());
        assert!(a.weights().as_slice().iter().all(|w| (-1.0..1.0).contains(w)));
    }

    #[test]
    fn rejects_zero_sizes() {
        assert!(matches!(
            DenseLayer::new(0, 3, Activation::Relu),
            Err(NnError::InvalidArgument(_))
        ));
    }
}
