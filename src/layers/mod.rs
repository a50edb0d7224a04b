//! Layers: composable forward/backward stages with a fixed shape contract.
//!
//! Every concrete layer implements [`Layer`]. Networks store them as
//! [`LayerVariant`], a closed enum over the four kinds, and persist them as
//! [`LayerData`] records keyed by the stable `"type"` tag.

pub mod convolution;
pub mod dense;
pub mod flatten;
pub mod pooling;

use crate::activations::Activation;
use crate::error::{Dims, NnError, NnResult};
use crate::pooling::PoolingMethod;
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use convolution::ConvolutionLayer;
pub use dense::DenseLayer;
pub use flatten::FlattenLayer;
pub use pooling::PoolingLayer;

/// Rows, columns and frames of the tensor a layer accepts or produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerShape {
    pub rows: usize,
    pub cols: usize,
    pub frames: usize,
}

impl LayerShape {
    pub const fn new(rows: usize, cols: usize, frames: usize) -> Self {
        Self { rows, cols, frames }
    }

    /// Shape of an existing tensor.
    pub fn of(tensor: &Tensor) -> Self {
        Self::new(tensor.rows(), tensor.cols(), tensor.frames())
    }

    /// Total number of elements.
    pub fn size(&self) -> usize {
        self.rows * self.cols * self.frames
    }

    pub fn zeros(&self) -> Tensor {
        Tensor::zeros(self.frames, self.rows, self.cols)
    }
}

impl From<LayerShape> for Dims {
    fn from(shape: LayerShape) -> Self {
        Dims::new(shape.frames, shape.rows, shape.cols)
    }
}

impl fmt::Display for LayerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.rows, self.cols, self.frames)
    }
}

/// Stable identifiers persisted in the `"type"` field of a layer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Dense,
    Convolution,
    Pooling,
    Flatten,
}

impl LayerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerType::Dense => "dense",
            LayerType::Convolution => "convolution",
            LayerType::Pooling => "pooling",
            LayerType::Flatten => "flatten",
        }
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerType {
    type Err = NnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dense" => Ok(LayerType::Dense),
            "convolution" => Ok(LayerType::Convolution),
            "pooling" => Ok(LayerType::Pooling),
            "flatten" => Ok(LayerType::Flatten),
            other => Err(NnError::InvalidArgument(format!("invalid layer type: {other}"))),
        }
    }
}

/// A stage of computation in a network.
///
/// `feed_forward` caches what the layer needs for the backward pass and
/// returns a fresh tensor for the next stage. `back_propagate` consumes the
/// delta from the following layer and returns the delta for the preceding one.
pub trait Layer {
    fn layer_type(&self) -> LayerType;
    fn input_shape(&self) -> LayerShape;
    fn output_shape(&self) -> LayerShape;
    fn feed_forward(&mut self, input: &Tensor) -> NnResult<Tensor>;
    fn back_propagate(&mut self, delta: &Tensor, learning_rate: f32, momentum: f32) -> NnResult<Tensor>;
}

/// Any of the concrete layers. Cloning produces a fully independent layer.
#[derive(Debug, Clone)]
pub enum LayerVariant {
    Dense(DenseLayer),
    Convolution(ConvolutionLayer),
    Pooling(PoolingLayer),
    Flatten(FlattenLayer),
}

impl LayerVariant {
    fn inner(&self) -> &dyn Layer {
        match self {
            LayerVariant::Dense(layer) => layer,
            LayerVariant::Convolution(layer) => layer,
            LayerVariant::Pooling(layer) => layer,
            LayerVariant::Flatten(layer) => layer,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Layer {
        match self {
            LayerVariant::Dense(layer) => layer,
            LayerVariant::Convolution(layer) => layer,
            LayerVariant::Pooling(layer) => layer,
            LayerVariant::Flatten(layer) => layer,
        }
    }

    pub fn as_dense(&self) -> Option<&DenseLayer> {
        match self {
            LayerVariant::Dense(layer) => Some(layer),
            _ => None,
        }
    }

    /// Extracts the persistable state of the layer.
    pub fn to_data(&self) -> LayerData {
        match self {
            LayerVariant::Dense(layer) => LayerData::Dense(layer.to_data()),
            LayerVariant::Convolution(layer) => LayerData::Convolution(layer.to_data()),
            LayerVariant::Pooling(layer) => LayerData::Pooling(layer.to_data()),
            LayerVariant::Flatten(layer) => LayerData::Flatten(layer.to_data()),
        }
    }

    /// Rebuilds a layer from persisted state, validating every extent.
    pub fn from_data(data: LayerData) -> NnResult<Self> {
        Ok(match data {
            LayerData::Dense(data) => DenseLayer::from_data(data)?.into(),
            LayerData::Convolution(data) => ConvolutionLayer::from_data(data)?.into(),
            LayerData::Pooling(data) => PoolingLayer::from_data(data)?.into(),
            LayerData::Flatten(data) => FlattenLayer::from_data(data)?.into(),
        })
    }
}

impl Layer for LayerVariant {
    fn layer_type(&self) -> LayerType {
        self.inner().layer_type()
    }

    fn input_shape(&self) -> LayerShape {
        self.inner().input_shape()
    }

    fn output_shape(&self) -> LayerShape {
        self.inner().output_shape()
    }

    fn feed_forward(&mut self, input: &Tensor) -> NnResult<Tensor> {
        self.inner_mut().feed_forward(input)
    }

    fn back_propagate(&mut self, delta: &Tensor, learning_rate: f32, momentum: f32) -> NnResult<Tensor> {
        self.inner_mut().back_propagate(delta, learning_rate, momentum)
    }
}

impl From<DenseLayer> for LayerVariant {
    fn from(layer: DenseLayer) -> Self {
        LayerVariant::Dense(layer)
    }
}

impl From<ConvolutionLayer> for LayerVariant {
    fn from(layer: ConvolutionLayer) -> Self {
        LayerVariant::Convolution(layer)
    }
}

impl From<PoolingLayer> for LayerVariant {
    fn from(layer: PoolingLayer) -> Self {
        LayerVariant::Pooling(layer)
    }
}

impl From<FlattenLayer> for LayerVariant {
    fn from(layer: FlattenLayer) -> Self {
        LayerVariant::Flatten(layer)
    }
}

// ============ Persistence records ============

/// Serialized form of a layer, dispatched on the `"type"` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerData {
    Dense(DenseData),
    Convolution(ConvolutionData),
    Pooling(PoolingData),
    Flatten(FlattenData),
}

impl LayerData {
    pub fn layer_type(&self) -> LayerType {
        match self {
            LayerData::Dense(_) => LayerType::Dense,
            LayerData::Convolution(_) => LayerType::Convolution,
            LayerData::Pooling(_) => LayerType::Pooling,
            LayerData::Flatten(_) => LayerType::Flatten,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DenseData {
    pub input_size: usize,
    pub output_size: usize,
    /// `input_size` rows of `output_size` values.
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
    pub activation: Activation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvolutionData {
    pub input_rows: usize,
    pub input_cols: usize,
    pub input_frames: usize,
    pub filters: Vec<Vec<Vec<f32>>>,
    pub activation: Activation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolingData {
    pub input_rows: usize,
    pub input_cols: usize,
    pub input_frames: usize,
    pub pool_size: usize,
    pub pooling: PoolingMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenData {
    pub input_rows: usize,
    pub input_cols: usize,
    pub input_frames: usize,
}

/// Error for a tensor whose extents differ from the layer's input shape.
pub(crate) fn shape_error(expected: LayerShape, actual: &Tensor) -> NnError {
    NnError::DimensionMismatch {
        left: expected.into(),
        right: actual.dims(),
    }
}

/// Rejects tensors that do not match `expected` exactly.
pub(crate) fn check_shape(expected: LayerShape, actual: &Tensor) -> NnResult<()> {
    if LayerShape::of(actual) != expected {
        return Err(shape_error(expected, actual));
    }
    Ok(())
}
