//! A minimal from-scratch neural network crate for educational purposes:
//! tensors, layers, activations, feed-forward networks and autoencoders
//! trained one sample at a time by backpropagation with momentum.
//!
//! - `Tensor` with bounds-checked access and per-frame matrix operators
//! - Dense, convolution, pooling and flatten layers behind one `Layer` trait
//! - `Network` and `AutoEncoder` with JSON and `.pere` (gzipped JSON) persistence
//! - Utility helpers for summaries, metrics and small synthetic datasets

pub mod activations;
pub mod autoencoder;
pub mod config;
pub mod datasets;
pub mod error;
pub mod filters;
pub mod layers;
pub mod linalg;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod persistence;
pub mod pooling;
pub mod tensor;
pub mod utils;

pub use activations::Activation;
pub use autoencoder::{AutoEncoder, AutoEncoderData};
pub use config::TrainConfig;
pub use datasets::{one_hot, stripes, xor, Dataset};
pub use error::{Dims, NnError, NnResult};
pub use filters::{HORIZONTAL_EDGES, VERTICAL_EDGES};
pub use layers::{
    ConvolutionLayer, DenseLayer, FlattenLayer, Layer, LayerData, LayerShape, LayerType, LayerVariant,
    PoolingLayer,
};
pub use linalg::{matrix_multiply, matrix_transpose};
pub use loss::{mse_deriv, mse_loss};
pub use metrics::{accuracy, confusion_matrix};
pub use network::{Network, NetworkData};
pub use pooling::PoolingMethod;
pub use tensor::Tensor;
pub use utils::{print_model_summary, print_summary_table};
