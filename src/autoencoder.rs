//! Autoencoder built from mirrored stacks of dense layers.
use crate::activations::Activation;
use crate::config::TrainConfig;
use crate::error::{NnError, NnResult};
use crate::layers::{DenseData, DenseLayer, Layer};
use crate::loss::mse_loss;
use crate::persistence;
use crate::tensor::Tensor;
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, trace};

/// A network trained to reproduce its own input through a narrower (or,
/// when sparse, wider) code.
///
/// Every call to [`AutoEncoder::add_coding_layer`] appends an encoding layer
/// and prepends the mirrored decoding layer, so the decoding stack always
/// ends with a layer of width `input_size`. Once [`AutoEncoder::close`] is
/// called the topology is frozen.
///
/// When any layer is at least as wide as the input, training zeroes random
/// columns of every layer's output, the reconstruction included, to stop the
/// code from learning the identity. The last decoding layer always has the
/// input width, so every non-empty encoder trains with noise. Inference never
/// applies it.
#[derive(Debug, Clone)]
pub struct AutoEncoder {
    input_size: usize,
    closed: bool,
    encoding_layers: Vec<DenseLayer>,
    decoding_layers: Vec<DenseLayer>,
    rng: StdRng,
}

impl AutoEncoder {
    pub fn new(input_size: usize) -> NnResult<Self> {
        Self::with_rng(input_size, StdRng::from_entropy())
    }

    /// Reproducible weights and noise.
    pub fn with_seed(input_size: usize, seed: u64) -> NnResult<Self> {
        Self::with_rng(input_size, StdRng::seed_from_u64(seed))
    }

    fn with_rng(input_size: usize, rng: StdRng) -> NnResult<Self> {
        if input_size == 0 {
            return Err(NnError::InvalidArgument("autoencoder input size must be positive".into()));
        }
        Ok(Self {
            input_size,
            closed: false,
            encoding_layers: Vec::new(),
            decoding_layers: Vec::new(),
            rng,
        })
    }

    /// Restarts the noise generator from `seed`. Loaded encoders draw their
    /// noise from entropy until reseeded.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Width of the innermost code, if any coding layer exists.
    pub fn code_size(&self) -> Option<usize> {
        self.encoding_layers.last().map(DenseLayer::output_size)
    }

    pub fn encoding_layers(&self) -> &[DenseLayer] {
        &self.encoding_layers
    }

    pub fn decoding_layers(&self) -> &[DenseLayer] {
        &self.decoding_layers
    }

    pub fn layer_count(&self) -> usize {
        self.encoding_layers.len() + self.decoding_layers.len()
    }

    /// Layer at `index` in the full chain, encoding layers first.
    pub fn layer_at(&self, index: usize) -> Option<&DenseLayer> {
        self.encoding_layers.iter().chain(&self.decoding_layers).nth(index)
    }

    /// Adds an encoding layer of width `size` and its mirrored decoding layer.
    pub fn add_coding_layer(&mut self, size: usize, activation: Activation) -> NnResult<()> {
        if self.closed {
            return Err(NnError::InvalidTopology("autoencoder is closed".into()));
        }
        if size == 0 {
            return Err(NnError::InvalidTopology("coding layer size must be positive".into()));
        }
        let previous = self.code_size().unwrap_or(self.input_size);
        let encoding = DenseLayer::with_rng(previous, size, activation, &mut self.rng)?;
        let decoding = DenseLayer::with_rng(size, previous, activation, &mut self.rng)?;
        self.encoding_layers.push(encoding);
        self.decoding_layers.insert(0, decoding);
        debug!(from = previous, to = size, %activation, "coding layer added");
        Ok(())
    }

    /// Freezes the topology. Further coding layers are rejected.
    pub fn close(&mut self) -> NnResult<()> {
        self.require_layers()?;
        self.closed = true;
        debug!(layers = self.layer_count(), "autoencoder closed");
        Ok(())
    }

    fn require_layers(&self) -> NnResult<()> {
        if self.encoding_layers.is_empty() {
            return Err(NnError::InvalidTopology("autoencoder has no coding layers".into()));
        }
        Ok(())
    }

    /// True when any layer, decoding layers included, is at least as wide as
    /// the input.
    pub fn is_sparse(&self) -> bool {
        self.encoding_layers
            .iter()
            .chain(&self.decoding_layers)
            .any(|layer| layer.output_size() >= self.input_size)
    }

    pub fn encode(&mut self, inputs: &[f32]) -> NnResult<Vec<f32>> {
        self.require_layers()?;
        run(&mut self.encoding_layers, Tensor::from_1d(inputs))
    }

    pub fn decode(&mut self, coded: &[f32]) -> NnResult<Vec<f32>> {
        self.require_layers()?;
        run(&mut self.decoding_layers, Tensor::from_1d(coded))
    }

    /// Encodes then decodes `inputs`.
    pub fn reconstruct(&mut self, inputs: &[f32]) -> NnResult<Vec<f32>> {
        let coded = self.encode(inputs)?;
        self.decode(&coded)
    }

    /// One training step towards reproducing `inputs`.
    pub fn train(&mut self, inputs: &[f32], learning_rate: f32, momentum: f32) -> NnResult<()> {
        self.train_step(inputs, learning_rate, momentum).map(|_| ())
    }

    /// Returns the reconstruction loss measured before the update.
    fn train_step(&mut self, inputs: &[f32], learning_rate: f32, momentum: f32) -> NnResult<f32> {
        self.require_layers()?;
        let target = Tensor::from_1d(inputs);
        let sparse = self.is_sparse();
        let mut next = target.clone();
        for layer in self.encoding_layers.iter_mut().chain(self.decoding_layers.iter_mut()) {
            next = layer.feed_forward(&next)?;
            if sparse {
                zero_random_columns(&mut next, &mut self.rng)?;
            }
        }
        let loss = mse_loss(&next, &target)?;

        let mut delta = target;
        delta.subtract_tensor(&next)?;
        for layer in self
            .encoding_layers
            .iter_mut()
            .chain(self.decoding_layers.iter_mut())
            .rev()
        {
            delta = layer.back_propagate(&delta, learning_rate, momentum)?;
        }
        Ok(loss)
    }

    /// Trains on every sample once per epoch and returns each epoch's mean
    /// reconstruction error.
    pub fn fit(&mut self, samples: &[Vec<f32>], config: &TrainConfig) -> NnResult<Vec<f32>> {
        if samples.is_empty() {
            return Err(NnError::InvalidArgument("no samples to train on".into()));
        }
        config.validate()?;
        let mut rng = config.rng();
        let mut order: Vec<usize> = (0..samples.len()).collect();
        let mut losses = Vec::with_capacity(config.epochs);
        for epoch in 1..=config.epochs {
            if config.shuffle {
                order.shuffle(&mut rng);
            }
            let mut total = 0.0;
            for &index in &order {
                let loss = self.train_step(&samples[index], config.learning_rate, config.momentum)?;
                trace!(sample = index, loss, "train step");
                total += loss;
            }
            let loss = total / samples.len() as f32;
            debug!(epoch, loss, "epoch complete");
            losses.push(loss);
        }
        info!(epochs = config.epochs, loss = losses.last().copied().unwrap_or_default(), "training finished");
        Ok(losses)
    }

    pub fn to_data(&self) -> AutoEncoderData {
        AutoEncoderData {
            input_size: self.input_size,
            closed: self.closed,
            encoding_layers: self.encoding_layers.iter().map(DenseLayer::to_data).collect(),
            decoding_layers: self.decoding_layers.iter().map(DenseLayer::to_data).collect(),
        }
    }

    /// Rebuilds an autoencoder after checking the stacks mirror each other.
    pub fn from_data(data: AutoEncoderData) -> NnResult<Self> {
        let mut encoder = Self::new(data.input_size)?;
        if data.encoding_layers.len() != data.decoding_layers.len() {
            return Err(NnError::InvalidTopology(format!(
                "{} encoding layers but {} decoding layers",
                data.encoding_layers.len(),
                data.decoding_layers.len()
            )));
        }
        let encoding = data
            .encoding_layers
            .into_iter()
            .map(DenseLayer::from_data)
            .collect::<NnResult<Vec<_>>>()?;
        let decoding = data
            .decoding_layers
            .into_iter()
            .map(DenseLayer::from_data)
            .collect::<NnResult<Vec<_>>>()?;

        let mut width = data.input_size;
        for (layer, mirror) in encoding.iter().zip(decoding.iter().rev()) {
            if layer.input_size() != width
                || mirror.output_size() != width
                || mirror.input_size() != layer.output_size()
            {
                return Err(NnError::InvalidTopology(format!(
                    "layers {} -> {} and {} -> {} do not mirror at width {width}",
                    layer.input_size(),
                    layer.output_size(),
                    mirror.input_size(),
                    mirror.output_size()
                )));
            }
            width = layer.output_size();
        }
        encoder.encoding_layers = encoding;
        encoder.decoding_layers = decoding;
        encoder.closed = data.closed;
        Ok(encoder)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_data())?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let data: AutoEncoderData = serde_json::from_str(json).context("invalid autoencoder json")?;
        Ok(Self::from_data(data)?)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        persistence::save_json(&self.to_data(), path)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_data(persistence::load_json(path)?)?)
    }

    pub fn save_pere(&self, path: impl AsRef<Path>) -> Result<()> {
        persistence::save_pere(&self.to_data(), path)
    }

    pub fn load_pere(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_data(persistence::load_pere(path)?)?)
    }
}

fn run(layers: &mut [DenseLayer], input: Tensor) -> NnResult<Vec<f32>> {
    let mut next = input;
    for layer in layers {
        next = layer.feed_forward(&next)?;
    }
    Ok(next.as_slice().to_vec())
}

/// Zeroes `cols / 2` columns of the first row, drawn with replacement.
fn zero_random_columns<R: Rng + ?Sized>(tensor: &mut Tensor, rng: &mut R) -> NnResult<()> {
    let cols = tensor.cols();
    for _ in 0..cols / 2 {
        let col = rng.gen_range(0..cols);
        tensor.set(0, 0, col, 0.0)?;
    }
    Ok(())
}

/// Serialized form of an autoencoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoEncoderData {
    pub input_size: usize,
    #[serde(default)]
    pub closed: bool,
    pub encoding_layers: Vec<DenseData>,
    pub decoding_layers: Vec<DenseData>,
}
