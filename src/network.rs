//! Feed-forward network over a linear stack of layers, with training and persistence.
use crate::config::TrainConfig;
use crate::error::{NnError, NnResult};
use crate::layers::{Layer, LayerData, LayerShape, LayerType, LayerVariant};
use crate::loss::mse_loss;
use crate::metrics::accuracy;
use crate::persistence;
use crate::tensor::Tensor;
use anyhow::{anyhow, Context, Result};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, trace, warn};

/// An ordered stack of layers where each layer's output shape equals the
/// next layer's input shape.
///
/// The shape chain is checked when layers are added and never again.
/// Cloning produces a network with fully independent layers.
#[derive(Debug, Clone, Default)]
pub struct Network {
    layers: Vec<LayerVariant>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Layer at `index`, or `None` when out of range.
    pub fn layer_at(&self, index: usize) -> Option<&LayerVariant> {
        self.layers.get(index)
    }

    pub fn layer_at_mut(&mut self, index: usize) -> Option<&mut LayerVariant> {
        self.layers.get_mut(index)
    }

    pub fn layers(&self) -> &[LayerVariant] {
        &self.layers
    }

    /// Input shape of the first layer.
    pub fn input_shape(&self) -> Option<LayerShape> {
        self.layers.first().map(Layer::input_shape)
    }

    /// Output shape of the last layer.
    pub fn output_shape(&self) -> Option<LayerShape> {
        self.layers.last().map(Layer::output_shape)
    }

    /// Appends one layer whose input shape must equal the current output shape.
    pub fn add(&mut self, layer: impl Into<LayerVariant>) -> NnResult<()> {
        let layer = layer.into();
        check_link(self.output_shape(), &layer)?;
        debug!(
            layer = %layer.layer_type(),
            input = %layer.input_shape(),
            output = %layer.output_shape(),
            "layer added"
        );
        self.layers.push(layer);
        Ok(())
    }

    /// Appends several layers. The whole chain is validated first, so on
    /// failure the network is left unchanged.
    pub fn add_all<I>(&mut self, layers: I) -> NnResult<()>
    where
        I: IntoIterator<Item = LayerVariant>,
    {
        let layers: Vec<LayerVariant> = layers.into_iter().collect();
        let mut previous = self.output_shape();
        for layer in &layers {
            check_link(previous, layer)?;
            previous = Some(layer.output_shape());
        }
        for layer in layers {
            self.add(layer)?;
        }
        Ok(())
    }

    fn feed_forward(&mut self, input: &Tensor) -> NnResult<Tensor> {
        let mut next = input.clone();
        for layer in &mut self.layers {
            next = layer.feed_forward(&next)?;
        }
        Ok(next)
    }

    fn back_propagate(&mut self, delta: Tensor, learning_rate: f32, momentum: f32) -> NnResult<()> {
        let mut next = delta;
        for layer in self.layers.iter_mut().rev() {
            next = layer.back_propagate(&next, learning_rate, momentum)?;
        }
        Ok(())
    }

    /// Runs `input` through every layer. The returned tensor is owned by the
    /// caller; an empty network returns a copy of the input.
    pub fn predict(&mut self, input: &Tensor) -> NnResult<Tensor> {
        self.feed_forward(input)
    }

    /// One supervised step: forward, `delta = target - output`, then backward
    /// through the layers in reverse order.
    pub fn train(&mut self, input: &Tensor, target: &Tensor, learning_rate: f32, momentum: f32) -> NnResult<()> {
        self.train_step(input, target, learning_rate, momentum).map(|_| ())
    }

    /// Same as [`Network::train`] but returns the output computed before the update.
    fn train_step(&mut self, input: &Tensor, target: &Tensor, learning_rate: f32, momentum: f32) -> NnResult<Tensor> {
        let output = self.feed_forward(input)?;
        let mut delta = target.clone();
        delta.subtract_tensor(&output)?;
        self.back_propagate(delta, learning_rate, momentum)?;
        Ok(output)
    }

    /// Trains every sample once per epoch for `config.epochs` epochs and
    /// returns the mean squared error of each epoch.
    pub fn fit(&mut self, dataset: &[(Tensor, Tensor)], config: &TrainConfig) -> NnResult<Vec<f32>> {
        if dataset.is_empty() {
            return Err(NnError::InvalidArgument("dataset is empty".into()));
        }
        config.validate()?;
        let mut rng = config.rng();
        let mut order: Vec<usize> = (0..dataset.len()).collect();
        let mut losses = Vec::with_capacity(config.epochs);
        for epoch in 1..=config.epochs {
            if config.shuffle {
                order.shuffle(&mut rng);
            }
            let mut total = 0.0;
            for &index in &order {
                let (input, target) = &dataset[index];
                let output = self.train_step(input, target, config.learning_rate, config.momentum)?;
                let loss = mse_loss(&output, target)?;
                trace!(sample = index, loss, "train step");
                total += loss;
            }
            let loss = total / dataset.len() as f32;
            debug!(epoch, loss, "epoch complete");
            losses.push(loss);
        }
        info!(epochs = config.epochs, loss = losses.last().copied().unwrap_or_default(), "training finished");
        Ok(losses)
    }

    /// Fraction of samples whose arg-max prediction matches the one-hot target.
    pub fn evaluate(&mut self, dataset: &[(Tensor, Tensor)]) -> NnResult<f32> {
        accuracy(self, dataset)
    }

    pub fn to_data(&self) -> NetworkData {
        NetworkData {
            layers: self.layers.iter().map(LayerVariant::to_data).collect(),
        }
    }

    /// Rebuilds a network, re-validating the shape chain through [`Network::add`].
    pub fn from_data(data: NetworkData) -> NnResult<Self> {
        let mut network = Self::new();
        for layer in data.layers {
            network.add(LayerVariant::from_data(layer)?)?;
        }
        Ok(network)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_data())?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawNetworkData = serde_json::from_str(json).context("invalid network json")?;
        Self::from_raw(raw)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        persistence::save_json(&self.to_data(), path)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let raw: RawNetworkData = persistence::load_json(path)?;
        Self::from_raw(raw)
    }

    /// Save model to .pere (gzipped JSON).
    pub fn save_pere(&self, path: impl AsRef<Path>) -> Result<()> {
        persistence::save_pere(&self.to_data(), path)
    }

    /// Load model from .pere (gzipped JSON).
    pub fn load_pere(path: impl AsRef<Path>) -> Result<Self> {
        let raw: RawNetworkData = persistence::load_pere(path)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawNetworkData) -> Result<Self> {
        let layers = raw.layers.into_iter().map(parse_layer).collect::<Result<Vec<_>>>()?;
        Ok(Self::from_data(NetworkData { layers })?)
    }
}

fn check_link(previous: Option<LayerShape>, layer: &LayerVariant) -> NnResult<()> {
    match previous {
        Some(output) if output != layer.input_shape() => Err(NnError::ShapeMismatch {
            expected: output.into(),
            actual: layer.input_shape().into(),
        }),
        _ => Ok(()),
    }
}

/// Decodes one layer record, rejecting records whose `"type"` tag is unknown.
fn parse_layer(value: serde_json::Value) -> Result<LayerData> {
    let tag = value.get("type").and_then(serde_json::Value::as_str).unwrap_or_default().to_owned();
    if let Err(err) = tag.parse::<LayerType>() {
        warn!(tag = %tag, "unknown layer type in saved model");
        return Err(anyhow!(err));
    }
    serde_json::from_value(value).with_context(|| format!("invalid {tag} layer record"))
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layers: Vec<String> = self
            .layers
            .iter()
            .map(|layer| format!("{} {} -> {}", layer.layer_type(), layer.input_shape(), layer.output_shape()))
            .collect();
        write!(f, "Network: [{}]", layers.join(", "))
    }
}

// ============ Persistence records ============

/// Serialized form of a network: `{"layers": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkData {
    pub layers: Vec<LayerData>,
}

#[derive(Deserialize)]
struct RawNetworkData {
    layers: Vec<serde_json::Value>,
}
