//! Activation functions and their derivatives, applied elementwise to tensors.
use crate::error::NnError;
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Activation function paired with its derivative.
///
/// The derivatives of `Sigmoid` and `Tanh` expect the *activated* output
/// (what `function` produced), not the raw pre-activation input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
    Tanh,
    Softmax,
}

impl Activation {
    /// Stable identifier used by persisted models.
    pub fn as_str(&self) -> &'static str {
        match self {
            Activation::Relu => "relu",
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Softmax => "softmax",
        }
    }

    /// Activates every element of `tensor` in place.
    pub fn function(&self, tensor: &mut Tensor) {
        match self {
            Activation::Relu => tensor.apply_function(|x, _, _, _| x.max(0.0)),
            Activation::Sigmoid => tensor.apply_function(|x, _, _, _| 1.0 / (1.0 + (-x).exp())),
            Activation::Tanh => tensor.apply_function(|x, _, _, _| x.tanh()),
            Activation::Softmax => {
                // Normalised over the whole tensor, not per row.
                tensor.apply_function(|x, _, _, _| x.exp());
                let sum = tensor.sum();
                tensor.apply_function(|x, _, _, _| x / sum);
            }
        }
    }

    /// Replaces every element of an activated `tensor` with its derivative.
    pub fn derivative(&self, tensor: &mut Tensor) {
        match self {
            Activation::Relu => tensor.apply_function(|x, _, _, _| if x > 0.0 { 1.0 } else { 0.0 }),
            Activation::Sigmoid => tensor.apply_function(|x, _, _, _| x * (1.0 - x)),
            Activation::Tanh => tensor.apply_function(|x, _, _, _| 1.0 - x * x),
            Activation::Softmax => softmax_derivative(tensor),
        }
    }
}

/// Collapsed softmax Jacobian: for an element `current` in column `j`, sums
/// `v * (1 - current)` over every value `v` in column `j` and `v * -current`
/// over every value.
fn softmax_derivative(tensor: &mut Tensor) {
    let source = tensor.clone();
    let values = source.as_slice();
    let cols = source.cols().max(1);
    tensor.apply_function(|current, _, _, col| {
        let mut sum = 0.0f32;
        for (index, &value) in values.iter().enumerate() {
            if index % cols == col {
                sum += value * (1.0 - current);
            }
            sum += value * -current;
        }
        sum
    });
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Activation {
    type Err = NnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relu" => Ok(Activation::Relu),
            "sigmoid" => Ok(Activation::Sigmoid),
            "tanh" => Ok(Activation::Tanh),
            "softmax" => Ok(Activation::Softmax),
            other => Err(NnError::InvalidArgument(format!("unknown activation: {other}"))),
        }
    }
}
