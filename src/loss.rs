//! Loss functions for measuring training progress.
use crate::error::NnResult;
use crate::tensor::Tensor;

/// Mean of squared differences between `pred` and `target`.
pub fn mse_loss(pred: &Tensor, target: &Tensor) -> NnResult<f32> {
    let mut diff = pred.clone();
    diff.subtract_tensor(target)?;
    let n = diff.len().max(1) as f32;
    Ok(diff.as_slice().iter().map(|d| d * d).sum::<f32>() / n)
}

/// Gradient of [`mse_loss`] with respect to `pred`: `2 (p - t) / n`.
pub fn mse_deriv(pred: &Tensor, target: &Tensor) -> NnResult<Tensor> {
    let mut diff = pred.clone();
    diff.subtract_tensor(target)?;
    let n = diff.len().max(1) as f32;
    diff.scale(2.0 / n);
    Ok(diff)
}
