//! Metrics for evaluating classification performance.
use crate::error::NnResult;
use crate::network::Network;
use crate::tensor::Tensor;

fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .fold(0usize, |max_i, (i, &v)| if v > values[max_i] { i } else { max_i })
}

/// Accuracy against one-hot targets. An empty dataset scores 0.
pub fn accuracy(network: &mut Network, dataset: &[(Tensor, Tensor)]) -> NnResult<f32> {
    if dataset.is_empty() {
        return Ok(0.0);
    }
    let mut correct = 0;
    for (input, target) in dataset {
        let pred = network.predict(input)?;
        if argmax(pred.as_slice()) == argmax(target.as_slice()) {
            correct += 1;
        }
    }
    Ok(correct as f32 / dataset.len() as f32)
}

/// Simple confusion matrix indexed `[true_class][predicted_class]`.
///
/// Classes at or beyond `num_classes` are not counted.
pub fn confusion_matrix(
    network: &mut Network,
    dataset: &[(Tensor, Tensor)],
    num_classes: usize,
) -> NnResult<Vec<Vec<usize>>> {
    let mut cm = vec![vec![0; num_classes]; num_classes];
    for (input, target) in dataset {
        let pred = network.predict(input)?;
        let (actual, predicted) = (argmax(target.as_slice()), argmax(pred.as_slice()));
        if actual < num_classes && predicted < num_classes {
            cm[actual][predicted] += 1;
        }
    }
    Ok(cm)
}
