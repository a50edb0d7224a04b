//! Console summaries for models and training runs.
use crate::layers::Layer;
use crate::network::Network;

/// Print model summary
pub fn print_model_summary(network: &Network) {
    println!("Model Summary:\n{}", network);
    for (index, layer) in network.layers().iter().enumerate() {
        println!(
            "  {index:>2}  {:<12} {} -> {}",
            layer.layer_type().as_str(),
            layer.input_shape(),
            layer.output_shape()
        );
    }
}

/// Print simple table for losses
pub fn print_summary_table(values: &[f32], title: &str) {
    println!("\n{} Summary Table:", title);
    println!("+----------------+----------+");
    println!("| Epoch Range    | Avg Value|");
    println!("+----------------+----------+");
    if !values.is_empty() {
        let avg = values.iter().sum::<f32>() / values.len() as f32;
        println!("| All Epochs     | {:>8.6} |", avg);
        println!("| First Epoch    | {:>8.6} |", values[0]);
        println!("| Last Epoch     | {:>8.6} |", values[values.len() - 1]);
    }
    println!("+----------------+----------+");
}
