// ml_examples/src/main.rs
use anyhow::Result;
use primitive_nn::{
    print_model_summary, print_summary_table, stripes, xor, Activation, AutoEncoder, ConvolutionLayer,
    DenseLayer, FlattenLayer, Network, PoolingLayer, PoolingMethod, Tensor, TrainConfig, HORIZONTAL_EDGES,
    VERTICAL_EDGES,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
    Registry::default().with(filter).with(fmt_layer).init();
}

fn main() -> Result<()> {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(7);

    println!("=== XOR ===");
    let data = xor();
    let mut network = Network::new();
    network.add(DenseLayer::with_rng(2, 2, Activation::Sigmoid, &mut rng)?)?;
    network.add(DenseLayer::with_rng(2, 1, Activation::Sigmoid, &mut rng)?)?;
    print_model_summary(&network);
    let config = TrainConfig {
        epochs: 2500,
        seed: Some(7),
        ..TrainConfig::default()
    };
    let losses = network.fit(&data, &config)?;
    print_summary_table(&losses, "XOR Training Loss");
    for (input, target) in &data {
        let output = network.predict(input)?;
        println!("{:?} -> {:.3} (target {})", input.as_slice(), output.as_slice()[0], target.as_slice()[0]);
    }

    // Demo: save and load model
    network.save_pere("models/xor_model.pere")?;
    let mut reloaded = Network::load_pere("models/xor_model.pere")?;
    let check = reloaded.predict(&data[1].0)?;
    info!(prediction = check.as_slice()[0], "reloaded xor model");

    println!("\n=== AutoEncoder ===");
    let samples = vec![vec![0.0, 0.0, 1.0, 1.0], vec![0.0, 1.0, 1.0, 0.0]];
    let mut encoder = AutoEncoder::with_seed(4, 7)?;
    encoder.add_coding_layer(2, Activation::Sigmoid)?;
    encoder.close()?;
    let config = TrainConfig {
        epochs: 5000,
        learning_rate: 0.5,
        momentum: 0.2,
        seed: Some(7),
        shuffle: true,
    };
    let losses = encoder.fit(&samples, &config)?;
    print_summary_table(&losses, "AutoEncoder Reconstruction Loss");
    for sample in &samples {
        let code = encoder.encode(sample)?;
        let output = encoder.decode(&code)?;
        println!("{sample:?} -> code {code:.3?} -> {output:.3?}");
    }

    println!("\n=== Convolution pipeline ===");
    let images = stripes(6, 40, &mut rng);
    let mut pipeline = Network::new();
    pipeline.add(ConvolutionLayer::new(
        6,
        6,
        1,
        vec![VERTICAL_EDGES.clone(), HORIZONTAL_EDGES.clone()],
        Activation::Relu,
    )?)?;
    pipeline.add(PoolingLayer::new(6, 6, 2, 2, PoolingMethod::Max)?)?;
    pipeline.add(FlattenLayer::new(3, 3, 2))?;
    pipeline.add(DenseLayer::with_rng(18, 2, Activation::Sigmoid, &mut rng)?)?;
    print_model_summary(&pipeline);
    let config = TrainConfig {
        epochs: 200,
        learning_rate: 0.05,
        momentum: 0.5,
        seed: Some(7),
        shuffle: true,
    };
    let losses = pipeline.fit(&images, &config)?;
    print_summary_table(&losses, "Stripe Training Loss");
    let accuracy = pipeline.evaluate(&stripes(6, 20, &mut rng))?;
    println!("Stripe Accuracy: {:.2}%", accuracy * 100.0);

    let sample: &Tensor = &images[0].0;
    println!("First stripe image:\n{sample}");
    Ok(())
}
