use primitive_nn::{
    Activation, AutoEncoder, ConvolutionLayer, DenseLayer, FlattenLayer, Network, PoolingLayer, PoolingMethod,
    Tensor, HORIZONTAL_EDGES, VERTICAL_EDGES,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn pipeline() -> Network {
    let mut rng = StdRng::seed_from_u64(17);
    let mut network = Network::new();
    network
        .add(
            ConvolutionLayer::new(
                4,
                4,
                1,
                vec![VERTICAL_EDGES.clone(), HORIZONTAL_EDGES.clone()],
                Activation::Relu,
            )
            .unwrap(),
        )
        .unwrap();
    network.add(PoolingLayer::new(4, 4, 2, 2, PoolingMethod::Max).unwrap()).unwrap();
    network.add(FlattenLayer::new(2, 2, 2)).unwrap();
    network.add(DenseLayer::with_rng(8, 3, Activation::Softmax, &mut rng).unwrap()).unwrap();
    network
}

fn image() -> Tensor {
    let mut image = Tensor::zeros_2d(4, 4);
    image.apply_function(|_, _, row, col| ((row * 4 + col) % 5) as f32 * 0.25);
    image
}

#[test]
fn network_json_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.json");
    let mut network = pipeline();
    network.save_json(&path).unwrap();

    let mut loaded = Network::load_json(&path).unwrap();
    assert_eq!(loaded.layer_count(), 4);
    assert_eq!(loaded.to_data(), network.to_data());
    assert_eq!(loaded.predict(&image()).unwrap(), network.predict(&image()).unwrap());
}

#[test]
fn network_pere_round_trip_in_nested_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("models").join("pipeline.pere");
    let network = pipeline();
    network.save_pere(&path).unwrap();
    let loaded = Network::load_pere(&path).unwrap();
    assert_eq!(loaded.to_data(), network.to_data());
    assert_eq!(loaded.to_string(), network.to_string());
}

#[test]
fn json_uses_stable_tags() {
    let json = pipeline().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let tags: Vec<&str> = value["layers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|layer| layer["type"].as_str().unwrap())
        .collect();
    assert_eq!(tags, vec!["convolution", "pooling", "flatten", "dense"]);
    assert_eq!(value["layers"][3]["activation"], "softmax");
    assert_eq!(value["layers"][1]["poolSize"], 2);
}

#[test]
fn loading_revalidates_shape_chain() {
    let json = r#"{"layers":[
        {"type":"flatten","inputRows":2,"inputCols":2,"inputFrames":1},
        {"type":"dense","inputSize":3,"outputSize":1,"weights":[[0.1],[0.2],[0.3]],"bias":[0.0],"activation":"relu"}
    ]}"#;
    assert!(Network::from_json(json).is_err());
}

#[test]
fn unknown_tags_are_errors() {
    let unknown_layer = r#"{"layers":[{"type":"lstm"}]}"#;
    assert!(Network::from_json(unknown_layer).is_err());
    let unknown_activation = r#"{"layers":[
        {"type":"dense","inputSize":1,"outputSize":1,"weights":[[0.5]],"bias":[0.0],"activation":"swish"}
    ]}"#;
    assert!(Network::from_json(unknown_activation).is_err());
}

#[test]
fn autoencoder_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut encoder = AutoEncoder::with_seed(4, 5).unwrap();
    encoder.add_coding_layer(3, Activation::Sigmoid).unwrap();
    encoder.add_coding_layer(2, Activation::Sigmoid).unwrap();
    encoder.close().unwrap();

    let json_path = dir.path().join("encoder.json");
    let pere_path = dir.path().join("encoder.pere");
    encoder.save_json(&json_path).unwrap();
    encoder.save_pere(&pere_path).unwrap();

    for mut loaded in [
        AutoEncoder::load_json(&json_path).unwrap(),
        AutoEncoder::load_pere(&pere_path).unwrap(),
    ] {
        assert!(loaded.is_closed());
        assert_eq!(loaded.layer_count(), 4);
        assert_eq!(loaded.to_data(), encoder.to_data());
        let sample = [0.0, 1.0, 1.0, 0.0];
        assert_eq!(loaded.reconstruct(&sample).unwrap(), encoder.reconstruct(&sample).unwrap());
        assert!(loaded.add_coding_layer(1, Activation::Sigmoid).is_err());
    }

    let value: serde_json::Value = serde_json::from_str(&encoder.to_json().unwrap()).unwrap();
    assert_eq!(value["inputSize"], 4);
    assert_eq!(value["encodingLayers"].as_array().unwrap().len(), 2);
}

#[test]
fn reseeded_autoencoder_loads_are_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("encoder.pere");
    let mut encoder = AutoEncoder::with_seed(4, 2).unwrap();
    encoder.add_coding_layer(2, Activation::Sigmoid).unwrap();
    encoder.save_pere(&path).unwrap();

    let train = |seed: u64| {
        let mut loaded = AutoEncoder::load_pere(&path).unwrap();
        loaded.reseed(seed);
        for _ in 0..30 {
            loaded.train(&[1.0, 0.0, 0.0, 1.0], 0.3, 0.2).unwrap();
        }
        loaded.to_data()
    };
    assert_eq!(train(7), train(7));
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.pere");
    let err = Network::load_pere(&path).unwrap_err();
    assert!(format!("{err:#}").contains("absent.pere"));
}
