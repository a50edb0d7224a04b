//! In-memory datasets of (input, target) tensor pairs.
use crate::tensor::Tensor;
use rand::Rng;

pub type Dataset = Vec<(Tensor, Tensor)>;

/// One-hot encode `label` as a 1×1×`num_classes` row. Out-of-range labels give all zeros.
pub fn one_hot(label: usize, num_classes: usize) -> Tensor {
    let mut values = vec![0.0; num_classes];
    if let Some(slot) = values.get_mut(label) {
        *slot = 1.0;
    }
    Tensor::from_1d(&values)
}

/// The XOR truth table as four single-row pairs.
pub fn xor() -> Dataset {
    [([0.0, 0.0], 0.0), ([0.0, 1.0], 1.0), ([1.0, 0.0], 1.0), ([1.0, 1.0], 0.0)]
        .iter()
        .map(|(input, target)| (Tensor::from_1d(input), Tensor::from_1d(&[*target])))
        .collect()
}

/// Square single-frame images with one bright stripe, labelled
/// `[1, 0]` for vertical and `[0, 1]` for horizontal.
///
/// Background pixels are small random values in `[0, 0.2)`.
pub fn stripes<R: Rng + ?Sized>(size: usize, count: usize, rng: &mut R) -> Dataset {
    (0..count)
        .map(|i| {
            let vertical = i % 2 == 0;
            let line = rng.gen_range(0..size.max(1));
            let mut image = Tensor::zeros_2d(size, size);
            image.apply_function(|_, _, row, col| {
                let on_line = if vertical { col == line } else { row == line };
                if on_line {
                    1.0
                } else {
                    rng.gen::<f32>() * 0.2
                }
            });
            (image, one_hot(usize::from(!vertical), 2))
        })
        .collect()
}
