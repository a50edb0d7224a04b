//! Matrix multiply and transpose, applied frame by frame.
use crate::error::{Dims, NnError, NnResult};
use crate::tensor::Tensor;

fn take_destination(dest: Option<Tensor>, expected: Dims) -> NnResult<Tensor> {
    match dest {
        Some(tensor) if tensor.dims() != expected => Err(NnError::ShapeMismatch {
            expected,
            actual: tensor.dims(),
        }),
        Some(tensor) => Ok(tensor),
        None => Ok(Tensor::zeros(expected.frames, expected.rows, expected.cols)),
    }
}

/// Per-frame product `result[f, r, c] = Σ a[f, r, i] * b[f, i, c]`.
///
/// Writes into `dest` when one is supplied (its extents must be exactly
/// `(a.frames, a.rows, b.cols)`), otherwise allocates the result.
pub fn matrix_multiply(a: &Tensor, b: &Tensor, dest: Option<Tensor>) -> NnResult<Tensor> {
    if a.frames() != b.frames() || a.cols() != b.rows() {
        return Err(NnError::DimensionMismatch {
            left: a.dims(),
            right: b.dims(),
        });
    }
    let expected = Dims::new(a.frames(), a.rows(), b.cols());
    let mut result = take_destination(dest, expected)?;
    let (lhs, rhs) = (a.as_slice(), b.as_slice());
    let (rows, inner, cols) = (a.rows(), a.cols(), b.cols());
    result.apply_function(|_, frame, row, col| {
        let lhs_row = (frame * rows + row) * inner;
        let rhs_frame = frame * inner * cols;
        let mut sum = 0.0f32;
        for i in 0..inner {
            sum += lhs[lhs_row + i] * rhs[rhs_frame + i * cols + col];
        }
        sum
    });
    Ok(result)
}

/// Per-frame transpose `result[f, r, c] = a[f, c, r]`.
pub fn matrix_transpose(a: &Tensor, dest: Option<Tensor>) -> NnResult<Tensor> {
    let expected = Dims::new(a.frames(), a.cols(), a.rows());
    let mut result = take_destination(dest, expected)?;
    let source = a.as_slice();
    let (rows, cols) = (a.rows(), a.cols());
    result.apply_function(|_, frame, row, col| source[(frame * rows + col) * cols + row]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplies_per_frame() {
        let a = Tensor::from_3d(&[
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
            vec![vec![0.0, 1.0], vec![1.0, 0.0]],
        ])
        .unwrap();
        let b = Tensor::from_3d(&[
            vec![vec![5.0], vec![6.0]],
            vec![vec![2.0], vec![3.0]],
        ])
        .unwrap();
        let product = matrix_multiply(&a, &b, None).unwrap();
        let expected = Tensor::from_3d(&[
            vec![vec![17.0], vec![39.0]],
            vec![vec![3.0], vec![2.0]],
        ])
        .unwrap();
        assert_eq!(product, expected);
    }

    #[test]
    fn rejects_mismatched_inner_dimension() {
        let a = Tensor::zeros_2d(2, 3);
        let b = Tensor::zeros_2d(2, 3);
        assert!(matches!(
            matrix_multiply(&a, &b, None),
            Err(NnError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn rejects_mismatched_frames() {
        let a = Tensor::zeros(2, 2, 2);
        let b = Tensor::zeros(1, 2, 2);
        assert!(matches!(
            matrix_multiply(&a, &b, None),
            Err(NnError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn writes_into_destination() {
        let a = Tensor::from_2d(&[vec![1.0, 2.0]]).unwrap();
        let b = Tensor::from_2d(&[vec![3.0], vec![4.0]]).unwrap();
        let dest = Tensor::from_2d(&[vec![100.0]]).unwrap();
        let product = matrix_multiply(&a, &b, Some(dest)).unwrap();
        assert_eq!(product.get(0, 0, 0).unwrap(), 11.0);

        let wrong = Tensor::zeros_2d(2, 2);
        assert!(matches!(
            matrix_multiply(&a, &b, Some(wrong)),
            Err(NnError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn transposes_each_frame() {
        let a = Tensor::from_2d(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let t = matrix_transpose(&a, None).unwrap();
        assert_eq!(t.dims(), Dims::new(1, 3, 2));
        assert_eq!(t.get(0, 2, 1).unwrap(), 6.0);
        assert_eq!(t.get(0, 0, 1).unwrap(), 4.0);
        assert!(matches!(
            matrix_transpose(&a, Some(Tensor::zeros_2d(2, 3))),
            Err(NnError::ShapeMismatch { .. })
        ));
    }
}
