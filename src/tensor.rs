//! Dense 3-dimensional `f32` container (frames × rows × cols).
use crate::error::{Dims, NnError, NnResult};
use rand::Rng;
use std::fmt;

/// An owned grid of `f32` values indexed by (frame, row, col).
///
/// Values are stored contiguously, frame-major, then row, then column.
/// Extents are fixed at construction.
#[derive(Debug, Clone)]
pub struct Tensor {
    frames: usize,
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

impl Tensor {
    /// Zero-filled tensor with the given extents.
    pub fn zeros(frames: usize, rows: usize, cols: usize) -> Self {
        Self {
            frames,
            rows,
            cols,
            values: vec![0.0; frames * rows * cols],
        }
    }

    /// Single frame, single row.
    pub fn zeros_1d(cols: usize) -> Self {
        Self::zeros(1, 1, cols)
    }

    /// Single frame.
    pub fn zeros_2d(rows: usize, cols: usize) -> Self {
        Self::zeros(1, rows, cols)
    }

    /// Builds a 1×1×n tensor. An empty slice yields a single zero.
    pub fn from_1d(values: &[f32]) -> Self {
        if values.is_empty() {
            return Self::zeros(1, 1, 1);
        }
        Self {
            frames: 1,
            rows: 1,
            cols: values.len(),
            values: values.to_vec(),
        }
    }

    /// Builds a single-frame tensor from rows of equal length.
    pub fn from_2d(values: &[Vec<f32>]) -> NnResult<Self> {
        Self::from_3d(&[values.to_vec()])
    }

    /// Builds a tensor from frames of rows of equal length. Input holding no
    /// values at all yields a single zero; every frame and row must match the
    /// extents of the first.
    pub fn from_3d(values: &[Vec<Vec<f32>>]) -> NnResult<Self> {
        if values.iter().flatten().all(Vec::is_empty) {
            return Ok(Self::zeros(1, 1, 1));
        }
        let frames = values.len();
        let rows = values[0].len();
        let cols = values[0].first().map_or(0, Vec::len);
        let mut flat = Vec::with_capacity(frames * rows * cols);
        for frame in values {
            if frame.len() != rows {
                return Err(NnError::DimensionMismatch {
                    left: Dims::new(frames, rows, cols),
                    right: Dims::new(frames, frame.len(), cols),
                });
            }
            for row in frame {
                if row.len() != cols {
                    return Err(NnError::DimensionMismatch {
                        left: Dims::new(frames, rows, cols),
                        right: Dims::new(frames, rows, row.len()),
                    });
                }
                flat.extend_from_slice(row);
            }
        }
        Ok(Self {
            frames,
            rows,
            cols,
            values: flat,
        })
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn dims(&self) -> Dims {
        Dims::new(self.frames, self.rows, self.cols)
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flat view in frame-major, row, column order.
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    #[inline]
    fn offset(&self, frame: usize, row: usize, col: usize) -> usize {
        (frame * self.rows + row) * self.cols + col
    }

    fn check_index(&self, frame: usize, row: usize, col: usize) -> NnResult<usize> {
        if frame >= self.frames || row >= self.rows || col >= self.cols {
            return Err(NnError::OutOfBounds {
                index: Dims::new(frame, row, col),
                extent: self.dims(),
            });
        }
        Ok(self.offset(frame, row, col))
    }

    fn check_same_dims(&self, other: &Tensor) -> NnResult<()> {
        if self.dims() != other.dims() {
            return Err(NnError::DimensionMismatch {
                left: self.dims(),
                right: other.dims(),
            });
        }
        Ok(())
    }

    pub fn get(&self, frame: usize, row: usize, col: usize) -> NnResult<f32> {
        let offset = self.check_index(frame, row, col)?;
        Ok(self.values[offset])
    }

    pub fn set(&mut self, frame: usize, row: usize, col: usize, value: f32) -> NnResult<()> {
        let offset = self.check_index(frame, row, col)?;
        self.values[offset] = value;
        Ok(())
    }

    /// One frame as nested rows.
    pub fn frame(&self, frame: usize) -> NnResult<Vec<Vec<f32>>> {
        if frame >= self.frames {
            return Err(NnError::OutOfBounds {
                index: Dims::new(frame, 0, 0),
                extent: self.dims(),
            });
        }
        let start = self.offset(frame, 0, 0);
        let plane = &self.values[start..start + self.rows * self.cols];
        Ok(plane
            .chunks(self.cols.max(1))
            .take(self.rows)
            .map(|row| row.to_vec())
            .collect())
    }

    /// All values as nested frames of rows.
    pub fn to_nested(&self) -> Vec<Vec<Vec<f32>>> {
        (0..self.frames)
            .map(|frame| {
                (0..self.rows)
                    .map(|row| {
                        let start = self.offset(frame, row, 0);
                        self.values[start..start + self.cols].to_vec()
                    })
                    .collect()
            })
            .collect()
    }

    /// Copies every value from `other`, whose extents must match exactly.
    pub fn set_all(&mut self, other: &Tensor) -> NnResult<()> {
        self.check_same_dims(other)?;
        self.values.copy_from_slice(&other.values);
        Ok(())
    }

    /// Fills the tensor with values drawn uniformly from `[min, max)`.
    pub fn set_random<R: Rng + ?Sized>(&mut self, min: f32, max: f32, rng: &mut R) -> NnResult<()> {
        if min >= max {
            return Err(NnError::InvalidArgument(format!(
                "minimum must be less than maximum: {min} >= {max}"
            )));
        }
        self.apply_function(|_, _, _, _| rng.gen::<f32>() * (max - min) + min);
        Ok(())
    }

    /// Maps every element through `function(value, frame, row, col)`.
    pub fn apply_function<F>(&mut self, mut function: F)
    where
        F: FnMut(f32, usize, usize, usize) -> f32,
    {
        let mut offset = 0;
        for frame in 0..self.frames {
            for row in 0..self.rows {
                for col in 0..self.cols {
                    self.values[offset] = function(self.values[offset], frame, row, col);
                    offset += 1;
                }
            }
        }
    }

    fn zip_apply<F>(&mut self, other: &Tensor, mut function: F) -> NnResult<()>
    where
        F: FnMut(f32, f32) -> f32,
    {
        self.check_same_dims(other)?;
        for (current, &value) in self.values.iter_mut().zip(&other.values) {
            *current = function(*current, value);
        }
        Ok(())
    }

    pub fn add(&mut self, value: f32) {
        self.apply_function(|current, _, _, _| current + value);
    }

    pub fn subtract(&mut self, value: f32) {
        self.apply_function(|current, _, _, _| current - value);
    }

    pub fn scale(&mut self, value: f32) {
        self.apply_function(|current, _, _, _| current * value);
    }

    pub fn add_tensor(&mut self, other: &Tensor) -> NnResult<()> {
        self.zip_apply(other, |current, value| current + value)
    }

    pub fn subtract_tensor(&mut self, other: &Tensor) -> NnResult<()> {
        self.zip_apply(other, |current, value| current - value)
    }

    /// Elementwise (Hadamard) product.
    pub fn scale_tensor(&mut self, other: &Tensor) -> NnResult<()> {
        self.zip_apply(other, |current, value| current * value)
    }

    pub fn sum(&self) -> f32 {
        self.values.iter().sum()
    }

    /// Largest absolute elementwise difference to a tensor of the same extents.
    pub fn max_abs_diff(&self, other: &Tensor) -> NnResult<f32> {
        self.check_same_dims(other)?;
        Ok(self
            .values
            .iter()
            .zip(&other.values)
            .fold(0.0f32, |acc, (&a, &b)| acc.max((a - b).abs())))
    }
}

/// Structural equality: identical extents and identical values.
impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.dims() == other.dims() && self.values == other.values
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in 0..self.frames {
            for row in 0..self.rows {
                let start = self.offset(frame, row, 0);
                let line: Vec<String> = self.values[start..start + self.cols]
                    .iter()
                    .map(|v| format!("{v:.4}"))
                    .collect();
                writeln!(f, "{}", line.join(" "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn deep_copy_is_independent() {
        let mut tensor = Tensor::from_2d(&[vec![1.0, 1.0, 1.0], vec![1.0, 1.0, 1.0]]).unwrap();
        let deep = tensor.clone();
        tensor.set(0, 0, 0, 2.0).unwrap();
        assert_eq!(tensor.get(0, 0, 0).unwrap(), 2.0);
        assert_eq!(deep.get(0, 0, 0).unwrap(), 1.0);
    }

    #[test]
    fn out_of_bounds_access_is_an_error() {
        let mut tensor = Tensor::zeros(2, 2, 2);
        assert!(matches!(tensor.get(2, 0, 0), Err(NnError::OutOfBounds { .. })));
        assert!(matches!(tensor.set(0, 0, 2, 1.0), Err(NnError::OutOfBounds { .. })));
        assert!(tensor.set(1, 1, 1, 1.0).is_ok());
    }

    #[test]
    fn equality_requires_matching_frames() {
        let one = Tensor::zeros(1, 2, 2);
        let two = Tensor::zeros(2, 2, 2);
        assert_ne!(one, two);
        assert_eq!(one, Tensor::zeros_2d(2, 2));
    }

    #[test]
    fn empty_input_builds_single_zero() {
        assert_eq!(Tensor::from_1d(&[]), Tensor::zeros(1, 1, 1));
        assert_eq!(Tensor::from_2d(&[]).unwrap(), Tensor::zeros(1, 1, 1));
        assert_eq!(Tensor::from_2d(&[vec![]]).unwrap(), Tensor::zeros(1, 1, 1));
        assert_eq!(Tensor::from_3d(&[vec![], vec![vec![]]]).unwrap(), Tensor::zeros(1, 1, 1));
    }

    #[test]
    fn empty_first_frame_does_not_hide_later_frames() {
        let frames: Vec<Vec<Vec<f32>>> = vec![vec![], vec![vec![1.0, 2.0], vec![3.0, 4.0]]];
        assert!(matches!(Tensor::from_3d(&frames), Err(NnError::DimensionMismatch { .. })));
        let frames: Vec<Vec<Vec<f32>>> = vec![vec![vec![1.0, 2.0]], vec![vec![3.0, 4.0], vec![5.0, 6.0]]];
        assert!(matches!(Tensor::from_3d(&frames), Err(NnError::DimensionMismatch { .. })));
        let rows: Vec<Vec<f32>> = vec![vec![], vec![1.0]];
        assert!(matches!(Tensor::from_2d(&rows), Err(NnError::DimensionMismatch { .. })));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let ragged = Tensor::from_2d(&[vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(ragged, Err(NnError::DimensionMismatch { .. })));
    }

    #[test]
    fn set_random_respects_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut tensor = Tensor::zeros(2, 3, 4);
        tensor.set_random(-1.0, 1.0, &mut rng).unwrap();
        assert!(tensor.as_slice().iter().all(|v| (-1.0..1.0).contains(v)));
        assert!(matches!(
            tensor.set_random(1.0, 1.0, &mut rng),
            Err(NnError::InvalidArgument(_))
        ));
    }

    #[test]
    fn frame_extracts_rows() {
        let tensor = Tensor::from_3d(&[
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
            vec![vec![5.0, 6.0], vec![7.0, 8.0]],
        ])
        .unwrap();
        assert_eq!(tensor.frame(1).unwrap(), vec![vec![5.0, 6.0], vec![7.0, 8.0]]);
        assert!(tensor.frame(2).is_err());
    }

    #[test]
    fn display_prints_four_decimals() {
        let tensor = Tensor::from_2d(&[vec![1.0, 0.5]]).unwrap();
        assert_eq!(tensor.to_string(), "1.0000 0.5000\n\n");
    }
}
