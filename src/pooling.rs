//! Reductions used by pooling layers.
use crate::error::NnError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolingMethod {
    /// Largest value in the block.
    Max,
    /// Arithmetic mean of the block.
    Avg,
}

impl PoolingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolingMethod::Max => "max",
            PoolingMethod::Avg => "avg",
        }
    }

    /// Reduces the `pool_size × pool_size` block whose top-left corner is at
    /// (`row`, `col`) of a row-major plane `cols` wide.
    ///
    /// The caller guarantees the block lies inside the plane.
    pub fn pooled_value(&self, plane: &[f32], cols: usize, row: usize, col: usize, pool_size: usize) -> f32 {
        let block = (row..row + pool_size)
            .flat_map(|r| (col..col + pool_size).map(move |c| r * cols + c))
            .map(|index| plane[index]);
        match self {
            PoolingMethod::Max => block.fold(f32::NEG_INFINITY, f32::max),
            PoolingMethod::Avg => block.sum::<f32>() / (pool_size * pool_size) as f32,
        }
    }
}

impl fmt::Display for PoolingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PoolingMethod {
    type Err = NnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max" => Ok(PoolingMethod::Max),
            "avg" => Ok(PoolingMethod::Avg),
            other => Err(NnError::InvalidArgument(format!("unknown pooling method: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLANE: [f32; 16] = [
        4.0, 2.0, 6.0, 5.0, //
        1.0, 3.0, 8.0, 7.0, //
        6.0, 9.0, 3.0, 4.0, //
        8.0, 7.0, 2.0, 5.0,
    ];

    #[test]
    fn max_picks_largest() {
        assert_eq!(PoolingMethod::Max.pooled_value(&PLANE, 4, 0, 2, 2), 8.0);
        assert_eq!(PoolingMethod::Max.pooled_value(&PLANE, 4, 2, 0, 2), 9.0);
    }

    #[test]
    fn avg_takes_mean() {
        assert_eq!(PoolingMethod::Avg.pooled_value(&PLANE, 4, 0, 0, 2), 2.5);
        assert_eq!(PoolingMethod::Avg.pooled_value(&PLANE, 4, 2, 2, 2), 3.5);
    }

    #[test]
    fn parses_tags() {
        assert_eq!("avg".parse::<PoolingMethod>().unwrap(), PoolingMethod::Avg);
        assert!("min".parse::<PoolingMethod>().is_err());
    }
}
