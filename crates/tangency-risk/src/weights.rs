//! Long-only, fully-invested weight vectors.

use crate::error::{Result, RiskError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Tolerance on the sum and bounds of a weight vector
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Portfolio weights, one per asset, each in `[0, 1]`, summing to one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct WeightVector(Array1<f64>);

impl WeightVector {
    /// Validate a weight vector.
    ///
    /// # Errors
    /// * `InsufficientData` for an empty vector
    /// * `InvalidParameter` when a component is outside `[0, 1]` or the sum is not one
    pub fn new(weights: Array1<f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(RiskError::no_assets());
        }

        if let Some(w) = weights
            .iter()
            .find(|w| !w.is_finite() || **w < -WEIGHT_TOLERANCE || **w > 1.0 + WEIGHT_TOLERANCE)
        {
            return Err(RiskError::InvalidParameter(format!(
                "weight {w} is outside [0, 1]"
            )));
        }

        let sum = weights.sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(RiskError::InvalidParameter(format!(
                "weights sum to {sum}, expected 1"
            )));
        }

        Ok(Self(weights))
    }

    /// Equal allocation across `n` assets.
    pub fn uniform(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(RiskError::no_assets());
        }
        Ok(Self(Array1::from_elem(n, 1.0 / n as f64)))
    }

    /// Clamp numerical noise below zero and rescale to sum exactly one.
    pub(crate) fn normalized(mut raw: Array1<f64>) -> Result<Self> {
        raw.mapv_inplace(|w| if w.is_finite() { w.max(0.0) } else { 0.0 });
        let sum = raw.sum();
        if sum <= f64::EPSILON {
            return Err(RiskError::InvalidParameter(
                "weight vector has no positive mass".to_string(),
            ));
        }
        raw /= sum;
        Ok(Self(raw))
    }

    /// Underlying array
    pub const fn as_array(&self) -> &Array1<f64> {
        &self.0
    }

    /// Number of assets
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a validated vector
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over components
    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.0.iter()
    }

    /// Copy into a plain vector
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }
}

impl TryFrom<Vec<f64>> for WeightVector {
    type Error = RiskError;

    fn try_from(value: Vec<f64>) -> Result<Self> {
        Self::new(Array1::from_vec(value))
    }
}

impl From<WeightVector> for Vec<f64> {
    fn from(value: WeightVector) -> Self {
        value.0.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_uniform() {
        let w = WeightVector::uniform(4).unwrap();
        assert_eq!(w.len(), 4);
        assert_abs_diff_eq!(w.as_array().sum(), 1.0, epsilon = 1e-15);
        assert!(WeightVector::uniform(0).is_err());
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(WeightVector::new(array![0.5, 0.6]).is_err());
        assert!(WeightVector::new(array![1.2, -0.2]).is_err());
        assert!(WeightVector::new(array![]).is_err());
    }

    #[test]
    fn test_normalized_clamps_noise() {
        let w = WeightVector::normalized(array![0.7, -1e-12, 0.3000001]).unwrap();
        assert_eq!(w.as_array()[1], 0.0);
        assert_abs_diff_eq!(w.as_array().sum(), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_serde_validates() {
        let w: WeightVector = serde_json::from_str("[0.25, 0.75]").unwrap();
        assert_eq!(w.to_vec(), vec![0.25, 0.75]);
        assert!(serde_json::from_str::<WeightVector>("[0.5, 0.9]").is_err());
    }
}
