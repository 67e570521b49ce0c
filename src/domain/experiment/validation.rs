//! Test configuration validation utilities

use thiserror::Error;

use super::entity::VariantValue;

/// Minimum number of variants a test must declare
pub const MIN_VARIANTS: usize = 2;

/// Tolerance when checking that weights sum to 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.001;

/// Validation errors for test configurations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("Test ID cannot be empty")]
    EmptyTestId,

    #[error("Test must declare at least 2 variants, got {0}")]
    InsufficientVariants(usize),

    #[error("Weights length {weights} does not match variants length {variants}")]
    WeightCountMismatch { variants: usize, weights: usize },

    #[error("Weight at index {index} must be a finite non-negative number, got {value}")]
    InvalidWeight { index: usize, value: f64 },

    #[error("Weights must sum to 1.0 within 0.001, got {0}")]
    InvalidWeightSum(f64),
}

/// Validate a test ID
///
/// IDs arrive from external systems and are kept opaque; only emptiness is
/// rejected.
pub fn validate_test_id(id: &str) -> Result<(), ConfigValidationError> {
    if id.is_empty() {
        return Err(ConfigValidationError::EmptyTestId);
    }

    Ok(())
}

/// Validate the variant/weight shape of a test configuration
pub fn validate_test_config(
    variants: &[VariantValue],
    weights: &[f64],
) -> Result<(), ConfigValidationError> {
    if variants.len() < MIN_VARIANTS {
        return Err(ConfigValidationError::InsufficientVariants(variants.len()));
    }

    if weights.len() != variants.len() {
        return Err(ConfigValidationError::WeightCountMismatch {
            variants: variants.len(),
            weights: weights.len(),
        });
    }

    for (index, &value) in weights.iter().enumerate() {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigValidationError::InvalidWeight { index, value });
        }
    }

    let sum: f64 = weights.iter().sum();

    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ConfigValidationError::InvalidWeightSum(sum));
    }

    Ok(())
}
