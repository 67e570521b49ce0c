//! Experiment domain module for deterministic A/B testing
//!
//! This module provides the types and traits for configuring tests,
//! assigning users to variants, recording conversions and aggregating
//! results.

mod assignment;
mod conversion;
mod entity;
mod repository;
mod results;
mod validation;

// Re-export all public types
pub use assignment::{AssignmentId, TestAssignment, Tracking, UserAssignment};
pub use conversion::{ConversionEvent, ConversionId, DEFAULT_EVENT};
pub use entity::{Metadata, TestConfig, TestId, UserId, VariantValue};
pub use repository::ExperimentStore;
pub use results::{aggregate_results, TestResults, TestStats, VariantResults};
pub use validation::{
    validate_test_config, validate_test_id, ConfigValidationError, MIN_VARIANTS,
    WEIGHT_SUM_TOLERANCE,
};

#[cfg(test)]
pub use repository::mock::MockExperimentStore;
