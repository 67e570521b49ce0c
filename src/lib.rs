//! Deterministic A/B experiment engine
//!
//! Assigns users to weighted variants by hashing, so the same user always
//! sees the same variant with no coordination between instances, and
//! aggregates stored assignments and conversions into per-variant results.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use ab_engine::{ExperimentService, InMemoryStore, VariantValue};
//!
//! # async fn run() -> Result<(), ab_engine::DomainError> {
//! let service = ExperimentService::new(Arc::new(InMemoryStore::new()));
//!
//! // Registers the test on first use and buckets the user.
//! let outcome = service
//!     .run_test(
//!         "cta-color",
//!         "user-42",
//!         vec![VariantValue::from("red"), VariantValue::from("blue")],
//!         Default::default(),
//!     )
//!     .await?;
//!
//! // Later, attribute an action to whatever the user was shown.
//! service.record_conversion(&outcome, Some("signup"), None).await?;
//!
//! let results = service.compute_results("cta-color").await?;
//! assert!(results.is_some());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::{EngineConfig, IdentityConfig};
pub use domain::experiment::{
    aggregate_results, AssignmentId, ConfigValidationError, ConversionEvent, ConversionId,
    ExperimentStore, Metadata, TestAssignment, TestConfig, TestId, TestResults, TestStats,
    Tracking, UserAssignment, UserId, VariantResults, VariantValue, DEFAULT_EVENT,
};
pub use domain::DomainError;
pub use infrastructure::experiment::{
    stable_hash_32, InMemoryStore, StoreCounts, VariantBucketer,
};
pub use infrastructure::services::{ExperimentService, RunTestOptions};
