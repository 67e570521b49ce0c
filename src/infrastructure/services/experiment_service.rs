//! Experiment service for deterministic A/B testing
//!
//! Provides the business logic for configuring tests, resolving user
//! assignments, recording conversions and aggregating results.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::domain::experiment::{
    aggregate_results, validate_test_config, AssignmentId, ConversionEvent, ExperimentStore,
    Metadata, TestAssignment, TestConfig, TestId, TestResults, UserAssignment, VariantValue,
};
use crate::domain::DomainError;
use crate::infrastructure::experiment::VariantBucketer;

// ============================================================================
// Request Types
// ============================================================================

/// Optional parameters for `run_test`
#[derive(Debug, Clone, Default)]
pub struct RunTestOptions {
    /// Explicit variant weights; equal weights when omitted
    pub weights: Option<Vec<f64>>,
    /// Metadata stored on a newly created test configuration
    pub metadata: Option<Metadata>,
}

impl RunTestOptions {
    /// Create options with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set explicit variant weights
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Set metadata for a newly created test configuration
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

// ============================================================================
// Experiment Service
// ============================================================================

/// Service running deterministic A/B tests against a storage collaborator
#[derive(Debug)]
pub struct ExperimentService<S: ExperimentStore> {
    store: Arc<S>,
    config: EngineConfig,
}

impl<S: ExperimentStore> ExperimentService<S> {
    /// Create a new experiment service with default engine settings
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Create a new experiment service with explicit engine settings
    pub fn with_config(store: Arc<S>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Get the engine settings
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================================================
    // Test configuration
    // ========================================================================

    /// Register a test configuration if it does not already exist
    ///
    /// Idempotent: when a configuration with the same ID is already stored
    /// it is returned unchanged, and the arguments of the later call are
    /// ignored. Validation applies only when a new configuration is created.
    pub async fn ensure_test_config(
        &self,
        test_id: &str,
        variants: Vec<VariantValue>,
        weights: Option<Vec<f64>>,
        metadata: Option<Metadata>,
    ) -> Result<TestConfig, DomainError> {
        debug!(test_id = %test_id, "Ensuring test configuration");

        let test_id = self.parse_id(test_id)?;

        if let Some(existing) = self.store.get_test_config(&test_id).await? {
            return Ok(existing);
        }

        let weights = weights.unwrap_or_else(|| TestConfig::equal_weights(variants.len()));

        validate_test_config(&variants, &weights)
            .map_err(|e| DomainError::configuration(e.to_string()))?;

        let mut config = TestConfig::new(test_id.clone(), variants).with_weights(weights);

        if let Some(metadata) = metadata {
            config = config.with_metadata(metadata);
        }

        self.store.save_test_config(config.clone()).await?;
        info!(test_id = %test_id, "Test configuration created");

        Ok(config)
    }

    /// List all registered test configurations
    pub async fn list_tests(&self) -> Result<Vec<TestConfig>, DomainError> {
        self.store.list_test_configs().await
    }

    /// Stop a test from handing out new assignments
    ///
    /// Returns `false` when no such test exists. Stored assignments and
    /// conversions are kept and results stay queryable.
    pub async fn deactivate_test(&self, test_id: &str) -> Result<bool, DomainError> {
        debug!(test_id = %test_id, "Deactivating test");

        let test_id = self.parse_id(test_id)?;

        let Some(mut config) = self.store.get_test_config(&test_id).await? else {
            warn!(test_id = %test_id, "Cannot deactivate unknown test");
            return Ok(false);
        };

        config.deactivate();
        self.store.save_test_config(config).await?;
        info!(test_id = %test_id, "Test deactivated");

        Ok(true)
    }

    // ========================================================================
    // Assignment
    // ========================================================================

    /// Get or create the assignment for a `(test, user)` pair
    ///
    /// Returns `None` when the test is unknown or inactive. Otherwise the
    /// stored assignment is returned if one exists; a new one is bucketed,
    /// persisted and returned if not. Repeated calls yield the same
    /// assignment record.
    pub async fn resolve_assignment(
        &self,
        test_id: &str,
        user_id: &str,
    ) -> Result<Option<UserAssignment>, DomainError> {
        let test_id = self.parse_id(test_id)?;
        let user_id = user_id.into();

        let Some(config) = self.store.get_test_config(&test_id).await? else {
            debug!(test_id = %test_id, "No assignment: test not registered");
            return Ok(None);
        };

        if !config.is_active() {
            debug!(test_id = %test_id, "No assignment: test inactive");
            return Ok(None);
        }

        if let Some(existing) = self.store.get_assignment(&test_id, &user_id).await? {
            return Ok(Some(existing));
        }

        let variant =
            VariantBucketer::choose(&test_id, &user_id, config.variants(), config.weights())?
                .clone();

        let assignment = UserAssignment::new(test_id.clone(), user_id.clone(), variant);
        debug!(
            test_id = %test_id,
            user_id = %user_id,
            variant = %assignment.variant(),
            "Created assignment"
        );

        self.store.save_assignment(assignment.clone()).await?;

        // The store may have kept an earlier concurrent write for this
        // pair; whatever it holds now is authoritative.
        let stored = self.store.get_assignment(&test_id, &user_id).await?;
        Ok(Some(stored.unwrap_or(assignment)))
    }

    /// Run a test for a user, registering the test on first use
    ///
    /// The convenience entry point for callers that do not manage test
    /// configurations separately. When assignment is impossible (inactive
    /// test, configuration rejected by a concurrent writer) the first
    /// declared variant is returned as an untracked fallback so the caller
    /// can still render something.
    pub async fn run_test(
        &self,
        test_id: &str,
        user_id: &str,
        variants: Vec<VariantValue>,
        options: RunTestOptions,
    ) -> Result<TestAssignment, DomainError> {
        let parsed_id = self.parse_id(test_id)?;

        let metadata = options.metadata.or_else(|| {
            let mut auto = Metadata::new();
            auto.insert(
                "name".to_string(),
                serde_json::Value::String(format!("Auto-generated test: {}", parsed_id)),
            );
            Some(auto)
        });

        self.ensure_test_config(test_id, variants.clone(), options.weights, metadata)
            .await?;

        if let Some(assignment) = self.resolve_assignment(test_id, user_id).await? {
            return Ok(TestAssignment::tracked(assignment));
        }

        let Some(first_variant) = variants.first() else {
            return Err(DomainError::configuration(
                "Cannot fall back without any variants",
            ));
        };

        warn!(
            test_id = %parsed_id,
            user_id = %user_id,
            "Assignment unavailable, returning untracked fallback"
        );

        let fallback =
            UserAssignment::new(parsed_id, user_id.into(), first_variant.clone());
        Ok(TestAssignment::untracked(fallback))
    }

    /// Look up an assignment by its ID
    ///
    /// Used to resolve the back-reference a conversion event carries.
    pub async fn find_assignment(
        &self,
        id: &AssignmentId,
    ) -> Result<Option<UserAssignment>, DomainError> {
        self.store.get_assignment_by_id(id).await
    }

    // ========================================================================
    // Conversion
    // ========================================================================

    /// Record a conversion against a test assignment
    ///
    /// The event copies its attribution from the assignment. Conversions
    /// against untracked assignments are silently discarded and reported as
    /// `Ok(None)`; losing an event is preferable to failing the caller's
    /// request path.
    pub async fn record_conversion(
        &self,
        assignment: &TestAssignment,
        event: Option<&str>,
        metadata: Option<Metadata>,
    ) -> Result<Option<ConversionEvent>, DomainError> {
        if !assignment.is_tracked() {
            warn!(
                test_id = %assignment.assignment().test_id(),
                user_id = %assignment.assignment().user_id(),
                "Dropping conversion for untracked assignment"
            );
            return Ok(None);
        }

        let event_name = event.unwrap_or(self.config.default_event.as_str());

        let mut conversion = ConversionEvent::from_assignment(assignment.assignment(), event_name);

        if let Some(metadata) = metadata {
            conversion = conversion.with_metadata(metadata);
        }

        self.store.save_conversion(conversion.clone()).await?;
        info!(
            test_id = %conversion.test_id(),
            event = %conversion.event(),
            variant = %conversion.variant(),
            "Conversion recorded"
        );

        Ok(Some(conversion))
    }

    // ========================================================================
    // Results
    // ========================================================================

    /// Aggregate stored records into results for a test
    ///
    /// Returns `None` when the test is unknown. The output is a
    /// point-in-time snapshot over whatever the store currently holds.
    pub async fn compute_results(
        &self,
        test_id: &str,
    ) -> Result<Option<TestResults>, DomainError> {
        debug!(test_id = %test_id, "Computing test results");

        let test_id = self.parse_id(test_id)?;

        let Some(config) = self.store.get_test_config(&test_id).await? else {
            return Ok(None);
        };

        let assignments = self.store.list_assignments(&test_id).await?;
        let conversions = self.store.list_conversions(&test_id).await?;

        Ok(Some(aggregate_results(&config, &assignments, &conversions)))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn parse_id(&self, id: &str) -> Result<TestId, DomainError> {
        TestId::new(id).map_err(|e| DomainError::configuration(e.to_string()))
    }
}
