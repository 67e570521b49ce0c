//! Storage collaborator contract for the experiment engine

use async_trait::async_trait;
use std::fmt::Debug;

use super::assignment::{AssignmentId, UserAssignment};
use super::conversion::ConversionEvent;
use super::entity::{TestConfig, TestId, UserId};
use crate::domain::DomainError;

// ============================================================================
// ExperimentStore
// ============================================================================

/// Persistence contract the engine runs against
///
/// Implementations own durability and uniqueness: at most one assignment may
/// exist per `(test_id, user_id)` pair, and when two writers race the first
/// write wins while the loser's record is discarded. The engine performs no
/// retries and surfaces storage failures to callers unchanged.
#[async_trait]
pub trait ExperimentStore: Send + Sync + Debug {
    /// Save a test configuration, replacing any existing one with the same ID
    async fn save_test_config(&self, config: TestConfig) -> Result<(), DomainError>;

    /// Get a test configuration by ID
    async fn get_test_config(&self, test_id: &TestId) -> Result<Option<TestConfig>, DomainError>;

    /// List all stored test configurations
    async fn list_test_configs(&self) -> Result<Vec<TestConfig>, DomainError>;

    /// Save a user assignment
    ///
    /// If the `(test_id, user_id)` pair already has an assignment, the
    /// existing record is kept and this call succeeds without writing.
    async fn save_assignment(&self, assignment: UserAssignment) -> Result<(), DomainError>;

    /// Get the assignment for a `(test_id, user_id)` pair
    async fn get_assignment(
        &self,
        test_id: &TestId,
        user_id: &UserId,
    ) -> Result<Option<UserAssignment>, DomainError>;

    /// Get an assignment by its ID
    async fn get_assignment_by_id(
        &self,
        id: &AssignmentId,
    ) -> Result<Option<UserAssignment>, DomainError>;

    /// List all assignments recorded for a test
    async fn list_assignments(
        &self,
        test_id: &TestId,
    ) -> Result<Vec<UserAssignment>, DomainError>;

    /// Save a conversion event
    async fn save_conversion(&self, event: ConversionEvent) -> Result<(), DomainError>;

    /// List all conversion events recorded for a test
    async fn list_conversions(
        &self,
        test_id: &TestId,
    ) -> Result<Vec<ConversionEvent>, DomainError>;

    /// Check whether a test configuration exists
    async fn has_test_config(&self, test_id: &TestId) -> Result<bool, DomainError> {
        Ok(self.get_test_config(test_id).await?.is_some())
    }
}

// ============================================================================
// Mock implementation for tests
// ============================================================================

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// Mock store with configurable failure mode
    #[derive(Debug, Default)]
    pub struct MockExperimentStore {
        configs: RwLock<HashMap<TestId, TestConfig>>,
        assignments: RwLock<HashMap<(TestId, UserId), UserAssignment>>,
        conversions: RwLock<Vec<ConversionEvent>>,
        should_fail: RwLock<bool>,
    }

    impl MockExperimentStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every operation fail with a storage error
        pub fn with_error(self) -> Self {
            *self.should_fail.write().unwrap() = true;
            self
        }

        /// Number of conversion events recorded so far
        pub fn conversion_count(&self) -> usize {
            self.conversions.read().unwrap().len()
        }

        fn check_should_fail(&self) -> Result<(), DomainError> {
            if *self.should_fail.read().unwrap() {
                return Err(DomainError::storage("Mock storage failure"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ExperimentStore for MockExperimentStore {
        async fn save_test_config(&self, config: TestConfig) -> Result<(), DomainError> {
            self.check_should_fail()?;
            self.configs
                .write()
                .unwrap()
                .insert(config.test_id().clone(), config);
            Ok(())
        }

        async fn get_test_config(
            &self,
            test_id: &TestId,
        ) -> Result<Option<TestConfig>, DomainError> {
            self.check_should_fail()?;
            Ok(self.configs.read().unwrap().get(test_id).cloned())
        }

        async fn list_test_configs(&self) -> Result<Vec<TestConfig>, DomainError> {
            self.check_should_fail()?;
            Ok(self.configs.read().unwrap().values().cloned().collect())
        }

        async fn save_assignment(&self, assignment: UserAssignment) -> Result<(), DomainError> {
            self.check_should_fail()?;
            let key = (assignment.test_id().clone(), assignment.user_id().clone());
            self.assignments
                .write()
                .unwrap()
                .entry(key)
                .or_insert(assignment);
            Ok(())
        }

        async fn get_assignment(
            &self,
            test_id: &TestId,
            user_id: &UserId,
        ) -> Result<Option<UserAssignment>, DomainError> {
            self.check_should_fail()?;
            let key = (test_id.clone(), user_id.clone());
            Ok(self.assignments.read().unwrap().get(&key).cloned())
        }

        async fn get_assignment_by_id(
            &self,
            id: &AssignmentId,
        ) -> Result<Option<UserAssignment>, DomainError> {
            self.check_should_fail()?;
            Ok(self
                .assignments
                .read()
                .unwrap()
                .values()
                .find(|a| a.id() == id)
                .cloned())
        }

        async fn list_assignments(
            &self,
            test_id: &TestId,
        ) -> Result<Vec<UserAssignment>, DomainError> {
            self.check_should_fail()?;
            Ok(self
                .assignments
                .read()
                .unwrap()
                .values()
                .filter(|a| a.test_id() == test_id)
                .cloned()
                .collect())
        }

        async fn save_conversion(&self, event: ConversionEvent) -> Result<(), DomainError> {
            self.check_should_fail()?;
            self.conversions.write().unwrap().push(event);
            Ok(())
        }

        async fn list_conversions(
            &self,
            test_id: &TestId,
        ) -> Result<Vec<ConversionEvent>, DomainError> {
            self.check_should_fail()?;
            Ok(self
                .conversions
                .read()
                .unwrap()
                .iter()
                .filter(|c| c.test_id() == test_id)
                .cloned()
                .collect())
        }
    }
}
