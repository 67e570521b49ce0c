//! In-memory implementation of the experiment store
//!
//! Keeps everything in process-local maps behind read/write locks. Useful
//! for tests and local development; offers no durability and is not meant
//! as a production persistence layer.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::experiment::{
    AssignmentId, ConversionEvent, ExperimentStore, TestConfig, TestId, UserAssignment, UserId,
};
use crate::domain::DomainError;

/// Record counts for inspection and test setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCounts {
    pub tests: usize,
    pub assignments: usize,
    pub conversions: usize,
}

/// In-memory experiment store implementation
#[derive(Debug, Default)]
pub struct InMemoryStore {
    configs: RwLock<HashMap<TestId, TestConfig>>,
    assignments: RwLock<HashMap<(TestId, UserId), UserAssignment>>,
    conversions: RwLock<Vec<ConversionEvent>>,
}

impl InMemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all stored records
    pub fn clear(&self) -> Result<(), DomainError> {
        self.configs
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))?
            .clear();
        self.assignments
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))?
            .clear();
        self.conversions
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))?
            .clear();
        Ok(())
    }

    /// Count stored records per kind
    pub fn counts(&self) -> Result<StoreCounts, DomainError> {
        let tests = self
            .configs
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))?
            .len();
        let assignments = self
            .assignments
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))?
            .len();
        let conversions = self
            .conversions
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))?
            .len();

        Ok(StoreCounts {
            tests,
            assignments,
            conversions,
        })
    }
}

#[async_trait]
impl ExperimentStore for InMemoryStore {
    async fn save_test_config(&self, config: TestConfig) -> Result<(), DomainError> {
        let mut configs = self
            .configs
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))?;

        configs.insert(config.test_id().clone(), config);
        Ok(())
    }

    async fn get_test_config(&self, test_id: &TestId) -> Result<Option<TestConfig>, DomainError> {
        let configs = self
            .configs
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))?;

        Ok(configs.get(test_id).cloned())
    }

    async fn list_test_configs(&self) -> Result<Vec<TestConfig>, DomainError> {
        let configs = self
            .configs
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))?;

        let mut all: Vec<TestConfig> = configs.values().cloned().collect();
        all.sort_by(|a, b| a.test_id().as_str().cmp(b.test_id().as_str()));
        Ok(all)
    }

    async fn save_assignment(&self, assignment: UserAssignment) -> Result<(), DomainError> {
        let mut assignments = self
            .assignments
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))?;

        // First writer wins for a pair; later writes are dropped.
        let key = (assignment.test_id().clone(), assignment.user_id().clone());
        assignments.entry(key).or_insert(assignment);
        Ok(())
    }

    async fn get_assignment(
        &self,
        test_id: &TestId,
        user_id: &UserId,
    ) -> Result<Option<UserAssignment>, DomainError> {
        let assignments = self
            .assignments
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))?;

        let key = (test_id.clone(), user_id.clone());
        Ok(assignments.get(&key).cloned())
    }

    async fn get_assignment_by_id(
        &self,
        id: &AssignmentId,
    ) -> Result<Option<UserAssignment>, DomainError> {
        let assignments = self
            .assignments
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))?;

        Ok(assignments.values().find(|a| a.id() == id).cloned())
    }

    async fn list_assignments(
        &self,
        test_id: &TestId,
    ) -> Result<Vec<UserAssignment>, DomainError> {
        let assignments = self
            .assignments
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))?;

        Ok(assignments
            .values()
            .filter(|a| a.test_id() == test_id)
            .cloned()
            .collect())
    }

    async fn save_conversion(&self, event: ConversionEvent) -> Result<(), DomainError> {
        let mut conversions = self
            .conversions
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))?;

        conversions.push(event);
        Ok(())
    }

    async fn list_conversions(
        &self,
        test_id: &TestId,
    ) -> Result<Vec<ConversionEvent>, DomainError> {
        let conversions = self
            .conversions
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))?;

        Ok(conversions
            .iter()
            .filter(|c| c.test_id() == test_id)
            .cloned()
            .collect())
    }
}
