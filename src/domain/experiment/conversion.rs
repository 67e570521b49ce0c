//! Conversion events recorded against tracked assignments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::assignment::{AssignmentId, UserAssignment};
use super::entity::{Metadata, TestId, UserId, VariantValue};

/// Event name used when the caller does not provide one
pub const DEFAULT_EVENT: &str = "conversion";

// ============================================================================
// ConversionId
// ============================================================================

/// Unique identifier for a conversion event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversionId(String);

impl ConversionId {
    /// Create a conversion ID from an existing value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh unique conversion ID
    pub fn generate() -> Self {
        Self(format!("conv-{}", uuid::Uuid::new_v4()))
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ConversionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ConversionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ConversionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ConversionEvent
// ============================================================================

/// A recorded user action attributed to a variant
///
/// The variant, test and user are copied from the assignment rather than
/// re-derived at record time, so the event always matches what the user was
/// actually shown even if the test configuration changes later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionEvent {
    id: ConversionId,
    test_id: TestId,
    user_id: UserId,
    event: String,
    variant: VariantValue,
    assignment_id: AssignmentId,
    converted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    metadata: Metadata,
}

impl ConversionEvent {
    /// Create a conversion event attributed to an assignment
    pub fn from_assignment(assignment: &UserAssignment, event: impl Into<String>) -> Self {
        Self {
            id: ConversionId::generate(),
            test_id: assignment.test_id().clone(),
            user_id: assignment.user_id().clone(),
            event: event.into(),
            variant: assignment.variant().clone(),
            assignment_id: assignment.id().clone(),
            converted_at: Utc::now(),
            metadata: Metadata::new(),
        }
    }

    /// Attach metadata
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Override the conversion timestamp
    pub fn with_converted_at(mut self, converted_at: DateTime<Utc>) -> Self {
        self.converted_at = converted_at;
        self
    }

    /// Get the conversion ID
    pub fn id(&self) -> &ConversionId {
        &self.id
    }

    /// Get the test ID
    pub fn test_id(&self) -> &TestId {
        &self.test_id
    }

    /// Get the user ID
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Get the event name
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Get the variant the user was shown
    pub fn variant(&self) -> &VariantValue {
        &self.variant
    }

    /// Get the ID of the assignment this event is attributed to
    pub fn assignment_id(&self) -> &AssignmentId {
        &self.assignment_id
    }

    /// Get the conversion timestamp
    pub fn converted_at(&self) -> DateTime<Utc> {
        self.converted_at
    }

    /// Get the attached metadata
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}
