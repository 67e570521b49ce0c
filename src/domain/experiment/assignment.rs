//! Assignment types binding users to the variants they were bucketed into

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::entity::{TestId, UserId, VariantValue};

// ============================================================================
// AssignmentId
// ============================================================================

/// Unique identifier for a user assignment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentId(String);

impl AssignmentId {
    /// Create an assignment ID from an existing value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh unique assignment ID
    pub fn generate() -> Self {
        Self(format!("asg-{}", uuid::Uuid::new_v4()))
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AssignmentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for AssignmentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// UserAssignment
// ============================================================================

/// A user's recorded variant for a test
///
/// At most one assignment exists per `(test_id, user_id)` pair; once written
/// it never changes, which is what keeps the user's experience stable across
/// sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAssignment {
    id: AssignmentId,
    test_id: TestId,
    user_id: UserId,
    variant: VariantValue,
    assigned_at: DateTime<Utc>,
}

impl UserAssignment {
    /// Create a new assignment with a generated ID and the current timestamp
    pub fn new(test_id: TestId, user_id: UserId, variant: VariantValue) -> Self {
        Self {
            id: AssignmentId::generate(),
            test_id,
            user_id,
            variant,
            assigned_at: Utc::now(),
        }
    }

    /// Override the assignment timestamp
    pub fn with_assigned_at(mut self, assigned_at: DateTime<Utc>) -> Self {
        self.assigned_at = assigned_at;
        self
    }

    /// Get the assignment ID
    pub fn id(&self) -> &AssignmentId {
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

    /// Get the assigned variant
    pub fn variant(&self) -> &VariantValue {
        &self.variant
    }

    /// Get the assignment timestamp
    pub fn assigned_at(&self) -> DateTime<Utc> {
        self.assigned_at
    }
}

// ============================================================================
// TestAssignment
// ============================================================================

/// Whether an assignment was persisted and counts toward results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tracking {
    /// Persisted; the user participates in the test
    Tracked,
    /// Fallback only; excluded from results
    Untracked,
}

/// The outcome handed to callers running a test
///
/// Untracked outcomes carry a usable variant so rendering never blocks, but
/// conversions recorded against them are discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestAssignment {
    assignment: UserAssignment,
    tracking: Tracking,
}

impl TestAssignment {
    /// Wrap a persisted assignment
    pub fn tracked(assignment: UserAssignment) -> Self {
        Self {
            assignment,
            tracking: Tracking::Tracked,
        }
    }

    /// Wrap a fallback assignment that was never persisted
    pub fn untracked(assignment: UserAssignment) -> Self {
        Self {
            assignment,
            tracking: Tracking::Untracked,
        }
    }

    /// Get the underlying assignment
    pub fn assignment(&self) -> &UserAssignment {
        &self.assignment
    }

    /// Get the variant the caller should render
    pub fn variant(&self) -> &VariantValue {
        self.assignment.variant()
    }

    /// Check whether this outcome counts toward results
    pub fn is_tracked(&self) -> bool {
        self.tracking == Tracking::Tracked
    }
}
