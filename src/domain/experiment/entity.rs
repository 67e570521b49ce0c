//! Experiment domain entities

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::validation::{validate_test_config, validate_test_id, ConfigValidationError};

/// Arbitrary key/value metadata attached to tests and conversion events
pub type Metadata = HashMap<String, serde_json::Value>;

// ============================================================================
// TestId
// ============================================================================

/// Unique identifier for an A/B test
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TestId(String);

impl TestId {
    /// Create a new test ID with validation
    pub fn new(id: impl Into<String>) -> Result<Self, ConfigValidationError> {
        let id = id.into();
        validate_test_id(&id)?;
        Ok(Self(id))
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TestId {
    type Error = ConfigValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TestId> for String {
    fn from(id: TestId) -> Self {
        id.0
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// UserId
// ============================================================================

/// Opaque identifier for a user participating in tests
///
/// Identity resolution (cookies, account IDs, device fingerprints) happens
/// outside the engine; any non-empty convention the caller picks works, as
/// long as the same user always presents the same ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create a new user ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// VariantValue
// ============================================================================

/// The payload a bucketed user receives
///
/// Variants compare structurally: two values are equal only when they hold
/// the same case with equal contents, so `Integer(5)` and `Number(5.0)` are
/// distinct variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariantValue {
    /// Boolean toggle, e.g. feature on/off
    Flag(bool),
    /// Integral value, e.g. item counts or thresholds
    Integer(i64),
    /// Floating-point value, e.g. prices or ratios
    Number(f64),
    /// Text value, e.g. button labels or color names
    Text(String),
    /// Arbitrary structured payload
    Structured(serde_json::Value),
}

impl From<bool> for VariantValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<i64> for VariantValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for VariantValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for VariantValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for VariantValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<serde_json::Value> for VariantValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Structured(value)
    }
}

impl fmt::Display for VariantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(v) => write!(f, "{}", v),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Number(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{}", v),
            Self::Structured(v) => write!(f, "{}", v),
        }
    }
}

// ============================================================================
// TestConfig
// ============================================================================

/// Configuration for an A/B test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestConfig {
    test_id: TestId,
    variants: Vec<VariantValue>,
    weights: Vec<f64>,
    active: bool,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    metadata: Metadata,
}

impl TestConfig {
    /// Create a new active test configuration with equal variant weights
    pub fn new(test_id: TestId, variants: Vec<VariantValue>) -> Self {
        let weights = Self::equal_weights(variants.len());
        Self {
            test_id,
            variants,
            weights,
            active: true,
            metadata: Metadata::new(),
        }
    }

    /// Build the uniform weight distribution for `count` variants
    pub fn equal_weights(count: usize) -> Vec<f64> {
        if count == 0 {
            return Vec::new();
        }
        vec![1.0 / count as f64; count]
    }

    /// Set explicit variant weights
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = weights;
        self
    }

    /// Set whether the test accepts new assignments
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Attach metadata
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Get the test ID
    pub fn test_id(&self) -> &TestId {
        &self.test_id
    }

    /// Get the declared variants, in declaration order
    pub fn variants(&self) -> &[VariantValue] {
        &self.variants
    }

    /// Get the variant weights, parallel to `variants()`
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Check whether the test accepts new assignments
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Get the attached metadata
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Stop the test from handing out new assignments
    ///
    /// Assignments already recorded stay valid; only future resolution is
    /// affected.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Validate variant and weight shape
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        validate_test_config(&self.variants, &self.weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod test_id_tests {
        use super::*;

        #[test]
        fn test_create_valid_id() {
            let id = TestId::new("cta-color").unwrap();
            assert_eq!(id.as_str(), "cta-color");
            assert_eq!(id.to_string(), "cta-color");
        }

        #[test]
        fn test_reject_empty_id() {
            assert!(TestId::new("").is_err());
        }

        #[test]
        fn test_serde_round_trip() {
            let id = TestId::new("pricing-v2").unwrap();
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, "\"pricing-v2\"");

            let back: TestId = serde_json::from_str(&json).unwrap();
            assert_eq!(back, id);
        }

        #[test]
        fn test_deserialize_rejects_empty() {
            let result: Result<TestId, _> = serde_json::from_str("\"\"");
            assert!(result.is_err());
        }
    }

    mod user_id_tests {
        use super::*;

        #[test]
        fn test_create_user_id() {
            let id = UserId::new("user-42");
            assert_eq!(id.as_str(), "user-42");
        }

        #[test]
        fn test_from_conversions() {
            assert_eq!(UserId::from("u1"), UserId::new("u1"));
            assert_eq!(UserId::from("u1".to_string()), UserId::new("u1"));
        }
    }

    mod variant_value_tests {
        use super::*;

        #[test]
        fn test_from_conversions() {
            assert_eq!(VariantValue::from(true), VariantValue::Flag(true));
            assert_eq!(VariantValue::from(5i64), VariantValue::Integer(5));
            assert_eq!(VariantValue::from(0.5), VariantValue::Number(0.5));
            assert_eq!(
                VariantValue::from("red"),
                VariantValue::Text("red".to_string())
            );
        }

        #[test]
        fn test_equality_is_case_sensitive() {
            assert_ne!(VariantValue::Integer(5), VariantValue::Number(5.0));
            assert_ne!(
                VariantValue::Text("true".to_string()),
                VariantValue::Flag(true)
            );
        }

        #[test]
        fn test_serialize_untagged() {
            assert_eq!(
                serde_json::to_value(VariantValue::from("red")).unwrap(),
                json!("red")
            );
            assert_eq!(
                serde_json::to_value(VariantValue::from(true)).unwrap(),
                json!(true)
            );
            assert_eq!(
                serde_json::to_value(VariantValue::from(3i64)).unwrap(),
                json!(3)
            );
        }

        #[test]
        fn test_deserialize_untagged() {
            let value: VariantValue = serde_json::from_value(json!("blue")).unwrap();
            assert_eq!(value, VariantValue::Text("blue".to_string()));

            let value: VariantValue = serde_json::from_value(json!(7)).unwrap();
            assert_eq!(value, VariantValue::Integer(7));

            let value: VariantValue = serde_json::from_value(json!({"cta": "Buy now"})).unwrap();
            assert_eq!(value, VariantValue::Structured(json!({"cta": "Buy now"})));
        }

        #[test]
        fn test_display() {
            assert_eq!(VariantValue::from("red").to_string(), "red");
            assert_eq!(VariantValue::from(true).to_string(), "true");
            assert_eq!(VariantValue::from(42i64).to_string(), "42");
        }
    }

    mod test_config_tests {
        use super::*;

        fn ab_variants() -> Vec<VariantValue> {
            vec![VariantValue::from("A"), VariantValue::from("B")]
        }

        #[test]
        fn test_new_defaults_to_equal_weights() {
            let config = TestConfig::new(TestId::new("cta").unwrap(), ab_variants());

            assert_eq!(config.weights(), &[0.5, 0.5]);
            assert!(config.is_active());
            assert!(config.metadata().is_empty());
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_equal_weights_counts() {
            assert!(TestConfig::equal_weights(0).is_empty());
            assert_eq!(TestConfig::equal_weights(2), vec![0.5, 0.5]);

            let four = TestConfig::equal_weights(4);
            assert_eq!(four, vec![0.25, 0.25, 0.25, 0.25]);
        }

        #[test]
        fn test_builder_methods() {
            let mut metadata = Metadata::new();
            metadata.insert("owner".to_string(), json!("growth-team"));

            let config = TestConfig::new(TestId::new("pricing").unwrap(), ab_variants())
                .with_weights(vec![0.8, 0.2])
                .with_active(false)
                .with_metadata(metadata);

            assert_eq!(config.weights(), &[0.8, 0.2]);
            assert!(!config.is_active());
            assert_eq!(config.metadata().get("owner"), Some(&json!("growth-team")));
        }

        #[test]
        fn test_deactivate() {
            let mut config = TestConfig::new(TestId::new("cta").unwrap(), ab_variants());
            assert!(config.is_active());

            config.deactivate();
            assert!(!config.is_active());
        }

        #[test]
        fn test_validate_detects_bad_weights() {
            let config = TestConfig::new(TestId::new("cta").unwrap(), ab_variants())
                .with_weights(vec![0.3, 0.3]);

            assert!(config.validate().is_err());
        }

        #[test]
        fn test_serde_round_trip() {
            let config = TestConfig::new(TestId::new("cta").unwrap(), ab_variants())
                .with_weights(vec![0.7, 0.3]);

            let json = serde_json::to_string(&config).unwrap();
            let back: TestConfig = serde_json::from_str(&json).unwrap();

            assert_eq!(back, config);
        }
    }
}
