//! Deterministic weighted bucketing of users into variants

use crate::domain::experiment::{TestId, UserId, VariantValue};
use crate::domain::DomainError;

use super::hashing::stable_hash_32;

/// Assigns users to variants by hashing the `(test, user)` pair onto the
/// unit interval and walking the cumulative weight distribution
///
/// No state and no randomness: the same pair always lands on the same
/// variant, on any instance, with no storage lookup.
#[derive(Debug, Clone, Copy)]
pub struct VariantBucketer;

impl VariantBucketer {
    /// Map a `(test, user)` pair to a position in `[0, 1]`
    ///
    /// The test ID leads the hashed key so the same user gets independent
    /// positions across different tests.
    pub fn position(test_id: &TestId, user_id: &UserId) -> f64 {
        let hash = stable_hash_32(&format!("{}{}", test_id, user_id));
        f64::from(hash) / f64::from(u32::MAX)
    }

    /// Pick the variant for a `(test, user)` pair
    ///
    /// Walks variants in declaration order, accumulating weights, and
    /// returns the first variant whose cumulative weight reaches the pair's
    /// position.
    pub fn choose<'a>(
        test_id: &TestId,
        user_id: &UserId,
        variants: &'a [VariantValue],
        weights: &[f64],
    ) -> Result<&'a VariantValue, DomainError> {
        let Some(last_variant) = variants.last() else {
            return Err(DomainError::configuration(
                "Cannot bucket into an empty variant list",
            ));
        };

        if weights.len() != variants.len() {
            return Err(DomainError::configuration(format!(
                "Weights length {} does not match variants length {}",
                weights.len(),
                variants.len()
            )));
        }

        let position = Self::position(test_id, user_id);
        let mut cumulative = 0.0;

        for (variant, weight) in variants.iter().zip(weights) {
            cumulative += weight;
            if position <= cumulative {
                return Ok(variant);
            }
        }

        // Accumulated weights can fall just short of 1.0; the tail of the
        // unit interval belongs to the last variant.
        Ok(last_variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::experiment::TestId;

    fn test_id(id: &str) -> TestId {
        TestId::new(id).unwrap()
    }

    fn abc_variants() -> Vec<VariantValue> {
        vec![
            VariantValue::from("A"),
            VariantValue::from("B"),
            VariantValue::from("C"),
        ]
    }

    #[test]
    fn test_position_is_in_unit_interval() {
        let id = test_id("cta");

        for i in 0..1000 {
            let user = UserId::new(format!("user-{}", i));
            let position = VariantBucketer::position(&id, &user);
            assert!((0.0..=1.0).contains(&position));
        }
    }

    #[test]
    fn test_choice_is_deterministic() {
        let id = test_id("cta");
        let user = UserId::new("user-42");
        let variants = abc_variants();
        let weights = [0.3, 0.3, 0.4];

        let first = VariantBucketer::choose(&id, &user, &variants, &weights).unwrap();

        for _ in 0..100 {
            let choice = VariantBucketer::choose(&id, &user, &variants, &weights).unwrap();
            assert_eq!(choice, first);
        }
    }

    #[test]
    fn test_choice_is_a_declared_variant() {
        let id = test_id("cta");
        let variants = abc_variants();
        let weights = [0.2, 0.5, 0.3];

        for i in 0..1000 {
            let user = UserId::new(format!("user-{}", i));
            let choice = VariantBucketer::choose(&id, &user, &variants, &weights).unwrap();
            assert!(variants.contains(choice));
        }
    }

    #[test]
    fn test_even_split_is_roughly_even() {
        let id = test_id("cta");
        let variants = vec![VariantValue::from("A"), VariantValue::from("B")];
        let weights = [0.5, 0.5];
        let total = 100_000;
        let mut a_count = 0;

        for i in 0..total {
            let user = UserId::new(format!("user-{}", i));
            let choice = VariantBucketer::choose(&id, &user, &variants, &weights).unwrap();
            if choice == &variants[0] {
                a_count += 1;
            }
        }

        let share = a_count as f64 / total as f64;
        assert!(
            (0.48..0.52).contains(&share),
            "A share {} outside tolerance",
            share
        );
    }

    #[test]
    fn test_skewed_split_follows_weights() {
        let id = test_id("pricing");
        let variants = vec![VariantValue::from("A"), VariantValue::from("B")];
        let weights = [0.8, 0.2];
        let total = 100_000;
        let mut a_count = 0;

        for i in 0..total {
            let user = UserId::new(format!("user-{}", i));
            let choice = VariantBucketer::choose(&id, &user, &variants, &weights).unwrap();
            if choice == &variants[0] {
                a_count += 1;
            }
        }

        let share = a_count as f64 / total as f64;
        assert!(
            (0.78..0.82).contains(&share),
            "A share {} outside tolerance",
            share
        );
    }

    #[test]
    fn test_zero_weight_variant_is_unreachable() {
        let id = test_id("cta");
        let variants = vec![VariantValue::from("A"), VariantValue::from("B")];
        let weights = [1.0, 0.0];

        for i in 0..1000 {
            let user = UserId::new(format!("user-{}", i));
            let choice = VariantBucketer::choose(&id, &user, &variants, &weights).unwrap();
            assert_eq!(choice, &variants[0]);
        }
    }

    #[test]
    fn test_short_weights_fall_back_to_last_variant() {
        // A single variant with zero weight forces the fallback for any
        // position above 0.
        let id = test_id("cta");
        let variants = vec![VariantValue::from("only")];
        let weights = [0.0];

        for i in 0..100 {
            let user = UserId::new(format!("user-{}", i));
            let choice = VariantBucketer::choose(&id, &user, &variants, &weights).unwrap();
            assert_eq!(choice, &variants[0]);
        }
    }

    #[test]
    fn test_empty_variants_is_a_configuration_error() {
        let result = VariantBucketer::choose(
            &test_id("cta"),
            &UserId::new("user-1"),
            &[],
            &[],
        );

        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_length_mismatch_is_a_configuration_error() {
        let variants = abc_variants();
        let result = VariantBucketer::choose(
            &test_id("cta"),
            &UserId::new("user-1"),
            &variants,
            &[0.5, 0.5],
        );

        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_tests_bucket_independently() {
        let first = test_id("cta-color");
        let second = test_id("pricing-page");
        let variants = vec![VariantValue::from("A"), VariantValue::from("B")];
        let weights = [0.5, 0.5];
        let mut differing = 0;

        for i in 0..200 {
            let user = UserId::new(format!("user-{}", i));
            let in_first = VariantBucketer::choose(&first, &user, &variants, &weights).unwrap();
            let in_second = VariantBucketer::choose(&second, &user, &variants, &weights).unwrap();
            if in_first != in_second {
                differing += 1;
            }
        }

        assert!(differing > 0, "tests should not mirror each other's buckets");
    }
}
