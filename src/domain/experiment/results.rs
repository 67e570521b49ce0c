//! Result types and aggregation for completed or running tests

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::assignment::UserAssignment;
use super::conversion::ConversionEvent;
use super::entity::{TestConfig, VariantValue};

/// Milliseconds in a day, used to round test spans up to whole days
const MILLIS_PER_DAY: i64 = 86_400_000;

// ============================================================================
// VariantResults
// ============================================================================

/// Aggregated metrics for a single variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantResults {
    /// The variant these metrics describe
    pub variant: VariantValue,
    /// Number of users assigned to this variant
    pub total_users: u64,
    /// Number of conversion events attributed to this variant
    pub total_conversions: u64,
    /// Conversions per assigned user, 0.0 when no users are assigned
    pub conversion_rate: f64,
    /// Conversion counts broken down by event name
    pub events: HashMap<String, u64>,
}

impl VariantResults {
    /// Create an empty result row for a variant
    pub fn new(variant: VariantValue) -> Self {
        Self {
            variant,
            total_users: 0,
            total_conversions: 0,
            conversion_rate: 0.0,
            events: HashMap::new(),
        }
    }

    fn add_user(&mut self) {
        self.total_users += 1;
    }

    fn add_conversion(&mut self, event: &str) {
        self.total_conversions += 1;
        *self.events.entry(event.to_string()).or_insert(0) += 1;
    }

    fn update_rate(&mut self) {
        if self.total_users > 0 {
            self.conversion_rate = self.total_conversions as f64 / self.total_users as f64;
        }
    }
}

// ============================================================================
// TestStats
// ============================================================================

/// Test-level statistics derived from the variant rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestStats {
    /// Whole days covered from first assignment to last conversion
    pub duration_days: i64,
    /// Variant with the strictly highest positive conversion rate, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<VariantValue>,
    /// Statistical significance marker; always `false` until a real
    /// significance test is wired in
    pub is_significant: bool,
}

// ============================================================================
// TestResults
// ============================================================================

/// Full aggregation output for a test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResults {
    /// The configuration the results were computed against
    pub config: TestConfig,
    /// One result row per declared variant, in declaration order
    pub variants: Vec<VariantResults>,
    /// Test-level statistics
    pub stats: TestStats,
}

impl TestResults {
    /// Look up the result row for a variant
    pub fn variant_results(&self, variant: &VariantValue) -> Option<&VariantResults> {
        self.variants.iter().find(|row| &row.variant == variant)
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// Aggregate assignments and conversions into test results
///
/// Pure over its inputs: the same configuration, assignments and conversions
/// always produce the same results. Records referencing variants the
/// configuration does not declare are ignored.
pub fn aggregate_results(
    config: &TestConfig,
    assignments: &[UserAssignment],
    conversions: &[ConversionEvent],
) -> TestResults {
    let mut variants: Vec<VariantResults> = config
        .variants()
        .iter()
        .cloned()
        .map(VariantResults::new)
        .collect();

    for row in &mut variants {
        for assignment in assignments {
            if assignment.variant() == &row.variant {
                row.add_user();
            }
        }

        for conversion in conversions {
            if conversion.variant() == &row.variant {
                row.add_conversion(conversion.event());
            }
        }

        row.update_rate();
    }

    let stats = TestStats {
        duration_days: duration_days(assignments, conversions),
        winner: pick_winner(&variants),
        is_significant: false,
    };

    TestResults {
        config: config.clone(),
        variants,
        stats,
    }
}

/// Whole days from the earliest assignment to the latest conversion
///
/// Spans shorter than a day round up to 1; tests with no assignments or no
/// conversions report 0.
fn duration_days(assignments: &[UserAssignment], conversions: &[ConversionEvent]) -> i64 {
    let start = assignments.iter().map(|a| a.assigned_at()).min();
    let end = conversions.iter().map(|c| c.converted_at()).max();

    match (start, end) {
        (Some(start), Some(end)) if end > start => {
            let span_ms = (end - start).num_milliseconds();
            (span_ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
        }
        _ => 0,
    }
}

/// Variant with the strictly highest conversion rate
///
/// Ties keep the earliest declared variant; a variant only wins with a rate
/// above zero.
fn pick_winner(variants: &[VariantResults]) -> Option<VariantValue> {
    let mut best: Option<&VariantResults> = None;

    for row in variants {
        match best {
            Some(current) if row.conversion_rate <= current.conversion_rate => {}
            _ => best = Some(row),
        }
    }

    best.filter(|row| row.conversion_rate > 0.0)
        .map(|row| row.variant.clone())
}
