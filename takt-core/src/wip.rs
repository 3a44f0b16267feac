//! WIP limit evaluation
//!
//! Pure functions over already-fetched counts and limit configuration.
//! Classification semantics:
//!
//! - neither limit configured -> `Unknown`
//! - `current >= hard` (when configured) -> `Red`
//! - `current >= soft` (when configured) -> `Yellow`
//! - otherwise -> `Green`
//!
//! A configured limit of zero means no work is permitted on the target:
//! any count classifies `Red` / invalid. Fetching counts and deciding which
//! limit dimension applies to a move is the caller's concern; one
//! [`validate_wip_move`] call checks exactly one dimension.

use crate::{EntityId, TaktResult, ValidationError, WipHealth, WipViolationType};
use serde::{Deserialize, Serialize};

/// Classify a column's health from its current WIP and configured limits.
///
/// Callers supply counts read from storage, which are never negative.
pub fn evaluate_column_health(
    current_wip: i32,
    soft_limit: Option<i32>,
    hard_limit: Option<i32>,
) -> WipHealth {
    match (soft_limit, hard_limit) {
        (None, None) => WipHealth::Unknown,
        _ => {
            if let Some(hard) = hard_limit {
                if current_wip >= hard {
                    return WipHealth::Red;
                }
            }
            if let Some(soft) = soft_limit {
                if current_wip >= soft {
                    return WipHealth::Yellow;
                }
            }
            WipHealth::Green
        }
    }
}

/// Percentage of a limit consumed, rounded to the nearest integer.
/// `None` when the limit is absent or non-positive (a zero limit has no
/// meaningful percentage).
pub fn percent_of_limit(current_wip: i32, limit: Option<i32>) -> Option<i32> {
    let limit = limit?;
    if limit <= 0 {
        return None;
    }
    Some(((current_wip as f64 / limit as f64) * 100.0).round() as i32)
}

/// Validation verdict for a prospective move against one WIP dimension.
///
/// Ephemeral: produced fresh on every evaluation, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WipValidationResult {
    pub valid: bool,
    pub violation: WipViolationType,
    /// The column, sprint, or user the verdict refers to.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub target_id: Option<EntityId>,
    pub target_name: Option<String>,
    pub current_wip: i32,
    pub limit: Option<i32>,
    /// Contextual remediation hints. Starts empty; callers append.
    pub suggestions: Vec<String>,
    pub message: String,
}

impl WipValidationResult {
    /// Verdict for a permitted move.
    pub fn valid() -> Self {
        Self {
            valid: true,
            violation: WipViolationType::None,
            target_id: None,
            target_name: None,
            current_wip: 0,
            limit: None,
            suggestions: Vec::new(),
            message: "WIP move allowed".to_string(),
        }
    }

    /// Verdict for a rejected move. The message names the violated limit
    /// and the current/limit values.
    pub fn invalid(
        violation: WipViolationType,
        target_id: EntityId,
        target_name: impl Into<String>,
        current_wip: i32,
        limit: i32,
    ) -> Self {
        let target_name = target_name.into();
        let message = format!(
            "WIP {} reached for '{}': {} of {} in progress",
            violation.describe(),
            target_name,
            current_wip,
            limit,
        );
        Self {
            valid: false,
            violation,
            target_id: Some(target_id),
            target_name: Some(target_name),
            current_wip,
            limit: Some(limit),
            suggestions: Vec::new(),
            message,
        }
    }

    /// Append a remediation suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

/// Validate a prospective move against a single configured limit.
///
/// Returns a valid verdict when `current_wip < limit`, an invalid one
/// otherwise. Negative counts or limits are malformed input.
pub fn validate_wip_move(
    current_wip: i32,
    limit: i32,
    violation: WipViolationType,
    target_id: EntityId,
    target_name: &str,
) -> TaktResult<WipValidationResult> {
    if current_wip < 0 {
        return Err(ValidationError::NegativeValue {
            field: "current_wip",
            value: current_wip,
        }
        .into());
    }
    if limit < 0 {
        return Err(ValidationError::NegativeValue {
            field: "limit",
            value: limit,
        }
        .into());
    }
    if current_wip < limit {
        Ok(WipValidationResult::valid())
    } else {
        Ok(WipValidationResult::invalid(
            violation,
            target_id,
            target_name,
            current_wip,
            limit,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    #[test]
    fn test_health_boundaries_with_both_limits() {
        let cases = [
            (4, WipHealth::Green),
            (5, WipHealth::Yellow),
            (9, WipHealth::Yellow),
            (10, WipHealth::Red),
            (11, WipHealth::Red),
        ];
        for (wip, expected) in cases {
            assert_eq!(
                evaluate_column_health(wip, Some(5), Some(10)),
                expected,
                "wip={}",
                wip
            );
        }
    }

    #[test]
    fn test_health_unknown_without_limits() {
        for wip in [0, 1, 100] {
            assert_eq!(evaluate_column_health(wip, None, None), WipHealth::Unknown);
        }
    }

    #[test]
    fn test_health_with_only_hard_limit() {
        assert_eq!(evaluate_column_health(3, None, Some(4)), WipHealth::Green);
        assert_eq!(evaluate_column_health(4, None, Some(4)), WipHealth::Red);
    }

    #[test]
    fn test_health_with_only_soft_limit() {
        assert_eq!(evaluate_column_health(2, Some(3), None), WipHealth::Green);
        assert_eq!(evaluate_column_health(3, Some(3), None), WipHealth::Yellow);
    }

    #[test]
    fn test_zero_hard_limit_blocks_all_work() {
        assert_eq!(evaluate_column_health(0, None, Some(0)), WipHealth::Red);
        assert_eq!(evaluate_column_health(5, Some(2), Some(0)), WipHealth::Red);
    }

    #[test]
    fn test_percent_of_limit_rounds() {
        assert_eq!(percent_of_limit(1, Some(3)), Some(33));
        assert_eq!(percent_of_limit(2, Some(3)), Some(67));
        assert_eq!(percent_of_limit(5, Some(5)), Some(100));
        assert_eq!(percent_of_limit(11, Some(10)), Some(110));
        assert_eq!(percent_of_limit(4, None), None);
        assert_eq!(percent_of_limit(4, Some(0)), None);
    }

    #[test]
    fn test_validate_under_limit() {
        let result =
            validate_wip_move(3, 5, WipViolationType::ColumnHardLimit, Uuid::nil(), "Doing")
                .unwrap();
        assert!(result.valid);
        assert_eq!(result.violation, WipViolationType::None);
        assert!(result.suggestions.is_empty());
    }

    #[test]
    fn test_validate_at_limit_is_invalid() {
        let result =
            validate_wip_move(5, 5, WipViolationType::ColumnHardLimit, Uuid::nil(), "Doing")
                .unwrap();
        assert!(!result.valid);
        assert_eq!(result.violation, WipViolationType::ColumnHardLimit);
        assert_eq!(result.current_wip, 5);
        assert_eq!(result.limit, Some(5));
        assert!(result.message.contains("column hard limit"));
        assert!(result.message.contains("5 of 5"));
    }

    #[test]
    fn test_validate_zero_limit_rejects_everything() {
        let result = validate_wip_move(
            0,
            0,
            WipViolationType::SprintConwipLimit,
            Uuid::nil(),
            "Sprint 3",
        )
        .unwrap();
        assert!(!result.valid);
        assert_eq!(result.violation, WipViolationType::SprintConwipLimit);
    }

    #[test]
    fn test_validate_rejects_negative_inputs() {
        assert!(
            validate_wip_move(-1, 5, WipViolationType::ColumnSoftLimit, Uuid::nil(), "x").is_err()
        );
        assert!(
            validate_wip_move(1, -5, WipViolationType::ColumnSoftLimit, Uuid::nil(), "x").is_err()
        );
    }

    #[test]
    fn test_suggestions_append() {
        let result = WipValidationResult::invalid(
            WipViolationType::ColumnHardLimit,
            Uuid::nil(),
            "Review",
            7,
            7,
        )
        .with_suggestion("Move the task to a different column")
        .with_suggestion("Complete an in-progress task first");
        assert_eq!(result.suggestions.len(), 2);
    }

    proptest! {
        /// Health never improves as WIP rises with fixed limits.
        #[test]
        fn prop_health_is_monotone_in_wip(
            wip in 0i32..200,
            soft in proptest::option::of(0i32..50),
            hard in proptest::option::of(0i32..50),
        ) {
            fn rank(h: WipHealth) -> i32 {
                match h {
                    WipHealth::Green => 0,
                    WipHealth::Yellow => 1,
                    WipHealth::Red => 2,
                    WipHealth::Unknown => 0,
                }
            }
            let here = evaluate_column_health(wip, soft, hard);
            let next = evaluate_column_health(wip + 1, soft, hard);
            prop_assert!(rank(next) >= rank(here));
        }

        /// Unknown exactly when no limit is configured.
        #[test]
        fn prop_unknown_iff_unconfigured(
            wip in 0i32..200,
            soft in proptest::option::of(0i32..50),
            hard in proptest::option::of(0i32..50),
        ) {
            let health = evaluate_column_health(wip, soft, hard);
            prop_assert_eq!(
                health == WipHealth::Unknown,
                soft.is_none() && hard.is_none()
            );
        }

        /// The verdict agrees with a plain threshold comparison.
        #[test]
        fn prop_verdict_matches_threshold(wip in 0i32..100, limit in 0i32..100) {
            let result = validate_wip_move(
                wip,
                limit,
                WipViolationType::ColumnHardLimit,
                Uuid::nil(),
                "col",
            ).unwrap();
            prop_assert_eq!(result.valid, wip < limit);
        }
    }
}
