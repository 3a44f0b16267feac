//! Configuration types

use crate::{TaktResult, ValidationError};
use serde::{Deserialize, Serialize};

/// Project-level WIP policy. Columns without their own limits fall back to
/// these defaults; the personal dimension is checked only when enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WipPolicy {
    pub default_soft_limit: Option<i32>,
    pub default_hard_limit: Option<i32>,
    pub personal_wip_limit: Option<i32>,
    pub enforce_personal_limit: bool,
}

impl WipPolicy {
    /// Reject inconsistent limit configuration. The evaluator treats soft
    /// and hard limits independently; the soft <= hard invariant is
    /// enforced here, where limits are configured.
    pub fn validate(&self) -> TaktResult<()> {
        if let (Some(soft), Some(hard)) = (self.default_soft_limit, self.default_hard_limit) {
            if soft > hard {
                return Err(ValidationError::InvalidValue {
                    field: "default_soft_limit",
                    reason: format!("soft limit {} exceeds hard limit {}", soft, hard),
                }
                .into());
            }
        }
        for (field, value) in [
            ("default_soft_limit", self.default_soft_limit),
            ("default_hard_limit", self.default_hard_limit),
            ("personal_wip_limit", self.personal_wip_limit),
        ] {
            if let Some(v) = value {
                if v < 0 {
                    return Err(ValidationError::NegativeValue { field, value: v }.into());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        assert!(WipPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_soft_above_hard_is_rejected() {
        let policy = WipPolicy {
            default_soft_limit: Some(8),
            default_hard_limit: Some(5),
            ..WipPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_negative_personal_limit_is_rejected() {
        let policy = WipPolicy {
            personal_wip_limit: Some(-2),
            enforce_personal_limit: true,
            ..WipPolicy::default()
        };
        assert!(policy.validate().is_err());
    }
}
