//! Enum types for TAKT entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// BACKLOG ENUMS
// ============================================================================

/// Status of a backlog item in the sprint-planning pipeline.
///
/// Legal transitions form a small pipeline with a return path:
///
/// ```text
/// Backlog --select--> Selected --moveToSprint--> Sprint --complete--> Completed
/// Selected --moveBack--> Backlog
/// Sprint   --moveBack--> Backlog
/// ```
///
/// `Completed` is terminal; no operation leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BacklogItemStatus {
    /// In the product backlog, not yet considered for a sprint
    #[default]
    Backlog,
    /// Picked during sprint planning, not yet assigned to a sprint
    Selected,
    /// Assigned to a sprint and in flight
    Sprint,
    /// Done. Terminal state.
    Completed,
}

impl BacklogItemStatus {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            BacklogItemStatus::Backlog => "BACKLOG",
            BacklogItemStatus::Selected => "SELECTED",
            BacklogItemStatus::Sprint => "SPRINT",
            BacklogItemStatus::Completed => "COMPLETED",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, BacklogItemStatusParseError> {
        match s.to_uppercase().as_str() {
            "BACKLOG" => Ok(BacklogItemStatus::Backlog),
            "SELECTED" => Ok(BacklogItemStatus::Selected),
            "SPRINT" => Ok(BacklogItemStatus::Sprint),
            "COMPLETED" => Ok(BacklogItemStatus::Completed),
            _ => Err(BacklogItemStatusParseError(s.to_string())),
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BacklogItemStatus::Completed)
    }

    /// Deletion is only permitted before the item enters a sprint.
    pub fn can_be_deleted(&self) -> bool {
        matches!(self, BacklogItemStatus::Backlog | BacklogItemStatus::Selected)
    }

    /// The return path to the backlog exists from Selected and Sprint only.
    pub fn can_return_to_backlog(&self) -> bool {
        matches!(self, BacklogItemStatus::Selected | BacklogItemStatus::Sprint)
    }
}

impl fmt::Display for BacklogItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for BacklogItemStatus {
    type Err = BacklogItemStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid backlog item status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacklogItemStatusParseError(pub String);

impl fmt::Display for BacklogItemStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid backlog item status: {}", self.0)
    }
}

impl std::error::Error for BacklogItemStatusParseError {}

/// Where a backlog item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BacklogOrigin {
    /// Created ad hoc by a user; no story-point prerequisite
    Manual,
    /// Derived from a formal requirement; must carry story points
    /// before sprint selection
    Requirement,
}

impl BacklogOrigin {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            BacklogOrigin::Manual => "MANUAL",
            BacklogOrigin::Requirement => "REQUIREMENT",
        }
    }
}

impl fmt::Display for BacklogOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

// ============================================================================
// SPRINT ENUMS
// ============================================================================

/// Lifecycle status of a sprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SprintStatus {
    #[default]
    Planned,
    Active,
    Completed,
    Cancelled,
}

impl SprintStatus {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            SprintStatus::Planned => "PLANNED",
            SprintStatus::Active => "ACTIVE",
            SprintStatus::Completed => "COMPLETED",
            SprintStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, SprintStatusParseError> {
        match s.to_uppercase().as_str() {
            "PLANNED" => Ok(SprintStatus::Planned),
            "ACTIVE" => Ok(SprintStatus::Active),
            "COMPLETED" => Ok(SprintStatus::Completed),
            "CANCELLED" => Ok(SprintStatus::Cancelled),
            _ => Err(SprintStatusParseError(s.to_string())),
        }
    }

    /// Whether work can still flow through this sprint.
    pub fn is_open(&self) -> bool {
        matches!(self, SprintStatus::Planned | SprintStatus::Active)
    }
}

impl fmt::Display for SprintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for SprintStatus {
    type Err = SprintStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid sprint status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SprintStatusParseError(pub String);

impl fmt::Display for SprintStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid sprint status: {}", self.0)
    }
}

impl std::error::Error for SprintStatusParseError {}

// ============================================================================
// WIP ENUMS
// ============================================================================

/// Health classification of a WIP target against its configured limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WipHealth {
    /// Under the soft limit (or under the hard limit when only a hard
    /// limit is configured)
    Green,
    /// At or over the soft limit, under the hard limit
    Yellow,
    /// At or over the hard limit: a bottleneck
    Red,
    /// No limits configured for the target
    Unknown,
}

impl WipHealth {
    pub fn is_bottleneck(&self) -> bool {
        matches!(self, WipHealth::Red)
    }
}

impl fmt::Display for WipHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WipHealth::Green => "GREEN",
            WipHealth::Yellow => "YELLOW",
            WipHealth::Red => "RED",
            WipHealth::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

/// Health of a sprint's CONWIP target. Extends [`WipHealth`] with an
/// `Error` variant used by the sprint status snapshot when the sprint id
/// does not resolve (the snapshot is returned instead of raising).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SprintWipHealth {
    Green,
    Yellow,
    Red,
    Unknown,
    /// Sprint could not be resolved
    Error,
}

impl From<WipHealth> for SprintWipHealth {
    fn from(health: WipHealth) -> Self {
        match health {
            WipHealth::Green => SprintWipHealth::Green,
            WipHealth::Yellow => SprintWipHealth::Yellow,
            WipHealth::Red => SprintWipHealth::Red,
            WipHealth::Unknown => SprintWipHealth::Unknown,
        }
    }
}

impl fmt::Display for SprintWipHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SprintWipHealth::Green => "GREEN",
            SprintWipHealth::Yellow => "YELLOW",
            SprintWipHealth::Red => "RED",
            SprintWipHealth::Unknown => "UNKNOWN",
            SprintWipHealth::Error => "ERROR",
        };
        write!(f, "{}", s)
    }
}

/// The WIP dimension a validation verdict refers to. One evaluation call
/// checks exactly one dimension; callers decide which dimensions apply to
/// a given move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WipViolationType {
    /// No violation
    #[default]
    None,
    ColumnSoftLimit,
    ColumnHardLimit,
    SprintConwipLimit,
    PersonalWipLimit,
}

impl WipViolationType {
    /// Human-readable name used in verdict messages.
    pub fn describe(&self) -> &'static str {
        match self {
            WipViolationType::None => "no limit",
            WipViolationType::ColumnSoftLimit => "column soft limit",
            WipViolationType::ColumnHardLimit => "column hard limit",
            WipViolationType::SprintConwipLimit => "sprint CONWIP limit",
            WipViolationType::PersonalWipLimit => "personal WIP limit",
        }
    }
}

/// Type tag for an out-of-band WIP notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WipNotificationType {
    SoftLimitWarning,
    HardLimitViolation,
    ConwipViolation,
}

/// Type tag for a real-time update message pushed to project subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WipUpdateType {
    /// Full project snapshot sent on subscription
    InitialLoad,
    /// A single column's WIP status changed
    ColumnUpdate,
    /// A sprint's CONWIP status changed
    SprintUpdate,
    /// A move was rejected or warned against
    WipViolation,
    /// A column reached its hard limit
    BottleneckDetected,
    /// Server-side error surfaced to subscribers
    Error,
}

// ============================================================================
// ENTITY DISCRIMINATOR
// ============================================================================

/// Entity type discriminator for polymorphic references and not-found errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    Project,
    Backlog,
    BacklogItem,
    Sprint,
    Column,
    Requirement,
    Task,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backlog_status_db_roundtrip() {
        for status in [
            BacklogItemStatus::Backlog,
            BacklogItemStatus::Selected,
            BacklogItemStatus::Sprint,
            BacklogItemStatus::Completed,
        ] {
            let parsed = BacklogItemStatus::from_db_str(status.as_db_str()).unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_backlog_status_parse_is_case_insensitive() {
        assert_eq!(
            "backlog".parse::<BacklogItemStatus>().unwrap(),
            BacklogItemStatus::Backlog
        );
        assert!("SHIPPED".parse::<BacklogItemStatus>().is_err());
    }

    #[test]
    fn test_only_completed_is_terminal() {
        assert!(BacklogItemStatus::Completed.is_terminal());
        assert!(!BacklogItemStatus::Backlog.is_terminal());
        assert!(!BacklogItemStatus::Selected.is_terminal());
        assert!(!BacklogItemStatus::Sprint.is_terminal());
    }

    #[test]
    fn test_return_path_excludes_backlog_and_completed() {
        assert!(BacklogItemStatus::Selected.can_return_to_backlog());
        assert!(BacklogItemStatus::Sprint.can_return_to_backlog());
        assert!(!BacklogItemStatus::Backlog.can_return_to_backlog());
        assert!(!BacklogItemStatus::Completed.can_return_to_backlog());
    }

    #[test]
    fn test_sprint_status_db_roundtrip() {
        for status in [
            SprintStatus::Planned,
            SprintStatus::Active,
            SprintStatus::Completed,
            SprintStatus::Cancelled,
        ] {
            let parsed = SprintStatus::from_db_str(status.as_db_str()).unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_sprint_health_carries_error_variant() {
        assert_eq!(SprintWipHealth::from(WipHealth::Red), SprintWipHealth::Red);
        assert_eq!(SprintWipHealth::Error.to_string(), "ERROR");
    }

    #[test]
    fn test_wip_health_serde_uses_screaming_snake() {
        let json = serde_json::to_string(&WipHealth::Yellow).unwrap();
        assert_eq!(json, "\"YELLOW\"");
        let json = serde_json::to_string(&WipUpdateType::BottleneckDetected).unwrap();
        assert_eq!(json, "\"BOTTLENECK_DETECTED\"");
    }
}
