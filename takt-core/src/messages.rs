//! Status snapshots and outbound notification payloads
//!
//! These types cross the boundary to external collaborators: status
//! responses are served to clients, notification requests go to the
//! out-of-band delivery service, and [`WipUpdateMessage`] is the envelope
//! pushed to real-time subscribers of a per-project channel
//! (`/topic/wip/{project_id}` in the transport's convention). The core only
//! constructs payloads; delivery semantics belong to the transport.

use crate::{
    percent_of_limit, ColumnId, EntityId, ProjectId, SprintId, SprintWipHealth, TaktResult,
    Timestamp, UserId, ValidationError, WipHealth, WipNotificationType, WipUpdateType,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// WIP status of a single kanban column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ColumnWipStatusResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub column_id: ColumnId,
    pub column_name: String,
    pub current_wip: i32,
    pub soft_limit: Option<i32>,
    pub hard_limit: Option<i32>,
    pub health: WipHealth,
    /// Percentage of the soft limit consumed, when configured.
    pub soft_limit_percent: Option<i32>,
    /// Percentage of the hard limit consumed, when configured.
    pub hard_limit_percent: Option<i32>,
}

impl ColumnWipStatusResponse {
    /// Build a column status from a count and the column's limit
    /// configuration, deriving health and percentage fields.
    pub fn evaluate(
        column_id: ColumnId,
        column_name: impl Into<String>,
        current_wip: i32,
        soft_limit: Option<i32>,
        hard_limit: Option<i32>,
    ) -> Self {
        Self {
            column_id,
            column_name: column_name.into(),
            current_wip,
            soft_limit,
            hard_limit,
            health: crate::evaluate_column_health(current_wip, soft_limit, hard_limit),
            soft_limit_percent: percent_of_limit(current_wip, soft_limit),
            hard_limit_percent: percent_of_limit(current_wip, hard_limit),
        }
    }
}

/// CONWIP status of a single sprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SprintWipStatusResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub sprint_id: SprintId,
    pub sprint_name: Option<String>,
    pub current_wip: i32,
    pub conwip_limit: Option<i32>,
    pub validation_enabled: bool,
    pub health: SprintWipHealth,
    pub conwip_percent: Option<i32>,
}

impl SprintWipStatusResponse {
    /// Build a sprint status from a count and the sprint's CONWIP
    /// configuration.
    pub fn evaluate(
        sprint_id: SprintId,
        sprint_name: impl Into<String>,
        current_wip: i32,
        conwip_limit: Option<i32>,
        validation_enabled: bool,
    ) -> Self {
        // CONWIP is a single hard cap; soft has no sprint analogue.
        let health = crate::evaluate_column_health(current_wip, None, conwip_limit);
        Self {
            sprint_id,
            sprint_name: Some(sprint_name.into()),
            current_wip,
            conwip_limit,
            validation_enabled,
            health: health.into(),
            conwip_percent: percent_of_limit(current_wip, conwip_limit),
        }
    }

    /// Snapshot for a sprint id that did not resolve. Returned instead of
    /// raising so that pollers keep working across deletions.
    pub fn not_found(sprint_id: SprintId) -> Self {
        Self {
            sprint_id,
            sprint_name: None,
            current_wip: 0,
            conwip_limit: None,
            validation_enabled: false,
            health: SprintWipHealth::Error,
            conwip_percent: None,
        }
    }
}

/// Project-wide WIP snapshot: all column statuses plus rollups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProjectWipStatusResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub project_id: ProjectId,
    /// Sum of current WIP across all columns.
    pub total_wip: i32,
    /// Ordered by column display position.
    pub column_statuses: Vec<ColumnWipStatusResponse>,
    /// Count of columns classified Red.
    pub bottleneck_count: i32,
}

impl ProjectWipStatusResponse {
    /// Roll up per-column statuses into a project snapshot. `columns` must
    /// already be in display order.
    pub fn roll_up(project_id: ProjectId, column_statuses: Vec<ColumnWipStatusResponse>) -> Self {
        let total_wip = column_statuses.iter().map(|c| c.current_wip).sum();
        let bottleneck_count = column_statuses
            .iter()
            .filter(|c| c.health.is_bottleneck())
            .count() as i32;
        Self {
            project_id,
            total_wip,
            column_statuses,
            bottleneck_count,
        }
    }
}

/// Out-of-band notification about a WIP limit event.
///
/// Numeric fields accept zero: a limit of 0 (no work permitted) and a WIP
/// count of 0 are both meaningful values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WipNotificationRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub project_id: ProjectId,
    /// The column or sprint the event refers to.
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub target_id: EntityId,
    pub target_name: String,
    pub current_wip: i32,
    pub wip_limit: i32,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub recipient_id: UserId,
    pub notification_type: WipNotificationType,
}

impl WipNotificationRequest {
    /// Check the payload before dispatch: non-blank names, non-negative
    /// counts and limits.
    pub fn validate(&self) -> TaktResult<()> {
        ensure_not_blank("target_name", &self.target_name)?;
        ensure_non_negative("current_wip", self.current_wip)?;
        ensure_non_negative("wip_limit", self.wip_limit)?;
        Ok(())
    }
}

/// Out-of-band notification that a user exceeded their personal WIP limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PersonalWipNotificationRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub project_id: ProjectId,
    pub current_wip: i32,
    pub max_wip: i32,
}

impl PersonalWipNotificationRequest {
    pub fn validate(&self) -> TaktResult<()> {
        ensure_non_negative("current_wip", self.current_wip)?;
        ensure_non_negative("max_wip", self.max_wip)?;
        Ok(())
    }
}

/// Alert sent to the project manager when a column becomes a bottleneck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BottleneckAlertRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub project_id: ProjectId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub column_id: ColumnId,
    pub column_name: String,
    /// Tasks stuck in the bottleneck column.
    pub blocking_tasks: i32,
    /// Downstream tasks waiting on the bottleneck.
    pub affected_tasks: i32,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub project_manager_id: UserId,
}

impl BottleneckAlertRequest {
    pub fn validate(&self) -> TaktResult<()> {
        ensure_not_blank("column_name", &self.column_name)?;
        ensure_non_negative("blocking_tasks", self.blocking_tasks)?;
        ensure_non_negative("affected_tasks", self.affected_tasks)?;
        Ok(())
    }
}

/// Envelope for a real-time update pushed to subscribers of a project's
/// WIP channel. The `data` shape varies with `update_type`; the timestamp
/// is stamped server-side at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WipUpdateMessage {
    pub update_type: WipUpdateType,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub project_id: ProjectId,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub data: serde_json::Value,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub timestamp: Timestamp,
}

impl WipUpdateMessage {
    pub fn new(update_type: WipUpdateType, project_id: ProjectId, data: serde_json::Value) -> Self {
        Self {
            update_type,
            project_id,
            data,
            timestamp: Utc::now(),
        }
    }
}

fn ensure_not_blank(field: &'static str, value: &str) -> TaktResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField { field }.into());
    }
    Ok(())
}

fn ensure_non_negative(field: &'static str, value: i32) -> TaktResult<()> {
    if value < 0 {
        return Err(ValidationError::NegativeValue { field, value }.into());
    }
    Ok(())
}
