//! TAKT WIP - Aggregation and Notification Composition
//!
//! Rolls per-column and per-sprint WIP evaluations into project-wide
//! snapshots, guards prospective moves against the configured limit
//! dimensions, and constructs the typed payloads handed to the external
//! delivery collaborators (real-time channel, out-of-band notifications).
//! Nothing here delivers anything; transports are external.

use std::sync::Arc;
use takt_core::{
    validate_wip_move, BottleneckAlertRequest, ColumnId, ColumnWipStatusResponse, EntityId,
    EntityType, KanbanColumn, PersonalWipNotificationRequest, ProjectId, ProjectWipStatusResponse,
    SprintId,
    SprintWipStatusResponse, StoreError, TaktError, TaktResult, UserId, WipNotificationRequest,
    WipNotificationType, WipPolicy, WipUpdateMessage, WipUpdateType, WipValidationResult,
    WipViolationType,
};
use takt_storage::PlanningStore;
use tracing::{debug, warn};

/// Suggestions attached to column-limit verdicts.
const SUGGEST_OTHER_COLUMN: &str = "Move the task to a different column";
const SUGGEST_COMPLETE_FIRST: &str = "Complete an in-progress task first";
const SUGGEST_FINISH_SPRINT_ITEM: &str = "Complete an item in the sprint before starting new work";

/// WIP monitoring and message composition over a [`PlanningStore`].
#[derive(Debug, Clone)]
pub struct WipMonitor<S> {
    store: Arc<S>,
    policy: WipPolicy,
}

impl<S: PlanningStore> WipMonitor<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            policy: WipPolicy::default(),
        }
    }

    pub fn with_policy(store: Arc<S>, policy: WipPolicy) -> TaktResult<Self> {
        policy.validate()?;
        Ok(Self { store, policy })
    }

    // ========================================================================
    // SNAPSHOTS
    // ========================================================================

    /// Project-wide WIP snapshot. Counts come from one consistent storage
    /// snapshot; a column deleted between counting and resolution is
    /// skipped, not an error.
    pub fn project_wip_status(&self, project_id: ProjectId) -> TaktResult<ProjectWipStatusResponse> {
        let counts = self.store.wip_counts_for_project(project_id)?;
        let mut statuses: Vec<(i32, ColumnWipStatusResponse)> = Vec::with_capacity(counts.len());
        for (column_id, count) in counts {
            let Some(column) = self.store.column_get(column_id)? else {
                continue;
            };
            let status = ColumnWipStatusResponse::evaluate(
                column.column_id,
                column.name.clone(),
                count,
                column.soft_limit,
                column.hard_limit,
            );
            if status.health.is_bottleneck() {
                warn!(
                    project_id = %project_id,
                    column_id = %column.column_id,
                    current_wip = count,
                    "Column at hard WIP limit"
                );
            }
            statuses.push((column.position, status));
        }
        statuses.sort_by_key(|(position, _)| *position);
        let snapshot = ProjectWipStatusResponse::roll_up(
            project_id,
            statuses.into_iter().map(|(_, s)| s).collect(),
        );
        debug!(
            project_id = %project_id,
            total_wip = snapshot.total_wip,
            bottlenecks = snapshot.bottleneck_count,
            "Computed project WIP snapshot"
        );
        Ok(snapshot)
    }

    /// Single-column WIP status.
    pub fn column_wip_status(&self, column_id: ColumnId) -> TaktResult<ColumnWipStatusResponse> {
        let column = self.fetch_column(column_id)?;
        let count = self.store.wip_count_by_column(column_id)?;
        Ok(ColumnWipStatusResponse::evaluate(
            column.column_id,
            column.name,
            count,
            column.soft_limit,
            column.hard_limit,
        ))
    }

    /// Sprint CONWIP status. A sprint id that does not resolve yields the
    /// `not_found` snapshot (health `Error`) rather than raising, so
    /// periodic pollers survive sprint deletion.
    pub fn sprint_wip_status(&self, sprint_id: SprintId) -> TaktResult<SprintWipStatusResponse> {
        let Some(sprint) = self.store.sprint_get(sprint_id)? else {
            return Ok(SprintWipStatusResponse::not_found(sprint_id));
        };
        let count = self.store.wip_count_by_sprint(sprint_id)?;
        Ok(SprintWipStatusResponse::evaluate(
            sprint.sprint_id,
            sprint.name,
            count,
            sprint.conwip_limit,
            sprint.wip_validation_enabled,
        ))
    }

    // ========================================================================
    // MOVE VALIDATION
    // ========================================================================

    /// Guard a prospective move into a column. Checks the hard limit first,
    /// then the soft limit; each dimension is validated independently.
    /// Columns without limits fall back to the policy defaults.
    pub fn validate_column_move(&self, column_id: ColumnId) -> TaktResult<WipValidationResult> {
        let column = self.fetch_column(column_id)?;
        let current = self.store.wip_count_by_column(column_id)?;
        let soft = column.soft_limit.or(self.policy.default_soft_limit);
        let hard = column.hard_limit.or(self.policy.default_hard_limit);

        if let Some(limit) = hard {
            let verdict = validate_wip_move(
                current,
                limit,
                WipViolationType::ColumnHardLimit,
                column.column_id,
                &column.name,
            )?;
            if !verdict.valid {
                warn!(column_id = %column_id, current_wip = current, limit, "Hard WIP limit blocks move");
                return Ok(verdict
                    .with_suggestion(SUGGEST_OTHER_COLUMN)
                    .with_suggestion(SUGGEST_COMPLETE_FIRST));
            }
        }
        if let Some(limit) = soft {
            let verdict = validate_wip_move(
                current,
                limit,
                WipViolationType::ColumnSoftLimit,
                column.column_id,
                &column.name,
            )?;
            if !verdict.valid {
                debug!(column_id = %column_id, current_wip = current, limit, "Soft WIP limit exceeded");
                return Ok(verdict.with_suggestion(SUGGEST_COMPLETE_FIRST));
            }
        }
        Ok(WipValidationResult::valid())
    }

    /// Guard a prospective move against a sprint's CONWIP cap. Sprints with
    /// validation disabled or no limit always allow the move.
    pub fn validate_sprint_conwip(&self, sprint_id: SprintId) -> TaktResult<WipValidationResult> {
        let sprint = self.store.sprint_get(sprint_id)?.ok_or(StoreError::NotFound {
            entity_type: EntityType::Sprint,
            id: sprint_id,
        })?;
        let limit = match (sprint.wip_validation_enabled, sprint.conwip_limit) {
            (true, Some(limit)) => limit,
            _ => return Ok(WipValidationResult::valid()),
        };
        let current = self.store.wip_count_by_sprint(sprint_id)?;
        let verdict = validate_wip_move(
            current,
            limit,
            WipViolationType::SprintConwipLimit,
            sprint.sprint_id,
            &sprint.name,
        )?;
        if !verdict.valid {
            warn!(sprint_id = %sprint_id, current_wip = current, limit, "Sprint CONWIP limit blocks move");
            return Ok(verdict.with_suggestion(SUGGEST_FINISH_SPRINT_ITEM));
        }
        Ok(verdict)
    }

    /// Guard a user's personal WIP within a project, when the policy
    /// enforces one.
    pub fn validate_personal_wip(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> TaktResult<WipValidationResult> {
        let limit = match (self.policy.enforce_personal_limit, self.policy.personal_wip_limit) {
            (true, Some(limit)) => limit,
            _ => return Ok(WipValidationResult::valid()),
        };
        let current = self.store.wip_count_by_assignee(project_id, user_id)?;
        let verdict = validate_wip_move(
            current,
            limit,
            WipViolationType::PersonalWipLimit,
            user_id,
            "assignee",
        )?;
        if !verdict.valid {
            return Ok(verdict.with_suggestion(SUGGEST_COMPLETE_FIRST));
        }
        Ok(verdict)
    }

    fn fetch_column(&self, column_id: ColumnId) -> TaktResult<KanbanColumn> {
        self.store.column_get(column_id)?.ok_or_else(|| {
            StoreError::NotFound {
                entity_type: EntityType::Column,
                id: column_id,
            }
            .into()
        })
    }
}

// ============================================================================
// NOTIFICATION COMPOSITION
// ============================================================================

/// Build a validated out-of-band WIP notification.
#[allow(clippy::too_many_arguments)]
pub fn compose_wip_notification(
    project_id: ProjectId,
    target_id: EntityId,
    target_name: &str,
    current_wip: i32,
    wip_limit: i32,
    recipient_id: UserId,
    notification_type: WipNotificationType,
) -> TaktResult<WipNotificationRequest> {
    let request = WipNotificationRequest {
        project_id,
        target_id,
        target_name: target_name.to_string(),
        current_wip,
        wip_limit,
        recipient_id,
        notification_type,
    };
    request.validate()?;
    Ok(request)
}

/// Build a validated bottleneck alert for the project manager.
pub fn compose_bottleneck_alert(
    project_id: ProjectId,
    column_id: ColumnId,
    column_name: &str,
    blocking_tasks: i32,
    affected_tasks: i32,
    project_manager_id: UserId,
) -> TaktResult<BottleneckAlertRequest> {
    let request = BottleneckAlertRequest {
        project_id,
        column_id,
        column_name: column_name.to_string(),
        blocking_tasks,
        affected_tasks,
        project_manager_id,
    };
    request.validate()?;
    Ok(request)
}

/// Build a validated personal WIP notification.
pub fn compose_personal_notification(
    user_id: UserId,
    project_id: ProjectId,
    current_wip: i32,
    max_wip: i32,
) -> TaktResult<PersonalWipNotificationRequest> {
    let request = PersonalWipNotificationRequest {
        user_id,
        project_id,
        current_wip,
        max_wip,
    };
    request.validate()?;
    Ok(request)
}

/// Wrap an arbitrary payload in the real-time update envelope.
pub fn build_update_message(
    update_type: WipUpdateType,
    project_id: ProjectId,
    payload: serde_json::Value,
) -> WipUpdateMessage {
    WipUpdateMessage::new(update_type, project_id, payload)
}

/// Envelope a validation verdict as a `WipViolation` push update.
pub fn violation_message(
    project_id: ProjectId,
    verdict: &WipValidationResult,
) -> TaktResult<WipUpdateMessage> {
    let payload = encode_payload(verdict)?;
    Ok(WipUpdateMessage::new(
        WipUpdateType::WipViolation,
        project_id,
        payload,
    ))
}

/// Envelope a column status as a `BottleneckDetected` push update.
pub fn bottleneck_message(
    project_id: ProjectId,
    status: &ColumnWipStatusResponse,
) -> TaktResult<WipUpdateMessage> {
    let payload = encode_payload(status)?;
    Ok(WipUpdateMessage::new(
        WipUpdateType::BottleneckDetected,
        project_id,
        payload,
    ))
}

/// Envelope a full project snapshot as the `InitialLoad` sent on
/// subscription.
pub fn initial_load_message(snapshot: &ProjectWipStatusResponse) -> TaktResult<WipUpdateMessage> {
    let payload = encode_payload(snapshot)?;
    Ok(WipUpdateMessage::new(
        WipUpdateType::InitialLoad,
        snapshot.project_id,
        payload,
    ))
}

fn encode_payload<T: serde::Serialize>(value: &T) -> TaktResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| TaktError::Encoding {
        reason: e.to_string(),
    })
}

// ============================================================================
// TESTS
// ============================================================================
