//! Core entity structures
//!
//! `BacklogItem` carries its own transition methods. They are pure: each one
//! checks the precondition against the in-memory status and either mutates
//! `self` along a documented edge or returns a [`StateError`] leaving `self`
//! untouched. Persistence of the mutated entity is the caller's concern.

use crate::{
    new_entity_id, BacklogId, BacklogItemId, BacklogItemStatus, BacklogOrigin, ColumnId,
    ProjectId, RequirementId, SprintId, SprintStatus, StateError, TaskId, Timestamp, UserId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A single entry in a product backlog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BacklogItem {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub item_id: BacklogItemId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub backlog_id: BacklogId,
    pub title: String,
    pub origin: BacklogOrigin,
    pub status: BacklogItemStatus,
    /// Unique ordering within the backlog; not necessarily contiguous.
    pub priority_order: i32,
    pub story_points: Option<i32>,
    pub estimated_effort_hours: Option<i32>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub sprint_id: Option<SprintId>,
    /// Set only when origin is [`BacklogOrigin::Requirement`].
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub requirement_id: Option<RequirementId>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl BacklogItem {
    /// Create a manual item in `Backlog` status. The caller supplies the
    /// priority order (next free slot in its backlog).
    pub fn new_manual(
        backlog_id: BacklogId,
        title: impl Into<String>,
        story_points: Option<i32>,
        priority_order: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            item_id: new_entity_id(),
            backlog_id,
            title: title.into(),
            origin: BacklogOrigin::Manual,
            status: BacklogItemStatus::Backlog,
            priority_order,
            story_points,
            estimated_effort_hours: None,
            sprint_id: None,
            requirement_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an item derived from a requirement, in `Backlog` status.
    pub fn from_requirement(
        backlog_id: BacklogId,
        requirement_id: RequirementId,
        title: impl Into<String>,
        story_points: Option<i32>,
        priority_order: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            item_id: new_entity_id(),
            backlog_id,
            title: title.into(),
            origin: BacklogOrigin::Requirement,
            status: BacklogItemStatus::Backlog,
            priority_order,
            story_points,
            estimated_effort_hours: None,
            sprint_id: None,
            requirement_id: Some(requirement_id),
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// `Backlog -> Selected`. Requirement-derived items must carry story
    /// points before they can be selected.
    pub fn select_for_planning(&mut self) -> Result<(), StateError> {
        if self.status != BacklogItemStatus::Backlog {
            return Err(StateError::InvalidTransition {
                from: self.status,
                operation: "select for sprint planning",
            });
        }
        if self.origin == BacklogOrigin::Requirement && self.story_points.is_none() {
            return Err(StateError::MissingStoryPoints {
                item_id: self.item_id,
            });
        }
        self.status = BacklogItemStatus::Selected;
        self.touch();
        Ok(())
    }

    /// `Selected -> Sprint`, recording the sprint assignment.
    pub fn assign_to_sprint(&mut self, sprint_id: SprintId) -> Result<(), StateError> {
        if self.status != BacklogItemStatus::Selected {
            return Err(StateError::InvalidTransition {
                from: self.status,
                operation: "move to sprint",
            });
        }
        self.status = BacklogItemStatus::Sprint;
        self.sprint_id = Some(sprint_id);
        self.touch();
        Ok(())
    }

    /// `Sprint -> Completed`. Terminal.
    pub fn complete(&mut self) -> Result<(), StateError> {
        if self.status != BacklogItemStatus::Sprint {
            return Err(StateError::InvalidTransition {
                from: self.status,
                operation: "complete",
            });
        }
        self.status = BacklogItemStatus::Completed;
        self.touch();
        Ok(())
    }

    /// `Selected|Sprint -> Backlog`, clearing the sprint assignment.
    /// Priority order is preserved.
    pub fn return_to_backlog(&mut self) -> Result<(), StateError> {
        if !self.status.can_return_to_backlog() {
            return Err(StateError::InvalidTransition {
                from: self.status,
                operation: "move back to backlog",
            });
        }
        self.status = BacklogItemStatus::Backlog;
        self.sprint_id = None;
        self.touch();
        Ok(())
    }

    /// Unconditional story-point overwrite; no state restriction.
    pub fn set_story_points(&mut self, points: Option<i32>) {
        self.story_points = points;
        self.touch();
    }

    /// Deletion guard. Items that reached `Sprint` or `Completed` are never
    /// physically deleted.
    pub fn ensure_deletable(&self) -> Result<(), StateError> {
        if !self.status.can_be_deleted() {
            return Err(StateError::DeleteForbidden {
                item_id: self.item_id,
                status: self.status,
            });
        }
        Ok(())
    }
}

/// A sprint as consumed by the planning core. Created and persisted by an
/// external sprint service; the core reads limits and drives status
/// transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Sprint {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub sprint_id: SprintId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub project_id: ProjectId,
    pub name: String,
    pub status: SprintStatus,
    /// Sprint-level cap on concurrently active items, independent of column.
    pub conwip_limit: Option<i32>,
    pub wip_validation_enabled: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Sprint {
    pub fn new(project_id: ProjectId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            sprint_id: new_entity_id(),
            project_id,
            name: name.into(),
            status: SprintStatus::Planned,
            conwip_limit: None,
            wip_validation_enabled: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_conwip_limit(mut self, limit: i32) -> Self {
        self.conwip_limit = Some(limit);
        self.wip_validation_enabled = true;
        self
    }

    /// `Planned -> Active`.
    pub fn start(&mut self) -> Result<(), StateError> {
        if self.status != SprintStatus::Planned {
            return Err(StateError::SprintTransition {
                from: self.status,
                operation: "start",
            });
        }
        self.status = SprintStatus::Active;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// `Active -> Completed`.
    pub fn finish(&mut self) -> Result<(), StateError> {
        if self.status != SprintStatus::Active {
            return Err(StateError::SprintTransition {
                from: self.status,
                operation: "complete",
            });
        }
        self.status = SprintStatus::Completed;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// `Planned|Active -> Cancelled`.
    pub fn cancel(&mut self) -> Result<(), StateError> {
        if !self.status.is_open() {
            return Err(StateError::SprintTransition {
                from: self.status,
                operation: "cancel",
            });
        }
        self.status = SprintStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// A kanban column with its WIP limit configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct KanbanColumn {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub column_id: ColumnId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub project_id: ProjectId,
    pub name: String,
    /// Display order on the board.
    pub position: i32,
    /// Warning threshold. Exceeding it classifies the column Yellow.
    pub soft_limit: Option<i32>,
    /// Blocking threshold. Reaching it classifies the column Red.
    pub hard_limit: Option<i32>,
}

impl KanbanColumn {
    pub fn new(project_id: ProjectId, name: impl Into<String>, position: i32) -> Self {
        Self {
            column_id: new_entity_id(),
            project_id,
            name: name.into(),
            position,
            soft_limit: None,
            hard_limit: None,
        }
    }

    pub fn with_limits(mut self, soft: Option<i32>, hard: Option<i32>) -> Self {
        self.soft_limit = soft;
        self.hard_limit = hard;
        self
    }
}

/// Read-side view of a requirement, the story-point source for
/// requirement-derived backlog items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Requirement {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub requirement_id: RequirementId,
    pub title: String,
    pub story_points: Option<i32>,
}

/// A task card on the kanban board. The core never mutates cards; it only
/// counts them per column, sprint, or assignee for WIP evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TaskCard {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub task_id: TaskId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub project_id: ProjectId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub column_id: ColumnId,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub sprint_id: Option<SprintId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub assignee_id: Option<UserId>,
    pub title: String,
}

impl TaskCard {
    pub fn new(project_id: ProjectId, column_id: ColumnId, title: impl Into<String>) -> Self {
        Self {
            task_id: new_entity_id(),
            project_id,
            column_id,
            sprint_id: None,
            assignee_id: None,
            title: title.into(),
        }
    }

    pub fn in_sprint(mut self, sprint_id: SprintId) -> Self {
        self.sprint_id = Some(sprint_id);
        self
    }

    pub fn assigned_to(mut self, user_id: UserId) -> Self {
        self.assignee_id = Some(user_id);
        self
    }
}
