//! TAKT Test Utilities
//!
//! Centralized test infrastructure for the TAKT workspace:
//! - Builders for backlog items, sprints, and columns in arbitrary states
//! - A seeded project fixture with board, backlog, and sprint
//! - Proptest strategies for statuses, origins, and limit configurations

// Re-export the in-memory store and its trait from their source crate
pub use takt_storage::{BacklogItemUpdate, MemoryStore, PlanningStore, SprintUpdate};

// Re-export core types for convenience
pub use takt_core::{
    new_entity_id, BacklogId, BacklogItem, BacklogItemId, BacklogItemStatus, BacklogOrigin,
    ColumnId, KanbanColumn, ProjectId, Requirement, RequirementId, Sprint, SprintId, SprintStatus,
    TaktError, TaktResult, TaskCard, UserId, WipHealth,
};

use proptest::prelude::*;

// ============================================================================
// BUILDERS
// ============================================================================

/// Builder for backlog items in arbitrary (possibly mid-pipeline) states.
/// Bypasses the transition guards on purpose; production code goes through
/// the state machine, tests need to start anywhere.
#[derive(Debug, Clone)]
pub struct ItemBuilder {
    backlog_id: BacklogId,
    title: String,
    origin: BacklogOrigin,
    status: BacklogItemStatus,
    priority_order: i32,
    story_points: Option<i32>,
    estimated_effort_hours: Option<i32>,
    sprint_id: Option<SprintId>,
    requirement_id: Option<RequirementId>,
}

impl ItemBuilder {
    pub fn new(backlog_id: BacklogId) -> Self {
        Self {
            backlog_id,
            title: "test item".to_string(),
            origin: BacklogOrigin::Manual,
            status: BacklogItemStatus::Backlog,
            priority_order: 0,
            story_points: None,
            estimated_effort_hours: None,
            sprint_id: None,
            requirement_id: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn from_requirement(mut self, requirement_id: RequirementId) -> Self {
        self.origin = BacklogOrigin::Requirement;
        self.requirement_id = Some(requirement_id);
        self
    }

    pub fn status(mut self, status: BacklogItemStatus) -> Self {
        self.status = status;
        self
    }

    pub fn priority(mut self, order: i32) -> Self {
        self.priority_order = order;
        self
    }

    pub fn story_points(mut self, points: i32) -> Self {
        self.story_points = Some(points);
        self
    }

    pub fn effort_hours(mut self, hours: i32) -> Self {
        self.estimated_effort_hours = Some(hours);
        self
    }

    pub fn in_sprint(mut self, sprint_id: SprintId) -> Self {
        self.sprint_id = Some(sprint_id);
        self.status = BacklogItemStatus::Sprint;
        self
    }

    pub fn build(self) -> BacklogItem {
        let mut item = match self.requirement_id {
            Some(req) => BacklogItem::from_requirement(
                self.backlog_id,
                req,
                self.title,
                self.story_points,
                self.priority_order,
            ),
            None => BacklogItem::new_manual(
                self.backlog_id,
                self.title,
                self.story_points,
                self.priority_order,
            ),
        };
        item.status = self.status;
        item.sprint_id = self.sprint_id;
        item.estimated_effort_hours = self.estimated_effort_hours;
        item
    }
}

/// Shorthand for a column with limits.
pub fn column_with_limits(
    project_id: ProjectId,
    name: &str,
    position: i32,
    soft: Option<i32>,
    hard: Option<i32>,
) -> KanbanColumn {
    KanbanColumn::new(project_id, name, position).with_limits(soft, hard)
}

// ============================================================================
// PROJECT FIXTURE
// ============================================================================

/// A seeded project: one backlog, a three-column board with soft/hard
/// limits (5/10), and a planned sprint with a CONWIP limit of 10.
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    pub store: MemoryStore,
    pub project_id: ProjectId,
    pub backlog_id: BacklogId,
    pub sprint_id: SprintId,
    /// To Do, Doing, Review — in display order.
    pub columns: Vec<KanbanColumn>,
}

impl ProjectFixture {
    pub fn standard() -> Self {
        let store = MemoryStore::new();
        let project_id = new_entity_id();
        let backlog_id = new_entity_id();
        store.insert_backlog(backlog_id).expect("seed backlog");

        let columns: Vec<KanbanColumn> = ["To Do", "Doing", "Review"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let col = column_with_limits(project_id, name, i as i32, Some(5), Some(10));
                store.insert_column(col.clone()).expect("seed column");
                col
            })
            .collect();

        let sprint = Sprint::new(project_id, "Sprint 1").with_conwip_limit(10);
        let sprint_id = sprint.sprint_id;
        store.insert_sprint(sprint).expect("seed sprint");

        Self {
            store,
            project_id,
            backlog_id,
            sprint_id,
            columns,
        }
    }

    /// Place `count` task cards into the given column.
    pub fn fill_column(&self, column: &KanbanColumn, count: i32) {
        for n in 0..count {
            self.store
                .insert_card(TaskCard::new(
                    self.project_id,
                    column.column_id,
                    format!("task {}", n),
                ))
                .expect("seed card");
        }
    }

    /// Attribute `count` task cards to the fixture sprint, in the first
    /// column.
    pub fn fill_sprint(&self, count: i32) {
        for n in 0..count {
            self.store
                .insert_card(
                    TaskCard::new(
                        self.project_id,
                        self.columns[0].column_id,
                        format!("sprint task {}", n),
                    )
                    .in_sprint(self.sprint_id),
                )
                .expect("seed card");
        }
    }
}

// ============================================================================
// PROPTEST STRATEGIES
// ============================================================================

pub fn arb_item_status() -> impl Strategy<Value = BacklogItemStatus> {
    prop_oneof![
        Just(BacklogItemStatus::Backlog),
        Just(BacklogItemStatus::Selected),
        Just(BacklogItemStatus::Sprint),
        Just(BacklogItemStatus::Completed),
    ]
}

pub fn arb_origin() -> impl Strategy<Value = BacklogOrigin> {
    prop_oneof![Just(BacklogOrigin::Manual), Just(BacklogOrigin::Requirement)]
}

/// Optional soft/hard limit pair with soft <= hard when both present.
pub fn arb_limits() -> impl Strategy<Value = (Option<i32>, Option<i32>)> {
    (
        proptest::option::of(0i32..20),
        proptest::option::of(0i32..20),
    )
        .prop_map(|(a, b)| match (a, b) {
            (Some(x), Some(y)) if x > y => (Some(y), Some(x)),
            other => other,
        })
}
