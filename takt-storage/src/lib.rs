//! TAKT Storage - Storage Trait and In-Memory Implementation
//!
//! Defines the persistence abstraction the planning and WIP crates work
//! against. Production deployments back this with a database; the bundled
//! [`MemoryStore`] exists to exercise the core and for tests.
//!
//! Concurrency contract: concurrent transition attempts on the same backlog
//! item must be serialized by the implementation (row-level or optimistic
//! locking in a database, a write lock here). `wip_counts_for_project` must
//! return counts taken from one consistent snapshot so that project rollups
//! are not skewed by in-flight task moves.

pub mod memory;

pub use memory::MemoryStore;

use takt_core::{
    BacklogId, BacklogItem, BacklogItemId, BacklogItemStatus, ColumnId, KanbanColumn, ProjectId,
    Requirement, RequirementId, Sprint, SprintId, SprintStatus, TaktResult, UserId,
};

// ============================================================================
// UPDATE TYPES
// ============================================================================

/// Update payload for backlog items.
///
/// Outer `None` leaves a field unchanged; for clearable fields the inner
/// `None` clears the stored value.
#[derive(Debug, Clone, Default)]
pub struct BacklogItemUpdate {
    /// New status
    pub status: Option<BacklogItemStatus>,
    /// Sprint assignment (`Some(None)` clears it)
    pub sprint_id: Option<Option<SprintId>>,
    /// Story points (`Some(None)` clears them)
    pub story_points: Option<Option<i32>>,
    /// Estimated effort hours (`Some(None)` clears them)
    pub estimated_effort_hours: Option<Option<i32>>,
    /// New priority order
    pub priority_order: Option<i32>,
}

/// Update payload for sprints.
#[derive(Debug, Clone, Default)]
pub struct SprintUpdate {
    /// New status
    pub status: Option<SprintStatus>,
    /// CONWIP limit (`Some(None)` clears it)
    pub conwip_limit: Option<Option<i32>>,
    /// Whether CONWIP validation is enforced
    pub wip_validation_enabled: Option<bool>,
}

// ============================================================================
// STORAGE TRAIT
// ============================================================================

/// Storage trait for TAKT planning entities.
///
/// Not-found on update/delete surfaces as `StoreError::NotFound`; reads
/// return `Ok(None)` and let the caller decide.
pub trait PlanningStore: Send + Sync {
    // === Backlog Operations ===

    /// Whether a backlog exists.
    fn backlog_exists(&self, backlog_id: BacklogId) -> TaktResult<bool>;

    // === Backlog Item Operations ===

    /// Insert a new backlog item.
    fn item_insert(&self, item: &BacklogItem) -> TaktResult<()>;

    /// Get a backlog item by ID.
    fn item_get(&self, item_id: BacklogItemId) -> TaktResult<Option<BacklogItem>>;

    /// Update a backlog item.
    fn item_update(&self, item_id: BacklogItemId, update: BacklogItemUpdate) -> TaktResult<()>;

    /// Physically delete a backlog item. State guards run in the service
    /// layer before this is called.
    fn item_delete(&self, item_id: BacklogItemId) -> TaktResult<()>;

    /// List items in a backlog, ordered by priority order.
    fn items_by_backlog(&self, backlog_id: BacklogId) -> TaktResult<Vec<BacklogItem>>;

    /// List items assigned to a sprint.
    fn items_by_sprint(&self, sprint_id: SprintId) -> TaktResult<Vec<BacklogItem>>;

    /// Highest priority order currently used in a backlog, if any item exists.
    fn max_priority_order(&self, backlog_id: BacklogId) -> TaktResult<Option<i32>>;

    // === Sprint Operations ===

    /// Get a sprint by ID.
    fn sprint_get(&self, sprint_id: SprintId) -> TaktResult<Option<Sprint>>;

    /// Update a sprint.
    fn sprint_update(&self, sprint_id: SprintId, update: SprintUpdate) -> TaktResult<()>;

    // === Column Operations ===

    /// Get a column by ID.
    fn column_get(&self, column_id: ColumnId) -> TaktResult<Option<KanbanColumn>>;

    /// List a project's columns in display order.
    fn columns_by_project(&self, project_id: ProjectId) -> TaktResult<Vec<KanbanColumn>>;

    // === WIP Counts ===

    /// Count of task cards currently in a column.
    fn wip_count_by_column(&self, column_id: ColumnId) -> TaktResult<i32>;

    /// Per-column task counts for a whole project, taken from a single
    /// consistent snapshot. Columns with no tasks appear with count 0.
    fn wip_counts_for_project(&self, project_id: ProjectId) -> TaktResult<Vec<(ColumnId, i32)>>;

    /// Count of task cards currently attributed to a sprint.
    fn wip_count_by_sprint(&self, sprint_id: SprintId) -> TaktResult<i32>;

    /// Count of task cards assigned to a user within a project.
    fn wip_count_by_assignee(&self, project_id: ProjectId, user_id: UserId) -> TaktResult<i32>;

    // === Requirement Operations ===

    /// Get a requirement by ID.
    fn requirement_get(&self, requirement_id: RequirementId) -> TaktResult<Option<Requirement>>;
}
