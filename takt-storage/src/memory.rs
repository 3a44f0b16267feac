//! In-memory implementation of [`PlanningStore`]
//!
//! Backed by `RwLock`-guarded maps. Every trait method takes the lock once,
//! so each call observes one consistent snapshot; `wip_counts_for_project`
//! in particular counts all columns under a single read guard.

use crate::{BacklogItemUpdate, PlanningStore, SprintUpdate};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use takt_core::{
    BacklogId, BacklogItem, BacklogItemId, ColumnId, EntityType, KanbanColumn, ProjectId,
    Requirement, RequirementId, Sprint, SprintId, StoreError, TaktResult, TaskCard, TaskId,
    UserId,
};

#[derive(Debug, Default)]
struct Tables {
    backlogs: HashSet<BacklogId>,
    items: HashMap<BacklogItemId, BacklogItem>,
    sprints: HashMap<SprintId, Sprint>,
    columns: HashMap<ColumnId, KanbanColumn>,
    requirements: HashMap<RequirementId, Requirement>,
    cards: HashMap<TaskId, TaskCard>,
}

/// In-memory planning store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaktResult<RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| StoreError::LockPoisoned.into())
    }

    fn write(&self) -> TaktResult<RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| StoreError::LockPoisoned.into())
    }

    // === Seeding helpers (not part of the trait) ===

    /// Register a backlog id so that item creation against it succeeds.
    pub fn insert_backlog(&self, backlog_id: BacklogId) -> TaktResult<()> {
        self.write()?.backlogs.insert(backlog_id);
        Ok(())
    }

    pub fn insert_sprint(&self, sprint: Sprint) -> TaktResult<()> {
        self.write()?.sprints.insert(sprint.sprint_id, sprint);
        Ok(())
    }

    pub fn insert_column(&self, column: KanbanColumn) -> TaktResult<()> {
        self.write()?.columns.insert(column.column_id, column);
        Ok(())
    }

    pub fn insert_requirement(&self, requirement: Requirement) -> TaktResult<()> {
        self.write()?
            .requirements
            .insert(requirement.requirement_id, requirement);
        Ok(())
    }

    pub fn insert_card(&self, card: TaskCard) -> TaktResult<()> {
        self.write()?.cards.insert(card.task_id, card);
        Ok(())
    }

    /// Drop a column, leaving its cards behind. Mirrors a column deleted
    /// mid-computation, which project snapshots must tolerate.
    pub fn remove_column(&self, column_id: ColumnId) -> TaktResult<()> {
        self.write()?.columns.remove(&column_id);
        Ok(())
    }

    pub fn remove_card(&self, task_id: TaskId) -> TaktResult<()> {
        self.write()?.cards.remove(&task_id);
        Ok(())
    }
}

impl PlanningStore for MemoryStore {
    fn backlog_exists(&self, backlog_id: BacklogId) -> TaktResult<bool> {
        Ok(self.read()?.backlogs.contains(&backlog_id))
    }

    fn item_insert(&self, item: &BacklogItem) -> TaktResult<()> {
        let mut tables = self.write()?;
        if tables.items.contains_key(&item.item_id) {
            return Err(StoreError::InsertFailed {
                entity_type: EntityType::BacklogItem,
                reason: format!("duplicate id {}", item.item_id),
            }
            .into());
        }
        tables.items.insert(item.item_id, item.clone());
        Ok(())
    }

    fn item_get(&self, item_id: BacklogItemId) -> TaktResult<Option<BacklogItem>> {
        Ok(self.read()?.items.get(&item_id).cloned())
    }

    fn item_update(&self, item_id: BacklogItemId, update: BacklogItemUpdate) -> TaktResult<()> {
        let mut tables = self.write()?;
        let item = tables
            .items
            .get_mut(&item_id)
            .ok_or(StoreError::NotFound {
                entity_type: EntityType::BacklogItem,
                id: item_id,
            })?;
        if let Some(status) = update.status {
            item.status = status;
        }
        if let Some(sprint_id) = update.sprint_id {
            item.sprint_id = sprint_id;
        }
        if let Some(points) = update.story_points {
            item.story_points = points;
        }
        if let Some(hours) = update.estimated_effort_hours {
            item.estimated_effort_hours = hours;
        }
        if let Some(order) = update.priority_order {
            item.priority_order = order;
        }
        item.updated_at = Utc::now();
        Ok(())
    }

    fn item_delete(&self, item_id: BacklogItemId) -> TaktResult<()> {
        let mut tables = self.write()?;
        if tables.items.remove(&item_id).is_none() {
            return Err(StoreError::NotFound {
                entity_type: EntityType::BacklogItem,
                id: item_id,
            }
            .into());
        }
        Ok(())
    }

    fn items_by_backlog(&self, backlog_id: BacklogId) -> TaktResult<Vec<BacklogItem>> {
        let tables = self.read()?;
        let mut items: Vec<BacklogItem> = tables
            .items
            .values()
            .filter(|i| i.backlog_id == backlog_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.priority_order);
        Ok(items)
    }

    fn items_by_sprint(&self, sprint_id: SprintId) -> TaktResult<Vec<BacklogItem>> {
        let tables = self.read()?;
        let mut items: Vec<BacklogItem> = tables
            .items
            .values()
            .filter(|i| i.sprint_id == Some(sprint_id))
            .cloned()
            .collect();
        items.sort_by_key(|i| i.priority_order);
        Ok(items)
    }

    fn max_priority_order(&self, backlog_id: BacklogId) -> TaktResult<Option<i32>> {
        let tables = self.read()?;
        Ok(tables
            .items
            .values()
            .filter(|i| i.backlog_id == backlog_id)
            .map(|i| i.priority_order)
            .max())
    }

    fn sprint_get(&self, sprint_id: SprintId) -> TaktResult<Option<Sprint>> {
        Ok(self.read()?.sprints.get(&sprint_id).cloned())
    }

    fn sprint_update(&self, sprint_id: SprintId, update: SprintUpdate) -> TaktResult<()> {
        let mut tables = self.write()?;
        let sprint = tables
            .sprints
            .get_mut(&sprint_id)
            .ok_or(StoreError::NotFound {
                entity_type: EntityType::Sprint,
                id: sprint_id,
            })?;
        if let Some(status) = update.status {
            sprint.status = status;
        }
        if let Some(limit) = update.conwip_limit {
            sprint.conwip_limit = limit;
        }
        if let Some(enabled) = update.wip_validation_enabled {
            sprint.wip_validation_enabled = enabled;
        }
        sprint.updated_at = Utc::now();
        Ok(())
    }

    fn column_get(&self, column_id: ColumnId) -> TaktResult<Option<KanbanColumn>> {
        Ok(self.read()?.columns.get(&column_id).cloned())
    }

    fn columns_by_project(&self, project_id: ProjectId) -> TaktResult<Vec<KanbanColumn>> {
        let tables = self.read()?;
        let mut columns: Vec<KanbanColumn> = tables
            .columns
            .values()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect();
        columns.sort_by_key(|c| c.position);
        Ok(columns)
    }

    fn wip_count_by_column(&self, column_id: ColumnId) -> TaktResult<i32> {
        let tables = self.read()?;
        Ok(tables
            .cards
            .values()
            .filter(|t| t.column_id == column_id)
            .count() as i32)
    }

    fn wip_counts_for_project(&self, project_id: ProjectId) -> TaktResult<Vec<(ColumnId, i32)>> {
        // Single read guard: all counts come from one snapshot.
        let tables = self.read()?;
        let mut columns: Vec<&KanbanColumn> = tables
            .columns
            .values()
            .filter(|c| c.project_id == project_id)
            .collect();
        columns.sort_by_key(|c| c.position);
        let counts = columns
            .into_iter()
            .map(|c| {
                let count = tables
                    .cards
                    .values()
                    .filter(|t| t.column_id == c.column_id)
                    .count() as i32;
                (c.column_id, count)
            })
            .collect();
        Ok(counts)
    }

    fn wip_count_by_sprint(&self, sprint_id: SprintId) -> TaktResult<i32> {
        let tables = self.read()?;
        Ok(tables
            .cards
            .values()
            .filter(|t| t.sprint_id == Some(sprint_id))
            .count() as i32)
    }

    fn wip_count_by_assignee(&self, project_id: ProjectId, user_id: UserId) -> TaktResult<i32> {
        let tables = self.read()?;
        Ok(tables
            .cards
            .values()
            .filter(|t| t.project_id == project_id && t.assignee_id == Some(user_id))
            .count() as i32)
    }

    fn requirement_get(&self, requirement_id: RequirementId) -> TaktResult<Option<Requirement>> {
        Ok(self.read()?.requirements.get(&requirement_id).cloned())
    }
}
