//! TAKT Planning - Backlog State Machine and Sprint Planning
//!
//! Orchestrates the backlog-item pipeline over a [`PlanningStore`]:
//! fetch the entity, run the pure transition from `takt-core`, persist the
//! result. A failed precondition returns before any write, so the stored
//! status never changes on error.
//!
//! Also provides the sprint capacity aggregator and the sprint lifecycle
//! transitions (`Planned -> Active -> Completed`, with cancellation).

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use takt_core::{
    BacklogId, BacklogItem, BacklogItemId, BacklogItemStatus, EntityType, RequirementId, Sprint,
    SprintId, StateError, StoreError, TaktResult,
};
use takt_storage::{BacklogItemUpdate, PlanningStore, SprintUpdate};
use tracing::debug;

// ============================================================================
// SPRINT CAPACITY
// ============================================================================

/// Summary metrics over all backlog items assigned to a sprint.
/// Null story points and effort hours count as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintCapacity {
    pub sprint_id: SprintId,
    pub total_items: i32,
    pub total_story_points: i32,
    pub total_effort_hours: i32,
    pub completed_items: i32,
    pub remaining_items: i32,
}

impl SprintCapacity {
    /// Fold a sprint's items into capacity metrics. An empty slice yields
    /// all zeroes; that is a normal state, not an error.
    pub fn from_items(sprint_id: SprintId, items: &[BacklogItem]) -> Self {
        let total_items = items.len() as i32;
        let total_story_points = items.iter().filter_map(|i| i.story_points).sum();
        let total_effort_hours = items.iter().filter_map(|i| i.estimated_effort_hours).sum();
        let completed_items = items
            .iter()
            .filter(|i| i.status == BacklogItemStatus::Completed)
            .count() as i32;
        Self {
            sprint_id,
            total_items,
            total_story_points,
            total_effort_hours,
            completed_items,
            remaining_items: total_items - completed_items,
        }
    }
}

// ============================================================================
// PLANNING SERVICE
// ============================================================================

/// Sprint-planning operations over a [`PlanningStore`].
#[derive(Debug, Clone)]
pub struct PlanningService<S> {
    store: Arc<S>,
}

impl<S: PlanningStore> PlanningService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn fetch_item(&self, item_id: BacklogItemId) -> TaktResult<BacklogItem> {
        self.store.item_get(item_id)?.ok_or_else(|| {
            StoreError::NotFound {
                entity_type: EntityType::BacklogItem,
                id: item_id,
            }
            .into()
        })
    }

    fn fetch_sprint(&self, sprint_id: SprintId) -> TaktResult<Sprint> {
        self.store.sprint_get(sprint_id)?.ok_or_else(|| {
            StoreError::NotFound {
                entity_type: EntityType::Sprint,
                id: sprint_id,
            }
            .into()
        })
    }

    /// Next free priority order in a backlog: max existing + 1, or 0 when
    /// the backlog is empty.
    fn next_priority_order(&self, backlog_id: BacklogId) -> TaktResult<i32> {
        Ok(self
            .store
            .max_priority_order(backlog_id)?
            .map_or(0, |max| max + 1))
    }

    // === Item creation ===

    /// Create a manual backlog item at the end of the backlog.
    pub fn create_manual_item(
        &self,
        backlog_id: BacklogId,
        title: &str,
        story_points: Option<i32>,
    ) -> TaktResult<BacklogItem> {
        if !self.store.backlog_exists(backlog_id)? {
            return Err(StoreError::NotFound {
                entity_type: EntityType::Backlog,
                id: backlog_id,
            }
            .into());
        }
        let order = self.next_priority_order(backlog_id)?;
        let item = BacklogItem::new_manual(backlog_id, title, story_points, order);
        self.store.item_insert(&item)?;
        debug!(item_id = %item.item_id, backlog_id = %backlog_id, priority_order = order, "Created manual backlog item");
        Ok(item)
    }

    /// Create a backlog item derived from a requirement, copying its title
    /// and story points.
    pub fn create_item_from_requirement(
        &self,
        backlog_id: BacklogId,
        requirement_id: RequirementId,
    ) -> TaktResult<BacklogItem> {
        if !self.store.backlog_exists(backlog_id)? {
            return Err(StoreError::NotFound {
                entity_type: EntityType::Backlog,
                id: backlog_id,
            }
            .into());
        }
        let requirement = self.store.requirement_get(requirement_id)?.ok_or(
            StoreError::NotFound {
                entity_type: EntityType::Requirement,
                id: requirement_id,
            },
        )?;
        let order = self.next_priority_order(backlog_id)?;
        let item = BacklogItem::from_requirement(
            backlog_id,
            requirement_id,
            requirement.title.clone(),
            requirement.story_points,
            order,
        );
        self.store.item_insert(&item)?;
        debug!(item_id = %item.item_id, requirement_id = %requirement_id, "Created backlog item from requirement");
        Ok(item)
    }

    // === State machine transitions ===

    /// `Backlog -> Selected`. Requirement-derived items must carry story
    /// points.
    pub fn select_for_sprint_planning(&self, item_id: BacklogItemId) -> TaktResult<BacklogItem> {
        let mut item = self.fetch_item(item_id)?;
        item.select_for_planning()?;
        self.store.item_update(
            item_id,
            BacklogItemUpdate {
                status: Some(item.status),
                ..Default::default()
            },
        )?;
        Ok(item)
    }

    /// `Selected -> Sprint`, assigning the item to the given sprint.
    pub fn move_to_sprint(
        &self,
        item_id: BacklogItemId,
        sprint_id: SprintId,
    ) -> TaktResult<BacklogItem> {
        let sprint = self.fetch_sprint(sprint_id)?;
        let mut item = self.fetch_item(item_id)?;
        item.assign_to_sprint(sprint.sprint_id)?;
        self.store.item_update(
            item_id,
            BacklogItemUpdate {
                status: Some(item.status),
                sprint_id: Some(item.sprint_id),
                ..Default::default()
            },
        )?;
        debug!(item_id = %item_id, sprint_id = %sprint_id, "Moved item into sprint");
        Ok(item)
    }

    /// `Sprint -> Completed`.
    pub fn complete_item(&self, item_id: BacklogItemId) -> TaktResult<BacklogItem> {
        let mut item = self.fetch_item(item_id)?;
        item.complete()?;
        self.store.item_update(
            item_id,
            BacklogItemUpdate {
                status: Some(item.status),
                ..Default::default()
            },
        )?;
        Ok(item)
    }

    /// `Selected|Sprint -> Backlog`, clearing the sprint assignment and
    /// preserving priority order.
    pub fn move_back_to_backlog(&self, item_id: BacklogItemId) -> TaktResult<BacklogItem> {
        let mut item = self.fetch_item(item_id)?;
        item.return_to_backlog()?;
        self.store.item_update(
            item_id,
            BacklogItemUpdate {
                status: Some(item.status),
                sprint_id: Some(None),
                ..Default::default()
            },
        )?;
        Ok(item)
    }

    // === Story points ===

    /// Unconditional story-point overwrite; no state restriction.
    pub fn update_story_points(
        &self,
        item_id: BacklogItemId,
        points: Option<i32>,
    ) -> TaktResult<BacklogItem> {
        let mut item = self.fetch_item(item_id)?;
        item.set_story_points(points);
        self.store.item_update(
            item_id,
            BacklogItemUpdate {
                story_points: Some(points),
                ..Default::default()
            },
        )?;
        Ok(item)
    }

    /// Copy story points from the item's linked requirement.
    pub fn sync_story_points_from_requirement(
        &self,
        item_id: BacklogItemId,
    ) -> TaktResult<BacklogItem> {
        let mut item = self.fetch_item(item_id)?;
        let requirement_id = item.requirement_id.ok_or(StateError::NoLinkedRequirement {
            item_id: item.item_id,
        })?;
        let requirement = self.store.requirement_get(requirement_id)?.ok_or(
            StoreError::NotFound {
                entity_type: EntityType::Requirement,
                id: requirement_id,
            },
        )?;
        item.set_story_points(requirement.story_points);
        self.store.item_update(
            item_id,
            BacklogItemUpdate {
                story_points: Some(requirement.story_points),
                ..Default::default()
            },
        )?;
        Ok(item)
    }

    // === Ordering and deletion ===

    /// Move an item to a new priority slot. Uniqueness of orders within the
    /// backlog is the caller's concern.
    pub fn reorder_item(
        &self,
        item_id: BacklogItemId,
        new_priority_order: i32,
    ) -> TaktResult<BacklogItem> {
        let mut item = self.fetch_item(item_id)?;
        item.priority_order = new_priority_order;
        self.store.item_update(
            item_id,
            BacklogItemUpdate {
                priority_order: Some(new_priority_order),
                ..Default::default()
            },
        )?;
        Ok(item)
    }

    /// Physically delete an item. Forbidden once it reached `Sprint` or
    /// `Completed`.
    pub fn delete_item(&self, item_id: BacklogItemId) -> TaktResult<()> {
        let item = self.fetch_item(item_id)?;
        item.ensure_deletable()?;
        self.store.item_delete(item_id)?;
        debug!(item_id = %item_id, "Deleted backlog item");
        Ok(())
    }

    // === Sprint capacity ===

    /// Compute capacity metrics for a sprint. Pure read; an empty sprint
    /// yields zero sums.
    pub fn get_sprint_capacity(&self, sprint_id: SprintId) -> TaktResult<SprintCapacity> {
        let items = self.store.items_by_sprint(sprint_id)?;
        Ok(SprintCapacity::from_items(sprint_id, &items))
    }

    // === Sprint lifecycle ===

    /// `Planned -> Active`.
    pub fn start_sprint(&self, sprint_id: SprintId) -> TaktResult<Sprint> {
        let mut sprint = self.fetch_sprint(sprint_id)?;
        sprint.start()?;
        self.persist_sprint_status(&sprint)?;
        Ok(sprint)
    }

    /// `Active -> Completed`.
    pub fn complete_sprint(&self, sprint_id: SprintId) -> TaktResult<Sprint> {
        let mut sprint = self.fetch_sprint(sprint_id)?;
        sprint.finish()?;
        self.persist_sprint_status(&sprint)?;
        Ok(sprint)
    }

    /// `Planned|Active -> Cancelled`.
    pub fn cancel_sprint(&self, sprint_id: SprintId) -> TaktResult<Sprint> {
        let mut sprint = self.fetch_sprint(sprint_id)?;
        sprint.cancel()?;
        self.persist_sprint_status(&sprint)?;
        Ok(sprint)
    }

    fn persist_sprint_status(&self, sprint: &Sprint) -> TaktResult<()> {
        self.store.sprint_update(
            sprint.sprint_id,
            SprintUpdate {
                status: Some(sprint.status),
                ..Default::default()
            },
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use takt_core::{BacklogOrigin, Requirement, TaktError, ValidationError};
    use takt_test_utils::{new_entity_id, ItemBuilder, ProjectFixture};

    fn service(fx: &ProjectFixture) -> PlanningService<takt_test_utils::MemoryStore> {
        PlanningService::new(Arc::new(fx.store.clone()))
    }

    #[test]
    fn test_create_manual_item_in_empty_backlog() {
        let fx = ProjectFixture::standard();
        let svc = service(&fx);

        let item = svc
            .create_manual_item(fx.backlog_id, "Underwriting rules editor", Some(5))
            .unwrap();
        assert_eq!(item.priority_order, 0);
        assert_eq!(item.status, BacklogItemStatus::Backlog);
        assert_eq!(item.origin, BacklogOrigin::Manual);
        assert_eq!(item.story_points, Some(5));
        assert!(fx.store.item_get(item.item_id).unwrap().is_some());
    }

    #[test]
    fn test_priority_order_is_max_plus_one() {
        let fx = ProjectFixture::standard();
        let svc = service(&fx);

        let first = svc.create_manual_item(fx.backlog_id, "a", None).unwrap();
        let second = svc.create_manual_item(fx.backlog_id, "b", None).unwrap();
        assert_eq!(first.priority_order, 0);
        assert_eq!(second.priority_order, 1);
    }

    #[test]
    fn test_create_item_in_missing_backlog_is_not_found() {
        let fx = ProjectFixture::standard();
        let svc = service(&fx);

        let err = svc
            .create_manual_item(new_entity_id(), "orphan", None)
            .unwrap_err();
        assert!(matches!(
            err,
            TaktError::Store(StoreError::NotFound {
                entity_type: EntityType::Backlog,
                ..
            })
        ));
    }

    #[test]
    fn test_requirement_item_without_points_fails_selection() {
        let fx = ProjectFixture::standard();
        let svc = service(&fx);
        let requirement_id = new_entity_id();
        fx.store
            .insert_requirement(Requirement {
                requirement_id,
                title: "FNOL intake".to_string(),
                story_points: None,
            })
            .unwrap();

        let item = svc
            .create_item_from_requirement(fx.backlog_id, requirement_id)
            .unwrap();
        let err = svc.select_for_sprint_planning(item.item_id).unwrap_err();
        assert!(format!("{}", err).contains("story points"));

        // Persisted status unchanged.
        let stored = fx.store.item_get(item.item_id).unwrap().unwrap();
        assert_eq!(stored.status, BacklogItemStatus::Backlog);
    }

    #[test]
    fn test_sync_story_points_from_requirement() {
        let fx = ProjectFixture::standard();
        let svc = service(&fx);
        let requirement_id = new_entity_id();
        fx.store
            .insert_requirement(Requirement {
                requirement_id,
                title: "Premium calculator".to_string(),
                story_points: Some(8),
            })
            .unwrap();

        let item = svc
            .create_item_from_requirement(fx.backlog_id, requirement_id)
            .unwrap();
        svc.update_story_points(item.item_id, None).unwrap();

        let synced = svc.sync_story_points_from_requirement(item.item_id).unwrap();
        assert_eq!(synced.story_points, Some(8));
    }

    #[test]
    fn test_sync_without_linked_requirement_fails() {
        let fx = ProjectFixture::standard();
        let svc = service(&fx);
        let item = svc.create_manual_item(fx.backlog_id, "ad hoc", None).unwrap();

        let err = svc
            .sync_story_points_from_requirement(item.item_id)
            .unwrap_err();
        assert!(matches!(
            err,
            TaktError::State(StateError::NoLinkedRequirement { .. })
        ));
    }

    #[test]
    fn test_full_pipeline_through_service() {
        let fx = ProjectFixture::standard();
        let svc = service(&fx);
        let item = svc
            .create_manual_item(fx.backlog_id, "Broker portal login", Some(3))
            .unwrap();

        svc.select_for_sprint_planning(item.item_id).unwrap();
        svc.move_to_sprint(item.item_id, fx.sprint_id).unwrap();
        let done = svc.complete_item(item.item_id).unwrap();

        assert_eq!(done.status, BacklogItemStatus::Completed);
        let stored = fx.store.item_get(item.item_id).unwrap().unwrap();
        assert_eq!(stored.status, BacklogItemStatus::Completed);
        assert_eq!(stored.sprint_id, Some(fx.sprint_id));
    }

    #[test]
    fn test_move_to_missing_sprint_is_not_found() {
        let fx = ProjectFixture::standard();
        let svc = service(&fx);
        let item = svc.create_manual_item(fx.backlog_id, "x", None).unwrap();
        svc.select_for_sprint_planning(item.item_id).unwrap();

        let err = svc.move_to_sprint(item.item_id, new_entity_id()).unwrap_err();
        assert!(matches!(
            err,
            TaktError::Store(StoreError::NotFound {
                entity_type: EntityType::Sprint,
                ..
            })
        ));
    }

    #[test]
    fn test_round_trip_back_to_backlog() {
        let fx = ProjectFixture::standard();
        let svc = service(&fx);
        let item = svc.create_manual_item(fx.backlog_id, "x", Some(2)).unwrap();
        let original_order = item.priority_order;

        svc.select_for_sprint_planning(item.item_id).unwrap();
        svc.move_to_sprint(item.item_id, fx.sprint_id).unwrap();
        svc.move_back_to_backlog(item.item_id).unwrap();

        let stored = fx.store.item_get(item.item_id).unwrap().unwrap();
        assert_eq!(stored.status, BacklogItemStatus::Backlog);
        assert_eq!(stored.sprint_id, None);
        assert_eq!(stored.priority_order, original_order);
    }

    #[test]
    fn test_update_story_points_is_idempotent() {
        let fx = ProjectFixture::standard();
        let svc = service(&fx);
        let item = svc.create_manual_item(fx.backlog_id, "x", None).unwrap();

        svc.update_story_points(item.item_id, Some(13)).unwrap();
        let once = fx.store.item_get(item.item_id).unwrap().unwrap();
        svc.update_story_points(item.item_id, Some(13)).unwrap();
        let twice = fx.store.item_get(item.item_id).unwrap().unwrap();

        assert_eq!(once.story_points, twice.story_points);
        assert_eq!(twice.story_points, Some(13));
    }

    #[test]
    fn test_sprint_capacity_scenario() {
        let fx = ProjectFixture::standard();
        let svc = service(&fx);

        fx.store
            .item_insert(
                &ItemBuilder::new(fx.backlog_id)
                    .story_points(5)
                    .effort_hours(10)
                    .in_sprint(fx.sprint_id)
                    .build(),
            )
            .unwrap();
        fx.store
            .item_insert(
                &ItemBuilder::new(fx.backlog_id)
                    .priority(1)
                    .story_points(3)
                    .effort_hours(5)
                    .in_sprint(fx.sprint_id)
                    .status(BacklogItemStatus::Completed)
                    .build(),
            )
            .unwrap();

        let capacity = svc.get_sprint_capacity(fx.sprint_id).unwrap();
        assert_eq!(capacity.total_items, 2);
        assert_eq!(capacity.total_story_points, 8);
        assert_eq!(capacity.total_effort_hours, 15);
        assert_eq!(capacity.completed_items, 1);
        assert_eq!(capacity.remaining_items, 1);
    }

    #[test]
    fn test_capacity_of_empty_sprint_is_zero() {
        let fx = ProjectFixture::standard();
        let svc = service(&fx);
        let capacity = svc.get_sprint_capacity(fx.sprint_id).unwrap();
        assert_eq!(capacity.total_items, 0);
        assert_eq!(capacity.total_story_points, 0);
        assert_eq!(capacity.remaining_items, 0);
    }

    #[test]
    fn test_capacity_treats_null_points_as_zero() {
        let fx = ProjectFixture::standard();
        let svc = service(&fx);
        fx.store
            .item_insert(&ItemBuilder::new(fx.backlog_id).in_sprint(fx.sprint_id).build())
            .unwrap();

        let capacity = svc.get_sprint_capacity(fx.sprint_id).unwrap();
        assert_eq!(capacity.total_items, 1);
        assert_eq!(capacity.total_story_points, 0);
        assert_eq!(capacity.total_effort_hours, 0);
    }

    #[test]
    fn test_delete_from_backlog_succeeds() {
        let fx = ProjectFixture::standard();
        let svc = service(&fx);
        let item = svc.create_manual_item(fx.backlog_id, "x", None).unwrap();

        svc.delete_item(item.item_id).unwrap();
        assert!(fx.store.item_get(item.item_id).unwrap().is_none());
    }

    #[test]
    fn test_delete_in_sprint_is_forbidden() {
        let fx = ProjectFixture::standard();
        let svc = service(&fx);
        let item = svc.create_manual_item(fx.backlog_id, "x", None).unwrap();
        svc.select_for_sprint_planning(item.item_id).unwrap();
        svc.move_to_sprint(item.item_id, fx.sprint_id).unwrap();

        let err = svc.delete_item(item.item_id).unwrap_err();
        assert!(matches!(
            err,
            TaktError::State(StateError::DeleteForbidden { .. })
        ));
        // Still retrievable.
        assert!(fx.store.item_get(item.item_id).unwrap().is_some());
    }

    #[test]
    fn test_reorder_item() {
        let fx = ProjectFixture::standard();
        let svc = service(&fx);
        let item = svc.create_manual_item(fx.backlog_id, "x", None).unwrap();

        svc.reorder_item(item.item_id, 42).unwrap();
        let stored = fx.store.item_get(item.item_id).unwrap().unwrap();
        assert_eq!(stored.priority_order, 42);
    }

    #[test]
    fn test_sprint_lifecycle_through_service() {
        let fx = ProjectFixture::standard();
        let svc = service(&fx);

        let active = svc.start_sprint(fx.sprint_id).unwrap();
        assert_eq!(active.status, takt_core::SprintStatus::Active);

        let done = svc.complete_sprint(fx.sprint_id).unwrap();
        assert_eq!(done.status, takt_core::SprintStatus::Completed);

        let err = svc.start_sprint(fx.sprint_id).unwrap_err();
        assert!(matches!(
            err,
            TaktError::State(StateError::SprintTransition { .. })
        ));
    }

    mod transition_table {
        use super::*;
        use proptest::prelude::*;
        use takt_test_utils::arb_item_status;

        /// The planning operations, as data, so the table can be swept.
        #[derive(Debug, Clone, Copy)]
        enum Op {
            Select,
            MoveToSprint,
            Complete,
            MoveBack,
        }

        fn apply(
            svc: &PlanningService<takt_test_utils::MemoryStore>,
            op: Op,
            item_id: BacklogItemId,
            sprint_id: SprintId,
        ) -> TaktResult<BacklogItem> {
            match op {
                Op::Select => svc.select_for_sprint_planning(item_id),
                Op::MoveToSprint => svc.move_to_sprint(item_id, sprint_id),
                Op::Complete => svc.complete_item(item_id),
                Op::MoveBack => svc.move_back_to_backlog(item_id),
            }
        }

        /// Documented edge for (status, op), if any.
        fn expected(status: BacklogItemStatus, op: Op) -> Option<BacklogItemStatus> {
            match (status, op) {
                (BacklogItemStatus::Backlog, Op::Select) => Some(BacklogItemStatus::Selected),
                (BacklogItemStatus::Selected, Op::MoveToSprint) => Some(BacklogItemStatus::Sprint),
                (BacklogItemStatus::Sprint, Op::Complete) => Some(BacklogItemStatus::Completed),
                (BacklogItemStatus::Selected, Op::MoveBack)
                | (BacklogItemStatus::Sprint, Op::MoveBack) => Some(BacklogItemStatus::Backlog),
                _ => None,
            }
        }

        proptest! {
            /// Every (status, operation) pair either follows the documented
            /// edge or fails with a state error leaving storage untouched.
            #[test]
            fn prop_transition_table_is_total(
                status in arb_item_status(),
                op_idx in 0usize..4,
            ) {
                let op = [Op::Select, Op::MoveToSprint, Op::Complete, Op::MoveBack][op_idx];
                let fx = ProjectFixture::standard();
                let svc = service(&fx);

                let mut item = ItemBuilder::new(fx.backlog_id).story_points(1).build();
                item.status = status;
                if status == BacklogItemStatus::Sprint {
                    item.sprint_id = Some(fx.sprint_id);
                }
                fx.store.item_insert(&item).unwrap();

                let outcome = apply(&svc, op, item.item_id, fx.sprint_id);
                let stored = fx.store.item_get(item.item_id).unwrap().unwrap();

                match expected(status, op) {
                    Some(next) => {
                        prop_assert!(outcome.is_ok());
                        prop_assert_eq!(stored.status, next);
                    }
                    None => {
                        prop_assert!(matches!(outcome, Err(TaktError::State(_))));
                        prop_assert_eq!(stored.status, status);
                    }
                }
            }
        }
    }

    #[test]
    fn test_validation_error_is_distinct_from_state_error() {
        // Guard against conflating taxonomies at the boundary mapping.
        let validation: TaktError = ValidationError::BlankField { field: "title" }.into();
        assert!(matches!(validation, TaktError::Validation(_)));
    }
}
