//! Error types for TAKT operations
//!
//! Callers at the HTTP boundary are expected to map `Store(NotFound)` to a
//! 404-equivalent and `State`/`Validation` to a 400-equivalent, surfacing the
//! error message verbatim. Messages are written to be user-readable.

use crate::{BacklogItemStatus, EntityType, SprintStatus};
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Update failed for {entity_type:?} with id {id}: {reason}")]
    UpdateFailed {
        entity_type: EntityType,
        id: Uuid,
        reason: String,
    },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// State machine violations. Terminal: the caller must not retry without
/// changing input. A failed precondition leaves the persisted entity
/// unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("Cannot {operation} a backlog item in status {from}")]
    InvalidTransition {
        from: BacklogItemStatus,
        operation: &'static str,
    },

    #[error("Backlog item {item_id} requires story points before sprint planning")]
    MissingStoryPoints { item_id: Uuid },

    #[error("Backlog item {item_id} in status {status} cannot be deleted")]
    DeleteForbidden {
        item_id: Uuid,
        status: BacklogItemStatus,
    },

    #[error("Backlog item {item_id} has no linked requirement")]
    NoLinkedRequirement { item_id: Uuid },

    #[error("Cannot {operation} a sprint in status {from}")]
    SprintTransition {
        from: SprintStatus,
        operation: &'static str,
    },
}

/// Malformed-input errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Negative value for {field}: {value}")]
    NegativeValue { field: &'static str, value: i32 },

    #[error("Required field is blank: {field}")]
    BlankField { field: &'static str },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Master error type for all TAKT errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaktError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Payload encoding failed: {reason}")]
    Encoding { reason: String },
}

/// Result type alias for TAKT operations.
pub type TaktResult<T> = Result<T, TaktError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display_not_found() {
        let err = StoreError::NotFound {
            entity_type: EntityType::BacklogItem,
            id: Uuid::nil(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Entity not found"));
        assert!(msg.contains("BacklogItem"));
        assert!(msg.contains("00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_state_error_display_invalid_transition() {
        let err = StateError::InvalidTransition {
            from: BacklogItemStatus::Completed,
            operation: "move to sprint",
        };
        let msg = format!("{}", err);
        assert!(msg.contains("move to sprint"));
        assert!(msg.contains("COMPLETED"));
    }

    #[test]
    fn test_missing_story_points_names_story_points() {
        let err = StateError::MissingStoryPoints {
            item_id: Uuid::nil(),
        };
        assert!(format!("{}", err).contains("story points"));
    }

    #[test]
    fn test_validation_error_display_negative_value() {
        let err = ValidationError::NegativeValue {
            field: "current_wip",
            value: -3,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("current_wip"));
        assert!(msg.contains("-3"));
    }

    #[test]
    fn test_takt_error_from_variants() {
        let store = TaktError::from(StoreError::LockPoisoned);
        assert!(matches!(store, TaktError::Store(_)));

        let state = TaktError::from(StateError::MissingStoryPoints {
            item_id: Uuid::nil(),
        });
        assert!(matches!(state, TaktError::State(_)));

        let validation = TaktError::from(ValidationError::BlankField { field: "name" });
        assert!(matches!(validation, TaktError::Validation(_)));
    }
}
