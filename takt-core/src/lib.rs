//! TAKT Core - Entity Types and WIP Evaluation
//!
//! Pure data structures and pure evaluation logic for the TAKT planning
//! engine. All other crates depend on this. No I/O lives here: every
//! function is synchronous over already-fetched data (counts, limit
//! configuration, entity rows); fetching is orchestrated by the service
//! crates.

pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;
pub mod messages;
pub mod wip;

pub use config::WipPolicy;
pub use entities::{BacklogItem, KanbanColumn, Requirement, Sprint, TaskCard};
pub use enums::{
    BacklogItemStatus, BacklogItemStatusParseError, BacklogOrigin, EntityType, SprintStatus,
    SprintStatusParseError, SprintWipHealth, WipHealth, WipNotificationType, WipUpdateType,
    WipViolationType,
};
pub use error::{StateError, StoreError, TaktError, TaktResult, ValidationError};
pub use identity::{
    new_entity_id, BacklogId, BacklogItemId, ColumnId, EntityId, ProjectId, RequirementId,
    SprintId, TaskId, Timestamp, UserId,
};
pub use messages::{
    BottleneckAlertRequest, ColumnWipStatusResponse, PersonalWipNotificationRequest,
    ProjectWipStatusResponse, SprintWipStatusResponse, WipNotificationRequest, WipUpdateMessage,
};
pub use wip::{evaluate_column_health, percent_of_limit, validate_wip_move, WipValidationResult};
