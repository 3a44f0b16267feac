//! Identity types for TAKT entities

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Entity identifier using UUIDv7 for timestamp-sortable IDs.
/// UUIDv7 embeds a Unix timestamp, making IDs naturally sortable by creation time.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

// Per-entity aliases. These are transparent (all Uuid underneath) but keep
// signatures self-describing across the workspace.
pub type ProjectId = Uuid;
pub type BacklogId = Uuid;
pub type BacklogItemId = Uuid;
pub type SprintId = Uuid;
pub type ColumnId = Uuid;
pub type RequirementId = Uuid;
pub type TaskId = Uuid;
pub type UserId = Uuid;

/// Generate a new UUIDv7 EntityId (timestamp-sortable).
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}
