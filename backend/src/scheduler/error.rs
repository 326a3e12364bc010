//! Error taxonomy of the schedule engine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::repository::RepositoryError;
use crate::models::ConflictRecord;

/// Result type for schedule engine operations
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Path of the offending field, e.g. `days[1].slots[0]`
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors returned by every schedule operation.
///
/// None of these are retried automatically: validation, capacity and conflict
/// failures need different input, not another attempt.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// Malformed input. Carries every rejected field, not just the first.
    #[error("Validation error: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// Referenced block or offering does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: String },

    /// The weekly load cannot fit even when every slot of every weekday is used.
    #[error("Cannot schedule {required} periods/week: only {available} slots/week available")]
    Capacity { required: u32, available: u32 },

    /// The allocation collides with existing blocks sharing a teacher or room.
    #[error("Schedule conflict: {} colliding slot(s)", .0.len())]
    Conflict(Vec<ConflictRecord>),

    /// Internal invariant violation in the generator.
    #[error("Build error: {0}")]
    Build(String),

    /// Storage failure unrelated to the request's content.
    #[error(transparent)]
    Repository(RepositoryError),
}

impl ScheduleError {
    /// Single-field validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Stable error code used in API payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::NotFound { .. } => "NotFound",
            Self::Capacity { .. } => "CapacityError",
            Self::Conflict(_) => "ScheduleConflict",
            Self::Build(_) => "BuildError",
            Self::Repository(_) => "StorageError",
        }
    }

    /// Conflict list, when this is a conflict error.
    pub fn conflicts(&self) -> Option<&[ConflictRecord]> {
        match self {
            Self::Conflict(conflicts) => Some(conflicts),
            _ => None,
        }
    }
}

impl From<RepositoryError> for ScheduleError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { message, context } => {
                let entity = context.entity.unwrap_or_else(|| "Record".to_string());
                let id = context.entity_id.unwrap_or(message);
                ScheduleError::NotFound { entity, id }
            }
            RepositoryError::ScheduleConflict { conflicts, .. } => ScheduleError::Conflict(conflicts),
            RepositoryError::InvalidInput { errors, .. } => ScheduleError::Validation(errors),
            RepositoryError::ValidationError { message, context } => {
                let field = context.details.unwrap_or_else(|| "record".to_string());
                ScheduleError::validation(field, message)
            }
            other => ScheduleError::Repository(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::ErrorContext;
    use crate::models::{BlockId, OfferingId, SlotNumber, Weekday};

    #[test]
    fn test_validation_message_lists_every_field() {
        let err = ScheduleError::Validation(vec![
            FieldError::new("days[0].weekday", "weekday must be 1..7"),
            FieldError::new("repeat_weeks", "required"),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation error: days[0].weekday: weekday must be 1..7; repeat_weeks: required"
        );
        assert_eq!(err.code(), "ValidationError");
    }

    #[test]
    fn test_capacity_message() {
        let err = ScheduleError::Capacity {
            required: 100,
            available: 26,
        };
        assert_eq!(
            err.to_string(),
            "Cannot schedule 100 periods/week: only 26 slots/week available"
        );
    }

    #[test]
    fn test_repository_not_found_maps_to_not_found() {
        let repo_err = RepositoryError::not_found_with_context(
            "Schedule block 9 not found",
            ErrorContext::new("get_block")
                .with_entity("ScheduleBlock")
                .with_entity_id(9),
        );
        match ScheduleError::from(repo_err) {
            ScheduleError::NotFound { entity, id } => {
                assert_eq!(entity, "ScheduleBlock");
                assert_eq!(id, "9");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_repository_conflict_keeps_full_list() {
        let record = ConflictRecord {
            block_id: BlockId::new(1),
            offering_id: OfferingId::new(2),
            teacher_id: None,
            room_id: None,
            weekday: Weekday::new(2).unwrap(),
            slot_number: SlotNumber::new(3).unwrap(),
        };
        let repo_err = RepositoryError::schedule_conflict(vec![record.clone(), record.clone()]);
        let err = ScheduleError::from(repo_err);
        assert_eq!(err.code(), "ScheduleConflict");
        assert_eq!(err.conflicts().map(|c| c.len()), Some(2));
    }

    #[test]
    fn test_rejected_patch_maps_back_to_validation() {
        let repo_err = RepositoryError::invalid_input(vec![FieldError::new("end_date", "too early")]);
        match ScheduleError::from(repo_err) {
            ScheduleError::Validation(errors) => assert_eq!(errors[0].field, "end_date"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_connection_error_stays_storage_error() {
        let err = ScheduleError::from(RepositoryError::connection("down"));
        assert_eq!(err.code(), "StorageError");
        assert!(err.to_string().contains("down"));
    }
}
