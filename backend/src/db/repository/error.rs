//! Error types for repository operations.
//!
//! Every variant carries an [`ErrorContext`] so a failure can be traced back to the
//! operation, entity and id that produced it.

use std::fmt;

use crate::models::ConflictRecord;
use crate::scheduler::FieldError;

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Where a repository failure happened.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// e.g. "create_block", "get_offering"
    pub operation: Option<String>,
    /// e.g. "ScheduleBlock", "CourseOffering"
    pub entity: Option<String>,
    pub entity_id: Option<String>,
    /// Backend detail such as a constraint name
    pub details: Option<String>,
    pub retryable: bool,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref entity) = self.entity {
            parts.push(format!("entity={}", entity));
        }
        if let Some(ref id) = self.entity_id {
            parts.push(format!("id={}", id));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
#[allow(clippy::result_large_err)]
pub enum RepositoryError {
    /// Pool checkout or connection failure. Retried by the Postgres backend.
    #[error("Connection error: {message} {context}")]
    ConnectionError {
        message: String,
        context: ErrorContext,
    },

    #[error("Query error: {message} {context}")]
    QueryError {
        message: String,
        context: ErrorContext,
    },

    #[error("Not found: {message} {context}")]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    /// A database constraint rejected the row.
    #[error("Data validation error: {message} {context}")]
    ValidationError {
        message: String,
        context: ErrorContext,
    },

    /// A patch merged onto the stored block produced an invalid block.
    #[error("Invalid input: {} rejected field(s) {context}", errors.len())]
    InvalidInput {
        errors: Vec<FieldError>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message} {context}")]
    ConfigurationError {
        message: String,
        context: ErrorContext,
    },

    #[error("Internal error: {message} {context}")]
    InternalError {
        message: String,
        context: ErrorContext,
    },

    /// The write was aborted because its slots collide with existing blocks.
    /// Raised from inside the write unit so nothing is persisted.
    #[error("Schedule conflict: {} colliding slot(s) {context}", conflicts.len())]
    ScheduleConflict {
        conflicts: Vec<ConflictRecord>,
        context: ErrorContext,
    },
}

impl RepositoryError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
            context: ErrorContext::default().retryable(),
        }
    }

    pub fn connection_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::ConnectionError {
            message: message.into(),
            context: context.retryable(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::QueryError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn not_found_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::NotFound {
            message: message.into(),
            context,
        }
    }

    /// Every field rejected while merging a patch.
    pub fn invalid_input(errors: Vec<FieldError>) -> Self {
        Self::InvalidInput {
            errors,
            context: ErrorContext::default().with_entity("ScheduleBlock"),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn internal_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::InternalError {
            message: message.into(),
            context,
        }
    }

    /// Every collision found by the in-write detection pass.
    pub fn schedule_conflict(conflicts: Vec<ConflictRecord>) -> Self {
        Self::ScheduleConflict {
            conflicts,
            context: ErrorContext::default().with_entity("ScheduleBlock"),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError { context, .. } | Self::QueryError { context, .. } => {
                context.retryable
            }
            _ => false,
        }
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::ConnectionError { context, .. }
            | Self::QueryError { context, .. }
            | Self::NotFound { context, .. }
            | Self::ValidationError { context, .. }
            | Self::InvalidInput { context, .. }
            | Self::ConfigurationError { context, .. }
            | Self::InternalError { context, .. }
            | Self::ScheduleConflict { context, .. } => context,
        }
    }

    /// Records the failing operation.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        match &mut self {
            Self::ConnectionError { context, .. }
            | Self::QueryError { context, .. }
            | Self::NotFound { context, .. }
            | Self::ValidationError { context, .. }
            | Self::InvalidInput { context, .. }
            | Self::ConfigurationError { context, .. }
            | Self::InternalError { context, .. }
            | Self::ScheduleConflict { context, .. } => {
                context.operation = Some(operation.into());
            }
        }
        self
    }
}

#[cfg(feature = "postgres-repo")]
impl From<diesel::result::Error> for RepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match err {
            Error::NotFound => RepositoryError::not_found("Record not found"),
            Error::DatabaseError(kind, info) => {
                let message = info.message().to_string();
                let context = ErrorContext::default().with_details(format!("db_error_kind={:?}", kind));

                match kind {
                    DatabaseErrorKind::UniqueViolation
                    | DatabaseErrorKind::CheckViolation
                    | DatabaseErrorKind::ForeignKeyViolation => {
                        let context = match info.constraint_name() {
                            Some(name) => context.with_details(name.to_string()),
                            None => context,
                        };
                        RepositoryError::ValidationError { message, context }
                    }
                    DatabaseErrorKind::SerializationFailure => RepositoryError::QueryError {
                        message,
                        context: context.retryable(),
                    },
                    _ => RepositoryError::QueryError { message, context },
                }
            }
            Error::QueryBuilderError(e) => RepositoryError::query(format!("Query builder error: {}", e)),
            Error::DeserializationError(e) => {
                RepositoryError::internal(format!("Deserialization error: {}", e))
            }
            Error::SerializationError(e) => {
                RepositoryError::internal(format!("Serialization error: {}", e))
            }
            other => RepositoryError::query(other.to_string()),
        }
    }
}

#[cfg(feature = "postgres-repo")]
impl From<diesel::r2d2::PoolError> for RepositoryError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        RepositoryError::connection_with_context(
            err.to_string(),
            ErrorContext::default().with_details("pool_error"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockId, OfferingId, SlotNumber, Weekday};

    #[test]
    fn test_context_display_lists_set_fields() {
        let ctx = ErrorContext::new("get_block")
            .with_entity("ScheduleBlock")
            .with_entity_id(42);
        assert_eq!(
            ctx.to_string(),
            "[operation=get_block, entity=ScheduleBlock, id=42]"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(RepositoryError::connection("refused").is_retryable());
        assert!(!RepositoryError::query("syntax").is_retryable());
        assert!(!RepositoryError::not_found("gone").is_retryable());
        assert!(!RepositoryError::schedule_conflict(Vec::new()).is_retryable());
    }

    #[test]
    fn test_invalid_input_keeps_every_field() {
        let err = RepositoryError::invalid_input(vec![
            FieldError::new("start_date", "must not be after end_date"),
            FieldError::new("repeat_weeks", "required for custom_weeks"),
        ])
        .with_operation("update_block");
        assert_eq!(err.context().operation.as_deref(), Some("update_block"));
        assert!(err.to_string().starts_with("Invalid input: 2 rejected field(s)"));
    }

    #[test]
    fn test_schedule_conflict_keeps_records_and_operation() {
        let record = ConflictRecord {
            block_id: BlockId::new(3),
            offering_id: OfferingId::new(9),
            teacher_id: None,
            room_id: None,
            weekday: Weekday::new(1).unwrap(),
            slot_number: SlotNumber::new(1).unwrap(),
        };
        let err = RepositoryError::schedule_conflict(vec![record]).with_operation("create_block");
        assert_eq!(err.context().operation.as_deref(), Some("create_block"));
        assert!(err.to_string().starts_with("Schedule conflict: 1 colliding slot(s)"));
        match err {
            RepositoryError::ScheduleConflict { conflicts, .. } => {
                assert_eq!(conflicts[0].block_id, BlockId::new(3))
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
