use chrono::{DateTime, Utc};

use super::domain::{
    ApplicationId, ApplicationStatus, DocumentKind, EvaluationId, ListingId, Role, UserId,
};
use super::lifecycle::{TransitionError, WorkflowAction};
use super::repository::RepositoryError;

/// Structured failure returned by every workflow operation.
///
/// None of these are retried by the engine; a failed call leaves the store untouched.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("cannot {} an application that is {from}", .action.label())]
    InvalidStateTransition {
        from: ApplicationStatus,
        action: WorkflowAction,
    },
    #[error("jury member {jury_member_id} is already assigned to {application_id}")]
    DuplicateAssignment {
        application_id: ApplicationId,
        jury_member_id: UserId,
    },
    #[error("candidate {candidate_id} already applied to {listing_id}")]
    DuplicateApplication {
        candidate_id: UserId,
        listing_id: ListingId,
    },
    #[error("{0} has already been completed")]
    AlreadyCompleted(EvaluationId),
    #[error("missing required documents: {}", join_documents(.missing))]
    IncompleteDocuments { missing: Vec<DocumentKind> },
    #[error("application deadline for {listing_id} passed at {deadline}")]
    DeadlinePassed {
        listing_id: ListingId,
        deadline: DateTime<Utc>,
    },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("role {} may not {operation}", .role.label())]
    Unauthorized { role: Role, operation: &'static str },
    #[error("caller identity missing or unknown")]
    Unauthenticated,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl WorkflowError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Stable machine-readable kind for API payloads.
    pub const fn kind(&self) -> &'static str {
        match self {
            WorkflowError::NotFound { .. } => "not_found",
            WorkflowError::InvalidStateTransition { .. } => "invalid_state_transition",
            WorkflowError::DuplicateAssignment { .. } => "duplicate_assignment",
            WorkflowError::DuplicateApplication { .. } => "duplicate_application",
            WorkflowError::AlreadyCompleted(_) => "already_completed",
            WorkflowError::IncompleteDocuments { .. } => "incomplete_documents",
            WorkflowError::DeadlinePassed { .. } => "deadline_passed",
            WorkflowError::Validation(_) => "validation_error",
            WorkflowError::Unauthorized { .. } => "unauthorized",
            WorkflowError::Unauthenticated => "unauthenticated",
            WorkflowError::Repository(_) => "unavailable",
        }
    }
}

impl From<TransitionError> for WorkflowError {
    fn from(value: TransitionError) -> Self {
        Self::InvalidStateTransition {
            from: value.from,
            action: value.action,
        }
    }
}

fn join_documents(missing: &[DocumentKind]) -> String {
    missing
        .iter()
        .map(|kind| kind.label())
        .collect::<Vec<_>>()
        .join(", ")
}
