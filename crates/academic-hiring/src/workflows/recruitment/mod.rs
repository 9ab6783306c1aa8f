//! Academic position recruitment: listings, candidate applications, jury evaluations and
//! the manager decision that closes each application.
//!
//! `service` owns every state change. Stores implement the traits in `repository`;
//! `memory` provides the process-local implementation used for development and tests.

pub mod access;
pub mod catalog;
pub mod clock;
pub mod criteria;
pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod policy;
pub mod repository;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use access::Caller;
pub use clock::{Clock, FixedClock, SystemClock};
pub use criteria::{CriteriaAssessment, CriteriaRegistry, CriterionCheck};
pub use domain::{
    Application, ApplicationDraft, ApplicationId, ApplicationStatus, Criterion, CriterionDraft,
    CriterionId, CriterionUpdate, Decision, DocumentKind, Evaluation, EvaluationId,
    EvaluationReport, EvaluationResult, JuryAssignment, JuryMember, JuryMemberDraft, Listing,
    ListingDraft, ListingId, ListingRemoval, ListingStatus, ListingUpdate, PositionRank,
    ProfileUpdate, Registration, Role, SubmittedDocuments, User, UserId,
};
pub use error::WorkflowError;
pub use lifecycle::WorkflowAction;
pub use memory::MemoryStore;
pub use policy::WorkflowPolicy;
pub use repository::{
    ApplicationFilter, EvaluationFilter, NotificationError, NotificationPublisher,
    RecruitmentStore, RepositoryError, WorkflowNotice,
};
pub use router::{recruitment_router, CALLER_HEADER};
pub use service::RecruitmentService;
pub use views::{ApplicationDetail, EvaluationDetail, ListingView, ReviewSummary};
