use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Criterion, CriterionDraft, CriterionId,
    Evaluation, EvaluationCompletion, EvaluationId, JuryMember, Listing, ListingDraft, ListingId,
    ListingRemoval, NewApplication, NewEvaluation, NewUser, PositionRank, User, UserId,
};

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record was modified concurrently")]
    StaleVersion,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingFilter {
    #[serde(default)]
    pub include_archived: bool,
}

impl ListingFilter {
    pub fn matches(&self, listing: &Listing) -> bool {
        self.include_archived || !listing.archived
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationFilter {
    #[serde(default)]
    pub candidate_id: Option<UserId>,
    #[serde(default)]
    pub listing_id: Option<ListingId>,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
}

impl ApplicationFilter {
    pub fn matches(&self, application: &Application) -> bool {
        self.candidate_id
            .map_or(true, |id| application.candidate_id == id)
            && self
                .listing_id
                .map_or(true, |id| application.listing_id == id)
            && self.status.map_or(true, |status| application.status == status)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationFilter {
    #[serde(default)]
    pub application_id: Option<ApplicationId>,
    #[serde(default)]
    pub jury_member_id: Option<UserId>,
    #[serde(default)]
    pub is_completed: Option<bool>,
}

impl EvaluationFilter {
    pub fn for_application(application_id: ApplicationId) -> Self {
        Self {
            application_id: Some(application_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, evaluation: &Evaluation) -> bool {
        self.application_id
            .map_or(true, |id| evaluation.application_id == id)
            && self
                .jury_member_id
                .map_or(true, |id| evaluation.jury_member_id == id)
            && self
                .is_completed
                .map_or(true, |done| evaluation.is_completed == done)
    }
}

pub trait ListingStore: Send + Sync {
    fn get_listing(&self, id: ListingId) -> Result<Option<Listing>, RepositoryError>;
    fn list_listings(&self, filter: &ListingFilter) -> Result<Vec<Listing>, RepositoryError>;
    fn create_listing(
        &self,
        draft: ListingDraft,
        created_by: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<Listing, RepositoryError>;
    /// Replace a live listing. Archived listings read as `NotFound`.
    ///
    /// With `locked_once_applied` set the write fails with `Conflict` if any application
    /// references the listing; the check and the write happen under the same guard.
    fn update_listing(
        &self,
        listing: Listing,
        locked_once_applied: bool,
    ) -> Result<Listing, RepositoryError>;
    /// Hard delete when no application references the listing, archive it otherwise.
    fn remove_listing(
        &self,
        id: ListingId,
        at: DateTime<Utc>,
    ) -> Result<ListingRemoval, RepositoryError>;
}

pub trait ApplicationStore: Send + Sync {
    fn get_application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError>;
    /// Fails with `NotFound` when the listing is gone or archived and with `Conflict` when the
    /// candidate already applied to it.
    fn create_application(&self, application: NewApplication)
        -> Result<Application, RepositoryError>;
    /// Compare-and-set on `Application::version`; fails with `StaleVersion` when it moved.
    fn update_status(
        &self,
        id: ApplicationId,
        expected_version: u64,
        status: ApplicationStatus,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Application, RepositoryError>;
    /// Compare-and-set like `update_status`; the status is left as is.
    fn update_notes(
        &self,
        id: ApplicationId,
        expected_version: u64,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Application, RepositoryError>;
}

pub trait EvaluationStore: Send + Sync {
    fn get_evaluation(&self, id: EvaluationId) -> Result<Option<Evaluation>, RepositoryError>;
    fn list_evaluations(&self, filter: &EvaluationFilter)
        -> Result<Vec<Evaluation>, RepositoryError>;
    /// Fails with `Conflict` if the evaluation was already completed.
    fn complete_evaluation(
        &self,
        id: EvaluationId,
        completion: EvaluationCompletion,
    ) -> Result<Evaluation, RepositoryError>;
}

pub trait CriteriaStore: Send + Sync {
    fn get_criterion(&self, id: CriterionId) -> Result<Option<Criterion>, RepositoryError>;
    fn list_criteria(&self, rank: Option<PositionRank>) -> Result<Vec<Criterion>, RepositoryError>;
    fn create_criterion(&self, draft: CriterionDraft) -> Result<Criterion, RepositoryError>;
    fn update_criterion(&self, criterion: Criterion) -> Result<Criterion, RepositoryError>;
    fn delete_criterion(&self, id: CriterionId) -> Result<(), RepositoryError>;
}

pub trait JuryDirectory: Send + Sync {
    fn get_jury_member(&self, id: UserId) -> Result<Option<JuryMember>, RepositoryError>;
    fn list_jury(&self) -> Result<Vec<JuryMember>, RepositoryError>;
    fn add_jury_member(&self, member: JuryMember) -> Result<JuryMember, RepositoryError>;
    fn remove_jury_member(&self, id: UserId) -> Result<(), RepositoryError>;
}

pub trait UserDirectory: Send + Sync {
    fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    fn list_users(&self) -> Result<Vec<User>, RepositoryError>;
    /// Fails with `Conflict` when the national id or e-mail is taken.
    fn create_user(&self, user: NewUser) -> Result<User, RepositoryError>;
    /// Fails with `Conflict` when the new e-mail belongs to another account.
    /// The jury directory entry, if any, follows the name and e-mail.
    fn update_user(&self, user: User) -> Result<User, RepositoryError>;
    /// Fails with `Conflict` while applications or evaluations reference the account.
    fn delete_user(&self, id: UserId) -> Result<(), RepositoryError>;
}

/// Full storage surface used by the workflow engine, including its one multi-entity unit of work.
pub trait RecruitmentStore:
    ListingStore + ApplicationStore + EvaluationStore + CriteriaStore + JuryDirectory + UserDirectory
{
    /// Insert an evaluation and move the application to `status` as one atomic step.
    ///
    /// Fails with `StaleVersion` if the application changed since `expected_version` was read
    /// and with `Conflict` if the (application, jury member) pair already has an evaluation.
    fn commit_assignment(
        &self,
        expected_version: u64,
        status: ApplicationStatus,
        evaluation: NewEvaluation,
    ) -> Result<(Application, Evaluation), RepositoryError>;
}

/// Outbound hook for assignment and decision notices (e-mail, portal inbox, ...).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notice: WorkflowNotice) -> Result<(), NotificationError>;
}

/// Notice payload handed to the publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowNotice {
    pub template: String,
    pub recipient: UserId,
    pub application_id: ApplicationId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
