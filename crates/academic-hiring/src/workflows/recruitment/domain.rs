use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifier of an authenticated actor; jury members share the id of their user account.
    UserId,
    "user"
);
numeric_id!(
    /// Identifier of a published position opening.
    ListingId,
    "listing"
);
numeric_id!(
    /// Identifier of a candidate submission.
    ApplicationId,
    "application"
);
numeric_id!(
    /// Identifier of a single jury assessment.
    EvaluationId,
    "evaluation"
);
numeric_id!(
    /// Identifier of a rank-scoped eligibility requirement.
    CriterionId,
    "criterion"
);

/// Role carried by every user; fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Candidate,
    Admin,
    Manager,
    Jury,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Candidate => "candidate",
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Jury => "jury",
        }
    }
}

/// Academic rank advertised by a listing. All listings of one rank share a criterion set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionRank {
    AssistantProfessor,
    AssociateProfessor,
    Professor,
}

impl PositionRank {
    pub const fn ordered() -> [Self; 3] {
        [
            Self::AssistantProfessor,
            Self::AssociateProfessor,
            Self::Professor,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::AssistantProfessor => "Assistant Professor",
            Self::AssociateProfessor => "Associate Professor",
            Self::Professor => "Professor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub national_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Self-service sign-up payload. Registration always yields a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub national_id: String,
    pub name: String,
    pub email: String,
}

/// Store input for a user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub national_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Profile fields a user may change on their own account, or an admin on any account.
/// Role and national id are fixed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Derived availability of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Active,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub position: PositionRank,
    pub faculty: String,
    pub department: String,
    pub publish_date: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Set when the listing was deleted while applications referenced it.
    #[serde(default)]
    pub archived: bool,
}

impl Listing {
    pub fn status_at(&self, now: DateTime<Utc>) -> ListingStatus {
        if now < self.deadline {
            ListingStatus::Active
        } else {
            ListingStatus::Expired
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub position: PositionRank,
    pub faculty: String,
    pub department: String,
    pub publish_date: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Option<String>,
}

/// Partial listing update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingUpdate {
    #[serde(default)]
    pub position: Option<PositionRank>,
    #[serde(default)]
    pub faculty: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub publish_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Option<String>,
}

impl ListingUpdate {
    /// True when the update touches anything other than the deadline.
    pub fn touches_locked_fields(&self) -> bool {
        self.position.is_some()
            || self.faculty.is_some()
            || self.department.is_some()
            || self.publish_date.is_some()
            || self.description.is_some()
            || self.requirements.is_some()
    }
}

/// What removing a listing did with the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingRemoval {
    Deleted,
    /// Applications still reference the listing, so it was hidden instead.
    Archived,
}

/// Document types a candidate must attach before a submission is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Cv,
    Diploma,
    Publications,
    Citations,
    Conferences,
}

impl DocumentKind {
    pub const fn required() -> [Self; 5] {
        [
            Self::Cv,
            Self::Diploma,
            Self::Publications,
            Self::Citations,
            Self::Conferences,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Cv => "cv",
            Self::Diploma => "diploma",
            Self::Publications => "publications",
            Self::Citations => "citations",
            Self::Conferences => "conferences",
        }
    }
}

/// Storage paths of the attached documents keyed by type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmittedDocuments(pub BTreeMap<DocumentKind, String>);

impl SubmittedDocuments {
    pub fn attach(mut self, kind: DocumentKind, path: impl Into<String>) -> Self {
        self.0.insert(kind, path.into());
        self
    }

    pub fn path(&self, kind: DocumentKind) -> Option<&str> {
        self.0
            .get(&kind)
            .map(String::as_str)
            .filter(|path| !path.trim().is_empty())
    }

    /// Required document types that are absent or blank.
    pub fn missing(&self) -> Vec<DocumentKind> {
        DocumentKind::required()
            .into_iter()
            .filter(|kind| self.path(*kind).is_none())
            .collect()
    }
}

/// Lifecycle state of an application. See `lifecycle` for the allowed moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    InReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::InReview => "in_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub candidate_id: UserId,
    pub listing_id: ListingId,
    pub status: ApplicationStatus,
    pub documents: SubmittedDocuments,
    /// Candidate-declared counts per criterion of the listing's rank.
    pub achievements: BTreeMap<CriterionId, u32>,
    pub manager_notes: Option<String>,
    pub apply_date: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency token, bumped on every status change.
    pub version: u64,
}

/// Candidate submission payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDraft {
    pub listing_id: ListingId,
    pub documents: SubmittedDocuments,
    #[serde(default)]
    pub achievements: BTreeMap<CriterionId, u32>,
}

/// Store input for a new application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub candidate_id: UserId,
    pub listing_id: ListingId,
    pub documents: SubmittedDocuments,
    pub achievements: BTreeMap<CriterionId, u32>,
    pub apply_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationResult {
    Positive,
    Negative,
}

impl EvaluationResult {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub application_id: ApplicationId,
    pub jury_member_id: UserId,
    pub assigned_date: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub report: Option<String>,
    pub result: Option<EvaluationResult>,
    pub is_completed: bool,
    pub completed_date: Option<DateTime<Utc>>,
}

impl Evaluation {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed && now >= self.deadline
    }
}

/// Manager request to put a jury member on an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JuryAssignment {
    pub application_id: ApplicationId,
    pub jury_member_id: UserId,
    /// Falls back to the configured default offset when omitted.
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

/// Store input for a new evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvaluation {
    pub application_id: ApplicationId,
    pub jury_member_id: UserId,
    pub assigned_date: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
}

/// Jury verdict payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub report: String,
    #[serde(default)]
    pub result: Option<EvaluationResult>,
}

/// Final values written when an evaluation is completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationCompletion {
    pub report: String,
    pub result: EvaluationResult,
    pub completed_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JuryMember {
    pub id: UserId,
    pub national_id: String,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub faculty: Option<String>,
    pub university: Option<String>,
}

/// Manager payload enrolling an existing jury-role user in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JuryMemberDraft {
    pub user_id: UserId,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub faculty: Option<String>,
    #[serde(default)]
    pub university: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: CriterionId,
    pub rank: PositionRank,
    pub name: String,
    pub description: Option<String>,
    pub required: bool,
    pub min_count: u32,
}

fn default_required() -> bool {
    true
}

fn default_min_count() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionDraft {
    pub rank: PositionRank,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default = "default_min_count")]
    pub min_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub min_count: Option<u32>,
}

/// Manager verdict on an application under review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub const fn outcome(self) -> ApplicationStatus {
        match self {
            Decision::Approve => ApplicationStatus::Approved,
            Decision::Reject => ApplicationStatus::Rejected,
        }
    }
}

/// National identifiers are exactly eleven ASCII digits.
pub fn is_valid_national_id(value: &str) -> bool {
    value.len() == 11 && value.bytes().all(|byte| byte.is_ascii_digit())
}
