use serde::Serialize;

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Evaluation, EvaluationResult, Listing,
    ListingStatus,
};

/// Listing with its derived status and the number of applications received.
#[derive(Debug, Clone, Serialize)]
pub struct ListingView {
    #[serde(flatten)]
    pub listing: Listing,
    pub status: ListingStatus,
    pub applications_count: usize,
}

/// Application joined with the listing and candidate fields shown in tables.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: Application,
    pub listing_position: &'static str,
    pub listing_faculty: String,
    pub listing_department: String,
    pub candidate_name: String,
}

/// Evaluation joined with candidate, position and jury names.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationDetail {
    #[serde(flatten)]
    pub evaluation: Evaluation,
    pub candidate_name: String,
    pub position: &'static str,
    pub department: String,
    pub jury_name: String,
    pub overdue: bool,
}

/// Manager overview of where the jury stands on one application.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewSummary {
    pub application_id: ApplicationId,
    pub status: ApplicationStatus,
    pub assigned: usize,
    pub completed: usize,
    pub pending: usize,
    pub positive: usize,
    pub negative: usize,
    /// Every assigned jury member has reported.
    pub settled: bool,
    pub evaluations: Vec<EvaluationDetail>,
}

impl ReviewSummary {
    pub fn from_details(application: &Application, evaluations: Vec<EvaluationDetail>) -> Self {
        let count_result = |wanted: EvaluationResult| {
            evaluations
                .iter()
                .filter(|detail| detail.evaluation.result == Some(wanted))
                .count()
        };
        let positive = count_result(EvaluationResult::Positive);
        let negative = count_result(EvaluationResult::Negative);
        let completed = evaluations
            .iter()
            .filter(|detail| detail.evaluation.is_completed)
            .count();

        Self {
            application_id: application.id,
            status: application.status,
            assigned: evaluations.len(),
            completed,
            pending: evaluations.len() - completed,
            positive,
            negative,
            settled: !evaluations.is_empty() && completed == evaluations.len(),
            evaluations,
        }
    }
}
