use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::access::Caller;
use super::clock::{Clock, SystemClock};
use super::criteria::{self, CriteriaAssessment, CriteriaRegistry};
use super::domain::{
    Application, ApplicationDraft, ApplicationId, Decision, Evaluation, EvaluationCompletion,
    EvaluationId, EvaluationReport, JuryAssignment, Listing, ListingId, ListingStatus,
    NewApplication, NewEvaluation, Role, UserId,
};
use super::error::WorkflowError;
use super::lifecycle::WorkflowAction;
use super::policy::WorkflowPolicy;
use super::repository::{
    ApplicationFilter, EvaluationFilter, NotificationPublisher, RecruitmentStore, RepositoryError,
    WorkflowNotice,
};
use super::views::{ApplicationDetail, EvaluationDetail, ReviewSummary};

/// Optimistic commits are re-read and re-validated this many times before giving up.
const MAX_COMMIT_ATTEMPTS: usize = 5;

/// Workflow engine over listings, applications, evaluations and the criterion registry.
///
/// Every mutating call takes the caller explicitly and either commits the whole transition or
/// leaves the store untouched.
pub struct RecruitmentService<S, N> {
    pub(super) store: Arc<S>,
    notifier: Arc<N>,
    pub(super) clock: Arc<dyn Clock>,
    policy: WorkflowPolicy,
    criteria: CriteriaRegistry<S>,
}

impl<S, N> RecruitmentService<S, N>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, policy: WorkflowPolicy) -> Self {
        Self::with_clock(store, notifier, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<S>,
        notifier: Arc<N>,
        policy: WorkflowPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let criteria = CriteriaRegistry::new(store.clone());
        Self {
            store,
            notifier,
            clock,
            policy,
            criteria,
        }
    }

    pub fn policy(&self) -> &WorkflowPolicy {
        &self.policy
    }

    pub fn criteria(&self) -> &CriteriaRegistry<S> {
        &self.criteria
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Create a pending application for the calling candidate.
    pub fn submit_application(
        &self,
        caller: &Caller,
        draft: ApplicationDraft,
    ) -> Result<Application, WorkflowError> {
        caller.require(Role::Candidate, "submit applications")?;
        let ApplicationDraft {
            listing_id,
            documents,
            achievements,
        } = draft;

        let listing = self
            .store
            .get_listing(listing_id)?
            .filter(|listing| !listing.archived)
            .ok_or_else(|| WorkflowError::not_found("listing", listing_id))?;

        let now = self.clock.now();
        if listing.status_at(now) == ListingStatus::Expired {
            return Err(WorkflowError::DeadlinePassed {
                listing_id,
                deadline: listing.deadline,
            });
        }

        let missing = documents.missing();
        if !missing.is_empty() {
            return Err(WorkflowError::IncompleteDocuments { missing });
        }

        let duplicate = WorkflowError::DuplicateApplication {
            candidate_id: caller.user_id,
            listing_id,
        };
        let existing = self.store.list_applications(&ApplicationFilter {
            candidate_id: Some(caller.user_id),
            listing_id: Some(listing_id),
            status: None,
        })?;
        if !existing.is_empty() {
            return Err(duplicate);
        }

        let application = self
            .store
            .create_application(NewApplication {
                candidate_id: caller.user_id,
                listing_id,
                documents,
                achievements,
                apply_date: now,
            })
            .map_err(|err| match err {
                RepositoryError::Conflict => duplicate,
                RepositoryError::NotFound => WorkflowError::not_found("listing", listing_id),
                other => other.into(),
            })?;

        info!(
            application = %application.id,
            candidate = %application.candidate_id,
            listing = %listing_id,
            "application submitted"
        );
        Ok(application)
    }

    /// Put a jury member on an application; the first assignment moves it into review.
    pub fn assign_jury(
        &self,
        caller: &Caller,
        assignment: JuryAssignment,
    ) -> Result<Evaluation, WorkflowError> {
        caller.require(Role::Manager, "assign jury members")?;
        let JuryAssignment {
            application_id,
            jury_member_id,
            deadline,
        } = assignment;

        let mut application = self.load_application(application_id)?;
        application.status.transition(WorkflowAction::AssignJury)?;
        self.store
            .get_jury_member(jury_member_id)?
            .ok_or_else(|| WorkflowError::not_found("jury member", jury_member_id))?;

        let now = self.clock.now();
        let deadline = deadline.unwrap_or_else(|| now + self.policy.default_jury_deadline());
        if deadline <= now {
            return Err(WorkflowError::validation(
                "evaluation deadline must be in the future",
            ));
        }

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let next = application.status.transition(WorkflowAction::AssignJury)?;
            let missing = application.documents.missing();
            if !missing.is_empty() {
                return Err(WorkflowError::IncompleteDocuments { missing });
            }

            let committed = self.store.commit_assignment(
                application.version,
                next,
                NewEvaluation {
                    application_id,
                    jury_member_id,
                    assigned_date: now,
                    deadline,
                },
            );

            match committed {
                Ok((updated, evaluation)) => {
                    info!(
                        application = %application_id,
                        jury_member = %jury_member_id,
                        evaluation = %evaluation.id,
                        from = %application.status,
                        to = %updated.status,
                        "jury member assigned"
                    );
                    self.notify(
                        "jury_assigned",
                        jury_member_id,
                        application_id,
                        [("deadline", deadline.to_rfc3339())],
                    );
                    return Ok(evaluation);
                }
                Err(RepositoryError::StaleVersion) => {
                    debug!(application = %application_id, attempt, "assignment raced, re-reading");
                    application = self.load_application(application_id)?;
                }
                Err(RepositoryError::Conflict) => {
                    warn!(
                        application = %application_id,
                        jury_member = %jury_member_id,
                        "duplicate jury assignment rejected"
                    );
                    return Err(WorkflowError::DuplicateAssignment {
                        application_id,
                        jury_member_id,
                    });
                }
                Err(RepositoryError::NotFound) => {
                    return Err(WorkflowError::not_found("application", application_id))
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(RepositoryError::StaleVersion.into())
    }

    /// Record the assigned jury member's report and verdict. One shot: the result is immutable.
    pub fn submit_evaluation(
        &self,
        caller: &Caller,
        evaluation_id: EvaluationId,
        report: EvaluationReport,
    ) -> Result<Evaluation, WorkflowError> {
        caller.require(Role::Jury, "submit evaluations")?;
        let evaluation = self
            .store
            .get_evaluation(evaluation_id)?
            .ok_or_else(|| WorkflowError::not_found("evaluation", evaluation_id))?;

        if evaluation.jury_member_id != caller.user_id {
            return Err(WorkflowError::Unauthorized {
                role: caller.role,
                operation: "submit another jury member's evaluation",
            });
        }
        if evaluation.is_completed {
            return Err(WorkflowError::AlreadyCompleted(evaluation_id));
        }

        let text = report.report.trim();
        if text.is_empty() {
            return Err(WorkflowError::validation("report must not be empty"));
        }
        let result = report
            .result
            .ok_or_else(|| WorkflowError::validation("result must be positive or negative"))?;

        let completed = self
            .store
            .complete_evaluation(
                evaluation_id,
                EvaluationCompletion {
                    report: text.to_string(),
                    result,
                    completed_date: self.clock.now(),
                },
            )
            .map_err(|err| match err {
                RepositoryError::Conflict => WorkflowError::AlreadyCompleted(evaluation_id),
                RepositoryError::NotFound => WorkflowError::not_found("evaluation", evaluation_id),
                other => other.into(),
            })?;

        info!(
            evaluation = %evaluation_id,
            application = %completed.application_id,
            result = result.label(),
            "evaluation submitted"
        );
        Ok(completed)
    }

    /// Final manager verdict. Terminal: no operation reopens a decided application.
    pub fn decide(
        &self,
        caller: &Caller,
        application_id: ApplicationId,
        decision: Decision,
        notes: Option<String>,
    ) -> Result<Application, WorkflowError> {
        caller.require(Role::Manager, "decide applications")?;
        let notes = normalize_notes(notes);
        let action = WorkflowAction::Decide(decision);
        let mut application = self.load_application(application_id)?;

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let next = application.status.transition(action)?;

            let evaluations = self
                .store
                .list_evaluations(&EvaluationFilter::for_application(application_id))?;
            if evaluations.is_empty() {
                return Err(WorkflowError::InvalidStateTransition {
                    from: application.status,
                    action,
                });
            }
            if self.policy.require_completed_evaluations {
                let open = evaluations.iter().filter(|e| !e.is_completed).count();
                if open > 0 {
                    return Err(WorkflowError::validation(format!(
                        "{open} evaluation(s) still outstanding"
                    )));
                }
            }

            match self.store.update_status(
                application_id,
                application.version,
                next,
                notes.clone(),
                self.clock.now(),
            ) {
                Ok(updated) => {
                    info!(
                        application = %application_id,
                        from = %application.status,
                        to = %updated.status,
                        "application decided"
                    );
                    self.notify(
                        "application_decided",
                        updated.candidate_id,
                        application_id,
                        [("status", updated.status.label().to_string())],
                    );
                    return Ok(updated);
                }
                Err(RepositoryError::StaleVersion) => {
                    debug!(application = %application_id, attempt, "decision raced, re-reading");
                    application = self.load_application(application_id)?;
                }
                Err(RepositoryError::NotFound) => {
                    return Err(WorkflowError::not_found("application", application_id))
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(RepositoryError::StaleVersion.into())
    }

    /// Replace the manager notes without touching the status.
    pub fn annotate(
        &self,
        caller: &Caller,
        application_id: ApplicationId,
        notes: Option<String>,
    ) -> Result<Application, WorkflowError> {
        caller.require(Role::Manager, "annotate applications")?;
        let notes = normalize_notes(notes);
        let mut application = self.load_application(application_id)?;

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            match self.store.update_notes(
                application_id,
                application.version,
                notes.clone(),
                self.clock.now(),
            ) {
                Ok(updated) => {
                    info!(application = %application_id, "manager notes updated");
                    return Ok(updated);
                }
                Err(RepositoryError::StaleVersion) => {
                    debug!(application = %application_id, attempt, "annotation raced, re-reading");
                    application = self.load_application(application_id)?;
                }
                Err(RepositoryError::NotFound) => {
                    return Err(WorkflowError::not_found("application", application_id))
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(RepositoryError::StaleVersion.into())
    }

    /// Advisory criteria check against the listing rank's criterion set.
    pub fn evaluate_criteria(
        &self,
        caller: &Caller,
        application_id: ApplicationId,
    ) -> Result<CriteriaAssessment, WorkflowError> {
        let application = self.visible_application(caller, application_id)?;
        let listing = self.load_listing(application.listing_id)?;
        let criteria = self.criteria.list(Some(listing.position))?;
        Ok(criteria::assess(&application, listing.position, &criteria))
    }

    pub fn applications(
        &self,
        caller: &Caller,
        mut filter: ApplicationFilter,
    ) -> Result<Vec<ApplicationDetail>, WorkflowError> {
        let assigned = match caller.role {
            _ if caller.is_staff() => None,
            Role::Jury => Some(self.assigned_applications(caller.user_id)?),
            _ => {
                filter.candidate_id = Some(caller.user_id);
                None
            }
        };

        self.store
            .list_applications(&filter)?
            .into_iter()
            .filter(|application| {
                assigned
                    .as_ref()
                    .map_or(true, |ids| ids.contains(&application.id))
            })
            .map(|application| self.application_detail(application))
            .collect()
    }

    pub fn application(
        &self,
        caller: &Caller,
        application_id: ApplicationId,
    ) -> Result<ApplicationDetail, WorkflowError> {
        let application = self.visible_application(caller, application_id)?;
        self.application_detail(application)
    }

    pub fn review_summary(
        &self,
        caller: &Caller,
        application_id: ApplicationId,
    ) -> Result<ReviewSummary, WorkflowError> {
        caller.require_any(&[Role::Admin, Role::Manager], "view review summaries")?;
        let application = self.load_application(application_id)?;
        let details = self
            .store
            .list_evaluations(&EvaluationFilter::for_application(application_id))?
            .into_iter()
            .map(|evaluation| self.evaluation_detail(evaluation))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ReviewSummary::from_details(&application, details))
    }

    pub fn evaluations(
        &self,
        caller: &Caller,
        mut filter: EvaluationFilter,
    ) -> Result<Vec<EvaluationDetail>, WorkflowError> {
        caller.require_any(&[Role::Admin, Role::Manager, Role::Jury], "view evaluations")?;
        if !caller.is_staff() {
            filter.jury_member_id = Some(caller.user_id);
        }

        self.store
            .list_evaluations(&filter)?
            .into_iter()
            .map(|evaluation| self.evaluation_detail(evaluation))
            .collect()
    }

    pub fn evaluation(
        &self,
        caller: &Caller,
        evaluation_id: EvaluationId,
    ) -> Result<EvaluationDetail, WorkflowError> {
        caller.require_any(&[Role::Admin, Role::Manager, Role::Jury], "view evaluations")?;
        let evaluation = self
            .store
            .get_evaluation(evaluation_id)?
            .ok_or_else(|| WorkflowError::not_found("evaluation", evaluation_id))?;
        if caller.role == Role::Jury && evaluation.jury_member_id != caller.user_id {
            return Err(WorkflowError::Unauthorized {
                role: caller.role,
                operation: "view another jury member's evaluation",
            });
        }
        self.evaluation_detail(evaluation)
    }

    pub(super) fn load_application(
        &self,
        id: ApplicationId,
    ) -> Result<Application, WorkflowError> {
        self.store
            .get_application(id)?
            .ok_or_else(|| WorkflowError::not_found("application", id))
    }

    pub(super) fn load_listing(&self, id: ListingId) -> Result<Listing, WorkflowError> {
        self.store
            .get_listing(id)?
            .ok_or_else(|| WorkflowError::not_found("listing", id))
    }

    fn assigned_applications(&self, jury_member_id: UserId) -> Result<Vec<ApplicationId>, WorkflowError> {
        Ok(self
            .store
            .list_evaluations(&EvaluationFilter {
                jury_member_id: Some(jury_member_id),
                ..EvaluationFilter::default()
            })?
            .into_iter()
            .map(|evaluation| evaluation.application_id)
            .collect())
    }

    /// Load an application if the caller may see it: staff always, candidates their own,
    /// jury members the ones they are assigned to.
    fn visible_application(
        &self,
        caller: &Caller,
        application_id: ApplicationId,
    ) -> Result<Application, WorkflowError> {
        let application = self.load_application(application_id)?;
        let visible = match caller.role {
            _ if caller.is_staff() => true,
            Role::Jury => self
                .assigned_applications(caller.user_id)?
                .contains(&application_id),
            _ => application.candidate_id == caller.user_id,
        };

        if visible {
            Ok(application)
        } else {
            Err(WorkflowError::Unauthorized {
                role: caller.role,
                operation: "view this application",
            })
        }
    }

    fn user_name(&self, id: UserId) -> Result<String, WorkflowError> {
        Ok(self
            .store
            .get_user(id)?
            .map(|user| user.name)
            .unwrap_or_else(|| "Unknown".to_string()))
    }

    fn application_detail(
        &self,
        application: Application,
    ) -> Result<ApplicationDetail, WorkflowError> {
        let listing = self.load_listing(application.listing_id)?;
        let candidate_name = self.user_name(application.candidate_id)?;
        Ok(ApplicationDetail {
            application,
            listing_position: listing.position.label(),
            listing_faculty: listing.faculty,
            listing_department: listing.department,
            candidate_name,
        })
    }

    fn evaluation_detail(&self, evaluation: Evaluation) -> Result<EvaluationDetail, WorkflowError> {
        let application = self.load_application(evaluation.application_id)?;
        let listing = self.load_listing(application.listing_id)?;
        let jury_name = match self.store.get_jury_member(evaluation.jury_member_id)? {
            Some(member) => member.name,
            None => self.user_name(evaluation.jury_member_id)?,
        };
        Ok(EvaluationDetail {
            overdue: evaluation.is_overdue(self.clock.now()),
            candidate_name: self.user_name(application.candidate_id)?,
            position: listing.position.label(),
            department: listing.department,
            jury_name,
            evaluation,
        })
    }

    /// Delivery is best effort; the transition is already committed.
    fn notify<const K: usize>(
        &self,
        template: &str,
        recipient: UserId,
        application_id: ApplicationId,
        details: [(&str, String); K],
    ) {
        let notice = WorkflowNotice {
            template: template.to_string(),
            recipient,
            application_id,
            details: details
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect::<BTreeMap<_, _>>(),
        };

        if let Err(err) = self.notifier.publish(notice) {
            warn!(%application_id, %recipient, template, error = %err, "notification not delivered");
        }
    }
}

fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
