use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Criterion, CriterionDraft, CriterionId,
    Evaluation, EvaluationCompletion, EvaluationId, JuryMember, Listing, ListingDraft, ListingId,
    ListingRemoval, NewApplication, NewEvaluation, NewUser, PositionRank, Role, User, UserId,
};
use super::repository::{
    ApplicationFilter, ApplicationStore, CriteriaStore, EvaluationFilter, EvaluationStore,
    JuryDirectory, ListingFilter, ListingStore, RecruitmentStore, RepositoryError, UserDirectory,
};

#[derive(Debug, Default)]
struct MemoryState {
    sequence: u64,
    users: BTreeMap<UserId, User>,
    listings: BTreeMap<ListingId, Listing>,
    applications: BTreeMap<ApplicationId, Application>,
    evaluations: BTreeMap<EvaluationId, Evaluation>,
    criteria: BTreeMap<CriterionId, Criterion>,
    jury: BTreeMap<UserId, JuryMember>,
}

impl MemoryState {
    fn next_id(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    fn has_applications(&self, listing_id: ListingId) -> bool {
        self.applications
            .values()
            .any(|application| application.listing_id == listing_id)
    }

    fn live_listing(&self, id: ListingId) -> Option<&Listing> {
        self.listings.get(&id).filter(|listing| !listing.archived)
    }
}

/// Process-local store guarded by a single mutex, so every trait call is atomic.
///
/// Used for development, tests and as the stub data source when the backend is unavailable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with one account per role, the default criterion sets and an open listing.
    pub fn seeded(now: DateTime<Utc>) -> Result<Self, RepositoryError> {
        let store = Self::new();

        let accounts = [
            ("10000000001", "Site Administrator", "admin@example.edu", Role::Admin),
            ("10000000002", "Faculty Manager", "manager@example.edu", Role::Manager),
            ("10000000003", "Prof. Jury Member", "jury@example.edu", Role::Jury),
            ("10000000004", "Sample Candidate", "candidate@example.edu", Role::Candidate),
        ];
        let mut admin = None;
        for (national_id, name, email, role) in accounts {
            let user = store.create_user(NewUser {
                national_id: national_id.to_string(),
                name: name.to_string(),
                email: email.to_string(),
                role,
                created_at: now,
            })?;
            match role {
                Role::Admin => admin = Some(user.id),
                Role::Jury => {
                    store.add_jury_member(JuryMember {
                        id: user.id,
                        national_id: user.national_id.clone(),
                        name: user.name.clone(),
                        email: user.email.clone(),
                        department: Some("Computer Engineering".to_string()),
                        faculty: Some("Engineering".to_string()),
                        university: Some("State University".to_string()),
                    })?;
                }
                Role::Manager | Role::Candidate => {}
            }
        }

        for draft in default_criteria() {
            store.create_criterion(draft)?;
        }

        store.create_listing(
            ListingDraft {
                position: PositionRank::AssistantProfessor,
                faculty: "Engineering".to_string(),
                department: "Computer Engineering".to_string(),
                publish_date: now,
                deadline: now + Duration::days(30),
                description: Some("Open position in distributed systems".to_string()),
                requirements: Some("PhD in computer science or a related field".to_string()),
            },
            admin.ok_or(RepositoryError::NotFound)?,
            now,
        )?;

        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("memory store mutex poisoned".to_string()))
    }
}

/// Publication thresholds per rank: A1-A5 articles, A1/A2 articles, A1-A4 articles, lead author.
fn default_criteria() -> Vec<CriterionDraft> {
    let thresholds = [
        (PositionRank::AssistantProfessor, [4, 1, 3, 1]),
        (PositionRank::AssociateProfessor, [8, 3, 5, 3]),
        (PositionRank::Professor, [12, 5, 8, 5]),
    ];

    thresholds
        .into_iter()
        .flat_map(|(rank, counts)| {
            let names = [
                ("A1-A5 publications", "articles indexed in categories A1 to A5"),
                ("A1 or A2 publications", "articles indexed in categories A1 or A2"),
                ("A1-A4 publications", "articles indexed in categories A1 to A4"),
                ("Lead author", "articles with the candidate as lead author"),
            ];
            names
                .into_iter()
                .zip(counts)
                .map(move |((name, scope), min_count)| CriterionDraft {
                    rank,
                    name: name.to_string(),
                    description: Some(format!("At least {min_count} {scope}.")),
                    required: true,
                    min_count,
                })
        })
        .collect()
}

impl ListingStore for MemoryStore {
    fn get_listing(&self, id: ListingId) -> Result<Option<Listing>, RepositoryError> {
        Ok(self.lock()?.listings.get(&id).cloned())
    }

    fn list_listings(&self, filter: &ListingFilter) -> Result<Vec<Listing>, RepositoryError> {
        Ok(self
            .lock()?
            .listings
            .values()
            .filter(|listing| filter.matches(listing))
            .cloned()
            .collect())
    }

    fn create_listing(
        &self,
        draft: ListingDraft,
        created_by: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<Listing, RepositoryError> {
        let mut state = self.lock()?;
        let id = ListingId(state.next_id());
        let listing = Listing {
            id,
            position: draft.position,
            faculty: draft.faculty,
            department: draft.department,
            publish_date: draft.publish_date,
            deadline: draft.deadline,
            description: draft.description,
            requirements: draft.requirements,
            created_by,
            created_at,
            updated_at: None,
            archived: false,
        };
        state.listings.insert(id, listing.clone());
        Ok(listing)
    }

    fn update_listing(
        &self,
        listing: Listing,
        locked_once_applied: bool,
    ) -> Result<Listing, RepositoryError> {
        let mut state = self.lock()?;
        if state.live_listing(listing.id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        if locked_once_applied && state.has_applications(listing.id) {
            return Err(RepositoryError::Conflict);
        }

        let listing = Listing {
            archived: false,
            ..listing
        };
        state.listings.insert(listing.id, listing.clone());
        Ok(listing)
    }

    fn remove_listing(
        &self,
        id: ListingId,
        at: DateTime<Utc>,
    ) -> Result<ListingRemoval, RepositoryError> {
        let mut state = self.lock()?;
        if state.live_listing(id).is_none() {
            return Err(RepositoryError::NotFound);
        }

        if state.has_applications(id) {
            let listing = state.listings.get_mut(&id).ok_or(RepositoryError::NotFound)?;
            listing.archived = true;
            listing.updated_at = Some(at);
            Ok(ListingRemoval::Archived)
        } else {
            state.listings.remove(&id);
            Ok(ListingRemoval::Deleted)
        }
    }
}

impl ApplicationStore for MemoryStore {
    fn get_application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.lock()?.applications.get(&id).cloned())
    }

    fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .lock()?
            .applications
            .values()
            .filter(|application| filter.matches(application))
            .cloned()
            .collect())
    }

    fn create_application(
        &self,
        application: NewApplication,
    ) -> Result<Application, RepositoryError> {
        let mut state = self.lock()?;
        if state.live_listing(application.listing_id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        let duplicate = state.applications.values().any(|existing| {
            existing.candidate_id == application.candidate_id
                && existing.listing_id == application.listing_id
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }

        let id = ApplicationId(state.next_id());
        let record = Application {
            id,
            candidate_id: application.candidate_id,
            listing_id: application.listing_id,
            status: ApplicationStatus::Pending,
            documents: application.documents,
            achievements: application.achievements,
            manager_notes: None,
            apply_date: application.apply_date,
            updated_at: None,
            version: 0,
        };
        state.applications.insert(id, record.clone());
        Ok(record)
    }

    fn update_status(
        &self,
        id: ApplicationId,
        expected_version: u64,
        status: ApplicationStatus,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Application, RepositoryError> {
        let mut state = self.lock()?;
        let record = state
            .applications
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        if record.version != expected_version {
            return Err(RepositoryError::StaleVersion);
        }

        record.status = status;
        if notes.is_some() {
            record.manager_notes = notes;
        }
        record.updated_at = Some(at);
        record.version += 1;
        Ok(record.clone())
    }

    fn update_notes(
        &self,
        id: ApplicationId,
        expected_version: u64,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Application, RepositoryError> {
        let mut state = self.lock()?;
        let record = state
            .applications
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        if record.version != expected_version {
            return Err(RepositoryError::StaleVersion);
        }

        record.manager_notes = notes;
        record.updated_at = Some(at);
        record.version += 1;
        Ok(record.clone())
    }
}

impl EvaluationStore for MemoryStore {
    fn get_evaluation(&self, id: EvaluationId) -> Result<Option<Evaluation>, RepositoryError> {
        Ok(self.lock()?.evaluations.get(&id).cloned())
    }

    fn list_evaluations(
        &self,
        filter: &EvaluationFilter,
    ) -> Result<Vec<Evaluation>, RepositoryError> {
        Ok(self
            .lock()?
            .evaluations
            .values()
            .filter(|evaluation| filter.matches(evaluation))
            .cloned()
            .collect())
    }

    fn complete_evaluation(
        &self,
        id: EvaluationId,
        completion: EvaluationCompletion,
    ) -> Result<Evaluation, RepositoryError> {
        let mut state = self.lock()?;
        let record = state
            .evaluations
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        if record.is_completed {
            return Err(RepositoryError::Conflict);
        }

        record.report = Some(completion.report);
        record.result = Some(completion.result);
        record.is_completed = true;
        record.completed_date = Some(completion.completed_date);
        Ok(record.clone())
    }
}

impl CriteriaStore for MemoryStore {
    fn get_criterion(&self, id: CriterionId) -> Result<Option<Criterion>, RepositoryError> {
        Ok(self.lock()?.criteria.get(&id).cloned())
    }

    fn list_criteria(&self, rank: Option<PositionRank>) -> Result<Vec<Criterion>, RepositoryError> {
        Ok(self
            .lock()?
            .criteria
            .values()
            .filter(|criterion| rank.map_or(true, |rank| criterion.rank == rank))
            .cloned()
            .collect())
    }

    fn create_criterion(&self, draft: CriterionDraft) -> Result<Criterion, RepositoryError> {
        let mut state = self.lock()?;
        let id = CriterionId(state.next_id());
        let criterion = Criterion {
            id,
            rank: draft.rank,
            name: draft.name,
            description: draft.description,
            required: draft.required,
            min_count: draft.min_count,
        };
        state.criteria.insert(id, criterion.clone());
        Ok(criterion)
    }

    fn update_criterion(&self, criterion: Criterion) -> Result<Criterion, RepositoryError> {
        let mut state = self.lock()?;
        match state.criteria.get_mut(&criterion.id) {
            Some(slot) => {
                *slot = criterion.clone();
                Ok(criterion)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn delete_criterion(&self, id: CriterionId) -> Result<(), RepositoryError> {
        self.lock()?
            .criteria
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

impl JuryDirectory for MemoryStore {
    fn get_jury_member(&self, id: UserId) -> Result<Option<JuryMember>, RepositoryError> {
        Ok(self.lock()?.jury.get(&id).cloned())
    }

    fn list_jury(&self) -> Result<Vec<JuryMember>, RepositoryError> {
        Ok(self.lock()?.jury.values().cloned().collect())
    }

    fn add_jury_member(&self, member: JuryMember) -> Result<JuryMember, RepositoryError> {
        let mut state = self.lock()?;
        if state.jury.contains_key(&member.id) {
            return Err(RepositoryError::Conflict);
        }
        state.jury.insert(member.id, member.clone());
        Ok(member)
    }

    fn remove_jury_member(&self, id: UserId) -> Result<(), RepositoryError> {
        self.lock()?
            .jury
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

impl UserDirectory for MemoryStore {
    fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.lock()?.users.values().cloned().collect())
    }

    fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut state = self.lock()?;
        let taken = state.users.values().any(|existing| {
            existing.national_id == user.national_id
                || existing.email.eq_ignore_ascii_case(&user.email)
        });
        if taken {
            return Err(RepositoryError::Conflict);
        }

        let id = UserId(state.next_id());
        let record = User {
            id,
            national_id: user.national_id,
            name: user.name,
            email: user.email,
            role: user.role,
            phone: None,
            address: None,
            created_at: user.created_at,
            updated_at: None,
        };
        state.users.insert(id, record.clone());
        Ok(record)
    }

    fn update_user(&self, user: User) -> Result<User, RepositoryError> {
        let mut state = self.lock()?;
        if !state.users.contains_key(&user.id) {
            return Err(RepositoryError::NotFound);
        }
        let taken = state.users.values().any(|existing| {
            existing.id != user.id && existing.email.eq_ignore_ascii_case(&user.email)
        });
        if taken {
            return Err(RepositoryError::Conflict);
        }

        if let Some(member) = state.jury.get_mut(&user.id) {
            member.name = user.name.clone();
            member.email = user.email.clone();
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn delete_user(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if !state.users.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        let referenced = state
            .applications
            .values()
            .any(|application| application.candidate_id == id)
            || state
                .evaluations
                .values()
                .any(|evaluation| evaluation.jury_member_id == id);
        if referenced {
            return Err(RepositoryError::Conflict);
        }

        state.jury.remove(&id);
        state.users.remove(&id);
        Ok(())
    }
}

impl RecruitmentStore for MemoryStore {
    fn commit_assignment(
        &self,
        expected_version: u64,
        status: ApplicationStatus,
        evaluation: NewEvaluation,
    ) -> Result<(Application, Evaluation), RepositoryError> {
        let mut state = self.lock()?;

        let current = state
            .applications
            .get(&evaluation.application_id)
            .ok_or(RepositoryError::NotFound)?;
        if current.version != expected_version {
            return Err(RepositoryError::StaleVersion);
        }

        let duplicate = state.evaluations.values().any(|existing| {
            existing.application_id == evaluation.application_id
                && existing.jury_member_id == evaluation.jury_member_id
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }

        let id = EvaluationId(state.next_id());
        let record = Evaluation {
            id,
            application_id: evaluation.application_id,
            jury_member_id: evaluation.jury_member_id,
            assigned_date: evaluation.assigned_date,
            deadline: evaluation.deadline,
            report: None,
            result: None,
            is_completed: false,
            completed_date: None,
        };
        state.evaluations.insert(id, record.clone());

        let application = state
            .applications
            .get_mut(&evaluation.application_id)
            .ok_or(RepositoryError::NotFound)?;
        application.status = status;
        application.updated_at = Some(evaluation.assigned_date);
        application.version += 1;

        Ok((application.clone(), record))
    }
}
