use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::recruitment::domain::{
    ApplicationDraft, CriterionDraft, DocumentKind, JuryMember, ListingDraft, ListingId, NewUser,
    PositionRank, Role, SubmittedDocuments,
};
use crate::workflows::recruitment::repository::{
    CriteriaStore, JuryDirectory, ListingStore, NotificationError, NotificationPublisher, UserDirectory,
    WorkflowNotice,
};
use crate::workflows::recruitment::{
    recruitment_router, Application, ApplicationId, Caller, Evaluation,
    FixedClock, JuryAssignment, MemoryStore, RecruitmentService, WorkflowPolicy,
};

pub(super) type TestService = RecruitmentService<MemoryStore, RecordingNotifier>;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

pub(super) fn complete_documents() -> SubmittedDocuments {
    DocumentKind::required()
        .into_iter()
        .fold(SubmittedDocuments::default(), |documents, kind| {
            documents.attach(kind, format!("uploads/candidate-4/{}.pdf", kind.label()))
        })
}

pub(super) fn draft(listing_id: ListingId) -> ApplicationDraft {
    ApplicationDraft {
        listing_id,
        documents: complete_documents(),
        achievements: Default::default(),
    }
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    notices: Mutex<Vec<WorkflowNotice>>,
    offline: bool,
}

impl RecordingNotifier {
    pub(super) fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub(super) fn notices(&self) -> Vec<WorkflowNotice> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationPublisher for RecordingNotifier {
    fn publish(&self, notice: WorkflowNotice) -> Result<(), NotificationError> {
        if self.offline {
            return Err(NotificationError::Transport("smtp relay offline".to_string()));
        }
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

/// One account per role, a jury directory entry, two assistant professor criteria and an
/// open listing, all stored before the service is built.
pub(super) struct Harness {
    pub(super) service: TestService,
    pub(super) store: Arc<MemoryStore>,
    pub(super) notifier: Arc<RecordingNotifier>,
    pub(super) admin: Caller,
    pub(super) manager: Caller,
    pub(super) jury: Caller,
    pub(super) candidate: Caller,
    pub(super) listing_id: ListingId,
}

pub(super) fn harness() -> Harness {
    harness_with(WorkflowPolicy::default(), RecordingNotifier::default())
}

pub(super) fn harness_with(policy: WorkflowPolicy, notifier: RecordingNotifier) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(notifier);

    let admin = account(&store, "10000000001", "Ada Admin", Role::Admin);
    let manager = account(&store, "10000000002", "Mina Manager", Role::Manager);
    let jury = jury_account(&store, "10000000003", "Prof. Jale Jury");
    let candidate = account(&store, "10000000004", "Cem Candidate", Role::Candidate);

    let listing = store
        .create_listing(
            ListingDraft {
                position: PositionRank::AssistantProfessor,
                faculty: "Engineering".to_string(),
                department: "Computer Engineering".to_string(),
                publish_date: now() - Duration::days(1),
                deadline: now() + Duration::days(30),
                description: None,
                requirements: None,
            },
            admin.user_id,
            now(),
        )
        .expect("listing stored");

    for (name, min_count) in [("Indexed publications", 4), ("Lead author", 1)] {
        store
            .create_criterion(CriterionDraft {
                rank: PositionRank::AssistantProfessor,
                name: name.to_string(),
                description: None,
                required: true,
                min_count,
            })
            .expect("criterion stored");
    }

    let service = RecruitmentService::with_clock(
        store.clone(),
        notifier.clone(),
        policy,
        Arc::new(FixedClock(now())),
    );

    Harness {
        service,
        store,
        notifier,
        admin,
        manager,
        jury,
        candidate,
        listing_id: listing.id,
    }
}

pub(super) fn account(store: &MemoryStore, national_id: &str, name: &str, role: Role) -> Caller {
    let user = store
        .create_user(NewUser {
            national_id: national_id.to_string(),
            name: name.to_string(),
            email: format!("{national_id}@example.edu"),
            role,
            created_at: now(),
        })
        .expect("user stored");
    Caller::new(user.id, user.role)
}

pub(super) fn jury_account(store: &MemoryStore, national_id: &str, name: &str) -> Caller {
    let caller = account(store, national_id, name, Role::Jury);
    store
        .add_jury_member(JuryMember {
            id: caller.user_id,
            national_id: national_id.to_string(),
            name: name.to_string(),
            email: format!("{national_id}@example.edu"),
            department: Some("Computer Engineering".to_string()),
            faculty: Some("Engineering".to_string()),
            university: None,
        })
        .expect("jury member stored");
    caller
}

impl Harness {
    /// Service over the same store and notifier whose clock reads `at`.
    pub(super) fn service_at(&self, at: DateTime<Utc>) -> TestService {
        RecruitmentService::with_clock(
            self.store.clone(),
            self.notifier.clone(),
            self.service.policy().clone(),
            Arc::new(FixedClock(at)),
        )
    }

    pub(super) fn submit(&self) -> Application {
        self.service
            .submit_application(&self.candidate, draft(self.listing_id))
            .expect("application accepted")
    }

    pub(super) fn assign(&self, application_id: ApplicationId, jury: &Caller) -> Evaluation {
        self.service
            .assign_jury(
                &self.manager,
                JuryAssignment {
                    application_id,
                    jury_member_id: jury.user_id,
                    deadline: Some(now() + Duration::days(14)),
                },
            )
            .expect("jury assigned")
    }

    pub(super) fn second_jury(&self) -> Caller {
        jury_account(&self.store, "10000000005", "Prof. Deniz Second")
    }

    pub(super) fn second_candidate(&self) -> Caller {
        account(&self.store, "10000000006", "Ece Other", Role::Candidate)
    }

    pub(super) fn router(self) -> axum::Router {
        recruitment_router(Arc::new(self.service))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
