use super::common::*;
use chrono::Duration;

use crate::workflows::recruitment::domain::{
    ApplicationStatus, Decision, DocumentKind, EvaluationReport, EvaluationResult, JuryAssignment,
    JuryMemberDraft, ListingDraft, ListingStatus, ListingUpdate, PositionRank, ProfileUpdate,
    Registration, Role, SubmittedDocuments, UserId,
};
use crate::workflows::recruitment::repository::{
    ApplicationFilter, ApplicationStore, EvaluationFilter, EvaluationStore, ListingStore,
    RepositoryError,
};
use crate::workflows::recruitment::{
    ApplicationId, CriterionDraft, ListingId, ListingRemoval, WorkflowAction, WorkflowError,
    WorkflowPolicy,
};

fn expired_listing(harness: &Harness) -> ListingId {
    harness
        .store
        .create_listing(
            ListingDraft {
                position: PositionRank::Professor,
                faculty: "Science".to_string(),
                department: "Physics".to_string(),
                publish_date: now() - Duration::days(60),
                deadline: now() - Duration::days(1),
                description: None,
                requirements: None,
            },
            harness.admin.user_id,
            now() - Duration::days(60),
        )
        .expect("listing stored")
        .id
}

#[test]
fn submit_application_creates_pending_record() {
    let harness = harness();
    let application = harness.submit();

    assert_eq!(application.status, ApplicationStatus::Pending);
    assert_eq!(application.candidate_id, harness.candidate.user_id);
    assert_eq!(application.apply_date, now());
    assert_eq!(application.version, 0);
    assert!(application.documents.missing().is_empty());
}

#[test]
fn submit_application_after_deadline_is_rejected() {
    let harness = harness();
    let listing_id = expired_listing(&harness);

    match harness
        .service
        .submit_application(&harness.candidate, draft(listing_id))
    {
        Err(WorkflowError::DeadlinePassed { listing_id: id, .. }) => assert_eq!(id, listing_id),
        other => panic!("expected deadline passed, got {other:?}"),
    }
    assert!(harness
        .store
        .list_applications(&ApplicationFilter::default())
        .expect("list")
        .is_empty());
}

#[test]
fn submit_application_reports_missing_documents() {
    let harness = harness();
    let mut documents = SubmittedDocuments::default()
        .attach(DocumentKind::Cv, "uploads/cv.pdf")
        .attach(DocumentKind::Diploma, "uploads/diploma.pdf")
        .attach(DocumentKind::Publications, "   ");
    documents = documents.attach(DocumentKind::Citations, "uploads/citations.pdf");

    let mut request = draft(harness.listing_id);
    request.documents = documents;

    match harness.service.submit_application(&harness.candidate, request) {
        Err(WorkflowError::IncompleteDocuments { missing }) => assert_eq!(
            missing,
            vec![DocumentKind::Publications, DocumentKind::Conferences]
        ),
        other => panic!("expected incomplete documents, got {other:?}"),
    }
}

#[test]
fn submit_application_twice_for_same_listing_is_rejected() {
    let harness = harness();
    harness.submit();

    let err = harness
        .service
        .submit_application(&harness.candidate, draft(harness.listing_id))
        .expect_err("second submission refused");
    assert!(matches!(err, WorkflowError::DuplicateApplication { .. }));
    assert_eq!(err.kind(), "duplicate_application");
}

#[test]
fn only_candidates_submit_applications() {
    let harness = harness();
    let err = harness
        .service
        .submit_application(&harness.manager, draft(harness.listing_id))
        .expect_err("manager cannot apply");
    assert!(matches!(
        err,
        WorkflowError::Unauthorized {
            role: Role::Manager,
            ..
        }
    ));
}

#[test]
fn first_assignment_moves_application_into_review() {
    let harness = harness();
    let application = harness.submit();
    let evaluation = harness.assign(application.id, &harness.jury);

    assert_eq!(evaluation.application_id, application.id);
    assert!(!evaluation.is_completed);
    assert_eq!(evaluation.assigned_date, now());

    let stored = harness
        .store
        .get_application(application.id)
        .expect("fetch")
        .expect("present");
    assert_eq!(stored.status, ApplicationStatus::InReview);
    assert_eq!(stored.version, 1);

    let second = harness.second_jury();
    harness.assign(application.id, &second);
    let stored = harness
        .store
        .get_application(application.id)
        .expect("fetch")
        .expect("present");
    assert_eq!(stored.status, ApplicationStatus::InReview);
    assert_eq!(
        harness
            .store
            .list_evaluations(&EvaluationFilter::for_application(application.id))
            .expect("evaluations")
            .len(),
        2
    );
}

#[test]
fn duplicate_assignment_is_rejected_without_side_effects() {
    let harness = harness();
    let application = harness.submit();
    harness.assign(application.id, &harness.jury);

    let err = harness
        .service
        .assign_jury(
            &harness.manager,
            JuryAssignment {
                application_id: application.id,
                jury_member_id: harness.jury.user_id,
                deadline: None,
            },
        )
        .expect_err("pair already assigned");
    assert!(matches!(err, WorkflowError::DuplicateAssignment { .. }));

    let evaluations = harness
        .store
        .list_evaluations(&EvaluationFilter::for_application(application.id))
        .expect("evaluations");
    assert_eq!(evaluations.len(), 1);
    let stored = harness
        .store
        .get_application(application.id)
        .expect("fetch")
        .expect("present");
    assert_eq!(stored.version, 1);
}

#[test]
fn assignment_without_deadline_uses_policy_offset() {
    let harness = harness();
    let application = harness.submit();

    let evaluation = harness
        .service
        .assign_jury(
            &harness.manager,
            JuryAssignment {
                application_id: application.id,
                jury_member_id: harness.jury.user_id,
                deadline: None,
            },
        )
        .expect("assigned");
    assert_eq!(evaluation.deadline, now() + Duration::days(14));
}

#[test]
fn assignment_rejects_past_deadline_and_unknown_records() {
    let harness = harness();
    let application = harness.submit();

    let err = harness
        .service
        .assign_jury(
            &harness.manager,
            JuryAssignment {
                application_id: application.id,
                jury_member_id: harness.jury.user_id,
                deadline: Some(now() - Duration::hours(1)),
            },
        )
        .expect_err("past deadline");
    assert!(matches!(err, WorkflowError::Validation(_)));

    let err = harness
        .service
        .assign_jury(
            &harness.manager,
            JuryAssignment {
                application_id: ApplicationId(999),
                jury_member_id: harness.jury.user_id,
                deadline: None,
            },
        )
        .expect_err("unknown application");
    assert!(matches!(
        err,
        WorkflowError::NotFound {
            entity: "application",
            ..
        }
    ));

    let err = harness
        .service
        .assign_jury(
            &harness.manager,
            JuryAssignment {
                application_id: application.id,
                jury_member_id: harness.candidate.user_id,
                deadline: None,
            },
        )
        .expect_err("candidate is not in the jury directory");
    assert!(matches!(
        err,
        WorkflowError::NotFound {
            entity: "jury member",
            ..
        }
    ));

    let err = harness
        .service
        .assign_jury(
            &harness.jury,
            JuryAssignment {
                application_id: application.id,
                jury_member_id: harness.jury.user_id,
                deadline: None,
            },
        )
        .expect_err("jury cannot assign");
    assert!(matches!(err, WorkflowError::Unauthorized { .. }));
}

#[test]
fn decide_on_pending_application_is_an_invalid_transition() {
    let harness = harness();
    let application = harness.submit();

    match harness
        .service
        .decide(&harness.manager, application.id, Decision::Approve, None)
    {
        Err(WorkflowError::InvalidStateTransition { from, action }) => {
            assert_eq!(from, ApplicationStatus::Pending);
            assert_eq!(action, WorkflowAction::Decide(Decision::Approve));
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn decide_approves_and_notifies_candidate() {
    let harness = harness();
    let application = harness.submit();
    harness.assign(application.id, &harness.jury);

    let decided = harness
        .service
        .decide(
            &harness.manager,
            application.id,
            Decision::Approve,
            Some("  strong publication record ".to_string()),
        )
        .expect("decision accepted");

    assert_eq!(decided.status, ApplicationStatus::Approved);
    assert_eq!(
        decided.manager_notes.as_deref(),
        Some("strong publication record")
    );
    assert_eq!(decided.updated_at, Some(now()));

    let notices = harness.notifier.notices();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0].template, "jury_assigned");
    assert_eq!(notices[0].recipient, harness.jury.user_id);
    assert_eq!(notices[1].template, "application_decided");
    assert_eq!(notices[1].recipient, harness.candidate.user_id);
    assert_eq!(notices[1].details["status"], "approved");
}

#[test]
fn terminal_applications_accept_no_further_changes() {
    let harness = harness();
    let application = harness.submit();
    harness.assign(application.id, &harness.jury);
    harness
        .service
        .decide(&harness.manager, application.id, Decision::Reject, None)
        .expect("rejected");

    let err = harness
        .service
        .decide(&harness.manager, application.id, Decision::Approve, None)
        .expect_err("cannot reopen");
    assert!(matches!(
        err,
        WorkflowError::InvalidStateTransition {
            from: ApplicationStatus::Rejected,
            ..
        }
    ));

    let second = harness.second_jury();
    let err = harness
        .service
        .assign_jury(
            &harness.manager,
            JuryAssignment {
                application_id: application.id,
                jury_member_id: second.user_id,
                deadline: None,
            },
        )
        .expect_err("no new evaluations after decision");
    assert!(matches!(err, WorkflowError::InvalidStateTransition { .. }));
    assert_eq!(
        harness
            .store
            .list_evaluations(&EvaluationFilter::for_application(application.id))
            .expect("evaluations")
            .len(),
        1
    );
}

#[test]
fn decided_applications_report_the_transition_before_assignment_input() {
    let harness = harness();
    let application = harness.submit();
    harness.assign(application.id, &harness.jury);
    harness
        .service
        .decide(&harness.manager, application.id, Decision::Approve, None)
        .expect("approved");

    let second = harness.second_jury();
    for assignment in [
        JuryAssignment {
            application_id: application.id,
            jury_member_id: second.user_id,
            deadline: Some(now() - Duration::days(1)),
        },
        JuryAssignment {
            application_id: application.id,
            jury_member_id: UserId(404),
            deadline: None,
        },
    ] {
        let err = harness
            .service
            .assign_jury(&harness.manager, assignment)
            .expect_err("approved is terminal");
        assert!(
            matches!(
                err,
                WorkflowError::InvalidStateTransition {
                    from: ApplicationStatus::Approved,
                    action: WorkflowAction::AssignJury,
                }
            ),
            "unexpected {err:?}"
        );
    }
}

#[test]
fn decide_may_require_completed_evaluations() {
    let harness = harness_with(WorkflowPolicy::new(true, 14), RecordingNotifier::default());
    let application = harness.submit();
    let evaluation = harness.assign(application.id, &harness.jury);

    let err = harness
        .service
        .decide(&harness.manager, application.id, Decision::Approve, None)
        .expect_err("evaluation still open");
    assert!(matches!(err, WorkflowError::Validation(_)));

    harness
        .service
        .submit_evaluation(
            &harness.jury,
            evaluation.id,
            EvaluationReport {
                report: "Meets every requirement.".to_string(),
                result: Some(EvaluationResult::Positive),
            },
        )
        .expect("report stored");
    let decided = harness
        .service
        .decide(&harness.manager, application.id, Decision::Approve, None)
        .expect("decision accepted");
    assert_eq!(decided.status, ApplicationStatus::Approved);
}

#[test]
fn notification_failure_keeps_committed_assignment() {
    let harness = harness_with(WorkflowPolicy::default(), RecordingNotifier::offline());
    let application = harness.submit();
    harness.assign(application.id, &harness.jury);

    let stored = harness
        .store
        .get_application(application.id)
        .expect("fetch")
        .expect("present");
    assert_eq!(stored.status, ApplicationStatus::InReview);
}

#[test]
fn annotate_replaces_notes_in_any_state() {
    let harness = harness();
    let application = harness.submit();

    let annotated = harness
        .service
        .annotate(
            &harness.manager,
            application.id,
            Some("check diploma equivalence".to_string()),
        )
        .expect("annotated");
    assert_eq!(annotated.status, ApplicationStatus::Pending);
    assert_eq!(
        annotated.manager_notes.as_deref(),
        Some("check diploma equivalence")
    );

    let cleared = harness
        .service
        .annotate(&harness.manager, application.id, Some("   ".to_string()))
        .expect("cleared");
    assert_eq!(cleared.manager_notes, None);
}

#[test]
fn annotation_moves_the_version_so_decisions_reread_it() {
    let harness = harness();
    let application = harness.submit();
    harness.assign(application.id, &harness.jury);
    let before = harness
        .store
        .get_application(application.id)
        .expect("fetch")
        .expect("present");

    let annotated = harness
        .service
        .annotate(&harness.manager, application.id, Some("strong teaching file".to_string()))
        .expect("annotated");
    assert_eq!(annotated.version, before.version + 1);

    assert!(matches!(
        harness.store.update_status(
            application.id,
            before.version,
            ApplicationStatus::Rejected,
            Some("stale overwrite".to_string()),
            now(),
        ),
        Err(RepositoryError::StaleVersion)
    ));

    let decided = harness
        .service
        .decide(&harness.manager, application.id, Decision::Approve, None)
        .expect("decided");
    assert_eq!(decided.status, ApplicationStatus::Approved);
    assert_eq!(decided.manager_notes.as_deref(), Some("strong teaching file"));
}

#[test]
fn candidates_only_see_their_own_applications() {
    let harness = harness();
    let application = harness.submit();
    let other = harness.second_candidate();

    let err = harness
        .service
        .application(&other, application.id)
        .expect_err("foreign application hidden");
    assert!(matches!(err, WorkflowError::Unauthorized { .. }));
    assert!(harness
        .service
        .applications(&other, ApplicationFilter::default())
        .expect("list")
        .is_empty());

    let own = harness
        .service
        .applications(&harness.candidate, ApplicationFilter::default())
        .expect("list");
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].candidate_name, "Cem Candidate");
    assert_eq!(own[0].listing_position, "Assistant Professor");

    let staff = harness
        .service
        .applications(
            &harness.manager,
            ApplicationFilter {
                status: Some(ApplicationStatus::Pending),
                ..ApplicationFilter::default()
            },
        )
        .expect("list");
    assert_eq!(staff.len(), 1);
}

#[test]
fn jury_members_see_only_assigned_applications() {
    let harness = harness();
    let application = harness.submit();
    assert!(harness
        .service
        .application(&harness.jury, application.id)
        .is_err());

    harness.assign(application.id, &harness.jury);
    let detail = harness
        .service
        .application(&harness.jury, application.id)
        .expect("assigned application visible");
    assert_eq!(detail.application.id, application.id);
}

#[test]
fn evaluate_criteria_reports_unmet_requirements() {
    let harness = harness();
    let criteria = harness
        .service
        .criteria()
        .list(Some(PositionRank::AssistantProfessor))
        .expect("criteria");

    let mut request = draft(harness.listing_id);
    request.achievements.insert(criteria[0].id, 5);
    let application = harness
        .service
        .submit_application(&harness.candidate, request)
        .expect("submitted");

    let assessment = harness
        .service
        .evaluate_criteria(&harness.manager, application.id)
        .expect("assessment");
    assert!(!assessment.eligible);
    let unmet: Vec<_> = assessment
        .unmet_required()
        .map(|check| check.name.as_str())
        .collect();
    assert_eq!(unmet, vec!["Lead author"]);

    let err = harness
        .service
        .evaluate_criteria(&harness.second_candidate(), application.id)
        .expect_err("foreign candidate");
    assert!(matches!(err, WorkflowError::Unauthorized { .. }));
}

#[test]
fn criteria_registry_is_manager_only() {
    let harness = harness();
    let draft = CriterionDraft {
        rank: PositionRank::Professor,
        name: "  Doctoral students supervised ".to_string(),
        description: None,
        required: false,
        min_count: 2,
    };

    let err = harness
        .service
        .criteria()
        .add(&harness.admin, draft.clone())
        .expect_err("admin cannot edit criteria");
    assert!(matches!(err, WorkflowError::Unauthorized { .. }));

    let criterion = harness
        .service
        .criteria()
        .add(&harness.manager, draft)
        .expect("manager adds");
    assert_eq!(criterion.name, "Doctoral students supervised");
    assert_eq!(
        harness
            .service
            .criteria()
            .list(Some(PositionRank::Professor))
            .expect("list")
            .len(),
        1
    );

    harness
        .service
        .criteria()
        .remove(&harness.manager, criterion.id)
        .expect("removed");
    assert!(matches!(
        harness.service.criteria().get(criterion.id),
        Err(WorkflowError::NotFound { .. })
    ));
}

#[test]
fn register_creates_candidates_and_validates_input() {
    let harness = harness();
    let user = harness
        .service
        .register(Registration {
            national_id: "12345678901".to_string(),
            name: "Nur New".to_string(),
            email: "nur@example.edu".to_string(),
        })
        .expect("registered");
    assert_eq!(user.role, Role::Candidate);

    for (national_id, email) in [
        ("1234567890", "short@example.edu"),
        ("1234567890a", "alpha@example.edu"),
        ("12345678902", "no-at-sign"),
        ("12345678901", "dup@example.edu"),
    ] {
        let err = harness
            .service
            .register(Registration {
                national_id: national_id.to_string(),
                name: "Nur New".to_string(),
                email: email.to_string(),
            })
            .expect_err("invalid registration");
        assert!(
            matches!(err, WorkflowError::Validation(_)),
            "{national_id}/{email}: {err:?}"
        );
    }
}

#[test]
fn provisioning_accounts_requires_admin() {
    let harness = harness();
    let registration = Registration {
        national_id: "22222222222".to_string(),
        name: "Prof. New Jury".to_string(),
        email: "newjury@example.edu".to_string(),
    };

    assert!(matches!(
        harness
            .service
            .provision_user(&harness.manager, registration.clone(), Role::Jury),
        Err(WorkflowError::Unauthorized { .. })
    ));
    let user = harness
        .service
        .provision_user(&harness.admin, registration, Role::Jury)
        .expect("provisioned");
    assert_eq!(user.role, Role::Jury);

    let member = harness
        .service
        .add_jury_member(
            &harness.manager,
            JuryMemberDraft {
                user_id: user.id,
                department: Some("Mathematics".to_string()),
                faculty: None,
                university: None,
            },
        )
        .expect("enrolled");
    assert_eq!(member.name, "Prof. New Jury");
    assert_eq!(
        harness
            .service
            .jury_members(&harness.manager)
            .expect("directory")
            .len(),
        2
    );
}

#[test]
fn jury_directory_accepts_only_jury_accounts() {
    let harness = harness();
    let err = harness
        .service
        .add_jury_member(
            &harness.manager,
            JuryMemberDraft {
                user_id: harness.candidate.user_id,
                department: None,
                faculty: None,
                university: None,
            },
        )
        .expect_err("candidate account");
    assert!(matches!(err, WorkflowError::Validation(_)));

    let err = harness
        .service
        .add_jury_member(
            &harness.manager,
            JuryMemberDraft {
                user_id: harness.jury.user_id,
                department: None,
                faculty: None,
                university: None,
            },
        )
        .expect_err("already enrolled");
    assert!(matches!(err, WorkflowError::Validation(_)));

    for caller in [&harness.candidate, &harness.admin] {
        assert!(matches!(
            harness.service.jury_members(caller),
            Err(WorkflowError::Unauthorized { .. })
        ));
    }

    harness
        .service
        .remove_jury_member(&harness.manager, harness.jury.user_id)
        .expect("removed");
    assert!(matches!(
        harness
            .service
            .remove_jury_member(&harness.manager, harness.jury.user_id),
        Err(WorkflowError::NotFound { .. })
    ));
}

#[test]
fn resolve_caller_uses_directory_role() {
    let harness = harness();
    let caller = harness
        .service
        .resolve_caller(harness.manager.user_id)
        .expect("known user");
    assert_eq!(caller.role, Role::Manager);

    assert!(matches!(
        harness.service.resolve_caller(UserId(404)),
        Err(WorkflowError::Unauthenticated)
    ));
}

#[test]
fn listings_lock_after_first_application() {
    let harness = harness();
    harness.submit();

    let err = harness
        .service
        .update_listing(
            &harness.admin,
            harness.listing_id,
            ListingUpdate {
                department: Some("Electrical Engineering".to_string()),
                ..ListingUpdate::default()
            },
        )
        .expect_err("department locked");
    assert!(matches!(err, WorkflowError::Validation(_)));

    let extended = harness
        .service
        .update_listing(
            &harness.admin,
            harness.listing_id,
            ListingUpdate {
                deadline: Some(now() + Duration::days(45)),
                ..ListingUpdate::default()
            },
        )
        .expect("deadline may move");
    assert_eq!(extended.listing.deadline, now() + Duration::days(45));
    assert_eq!(extended.applications_count, 1);

    let err = harness
        .service
        .update_listing(
            &harness.admin,
            harness.listing_id,
            ListingUpdate {
                deadline: Some(now() - Duration::days(5)),
                ..ListingUpdate::default()
            },
        )
        .expect_err("deadline before publish date");
    assert!(matches!(err, WorkflowError::Validation(_)));
}

#[test]
fn deleting_listing_with_applications_archives_it() {
    let harness = harness();
    let application = harness.submit();

    let removal = harness
        .service
        .delete_listing(&harness.admin, harness.listing_id)
        .expect("removed");
    assert_eq!(removal, ListingRemoval::Archived);
    assert!(harness.service.listings(None).expect("listings").is_empty());
    assert!(matches!(
        harness.service.listing(harness.listing_id),
        Err(WorkflowError::NotFound { .. })
    ));

    let other = harness.second_candidate();
    assert!(matches!(
        harness
            .service
            .submit_application(&other, draft(harness.listing_id)),
        Err(WorkflowError::NotFound { .. })
    ));

    let detail = harness
        .service
        .application(&harness.candidate, application.id)
        .expect("application survives archiving");
    assert_eq!(detail.listing_department, "Computer Engineering");
}

#[test]
fn deleting_unused_listing_removes_it() {
    let harness = harness();
    let removal = harness
        .service
        .delete_listing(&harness.admin, harness.listing_id)
        .expect("removed");
    assert_eq!(removal, ListingRemoval::Deleted);
    assert!(harness
        .store
        .get_listing(harness.listing_id)
        .expect("fetch")
        .is_none());
}

#[test]
fn listings_filter_by_derived_status() {
    let harness = harness();
    expired_listing(&harness);

    let active = harness
        .service
        .listings(Some(ListingStatus::Active))
        .expect("active");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].listing.id, harness.listing_id);

    let expired = harness
        .service
        .listings(Some(ListingStatus::Expired))
        .expect("expired");
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].listing.position, PositionRank::Professor);
    assert_eq!(harness.service.listings(None).expect("all").len(), 2);
}

#[test]
fn create_listing_validates_window_and_role() {
    let harness = harness();
    let draft = ListingDraft {
        position: PositionRank::AssociateProfessor,
        faculty: "Medicine".to_string(),
        department: "Anatomy".to_string(),
        publish_date: now(),
        deadline: now() + Duration::days(20),
        description: None,
        requirements: None,
    };

    assert!(matches!(
        harness.service.create_listing(&harness.manager, draft.clone()),
        Err(WorkflowError::Unauthorized { .. })
    ));
    assert!(matches!(
        harness.service.create_listing(
            &harness.admin,
            ListingDraft {
                deadline: now(),
                ..draft.clone()
            }
        ),
        Err(WorkflowError::Validation(_))
    ));

    let view = harness
        .service
        .create_listing(&harness.admin, draft)
        .expect("created");
    assert_eq!(view.status, ListingStatus::Active);
    assert_eq!(view.applications_count, 0);
    assert_eq!(view.listing.created_by, harness.admin.user_id);
}

#[test]
fn admins_can_browse_archived_listings() {
    let harness = harness();
    harness.submit();
    harness
        .service
        .delete_listing(&harness.admin, harness.listing_id)
        .expect("archived");

    assert!(harness.service.listings(None).expect("public").is_empty());
    let all = harness
        .service
        .all_listings(&harness.admin, None)
        .expect("admin view");
    assert_eq!(all.len(), 1);
    assert!(all[0].listing.archived);
    assert_eq!(all[0].applications_count, 1);

    assert!(matches!(
        harness.service.all_listings(&harness.manager, None),
        Err(WorkflowError::Unauthorized { .. })
    ));
}

#[test]
fn users_update_their_own_profile() {
    let harness = harness();
    let updated = harness
        .service
        .update_me(
            &harness.candidate,
            ProfileUpdate {
                name: Some("  Cem Aday ".to_string()),
                phone: Some("+90 312 000 00 00".to_string()),
                ..ProfileUpdate::default()
            },
        )
        .expect("profile updated");
    assert_eq!(updated.name, "Cem Aday");
    assert_eq!(updated.phone.as_deref(), Some("+90 312 000 00 00"));
    assert_eq!(updated.role, Role::Candidate);
    assert_eq!(updated.updated_at, Some(now()));

    let err = harness
        .service
        .update_me(
            &harness.candidate,
            ProfileUpdate {
                email: Some("10000000002@example.edu".to_string()),
                ..ProfileUpdate::default()
            },
        )
        .expect_err("email belongs to the manager");
    assert!(matches!(err, WorkflowError::Validation(_)));

    let err = harness
        .service
        .update_me(
            &harness.candidate,
            ProfileUpdate {
                name: Some("   ".to_string()),
                ..ProfileUpdate::default()
            },
        )
        .expect_err("blank name");
    assert!(matches!(err, WorkflowError::Validation(_)));
    assert_eq!(harness.service.me(&harness.candidate).expect("me").name, "Cem Aday");
}

#[test]
fn admins_manage_accounts() {
    let harness = harness();

    let jury = harness
        .service
        .users(&harness.admin, Some(Role::Jury))
        .expect("jury accounts");
    assert_eq!(jury.len(), 1);
    assert_eq!(jury[0].id, harness.jury.user_id);
    assert_eq!(harness.service.users(&harness.admin, None).expect("all").len(), 4);

    let renamed = harness
        .service
        .update_user(
            &harness.admin,
            harness.jury.user_id,
            ProfileUpdate {
                name: Some("Prof. Jale Renamed".to_string()),
                ..ProfileUpdate::default()
            },
        )
        .expect("renamed");
    assert_eq!(
        harness
            .service
            .user(&harness.admin, harness.jury.user_id)
            .expect("fetched")
            .name,
        renamed.name
    );
    assert_eq!(
        harness.service.jury_members(&harness.manager).expect("directory")[0].name,
        "Prof. Jale Renamed"
    );

    for caller in [&harness.manager, &harness.jury, &harness.candidate] {
        assert!(matches!(
            harness.service.users(caller, None),
            Err(WorkflowError::Unauthorized { .. })
        ));
        assert!(matches!(
            harness.service.delete_user(caller, harness.candidate.user_id),
            Err(WorkflowError::Unauthorized { .. })
        ));
    }
    assert!(matches!(
        harness.service.user(&harness.admin, UserId(404)),
        Err(WorkflowError::NotFound { .. })
    ));
}

#[test]
fn deleting_accounts_respects_references() {
    let harness = harness();
    harness.submit();

    let err = harness
        .service
        .delete_user(&harness.admin, harness.candidate.user_id)
        .expect_err("candidate has an application");
    assert!(matches!(err, WorkflowError::Validation(_)));
    let err = harness
        .service
        .delete_user(&harness.admin, harness.admin.user_id)
        .expect_err("own account");
    assert!(matches!(err, WorkflowError::Validation(_)));

    let other = harness.second_candidate();
    harness
        .service
        .delete_user(&harness.admin, other.user_id)
        .expect("unreferenced account deleted");
    assert!(matches!(
        harness.service.resolve_caller(other.user_id),
        Err(WorkflowError::Unauthenticated)
    ));

    harness
        .service
        .delete_user(&harness.admin, harness.jury.user_id)
        .expect("jury without evaluations deleted");
    assert!(harness
        .service
        .jury_members(&harness.manager)
        .expect("directory")
        .is_empty());
}
