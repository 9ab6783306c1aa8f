use crate::infra::{build_service, parse_decision, ApiService};
use academic_hiring::config::{DataSource, WorkflowConfig};
use academic_hiring::error::AppError;
use academic_hiring::workflows::recruitment::{
    ApplicationDraft, ApplicationFilter, Caller, Decision, DocumentKind, EvaluationReport,
    EvaluationResult, JuryAssignment, ListingStatus, PositionRank, Role, SubmittedDocuments,
    UserId, WorkflowError,
};
use chrono::Duration;
use clap::Args;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Final manager decision to record (approve or reject).
    #[arg(long, value_parser = parse_decision)]
    pub(crate) decision: Option<Decision>,
    /// Days the jury member gets to report. Defaults to the configured offset.
    #[arg(long)]
    pub(crate) jury_deadline_days: Option<u32>,
    /// Refuse the decision while any evaluation is still open.
    #[arg(long)]
    pub(crate) require_completed_evaluations: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        decision,
        jury_deadline_days,
        require_completed_evaluations,
    } = args;
    let decision = decision.unwrap_or(Decision::Approve);

    let (service, notifier) = build_service(&WorkflowConfig {
        data_source: DataSource::Mock,
        require_completed_evaluations,
        jury_deadline_days: jury_deadline_days.unwrap_or(14),
    })?;

    println!("Academic hiring workflow demo");

    let admin = seeded_caller(&service, Role::Admin)?;
    let manager = seeded_caller(&service, Role::Manager)?;
    let jury = seeded_caller(&service, Role::Jury)?;
    let candidate = seeded_caller(&service, Role::Candidate)?;
    let me = service.me(&admin)?;
    println!("Signed-in staff: {} ({})", me.name, me.role.label());

    let listing = service
        .listings(Some(ListingStatus::Active))?
        .into_iter()
        .next()
        .ok_or_else(|| WorkflowError::validation("seed data has no open listing"))?;
    println!(
        "\nOpen listing {}: {} / {} / {} (deadline {})",
        listing.listing.id,
        listing.listing.position.label(),
        listing.listing.faculty,
        listing.listing.department,
        listing.listing.deadline.format("%Y-%m-%d")
    );

    let criteria = service
        .criteria()
        .list(Some(PositionRank::AssistantProfessor))?;
    let achievements = criteria
        .iter()
        .enumerate()
        .map(|(index, criterion)| {
            let shortfall = u32::from(index == criteria.len() - 1);
            (criterion.id, criterion.min_count.saturating_sub(shortfall))
        })
        .collect();

    let documents = DocumentKind::required()
        .into_iter()
        .fold(SubmittedDocuments::default(), |docs, kind| {
            docs.attach(kind, format!("uploads/demo/{}.pdf", kind.label()))
        });
    let application = service.submit_application(
        &candidate,
        ApplicationDraft {
            listing_id: listing.listing.id,
            documents,
            achievements,
        },
    )?;
    println!(
        "\n1. Candidate submitted {} (status: {})",
        application.id, application.status
    );

    let assessment = service.evaluate_criteria(&manager, application.id)?;
    println!(
        "2. Criteria check: {}",
        if assessment.eligible {
            "eligible"
        } else {
            "not eligible"
        }
    );
    for check in &assessment.checks {
        println!(
            "   - {:<45} {:>3} / {:<3} {}",
            check.name,
            check.count,
            check.min_count,
            if check.met { "met" } else { "unmet" }
        );
    }

    let assignment = JuryAssignment {
        application_id: application.id,
        jury_member_id: jury.user_id,
        deadline: jury_deadline_days.map(|days| service.now() + Duration::days(i64::from(days))),
    };
    let evaluation = service.assign_jury(&manager, assignment.clone())?;
    let status = service.application(&manager, application.id)?.application.status;
    println!(
        "3. Manager assigned {} as {} (deadline {}); application is now {}",
        jury.user_id,
        evaluation.id,
        evaluation.deadline.format("%Y-%m-%d"),
        status
    );

    report_expected_failure(
        "4. Assigning the same jury member again",
        service.assign_jury(&manager, assignment).map(|_| ()),
    );

    let completed = service.submit_evaluation(
        &jury,
        evaluation.id,
        EvaluationReport {
            report: "Publication record and teaching portfolio meet the rank requirements."
                .to_string(),
            result: Some(EvaluationResult::Positive),
        },
    )?;
    println!(
        "5. Jury report stored ({})",
        completed.result.map(|r| r.label()).unwrap_or("no result")
    );

    let decided = service.decide(
        &manager,
        application.id,
        decision,
        Some("Decision recorded by the demo walkthrough".to_string()),
    )?;
    println!("6. Manager decision: {}", decided.status);

    let reverse = match decision {
        Decision::Approve => Decision::Reject,
        Decision::Reject => Decision::Approve,
    };
    report_expected_failure(
        "7. Reversing the decision",
        service
            .decide(&manager, application.id, reverse, None)
            .map(|_| ()),
    );

    let summary = service.review_summary(&manager, application.id)?;
    println!(
        "\nReview summary: {} assigned, {} completed, {} positive, {} negative",
        summary.assigned, summary.completed, summary.positive, summary.negative
    );

    let mine = service.applications(&candidate, ApplicationFilter::default())?;
    for detail in &mine {
        println!(
            "Candidate view: {} for {} in {} is {}",
            detail.application.id,
            detail.listing_position,
            detail.listing_department,
            detail.application.status
        );
    }

    let notices = notifier.notices();
    println!("\nNotifications queued: {}", notices.len());
    for notice in notices {
        println!(
            "  - {} -> {} ({})",
            notice.template, notice.recipient, notice.application_id
        );
    }

    Ok(())
}

fn seeded_caller(service: &ApiService, role: Role) -> Result<Caller, AppError> {
    // Seed accounts are created in role order starting at user-1.
    let ordinal = match role {
        Role::Admin => 1,
        Role::Manager => 2,
        Role::Jury => 3,
        Role::Candidate => 4,
    };
    let caller = service.resolve_caller(UserId(ordinal))?;
    if caller.role != role {
        return Err(WorkflowError::not_found("seeded account", role.label()).into());
    }
    Ok(caller)
}

fn report_expected_failure(step: &str, outcome: Result<(), WorkflowError>) {
    match outcome {
        Err(err) => println!("{step}: refused with {} ({err})", err.kind()),
        Ok(()) => println!("{step}: unexpectedly accepted"),
    }
}
