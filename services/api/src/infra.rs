use academic_hiring::config::{DataSource, WorkflowConfig};
use academic_hiring::workflows::recruitment::domain::NewUser;
use academic_hiring::workflows::recruitment::repository::UserDirectory;
use academic_hiring::workflows::recruitment::{
    Decision, MemoryStore, NotificationError, NotificationPublisher, RecruitmentService,
    RepositoryError, Role, WorkflowNotice, WorkflowPolicy,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

pub(crate) type ApiService = RecruitmentService<MemoryStore, InMemoryNotificationPublisher>;

const BOOTSTRAP_ADMIN_NATIONAL_ID: &str = "10000000001";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Keeps outbound notices in process; stands in for the mail relay.
#[derive(Default)]
pub(crate) struct InMemoryNotificationPublisher {
    notices: Mutex<Vec<WorkflowNotice>>,
}

impl NotificationPublisher for InMemoryNotificationPublisher {
    fn publish(&self, notice: WorkflowNotice) -> Result<(), NotificationError> {
        info!(
            template = %notice.template,
            recipient = %notice.recipient,
            application = %notice.application_id,
            "notification queued"
        );
        self.notices
            .lock()
            .map_err(|_| NotificationError::Transport("outbox mutex poisoned".to_string()))?
            .push(notice);
        Ok(())
    }
}

impl InMemoryNotificationPublisher {
    pub(crate) fn notices(&self) -> Vec<WorkflowNotice> {
        self.notices
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

/// Store selected by `APP_DATA_SOURCE`.
pub(crate) fn build_store(
    source: DataSource,
    now: DateTime<Utc>,
) -> Result<MemoryStore, RepositoryError> {
    match source {
        DataSource::Mock => MemoryStore::seeded(now),
        DataSource::Memory => {
            let store = MemoryStore::new();
            store.create_user(NewUser {
                national_id: BOOTSTRAP_ADMIN_NATIONAL_ID.to_string(),
                name: "Bootstrap Administrator".to_string(),
                email: "admin@localhost".to_string(),
                role: Role::Admin,
                created_at: now,
            })?;
            Ok(store)
        }
    }
}

pub(crate) fn build_service(
    config: &WorkflowConfig,
) -> Result<(Arc<ApiService>, Arc<InMemoryNotificationPublisher>), RepositoryError> {
    let store = Arc::new(build_store(config.data_source, Utc::now())?);
    let notifier = Arc::new(InMemoryNotificationPublisher::default());
    let service = RecruitmentService::new(store, notifier.clone(), WorkflowPolicy::from(config));
    Ok((Arc::new(service), notifier))
}

pub(crate) fn parse_decision(raw: &str) -> Result<Decision, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "approve" | "approved" => Ok(Decision::Approve),
        "reject" | "rejected" => Ok(Decision::Reject),
        other => Err(format!("unknown decision '{other}' (expected approve or reject)")),
    }
}
