use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::access::Caller;
use super::domain::{
    Application, ApplicationId, Criterion, CriterionDraft, CriterionId, CriterionUpdate,
    PositionRank, Role,
};
use super::error::WorkflowError;
use super::repository::{CriteriaStore, RepositoryError};

/// Manager-maintained criterion sets, one per position rank.
pub struct CriteriaRegistry<S> {
    store: Arc<S>,
}

impl<S> CriteriaRegistry<S>
where
    S: CriteriaStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn list(&self, rank: Option<PositionRank>) -> Result<Vec<Criterion>, WorkflowError> {
        Ok(self.store.list_criteria(rank)?)
    }

    pub fn get(&self, id: CriterionId) -> Result<Criterion, WorkflowError> {
        self.store
            .get_criterion(id)?
            .ok_or_else(|| WorkflowError::not_found("criterion", id))
    }

    pub fn add(&self, caller: &Caller, draft: CriterionDraft) -> Result<Criterion, WorkflowError> {
        caller.require(Role::Manager, "add criteria")?;
        let name = validate_name(&draft.name)?;

        let criterion = self.store.create_criterion(CriterionDraft { name, ..draft })?;
        info!(criterion = %criterion.id, rank = ?criterion.rank, "criterion added");
        Ok(criterion)
    }

    pub fn update(
        &self,
        caller: &Caller,
        id: CriterionId,
        update: CriterionUpdate,
    ) -> Result<Criterion, WorkflowError> {
        caller.require(Role::Manager, "update criteria")?;
        let mut criterion = self.get(id)?;

        if let Some(name) = update.name {
            criterion.name = validate_name(&name)?;
        }
        if let Some(description) = update.description {
            criterion.description = Some(description);
        }
        if let Some(required) = update.required {
            criterion.required = required;
        }
        if let Some(min_count) = update.min_count {
            criterion.min_count = min_count;
        }

        let criterion = self.store.update_criterion(criterion).map_err(|err| match err {
            RepositoryError::NotFound => WorkflowError::not_found("criterion", id),
            other => other.into(),
        })?;
        info!(criterion = %criterion.id, "criterion updated");
        Ok(criterion)
    }

    pub fn remove(&self, caller: &Caller, id: CriterionId) -> Result<(), WorkflowError> {
        caller.require(Role::Manager, "remove criteria")?;
        self.store.delete_criterion(id).map_err(|err| match err {
            RepositoryError::NotFound => WorkflowError::not_found("criterion", id),
            other => other.into(),
        })?;
        info!(criterion = %id, "criterion removed");
        Ok(())
    }
}

fn validate_name(raw: &str) -> Result<String, WorkflowError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(WorkflowError::validation("criterion name must not be empty"));
    }
    Ok(name.to_string())
}

/// Outcome of checking one criterion against the candidate's declared count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionCheck {
    pub criterion_id: CriterionId,
    pub name: String,
    pub required: bool,
    pub min_count: u32,
    pub count: u32,
    pub met: bool,
}

/// Advisory eligibility report; it never blocks submission or jury assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaAssessment {
    pub application_id: ApplicationId,
    pub rank: PositionRank,
    pub checks: Vec<CriterionCheck>,
    pub eligible: bool,
}

impl CriteriaAssessment {
    pub fn unmet_required(&self) -> impl Iterator<Item = &CriterionCheck> {
        self.checks.iter().filter(|check| check.required && !check.met)
    }
}

/// Compare declared counts with every criterion of `rank`. Missing counts are treated as zero.
pub fn assess(
    application: &Application,
    rank: PositionRank,
    criteria: &[Criterion],
) -> CriteriaAssessment {
    let checks: Vec<CriterionCheck> = criteria
        .iter()
        .filter(|criterion| criterion.rank == rank)
        .map(|criterion| {
            let count = application
                .achievements
                .get(&criterion.id)
                .copied()
                .unwrap_or(0);
            CriterionCheck {
                criterion_id: criterion.id,
                name: criterion.name.clone(),
                required: criterion.required,
                min_count: criterion.min_count,
                count,
                met: count >= criterion.min_count,
            }
        })
        .collect();

    let eligible = checks.iter().all(|check| !check.required || check.met);

    CriteriaAssessment {
        application_id: application.id,
        rank,
        checks,
        eligible,
    }
}
