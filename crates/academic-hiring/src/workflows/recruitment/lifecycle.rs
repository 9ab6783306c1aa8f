//! The single authoritative state machine for `ApplicationStatus`.
//!
//! ```text
//! pending --assign_jury--> in_review --assign_jury--> in_review
//!                          in_review --decide(approve)--> approved
//!                          in_review --decide(reject)---> rejected
//! ```
//!
//! `approved` and `rejected` are terminal.

use serde::Serialize;

use super::domain::{ApplicationStatus, Decision};

/// Events that can move an application between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    AssignJury,
    Decide(Decision),
}

impl WorkflowAction {
    pub const fn label(self) -> &'static str {
        match self {
            WorkflowAction::AssignJury => "assign a jury member to",
            WorkflowAction::Decide(Decision::Approve) => "approve",
            WorkflowAction::Decide(Decision::Reject) => "reject",
        }
    }
}

/// Rejected transition, carrying the state it was attempted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {} an application that is {from}", .action.label())]
pub struct TransitionError {
    pub from: ApplicationStatus,
    pub action: WorkflowAction,
}

impl ApplicationStatus {
    pub const fn is_terminal(self) -> bool {
        match self {
            ApplicationStatus::Approved | ApplicationStatus::Rejected => true,
            ApplicationStatus::Pending | ApplicationStatus::InReview => false,
        }
    }

    /// Compute the state reached by applying `action`, or explain why it is not allowed.
    pub fn transition(self, action: WorkflowAction) -> Result<ApplicationStatus, TransitionError> {
        let next = match (self, action) {
            (ApplicationStatus::Pending, WorkflowAction::AssignJury)
            | (ApplicationStatus::InReview, WorkflowAction::AssignJury) => {
                Some(ApplicationStatus::InReview)
            }
            (ApplicationStatus::InReview, WorkflowAction::Decide(decision)) => {
                Some(decision.outcome())
            }
            (ApplicationStatus::Pending, WorkflowAction::Decide(_)) => None,
            (ApplicationStatus::Approved, _) | (ApplicationStatus::Rejected, _) => None,
        };

        next.ok_or(TransitionError { from: self, action })
    }
}
