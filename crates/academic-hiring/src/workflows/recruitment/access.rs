use serde::{Deserialize, Serialize};

use super::domain::{Role, UserId};
use super::error::WorkflowError;

/// Identity of the actor performing an operation, passed explicitly to every engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    pub role: Role,
}

impl Caller {
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn require(&self, role: Role, operation: &'static str) -> Result<(), WorkflowError> {
        self.require_any(&[role], operation)
    }

    pub fn require_any(&self, roles: &[Role], operation: &'static str) -> Result<(), WorkflowError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(WorkflowError::Unauthorized {
                role: self.role,
                operation,
            })
        }
    }

    /// Staff roles see every record; candidates and jury members only their own.
    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Manager)
    }
}
