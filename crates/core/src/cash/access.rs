//! Access gate: tenant scoping and the administrator capability.

use serde::{Deserialize, Serialize};

use cashbook_shared::types::{BranchId, UserId};

use super::error::CashError;

/// Role of the caller as far as the ledger is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActorRole {
    /// May use the override close path, annotate days and act on any branch.
    Admin,
    /// Everyone else.
    Other,
}

impl ActorRole {
    /// Maps a token role claim. `admin` and `owner` grant the capability.
    pub fn from_claim(role: &str) -> Self {
        match role.trim().to_lowercase().as_str() {
            "admin" | "owner" => Self::Admin,
            _ => Self::Other,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Other => "OTHER",
        }
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Acting user.
    pub user_id: UserId,
    /// Home branch of the user.
    pub branch_id: BranchId,
    /// Capability level.
    pub role: ActorRole,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(user_id: UserId, branch_id: BranchId, role: ActorRole) -> Self {
        Self {
            user_id,
            branch_id,
            role,
        }
    }

    /// Returns true if the actor holds the administrator capability.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, ActorRole::Admin)
    }
}

/// Stateless authorization checks.
pub struct AccessGate;

impl AccessGate {
    /// The actor must belong to the branch, unless it is an administrator.
    pub fn ensure_branch(actor: &Actor, branch_id: BranchId) -> Result<(), CashError> {
        if actor.is_admin() || actor.branch_id == branch_id {
            Ok(())
        } else {
            Err(CashError::BranchAccessDenied(branch_id))
        }
    }

    /// Override closing requires the administrator capability.
    pub fn authorize_override(actor: &Actor, admin_override: bool) -> Result<(), CashError> {
        if admin_override && !actor.is_admin() {
            return Err(CashError::Forbidden(
                "override closing requires the ADMIN role".to_string(),
            ));
        }
        Ok(())
    }

    /// Fails unless the actor is an administrator.
    pub fn require_admin(actor: &Actor, operation: &str) -> Result<(), CashError> {
        if actor.is_admin() {
            Ok(())
        } else {
            Err(CashError::Forbidden(format!(
                "{operation} requires the ADMIN role"
            )))
        }
    }
}
