//! Actor identity and role checks.
//!
//! Role names must match the `role` column values written by the
//! authentication layer.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Id reserved for the built-in account the sweep acts as.
pub const SYSTEM_ACTOR_ID: DbId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::User => ROLE_USER,
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            ROLE_ADMIN => Ok(Role::Admin),
            ROLE_USER => Ok(Role::User),
            other => Err(CoreError::Validation(format!("Unknown role '{other}'"))),
        }
    }
}

/// An authenticated user (or the system) performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: DbId,
    pub role: Role,
}

impl Actor {
    pub fn user(id: DbId) -> Self {
        Self { id, role: Role::User }
    }

    pub fn admin(id: DbId) -> Self {
        Self { id, role: Role::Admin }
    }

    /// The privileged identity used by scheduled work.
    pub fn system() -> Self {
        Self::admin(SYSTEM_ACTOR_ID)
    }

    pub fn is_privileged(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_system(&self) -> bool {
        self.id == SYSTEM_ACTOR_ID
    }

    /// Fail with [`CoreError::Forbidden`] unless the actor is privileged.
    pub fn require_privileged(&self, action: &str) -> Result<(), CoreError> {
        if self.is_privileged() {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "only administrators may {action}"
            )))
        }
    }
}
