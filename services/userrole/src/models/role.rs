//! Role model and related functionality

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::User;

/// Role entity
///
/// `users` is only filled by a role lookup with inverse links tracked; the
/// users listed there carry no roles of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub users: Vec<User>,
}

impl Role {
    /// Create a role with a freshly generated time-ordered id
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::now_v7(), name)
    }

    /// Create a role with a caller supplied id
    pub fn with_id(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            users: Vec::new(),
        }
    }
}

/// User role association
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserRole {
    pub user_id: Uuid,
    pub role_id: Uuid,
}
