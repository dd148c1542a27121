//! User model and related functionality

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// User entity
///
/// `roles` follows the order in which the link rows were scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl User {
    /// Create a user with a freshly generated time-ordered id and no roles
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::now_v7(), name)
    }

    /// Create a user with a caller supplied id and no roles
    pub fn with_id(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            roles: Vec::new(),
        }
    }

    /// Replace the role list
    pub fn with_roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = roles;
        self
    }

    /// Ids of the attached roles, in list order
    pub fn role_ids(&self) -> Vec<Uuid> {
        self.roles.iter().map(|role| role.id).collect()
    }
}
