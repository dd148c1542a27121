//! Store client seam for the user/role collections
//!
//! The gateway talks to the store only through [`RelationshipStore`]. Each
//! method maps to exactly one statement against one collection.

use async_trait::async_trait;
use common::error::StoreResult;
use std::fmt;
use uuid::Uuid;

use crate::models::{Role, User};

pub mod cql;
pub mod memory;

pub use cql::CqlStore;
pub use memory::MemoryStore;

/// Every statement the gateway can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    CreateSchema,
    InsertUser,
    SelectUser,
    UpdateUserName,
    DeleteUser,
    InsertRole,
    SelectRole,
    InsertLink,
    SelectLinks,
    DeleteLinks,
    InsertInverseLink,
    SelectInverseLinks,
    DeleteInverseLink,
}

impl StatementKind {
    /// True for statements that mutate schema or rows
    pub fn is_write(self) -> bool {
        !matches!(
            self,
            StatementKind::SelectUser
                | StatementKind::SelectRole
                | StatementKind::SelectLinks
                | StatementKind::SelectInverseLinks
        )
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatementKind::CreateSchema => "create schema",
            StatementKind::InsertUser => "insert user",
            StatementKind::SelectUser => "select user",
            StatementKind::UpdateUserName => "update user name",
            StatementKind::DeleteUser => "delete user",
            StatementKind::InsertRole => "insert role",
            StatementKind::SelectRole => "select role",
            StatementKind::InsertLink => "insert link",
            StatementKind::SelectLinks => "select links",
            StatementKind::DeleteLinks => "delete links",
            StatementKind::InsertInverseLink => "insert inverse link",
            StatementKind::SelectInverseLinks => "select inverse links",
            StatementKind::DeleteInverseLink => "delete inverse link",
        };
        f.write_str(name)
    }
}

/// Row level access to users, roles and the link collections
///
/// Rows come back without their relations: `User::roles` and `Role::users`
/// are always empty here.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// Create the keyspace and collections if missing
    async fn create_schema(&self, inverse_links: bool) -> StoreResult<()>;

    async fn insert_user(&self, id: Uuid, name: &str) -> StoreResult<()>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn update_user_name(&self, id: Uuid, name: &str) -> StoreResult<()>;

    async fn delete_user(&self, id: Uuid) -> StoreResult<()>;

    async fn insert_role(&self, id: Uuid, name: &str) -> StoreResult<()>;

    async fn find_role(&self, id: Uuid) -> StoreResult<Option<Role>>;

    async fn insert_link(&self, user_id: Uuid, role_id: Uuid) -> StoreResult<()>;

    /// All role ids linked to the user, in clustering order
    async fn role_ids_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>>;

    /// Remove every link row of the user in one partition delete
    async fn delete_links(&self, user_id: Uuid) -> StoreResult<()>;

    async fn insert_inverse_link(&self, role_id: Uuid, user_id: Uuid) -> StoreResult<()>;

    /// All user ids linked to the role, in clustering order
    async fn user_ids_for_role(&self, role_id: Uuid) -> StoreResult<Vec<Uuid>>;

    async fn delete_inverse_link(&self, role_id: Uuid, user_id: Uuid) -> StoreResult<()>;
}
