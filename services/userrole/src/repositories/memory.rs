//! In-process store client
//!
//! Keeps the four collections in ordered maps so scans come back in
//! clustering order, like the CQL tables. Statements against collections that
//! were never created are rejected, and failures can be injected per
//! statement kind to exercise partial writes.

use async_trait::async_trait;
use common::error::{StoreError, StoreResult};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::{RelationshipStore, StatementKind};
use crate::models::{Role, User, UserRole};

const USERS: &str = "users";
const ROLES: &str = "roles";
const USER_ROLES: &str = "user_roles";
const ROLE_USERS: &str = "role_users";

/// Injected failure: fires on the `remaining`-th matching statement
#[derive(Debug)]
struct Fault {
    kind: StatementKind,
    remaining: usize,
}

#[derive(Debug, Default)]
struct Tables {
    schema: BTreeSet<&'static str>,
    users: BTreeMap<Uuid, String>,
    roles: BTreeMap<Uuid, String>,
    user_roles: BTreeSet<(Uuid, Uuid)>,
    role_users: BTreeSet<(Uuid, Uuid)>,
    log: Vec<StatementKind>,
    faults: Vec<Fault>,
}

impl Tables {
    fn take_fault(&mut self, kind: StatementKind) -> bool {
        let Some(index) = self.faults.iter().position(|f| f.kind == kind) else {
            return false;
        };
        let fault = &mut self.faults[index];
        fault.remaining = fault.remaining.saturating_sub(1);
        if fault.remaining == 0 {
            self.faults.remove(index);
            return true;
        }
        false
    }
}

/// Memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create an empty store with no collections
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `nth` (1-based) next statement of `kind` fail
    pub async fn fail_nth(&self, kind: StatementKind, nth: usize) {
        let mut tables = self.tables.lock().await;
        tables.faults.push(Fault {
            kind,
            remaining: nth.max(1),
        });
    }

    /// Every statement attempted so far, failed ones included
    pub async fn statement_log(&self) -> Vec<StatementKind> {
        self.tables.lock().await.log.clone()
    }

    /// Names of the collections created so far
    pub async fn collections(&self) -> Vec<&'static str> {
        self.tables.lock().await.schema.iter().copied().collect()
    }

    /// Full scan of the link collection
    pub async fn links(&self) -> Vec<UserRole> {
        self.tables
            .lock()
            .await
            .user_roles
            .iter()
            .map(|&(user_id, role_id)| UserRole { user_id, role_id })
            .collect()
    }

    /// Full scan of the inverse link collection
    pub async fn inverse_links(&self) -> Vec<UserRole> {
        self.tables
            .lock()
            .await
            .role_users
            .iter()
            .map(|&(role_id, user_id)| UserRole { user_id, role_id })
            .collect()
    }

    /// Ids of every stored user row
    pub async fn user_ids(&self) -> Vec<Uuid> {
        self.tables.lock().await.users.keys().copied().collect()
    }

    /// Ids of every stored role row
    pub async fn role_ids(&self) -> Vec<Uuid> {
        self.tables.lock().await.roles.keys().copied().collect()
    }

    /// Drop a role row behind the gateway's back, leaving its links dangling
    pub async fn remove_role_row(&self, id: Uuid) -> bool {
        self.tables.lock().await.roles.remove(&id).is_some()
    }

    /// Drop a user row behind the gateway's back, leaving inverse links dangling
    pub async fn remove_user_row(&self, id: Uuid) -> bool {
        self.tables.lock().await.users.remove(&id).is_some()
    }

    async fn run<T: Send>(
        &self,
        kind: StatementKind,
        table: &'static str,
        apply: impl FnOnce(&mut Tables) -> T + Send,
    ) -> StoreResult<T> {
        let mut tables = self.tables.lock().await;
        tables.log.push(kind);
        debug!(statement = %kind, table, "memory store statement");

        if !tables.schema.contains(table) {
            return Err(StoreError::Rejected(format!("unconfigured table {table}")));
        }
        if tables.take_fault(kind) {
            return Err(StoreError::Rejected(format!("injected failure on {kind}")));
        }
        Ok(apply(&mut tables))
    }
}

#[async_trait]
impl RelationshipStore for MemoryStore {
    async fn create_schema(&self, inverse_links: bool) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        tables.log.push(StatementKind::CreateSchema);
        if tables.take_fault(StatementKind::CreateSchema) {
            return Err(StoreError::Rejected(
                "injected failure on create schema".to_string(),
            ));
        }

        tables.schema.extend([USERS, ROLES, USER_ROLES]);
        if inverse_links {
            tables.schema.insert(ROLE_USERS);
        }
        Ok(())
    }

    async fn insert_user(&self, id: Uuid, name: &str) -> StoreResult<()> {
        let name = name.to_string();
        self.run(StatementKind::InsertUser, USERS, move |t| {
            t.users.insert(id, name);
        })
        .await
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.run(StatementKind::SelectUser, USERS, move |t| {
            t.users.get(&id).map(|name| User::with_id(id, name.clone()))
        })
        .await
    }

    async fn update_user_name(&self, id: Uuid, name: &str) -> StoreResult<()> {
        let name = name.to_string();
        // CQL UPDATE is an upsert
        self.run(StatementKind::UpdateUserName, USERS, move |t| {
            t.users.insert(id, name);
        })
        .await
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        self.run(StatementKind::DeleteUser, USERS, move |t| {
            t.users.remove(&id);
        })
        .await
    }

    async fn insert_role(&self, id: Uuid, name: &str) -> StoreResult<()> {
        let name = name.to_string();
        self.run(StatementKind::InsertRole, ROLES, move |t| {
            t.roles.insert(id, name);
        })
        .await
    }

    async fn find_role(&self, id: Uuid) -> StoreResult<Option<Role>> {
        self.run(StatementKind::SelectRole, ROLES, move |t| {
            t.roles.get(&id).map(|name| Role::with_id(id, name.clone()))
        })
        .await
    }

    async fn insert_link(&self, user_id: Uuid, role_id: Uuid) -> StoreResult<()> {
        self.run(StatementKind::InsertLink, USER_ROLES, move |t| {
            t.user_roles.insert((user_id, role_id));
        })
        .await
    }

    async fn role_ids_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        self.run(StatementKind::SelectLinks, USER_ROLES, move |t| {
            t.user_roles
                .range((user_id, Uuid::nil())..=(user_id, Uuid::max()))
                .map(|&(_, role_id)| role_id)
                .collect()
        })
        .await
    }

    async fn delete_links(&self, user_id: Uuid) -> StoreResult<()> {
        self.run(StatementKind::DeleteLinks, USER_ROLES, move |t| {
            t.user_roles.retain(|&(owner, _)| owner != user_id);
        })
        .await
    }

    async fn insert_inverse_link(&self, role_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        self.run(StatementKind::InsertInverseLink, ROLE_USERS, move |t| {
            t.role_users.insert((role_id, user_id));
        })
        .await
    }

    async fn user_ids_for_role(&self, role_id: Uuid) -> StoreResult<Vec<Uuid>> {
        self.run(StatementKind::SelectInverseLinks, ROLE_USERS, move |t| {
            t.role_users
                .range((role_id, Uuid::nil())..=(role_id, Uuid::max()))
                .map(|&(_, user_id)| user_id)
                .collect()
        })
        .await
    }

    async fn delete_inverse_link(&self, role_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        self.run(StatementKind::DeleteInverseLink, ROLE_USERS, move |t| {
            t.role_users.remove(&(role_id, user_id));
        })
        .await
    }
}
