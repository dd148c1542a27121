//! Relationship store gateway
//!
//! Turns the user/role operations into statement sequences against the store
//! client and assembles rows into [`User`] and [`Role`] records.
//!
//! Every operation stops at the first failing statement and returns it.
//! Nothing already written is undone: the collections are updated one
//! statement at a time with no atomicity across them.

use common::error::StoreError;
use futures_util::future::try_join_all;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{GatewayOptions, RoleWriteMode};
use crate::error::{Entity, GatewayError, GatewayResult};
use crate::models::{Role, User};
use crate::repositories::{RelationshipStore, StatementKind};

fn failed(statement: StatementKind) -> impl FnOnce(StoreError) -> GatewayError {
    move |source| GatewayError::store(statement, source)
}

/// Gateway over users, roles and their links
pub struct Gateway<S> {
    store: S,
    options: GatewayOptions,
}

impl<S: RelationshipStore> Gateway<S> {
    /// Create a new gateway owning the store client
    pub fn new(store: S, options: GatewayOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Ensure the keyspace and collections exist. Safe to repeat.
    pub async fn bootstrap(&self) -> GatewayResult<()> {
        info!(
            "Bootstrapping schema (inverse links: {})",
            self.options.track_inverse_links
        );
        self.store
            .create_schema(self.options.track_inverse_links)
            .await
            .map_err(failed(StatementKind::CreateSchema))
    }

    /// Write the user row, then a role row and a link row for every role
    pub async fn create_user(&self, user: &User) -> GatewayResult<()> {
        info!("Creating user {} with {} roles", user.id, user.roles.len());

        self.store
            .insert_user(user.id, &user.name)
            .await
            .map_err(failed(StatementKind::InsertUser))?;

        match self.options.role_writes {
            RoleWriteMode::Sequential => {
                for role in &user.roles {
                    self.write_membership(user.id, role).await?;
                }
            }
            RoleWriteMode::Concurrent => {
                try_join_all(
                    user.roles
                        .iter()
                        .map(|role| self.write_membership(user.id, role)),
                )
                .await?;
            }
        }

        Ok(())
    }

    /// Fetch a user and resolve each of its links to a role row
    pub async fn get_user(&self, id: Uuid) -> GatewayResult<User> {
        info!("Fetching user {}", id);

        let mut user = self
            .store
            .find_user(id)
            .await
            .map_err(failed(StatementKind::SelectUser))?
            .ok_or(GatewayError::NotFound {
                entity: Entity::User,
                id,
            })?;

        let role_ids = self
            .store
            .role_ids_for_user(id)
            .await
            .map_err(failed(StatementKind::SelectLinks))?;

        for role_id in role_ids {
            let role = self
                .store
                .find_role(role_id)
                .await
                .map_err(failed(StatementKind::SelectRole))?
                .ok_or(GatewayError::DanglingReference {
                    from: id,
                    entity: Entity::Role,
                    id: role_id,
                })?;
            user.roles.push(role);
        }

        Ok(user)
    }

    /// Overwrite the name and replace the whole membership set
    ///
    /// Role rows are left alone. Links are deleted wholesale and rewritten
    /// from `user.roles`.
    pub async fn update_user(&self, user: &User) -> GatewayResult<()> {
        info!("Updating user {} with {} roles", user.id, user.roles.len());

        self.store
            .update_user_name(user.id, &user.name)
            .await
            .map_err(failed(StatementKind::UpdateUserName))?;

        self.unlink_all(user.id).await?;

        match self.options.role_writes {
            RoleWriteMode::Sequential => {
                for role in &user.roles {
                    self.link(user.id, role.id).await?;
                }
            }
            RoleWriteMode::Concurrent => {
                try_join_all(user.roles.iter().map(|role| self.link(user.id, role.id))).await?;
            }
        }

        Ok(())
    }

    /// Delete the user's links, then the user row. Role rows are kept.
    pub async fn delete_user(&self, id: Uuid) -> GatewayResult<()> {
        info!("Deleting user {}", id);

        self.unlink_all(id).await?;

        self.store
            .delete_user(id)
            .await
            .map_err(failed(StatementKind::DeleteUser))
    }

    /// Write a standalone role row
    pub async fn create_role(&self, role: &Role) -> GatewayResult<()> {
        info!("Creating role {} ({})", role.id, role.name);

        self.store
            .insert_role(role.id, &role.name)
            .await
            .map_err(failed(StatementKind::InsertRole))
    }

    /// Link an existing user to an existing role. Neither row is checked.
    pub async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> GatewayResult<()> {
        info!("Assigning role {} to user {}", role_id, user_id);
        self.link(user_id, role_id).await
    }

    /// Fetch a role; its users are resolved only when inverse links are tracked
    pub async fn get_role(&self, id: Uuid) -> GatewayResult<Role> {
        info!("Fetching role {}", id);

        let mut role = self
            .store
            .find_role(id)
            .await
            .map_err(failed(StatementKind::SelectRole))?
            .ok_or(GatewayError::NotFound {
                entity: Entity::Role,
                id,
            })?;

        if !self.options.track_inverse_links {
            return Ok(role);
        }

        let user_ids = self
            .store
            .user_ids_for_role(id)
            .await
            .map_err(failed(StatementKind::SelectInverseLinks))?;

        for user_id in user_ids {
            let user = self
                .store
                .find_user(user_id)
                .await
                .map_err(failed(StatementKind::SelectUser))?
                .ok_or(GatewayError::DanglingReference {
                    from: id,
                    entity: Entity::User,
                    id: user_id,
                })?;
            role.users.push(user);
        }

        Ok(role)
    }

    async fn write_membership(&self, user_id: Uuid, role: &Role) -> GatewayResult<()> {
        self.store
            .insert_role(role.id, &role.name)
            .await
            .map_err(failed(StatementKind::InsertRole))?;
        self.link(user_id, role.id).await
    }

    async fn link(&self, user_id: Uuid, role_id: Uuid) -> GatewayResult<()> {
        debug!("Linking user {} to role {}", user_id, role_id);

        self.store
            .insert_link(user_id, role_id)
            .await
            .map_err(failed(StatementKind::InsertLink))?;

        if self.options.track_inverse_links {
            self.store
                .insert_inverse_link(role_id, user_id)
                .await
                .map_err(failed(StatementKind::InsertInverseLink))?;
        }

        Ok(())
    }

    /// Remove every link of the user, mirrors first
    async fn unlink_all(&self, user_id: Uuid) -> GatewayResult<()> {
        if self.options.track_inverse_links {
            let role_ids = self
                .store
                .role_ids_for_user(user_id)
                .await
                .map_err(failed(StatementKind::SelectLinks))?;

            for role_id in role_ids {
                self.store
                    .delete_inverse_link(role_id, user_id)
                    .await
                    .map_err(failed(StatementKind::DeleteInverseLink))?;
            }
        }

        self.store
            .delete_links(user_id)
            .await
            .map_err(failed(StatementKind::DeleteLinks))
    }
}
