//! CQL store client backed by the scylla driver

use async_trait::async_trait;
use common::error::{StoreError, StoreResult};
use common::store::{ConsistencyLevel, ConsistencySettings};
use futures_util::StreamExt;
use scylla::Session;
use scylla::prepared_statement::PreparedStatement;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use uuid::Uuid;

use super::{RelationshipStore, StatementKind};
use crate::models::{Role, User};
use crate::schema::Schema;

/// Statements prepared once against the bootstrapped keyspace
struct Prepared {
    insert_user: PreparedStatement,
    select_user: PreparedStatement,
    update_user_name: PreparedStatement,
    delete_user: PreparedStatement,
    insert_role: PreparedStatement,
    select_role: PreparedStatement,
    insert_link: PreparedStatement,
    select_links: PreparedStatement,
    delete_links: PreparedStatement,
    inverse: OnceCell<PreparedInverse>,
}

struct PreparedInverse {
    insert: PreparedStatement,
    select: PreparedStatement,
    delete: PreparedStatement,
}

/// Store client issuing prepared CQL statements over one session
pub struct CqlStore {
    session: Session,
    schema: Schema,
    consistency: ConsistencySettings,
    prepared: OnceCell<Prepared>,
}

impl CqlStore {
    /// Create a new CQL store over an open session
    ///
    /// Nothing is prepared here: the keyspace may not exist until the schema
    /// has been created.
    pub fn new(session: Session, schema: Schema, consistency: ConsistencySettings) -> Self {
        Self {
            session,
            schema,
            consistency,
            prepared: OnceCell::new(),
        }
    }

    async fn prepare(
        &self,
        text: String,
        level: ConsistencyLevel,
    ) -> StoreResult<PreparedStatement> {
        let mut statement = self.session.prepare(text).await?;
        statement.set_consistency(level.into());
        Ok(statement)
    }

    async fn prepared(&self) -> StoreResult<&Prepared> {
        self.prepared
            .get_or_try_init(|| async {
                let read = self.consistency.read;
                let write = self.consistency.write;
                let prepared = Prepared {
                    insert_user: self.prepare(self.schema.insert_user(), write).await?,
                    select_user: self.prepare(self.schema.select_user(), read).await?,
                    update_user_name: self.prepare(self.schema.update_user_name(), write).await?,
                    delete_user: self.prepare(self.schema.delete_user(), write).await?,
                    insert_role: self.prepare(self.schema.insert_role(), write).await?,
                    select_role: self.prepare(self.schema.select_role(), read).await?,
                    insert_link: self.prepare(self.schema.insert_link(), write).await?,
                    select_links: self.prepare(self.schema.select_links(), read).await?,
                    delete_links: self.prepare(self.schema.delete_links(), write).await?,
                    inverse: OnceCell::new(),
                };
                info!("Prepared statements for keyspace {}", self.schema.keyspace());
                Ok::<_, StoreError>(prepared)
            })
            .await
    }

    async fn prepared_inverse(&self) -> StoreResult<&PreparedInverse> {
        let prepared = self.prepared().await?;
        prepared
            .inverse
            .get_or_try_init(|| async {
                let read = self.consistency.read;
                let write = self.consistency.write;
                Ok::<_, StoreError>(PreparedInverse {
                    insert: self.prepare(self.schema.insert_inverse_link(), write).await?,
                    select: self.prepare(self.schema.select_inverse_links(), read).await?,
                    delete: self.prepare(self.schema.delete_inverse_link(), write).await?,
                })
            })
            .await
    }

    async fn scan_ids(&self, statement: &PreparedStatement, key: Uuid) -> StoreResult<Vec<Uuid>> {
        let mut rows = self
            .session
            .execute_iter(statement.clone(), (key,))
            .await?
            .into_typed::<(Uuid,)>();

        let mut ids = Vec::new();
        while let Some(row) = rows.next().await {
            let (id,) = row.map_err(|e| StoreError::Decode(e.to_string()))?;
            ids.push(id);
        }
        Ok(ids)
    }
}

#[async_trait]
impl RelationshipStore for CqlStore {
    async fn create_schema(&self, inverse_links: bool) -> StoreResult<()> {
        for statement in self.schema.create_statements(inverse_links) {
            debug!(statement = %StatementKind::CreateSchema, "{}", statement);
            self.session.query(statement, ()).await?;
        }
        Ok(())
    }

    async fn insert_user(&self, id: Uuid, name: &str) -> StoreResult<()> {
        let prepared = self.prepared().await?;
        debug!(statement = %StatementKind::InsertUser, %id);
        self.session.execute(&prepared.insert_user, (id, name)).await?;
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let prepared = self.prepared().await?;
        debug!(statement = %StatementKind::SelectUser, %id);
        let result = self.session.execute(&prepared.select_user, (id,)).await?;
        let row = result
            .maybe_first_row_typed::<(Uuid, Option<String>)>()
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(row.map(|(id, name)| User::with_id(id, name.unwrap_or_default())))
    }

    async fn update_user_name(&self, id: Uuid, name: &str) -> StoreResult<()> {
        let prepared = self.prepared().await?;
        debug!(statement = %StatementKind::UpdateUserName, %id);
        self.session
            .execute(&prepared.update_user_name, (name, id))
            .await?;
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let prepared = self.prepared().await?;
        debug!(statement = %StatementKind::DeleteUser, %id);
        self.session.execute(&prepared.delete_user, (id,)).await?;
        Ok(())
    }

    async fn insert_role(&self, id: Uuid, name: &str) -> StoreResult<()> {
        let prepared = self.prepared().await?;
        debug!(statement = %StatementKind::InsertRole, %id);
        self.session.execute(&prepared.insert_role, (id, name)).await?;
        Ok(())
    }

    async fn find_role(&self, id: Uuid) -> StoreResult<Option<Role>> {
        let prepared = self.prepared().await?;
        debug!(statement = %StatementKind::SelectRole, %id);
        let result = self.session.execute(&prepared.select_role, (id,)).await?;
        let row = result
            .maybe_first_row_typed::<(Uuid, Option<String>)>()
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(row.map(|(id, name)| Role::with_id(id, name.unwrap_or_default())))
    }

    async fn insert_link(&self, user_id: Uuid, role_id: Uuid) -> StoreResult<()> {
        let prepared = self.prepared().await?;
        debug!(statement = %StatementKind::InsertLink, %user_id, %role_id);
        self.session
            .execute(&prepared.insert_link, (user_id, role_id))
            .await?;
        Ok(())
    }

    async fn role_ids_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let prepared = self.prepared().await?;
        debug!(statement = %StatementKind::SelectLinks, %user_id);
        self.scan_ids(&prepared.select_links, user_id).await
    }

    async fn delete_links(&self, user_id: Uuid) -> StoreResult<()> {
        let prepared = self.prepared().await?;
        debug!(statement = %StatementKind::DeleteLinks, %user_id);
        self.session
            .execute(&prepared.delete_links, (user_id,))
            .await?;
        Ok(())
    }

    async fn insert_inverse_link(&self, role_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        let inverse = self.prepared_inverse().await?;
        debug!(statement = %StatementKind::InsertInverseLink, %role_id, %user_id);
        self.session
            .execute(&inverse.insert, (role_id, user_id))
            .await?;
        Ok(())
    }

    async fn user_ids_for_role(&self, role_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let inverse = self.prepared_inverse().await?;
        debug!(statement = %StatementKind::SelectInverseLinks, %role_id);
        self.scan_ids(&inverse.select, role_id).await
    }

    async fn delete_inverse_link(&self, role_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        let inverse = self.prepared_inverse().await?;
        debug!(statement = %StatementKind::DeleteInverseLink, %role_id, %user_id);
        self.session
            .execute(&inverse.delete, (role_id, user_id))
            .await?;
        Ok(())
    }
}
