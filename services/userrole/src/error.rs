//! Custom error types for the user/role gateway

use common::error::StoreError;
use thiserror::Error;
use uuid::Uuid;

use crate::repositories::StatementKind;

/// Entity a lookup or reference points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Role,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::User => f.write_str("user"),
            Entity::Role => f.write_str("role"),
        }
    }
}

/// Custom error type for gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The store could not be reached
    #[error("Store unreachable: {0}")]
    Connection(#[source] StoreError),

    /// Point lookup by primary key returned no row
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: Uuid },

    /// A link points at a row that does not exist
    #[error("{from} links to missing {entity} {id}")]
    DanglingReference { from: Uuid, entity: Entity, id: Uuid },

    /// An insert, update, delete or schema statement failed
    #[error("Write failed on {statement}: {source}")]
    Write {
        statement: StatementKind,
        #[source]
        source: StoreError,
    },

    /// A select failed for a reason other than a missing row
    #[error("Read failed on {statement}: {source}")]
    Read {
        statement: StatementKind,
        #[source]
        source: StoreError,
    },

    /// Configuration error
    #[error("Gateway configuration error: {0}")]
    Configuration(#[from] config::ConfigError),
}

impl GatewayError {
    /// Classify a store error by the statement that raised it
    pub fn store(statement: StatementKind, source: StoreError) -> Self {
        if source.is_connection() {
            GatewayError::Connection(source)
        } else if statement.is_write() {
            GatewayError::Write { statement, source }
        } else {
            GatewayError::Read { statement, source }
        }
    }

    /// Statement that failed, when the failure came from the store
    pub fn statement(&self) -> Option<StatementKind> {
        match self {
            GatewayError::Write { statement, .. } | GatewayError::Read { statement, .. } => {
                Some(*statement)
            }
            _ => None,
        }
    }
}

/// Type alias for gateway results
pub type GatewayResult<T> = Result<T, GatewayError>;
