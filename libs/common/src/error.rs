//! Custom error types for the common library
//!
//! This module defines the store-level error type shared by every store
//! client implementation.

use scylla::transport::errors::{NewSessionError, QueryError};
use thiserror::Error;

/// Custom error type for store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The session to the cluster could not be established
    #[error("Store connection error: {0}")]
    Connection(#[source] NewSessionError),

    /// A statement was sent but the cluster answered with an error
    #[error("Store query error: {0}")]
    Query(#[source] QueryError),

    /// A row came back in a shape that does not match the expected columns
    #[error("Store decode error: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Store configuration error: {0}")]
    Configuration(String),

    /// The store refused the statement without reaching a cluster
    #[error("Store rejected statement: {0}")]
    Rejected(String),
}

impl StoreError {
    /// True when the error means the store could not be reached at all
    ///
    /// Covers a failed session as well as statements that never got an
    /// answer because the connection broke, timed out or had no free stream.
    pub fn is_connection(&self) -> bool {
        match self {
            StoreError::Connection(_) => true,
            StoreError::Query(err) => matches!(
                err,
                QueryError::IoError(_)
                    | QueryError::UnableToAllocStreamId
                    | QueryError::TimeoutError
                    | QueryError::RequestTimeout(_)
            ),
            _ => false,
        }
    }
}

impl From<QueryError> for StoreError {
    fn from(err: QueryError) -> Self {
        StoreError::Query(err)
    }
}

impl From<config::ConfigError> for StoreError {
    fn from(err: config::ConfigError) -> Self {
        StoreError::Configuration(err.to_string())
    }
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
