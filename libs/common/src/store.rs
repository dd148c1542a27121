//! Store module for handling wide-column cluster connections
//!
//! This module provides connection configuration, session initialization, and
//! health checks for the Cassandra/Scylla cluster.
//!
//! ```rust,no_run
//! use common::store::{StoreConfig, init_session, health_check};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoreConfig::from_env()?;
//!     let session = init_session(&config).await?;
//!     let is_healthy = health_check(&session).await?;
//!     println!("Store health check: {}", is_healthy);
//!     Ok(())
//! }
//! ```

use crate::error::{StoreError, StoreResult};
use config::{Config, Environment};
use scylla::statement::Consistency;
use scylla::{Session, SessionBuilder};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};

/// Consistency level requested for a class of statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyLevel {
    Any,
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    LocalOne,
}

impl From<ConsistencyLevel> for Consistency {
    fn from(level: ConsistencyLevel) -> Self {
        match level {
            ConsistencyLevel::Any => Consistency::Any,
            ConsistencyLevel::One => Consistency::One,
            ConsistencyLevel::Two => Consistency::Two,
            ConsistencyLevel::Three => Consistency::Three,
            ConsistencyLevel::Quorum => Consistency::Quorum,
            ConsistencyLevel::All => Consistency::All,
            ConsistencyLevel::LocalQuorum => Consistency::LocalQuorum,
            ConsistencyLevel::EachQuorum => Consistency::EachQuorum,
            ConsistencyLevel::LocalOne => Consistency::LocalOne,
        }
    }
}

/// Read and write consistency applied to prepared statements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsistencySettings {
    /// Point lookups and link scans
    pub read: ConsistencyLevel,
    /// Inserts, updates and deletes
    pub write: ConsistencyLevel,
}

impl Default for ConsistencySettings {
    fn default() -> Self {
        Self {
            read: ConsistencyLevel::One,
            write: ConsistencyLevel::Quorum,
        }
    }
}

/// Store configuration struct
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Comma separated list of contact points (`host:port`)
    pub known_nodes: String,
    /// Keyspace holding the user/role collections
    pub keyspace: String,
    /// Replication factor used when the keyspace is created
    pub replication_factor: u32,
    /// Connection timeout in seconds
    pub connection_timeout: u64,
    /// Consistency for reads
    pub read_consistency: ConsistencyLevel,
    /// Consistency for writes
    pub write_consistency: ConsistencyLevel,
}

impl StoreConfig {
    /// Create a new StoreConfig from environment variables
    ///
    /// # Environment Variables
    /// - `CASSANDRA_KNOWN_NODES`: contact points (default: "127.0.0.1:9042")
    /// - `CASSANDRA_KEYSPACE`: keyspace name (default: "userrole")
    /// - `CASSANDRA_REPLICATION_FACTOR`: replication factor (default: 1)
    /// - `CASSANDRA_CONNECTION_TIMEOUT`: connection timeout in seconds (default: 30)
    /// - `CASSANDRA_READ_CONSISTENCY`: read consistency (default: "one")
    /// - `CASSANDRA_WRITE_CONSISTENCY`: write consistency (default: "quorum")
    pub fn from_env() -> StoreResult<Self> {
        let config: StoreConfig = Config::builder()
            .set_default("known_nodes", "127.0.0.1:9042")?
            .set_default("keyspace", "userrole")?
            .set_default("replication_factor", 1)?
            .set_default("connection_timeout", 30)?
            .set_default("read_consistency", "one")?
            .set_default("write_consistency", "quorum")?
            .add_source(Environment::with_prefix("CASSANDRA"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot be turned into a working session
    pub fn validate(&self) -> StoreResult<()> {
        if self.nodes().is_empty() {
            return Err(StoreError::Configuration(
                "At least one known node is required".to_string(),
            ));
        }

        let mut chars = self.keyspace.chars();
        let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        if !starts_with_letter
            || self.keyspace.len() > 48
            || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(StoreError::Configuration(format!(
                "Invalid keyspace name: {}",
                self.keyspace
            )));
        }

        if self.replication_factor == 0 {
            return Err(StoreError::Configuration(
                "Replication factor must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Contact points as a list
    pub fn nodes(&self) -> Vec<&str> {
        self.known_nodes
            .split(',')
            .map(str::trim)
            .filter(|node| !node.is_empty())
            .collect()
    }

    /// Consistency levels to apply to prepared statements
    pub fn consistency(&self) -> ConsistencySettings {
        ConsistencySettings {
            read: self.read_consistency,
            write: self.write_consistency,
        }
    }
}

/// Initialize a session to the cluster
///
/// # Arguments
/// * `config` - Store configuration
///
/// # Returns
/// * `StoreResult<Session>` - Connected session or error
pub async fn init_session(config: &StoreConfig) -> StoreResult<Session> {
    info!("Connecting to cluster at {}", config.known_nodes);

    let session = SessionBuilder::new()
        .known_nodes(config.nodes())
        .connection_timeout(Duration::from_secs(config.connection_timeout))
        .build()
        .await
        .map_err(StoreError::Connection)?;

    info!("Cluster session initialized successfully");
    Ok(session)
}

/// Check cluster connectivity
///
/// # Arguments
/// * `session` - Connected session
///
/// # Returns
/// * `StoreResult<bool>` - True if the cluster answers, false otherwise
pub async fn health_check(session: &Session) -> StoreResult<bool> {
    match session
        .query("SELECT release_version FROM system.local", ())
        .await
    {
        Ok(_) => {
            info!("Store health check successful");
            Ok(true)
        }
        Err(e) => {
            error!("Store health check failed: {}", e);
            Ok(false)
        }
    }
}
