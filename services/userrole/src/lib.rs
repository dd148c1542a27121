//! User/role management over a wide-column store
//!
//! Users and roles live in their own collections and are joined through a
//! `user_roles` link collection (optionally mirrored by `role_users`). The
//! [`Gateway`] owns a store client and exposes the create/fetch/update/delete
//! operations on top of it.

pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod repositories;
pub mod schema;

pub use crate::config::{GatewayOptions, RoleWriteMode};
pub use crate::error::{Entity, GatewayError, GatewayResult};
pub use crate::gateway::Gateway;
pub use crate::models::{Role, User, UserRole};
