//! Common library for the user/role service
//!
//! This crate provides shared functionality used by the service crates,
//! including cluster connectivity, consistency settings and the store error
//! type.

pub mod error;
pub mod store;
