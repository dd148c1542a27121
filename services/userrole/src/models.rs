//! User/role service models

pub mod role;
pub mod user;

// Re-export for convenience
pub use role::{Role, UserRole};
pub use user::User;
