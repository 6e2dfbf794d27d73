//! Authentication service models

pub mod role;
pub mod user;

// Re-export for convenience
pub use role::{ParseRoleError, Role};
pub use user::{User, UserInfo};
