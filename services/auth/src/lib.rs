//! Staff authentication: user store, password verification, login rate
//! limiting and JWT issuance.

pub mod models;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod validation;

use anyhow::Result;
use common::jwt::JwtService;
use tracing::info;

use crate::{rate_limiter::RateLimiter, repositories::UserRepository};

/// Application state shared across auth handlers
#[derive(Clone)]
pub struct AuthState {
    pub jwt_service: JwtService,
    pub user_repository: UserRepository,
    pub rate_limiter: RateLimiter,
}

/// Seed the admin account from `ADMIN_USERNAME` (default `admin`) and
/// `ADMIN_PASSWORD`. Nothing happens when `ADMIN_PASSWORD` is unset.
pub async fn seed_admin_from_env(user_repository: &UserRepository) -> Result<()> {
    let Ok(password) = std::env::var("ADMIN_PASSWORD") else {
        info!("ADMIN_PASSWORD not set, skipping admin seeding");
        return Ok(());
    };
    let username = std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());

    validation::validate_username(&username).map_err(anyhow::Error::msg)?;
    validation::validate_password(&password).map_err(anyhow::Error::msg)?;

    if user_repository.ensure_admin(&username, &password).await? {
        info!("Created admin account {}", username);
    }

    Ok(())
}
