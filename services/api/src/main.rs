use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::{AppState, config::ApiConfig, routes, scheduler};
use auth::{
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::UserRepository,
};
use common::{
    database,
    jwt::{JwtConfig, JwtService},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .init();

    info!("Starting API service");

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    database::run_migrations(&pool).await?;

    let api_config = ApiConfig::from_env()?;
    let jwt_service = JwtService::new(JwtConfig::from_env()?);
    let rate_limiter = RateLimiter::new(RateLimiterConfig::from_env()?);

    auth::seed_admin_from_env(&UserRepository::new(pool.clone())).await?;

    let app_state = AppState::new(
        pool,
        jwt_service,
        rate_limiter,
        api_config.business_offset()?,
    );

    // Dropping the scheduler handle would stop the job
    let _expiry_job = if api_config.expire_job_enabled {
        Some(scheduler::start_expiry_job(app_state.clone(), &api_config.expire_schedule).await?)
    } else {
        info!("Auto-expire job disabled");
        None
    };

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&api_config.bind_address).await?;
    info!("API service listening on {}", api_config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
