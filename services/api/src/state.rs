//! Application state shared across handlers

use auth::{AuthState, rate_limiter::RateLimiter, repositories::UserRepository};
use chrono::FixedOffset;
use common::jwt::JwtService;
use sqlx::PgPool;

use crate::{
    issuer::InvoiceIssuer,
    repositories::{
        DashboardRepository, InvoiceRepository, OrderRepository, ProductRepository,
        SessionRepository, TableRepository,
    },
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_service: JwtService,
    /// Offset of the hall's local time, for day and month boundaries
    pub business_offset: FixedOffset,
    pub table_repository: TableRepository,
    pub session_repository: SessionRepository,
    pub order_repository: OrderRepository,
    pub product_repository: ProductRepository,
    pub invoice_repository: InvoiceRepository,
    pub dashboard_repository: DashboardRepository,
    pub invoice_issuer: InvoiceIssuer,
    pub auth: AuthState,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        jwt_service: JwtService,
        rate_limiter: RateLimiter,
        business_offset: FixedOffset,
    ) -> Self {
        let session_repository = SessionRepository::new(pool.clone());
        let order_repository = OrderRepository::new(pool.clone());
        let invoice_repository = InvoiceRepository::new(pool.clone());
        let invoice_issuer = InvoiceIssuer::new(
            session_repository.clone(),
            order_repository.clone(),
            invoice_repository.clone(),
        );

        let auth = AuthState {
            jwt_service: jwt_service.clone(),
            user_repository: UserRepository::new(pool.clone()),
            rate_limiter,
        };

        Self {
            table_repository: TableRepository::new(pool.clone()),
            product_repository: ProductRepository::new(pool.clone()),
            dashboard_repository: DashboardRepository::new(pool.clone()),
            session_repository,
            order_repository,
            invoice_repository,
            invoice_issuer,
            jwt_service,
            business_offset,
            auth,
            db_pool: pool,
        }
    }
}
