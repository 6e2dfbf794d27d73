//! Billiard-hall API: tables, timed play sessions, orders, invoices,
//! reports and the dashboard, behind bearer-token authentication.

pub mod billing;
pub mod config;
pub mod error;
pub mod extract;
pub mod issuer;
pub mod middleware;
pub mod models;
pub mod period;
pub mod repositories;
pub mod routes;
pub mod scheduler;
pub mod state;
pub mod validation;

pub use state::AppState;
