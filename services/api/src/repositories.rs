//! Repositories for database operations
//!
//! Each repository owns a pool handle and maps rows by hand. Business rules
//! that depend on current row state (availability, session status) are
//! checked inside the same transaction that performs the write, against rows
//! locked with `FOR UPDATE`.

use common::error::DatabaseError;

use crate::error::ApiError;

pub mod dashboard;
pub mod invoice;
pub mod order;
pub mod product;
pub mod session;
pub mod table;

pub use dashboard::DashboardRepository;
pub use invoice::InvoiceRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use session::SessionRepository;
pub use table::TableRepository;

/// Turn a unique-constraint failure into a Conflict, anything else into a database error
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: impl Into<String>) -> ApiError {
    let err = DatabaseError::from(err);
    if err.is_unique_violation() {
        ApiError::Conflict(message.into())
    } else {
        ApiError::Database(err)
    }
}

/// Clamp a minute count into an INTEGER column
pub(crate) fn minutes_column(minutes: i64) -> i32 {
    i32::try_from(minutes).unwrap_or(i32::MAX)
}
