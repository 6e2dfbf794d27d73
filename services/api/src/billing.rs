//! Billing calculator
//!
//! The only place table time is turned into money. The live preview endpoint
//! and the invoice issuer both go through [`compute_amount`], so a preview
//! taken at the moment a session ends matches the invoice written for it.
//! Every function is pure; callers read the clock once and pass `now` in.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{SessionType, TableSession};

/// Money breakdown for one session
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AmountBreakdown {
    pub actual_minutes: i64,
    pub table_amount: f64,
    pub orders_amount: f64,
    pub total_amount: f64,
}

/// Whole minutes between `start` and `now`, truncated and never negative
pub fn elapsed_minutes(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - start).num_minutes().max(0)
}

/// Minutes of table time the customer pays for.
///
/// Fixed-time sessions pay for the committed preset. Open-play sessions pay
/// for the duration recorded when they ended, or the time elapsed so far.
pub fn billable_minutes(session: &TableSession, now: DateTime<Utc>) -> i64 {
    match session.session_type {
        SessionType::FixedTime => i64::from(session.preset_duration_minutes),
        SessionType::OpenPlay => session
            .actual_duration_minutes
            .map(i64::from)
            .unwrap_or_else(|| elapsed_minutes(session.start_time, now)),
    }
}

pub fn time_charge(minutes: i64, hourly_rate: f64) -> f64 {
    (minutes as f64 / 60.0) * hourly_rate
}

/// Compute the breakdown using the session's rate snapshot. No discount applies here.
pub fn compute_amount(
    session: &TableSession,
    orders_total: f64,
    now: DateTime<Utc>,
) -> AmountBreakdown {
    let actual_minutes = billable_minutes(session, now);
    let table_amount = time_charge(actual_minutes, session.hourly_rate);

    AmountBreakdown {
        actual_minutes,
        table_amount,
        orders_amount: orders_total,
        total_amount: table_amount + orders_total,
    }
}

/// Final invoice amount once a discount is known
pub fn invoice_amount(table_amount: f64, orders_amount: f64, discount: f64) -> f64 {
    table_amount + orders_amount - discount
}
