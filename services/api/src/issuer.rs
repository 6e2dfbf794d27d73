//! Invoice issuer
//!
//! Freezes the billing breakdown of a finished session into an invoice row.
//! The invoice copies everything it shows (table name, rate, times, order
//! lines) so later edits to the session or catalog never change it.

use chrono::{DateTime, Utc};
use std::fmt::Write;
use tracing::warn;

use crate::{
    billing,
    error::{ApiError, ApiResult},
    models::{CreateInvoiceRequest, Invoice, NewInvoice, SessionOrder, TableSession},
    repositories::{InvoiceRepository, OrderRepository, SessionRepository, minutes_column},
};

#[derive(Clone)]
pub struct InvoiceIssuer {
    sessions: SessionRepository,
    orders: OrderRepository,
    invoices: InvoiceRepository,
}

impl InvoiceIssuer {
    pub fn new(
        sessions: SessionRepository,
        orders: OrderRepository,
        invoices: InvoiceRepository,
    ) -> Self {
        Self {
            sessions,
            orders,
            invoices,
        }
    }

    /// Issue the invoice for a completed or expired session
    pub async fn issue_for_session(
        &self,
        session_id: i64,
        actor_id: i64,
        now: DateTime<Utc>,
    ) -> ApiResult<Invoice> {
        let session = self.sessions.find_by_id(session_id).await?.ok_or_else(|| {
            ApiError::Internal(format!("session {} could not be loaded", session_id))
        })?;

        if !session.status.is_terminal() {
            warn!("Not invoicing session {} while it is {}", session_id, session.status);
            return Err(ApiError::Conflict(format!(
                "Session {} has not ended",
                session_id
            )));
        }

        let orders_total = self.orders.total_for_session(session_id).await?;
        let lines = self.orders.service_lines(session_id).await?;

        let invoice = session_invoice(&session, orders_total, &lines, actor_id, now);
        self.invoices.create(&invoice).await
    }

    /// Issue a manual invoice that is not tied to any session
    pub async fn issue_manual(&self, req: &CreateInvoiceRequest, actor_id: i64) -> ApiResult<Invoice> {
        let invoice = manual_invoice(req, actor_id).map_err(ApiError::Validation)?;
        self.invoices.create(&invoice).await
    }
}

/// One line per billable order: `- {name} x{qty}: {total} VND ({note})`
pub fn render_services_detail(lines: &[SessionOrder]) -> String {
    let mut detail = String::new();
    for line in lines {
        let _ = write!(
            detail,
            "- {} x{}: {:.0} VND",
            line.product_name, line.quantity, line.total_price
        );
        if let Some(note) = line.note.as_deref().filter(|n| !n.is_empty()) {
            let _ = write!(detail, " ({})", note);
        }
        detail.push('\n');
    }
    detail
}

/// Build the invoice row for a terminated session. `now` is only used when
/// the session carries no recorded end time.
pub fn session_invoice(
    session: &TableSession,
    orders_total: f64,
    lines: &[SessionOrder],
    actor_id: i64,
    now: DateTime<Utc>,
) -> NewInvoice {
    let end_time = session.end_time.unwrap_or(now);
    let breakdown = billing::compute_amount(session, orders_total, end_time);
    let discount = 0.0;

    NewInvoice {
        session_id: Some(session.id),
        customer_name: Some(session.customer_name.clone()),
        table_name: session.table_name.clone(),
        start_time: session.start_time,
        end_time,
        play_duration_minutes: minutes_column(breakdown.actual_minutes),
        hourly_rate: session.hourly_rate,
        table_amount: breakdown.table_amount,
        orders_amount: breakdown.orders_amount,
        discount,
        amount: billing::invoice_amount(breakdown.table_amount, breakdown.orders_amount, discount),
        services_detail: render_services_detail(lines),
        created_by: actor_id,
    }
}

/// Build a manual invoice from caller-supplied figures
pub fn manual_invoice(req: &CreateInvoiceRequest, actor_id: i64) -> Result<NewInvoice, String> {
    let time_total = billing::time_charge(i64::from(req.play_duration_minutes), req.hourly_rate);
    let subtotal = time_total + req.service_total;
    if req.discount > subtotal {
        return Err("discount must not exceed the invoice subtotal".to_string());
    }

    Ok(NewInvoice {
        session_id: None,
        customer_name: req
            .customer_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        table_name: req.table_name.trim().to_string(),
        start_time: req.start_time,
        end_time: req.end_time,
        play_duration_minutes: req.play_duration_minutes,
        hourly_rate: req.hourly_rate,
        table_amount: time_total,
        orders_amount: req.service_total,
        discount: req.discount,
        amount: billing::invoice_amount(time_total, req.service_total, req.discount),
        services_detail: req.services_detail.clone(),
        created_by: actor_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::tests::session;
    use crate::models::{OrderStatus, SessionStatus, SessionType};
    use chrono::Duration;

    fn line(name: &str, quantity: i32, total: f64, note: Option<&str>) -> SessionOrder {
        SessionOrder {
            id: 1,
            session_id: 1,
            product_id: 1,
            product_name: name.to_string(),
            quantity,
            unit_price: total / f64::from(quantity),
            total_price: total,
            note: note.map(str::to_string),
            status: OrderStatus::Served,
            ordered_at: Utc::now(),
        }
    }

    #[test]
    fn test_render_services_detail() {
        let detail = render_services_detail(&[
            line("Iced tea", 2, 40_000.0, None),
            line("Instant noodles", 1, 25_000.0, Some("no chili")),
            line("Chalk", 1, 5_000.0, Some("")),
        ]);

        assert_eq!(
            detail,
            "- Iced tea x2: 40000 VND\n\
             - Instant noodles x1: 25000 VND (no chili)\n\
             - Chalk x1: 5000 VND\n"
        );
        assert_eq!(render_services_detail(&[]), "");
    }

    #[test]
    fn test_session_invoice_matches_preview() {
        let mut s = session(SessionType::FixedTime, 90, 100_000.0);
        s.status = SessionStatus::Completed;
        s.end_time = Some(s.start_time + Duration::minutes(95));
        s.actual_duration_minutes = Some(95);

        let lines = [line("Iced tea", 2, 40_000.0, None)];
        let invoice = session_invoice(&s, 40_000.0, &lines, 7, Utc::now());
        let preview = billing::compute_amount(&s, 40_000.0, s.end_time.unwrap());

        assert_eq!(invoice.table_amount, preview.table_amount);
        assert_eq!(invoice.amount, preview.total_amount);
        assert_eq!(invoice.amount, 190_000.0);
        assert_eq!(invoice.play_duration_minutes, 90);
        assert_eq!(invoice.discount, 0.0);
        assert_eq!(invoice.session_id, Some(1));
        assert_eq!(invoice.table_name, "Table 1");
        assert_eq!(invoice.customer_name.as_deref(), Some("Minh"));
        assert_eq!(invoice.end_time, s.end_time.unwrap());
        assert_eq!(invoice.created_by, 7);
        assert_eq!(invoice.services_detail, "- Iced tea x2: 40000 VND\n");
    }

    #[test]
    fn test_session_invoice_bills_recorded_open_play_duration() {
        let mut s = session(SessionType::OpenPlay, 60, 60_000.0);
        s.status = SessionStatus::Expired;
        s.end_time = Some(s.start_time + Duration::minutes(75));
        s.actual_duration_minutes = Some(75);

        let invoice = session_invoice(&s, 0.0, &[], 1, s.start_time + Duration::hours(5));
        assert_eq!(invoice.play_duration_minutes, 75);
        assert_eq!(invoice.table_amount, 75_000.0);
        assert_eq!(invoice.amount, 75_000.0);
    }

    fn manual_request() -> CreateInvoiceRequest {
        let start = Utc::now();
        CreateInvoiceRequest {
            table_name: " VIP 2 ".to_string(),
            customer_name: Some("  ".to_string()),
            start_time: start,
            end_time: start + Duration::minutes(120),
            play_duration_minutes: 120,
            hourly_rate: 50_000.0,
            services_detail: "- Beer x3: 60000 VND\n".to_string(),
            service_total: 60_000.0,
            discount: 10_000.0,
        }
    }

    #[test]
    fn test_manual_invoice_amount() {
        let invoice = manual_invoice(&manual_request(), 3).unwrap();
        assert_eq!(invoice.table_amount, 100_000.0);
        assert_eq!(invoice.orders_amount, 60_000.0);
        assert_eq!(invoice.amount, 150_000.0);
        assert_eq!(invoice.session_id, None);
        assert_eq!(invoice.customer_name, None);
        assert_eq!(invoice.table_name, "VIP 2");
    }

    #[test]
    fn test_manual_invoice_rejects_oversized_discount() {
        let mut req = manual_request();
        req.discount = 160_001.0;
        assert!(manual_invoice(&req, 3).is_err());

        req.discount = 160_000.0;
        assert_eq!(manual_invoice(&req, 3).unwrap().amount, 0.0);
    }
}
