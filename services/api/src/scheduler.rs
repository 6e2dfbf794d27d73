//! Periodic auto-expiry of sessions that ran out of time

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::{
    error::ApiResult,
    models::{ExpireSummary, InvoiceFailure},
    state::AppState,
};

/// Expire due sessions, then invoice each of them.
///
/// The expiry commits first; an invoice that fails is reported in the
/// summary and never undoes the expiry.
pub async fn expire_sessions(state: &AppState, now: DateTime<Utc>) -> ApiResult<ExpireSummary> {
    let expired = state.session_repository.expire_due(now).await?;

    let mut summary = ExpireSummary {
        expired_sessions: expired.iter().map(|s| s.session_id).collect(),
        ..ExpireSummary::default()
    };

    for session in &expired {
        match state
            .invoice_issuer
            .issue_for_session(session.session_id, session.created_by, now)
            .await
        {
            Ok(invoice) => summary.invoices_created.push(invoice.id),
            Err(e) => {
                warn!(
                    "Failed to invoice expired session {}: {}",
                    session.session_id, e
                );
                summary.invoice_errors.push(InvoiceFailure {
                    session_id: session.session_id,
                    error: e.public_message(),
                });
            }
        }
    }

    Ok(summary)
}

/// Run [`expire_sessions`] on a cron schedule
pub async fn start_expiry_job(state: AppState, schedule: &str) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_, _| {
        let state = state.clone();
        Box::pin(async move {
            match expire_sessions(&state, Utc::now()).await {
                Ok(summary) if !summary.expired_sessions.is_empty() => {
                    info!(
                        "Auto-expire job expired {} sessions, issued {} invoices",
                        summary.expired_sessions.len(),
                        summary.invoices_created.len()
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Auto-expire job failed: {}", e);
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("Started auto-expire scheduler with schedule: {}", schedule);
    Ok(scheduler)
}
