//! Payment expiry sweeper.
//!
//! Ticks every 10 seconds; any payment still `WAITING` past the configured
//! threshold is marked `FAILED` and its callback is posted, same as a
//! user-driven finalization. Per-payment failures are logged and do not
//! abort the batch.

use std::time::Duration;

use crate::models::PaymentStatus;
use crate::service::PaymentService;

const TICK_INTERVAL: Duration = Duration::from_secs(10);

/// Runs the payment expiry sweeper until cancelled.
///
/// `threshold_seconds` is the maximum age, in seconds, a `WAITING` payment
/// may reach before being swept to `FAILED`.
pub async fn run(service: PaymentService, threshold_seconds: i64) {
    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    loop {
        ticker.tick().await;
        sweep_once(&service, threshold_seconds).await;
    }
}

async fn sweep_once(service: &PaymentService, threshold_seconds: i64) {
    let expired = match service.find_expired_waiting(threshold_seconds).await {
        Ok(payments) => payments,
        Err(e) => {
            tracing::warn!(error = %e, "payment sweeper: failed to query expired payments");
            return;
        }
    };

    if expired.is_empty() {
        return;
    }

    tracing::info!(count = expired.len(), "payment sweeper: expiring waiting payments");
    metrics::counter!("payment_sweeper_expired_total").increment(expired.len() as u64);

    for payment in expired {
        if let Err(e) = service
            .expire_payment(&payment.transaction_id, PaymentStatus::Failed)
            .await
        {
            tracing::warn!(
                transaction_id = %payment.transaction_id,
                error = %e,
                "payment sweeper: failed to expire payment"
            );
        }
    }
}
