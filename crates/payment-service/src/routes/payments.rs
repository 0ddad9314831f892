//! Payment transaction lifecycle: `ProcessPayment`, `UpdatePayment`,
//! `RollbackPayment`, `GetPayment`.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{AggregateId, Money};
use payment::{Payment, PaymentService};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Deserialize)]
pub struct ProcessPaymentRequest {
    pub order_id: AggregateId,
    pub total_amount: Money,
}

#[derive(Serialize)]
pub struct ProcessPaymentResponse {
    pub transaction_id: String,
}

/// POST /payments — `ProcessPayment(orderId, totalAmount)`.
///
/// Creates a `WAITING` payment with a freshly generated transaction ID.
pub async fn process(
    State(service): State<Arc<PaymentService>>,
    Json(req): Json<ProcessPaymentRequest>,
) -> Result<Json<ProcessPaymentResponse>, ApiError> {
    let payment = service
        .process_payment(req.order_id.into(), &req.total_amount)
        .await?;

    Ok(Json(ProcessPaymentResponse {
        transaction_id: payment.transaction_id,
    }))
}

/// GET /payments/{transaction_id} — `GetPayment(transactionId)`.
pub async fn get(
    State(service): State<Arc<PaymentService>>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    let payment = service.get_payment(&transaction_id).await?;
    Ok(Json(payment))
}

#[derive(Deserialize)]
pub struct UpdatePaymentRequest {
    pub submitted_amount: Money,
}

/// POST /payments/{transaction_id}/update — `UpdatePayment(transactionId,
/// submittedAmount)`.
///
/// Finalizes the payment to `PAID` or `FAILED` depending on whether the
/// submitted amount matches the stored total, then posts the order-service
/// callback. Idempotent once the payment has left `WAITING`.
pub async fn update(
    State(service): State<Arc<PaymentService>>,
    Path(transaction_id): Path<String>,
    Json(req): Json<UpdatePaymentRequest>,
) -> Result<Json<Payment>, ApiError> {
    let payment = service
        .update_payment(&transaction_id, &req.submitted_amount)
        .await?;
    Ok(Json(payment))
}

/// POST /payments/{transaction_id}/rollback — `RollbackPayment(transactionId)`.
///
/// Rolls a `WAITING` payment back to `CANCELLED`.
pub async fn rollback(
    State(service): State<Arc<PaymentService>>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    let payment = service.rollback_payment(&transaction_id).await?;
    Ok(Json(payment))
}
