//! Saga coordinator for orchestrating the checkout saga.

use common::AggregateId;
use domain::{Aggregate, DomainEvent, FailOrder, MarkStockReserved, OrderService, OrderState};
use event_store::{AppendOptions, EventEnvelope, EventStore, Version};

use crate::aggregate::SagaInstance;
use crate::error::SagaError;
use crate::events::SagaEvent;
use crate::order_fulfillment;
use crate::services::payment::PaymentGateway;
use crate::services::warehouse::{ReservationItem, WarehouseGateway};

/// Orchestrates the checkout saga once an order has been persisted in
/// `PENDING`.
///
/// The coordinator drives a 2-step saga (reserve stock → process payment)
/// with a single compensating action — `ReleaseStock` — on payment failure.
/// The saga itself is event-sourced; the order's own status transitions
/// (`mark_stock_reserved` / `fail`) are recorded separately on the order
/// aggregate so the order's state machine remains the source of truth for
/// `GetOrder`/`GetOrderList`.
pub struct SagaCoordinator<S, W, P>
where
    S: EventStore,
    W: WarehouseGateway,
    P: PaymentGateway,
{
    store: S,
    order_service: OrderService<S>,
    warehouse: W,
    payment: P,
}

impl<S, W, P> SagaCoordinator<S, W, P>
where
    S: EventStore + Clone,
    W: WarehouseGateway,
    P: PaymentGateway,
{
    /// Creates a new saga coordinator.
    pub fn new(store: S, warehouse: W, payment: P) -> Self {
        let order_service = OrderService::new(store.clone());
        Self {
            store,
            order_service,
            warehouse,
            payment,
        }
    }

    /// Executes the checkout saga for an order already persisted in
    /// `PENDING` with its item snapshot and total.
    ///
    /// Corresponds to steps 6-8 of the `CreateOrder` contract: reserve
    /// stock, process payment, and — on success of both — mark the order
    /// `STOCK_RESERVED` with the new transaction ID. Returns the saga
    /// instance ID; the order itself carries the outcome (`STOCK_RESERVED`
    /// on success, `FAILED` on either step's failure).
    #[tracing::instrument(skip(self), fields(saga_type = "OrderFulfillment"))]
    pub async fn execute_saga(&self, order_id: AggregateId) -> Result<AggregateId, SagaError> {
        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = std::time::Instant::now();

        let order = self
            .order_service
            .get_order(order_id)
            .await?
            .ok_or(SagaError::OrderNotFound(order_id))?;

        if order.status() != OrderState::Pending {
            return Err(SagaError::OrderNotReady(format!(
                "Order is in {} state, expected Pending",
                order.status()
            )));
        }

        if !order.has_items() {
            return Err(SagaError::OrderNotReady("Order has no items".to_string()));
        }

        let user_id = order
            .user_id()
            .ok_or_else(|| SagaError::OrderNotReady("Order has no user ID".to_string()))?;
        let total_amount = order
            .total_amount()
            .cloned()
            .ok_or_else(|| SagaError::OrderNotReady("Order has no total amount".to_string()))?;
        let items: Vec<ReservationItem> = order
            .items()
            .iter()
            .map(|item| ReservationItem {
                product_id: item.product_id.clone(),
                product_name: item.product_name.clone(),
                quantity: item.quantity,
            })
            .collect();

        let saga_id = AggregateId::new();
        let mut version = Version::initial();

        let started_event =
            SagaEvent::saga_started(saga_id, order_id, order_fulfillment::SAGA_TYPE);
        version = self
            .append_saga_event(saga_id, version, &started_event)
            .await?;

        let mut saga = SagaInstance::default();
        saga.apply(started_event);

        // Step 1: Reserve stock
        tracing::info!(step = order_fulfillment::STEP_RESERVE_STOCK, "saga step started");
        let step1_started = SagaEvent::step_started(order_fulfillment::STEP_RESERVE_STOCK);
        version = self
            .append_saga_event(saga_id, version, &step1_started)
            .await?;
        saga.apply(step1_started);

        if let Err(e) = self.warehouse.reserve_stock(order_id, user_id, &items).await {
            let step1_failed = SagaEvent::step_failed(order_fulfillment::STEP_RESERVE_STOCK, e.to_string());
            version = self
                .append_saga_event(saga_id, version, &step1_failed)
                .await?;
            saga.apply(step1_failed);

            self.fail_saga(&mut saga, saga_id, &mut version, order_id, false)
                .await?;
            metrics::histogram!("saga_duration_seconds").record(saga_start.elapsed().as_secs_f64());
            return Ok(saga_id);
        }

        let step1_completed = SagaEvent::step_completed(order_fulfillment::STEP_RESERVE_STOCK, None);
        version = self
            .append_saga_event(saga_id, version, &step1_completed)
            .await?;
        saga.apply(step1_completed);

        // Step 2: Process payment
        tracing::info!(step = order_fulfillment::STEP_PROCESS_PAYMENT, "saga step started");
        let step2_started = SagaEvent::step_started(order_fulfillment::STEP_PROCESS_PAYMENT);
        version = self
            .append_saga_event(saga_id, version, &step2_started)
            .await?;
        saga.apply(step2_started);

        let transaction_id = match self.payment.process_payment(order_id, &total_amount).await {
            Ok(transaction_id) => transaction_id,
            Err(e) => {
                let step2_failed =
                    SagaEvent::step_failed(order_fulfillment::STEP_PROCESS_PAYMENT, e.to_string());
                version = self
                    .append_saga_event(saga_id, version, &step2_failed)
                    .await?;
                saga.apply(step2_failed);

                // Compensate the reservation made in step 1, then fail the order.
                self.fail_saga(&mut saga, saga_id, &mut version, order_id, true)
                    .await?;
                metrics::histogram!("saga_duration_seconds").record(saga_start.elapsed().as_secs_f64());
                return Ok(saga_id);
            }
        };

        let step2_completed = SagaEvent::step_completed(
            order_fulfillment::STEP_PROCESS_PAYMENT,
            Some(transaction_id.clone()),
        );
        version = self
            .append_saga_event(saga_id, version, &step2_completed)
            .await?;
        saga.apply(step2_completed);

        // Both steps succeeded: advance the order to STOCK_RESERVED. Per the
        // CreateOrder contract, a failure here is surfaced but not
        // compensated — the sweeper and the payment callback's
        // FAILED_PRECONDITION check are the safety net.
        self.order_service
            .mark_stock_reserved(MarkStockReserved::new(order_id, transaction_id))
            .await?;

        let completed_event = SagaEvent::saga_completed();
        self.append_saga_event(saga_id, version, &completed_event)
            .await?;

        let duration = saga_start.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds").record(duration);
        metrics::counter!("saga_completed").increment(1);
        tracing::info!(%saga_id, duration, "saga completed successfully");

        Ok(saga_id)
    }

    /// Fails the saga: optionally releases stock reserved in step 1, marks
    /// the order `FAILED`, and records the saga's own failure.
    #[tracing::instrument(skip(self, saga))]
    async fn fail_saga(
        &self,
        saga: &mut SagaInstance,
        saga_id: AggregateId,
        version: &mut Version,
        order_id: AggregateId,
        release_stock: bool,
    ) -> Result<(), SagaError> {
        let failed_step = saga.failure_reason().unwrap_or("unknown").to_string();

        if release_stock {
            let comp_started = SagaEvent::compensation_started(&failed_step);
            *version = self
                .append_saga_event(saga_id, *version, &comp_started)
                .await?;
            saga.apply(comp_started);

            match self.warehouse.release_stock(order_id).await {
                Ok(()) => {
                    let event = SagaEvent::compensation_step_completed(
                        order_fulfillment::STEP_RESERVE_STOCK,
                    );
                    *version = self.append_saga_event(saga_id, *version, &event).await?;
                    saga.apply(event);
                }
                Err(e) => {
                    // Best-effort: the release failure is logged and the
                    // sweeper is relied on to reconcile. It never masks the
                    // original payment failure.
                    tracing::warn!(%order_id, error = %e, "release_stock compensation failed");
                    let event = SagaEvent::compensation_step_failed(
                        order_fulfillment::STEP_RESERVE_STOCK,
                        e.to_string(),
                    );
                    *version = self.append_saga_event(saga_id, *version, &event).await?;
                    saga.apply(event);
                }
            }
        }

        if let Err(e) = self
            .order_service
            .fail_order(FailOrder::new(order_id, failed_step.clone()))
            .await
        {
            tracing::warn!(%order_id, error = %e, "failed to mark order FAILED after saga failure");
        }

        let failed_event = SagaEvent::saga_failed(format!("Step failed: {}", failed_step));
        *version = self.append_saga_event(saga_id, *version, &failed_event).await?;
        saga.apply(failed_event);

        metrics::counter!("saga_failed").increment(1);
        tracing::warn!(%saga_id, %order_id, reason = %failed_step, "saga failed");

        Ok(())
    }

    /// Loads a saga instance by ID from the event store.
    pub async fn get_saga(&self, saga_id: AggregateId) -> Result<Option<SagaInstance>, SagaError> {
        let events = self.store.get_events_for_aggregate(saga_id).await?;

        if events.is_empty() {
            return Ok(None);
        }

        let mut saga = SagaInstance::default();
        for envelope in events {
            let event: SagaEvent = serde_json::from_value(envelope.payload)?;
            saga.apply(event);
        }
        Ok(Some(saga))
    }

    /// Appends a single saga event to the event store.
    async fn append_saga_event(
        &self,
        saga_id: AggregateId,
        current_version: Version,
        event: &SagaEvent,
    ) -> Result<Version, SagaError> {
        let next_version = current_version.next();

        let envelope = EventEnvelope::builder()
            .event_type(event.event_type())
            .aggregate_id(saga_id)
            .aggregate_type(SagaInstance::aggregate_type())
            .version(next_version)
            .payload(event)?
            .build();

        let new_version = self
            .store
            .append(
                vec![envelope],
                AppendOptions::expect_version(current_version),
            )
            .await?;

        Ok(new_version)
    }
}
