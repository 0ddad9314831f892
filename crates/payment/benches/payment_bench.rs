use std::sync::Arc;

use common::Money;
use criterion::{Criterion, criterion_group, criterion_main};
use payment::callback::{CallbackClient, CallbackError};
use payment::{InMemoryPaymentRepository, PaymentService, PaymentStatus};

struct NoopCallback;

#[async_trait::async_trait]
impl CallbackClient for NoopCallback {
    async fn callback_transaction(
        &self,
        _transaction_id: &str,
        _status: PaymentStatus,
    ) -> Result<(), CallbackError> {
        Ok(())
    }
}

fn bench_process_payment(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = PaymentService::new(
        Arc::new(InMemoryPaymentRepository::new()),
        Arc::new(NoopCallback),
    );

    c.bench_function("payment/process_payment", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .process_payment(uuid::Uuid::new_v4(), &Money::new(5000, "USD"))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_update_payment_round_trip(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = PaymentService::new(
        Arc::new(InMemoryPaymentRepository::new()),
        Arc::new(NoopCallback),
    );

    c.bench_function("payment/process_and_update_payment", |b| {
        b.iter(|| {
            rt.block_on(async {
                let payment = service
                    .process_payment(uuid::Uuid::new_v4(), &Money::new(5000, "USD"))
                    .await
                    .unwrap();
                service
                    .update_payment(&payment.transaction_id, &Money::new(5000, "USD"))
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_process_payment, bench_update_payment_round_trip);
criterion_main!(benches);
