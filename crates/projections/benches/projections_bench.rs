use common::{AggregateId, Money, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{DomainEvent, OrderEvent, OrderItem};
use event_store::{AppendOptions, EventEnvelope, InMemoryEventStore, Version, store::EventStore};
use projections::{OrderListFilter, OrderListView, Projection, ProjectionProcessor};

use std::sync::Arc;

fn make_envelope(aggregate_id: AggregateId, version: i64, event: &OrderEvent) -> EventEnvelope {
    EventEnvelope::builder()
        .aggregate_id(aggregate_id)
        .aggregate_type("Order")
        .event_type(DomainEvent::event_type(event))
        .version(Version::new(version))
        .payload(event)
        .unwrap()
        .build()
}

fn sample_items() -> Vec<OrderItem> {
    vec![OrderItem::new("SKU-001", "Widget", 2, Money::new(1000, "USD"))]
}

/// Populate a store with N orders, each having 2 events (created + stock reserved).
async fn populate_store(store: &InMemoryEventStore, user_id: UserId, n: usize) {
    for _ in 0..n {
        let agg_id = AggregateId::new();

        let created = OrderEvent::order_created(
            agg_id,
            "idem",
            user_id,
            sample_items(),
            Money::new(2000, "USD"),
        );
        let reserved = OrderEvent::stock_reserved("TX00001");

        let events = vec![
            make_envelope(agg_id, 1, &created),
            make_envelope(agg_id, 2, &reserved),
        ];
        store.append(events, AppendOptions::new()).await.unwrap();
    }
}

fn bench_catch_up_100_orders(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let user_id = UserId::new();

    rt.block_on(populate_store(&store, user_id, 100));

    c.bench_function("projections/catch_up_200_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let view = OrderListView::new();
                let mut processor = ProjectionProcessor::new(store.clone());
                processor.register(Box::new(view.clone()) as Box<dyn Projection>);
                processor.run_catch_up().await.unwrap();
            });
        });
    });
}

fn bench_catch_up_1000_orders(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let user_id = UserId::new();

    rt.block_on(populate_store(&store, user_id, 1000));

    c.bench_function("projections/catch_up_2000_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let view = OrderListView::new();
                let mut processor = ProjectionProcessor::new(store.clone());
                processor.register(Box::new(view.clone()) as Box<dyn Projection>);
                processor.run_catch_up().await.unwrap();
            });
        });
    });
}

fn bench_process_single_event(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let view = Arc::new(OrderListView::new());
    let user_id = UserId::new();

    c.bench_function("projections/process_single_event", |b| {
        b.iter(|| {
            rt.block_on(async {
                let agg_id = AggregateId::new();
                let event = OrderEvent::order_created(
                    agg_id,
                    "idem",
                    user_id,
                    sample_items(),
                    Money::new(2000, "USD"),
                );
                let envelope = make_envelope(agg_id, 1, &event);
                view.handle(&envelope).await.unwrap();
            });
        });
    });
}

fn bench_query_order_list(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let view = Arc::new(OrderListView::new());
    let user_id = UserId::new();

    rt.block_on(async {
        populate_store(&store, user_id, 100).await;
        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(view.as_ref().clone()) as Box<dyn Projection>);
        processor.run_catch_up().await.unwrap();
    });

    c.bench_function("projections/query_100_orders_for_user", |b| {
        b.iter(|| {
            rt.block_on(async {
                view.list_orders(user_id, &OrderListFilter::default()).await;
            });
        });
    });
}

fn bench_query_order_list_by_status(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let view = Arc::new(OrderListView::new());
    let user_id = UserId::new();

    rt.block_on(async {
        populate_store(&store, user_id, 100).await;
        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(view.as_ref().clone()) as Box<dyn Projection>);
        processor.run_catch_up().await.unwrap();
    });

    let filter = OrderListFilter {
        status: Some(domain::OrderState::StockReserved),
        ..Default::default()
    };

    c.bench_function("projections/query_100_orders_by_status", |b| {
        b.iter(|| {
            rt.block_on(async {
                view.list_orders(user_id, &filter).await;
            });
        });
    });
}

fn bench_rebuild_100_orders(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let view = Arc::new(OrderListView::new());
    let user_id = UserId::new();

    rt.block_on(async {
        populate_store(&store, user_id, 100).await;
    });

    let mut processor = ProjectionProcessor::new(store);
    processor.register(Box::new(view.as_ref().clone()) as Box<dyn Projection>);
    let processor = Arc::new(processor);

    c.bench_function("projections/rebuild_200_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                processor.rebuild_all().await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_catch_up_100_orders,
    bench_catch_up_1000_orders,
    bench_process_single_event,
    bench_query_order_list,
    bench_query_order_list_by_status,
    bench_rebuild_100_orders,
);
criterion_main!(benches);
