//! Integration tests: OrderService commands → ProjectionProcessor → OrderListView.

use common::{AggregateId, Money, UserId};
use domain::{CompleteOrder, CreateOrder, FailOrder, MarkStockReserved, OrderItem, OrderService, OrderState};
use event_store::{EventStore, InMemoryEventStore};
use projections::{OrderListFilter, OrderListView, Projection, ProjectionProcessor};

fn sample_items() -> Vec<OrderItem> {
    vec![OrderItem::new("SKU-001", "Widget", 3, Money::new(1000, "USD"))]
}

fn setup() -> (
    OrderService<InMemoryEventStore>,
    ProjectionProcessor<InMemoryEventStore>,
    OrderListView,
) {
    let store = InMemoryEventStore::new();
    let service = OrderService::new(store.clone());
    let view = OrderListView::new();

    let mut processor = ProjectionProcessor::new(store);
    processor.register(Box::new(view.clone()));

    (service, processor, view)
}

#[tokio::test]
async fn test_full_order_lifecycle_is_reflected_in_the_view() {
    let (service, processor, view) = setup();
    let user_id = UserId::new();

    let cmd = CreateOrder::new(
        AggregateId::new(),
        "idem-1",
        user_id,
        sample_items(),
        Money::new(3000, "USD"),
    );
    let order_id = cmd.order_id;
    service.create_order(cmd).await.unwrap();

    service
        .mark_stock_reserved(MarkStockReserved::new(order_id, "TX00001"))
        .await
        .unwrap();

    service
        .complete_order(CompleteOrder::new(order_id))
        .await
        .unwrap();

    processor.run_catch_up().await.unwrap();

    let order = view.get_order(order_id, user_id).await.unwrap();
    assert_eq!(order.state, OrderState::Completed);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.total_amount, Money::new(3000, "USD"));
    assert_eq!(order.transaction_id, Some("TX00001".to_string()));
}

#[tokio::test]
async fn test_failed_order_remains_visible_to_its_owner() {
    let (service, processor, view) = setup();
    let user_id = UserId::new();

    let cmd = CreateOrder::new(
        AggregateId::new(),
        "idem-1",
        user_id,
        sample_items(),
        Money::new(3000, "USD"),
    );
    let order_id = cmd.order_id;
    service.create_order(cmd).await.unwrap();

    service
        .fail_order(FailOrder::new(order_id, "insufficient stock"))
        .await
        .unwrap();

    processor.run_catch_up().await.unwrap();

    let order = view.get_order(order_id, user_id).await.unwrap();
    assert_eq!(order.state, OrderState::Failed);
}

#[tokio::test]
async fn test_list_orders_filters_by_owner_and_status() {
    let (service, processor, view) = setup();
    let alice = UserId::new();
    let bob = UserId::new();

    // Alice: one completed order, one pending order
    let cmd = CreateOrder::new(
        AggregateId::new(),
        "idem-1",
        alice,
        sample_items(),
        Money::new(3000, "USD"),
    );
    let alice_completed = cmd.order_id;
    service.create_order(cmd).await.unwrap();
    service
        .mark_stock_reserved(MarkStockReserved::new(alice_completed, "TX00001"))
        .await
        .unwrap();
    service
        .complete_order(CompleteOrder::new(alice_completed))
        .await
        .unwrap();

    let cmd = CreateOrder::new(
        AggregateId::new(),
        "idem-2",
        alice,
        sample_items(),
        Money::new(1000, "USD"),
    );
    let alice_pending = cmd.order_id;
    service.create_order(cmd).await.unwrap();

    // Bob: one completed order
    let cmd = CreateOrder::new(
        AggregateId::new(),
        "idem-3",
        bob,
        sample_items(),
        Money::new(5000, "USD"),
    );
    let bob_order = cmd.order_id;
    service.create_order(cmd).await.unwrap();
    service
        .mark_stock_reserved(MarkStockReserved::new(bob_order, "TX00002"))
        .await
        .unwrap();
    service
        .complete_order(CompleteOrder::new(bob_order))
        .await
        .unwrap();

    processor.run_catch_up().await.unwrap();

    let alice_orders = view.list_orders(alice, &OrderListFilter::default()).await;
    assert_eq!(alice_orders.len(), 2);

    let alice_completed_only = view
        .list_orders(
            alice,
            &OrderListFilter {
                status: Some(OrderState::Completed),
                ..Default::default()
            },
        )
        .await;
    assert_eq!(alice_completed_only.len(), 1);
    assert_eq!(alice_completed_only[0].order_id, alice_completed);

    let bob_orders = view.list_orders(bob, &OrderListFilter::default()).await;
    assert_eq!(bob_orders.len(), 1);
    assert_eq!(bob_orders[0].order_id, bob_order);

    // Sanity: bob never sees alice's pending order.
    assert!(!bob_orders.iter().any(|o| o.order_id == alice_pending));
}

#[tokio::test]
async fn test_rebuild_produces_same_state() {
    let (service, processor, view) = setup();
    let user_id = UserId::new();

    let cmd = CreateOrder::new(
        AggregateId::new(),
        "idem-1",
        user_id,
        sample_items(),
        Money::new(3000, "USD"),
    );
    let order_id = cmd.order_id;
    service.create_order(cmd).await.unwrap();
    service
        .mark_stock_reserved(MarkStockReserved::new(order_id, "TX00001"))
        .await
        .unwrap();
    service
        .complete_order(CompleteOrder::new(order_id))
        .await
        .unwrap();

    processor.run_catch_up().await.unwrap();
    let before = view.get_order(order_id, user_id).await.unwrap();

    processor.rebuild_all().await.unwrap();
    let after = view.get_order(order_id, user_id).await.unwrap();

    assert_eq!(before.state, after.state);
    assert_eq!(before.total_amount, after.total_amount);
    assert_eq!(before.transaction_id, after.transaction_id);
}

#[tokio::test]
async fn test_process_event_delivers_to_the_view() {
    let store = InMemoryEventStore::new();
    let service = OrderService::new(store.clone());
    let view = OrderListView::new();

    let mut processor = ProjectionProcessor::new(store.clone());
    processor.register(Box::new(view.clone()));

    let user_id = UserId::new();
    let cmd = CreateOrder::new(
        AggregateId::new(),
        "idem-1",
        user_id,
        sample_items(),
        Money::new(3000, "USD"),
    );
    let order_id = cmd.order_id;
    service.create_order(cmd).await.unwrap();

    let events = store.get_events_for_aggregate(order_id).await.unwrap();
    for event in &events {
        processor.process_event(event).await.unwrap();
    }

    assert!(view.get_order(order_id, user_id).await.is_some());
    assert_eq!(view.position().await.events_processed, 1);
}
