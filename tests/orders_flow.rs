mod common;

use common::{Op, RecordingStore, backend_error, state_with, unauthorized};
use order_manager::{
    dto::orders::{CartItemRequest, CompleteOrderRequest, NewOrderRequest, RecipientRequest},
    error::AppError,
    services::order_service::{self, Fetched},
    store::{DocumentStore, StoreError, to_fields},
    working_days::WorkingDays,
};
use serde_json::json;

fn order_request(customer: &str) -> NewOrderRequest {
    NewOrderRequest {
        customer_id: Some(customer.into()),
        branch_id: Some("branch-1".into()),
        delivery_date: Some("2025-01-06".into()),
        delivery_time: Some("10:00".into()),
        total: Some(30.0.into()),
        ..Default::default()
    }
}

fn cart_item(product: &str, price: f64) -> CartItemRequest {
    CartItemRequest {
        id: Some(product.into()),
        name: Some(format!("Product {product}")),
        price: Some(price.into()),
        ..Default::default()
    }
}

fn monday_only() -> WorkingDays {
    serde_json::from_value(json!({ "monday": { "open": "08:00", "close": "18:00" } })).unwrap()
}

#[tokio::test]
async fn created_order_has_every_field_defaulted() -> anyhow::Result<()> {
    let store = RecordingStore::new();
    let state = state_with(store.clone());

    let req: NewOrderRequest = serde_json::from_value(json!({ "buyerId": "cust-1" }))?;
    let order = order_service::create_order(&state, req).await?;

    assert_eq!(order.id, "id-1");
    assert_eq!(order.fields.order_id, order.id);

    let raw = store.inner.get_document("orders_db", "orders", &order.id).await?;
    let expected = json!({
        "customer_id": "cust-1",
        "buyerId": "cust-1",
        "branchId": "",
        "orderId": "id-1",
        "deliveryTime": "",
        "deliveryDate": "",
        "orderComment": "",
        "deliveryAddress": "",
        "orderStatus": "pending",
        "paymentMethod": "",
        "transactionId": "",
        "deliveryName": "",
        "deliveryOrgType": "",
        "total": 0.0
    });
    assert_eq!(serde_json::Value::Object(raw.fields), expected);
    Ok(())
}

#[tokio::test]
async fn complete_order_writes_order_then_items_in_sequence() -> anyhow::Result<()> {
    let store = RecordingStore::new();
    let state = state_with(store.clone());

    let placed = order_service::create_complete_order(
        &state,
        CompleteOrderRequest {
            order: order_request("cust-1"),
            items: vec![cart_item("p1", 10.0), cart_item("p2", 20.0)],
            working_days: monday_only(),
            recipient: None,
        },
    )
    .await?;

    let creates: Vec<_> = store
        .calls_of(Op::Create)
        .into_iter()
        .map(|c| (c.collection, c.id.unwrap()))
        .collect();
    assert_eq!(
        creates,
        vec![
            ("orders".to_string(), "id-1".to_string()),
            ("order_items".to_string(), "id-2".to_string()),
            ("order_items".to_string(), "id-3".to_string()),
        ]
    );

    assert_eq!(placed.items.len(), 2);
    for item in &placed.items {
        assert_eq!(item.fields.order_id, placed.order.id);
        assert_eq!(item.fields.order_item_id, item.id);
        assert_eq!(item.fields.branch_id, "branch-1");
        assert_eq!(item.fields.product_qty, 1);
        assert_eq!(item.fields.return_status, "none");
    }
    assert_eq!(placed.items[1].fields.product_price, 20.0);
    Ok(())
}

#[tokio::test]
async fn complete_order_with_recipient_creates_recipient_last() -> anyhow::Result<()> {
    let store = RecordingStore::new();
    let state = state_with(store.clone());

    let placed = order_service::create_complete_order(
        &state,
        CompleteOrderRequest {
            order: order_request("cust-1"),
            items: vec![cart_item("p1", 10.0)],
            working_days: WorkingDays::default(),
            recipient: Some(RecipientRequest {
                recipient_name: Some("Ana".into()),
                self_pickup: Some(true),
                ..Default::default()
            }),
        },
    )
    .await?;

    let last = store.calls_of(Op::Create).pop().unwrap();
    assert_eq!(last.collection, "purchase_recipient_info");

    let recipient = order_service::get_purchase_recipient_info(&state, &placed.order.id)
        .await?
        .found()
        .expect("recipient stored");
    assert_eq!(recipient.fields.recipient_name, "Ana");
    assert_eq!(recipient.fields.purchase_recipient_type, "you");
    assert!(recipient.fields.self_pickup);
    Ok(())
}

#[tokio::test]
async fn invalid_delivery_slot_never_touches_the_store() {
    let store = RecordingStore::new();
    let state = state_with(store.clone());

    let mut order = order_request("cust-1");
    // 2025-01-07 is a Tuesday
    order.delivery_date = Some("2025-01-07".into());

    let err = order_service::create_complete_order(
        &state,
        CompleteOrderRequest {
            order,
            items: vec![cart_item("p1", 10.0)],
            working_days: monday_only(),
            recipient: None,
        },
    )
    .await
    .unwrap_err();

    match err {
        AppError::BadRequest(message) => assert!(message.contains("Not a working day")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.calls_of(Op::Create).is_empty());
}

#[tokio::test]
async fn failed_item_write_leaves_the_order_in_place() {
    let store = RecordingStore::new();
    let state = state_with(store.clone());

    let order = order_service::create_order(&state, order_request("cust-1"))
        .await
        .unwrap();
    store.fail(Op::Create, 1, backend_error);

    let err = order_service::create_order_items(&state, &order.id, vec![cart_item("p1", 1.0)], None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Store(StoreError::Backend(_))));

    // writes are not retried and nothing is compensated
    assert_eq!(store.calls_of(Op::Create).len(), 2);
    assert_eq!(store.inner.count("orders_db", "orders").await, 1);
    assert_eq!(store.inner.count("orders_db", "order_items").await, 0);
}

#[tokio::test]
async fn delete_removes_items_before_the_order() -> anyhow::Result<()> {
    let store = RecordingStore::new();
    let state = state_with(store.clone());

    let order = order_service::create_order(&state, order_request("cust-1")).await?;
    let items = order_service::create_order_items(
        &state,
        &order.id,
        vec![cart_item("p1", 1.0), cart_item("p2", 2.0)],
        None,
    )
    .await?;

    order_service::delete_order(&state, &order.id).await?;

    let deletes: Vec<_> = store
        .calls_of(Op::Delete)
        .into_iter()
        .map(|c| (c.collection, c.id.unwrap()))
        .collect();
    assert_eq!(
        deletes,
        vec![
            ("order_items".to_string(), items[0].id.clone()),
            ("order_items".to_string(), items[1].id.clone()),
            ("orders".to_string(), order.id.clone()),
        ]
    );
    assert_eq!(store.inner.count("orders_db", "orders").await, 0);
    assert_eq!(store.inner.count("orders_db", "order_items").await, 0);
    Ok(())
}

#[tokio::test]
async fn failed_order_delete_leaves_items_deleted() -> anyhow::Result<()> {
    let store = RecordingStore::new();
    let state = state_with(store.clone());

    let order = order_service::create_order(&state, order_request("cust-1")).await?;
    order_service::create_order_items(&state, &order.id, vec![cart_item("p1", 1.0)], None).await?;

    // the item delete goes through, the order delete fails
    store.fail_after(Op::Delete, 1, 1, backend_error);
    let err = order_service::delete_order(&state, &order.id).await.unwrap_err();
    assert!(matches!(err, AppError::Store(StoreError::Backend(_))));

    assert_eq!(store.calls_of(Op::Delete).len(), 2);
    assert_eq!(store.inner.count("orders_db", "order_items").await, 0);
    assert_eq!(store.inner.count("orders_db", "orders").await, 1);
    Ok(())
}

#[tokio::test]
async fn get_order_merges_the_independent_items_fetch() -> anyhow::Result<()> {
    let store = RecordingStore::new();
    let state = state_with(store.clone());

    let order = order_service::create_order(&state, order_request("cust-1")).await?;
    order_service::create_order_items(
        &state,
        &order.id,
        vec![cart_item("p1", 1.0), cart_item("p2", 2.0)],
        None,
    )
    .await?;
    let other = order_service::create_order(&state, order_request("cust-1")).await?;
    order_service::create_order_items(&state, &other.id, vec![cart_item("p3", 3.0)], None).await?;

    let composite = order_service::get_order(&state, &order.id).await?;
    let items = order_service::get_order_items(&state, &order.id).await?;

    assert_eq!(composite.order, order);
    assert_eq!(composite.items, items);
    assert_eq!(items.len(), 2);

    let body = serde_json::to_value(&composite)?;
    assert_eq!(body["$id"], order.id.as_str());
    assert_eq!(body["orderStatus"], "pending");
    assert_eq!(body["items"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn missing_order_is_not_found() {
    let store = RecordingStore::new();
    let state = state_with(store.clone());

    let err = order_service::get_order(&state, "nope").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    assert_eq!(store.calls_of(Op::Get).len(), 3);
}

#[tokio::test]
async fn customer_orders_are_newest_first() -> anyhow::Result<()> {
    let store = RecordingStore::new();
    let state = state_with(store.clone());

    let first = order_service::create_order(&state, order_request("cust-1")).await?;
    order_service::create_order(&state, order_request("cust-2")).await?;
    let second = order_service::create_order(&state, order_request("cust-1")).await?;

    let orders = order_service::get_orders_by_customer(&state, "cust-1").await?;
    let ids: Vec<_> = orders.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);

    assert!(order_service::get_orders_by_customer(&state, "nobody").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn stored_nulls_read_back_as_empty_values() -> anyhow::Result<()> {
    let store = RecordingStore::new();
    let state = state_with(store.clone());

    let fields = to_fields(&json!({
        "customer_id": "cust-1",
        "orderId": "legacy",
        "deliveryAddress": null,
        "deliveryName": null,
        "total": null,
    }))?;
    store
        .inner
        .create_document("orders_db", "orders", "legacy", fields)
        .await?;
    let item = to_fields(&json!({ "orderId": "legacy", "productName": null, "productQty": null }))?;
    store
        .inner
        .create_document("orders_db", "order_items", "legacy-item", item)
        .await?;

    let orders = order_service::get_orders_by_customer(&state, "cust-1").await?;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].fields.delivery_address, "");
    assert_eq!(orders[0].fields.total, 0.0);

    let order = order_service::get_order(&state, "legacy").await?;
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].fields.product_name, "");
    assert_eq!(order.items[0].fields.product_qty, 0);
    Ok(())
}

#[tokio::test]
async fn transient_read_failures_are_retried() -> anyhow::Result<()> {
    let store = RecordingStore::new();
    let state = state_with(store.clone());

    let order = order_service::create_order(&state, order_request("cust-1")).await?;
    order_service::create_order_items(&state, &order.id, vec![cart_item("p1", 1.0)], None).await?;

    store.fail(Op::List, 2, backend_error);
    let items = order_service::get_order_items(&state, &order.id).await?;

    assert_eq!(items.len(), 1);
    assert_eq!(store.calls_of(Op::List).len(), 3);
    Ok(())
}

#[tokio::test]
async fn exhausted_read_retries_surface_the_transport_failure() {
    let store = RecordingStore::new();
    let state = state_with(store.clone());

    store.fail(Op::List, 3, backend_error);
    let err = order_service::get_orders_by_customer(&state, "cust-1")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Store(StoreError::Backend(_))));
    assert_eq!(store.calls_of(Op::List).len(), 3);
}

#[tokio::test]
async fn recipient_lookup_distinguishes_missing_from_denied() -> anyhow::Result<()> {
    let store = RecordingStore::new();
    let state = state_with(store.clone());

    let order = order_service::create_order(&state, order_request("cust-1")).await?;
    assert_eq!(
        order_service::get_purchase_recipient_info(&state, &order.id).await?,
        Fetched::Missing
    );

    store.fail(Op::List, usize::MAX, unauthorized);
    assert_eq!(
        order_service::get_purchase_recipient_info(&state, &order.id).await?,
        Fetched::Denied
    );

    store.fail(Op::List, usize::MAX, backend_error);
    let err = order_service::get_purchase_recipient_info(&state, &order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Store(_)));
    Ok(())
}

#[tokio::test]
async fn order_details_report_a_denied_recipient() -> anyhow::Result<()> {
    let store = RecordingStore::new();
    let state = state_with(store.clone());

    let order = order_service::create_order(&state, order_request("cust-1")).await?;
    order_service::create_purchase_recipient_info(&state, &order.id, RecipientRequest::default())
        .await?;

    let details = order_service::get_order_details(&state, &order.id).await?;
    assert!(details.recipient.is_some());
    assert!(!details.recipient_denied);

    // the order get and the items list pass, every recipient list attempt is refused
    store.fail_after(Op::List, 1, usize::MAX, unauthorized);
    let details = order_service::get_order_details(&state, &order.id).await?;
    assert_eq!(details.order, order);
    assert!(details.items.is_empty());
    assert!(details.recipient.is_none());
    assert!(details.recipient_denied);
    Ok(())
}

#[tokio::test]
async fn status_and_transaction_updates_touch_only_their_field() -> anyhow::Result<()> {
    let store = RecordingStore::new();
    let state = state_with(store.clone());

    let order = order_service::create_order(&state, order_request("cust-1")).await?;

    let updated = order_service::update_order_status(&state, &order.id, "delivered").await?;
    assert_eq!(updated.fields.order_status, "delivered");
    assert_eq!(updated.fields.total, order.fields.total);

    let updated = order_service::update_order_transaction(&state, &order.id, "tx-42").await?;
    assert_eq!(updated.fields.transaction_id, "tx-42");
    assert_eq!(updated.fields.order_status, "delivered");

    // no transition table: going back to pending is allowed
    let updated = order_service::update_order_status(&state, &order.id, "pending").await?;
    assert_eq!(updated.fields.order_status, "pending");

    let err = order_service::update_order_status(&state, &order.id, " ")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = order_service::update_order_status(&state, "missing", "paid")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}
