//! Order facade over the document store.
//!
//! Writes go straight to the store and propagate failures; reads go through
//! the state's retry policy. Multi-document sequences (order then items,
//! items then order on delete) are not atomic: a failure part-way leaves the
//! documents written so far in place.

use serde::de::DeserializeOwned;

use crate::{
    dto::orders::{
        CartItemRequest, CompleteOrderRequest, NewOrderRequest, OrderDetails, OrderWithItems,
        RecipientRequest,
    },
    error::{AppError, AppResult},
    models::{Order, OrderItem, PurchaseRecipientInfo},
    retry::retry,
    state::AppState,
    store::{Document, Fields, Query, StoreError, to_fields},
    working_days::validate_delivery_slot,
};

/// Outcome of a single-record lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Found(T),
    Missing,
    /// The store refused the read.
    Denied,
}

impl<T> Fetched<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Fetched::Found(value) => Some(value),
            Fetched::Missing | Fetched::Denied => None,
        }
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Fetched::Denied)
    }
}

fn decode_all<T: DeserializeOwned>(docs: Vec<Document>) -> AppResult<Vec<T>> {
    docs.into_iter()
        .map(|doc| doc.decode().map_err(AppError::from))
        .collect()
}

pub async fn create_order(state: &AppState, payload: NewOrderRequest) -> AppResult<Order> {
    let order_id = state.ids.unique();
    let fields = payload.into_fields(&order_id)?;
    tracing::debug!(order_id = %order_id, total = fields.total, "creating order");

    let doc = state
        .store
        .create_document(
            &state.config.database_id,
            &state.config.orders_collection,
            &order_id,
            to_fields(&fields)?,
        )
        .await?;

    let order: Order = doc.decode()?;
    tracing::info!(order_id = %order.id, customer_id = %order.fields.customer_id, total = order.fields.total, "order created");
    Ok(order)
}

/// Create one item document per cart line, one store write at a time.
/// `order_branch_id` takes precedence over a line's own branch.
pub async fn create_order_items(
    state: &AppState,
    order_id: &str,
    items: Vec<CartItemRequest>,
    order_branch_id: Option<&str>,
) -> AppResult<Vec<OrderItem>> {
    let mut created = Vec::with_capacity(items.len());
    for item in items {
        let item_id = state.ids.unique();
        let fields = item.into_fields(&item_id, order_id, order_branch_id)?;

        let doc = state
            .store
            .create_document(
                &state.config.database_id,
                &state.config.order_items_collection,
                &item_id,
                to_fields(&fields)?,
            )
            .await?;
        created.push(doc.decode()?);
    }

    tracing::info!(order_id = %order_id, count = created.len(), "order items created");
    Ok(created)
}

pub async fn create_purchase_recipient_info(
    state: &AppState,
    order_id: &str,
    payload: RecipientRequest,
) -> AppResult<PurchaseRecipientInfo> {
    let recipient_id = state.ids.unique();
    let fields = payload.into_fields(order_id);

    let doc = state
        .store
        .create_document(
            &state.config.database_id,
            &state.config.recipient_collection,
            &recipient_id,
            to_fields(&fields)?,
        )
        .await?;

    let recipient: PurchaseRecipientInfo = doc.decode()?;
    tracing::info!(order_id = %order_id, recipient_id = %recipient.id, "purchase recipient info created");
    Ok(recipient)
}

pub async fn get_order(state: &AppState, order_id: &str) -> AppResult<OrderWithItems> {
    let doc = retry(&state.retry, "get_order", || {
        state.store.get_document(
            &state.config.database_id,
            &state.config.orders_collection,
            order_id,
        )
    })
    .await?;
    let order: Order = doc.decode()?;
    let items = get_order_items(state, order_id).await?;

    Ok(OrderWithItems { order, items })
}

pub async fn get_order_items(state: &AppState, order_id: &str) -> AppResult<Vec<OrderItem>> {
    let queries = [Query::equal("orderId", order_id)];
    let docs = retry(&state.retry, "get_order_items", || {
        state.store.list_documents(
            &state.config.database_id,
            &state.config.order_items_collection,
            &queries,
        )
    })
    .await?;

    tracing::debug!(order_id = %order_id, count = docs.len(), "order items fetched");
    decode_all(docs)
}

/// A customer's orders, newest first.
pub async fn get_orders_by_customer(state: &AppState, customer_id: &str) -> AppResult<Vec<Order>> {
    let queries = [
        Query::equal("customer_id", customer_id),
        Query::order_desc("$createdAt"),
    ];
    let docs = retry(&state.retry, "get_orders_by_customer", || {
        state.store.list_documents(
            &state.config.database_id,
            &state.config.orders_collection,
            &queries,
        )
    })
    .await?;

    tracing::debug!(customer_id = %customer_id, count = docs.len(), "customer orders fetched");
    decode_all(docs)
}

pub async fn get_purchase_recipient_info(
    state: &AppState,
    order_id: &str,
) -> AppResult<Fetched<PurchaseRecipientInfo>> {
    let queries = [Query::equal("order_id", order_id)];
    let result = retry(&state.retry, "get_purchase_recipient_info", || {
        state.store.list_documents(
            &state.config.database_id,
            &state.config.recipient_collection,
            &queries,
        )
    })
    .await;

    match result {
        Ok(docs) => match docs.into_iter().next() {
            Some(doc) => Ok(Fetched::Found(doc.decode()?)),
            None => Ok(Fetched::Missing),
        },
        Err(err @ StoreError::Unauthorized(_)) => {
            tracing::warn!(order_id = %order_id, error = %err, "no permission to read purchase recipient info");
            Ok(Fetched::Denied)
        }
        Err(err) => Err(err.into()),
    }
}

/// Order, its items and its recipient record in one read.
pub async fn get_order_details(state: &AppState, order_id: &str) -> AppResult<OrderDetails> {
    let OrderWithItems { order, items } = get_order(state, order_id).await?;
    let recipient = get_purchase_recipient_info(state, order_id).await?;
    let recipient_denied = recipient.is_denied();

    Ok(OrderDetails {
        order,
        items,
        recipient: recipient.found(),
        recipient_denied,
    })
}

pub async fn update_order_status(state: &AppState, order_id: &str, status: &str) -> AppResult<Order> {
    if status.trim().is_empty() {
        return Err(AppError::BadRequest("status must not be empty".into()));
    }

    let mut fields = Fields::new();
    fields.insert("orderStatus".into(), status.into());
    let doc = state
        .store
        .update_document(
            &state.config.database_id,
            &state.config.orders_collection,
            order_id,
            fields,
        )
        .await?;

    tracing::info!(order_id = %order_id, status = %status, "order status updated");
    Ok(doc.decode()?)
}

pub async fn update_order_transaction(
    state: &AppState,
    order_id: &str,
    transaction_id: &str,
) -> AppResult<Order> {
    let mut fields = Fields::new();
    fields.insert("transactionId".into(), transaction_id.into());
    let doc = state
        .store
        .update_document(
            &state.config.database_id,
            &state.config.orders_collection,
            order_id,
            fields,
        )
        .await?;

    tracing::info!(order_id = %order_id, "order transaction id updated");
    Ok(doc.decode()?)
}

/// Delete the order's items, then the order. Nothing is rolled back if a
/// delete fails part-way.
pub async fn delete_order(state: &AppState, order_id: &str) -> AppResult<()> {
    let items = get_order_items(state, order_id).await?;
    for item in &items {
        state
            .store
            .delete_document(
                &state.config.database_id,
                &state.config.order_items_collection,
                &item.id,
            )
            .await?;
    }

    state
        .store
        .delete_document(
            &state.config.database_id,
            &state.config.orders_collection,
            order_id,
        )
        .await?;

    tracing::info!(order_id = %order_id, items = items.len(), "order and its items deleted");
    Ok(())
}

/// Validate the delivery slot, then create the order, its items and (when
/// given) the recipient record. A failure after the order is written does
/// not remove it.
pub async fn create_complete_order(
    state: &AppState,
    payload: CompleteOrderRequest,
) -> AppResult<OrderWithItems> {
    let CompleteOrderRequest {
        order,
        items,
        working_days,
        recipient,
    } = payload;

    let validation = validate_delivery_slot(
        order.delivery_date.as_deref().unwrap_or_default(),
        order.delivery_time.as_deref(),
        &working_days,
    );
    if !validation.valid {
        tracing::info!(message = %validation.message, "delivery slot rejected");
        return Err(AppError::BadRequest(validation.message));
    }

    let branch_id = order.branch_id.clone();
    let order = create_order(state, order).await?;
    let items = create_order_items(state, &order.id, items, branch_id.as_deref()).await?;
    if let Some(recipient) = recipient {
        create_purchase_recipient_info(state, &order.id, recipient).await?;
    }

    tracing::info!(order_id = %order.id, "complete order created");
    Ok(OrderWithItems { order, items })
}
