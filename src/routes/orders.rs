use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
};

use crate::{
    dto::orders::{
        CompleteOrderRequest, CreateOrderItemsRequest, NewOrderRequest, OrderDetails,
        OrderItemList, OrderWithItems, RecipientRequest, UpdateOrderStatusRequest,
        UpdateTransactionRequest,
    },
    error::{AppError, AppResult},
    models::{Order, PurchaseRecipientInfo},
    response::{ApiResponse, Meta},
    services::order_service::{self, Fetched},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/complete", post(create_complete_order))
        .route("/{id}", get(get_order).delete(delete_order))
        .route("/{id}/items", get(list_order_items).post(create_order_items))
        .route("/{id}/recipient", get(get_recipient).post(create_recipient))
        .route("/{id}/details", get(get_order_details))
        .route("/{id}/status", patch(update_status))
        .route("/{id}/transaction", patch(update_transaction))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = NewOrderRequest,
    responses((status = 201, body = ApiResponse<Order>)),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<NewOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Order>>)> {
    let order = order_service::create_order(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Order created", order, Some(Meta::empty()))),
    ))
}

#[utoipa::path(
    post,
    path = "/api/orders/complete",
    request_body = CompleteOrderRequest,
    responses(
        (status = 201, body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Delivery slot rejected or invalid input"),
    ),
    tag = "Orders"
)]
pub async fn create_complete_order(
    State(state): State<AppState>,
    Json(payload): Json<CompleteOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithItems>>)> {
    let order = order_service::create_complete_order(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Order placed", order, Some(Meta::empty()))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = String, Path, description = "Order id")),
    responses((status = 200, body = ApiResponse<OrderWithItems>)),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let order = order_service::get_order(&state, &id).await?;
    Ok(Json(ApiResponse::success("OK", order, Some(Meta::empty()))))
}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    params(("id" = String, Path, description = "Order id")),
    tag = "Orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    order_service::delete_order(&state, &id).await?;
    Ok(Json(ApiResponse::success(
        "Order deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/items",
    params(("id" = String, Path, description = "Order id")),
    responses((status = 200, body = ApiResponse<OrderItemList>)),
    tag = "Orders"
)]
pub async fn list_order_items(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderItemList>>> {
    let items = order_service::get_order_items(&state, &id).await?;
    let meta = Meta::count(items.len());
    Ok(Json(ApiResponse::success("OK", OrderItemList { items }, Some(meta))))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/items",
    params(("id" = String, Path, description = "Order id")),
    request_body = CreateOrderItemsRequest,
    responses((status = 201, body = ApiResponse<OrderItemList>)),
    tag = "Orders"
)]
pub async fn create_order_items(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CreateOrderItemsRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderItemList>>)> {
    let items =
        order_service::create_order_items(&state, &id, payload.items, payload.branch_id.as_deref())
            .await?;
    let meta = Meta::count(items.len());
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Order items created", OrderItemList { items }, Some(meta))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/recipient",
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, body = ApiResponse<PurchaseRecipientInfo>),
        (status = 403, description = "Recipient info not readable"),
        (status = 404, description = "No recipient info for this order"),
    ),
    tag = "Orders"
)]
pub async fn get_recipient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<PurchaseRecipientInfo>>> {
    match order_service::get_purchase_recipient_info(&state, &id).await? {
        Fetched::Found(recipient) => Ok(Json(ApiResponse::success(
            "OK",
            recipient,
            Some(Meta::empty()),
        ))),
        Fetched::Missing => Err(AppError::NotFound),
        Fetched::Denied => Err(AppError::Forbidden),
    }
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/recipient",
    params(("id" = String, Path, description = "Order id")),
    request_body = RecipientRequest,
    responses((status = 201, body = ApiResponse<PurchaseRecipientInfo>)),
    tag = "Orders"
)]
pub async fn create_recipient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RecipientRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PurchaseRecipientInfo>>)> {
    let recipient = order_service::create_purchase_recipient_info(&state, &id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Purchase recipient info created",
            recipient,
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/details",
    params(("id" = String, Path, description = "Order id")),
    responses((status = 200, body = ApiResponse<OrderDetails>)),
    tag = "Orders"
)]
pub async fn get_order_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderDetails>>> {
    let details = order_service::get_order_details(&state, &id).await?;
    Ok(Json(ApiResponse::success("OK", details, Some(Meta::empty()))))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/status",
    params(("id" = String, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses((status = 200, body = ApiResponse<Order>)),
    tag = "Orders"
)]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = order_service::update_order_status(&state, &id, &payload.status).await?;
    Ok(Json(ApiResponse::success("Order updated", order, Some(Meta::empty()))))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/transaction",
    params(("id" = String, Path, description = "Order id")),
    request_body = UpdateTransactionRequest,
    responses((status = 200, body = ApiResponse<Order>)),
    tag = "Orders"
)]
pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order =
        order_service::update_order_transaction(&state, &id, &payload.transaction_id).await?;
    Ok(Json(ApiResponse::success("Order updated", order, Some(Meta::empty()))))
}
