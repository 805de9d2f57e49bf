use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::orders::OrderList,
    error::AppResult,
    response::{ApiResponse, Meta},
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{customer_id}/orders", get(list_customer_orders))
}

#[utoipa::path(
    get,
    path = "/api/customers/{customer_id}/orders",
    params(("customer_id" = String, Path, description = "Customer id")),
    responses((status = 200, description = "Newest first", body = ApiResponse<OrderList>)),
    tag = "Orders"
)]
pub async fn list_customer_orders(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let orders = order_service::get_orders_by_customer(&state, &customer_id).await?;
    let meta = Meta::count(orders.len());
    Ok(Json(ApiResponse::success("Ok", OrderList { items: orders }, Some(meta))))
}
