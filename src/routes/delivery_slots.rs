use axum::{Json, Router, routing::post};

use crate::{
    dto::orders::DeliverySlotRequest,
    response::{ApiResponse, Meta},
    state::AppState,
    working_days::{SlotValidation, validate_delivery_slot},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/validate", post(validate_slot))
}

/// Always 200; the verdict is in `data.valid`.
#[utoipa::path(
    post,
    path = "/api/delivery-slots/validate",
    request_body = DeliverySlotRequest,
    responses((status = 200, body = ApiResponse<SlotValidation>)),
    tag = "Delivery"
)]
pub async fn validate_slot(
    Json(payload): Json<DeliverySlotRequest>,
) -> Json<ApiResponse<SlotValidation>> {
    let result = validate_delivery_slot(
        &payload.date,
        payload.time.as_deref(),
        &payload.working_days,
    );
    Json(ApiResponse::success(
        "Delivery slot checked",
        result,
        Some(Meta::empty()),
    ))
}
