use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::orders::{
        CartItemRequest, CompleteOrderRequest, CreateOrderItemsRequest, DeliverySlotRequest,
        NewOrderRequest, Numeric, OrderDetails, OrderItemList, OrderList, OrderWithItems,
        RecipientRequest, UpdateOrderStatusRequest, UpdateTransactionRequest,
    },
    models::{
        Order, OrderFields, OrderItem, OrderItemFields, PurchaseRecipientFields,
        PurchaseRecipientInfo,
    },
    response::{ApiResponse, Meta},
    routes::{customers, delivery_slots, health, orders},
    working_days::{OpeningHours, SlotValidation, WorkingDay, WorkingDays},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        orders::create_order,
        orders::create_complete_order,
        orders::get_order,
        orders::delete_order,
        orders::list_order_items,
        orders::create_order_items,
        orders::get_recipient,
        orders::create_recipient,
        orders::get_order_details,
        orders::update_status,
        orders::update_transaction,
        customers::list_customer_orders,
        delivery_slots::validate_slot
    ),
    components(
        schemas(
            Order,
            OrderFields,
            OrderItem,
            OrderItemFields,
            PurchaseRecipientInfo,
            PurchaseRecipientFields,
            NewOrderRequest,
            CartItemRequest,
            RecipientRequest,
            CompleteOrderRequest,
            CreateOrderItemsRequest,
            UpdateOrderStatusRequest,
            UpdateTransactionRequest,
            DeliverySlotRequest,
            Numeric,
            WorkingDays,
            WorkingDay,
            OpeningHours,
            SlotValidation,
            OrderWithItems,
            OrderDetails,
            OrderList,
            OrderItemList,
            Meta,
            ApiResponse<Order>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderDetails>,
            ApiResponse<OrderList>,
            ApiResponse<OrderItemList>,
            ApiResponse<PurchaseRecipientInfo>,
            ApiResponse<SlotValidation>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Delivery", description = "Delivery slot endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
