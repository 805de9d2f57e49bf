use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{
        DEFAULT_ORDER_STATUS, DEFAULT_RECIPIENT_TYPE, DEFAULT_RETURN_STATUS, Order, OrderFields,
        OrderItem, OrderItemFields, PurchaseRecipientFields, PurchaseRecipientInfo,
    },
    working_days::WorkingDays,
};

/// A number that may arrive as JSON number or numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn value(&self, field: &str) -> AppResult<f64> {
        let parsed = match self {
            Numeric::Number(n) => Some(*n),
            Numeric::Text(s) if s.trim().is_empty() => Some(0.0),
            Numeric::Text(s) => s.trim().parse::<f64>().ok(),
        };
        parsed
            .filter(|n| n.is_finite())
            .ok_or_else(|| AppError::BadRequest(format!("{field} must be a number")))
    }
}

impl From<f64> for Numeric {
    fn from(n: f64) -> Self {
        Numeric::Number(n)
    }
}

/// First value that is present and not blank.
fn first_filled(candidates: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|v| !v.trim().is_empty())
}

fn or_empty(value: Option<String>) -> String {
    value.unwrap_or_default()
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    #[serde(rename = "customer_id")]
    pub customer_id: Option<String>,
    pub buyer_id: Option<String>,
    pub branch_id: Option<String>,
    pub delivery_time: Option<String>,
    pub delivery_date: Option<String>,
    pub order_comment: Option<String>,
    pub delivery_address: Option<String>,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub delivery_name: Option<String>,
    pub delivery_org_type: Option<String>,
    pub total: Option<Numeric>,
}

impl NewOrderRequest {
    /// Build the stored record. `customer_id` falls back to `buyerId`; one of
    /// them is required. Every other missing field gets its default.
    pub fn into_fields(self, order_id: &str) -> AppResult<OrderFields> {
        let customer_id = first_filled([self.customer_id, self.buyer_id])
            .ok_or_else(|| AppError::BadRequest("customer_id or buyerId is required".into()))?;
        let total = match &self.total {
            Some(total) => total.value("total")?,
            None => 0.0,
        };

        Ok(OrderFields {
            buyer_id: customer_id.clone(),
            customer_id,
            branch_id: or_empty(self.branch_id),
            order_id: order_id.to_string(),
            delivery_time: or_empty(self.delivery_time),
            delivery_date: or_empty(self.delivery_date),
            order_comment: or_empty(self.order_comment),
            delivery_address: or_empty(self.delivery_address),
            order_status: DEFAULT_ORDER_STATUS.to_string(),
            payment_method: or_empty(self.payment_method),
            transaction_id: or_empty(self.transaction_id),
            delivery_name: or_empty(self.delivery_name),
            delivery_org_type: or_empty(self.delivery_org_type),
            total,
        })
    }
}

/// A cart line as sent by the storefront. Both the short (`id`, `name`,
/// `price`) and the stored (`productId`, `productName`, `productPrice`)
/// spellings are accepted; the short one wins where both are set, except
/// for the product id.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub product_id: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub product_name: Option<String>,
    pub image: Option<String>,
    pub product_image: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub product_type: Option<String>,
    pub price: Option<Numeric>,
    pub product_price: Option<Numeric>,
    pub quantity: Option<Numeric>,
    pub branch_id: Option<String>,
}

impl CartItemRequest {
    pub fn into_fields(
        self,
        order_item_id: &str,
        order_id: &str,
        order_branch_id: Option<&str>,
    ) -> AppResult<OrderItemFields> {
        let product_id = first_filled([self.product_id, self.id])
            .ok_or_else(|| AppError::BadRequest("productId is required for every item".into()))?;

        let mut product_price = 0.0;
        for candidate in [&self.price, &self.product_price].into_iter().flatten() {
            let price = candidate.value("price")?;
            if price != 0.0 {
                product_price = price;
                break;
            }
        }
        if product_price < 0.0 {
            return Err(AppError::BadRequest("price must not be negative".into()));
        }

        let quantity = match &self.quantity {
            Some(q) => q.value("quantity")?,
            None => 0.0,
        };
        if quantity < 0.0 || quantity.fract() != 0.0 || quantity > u32::MAX as f64 {
            return Err(AppError::BadRequest(
                "quantity must be a positive whole number".into(),
            ));
        }
        let product_qty = if quantity == 0.0 { 1 } else { quantity as u32 };

        Ok(OrderItemFields {
            order_item_id: order_item_id.to_string(),
            order_id: order_id.to_string(),
            branch_id: or_empty(first_filled([
                order_branch_id.map(str::to_string),
                self.branch_id,
            ])),
            product_id,
            product_name: or_empty(first_filled([self.name, self.product_name])),
            product_image: or_empty(first_filled([self.image, self.product_image])),
            product_type: or_empty(first_filled([self.kind, self.product_type])),
            product_price,
            product_qty,
            return_status: DEFAULT_RETURN_STATUS.to_string(),
            return_qty: 0,
            return_comment: String::new(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RecipientRequest {
    pub purchase_recipient_type: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_phone: Option<String>,
    pub recipient_email: Option<String>,
    pub recipient_address: Option<String>,
    pub recipient_type: Option<String>,
    pub business_name: Option<String>,
    pub business_type: Option<String>,
    pub self_pickup: Option<bool>,
    pub self_delivery_address: Option<String>,
}

impl RecipientRequest {
    pub fn into_fields(self, order_id: &str) -> PurchaseRecipientFields {
        PurchaseRecipientFields {
            order_id: order_id.to_string(),
            purchase_recipient_type: first_filled([self.purchase_recipient_type])
                .unwrap_or_else(|| DEFAULT_RECIPIENT_TYPE.to_string()),
            recipient_name: or_empty(self.recipient_name),
            recipient_phone: or_empty(self.recipient_phone),
            recipient_email: or_empty(self.recipient_email),
            recipient_address: or_empty(self.recipient_address),
            recipient_type: or_empty(self.recipient_type),
            business_name: or_empty(self.business_name),
            business_type: or_empty(self.business_type),
            self_pickup: self.self_pickup.unwrap_or(false),
            self_delivery_address: or_empty(self.self_delivery_address),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteOrderRequest {
    pub order: NewOrderRequest,
    #[serde(default)]
    pub items: Vec<CartItemRequest>,
    #[serde(default)]
    pub working_days: WorkingDays,
    pub recipient: Option<RecipientRequest>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItemsRequest {
    pub items: Vec<CartItemRequest>,
    /// Applied to every line, ahead of the line's own `branchId`.
    pub branch_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionRequest {
    pub transaction_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliverySlotRequest {
    pub date: String,
    pub time: Option<String>,
    #[serde(default)]
    pub working_days: WorkingDays,
}

/// An order with its line items merged in.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub recipient: Option<PurchaseRecipientInfo>,
    /// The recipient record exists but the caller may not read it.
    pub recipient_denied: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemList {
    pub items: Vec<OrderItem>,
}
