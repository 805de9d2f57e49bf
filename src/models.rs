use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_ORDER_STATUS: &str = "pending";
pub const DEFAULT_RETURN_STATUS: &str = "none";
pub const DEFAULT_RECIPIENT_TYPE: &str = "you";

/// Stored documents may carry `null` where a value was never filled in.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Fields written to the orders collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderFields {
    #[serde(rename = "customer_id", deserialize_with = "null_as_default")]
    pub customer_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub buyer_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub branch_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub order_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub delivery_time: String,
    #[serde(deserialize_with = "null_as_default")]
    pub delivery_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub order_comment: String,
    #[serde(deserialize_with = "null_as_default")]
    pub delivery_address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub order_status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub payment_method: String,
    #[serde(deserialize_with = "null_as_default")]
    pub transaction_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub delivery_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub delivery_org_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderItemFields {
    #[serde(deserialize_with = "null_as_default")]
    pub order_item_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub order_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub branch_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub product_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub product_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub product_image: String,
    #[serde(deserialize_with = "null_as_default")]
    pub product_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub product_price: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub product_qty: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub return_status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub return_qty: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub return_comment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PurchaseRecipientFields {
    #[serde(deserialize_with = "null_as_default")]
    pub order_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub purchase_recipient_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub recipient_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub recipient_phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub recipient_email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub recipient_address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub recipient_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub business_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub business_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub self_pickup: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub self_delivery_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "$updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: OrderFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "$updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: OrderItemFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PurchaseRecipientInfo {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "$updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: PurchaseRecipientFields,
}
