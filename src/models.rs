use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub payment_intent_id: Option<String>,
    pub payment_status: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub delivery_method: String,
    pub ship_line1: Option<String>,
    pub ship_line2: Option<String>,
    pub ship_city: Option<String>,
    pub ship_state: Option<String>,
    pub ship_postal: Option<String>,
    pub ship_country: Option<String>,
    pub amount_subtotal_cents: i64,
    pub amount_shipping_cents: i64,
    pub amount_tax_cents: i64,
    pub amount_total_cents: i64,
    pub status: String,
    pub quote_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub original_item_id: String,
    pub hat_type: String,
    pub hat_color: String,
    pub is_clip_visible: bool,
    pub clip_color: Option<String>,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One derived text/logo/shape layer on a single view of an item.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DesignFeatureRow {
    pub id: Uuid,
    pub order_item_id: Uuid,
    pub view_name: String,
    pub kind: String,
    pub position: i32,
    pub content_html: Option<String>,
    pub content_plain: Option<String>,
    pub font_family: Option<String>,
    pub color: Option<String>,
    pub font_size: Option<i32>,
    pub shape_type: Option<String>,
    pub is_filled: Option<bool>,
    pub url: Option<String>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub w: Option<i32>,
    pub h: Option<i32>,
    pub aspect_ratio: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OrderItemScreen {
    pub id: Uuid,
    pub order_item_id: Uuid,
    pub view_name: String,
    pub screenshot_data: String,
    pub created_at: DateTime<Utc>,
}
