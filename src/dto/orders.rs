use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub payment_intent_id: Option<String>,
    pub payment_status: Option<String>,
    pub order_summary: OrderSummary,
    pub shipping: Option<ShippingInfo>,
    pub breakdown: Option<Breakdown>,
    pub quote_id: Option<String>,
    /// Lightweight cart metadata carrying per-item design JSON; no screenshots.
    #[serde(default)]
    pub cart_raw: Vec<CartRawEntry>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderSummary {
    pub items: Vec<SummaryItem>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryItem {
    pub id: Option<String>,
    pub hat_type: Option<String>,
    pub hat_color: Option<String>,
    #[serde(default)]
    pub is_clip_visible: bool,
    pub clip_color: Option<String>,
    pub quantity: Option<i64>,
    /// Unit price in decimal dollars.
    pub unit_price: Option<f64>,
    /// Line total in decimal dollars; derived from unit price when absent.
    pub subtotal: Option<f64>,
    pub notes: Option<String>,
    #[schema(value_type = Object)]
    pub designs: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartRawEntry {
    pub id: Option<String>,
    #[schema(value_type = Object)]
    pub designs: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub delivery_method: Option<String>,
    #[serde(alias = "line1")]
    pub address1: Option<String>,
    #[serde(alias = "line2")]
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[serde(alias = "postal_code")]
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Money totals in decimal dollars, as submitted by the client.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Breakdown {
    #[serde(default)]
    pub subtotal: f64,
    #[serde(default)]
    pub shipping: f64,
    #[serde(default)]
    pub tax: f64,
    #[serde(default)]
    pub total: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadAssetsRequest {
    #[serde(default)]
    pub assets: Vec<AssetEntry>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetEntry {
    pub original_item_id: Option<String>,
    /// Per-view screenshot data URLs.
    #[serde(default)]
    pub screenshots: ViewScreenshots,
    /// Attachment payloads as data URLs (pdf/png/jpg).
    #[serde(default)]
    pub attached_files: Vec<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ViewScreenshots {
    pub front: Option<String>,
    pub back: Option<String>,
    pub left: Option<String>,
    pub right: Option<String>,
}

impl ViewScreenshots {
    pub fn get(&self, view: crate::design::View) -> Option<&str> {
        use crate::design::View;
        match view {
            View::Front => self.front.as_deref(),
            View::Back => self.back.as_deref(),
            View::Left => self.left.as_deref(),
            View::Right => self.right.as_deref(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadAssetsResponse {
    pub stored_screenshots: i64,
    pub stored_files: i64,
    pub skipped_items: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachQuoteRequest {
    pub quote_pdf_base64: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttachQuoteResponse {
    pub size: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendConfirmationRequest {
    pub order_id: Uuid,
}
