use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dto::orders::{OrderSummary, ShippingInfo};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    pub order_summary: OrderSummary,
    pub shipping: ShippingInfo,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentResponse {
    pub client_secret: String,
    pub breakdown: IntentBreakdown,
}

/// Human-readable dollar amounts for the checkout summary screen.
#[derive(Debug, Serialize, ToSchema)]
pub struct IntentBreakdown {
    pub items: Vec<IntentLineItem>,
    pub subtotal: String,
    pub shipping: String,
    pub tax: String,
    pub total: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntentLineItem {
    pub id: String,
    pub title: String,
    pub color: String,
    pub qty: i64,
    pub unit: String,
    pub line_total: String,
}
