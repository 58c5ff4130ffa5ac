use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrder {
    pub id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    /// Total in decimal dollars.
    pub total: String,
    pub items: Vec<AdminOrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderItem {
    pub id: Uuid,
    pub hat_type: String,
    pub hat_color: String,
    pub notes: Option<String>,
    /// View name -> screenshot data URL.
    pub screenshots: HashMap<String, String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminOrderList {
    pub items: Vec<AdminOrder>,
}
