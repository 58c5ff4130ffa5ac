use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    dto::admin::{AdminOrder, AdminOrderItem, AdminOrderList},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderItem, OrderItemScreen},
    money::format_usd,
    response::{ApiResponse, Meta},
    routes::params::{AdminOrderQuery, SortOrder},
    state::AppState,
};

/// All orders with their items and per-view screenshots, newest first.
pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: AdminOrderQuery,
) -> AppResult<ApiResponse<AdminOrderList>> {
    ensure_admin(user)?;

    let (page, per_page, offset) = query.normalize();
    let status = query.status.as_deref().filter(|s| !s.is_empty());
    let sort = query.sort_order.unwrap_or(SortOrder::Desc);

    let total: (i64,) = sqlx::query_as(
        "SELECT count(*) FROM orders WHERE ($1::text IS NULL OR status = $1)",
    )
    .bind(status)
    .fetch_one(&state.pool)
    .await?;

    let orders: Vec<Order> = sqlx::query_as(&format!(
        "SELECT id, user_id, payment_intent_id, payment_status, email, full_name, phone,
                delivery_method, ship_line1, ship_line2, ship_city, ship_state, ship_postal,
                ship_country, amount_subtotal_cents, amount_shipping_cents, amount_tax_cents,
                amount_total_cents, status, quote_id, created_at
         FROM orders
         WHERE ($1::text IS NULL OR status = $1)
         ORDER BY created_at {}
         LIMIT $2 OFFSET $3",
        sort.as_sql()
    ))
    .bind(status)
    .bind(per_page)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();

    let items: Vec<OrderItem> = sqlx::query_as(
        "SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY created_at",
    )
    .bind(&order_ids)
    .fetch_all(&state.pool)
    .await?;

    let item_ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();

    let screens: Vec<OrderItemScreen> = sqlx::query_as(
        "SELECT * FROM order_item_screens WHERE order_item_id = ANY($1)",
    )
    .bind(&item_ids)
    .fetch_all(&state.pool)
    .await?;

    let mut screens_by_item: HashMap<Uuid, HashMap<String, String>> = HashMap::new();
    for screen in screens {
        screens_by_item
            .entry(screen.order_item_id)
            .or_default()
            .insert(screen.view_name, screen.screenshot_data);
    }

    let mut items_by_order: HashMap<Uuid, Vec<AdminOrderItem>> = HashMap::new();
    for item in items {
        let screenshots = screens_by_item.remove(&item.id).unwrap_or_default();
        items_by_order
            .entry(item.order_id)
            .or_default()
            .push(AdminOrderItem {
                id: item.id,
                hat_type: item.hat_type,
                hat_color: item.hat_color,
                notes: item.notes,
                screenshots,
            });
    }

    let items = orders
        .into_iter()
        .map(|order| AdminOrder {
            id: order.id,
            status: order.status,
            created_at: order.created_at,
            customer_name: order.full_name,
            customer_email: order.email,
            total: format_usd(order.amount_total_cents),
            items: items_by_order.remove(&order.id).unwrap_or_default(),
        })
        .collect();

    let meta = Meta::new(page, per_page, total.0);
    Ok(ApiResponse::success(
        "Ok",
        AdminOrderList { items },
        Some(meta),
    ))
}
