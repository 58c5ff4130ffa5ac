use std::collections::HashMap;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde_json::Value;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    clients::sendgrid::OrderConfirmationData,
    design::{self, DesignFeature, View},
    dto::orders::{
        AttachQuoteRequest, AttachQuoteResponse, CreateOrderRequest, CreateOrderResponse,
        SendConfirmationRequest, ShippingInfo, UploadAssetsRequest, UploadAssetsResponse,
    },
    error::{AppError, AppResult},
    middleware::auth::OptionalUser,
    models::Order,
    money::cents_from_dollars,
    response::{ApiResponse, Meta},
    state::AppState,
};

const ORDER_COLUMNS: &str = "id, user_id, payment_intent_id, payment_status, email, full_name, \
     phone, delivery_method, ship_line1, ship_line2, ship_city, ship_state, ship_postal, \
     ship_country, amount_subtotal_cents, amount_shipping_cents, amount_tax_cents, \
     amount_total_cents, status, quote_id, created_at";

/// Persist an order, its line items, the verbatim design blobs and the derived
/// design features in one transaction. Totals are written twice: zeroed at
/// creation, then updated from the breakdown once all items exist.
pub async fn create_order(
    state: &AppState,
    user: &OptionalUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<CreateOrderResponse>> {
    let CreateOrderRequest {
        payment_intent_id,
        payment_status,
        order_summary,
        shipping,
        breakdown,
        quote_id,
        cart_raw,
    } = payload;

    if order_summary.items.is_empty() {
        return Err(AppError::BadRequest("No items in order.".into()));
    }

    let user_id = user.0.as_ref().map(|u| u.id);
    let ship = shipping.unwrap_or_else(|| ShippingInfo {
        email: None,
        full_name: None,
        phone: None,
        delivery_method: None,
        address1: None,
        address2: None,
        city: None,
        state: None,
        postal_code: None,
        country: None,
    });

    let mut tx = state.pool.begin().await?;

    let order_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO orders
           (id, user_id, payment_intent_id, payment_status, email, full_name, phone,
            delivery_method, ship_line1, ship_line2, ship_city, ship_state, ship_postal,
            ship_country, amount_subtotal_cents, amount_shipping_cents, amount_tax_cents,
            amount_total_cents, quote_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, 0, 0, 0, 0, $15)",
    )
    .bind(order_id)
    .bind(user_id)
    .bind(&payment_intent_id)
    .bind(&payment_status)
    .bind(&ship.email)
    .bind(&ship.full_name)
    .bind(&ship.phone)
    .bind(ship.delivery_method.as_deref().unwrap_or("standard"))
    .bind(&ship.address1)
    .bind(&ship.address2)
    .bind(&ship.city)
    .bind(&ship.state)
    .bind(&ship.postal_code)
    .bind(ship.country.as_deref().unwrap_or("United States"))
    .bind(&quote_id)
    .execute(&mut *tx)
    .await?;

    for item in &order_summary.items {
        let qty = item.quantity.unwrap_or(1);
        let unit_cents = cents_from_dollars(item.unit_price.unwrap_or(0.0));
        let line_cents = item
            .subtotal
            .map(cents_from_dollars)
            .unwrap_or(unit_cents * qty);

        let item_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO order_items
               (id, order_id, original_item_id, hat_type, hat_color, is_clip_visible,
                clip_color, quantity, unit_price_cents, line_total_cents, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(item_id)
        .bind(order_id)
        .bind(item.id.as_deref().unwrap_or(""))
        .bind(item.hat_type.as_deref().unwrap_or("Hat"))
        .bind(item.hat_color.as_deref().unwrap_or(""))
        .bind(item.is_clip_visible)
        .bind(&item.clip_color)
        .bind(qty as i32)
        .bind(unit_cents)
        .bind(line_cents)
        .bind(&item.notes)
        .execute(&mut *tx)
        .await?;

        // The item carries its own designs, or the raw cart metadata does.
        let designs = item.designs.clone().or_else(|| {
            cart_raw
                .iter()
                .find(|c| c.id.is_some() && c.id == item.id)
                .and_then(|c| c.designs.clone())
        });

        sqlx::query(
            "INSERT INTO order_item_designs (order_item_id, designs_json) VALUES ($1, $2)",
        )
        .bind(item_id)
        .bind(&designs)
        .execute(&mut *tx)
        .await?;

        if let Some(designs) = &designs {
            regenerate_design_features(&mut *tx, item_id, designs).await?;
        }
    }

    let breakdown = breakdown.unwrap_or_default();
    sqlx::query(
        "UPDATE orders
         SET amount_subtotal_cents = $1, amount_shipping_cents = $2,
             amount_tax_cents = $3, amount_total_cents = $4
         WHERE id = $5",
    )
    .bind(cents_from_dollars(breakdown.subtotal))
    .bind(cents_from_dollars(breakdown.shipping))
    .bind(cents_from_dollars(breakdown.tax))
    .bind(cents_from_dollars(breakdown.total))
    .bind(order_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(order_id = %order_id, items = order_summary.items.len(), "order created");

    Ok(ApiResponse::success(
        "Order created",
        CreateOrderResponse { order_id },
        Some(Meta::empty()),
    ))
}

/// Rebuild the derived feature rows for one item from its design blob.
/// Delete-then-insert inside the caller's transaction keeps re-runs idempotent.
pub async fn regenerate_design_features(
    conn: &mut PgConnection,
    order_item_id: Uuid,
    designs: &Value,
) -> AppResult<usize> {
    sqlx::query("DELETE FROM order_item_design_features WHERE order_item_id = $1")
        .bind(order_item_id)
        .execute(&mut *conn)
        .await?;

    let features = design::parse_design_features(designs)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    for placed in &features {
        let (content_html, content_plain, font_family, color, font_size) = match &placed.feature {
            DesignFeature::Text {
                content_html,
                content_plain,
                font_family,
                color,
                font_size,
                ..
            } => (
                Some(content_html.as_str()),
                Some(content_plain.as_str()),
                font_family.as_deref(),
                color.as_deref(),
                *font_size,
            ),
            DesignFeature::Shape { color, .. } => (None, None, None, color.as_deref(), None),
            DesignFeature::Logo { .. } => (None, None, None, None, None),
        };
        let (shape_type, is_filled) = match &placed.feature {
            DesignFeature::Shape {
                shape_type,
                is_filled,
                ..
            } => (Some(shape_type.as_str()), Some(*is_filled)),
            _ => (None, None),
        };
        let url = match &placed.feature {
            DesignFeature::Logo { url, .. } => Some(url.as_str()),
            _ => None,
        };
        let geometry = match &placed.feature {
            DesignFeature::Text { geometry, .. }
            | DesignFeature::Logo { geometry, .. }
            | DesignFeature::Shape { geometry, .. } => *geometry,
        };

        sqlx::query(
            "INSERT INTO order_item_design_features
               (id, order_item_id, view_name, kind, position, content_html, content_plain,
                font_family, color, font_size, shape_type, is_filled, url,
                x, y, w, h, aspect_ratio)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
        )
        .bind(Uuid::new_v4())
        .bind(order_item_id)
        .bind(placed.view.as_str())
        .bind(placed.feature.kind())
        .bind(placed.position)
        .bind(content_html)
        .bind(content_plain)
        .bind(font_family)
        .bind(color)
        .bind(font_size)
        .bind(shape_type)
        .bind(is_filled)
        .bind(url)
        .bind(geometry.x)
        .bind(geometry.y)
        .bind(geometry.width)
        .bind(geometry.height)
        .bind(geometry.aspect_ratio)
        .execute(&mut *conn)
        .await?;
    }

    Ok(features.len())
}

/// Append screenshots and attachments, matching entries to line items by the
/// storefront's original item id. Unresolved ids are skipped, not errors.
pub async fn upload_assets(
    state: &AppState,
    order_id: Uuid,
    payload: UploadAssetsRequest,
) -> AppResult<ApiResponse<UploadAssetsResponse>> {
    let mut tx = state.pool.begin().await?;

    let rows: Vec<(Uuid, String)> =
        sqlx::query_as("SELECT id, original_item_id FROM order_items WHERE order_id = $1")
            .bind(order_id)
            .fetch_all(&mut *tx)
            .await?;

    if rows.is_empty() {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound);
        }
    }

    let id_map: HashMap<String, Uuid> = rows.into_iter().map(|(id, orig)| (orig, id)).collect();

    let mut stored_screenshots = 0i64;
    let mut stored_files = 0i64;
    let mut skipped_items = 0i64;

    for asset in &payload.assets {
        let item_id = asset
            .original_item_id
            .as_deref()
            .and_then(|orig| id_map.get(orig));
        let Some(&item_id) = item_id else {
            skipped_items += 1;
            tracing::warn!(order_id = %order_id, original_item_id = ?asset.original_item_id,
                "asset entry references unknown item, skipping");
            continue;
        };

        for view in View::ALL {
            let Some(data_url) = asset.screenshots.get(view) else {
                continue;
            };
            sqlx::query(
                "INSERT INTO order_item_screens (id, order_item_id, view_name, screenshot_data)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(item_id)
            .bind(view.as_str())
            .bind(data_url)
            .execute(&mut *tx)
            .await?;
            stored_screenshots += 1;
        }

        for data_url in &asset.attached_files {
            sqlx::query(
                "INSERT INTO order_files (id, order_id, file_mime, file_name, file_data)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(Uuid::new_v4())
            .bind(order_id)
            .bind(data_url_mime(data_url))
            .bind(Option::<String>::None)
            .bind(data_url)
            .execute(&mut *tx)
            .await?;
            stored_files += 1;
        }
    }

    tx.commit().await?;

    Ok(ApiResponse::success(
        "Assets stored",
        UploadAssetsResponse {
            stored_screenshots,
            stored_files,
            skipped_items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn attach_quote(
    state: &AppState,
    order_id: Uuid,
    payload: AttachQuoteRequest,
) -> AppResult<ApiResponse<AttachQuoteResponse>> {
    let pdf = decode_quote_pdf(&payload.quote_pdf_base64)?;

    let result = sqlx::query(
        "UPDATE orders SET quote_pdf = $1, quote_pdf_uploaded_at = now() WHERE id = $2",
    )
    .bind(&pdf)
    .bind(order_id)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!(order_id = %order_id, bytes = pdf.len(), "quote PDF attached");

    Ok(ApiResponse::success(
        "Quote PDF attached",
        AttachQuoteResponse { size: pdf.len() },
        Some(Meta::empty()),
    ))
}

pub async fn fetch_quote(state: &AppState, order_id: Uuid) -> AppResult<Vec<u8>> {
    let row: Option<(Option<Vec<u8>>,)> =
        sqlx::query_as("SELECT quote_pdf FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_optional(&state.pool)
            .await?;

    match row {
        Some((Some(pdf),)) if !pdf.is_empty() => Ok(pdf),
        _ => Err(AppError::NotFound),
    }
}

pub async fn send_confirmation(
    state: &AppState,
    payload: SendConfirmationRequest,
) -> AppResult<ApiResponse<()>> {
    let order: Option<Order> = sqlx::query_as(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
    ))
    .bind(payload.order_id)
    .fetch_optional(&state.pool)
    .await?;

    let order = order.ok_or(AppError::NotFound)?;
    let recipient = order
        .email
        .clone()
        .ok_or_else(|| AppError::BadRequest("Order has no contact email.".into()))?;

    let data = confirmation_data(&order);
    state
        .mailer
        .send_order_confirmation(&recipient, &data)
        .await?;

    Ok(ApiResponse::success(
        "Confirmation email sent successfully.",
        (),
        Some(Meta::empty()),
    ))
}

fn confirmation_data(order: &Order) -> OrderConfirmationData {
    let name = order.full_name.clone().unwrap_or_default();
    OrderConfirmationData {
        customer_name: name.clone(),
        order_id: order.id.to_string(),
        quote_id: order.quote_id.clone().unwrap_or_default(),
        shipping_name: name,
        shipping_address_line1: order.ship_line1.clone().unwrap_or_default(),
        shipping_address_line2: order.ship_line2.clone().unwrap_or_default(),
        shipping_city_state_zip: format!(
            "{}, {} {}",
            order.ship_city.as_deref().unwrap_or_default(),
            order.ship_state.as_deref().unwrap_or_default(),
            order.ship_postal.as_deref().unwrap_or_default()
        ),
        shipping_country: order.ship_country.clone().unwrap_or_default(),
    }
}

/// Pull the mime type out of a `data:<mime>;base64,...` URL, if any.
fn data_url_mime(data_url: &str) -> Option<String> {
    let rest = data_url.strip_prefix("data:")?;
    let end = rest.find([';', ','])?;
    let mime = &rest[..end];
    if mime.is_empty() {
        return None;
    }
    Some(mime.to_string())
}

/// Accept either raw base64 or a data URL; whitespace is tolerated.
fn decode_quote_pdf(payload: &str) -> AppResult<Vec<u8>> {
    let raw = match payload.find("base64,") {
        Some(idx) if payload.starts_with("data:") => &payload[idx + "base64,".len()..],
        _ => payload,
    };
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|_| AppError::BadRequest("Invalid base64 payload.".into()))?;

    if bytes.is_empty() {
        return Err(AppError::BadRequest("Empty PDF payload.".into()));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_raw_base64_and_data_urls() {
        let raw = BASE64.encode(b"%PDF-1.7 test");
        assert_eq!(decode_quote_pdf(&raw).unwrap(), b"%PDF-1.7 test");

        let data_url = format!("data:application/pdf;base64,{raw}");
        assert_eq!(decode_quote_pdf(&data_url).unwrap(), b"%PDF-1.7 test");

        let spaced = format!("{}\n{}", &raw[..4], &raw[4..]);
        assert_eq!(decode_quote_pdf(&spaced).unwrap(), b"%PDF-1.7 test");
    }

    #[test]
    fn rejects_invalid_and_empty_payloads() {
        assert!(matches!(
            decode_quote_pdf("@@not-base64@@"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            decode_quote_pdf(""),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            decode_quote_pdf("data:application/pdf;base64,"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn extracts_mime_from_data_urls() {
        assert_eq!(
            data_url_mime("data:application/pdf;base64,AAAA").as_deref(),
            Some("application/pdf")
        );
        assert_eq!(
            data_url_mime("data:image/png;base64,AAAA").as_deref(),
            Some("image/png")
        );
        assert_eq!(data_url_mime("AAAA"), None);
    }
}
