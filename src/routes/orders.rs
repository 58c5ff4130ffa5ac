use axum::{
    Json, Router,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        AttachQuoteRequest, AttachQuoteResponse, CreateOrderRequest, CreateOrderResponse,
        SendConfirmationRequest, UploadAssetsRequest, UploadAssetsResponse,
    },
    error::AppResult,
    middleware::auth::OptionalUser,
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/{order_id}/assets", post(upload_assets))
        .route("/{order_id}/quote", post(attach_quote).get(download_quote))
        .route("/send-confirmation", post(send_confirmation))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created", body = ApiResponse<CreateOrderResponse>),
        (status = 400, description = "No items in order"),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: OptionalUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<ApiResponse<CreateOrderResponse>>> {
    let resp = order_service::create_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{order_id}/assets",
    params(("order_id" = Uuid, Path, description = "Order ID")),
    request_body = UploadAssetsRequest,
    responses(
        (status = 200, description = "Assets stored", body = ApiResponse<UploadAssetsResponse>),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn upload_assets(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UploadAssetsRequest>,
) -> AppResult<Json<ApiResponse<UploadAssetsResponse>>> {
    let resp = order_service::upload_assets(&state, order_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{order_id}/quote",
    params(("order_id" = Uuid, Path, description = "Order ID")),
    request_body = AttachQuoteRequest,
    responses(
        (status = 200, description = "Quote PDF attached", body = ApiResponse<AttachQuoteResponse>),
        (status = 400, description = "Invalid base64 payload"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn attach_quote(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<AttachQuoteRequest>,
) -> AppResult<Json<ApiResponse<AttachQuoteResponse>>> {
    let resp = order_service::attach_quote(&state, order_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{order_id}/quote",
    params(("order_id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Quote PDF", content_type = "application/pdf"),
        (status = 404, description = "No quote PDF attached"),
    ),
    tag = "Orders"
)]
pub async fn download_quote(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let pdf = order_service::fetch_quote(&state, order_id).await?;
    let filename = format!("HatForge-Order-{order_id}.pdf");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{filename}\""),
            ),
        ],
        pdf,
    ))
}

#[utoipa::path(
    post,
    path = "/api/orders/send-confirmation",
    request_body = SendConfirmationRequest,
    responses(
        (status = 200, description = "Confirmation email sent"),
        (status = 400, description = "Order has no contact email"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn send_confirmation(
    State(state): State<AppState>,
    Json(payload): Json<SendConfirmationRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let resp = order_service::send_confirmation(&state, payload).await?;
    Ok(Json(resp))
}
