use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::checkout::{CreateIntentRequest, CreateIntentResponse},
    error::AppResult,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/create-intent", post(create_intent))
}

#[utoipa::path(
    post,
    path = "/api/checkout/create-intent",
    request_body = CreateIntentRequest,
    responses(
        (status = 200, description = "Payment intent created", body = ApiResponse<CreateIntentResponse>),
        (status = 400, description = "No items or incomplete shipping address"),
        (status = 502, description = "Payment provider error"),
    ),
    tag = "Checkout"
)]
pub async fn create_intent(
    State(state): State<AppState>,
    Json(payload): Json<CreateIntentRequest>,
) -> AppResult<Json<ApiResponse<CreateIntentResponse>>> {
    let resp = payment_service::create_intent(&state, payload).await?;
    Ok(Json(resp))
}
