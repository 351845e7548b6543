use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::seller_requests::SubmitSellerRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    models::SellerRequest,
    response::ApiResponse,
    services::seller_request_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_request))
        .route("/me", get(my_request))
}

#[utoipa::path(
    post,
    path = "/api/seller-requests",
    request_body = SubmitSellerRequest,
    responses(
        (status = 200, description = "Submit a seller request", body = ApiResponse<SellerRequest>),
        (status = 400, description = "Missing reason"),
        (status = 409, description = "A request is already pending or approved"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller requests"
)]
pub async fn submit_request(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SubmitSellerRequest>,
) -> AppResult<Json<ApiResponse<SellerRequest>>> {
    let resp = seller_request_service::submit(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/seller-requests/me",
    responses(
        (status = 200, description = "Own latest seller request", body = ApiResponse<SellerRequest>),
        (status = 404, description = "No request submitted"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller requests"
)]
pub async fn my_request(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SellerRequest>>> {
    let resp = seller_request_service::my_request(&state, &user).await?;
    Ok(Json(resp))
}
