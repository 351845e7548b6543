use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{delete, post},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    audit::log_audit,
    error::AppResult,
    images::ImageStore,
    middleware::auth::{AuthUser, ensure_staff},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(upload_image))
        .route("/{file}", delete(delete_image))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadQuery {
    /// Original file name; only its extension is used for validation.
    pub filename: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadedImage {
    /// Resource path to store on a food item, e.g. `/uploads/food_x.png`.
    pub image: String,
}

#[utoipa::path(
    post,
    path = "/api/images",
    params(
        ("filename" = String, Query, description = "Original file name")
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Upload a food image (max 5MB, jpg/jpeg/png/gif)", body = ApiResponse<UploadedImage>),
        (status = 400, description = "Bad file type or size"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Images"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> AppResult<Json<ApiResponse<UploadedImage>>> {
    ensure_staff(&user)?;
    let image = state.images.store(&query.filename, body).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "image_upload",
        Some("images"),
        Some(serde_json::json!({ "image": image })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(Json(ApiResponse::success(
        "Uploaded",
        UploadedImage { image },
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/uploads/{file}",
    params(
        ("file" = String, Path, description = "Uploaded file name")
    ),
    responses(
        (status = 200, description = "Serve an uploaded image"),
        (status = 404, description = "Not Found"),
    ),
    tag = "Images"
)]
pub async fn serve_upload(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> AppResult<impl IntoResponse> {
    let bytes = state.images.load(&file).await?;
    let content_type = ImageStore::content_type(&file);
    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

#[utoipa::path(
    delete,
    path = "/api/images/{file}",
    params(
        ("file" = String, Path, description = "Uploaded file name")
    ),
    responses(
        (status = 200, description = "Delete an uploaded image"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Images"
)]
pub async fn delete_image(
    State(state): State<AppState>,
    user: AuthUser,
    Path(file): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_staff(&user)?;
    state.images.delete(&file).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "image_delete",
        Some("images"),
        Some(serde_json::json!({ "file": file })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(Json(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}
