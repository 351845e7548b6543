use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post, put},
};
use uuid::Uuid;

use crate::{
    dto::menu::{
        AvailabilityRequest, CreateFoodItemRequest, MenuList, RestockRequest, UpdateFoodItemRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::FoodItem,
    response::ApiResponse,
    routes::params::MenuQuery,
    services::menu_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_menu).post(create_item))
        .route("/all", get(list_all_items))
        .route("/{id}", get(get_item))
        .route("/{id}", put(update_item))
        .route("/{id}", delete(delete_item))
        .route("/{id}/restock", post(restock_item))
        .route("/{id}/availability", patch(set_item_availability))
}

#[utoipa::path(
    get,
    path = "/api/menu",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search in name and description"),
        ("category" = Option<String>, Query, description = "Exact category filter"),
    ),
    responses(
        (status = 200, description = "List orderable food items", body = ApiResponse<MenuList>)
    ),
    tag = "Menu"
)]
pub async fn list_menu(
    State(state): State<AppState>,
    Query(query): Query<MenuQuery>,
) -> AppResult<Json<ApiResponse<MenuList>>> {
    let resp = menu_service::list_menu(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/menu/all",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "List all food items incl. unavailable", body = ApiResponse<MenuList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn list_all_items(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<MenuQuery>,
) -> AppResult<Json<ApiResponse<MenuList>>> {
    let resp = menu_service::list_all(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/menu/{id}",
    params(
        ("id" = Uuid, Path, description = "Food item ID")
    ),
    responses(
        (status = 200, description = "Get food item", body = ApiResponse<FoodItem>),
        (status = 404, description = "Food item not found"),
    ),
    tag = "Menu"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<FoodItem>>> {
    let resp = menu_service::get_item(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/menu",
    request_body = CreateFoodItemRequest,
    responses(
        (status = 200, description = "Create food item", body = ApiResponse<FoodItem>),
        (status = 400, description = "Invalid item"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn create_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateFoodItemRequest>,
) -> AppResult<Json<ApiResponse<FoodItem>>> {
    let resp = menu_service::create_item(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/menu/{id}",
    params(
        ("id" = Uuid, Path, description = "Food item ID")
    ),
    request_body = UpdateFoodItemRequest,
    responses(
        (status = 200, description = "Updated food item", body = ApiResponse<FoodItem>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn update_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFoodItemRequest>,
) -> AppResult<Json<ApiResponse<FoodItem>>> {
    let resp = menu_service::update_item(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/menu/{id}",
    params(
        ("id" = Uuid, Path, description = "Food item ID")
    ),
    responses(
        (status = 200, description = "Deleted food item"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Referenced by existing orders"),
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = menu_service::delete_item(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/menu/{id}/restock",
    params(
        ("id" = Uuid, Path, description = "Food item ID")
    ),
    request_body = RestockRequest,
    responses(
        (status = 200, description = "Restocked food item", body = ApiResponse<FoodItem>),
        (status = 400, description = "Invalid quantity"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn restock_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RestockRequest>,
) -> AppResult<Json<ApiResponse<FoodItem>>> {
    let resp = menu_service::restock(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/menu/{id}/availability",
    params(
        ("id" = Uuid, Path, description = "Food item ID")
    ),
    request_body = AvailabilityRequest,
    responses(
        (status = 200, description = "Availability updated", body = ApiResponse<FoodItem>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Sold out"),
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn set_item_availability(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AvailabilityRequest>,
) -> AppResult<Json<ApiResponse<FoodItem>>> {
    let resp = menu_service::set_availability(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
