use uuid::Uuid;

use crate::{
    cart::CartStore,
    dto::cart::{AddToCartRequest, CartView},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::FoodItem,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn view_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let lines = state.carts.snapshot(user.user_id).await;
    let total = CartStore::total(&lines);
    Ok(ApiResponse::success(
        "OK",
        CartView { lines, total },
        Some(Meta::empty()),
    ))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    let item: Option<FoodItem> = sqlx::query_as("SELECT * FROM food_items WHERE id = $1")
        .bind(payload.food_item_id)
        .fetch_optional(&state.pool)
        .await?;
    let item = match item {
        Some(item) => item,
        None => return Err(AppError::NotFound),
    };

    state.carts.add_item(user.user_id, &item).await?;

    let lines = state.carts.snapshot(user.user_id).await;
    let total = CartStore::total(&lines);
    Ok(ApiResponse::success(
        "Added to cart",
        CartView { lines, total },
        Some(Meta::empty()),
    ))
}

pub async fn decrement_line(
    state: &AppState,
    user: &AuthUser,
    food_item_id: Uuid,
) -> AppResult<ApiResponse<CartView>> {
    state.carts.decrement(user.user_id, food_item_id).await?;

    let lines = state.carts.snapshot(user.user_id).await;
    let total = CartStore::total(&lines);
    Ok(ApiResponse::success(
        "Updated cart",
        CartView { lines, total },
        Some(Meta::empty()),
    ))
}

pub async fn remove_line(
    state: &AppState,
    user: &AuthUser,
    food_item_id: Uuid,
) -> AppResult<ApiResponse<CartView>> {
    state.carts.remove_item(user.user_id, food_item_id).await?;

    let lines = state.carts.snapshot(user.user_id).await;
    let total = CartStore::total(&lines);
    Ok(ApiResponse::success(
        "Removed from cart",
        CartView { lines, total },
        Some(Meta::empty()),
    ))
}

/// Also the logout hook: the session cart does not outlive the session.
pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    state.carts.drop_cart(user.user_id).await;
    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
