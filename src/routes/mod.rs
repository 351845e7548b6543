use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod cart;
pub mod doc;
pub mod health;
pub mod images;
pub mod menu;
pub mod orders;
pub mod params;
pub mod payments;
pub mod seller_requests;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/menu", menu::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/payments", payments::router())
        .nest("/seller-requests", seller_requests::router())
        .nest("/admin", admin::router())
        .nest("/images", images::router())
}
