use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartView},
        menu::{
            AvailabilityRequest, CreateFoodItemRequest, MenuList, RestockRequest,
            UpdateFoodItemRequest,
        },
        orders::{OrderList, OrderWithItems, PayOrderRequest},
        payments::{PaymentList, PaymentResult, RefundRequest},
        seller_requests::{SellerRequestList, SubmitSellerRequest},
    },
    models::{
        CartLine, FoodItem, Order, OrderItem, OrderStatus, Payment, PaymentMethod, SellerRequest,
        User,
    },
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, cart, health, images, menu, orders, params,
        payments as payment_routes, seller_requests,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        menu::list_menu,
        menu::list_all_items,
        menu::get_item,
        menu::create_item,
        menu::update_item,
        menu::delete_item,
        menu::restock_item,
        menu::set_item_availability,
        cart::view_cart,
        cart::add_to_cart,
        cart::decrement_cart_line,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::pay_order,
        orders::list_order_payments,
        payment_routes::list_my_payments,
        payment_routes::refund_payment,
        seller_requests::submit_request,
        seller_requests::my_request,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::delete_order,
        admin::list_low_stock,
        admin::list_seller_requests,
        admin::approve_seller_request,
        admin::reject_seller_request,
        admin::delete_seller_request,
        admin::list_users,
        admin::delete_user,
        images::upload_image,
        images::serve_upload,
        images::delete_image
    ),
    components(
        schemas(
            User,
            FoodItem,
            CartLine,
            Order,
            OrderItem,
            Payment,
            SellerRequest,
            OrderStatus,
            PaymentMethod,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateFoodItemRequest,
            UpdateFoodItemRequest,
            RestockRequest,
            AvailabilityRequest,
            MenuList,
            AddToCartRequest,
            CartView,
            PayOrderRequest,
            OrderList,
            OrderWithItems,
            PaymentResult,
            PaymentList,
            RefundRequest,
            SubmitSellerRequest,
            SellerRequestList,
            admin::UpdateOrderStatusRequest,
            admin::LowStockQuery,
            admin::UserListQuery,
            admin::UserList,
            images::UploadQuery,
            images::UploadedImage,
            params::Pagination,
            params::MenuQuery,
            params::OrderListQuery,
            params::RequestListQuery,
            Meta,
            ApiResponse<FoodItem>,
            ApiResponse<MenuList>,
            ApiResponse<CartView>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<PaymentResult>,
            ApiResponse<SellerRequestList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Menu", description = "Canteen menu and inventory endpoints"),
        (name = "Cart", description = "Session cart endpoints"),
        (name = "Orders", description = "Order and checkout endpoints"),
        (name = "Payments", description = "Payment endpoints"),
        (name = "Seller requests", description = "Seller elevation workflow"),
        (name = "Admin", description = "Admin endpoints"),
        (name = "Images", description = "Food image upload endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
