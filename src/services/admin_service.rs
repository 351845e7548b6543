use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::{
        menu::MenuList,
        orders::{OrderList, OrderWithItems},
    },
    entity::{
        food_items::{Column as FoodItemCol, Entity as FoodItems},
        food_orders::{Column as OrderCol, Entity as FoodOrders},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        payments::{Column as PaymentCol, Entity as Payments},
        seller_requests::{Column as RequestCol, Entity as SellerRequests},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_staff},
    models::User,
    response::{ApiResponse, Meta},
    routes::admin::{LowStockQuery, UserList, UserListQuery},
    routes::params::{OrderListQuery, SortOrder},
    services::{
        menu_service::food_item_from_entity,
        order_service::{order_from_entity, order_item_from_entity},
    },
    state::AppState,
};

/// All orders across customers, for the fulfillment queue.
pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let mut finder = FoodOrders::find().filter(condition);

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_staff(user)?;
    let order = FoodOrders::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(order_from_entity);
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    let data = OrderWithItems { order, items };
    Ok(ApiResponse::success("Order found", data, Some(Meta::empty())))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<MenuList>> {
    ensure_staff(user)?;
    let threshold = query.threshold.unwrap_or(5);
    let (page, limit, offset) = query.pagination.normalize();

    let finder = FoodItems::find()
        .filter(FoodItemCol::StockQuantity.lte(threshold))
        .order_by_asc(FoodItemCol::StockQuantity)
        .order_by_desc(FoodItemCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(food_item_from_entity)
        .collect();

    let data = MenuList { items };
    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Low stock", data, Some(meta)))
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    query: UserListQuery,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let items: Vec<User> = if let Some(role) = query.role.as_ref().filter(|s| !s.is_empty()) {
        sqlx::query_as(
            "SELECT * FROM users WHERE role = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(role)
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?
    } else {
        sqlx::query_as("SELECT * FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(&state.pool)
            .await?
    };

    let total: (i64,) = if let Some(role) = query.role.as_ref().filter(|s| !s.is_empty()) {
        sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role)
            .fetch_one(&state.pool)
            .await?
    } else {
        sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&state.pool)
            .await?
    };

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

/// Purge a customer account and everything hanging off it: payments, order
/// lines, orders and seller requests go in one transaction, then the
/// in-memory cart is dropped.
pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    if id == user.user_id {
        return Err(AppError::Conflict("cannot delete your own account".into()));
    }

    let txn = state.orm.begin().await?;

    let target = Users::find_by_id(id).one(&txn).await?;
    if target.is_none() {
        return Err(AppError::NotFound);
    }

    Payments::delete_many()
        .filter(PaymentCol::CustomerId.eq(id))
        .exec(&txn)
        .await?;

    let order_ids: Vec<Uuid> = FoodOrders::find()
        .filter(OrderCol::UserId.eq(id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|o| o.id)
        .collect();

    if !order_ids.is_empty() {
        OrderItems::delete_many()
            .filter(OrderItemCol::OrderId.is_in(order_ids.clone()))
            .exec(&txn)
            .await?;
        FoodOrders::delete_many()
            .filter(OrderCol::UserId.eq(id))
            .exec(&txn)
            .await?;
    }

    SellerRequests::delete_many()
        .filter(RequestCol::UserId.eq(id))
        .exec(&txn)
        .await?;

    Users::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    state.carts.drop_cart(id).await;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "user_delete",
        Some("users"),
        Some(serde_json::json!({ "user_id": id, "deleted_at": Utc::now() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
