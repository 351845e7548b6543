use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::LockType;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::menu::{
        AvailabilityRequest, CreateFoodItemRequest, MenuList, RestockRequest, UpdateFoodItemRequest,
    },
    entity::{
        food_items::{ActiveModel, Column, Entity as FoodItems, Model as FoodItemModel},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
    },
    error::{AppError, AppResult},
    images::ImageStore,
    middleware::auth::{AuthUser, ensure_staff},
    models::FoodItem,
    response::{ApiResponse, Meta},
    routes::params::{MenuQuery, MenuSortBy, SortOrder},
    state::AppState,
};

/// Public menu browse: only items a customer can actually order.
pub async fn list_menu(state: &AppState, query: MenuQuery) -> AppResult<ApiResponse<MenuList>> {
    let condition = Condition::all()
        .add(Column::Available.eq(true))
        .add(Column::StockQuantity.gt(0));
    list_with_condition(state, query, condition).await
}

/// Management listing for sellers and admins, unavailable items included.
pub async fn list_all(
    state: &AppState,
    user: &AuthUser,
    query: MenuQuery,
) -> AppResult<ApiResponse<MenuList>> {
    ensure_staff(user)?;
    list_with_condition(state, query, Condition::all()).await
}

async fn list_with_condition(
    state: &AppState,
    query: MenuQuery,
    mut condition: Condition,
) -> AppResult<ApiResponse<MenuList>> {
    let (page, limit, offset) = query.pagination.normalize();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    // Category filtering is an exact, case-sensitive match.
    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Column::Category.eq(category.clone()));
    }

    let sort_by = query.sort_by.unwrap_or(MenuSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        MenuSortBy::CreatedAt => Column::CreatedAt,
        MenuSortBy::Price => Column::Price,
        MenuSortBy::Name => Column::Name,
    };

    let mut finder = FoodItems::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(food_item_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    let data = MenuList { items };
    Ok(ApiResponse::success("Menu", data, Some(meta)))
}

pub async fn get_item(state: &AppState, id: Uuid) -> AppResult<ApiResponse<FoodItem>> {
    let result = FoodItems::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(food_item_from_entity);
    let result = match result {
        Some(item) => item,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Food item", result, None))
}

pub async fn create_item(
    state: &AppState,
    user: &AuthUser,
    payload: CreateFoodItemRequest,
) -> AppResult<ApiResponse<FoodItem>> {
    ensure_staff(user)?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("name must not be empty".into()));
    }
    if payload.price <= Decimal::ZERO {
        return Err(AppError::Validation("price must be positive".into()));
    }
    if payload.stock_quantity < 0 {
        return Err(AppError::Validation("stock must not be negative".into()));
    }
    let category = payload.category.trim().to_string();
    if category.is_empty() {
        return Err(AppError::Validation("category must not be empty".into()));
    }
    if let Some(image) = payload.image.as_deref() {
        validate_image_reference(image)?;
    }

    // Zero stock always overrides an explicit availability flag.
    let available = if payload.stock_quantity == 0 {
        false
    } else {
        payload.available.unwrap_or(true)
    };

    let id = Uuid::new_v4();
    let active = ActiveModel {
        id: Set(id),
        name: Set(name),
        price: Set(payload.price),
        category: Set(category),
        description: Set(payload.description),
        stock_quantity: Set(payload.stock_quantity),
        available: Set(available),
        image: Set(payload.image),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let item = active.insert(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "item_create",
        Some("food_items"),
        Some(serde_json::json!({ "food_item_id": item.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Food item created",
        food_item_from_entity(item),
        Some(Meta::empty()),
    ))
}

pub async fn update_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateFoodItemRequest,
) -> AppResult<ApiResponse<FoodItem>> {
    ensure_staff(user)?;
    let existing = FoodItems::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(item) => item,
        None => return Err(AppError::NotFound),
    };

    if let Some(price) = payload.price {
        if price <= Decimal::ZERO {
            return Err(AppError::Validation("price must be positive".into()));
        }
    }
    if let Some(stock) = payload.stock_quantity {
        if stock < 0 {
            return Err(AppError::Validation("stock must not be negative".into()));
        }
    }

    let new_stock = payload.stock_quantity.unwrap_or(existing.stock_quantity);

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("name must not be empty".into()));
        }
        active.name = Set(name);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(category) = payload.category {
        active.category = Set(category);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(stock) = payload.stock_quantity {
        active.stock_quantity = Set(stock);
    }
    if let Some(available) = payload.available {
        active.available = Set(available);
    }
    if let Some(image) = payload.image {
        validate_image_reference(&image)?;
        active.image = Set(Some(image));
    }
    // Selling out forces the item off the menu, whatever the payload said.
    if new_stock == 0 {
        active.available = Set(false);
    }
    active.updated_at = Set(Utc::now().into());

    let item = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "item_update",
        Some("food_items"),
        Some(serde_json::json!({ "food_item_id": item.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        food_item_from_entity(item),
        Some(Meta::empty()),
    ))
}

pub async fn restock(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: RestockRequest,
) -> AppResult<ApiResponse<FoodItem>> {
    ensure_staff(user)?;
    if payload.quantity <= 0 {
        return Err(AppError::Validation(
            "restock quantity must be greater than 0".into(),
        ));
    }

    let txn = state.orm.begin().await?;
    let item = FoodItems::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let item = match item {
        Some(item) => item,
        None => return Err(AppError::NotFound),
    };

    let was_sold_out = item.stock_quantity == 0;
    let new_stock = item.stock_quantity + payload.quantity;

    let mut active: ActiveModel = item.into();
    active.stock_quantity = Set(new_stock);
    if was_sold_out {
        active.available = Set(true);
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "item_restock",
        Some("food_items"),
        Some(serde_json::json!({ "food_item_id": updated.id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Restocked",
        food_item_from_entity(updated),
        Some(Meta::empty()),
    ))
}

pub async fn set_availability(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AvailabilityRequest,
) -> AppResult<ApiResponse<FoodItem>> {
    ensure_staff(user)?;
    let existing = FoodItems::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(item) => item,
        None => return Err(AppError::NotFound),
    };

    if payload.available && existing.stock_quantity == 0 {
        return Err(AppError::Conflict(
            "cannot mark a sold-out item as available".into(),
        ));
    }

    let mut active: ActiveModel = existing.into();
    active.available = Set(payload.available);
    active.updated_at = Set(Utc::now().into());
    let item = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Availability updated",
        food_item_from_entity(item),
        Some(Meta::empty()),
    ))
}

pub async fn delete_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;

    let txn = state.orm.begin().await?;

    // Items on historical orders stay put so those orders keep their lines.
    let referenced = OrderItems::find()
        .filter(OrderItemCol::FoodItemId.eq(id))
        .count(&txn)
        .await?;
    if referenced > 0 {
        return Err(AppError::Conflict(
            "item is referenced by existing orders".into(),
        ));
    }

    let result = FoodItems::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "item_delete",
        Some("food_items"),
        Some(serde_json::json!({ "food_item_id": id })),
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

/// Image references are either uploads served by this service or external
/// URLs, which pass through untouched.
fn validate_image_reference(image: &str) -> AppResult<()> {
    if ImageStore::is_external(image) || image.starts_with("/uploads/") {
        return Ok(());
    }
    Err(AppError::Validation(
        "image must be an /uploads/ path or an http(s) URL".into(),
    ))
}

pub fn food_item_from_entity(model: FoodItemModel) -> FoodItem {
    FoodItem {
        id: model.id,
        name: model.name,
        price: model.price,
        category: model.category,
        description: model.description,
        stock_quantity: model.stock_quantity,
        available: model.available,
        image: model.image,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
