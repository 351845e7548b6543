use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::seller_requests::{SellerRequestList, SubmitSellerRequest},
    entity::{
        seller_requests::{
            ActiveModel as RequestActive, Column as RequestCol, Entity as SellerRequests,
            Model as RequestModel,
        },
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ROLE_CUSTOMER, ROLE_SELLER, ensure_admin},
    models::{RequestStatus, SellerRequest},
    response::{ApiResponse, Meta},
    routes::params::RequestListQuery,
    state::AppState,
};

/// A customer asks to be elevated to seller.
///
/// One live request per user: resubmission is allowed only after a
/// rejection, so pending and approved requests block a new one.
pub async fn submit(
    state: &AppState,
    user: &AuthUser,
    payload: SubmitSellerRequest,
) -> AppResult<ApiResponse<SellerRequest>> {
    if user.role != ROLE_CUSTOMER {
        return Err(AppError::Conflict(
            "only customers can request seller access".into(),
        ));
    }

    let reason = payload.reason.trim().to_string();
    if reason.is_empty() {
        return Err(AppError::Validation("a reason is required".into()));
    }

    let blocking = SellerRequests::find()
        .filter(
            Condition::all()
                .add(RequestCol::UserId.eq(user.user_id))
                .add(RequestCol::Status.is_in([
                    RequestStatus::Pending.as_str(),
                    RequestStatus::Approved.as_str(),
                ])),
        )
        .count(&state.orm)
        .await?;
    if blocking > 0 {
        return Err(AppError::Conflict(
            "a seller request is already pending or approved".into(),
        ));
    }

    let account = Users::find_by_id(user.user_id).one(&state.orm).await?;
    let account = match account {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let request = RequestActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        username: Set(account.username),
        reason: Set(reason),
        status: Set(RequestStatus::Pending.as_str().into()),
        request_date: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "seller_request_submit",
        Some("seller_requests"),
        Some(serde_json::json!({ "request_id": request.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Request submitted",
        request_from_entity(request),
        Some(Meta::empty()),
    ))
}

pub async fn my_request(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<SellerRequest>> {
    let request = SellerRequests::find()
        .filter(RequestCol::UserId.eq(user.user_id))
        .order_by_desc(RequestCol::RequestDate)
        .one(&state.orm)
        .await?;
    let request = match request {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success(
        "Seller request",
        request_from_entity(request),
        Some(Meta::empty()),
    ))
}

pub async fn list(
    state: &AppState,
    user: &AuthUser,
    query: RequestListQuery,
) -> AppResult<ApiResponse<SellerRequestList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status = RequestStatus::parse(status)
            .ok_or_else(|| AppError::Validation(format!("unknown request status {status}")))?;
        condition = condition.add(RequestCol::Status.eq(status.as_str()));
    }

    let finder = SellerRequests::find()
        .filter(condition)
        .order_by_desc(RequestCol::RequestDate);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(request_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Seller requests",
        SellerRequestList { items },
        Some(meta),
    ))
}

/// Approve a pending request and promote the user, as one unit of work.
/// Either both writes land or neither does.
pub async fn approve(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<SellerRequest>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;

    let request = SellerRequests::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let request = match request {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    if request.status != RequestStatus::Pending.as_str() {
        return Err(AppError::Conflict("request is already processed".into()));
    }

    let requester = Users::find_by_id(request.user_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let requester = match requester {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let mut request_active: RequestActive = request.into();
    request_active.status = Set(RequestStatus::Approved.as_str().into());
    let request = request_active.update(&txn).await?;

    let mut user_active: UserActive = requester.into();
    user_active.role = Set(ROLE_SELLER.into());
    user_active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "seller_request_approve",
        Some("seller_requests"),
        Some(serde_json::json!({ "request_id": request.id, "user_id": request.user_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Request approved",
        request_from_entity(request),
        Some(Meta::empty()),
    ))
}

/// Reject a pending request; the user's role is untouched.
pub async fn reject(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<SellerRequest>> {
    ensure_admin(user)?;

    let request = SellerRequests::find_by_id(id).one(&state.orm).await?;
    let request = match request {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    if request.status != RequestStatus::Pending.as_str() {
        return Err(AppError::Conflict("request is already processed".into()));
    }

    let mut active: RequestActive = request.into();
    active.status = Set(RequestStatus::Rejected.as_str().into());
    let request = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "seller_request_reject",
        Some("seller_requests"),
        Some(serde_json::json!({ "request_id": request.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Request rejected",
        request_from_entity(request),
        Some(Meta::empty()),
    ))
}

pub async fn delete(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let result = SellerRequests::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "seller_request_delete",
        Some("seller_requests"),
        Some(serde_json::json!({ "request_id": id })),
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

pub fn request_from_entity(model: RequestModel) -> SellerRequest {
    SellerRequest {
        id: model.id,
        user_id: model.user_id,
        username: model.username,
        reason: model.reason,
        status: model.status,
        request_date: model.request_date.with_timezone(&Utc),
    }
}
