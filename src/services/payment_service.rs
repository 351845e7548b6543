use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::{
        orders::PayOrderRequest,
        payments::{PaymentList, PaymentResult, RefundRequest},
    },
    entity::{
        food_orders::{Column as OrderCol, Entity as FoodOrders},
        payments::{
            ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments,
            Model as PaymentModel,
        },
    },
    error::{AppError, AppResult},
    gateway::{ChargeOutcome, ChargeRequest},
    middleware::auth::{AuthUser, ROLE_ADMIN, ensure_admin},
    models::{Order, Payment, PaymentMethod, PaymentStatus, redact_card_number},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub fn new_transaction_id() -> String {
    let fragment = Uuid::new_v4().simple().to_string();
    format!("TXN{}", fragment[..8].to_uppercase())
}

/// Record and process a payment attempt for a pending order.
///
/// Offline methods (cash on delivery, canteen pickup) never reach the
/// gateway: the payment stays pending and the attempt reports success.
/// Card and mobile banking run one gateway round-trip under a deadline.
/// A declined or failed charge leaves the order pending with the failed
/// payment attached; retrying is the caller's decision.
pub async fn pay_order(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: PayOrderRequest,
) -> AppResult<ApiResponse<PaymentResult>> {
    let method = PaymentMethod::parse(&payload.payment_method).ok_or_else(|| {
        AppError::Validation(format!("unknown payment method {}", payload.payment_method))
    })?;

    let card_number = match method {
        PaymentMethod::Card => {
            let raw = payload
                .card_number
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| AppError::Validation("card number is required".into()))?;
            if raw.chars().filter(|c| c.is_ascii_digit()).count() < 4 {
                return Err(AppError::Validation("card number is invalid".into()));
            }
            Some(redact_card_number(raw))
        }
        _ => None,
    };
    let mobile_number = match method {
        PaymentMethod::MobileBanking => Some(
            payload
                .mobile_number
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| AppError::Validation("mobile number is required".into()))?
                .to_string(),
        ),
        _ => payload.mobile_number.clone(),
    };
    let billing_address = match method {
        PaymentMethod::CashOnDelivery => Some(
            payload
                .billing_address
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| AppError::Validation("delivery address is required".into()))?
                .to_string(),
        ),
        _ => payload.billing_address.clone(),
    };

    let txn = state.orm.begin().await?;

    let order = FoodOrders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(order_id))
                .add(OrderCol::UserId.eq(user.user_id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if order.status != "pending" {
        return Err(AppError::Conflict("order is not awaiting payment".into()));
    }

    let already_paid = Payments::find()
        .filter(
            Condition::all()
                .add(PaymentCol::OrderId.eq(order_id))
                .add(PaymentCol::PaymentStatus.eq(PaymentStatus::Completed.as_str())),
        )
        .count(&txn)
        .await?;
    if already_paid > 0 {
        return Err(AppError::Conflict("order is already paid".into()));
    }

    let payment = PaymentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        customer_id: Set(user.user_id),
        amount: Set(order.total),
        payment_method: Set(method.as_str().into()),
        payment_status: Set(PaymentStatus::Pending.as_str().into()),
        transaction_id: Set(new_transaction_id()),
        card_number: Set(card_number),
        mobile_number: Set(mobile_number),
        billing_address: Set(billing_address),
        refund_amount: Set(Decimal::ZERO),
        payment_date: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    let (payment, accepted) = if method.is_offline() {
        // Settled at the counter: no gateway, stays pending.
        (payment, true)
    } else {
        let request = ChargeRequest {
            transaction_id: payment.transaction_id.clone(),
            amount: payment.amount,
            method,
        };
        match tokio::time::timeout(state.config.gateway_timeout, state.gateway.charge(&request))
            .await
        {
            Err(_) => {
                let payment = set_payment_status(state, payment, PaymentStatus::Failed).await?;
                audit_payment(state, user, &payment, false).await;
                return Err(AppError::Gateway("payment gateway timed out".into()));
            }
            Ok(Err(err)) => {
                let payment = set_payment_status(state, payment, PaymentStatus::Failed).await?;
                audit_payment(state, user, &payment, false).await;
                return Err(err);
            }
            Ok(Ok(ChargeOutcome::Approved)) => {
                let payment = set_payment_status(state, payment, PaymentStatus::Completed).await?;
                (payment, true)
            }
            Ok(Ok(ChargeOutcome::Declined)) => {
                let payment = set_payment_status(state, payment, PaymentStatus::Failed).await?;
                (payment, false)
            }
        }
    };

    audit_payment(state, user, &payment, accepted).await;

    let message = if accepted {
        "Payment recorded"
    } else {
        "Payment failed"
    };
    Ok(ApiResponse::success(
        message,
        PaymentResult {
            payment: payment_from_entity(payment),
            accepted,
        },
        Some(Meta::empty()),
    ))
}

async fn set_payment_status(
    state: &AppState,
    payment: PaymentModel,
    status: PaymentStatus,
) -> AppResult<PaymentModel> {
    let mut active: PaymentActive = payment.into();
    active.payment_status = Set(status.as_str().into());
    Ok(active.update(&state.orm).await?)
}

async fn audit_payment(state: &AppState, user: &AuthUser, payment: &PaymentModel, accepted: bool) {
    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_payment",
        Some("payments"),
        Some(serde_json::json!({
            "payment_id": payment.id,
            "order_id": payment.order_id,
            "status": payment.payment_status,
            "accepted": accepted,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
}

pub async fn list_my_payments(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<PaymentList>> {
    let (page, limit, offset) = pagination.normalize();
    let items: Vec<Payment> = sqlx::query_as(
        "SELECT * FROM payments WHERE customer_id = $1 ORDER BY payment_date DESC LIMIT $2 OFFSET $3",
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM payments WHERE customer_id = $1")
        .bind(user.user_id)
        .fetch_one(&state.pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Payments",
        PaymentList { items },
        Some(meta),
    ))
}

/// Payment history for one order, visible to its owner and to admins.
pub async fn list_order_payments(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<PaymentList>> {
    let order: Option<Order> = sqlx::query_as("SELECT * FROM food_orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(&state.pool)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };
    if order.user_id != user.user_id && user.role != ROLE_ADMIN {
        return Err(AppError::Forbidden);
    }

    let items = Payments::find()
        .filter(PaymentCol::OrderId.eq(order_id))
        .order_by_desc(PaymentCol::PaymentDate)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(payment_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Payments",
        PaymentList { items },
        Some(Meta::empty()),
    ))
}

/// Admin refund of a completed payment.
pub async fn refund(
    state: &AppState,
    user: &AuthUser,
    payment_id: Uuid,
    payload: RefundRequest,
) -> AppResult<ApiResponse<Payment>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;

    let payment = Payments::find_by_id(payment_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let payment = match payment {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    if payment.payment_status != PaymentStatus::Completed.as_str() {
        return Err(AppError::Conflict(
            "only completed payments can be refunded".into(),
        ));
    }

    let amount = payload.amount.unwrap_or(payment.amount);
    if amount <= Decimal::ZERO || amount > payment.amount {
        return Err(AppError::Validation("invalid refund amount".into()));
    }

    let mut active: PaymentActive = payment.into();
    active.payment_status = Set(PaymentStatus::Refunded.as_str().into());
    active.refund_amount = Set(amount);
    let payment = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "payment_refund",
        Some("payments"),
        Some(serde_json::json!({ "payment_id": payment.id, "amount": amount })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Refunded",
        payment_from_entity(payment),
        Some(Meta::empty()),
    ))
}

pub fn payment_from_entity(model: PaymentModel) -> Payment {
    Payment {
        id: model.id,
        order_id: model.order_id,
        customer_id: model.customer_id,
        amount: model.amount,
        payment_method: model.payment_method,
        payment_status: model.payment_status,
        transaction_id: model.transaction_id,
        card_number: model.card_number,
        mobile_number: model.mobile_number,
        billing_address: model.billing_address,
        refund_amount: model.refund_amount,
        payment_date: model.payment_date.with_timezone(&Utc),
    }
}
