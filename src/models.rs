use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FoodItem {
    pub id: Uuid,
    pub name: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub category: String,
    pub description: Option<String>,
    pub stock_quantity: i32,
    pub available: bool,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One (item, quantity, price) line in a session cart. The unit price is
/// snapshotted when the line is first added and carried onto the order
/// unchanged, so menu edits never alter a cart already in flight.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartLine {
    pub food_item_id: Uuid,
    pub name: String,
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl CartLine {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    #[schema(value_type = String)]
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub food_item_id: Uuid,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub payment_method: String,
    pub payment_status: String,
    pub transaction_id: String,
    pub card_number: Option<String>,
    pub mobile_number: Option<String>,
    pub billing_address: Option<String>,
    #[schema(value_type = String)]
    pub refund_amount: Decimal,
    pub payment_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SellerRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub reason: String,
    pub status: String,
    pub request_date: DateTime<Utc>,
}

/// Order fulfillment lifecycle.
///
/// pending -> in_progress -> ready -> completed, with cancellation allowed
/// from any non-terminal state. Re-applying the current status is accepted
/// as a no-op so repeated updates stay idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "ready" => Some(Self::Ready),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Ready => "ready",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn can_transition_to(&self, next: Self) -> bool {
        if *self == next {
            return true;
        }
        match (self, next) {
            (Self::Pending, Self::InProgress) => true,
            (Self::InProgress, Self::Ready) => true,
            (Self::Ready, Self::Completed) => true,
            (s, Self::Cancelled) if !s.is_terminal() => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    MobileBanking,
    CashOnDelivery,
    PickupFromCanteen,
}

impl PaymentMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "card" => Some(Self::Card),
            "mobile_banking" => Some(Self::MobileBanking),
            "cash_on_delivery" => Some(Self::CashOnDelivery),
            "pickup_from_canteen" => Some(Self::PickupFromCanteen),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::MobileBanking => "mobile_banking",
            Self::CashOnDelivery => "cash_on_delivery",
            Self::PickupFromCanteen => "pickup_from_canteen",
        }
    }

    /// Methods settled at the counter skip the gateway entirely and the
    /// payment stays pending until staff collect the money.
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::CashOnDelivery | Self::PickupFromCanteen)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Keep only the last four digits of a card number.
pub fn redact_card_number(card_number: &str) -> String {
    let digits: String = card_number.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() >= 4 {
        format!("**** **** **** {}", &digits[digits.len() - 4..])
    } else {
        digits
    }
}
