use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Payment;

/// Outcome of a payment attempt. `accepted` mirrors what the gateway (or
/// the offline short-circuit) reported; the payment row carries the status.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResult {
    pub payment: Payment,
    pub accepted: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentList {
    pub items: Vec<Payment>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefundRequest {
    /// Defaults to the full payment amount when omitted.
    #[schema(value_type = Option<String>)]
    pub amount: Option<Decimal>,
}
