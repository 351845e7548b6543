use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use canteen_api::error::AppResult;
use canteen_api::gateway::{ChargeOutcome, ChargeRequest, PaymentGateway, SimulatedGateway};
use canteen_api::models::PaymentMethod;
use canteen_api::services::payment_service::new_transaction_id;

fn request() -> ChargeRequest {
    ChargeRequest {
        transaction_id: new_transaction_id(),
        amount: Decimal::new(13000, 2),
        method: PaymentMethod::Card,
    }
}

#[tokio::test]
async fn simulated_gateway_approves_at_rate_one() {
    let gateway = SimulatedGateway::new(Duration::ZERO, 1.0);
    for _ in 0..20 {
        let outcome = gateway.charge(&request()).await.unwrap();
        assert_eq!(outcome, ChargeOutcome::Approved);
    }
}

#[tokio::test]
async fn simulated_gateway_declines_at_rate_zero() {
    let gateway = SimulatedGateway::new(Duration::ZERO, 0.0);
    for _ in 0..20 {
        let outcome = gateway.charge(&request()).await.unwrap();
        assert_eq!(outcome, ChargeOutcome::Declined);
    }
}

/// The gateway is a capability: a deterministic double slots in wherever
/// the simulation does.
struct AlwaysDecline;

#[async_trait]
impl PaymentGateway for AlwaysDecline {
    async fn charge(&self, _request: &ChargeRequest) -> AppResult<ChargeOutcome> {
        Ok(ChargeOutcome::Declined)
    }
}

#[tokio::test]
async fn gateway_trait_accepts_test_doubles() {
    let gateway: Box<dyn PaymentGateway> = Box::new(AlwaysDecline);
    let outcome = gateway.charge(&request()).await.unwrap();
    assert_eq!(outcome, ChargeOutcome::Declined);
}

#[tokio::test]
async fn simulated_latency_is_respected() {
    let gateway = SimulatedGateway::new(Duration::from_millis(50), 1.0);
    let start = std::time::Instant::now();
    gateway.charge(&request()).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(50));
}
