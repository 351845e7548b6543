use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;

use crate::{config::AppConfig, error::AppResult, models::PaymentMethod};

#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub transaction_id: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeOutcome {
    Approved,
    Declined,
}

/// External payment-processing capability.
///
/// No real gateway is integrated; callers only see this trait, so the
/// simulation below can be swapped for a real integration (or a
/// deterministic double in tests) without touching the payment service.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> AppResult<ChargeOutcome>;
}

/// Stand-in gateway: a fixed round-trip latency followed by a Bernoulli
/// draw over the configured success rate.
pub struct SimulatedGateway {
    latency: Duration,
    success_rate: f64,
}

impl SimulatedGateway {
    pub fn new(latency: Duration, success_rate: f64) -> Self {
        Self {
            latency,
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.gateway_latency, config.gateway_success_rate)
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, request: &ChargeRequest) -> AppResult<ChargeOutcome> {
        tokio::time::sleep(self.latency).await;
        let approved = rand::rng().random_bool(self.success_rate);
        tracing::debug!(
            transaction_id = %request.transaction_id,
            approved,
            "simulated gateway charge"
        );
        Ok(if approved {
            ChargeOutcome::Approved
        } else {
            ChargeOutcome::Declined
        })
    }
}
