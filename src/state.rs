use std::sync::Arc;

use crate::{
    cart::CartStore,
    config::AppConfig,
    db::{DbPool, OrmConn},
    gateway::PaymentGateway,
    images::ImageStore,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: AppConfig,
    pub carts: Arc<CartStore>,
    pub images: Arc<ImageStore>,
    pub gateway: Arc<dyn PaymentGateway>,
}
