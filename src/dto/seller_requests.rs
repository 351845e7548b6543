use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::SellerRequest;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitSellerRequest {
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SellerRequestList {
    pub items: Vec<SellerRequest>,
}
