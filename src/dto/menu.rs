use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::FoodItem;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateFoodItemRequest {
    pub name: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub category: String,
    pub description: Option<String>,
    pub stock_quantity: i32,
    pub available: Option<bool>,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateFoodItemRequest {
    pub name: Option<String>,
    #[schema(value_type = String)]
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub stock_quantity: Option<i32>,
    pub available: Option<bool>,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RestockRequest {
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AvailabilityRequest {
    pub available: bool,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct MenuList {
    #[schema(value_type = Vec<FoodItem>)]
    pub items: Vec<FoodItem>,
}
