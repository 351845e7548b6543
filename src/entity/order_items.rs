use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub order_id: Uuid,
    pub food_item_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::food_orders::Entity",
        from = "Column::OrderId",
        to = "super::food_orders::Column::Id"
    )]
    FoodOrders,
    #[sea_orm(
        belongs_to = "super::food_items::Entity",
        from = "Column::FoodItemId",
        to = "super::food_items::Column::Id"
    )]
    FoodItems,
}

impl Related<super::food_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FoodOrders.def()
    }
}

impl Related<super::food_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FoodItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
