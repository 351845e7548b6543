use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub amount: Decimal,
    pub payment_method: String,
    pub payment_status: String,
    #[sea_orm(unique)]
    pub transaction_id: String,
    pub card_number: Option<String>,
    pub mobile_number: Option<String>,
    pub billing_address: Option<String>,
    pub refund_amount: Decimal,
    pub payment_date: DateTimeWithTimeZone,
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
        belongs_to = "super::users::Entity",
        from = "Column::CustomerId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::food_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FoodOrders.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
