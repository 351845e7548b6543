pub mod audit_logs;
pub mod food_items;
pub mod food_orders;
pub mod order_items;
pub mod payments;
pub mod seller_requests;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use food_items::Entity as FoodItems;
pub use food_orders::Entity as FoodOrders;
pub use order_items::Entity as OrderItems;
pub use payments::Entity as Payments;
pub use seller_requests::Entity as SellerRequests;
pub use users::Entity as Users;
