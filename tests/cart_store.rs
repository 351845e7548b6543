use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use canteen_api::cart::CartStore;
use canteen_api::error::AppError;
use canteen_api::models::FoodItem;

fn item(name: &str, price: Decimal, stock: i32, available: bool) -> FoodItem {
    FoodItem {
        id: Uuid::new_v4(),
        name: name.to_string(),
        price,
        category: "Snacks".to_string(),
        description: None,
        stock_quantity: stock,
        available,
        image: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn new_lines_enter_with_quantity_one() {
    let carts = CartStore::new();
    let user = Uuid::new_v4();
    let coffee = item("Coffee", Decimal::new(5000, 2), 10, true);

    let line = carts.add_item(user, &coffee).await.expect("add");
    assert_eq!(line.quantity, 1);
    assert_eq!(line.unit_price, Decimal::new(5000, 2));
}

#[tokio::test]
async fn total_tracks_every_mutation() {
    let carts = CartStore::new();
    let user = Uuid::new_v4();
    let coffee = item("Coffee", Decimal::new(5000, 2), 10, true);
    let fries = item("French Fries", Decimal::new(3000, 2), 5, true);

    carts.add_item(user, &coffee).await.unwrap();
    carts.add_item(user, &coffee).await.unwrap();
    carts.add_item(user, &fries).await.unwrap();

    let lines = carts.snapshot(user).await;
    // 2 x 50.00 + 1 x 30.00
    assert_eq!(CartStore::total(&lines), Decimal::new(13000, 2));

    carts.decrement(user, coffee.id).await.unwrap();
    let lines = carts.snapshot(user).await;
    assert_eq!(CartStore::total(&lines), Decimal::new(8000, 2));

    carts.remove_item(user, fries.id).await.unwrap();
    let lines = carts.snapshot(user).await;
    assert_eq!(CartStore::total(&lines), Decimal::new(5000, 2));

    carts.clear(user).await;
    let lines = carts.snapshot(user).await;
    assert!(lines.is_empty());
    assert_eq!(CartStore::total(&lines), Decimal::ZERO);
}

#[tokio::test]
async fn out_of_stock_items_never_enter_the_cart() {
    let carts = CartStore::new();
    let user = Uuid::new_v4();

    let unavailable = item("Pizza", Decimal::new(20000, 2), 10, false);
    let sold_out = item("Burger", Decimal::new(15000, 2), 0, true);

    let err = carts.add_item(user, &unavailable).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = carts.add_item(user, &sold_out).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    assert!(carts.snapshot(user).await.is_empty());
}

#[tokio::test]
async fn increments_are_capped_at_current_stock() {
    let carts = CartStore::new();
    let user = Uuid::new_v4();
    let fries = item("French Fries", Decimal::new(3000, 2), 2, true);

    carts.add_item(user, &fries).await.unwrap();
    let line = carts.add_item(user, &fries).await.unwrap();
    assert_eq!(line.quantity, 2);

    let err = carts.add_item(user, &fries).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let lines = carts.snapshot(user).await;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 2);
}

#[tokio::test]
async fn decrement_from_one_removes_the_line() {
    let carts = CartStore::new();
    let user = Uuid::new_v4();
    let coffee = item("Coffee", Decimal::new(5000, 2), 10, true);

    carts.add_item(user, &coffee).await.unwrap();
    let result = carts.decrement(user, coffee.id).await.unwrap();
    assert!(result.is_none());
    assert!(carts.snapshot(user).await.is_empty());

    let err = carts.decrement(user, coffee.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn concurrent_adds_cannot_exceed_stock() {
    let carts = Arc::new(CartStore::new());
    let user = Uuid::new_v4();
    let coffee = item("Coffee", Decimal::new(5000, 2), 1, true);

    let a = {
        let carts = carts.clone();
        let coffee = coffee.clone();
        tokio::spawn(async move { carts.add_item(user, &coffee).await })
    };
    let b = {
        let carts = carts.clone();
        let coffee = coffee.clone();
        tokio::spawn(async move { carts.add_item(user, &coffee).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one concurrent add may win");

    let lines = carts.snapshot(user).await;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 1);
}

#[tokio::test]
async fn carts_are_isolated_per_user() {
    let carts = CartStore::new();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let coffee = item("Coffee", Decimal::new(5000, 2), 10, true);

    carts.add_item(alice, &coffee).await.unwrap();
    assert!(carts.snapshot(bob).await.is_empty());

    carts.drop_cart(alice).await;
    assert!(carts.snapshot(alice).await.is_empty());
}
