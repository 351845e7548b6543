use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{CartLine, FoodItem},
};

/// Session-scoped carts, one per logged-in user.
///
/// Lines live only in memory: they are dropped on logout, cleared after a
/// successful checkout and lost on restart. Each cart sits behind its own
/// async lock, so concurrent mutations of the same cart serialize and the
/// stock cap is checked while the lock is held.
#[derive(Default)]
pub struct CartStore {
    carts: RwLock<HashMap<Uuid, Arc<Mutex<Vec<CartLine>>>>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn cart(&self, user_id: Uuid) -> Arc<Mutex<Vec<CartLine>>> {
        {
            let carts = self.carts.read().await;
            if let Some(cart) = carts.get(&user_id) {
                return cart.clone();
            }
        }
        let mut carts = self.carts.write().await;
        carts.entry(user_id).or_default().clone()
    }

    /// Add one unit of `item` to the user's cart.
    ///
    /// Unavailable or zero-stock items are rejected without touching the
    /// cart. An existing line increments up to the item's current stock;
    /// a new line always enters with quantity 1.
    pub async fn add_item(&self, user_id: Uuid, item: &FoodItem) -> AppResult<CartLine> {
        if !item.available || item.stock_quantity <= 0 {
            return Err(AppError::Conflict(format!(
                "{} is currently out of stock",
                item.name
            )));
        }

        let cart = self.cart(user_id).await;
        let mut lines = cart.lock().await;

        if let Some(line) = lines.iter_mut().find(|l| l.food_item_id == item.id) {
            if line.quantity >= item.stock_quantity {
                return Err(AppError::Conflict(format!(
                    "cannot add more {}: only {} available",
                    item.name, item.stock_quantity
                )));
            }
            line.quantity += 1;
            return Ok(line.clone());
        }

        let line = CartLine {
            food_item_id: item.id,
            name: item.name.clone(),
            unit_price: item.price,
            quantity: 1,
        };
        lines.push(line.clone());
        Ok(line)
    }

    /// Decrease a line by one unit; the line disappears at quantity zero.
    /// Returns the updated line, or `None` once it has been removed.
    pub async fn decrement(&self, user_id: Uuid, food_item_id: Uuid) -> AppResult<Option<CartLine>> {
        let cart = self.cart(user_id).await;
        let mut lines = cart.lock().await;

        let idx = lines
            .iter()
            .position(|l| l.food_item_id == food_item_id)
            .ok_or(AppError::NotFound)?;

        if lines[idx].quantity <= 1 {
            lines.remove(idx);
            return Ok(None);
        }
        lines[idx].quantity -= 1;
        Ok(Some(lines[idx].clone()))
    }

    pub async fn remove_item(&self, user_id: Uuid, food_item_id: Uuid) -> AppResult<()> {
        let cart = self.cart(user_id).await;
        let mut lines = cart.lock().await;

        let idx = lines
            .iter()
            .position(|l| l.food_item_id == food_item_id)
            .ok_or(AppError::NotFound)?;
        lines.remove(idx);
        Ok(())
    }

    pub async fn clear(&self, user_id: Uuid) {
        let cart = self.cart(user_id).await;
        cart.lock().await.clear();
    }

    /// Drop the cart entirely (logout, account deletion).
    pub async fn drop_cart(&self, user_id: Uuid) {
        self.carts.write().await.remove(&user_id);
    }

    pub async fn snapshot(&self, user_id: Uuid) -> Vec<CartLine> {
        let cart = self.cart(user_id).await;
        let lines = cart.lock().await;
        lines.clone()
    }

    /// Cart total, recomputed from the lines on every call.
    pub fn total(lines: &[CartLine]) -> Decimal {
        lines.iter().map(CartLine::subtotal).sum()
    }
}
