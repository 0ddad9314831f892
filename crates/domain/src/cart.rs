//! Shopping cart management.
//!
//! Carts are plain relational state, not event-sourced: a user has at most
//! one cart, items are upserted in place, and the cart is read back
//! whole on every `GetCart` call.

use async_trait::async_trait;
use common::{Money, ProductId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The requested quantity exceeds the catalog's reported stock. This is
    /// a soft pre-check: the authoritative check happens at reservation
    /// time in the warehouse service.
    #[error("requested quantity {requested} exceeds available stock {available} for product {product_id}")]
    ExceedsAvailableStock {
        product_id: String,
        requested: u32,
        available: u32,
    },

    /// The product does not exist in the catalog.
    #[error("product not found: {0}")]
    ProductNotFound(String),

    /// The cart has no items.
    #[error("cart is empty")]
    Empty,

    /// Underlying storage failure.
    #[error("cart storage error: {0}")]
    Storage(String),
}

/// A single line in a cart, snapshotting the product name and price at the
/// time it was added or last updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    /// Current on-hand quantity across active warehouses, as of the last
    /// `GetCart` call. Not persisted; populated by the repository at read
    /// time.
    pub actual_stock: u32,
}

/// A user's cart.
///
/// Carts are never deleted, to preserve audit history: a successful
/// `CreateOrder` soft-deactivates the cart it consumed rather than clearing
/// it, and a later `AddProductToCart` reactivates a fresh one lazily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub is_active: bool,
}

impl Cart {
    /// True if the cart has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A read of a product's catalog entry, used when adding items to a cart.
/// Supplied by the caller (the order service's catalog client) rather than
/// owned by this crate, since the product catalog is out of this system's
/// scope.
#[derive(Debug, Clone)]
pub struct CatalogProduct {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: u32,
}

/// Repository for cart state.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Returns the user's cart, creating an empty one if none exists yet.
    async fn get_or_create(&self, user_id: UserId) -> Result<Cart, CartError>;

    /// Adds (or updates, if already present) a line item in the user's
    /// cart, snapshotting the given catalog entry's name and price.
    async fn upsert_item(
        &self,
        user_id: UserId,
        product: &CatalogProduct,
        quantity: u32,
    ) -> Result<Cart, CartError>;

    /// Soft-deactivates the user's active cart, called once `CreateOrder`
    /// has successfully snapshotted it onto an order. The row is kept for
    /// audit history; the next `AddProductToCart` starts a fresh cart.
    async fn deactivate(&self, user_id: UserId) -> Result<(), CartError>;
}

/// In-memory cart repository, for tests.
#[derive(Debug, Default)]
pub struct InMemoryCartRepository {
    carts: tokio::sync::Mutex<std::collections::HashMap<UserId, Cart>>,
}

impl InMemoryCartRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

fn blank_cart(user_id: UserId) -> Cart {
    Cart {
        id: Uuid::new_v4(),
        user_id,
        items: Vec::new(),
        is_active: true,
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn get_or_create(&self, user_id: UserId) -> Result<Cart, CartError> {
        let mut carts = self.carts.lock().await;
        let cart = carts.entry(user_id).or_insert_with(|| blank_cart(user_id));
        if !cart.is_active {
            *cart = blank_cart(user_id);
        }
        Ok(cart.clone())
    }

    async fn upsert_item(
        &self,
        user_id: UserId,
        product: &CatalogProduct,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        if quantity > product.stock {
            return Err(CartError::ExceedsAvailableStock {
                product_id: product.product_id.to_string(),
                requested: quantity,
                available: product.stock,
            });
        }

        let mut carts = self.carts.lock().await;
        let cart = carts.entry(user_id).or_insert_with(|| blank_cart(user_id));
        if !cart.is_active {
            *cart = blank_cart(user_id);
        }

        match cart.items.iter_mut().find(|i| i.product_id == product.product_id) {
            Some(item) => {
                item.quantity = quantity;
                item.product_name = product.name.clone();
                item.unit_price = product.price.clone();
                item.actual_stock = product.stock;
            }
            None => cart.items.push(CartItem {
                product_id: product.product_id.clone(),
                product_name: product.name.clone(),
                quantity,
                unit_price: product.price.clone(),
                actual_stock: product.stock,
            }),
        }

        Ok(cart.clone())
    }

    async fn deactivate(&self, user_id: UserId) -> Result<(), CartError> {
        let mut carts = self.carts.lock().await;
        if let Some(cart) = carts.get_mut(&user_id) {
            cart.is_active = false;
        }
        Ok(())
    }
}

/// PostgreSQL-backed cart repository.
///
/// `carts`/`cart_items` are plain relational tables, not event-sourced: a
/// cart is read back whole on every call and items are upserted in place.
#[derive(Clone)]
pub struct PostgresCartRepository {
    pool: sqlx::PgPool,
}

impl PostgresCartRepository {
    /// Creates a new repository backed by `pool`.
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    async fn active_cart_row(&self, user_id: UserId) -> Result<Option<Uuid>, CartError> {
        sqlx::query_as::<_, (Uuid,)>(
            "SELECT id FROM carts WHERE user_id = $1 AND is_active = true",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(|(id,)| id))
        .map_err(|e| CartError::Storage(e.to_string()))
    }

    async fn load(&self, cart_id: Uuid, user_id: UserId) -> Result<Cart, CartError> {
        let rows = sqlx::query_as::<_, (String, String, i32, i64, String)>(
            "SELECT product_id, product_name, quantity, unit_price_units, unit_price_currency \
             FROM cart_items WHERE cart_id = $1",
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CartError::Storage(e.to_string()))?;

        let items = rows
            .into_iter()
            .map(|(product_id, product_name, quantity, units, currency)| CartItem {
                product_id: ProductId::new(product_id),
                product_name,
                quantity: quantity as u32,
                unit_price: Money::new(units, currency),
                actual_stock: 0,
            })
            .collect();

        Ok(Cart {
            id: cart_id,
            user_id,
            items,
            is_active: true,
        })
    }

    async fn create_cart(&self, user_id: UserId) -> Result<Uuid, CartError> {
        let cart_id = Uuid::new_v4();
        sqlx::query("INSERT INTO carts (id, user_id, is_active) VALUES ($1, $2, true)")
            .bind(cart_id)
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| CartError::Storage(e.to_string()))?;
        Ok(cart_id)
    }
}

#[async_trait]
impl CartRepository for PostgresCartRepository {
    async fn get_or_create(&self, user_id: UserId) -> Result<Cart, CartError> {
        let cart_id = match self.active_cart_row(user_id).await? {
            Some(id) => id,
            None => self.create_cart(user_id).await?,
        };
        self.load(cart_id, user_id).await
    }

    async fn upsert_item(
        &self,
        user_id: UserId,
        product: &CatalogProduct,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        if quantity > product.stock {
            return Err(CartError::ExceedsAvailableStock {
                product_id: product.product_id.to_string(),
                requested: quantity,
                available: product.stock,
            });
        }

        let cart_id = match self.active_cart_row(user_id).await? {
            Some(id) => id,
            None => self.create_cart(user_id).await?,
        };

        sqlx::query(
            "INSERT INTO cart_items \
                (cart_id, product_id, product_name, quantity, unit_price_units, unit_price_currency) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (cart_id, product_id) DO UPDATE SET \
                product_name = EXCLUDED.product_name, \
                quantity = EXCLUDED.quantity, \
                unit_price_units = EXCLUDED.unit_price_units, \
                unit_price_currency = EXCLUDED.unit_price_currency",
        )
        .bind(cart_id)
        .bind(product.product_id.as_str())
        .bind(&product.name)
        .bind(quantity as i32)
        .bind(product.price.units)
        .bind(&product.price.currency_code)
        .execute(&self.pool)
        .await
        .map_err(|e| CartError::Storage(e.to_string()))?;

        sqlx::query("UPDATE carts SET updated_at = now() WHERE id = $1")
            .bind(cart_id)
            .execute(&self.pool)
            .await
            .map_err(|e| CartError::Storage(e.to_string()))?;

        self.load(cart_id, user_id).await
    }

    async fn deactivate(&self, user_id: UserId) -> Result<(), CartError> {
        sqlx::query("UPDATE carts SET is_active = false WHERE user_id = $1 AND is_active = true")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| CartError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, stock: u32) -> CatalogProduct {
        CatalogProduct {
            product_id: ProductId::new(id),
            name: "Widget".to_string(),
            price: Money::new(1000, "USD"),
            stock,
        }
    }

    #[tokio::test]
    async fn get_or_create_returns_empty_cart_for_new_user() {
        let repo = InMemoryCartRepository::new();
        let cart = repo.get_or_create(UserId::new()).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn upsert_item_adds_new_line() {
        let repo = InMemoryCartRepository::new();
        let user_id = UserId::new();

        let cart = repo.upsert_item(user_id, &product("SKU-1", 10), 3).await.unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.items[0].actual_stock, 10);
    }

    #[tokio::test]
    async fn upsert_item_replaces_quantity_on_existing_line() {
        let repo = InMemoryCartRepository::new();
        let user_id = UserId::new();

        repo.upsert_item(user_id, &product("SKU-1", 10), 3).await.unwrap();
        let cart = repo.upsert_item(user_id, &product("SKU-1", 10), 7).await.unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 7);
    }

    #[tokio::test]
    async fn upsert_item_rejects_quantity_above_stock() {
        let repo = InMemoryCartRepository::new();
        let user_id = UserId::new();

        let result = repo.upsert_item(user_id, &product("SKU-1", 2), 5).await;

        assert!(matches!(
            result,
            Err(CartError::ExceedsAvailableStock { .. })
        ));
    }

    #[tokio::test]
    async fn deactivate_then_get_or_create_starts_a_fresh_cart() {
        let repo = InMemoryCartRepository::new();
        let user_id = UserId::new();

        let first = repo.upsert_item(user_id, &product("SKU-1", 10), 3).await.unwrap();
        repo.deactivate(user_id).await.unwrap();

        let second = repo.get_or_create(user_id).await.unwrap();

        assert!(second.is_active);
        assert!(second.is_empty());
        assert_ne!(second.id, first.id);
    }
}
