//! Order repository.
//!
//! Order items and the shipping address are denormalized JSONB documents;
//! the order insert and the source-cart delete share one transaction so a
//! placed order always consumes its cart.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use cedarmarket_core::{CartId, OrderId, OrderStatus, PaymentMethod, UserId};

use super::{CartRepository, RepositoryError};
use crate::models::{Address, Order, OrderItem};

const ORDER_COLUMNS: &str = "id, user_id, items, address, subtotal, shipping, total, status, \
     payment_method, is_paid, paid_at, created_at, updated_at";

/// Internal row type for order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Option<Uuid>,
    items: serde_json::Value,
    address: serde_json::Value,
    subtotal: Decimal,
    shipping: Decimal,
    total: Decimal,
    status: String,
    payment_method: String,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let items: Vec<OrderItem> = serde_json::from_value(row.items).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order items for {}: {e}", row.id))
        })?;
        let address: Address = serde_json::from_value(row.address).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order address for {}: {e}", row.id))
        })?;
        let status: OrderStatus = row
            .status
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("order {}: {e}", row.id)))?;
        let payment_method: PaymentMethod = row
            .payment_method
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("order {}: {e}", row.id)))?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: row.user_id.map(UserId::new),
            items,
            address,
            subtotal: row.subtotal,
            shipping: row.shipping,
            total: row.total,
            status,
            payment_method,
            is_paid: row.is_paid,
            paid_at: row.paid_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and delete the cart it was built from, atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing
    /// is persisted in that case.
    pub async fn insert_consuming_cart(
        &self,
        order: &Order,
        cart_id: CartId,
    ) -> Result<(), RepositoryError> {
        let items = serde_json::to_value(&order.items).map_err(|e| {
            RepositoryError::DataCorruption(format!("unserializable order items: {e}"))
        })?;
        let address = serde_json::to_value(&order.address).map_err(|e| {
            RepositoryError::DataCorruption(format!("unserializable order address: {e}"))
        })?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders
                 (id, user_id, items, address, subtotal, shipping, total,
                  status, payment_method, is_paid, paid_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(items)
        .bind(address)
        .bind(order.subtotal)
        .bind(order.shipping)
        .bind(order.total)
        .bind(order.status.as_str())
        .bind(order.payment_method.as_str())
        .bind(order.is_paid)
        .bind(order.paid_at)
        .execute(&mut *tx)
        .await?;

        CartRepository::delete(&mut *tx, cart_id).await?;

        tx.commit().await?;
        Ok(())
    }

    /// List every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Persist an order's mutable fields after a status transition.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_status(&self, order: &Order) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE orders
             SET status = $2, is_paid = $3, paid_at = $4, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(order.id)
        .bind(order.status.as_str())
        .bind(order.is_paid)
        .bind(order.paid_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete an order.
    ///
    /// Returns `false` if no such order exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Total number of orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
