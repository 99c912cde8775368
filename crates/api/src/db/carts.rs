//! Cart repository.
//!
//! Cart rows are small documents: the line items live in a JSONB column
//! and the owner is a pair of mutually exclusive nullable columns guarded
//! by a CHECK constraint. Row-level `FOR UPDATE` locks serialize the
//! read-modify-write cycles the reconciliation engine runs; see
//! `services::carts` for the transaction boundaries.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use cedarmarket_core::{Cart, CartId, CartLineItem, CartOwner, GuestId, UserId};

use super::RepositoryError;

const CART_COLUMNS: &str = "id, user_id, guest_id, items, total_price, created_at, updated_at";

/// Internal row type for cart queries.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: Uuid,
    user_id: Option<Uuid>,
    guest_id: Option<Uuid>,
    items: serde_json::Value,
    total_price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartRow> for Cart {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        let owner = match (row.user_id, row.guest_id) {
            (Some(user_id), None) => CartOwner::User(UserId::new(user_id)),
            (None, Some(guest_id)) => CartOwner::Guest(GuestId::new(guest_id)),
            (user, guest) => {
                return Err(RepositoryError::DataCorruption(format!(
                    "cart {} owner columns violate user-xor-guest: user={user:?} guest={guest:?}",
                    row.id
                )));
            }
        };

        let items: Vec<CartLineItem> = serde_json::from_value(row.items).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid cart items for {}: {e}", row.id))
        })?;

        Ok(Self {
            id: CartId::new(row.id),
            owner,
            items,
            total_price: row.total_price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's cart, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row: Option<CartRow> =
            sqlx::query_as(&format!("SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1"))
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a guest cart, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_guest(&self, guest_id: GuestId) -> Result<Option<Cart>, RepositoryError> {
        let row: Option<CartRow> =
            sqlx::query_as(&format!("SELECT {CART_COLUMNS} FROM carts WHERE guest_id = $1"))
                .bind(guest_id)
                .fetch_optional(self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Delete guest carts whose last write is older than `max_age`.
    ///
    /// The storage-side half of the 30-day guest cart lifecycle; driven by
    /// a background task.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn purge_expired_guests(&self, max_age: Duration) -> Result<u64, RepositoryError> {
        let cutoff = Utc::now() - max_age;

        let result =
            sqlx::query("DELETE FROM carts WHERE guest_id IS NOT NULL AND updated_at < $1")
                .bind(cutoff)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    // Transaction steps
    //
    // The reconciliation engine composes these inside a single transaction;
    // each takes the transaction's connection explicitly.
    // =========================================================================

    /// Fetch and row-lock a user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock_by_user(
        conn: &mut PgConnection,
        user_id: UserId,
    ) -> Result<Option<Cart>, RepositoryError> {
        let row: Option<CartRow> = sqlx::query_as(&format!(
            "SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1 FOR UPDATE"
        ))
        .bind(user_id)
        .fetch_optional(conn)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Fetch and row-lock a guest cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock_by_guest(
        conn: &mut PgConnection,
        guest_id: GuestId,
    ) -> Result<Option<Cart>, RepositoryError> {
        let row: Option<CartRow> = sqlx::query_as(&format!(
            "SELECT {CART_COLUMNS} FROM carts WHERE guest_id = $1 FOR UPDATE"
        ))
        .bind(guest_id)
        .fetch_optional(conn)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create (or find) a user's cart row and return it locked.
    ///
    /// Two concurrent first-writes race to insert; `ON CONFLICT DO NOTHING`
    /// lets the loser fall through to locking the winner's row instead of
    /// failing on the unique index.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn create_user_cart(
        conn: &mut PgConnection,
        user_id: UserId,
    ) -> Result<Cart, RepositoryError> {
        sqlx::query(
            "INSERT INTO carts (id, user_id, guest_id, items, total_price)
             VALUES ($1, $2, NULL, '[]', 0)
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(CartId::mint())
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

        Self::lock_by_user(conn, user_id).await?.ok_or_else(|| {
            RepositoryError::DataCorruption(format!("cart for user {user_id} vanished mid-insert"))
        })
    }

    /// Upsert a cart row, recomputing the stored total first.
    ///
    /// The total is always re-derived from the line items here, never
    /// trusted from whatever the caller happens to hold.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn save(conn: &mut PgConnection, cart: &mut Cart) -> Result<(), RepositoryError> {
        cart.recompute_total();

        let items = serde_json::to_value(&cart.items).map_err(|e| {
            RepositoryError::DataCorruption(format!("unserializable cart items: {e}"))
        })?;

        sqlx::query(
            "INSERT INTO carts (id, user_id, guest_id, items, total_price)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE
             SET user_id = EXCLUDED.user_id,
                 guest_id = EXCLUDED.guest_id,
                 items = EXCLUDED.items,
                 total_price = EXCLUDED.total_price,
                 updated_at = NOW()",
        )
        .bind(cart.id)
        .bind(cart.owner.user_id())
        .bind(cart.owner.guest_id())
        .bind(items)
        .bind(cart.total_price)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Delete a cart row by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(conn: &mut PgConnection, id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(())
    }
}
