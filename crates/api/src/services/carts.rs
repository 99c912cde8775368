//! Cart reconciliation engine.
//!
//! Owns the lifecycle of a cart that may exist anonymously (keyed by the
//! `guestCartId` cookie) or tied to an authenticated user, and the one-time
//! merge that happens when a guest authenticates.
//!
//! # Concurrency
//!
//! Every cart mutation is a read-modify-write, so each one runs inside a
//! transaction that takes a `FOR UPDATE` row lock on the cart it touches.
//! Two rapid add-to-cart clicks serialize on the lock instead of losing an
//! increment.
//!
//! The merge itself is not idempotent: replaying it would double-add
//! quantities. Exactly-once comes from the guest cart row doubling as the
//! merge token: the merge locks the guest row, folds its items into the
//! user cart, and deletes it before committing. A concurrent or retried
//! merge blocks on the lock, then finds no guest row and does nothing.

use sqlx::PgPool;

use cedarmarket_core::{Cart, CartError, GuestId, ProductId, ProductSnapshot, UserId};

use crate::db::{CartRepository, ProductRepository, RepositoryError};

/// Errors produced by cart operations.
#[derive(Debug, thiserror::Error)]
pub enum CartServiceError {
    /// The referenced product does not exist in the catalog.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The caller has no cart to mutate.
    #[error("cart not found")]
    CartNotFound,

    /// The cart holds no line item for the given product.
    #[error("item not found in cart: {0}")]
    LineNotFound(ProductId),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<CartError> for CartServiceError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::LineNotFound(id) => Self::LineNotFound(id),
        }
    }
}

/// The identity a cart request is resolved against.
#[derive(Debug, Clone, Copy)]
pub enum CartIdentity {
    /// An authenticated user, possibly still carrying a guest cookie from
    /// before they logged in.
    User {
        id: UserId,
        guest: Option<GuestId>,
    },
    /// An anonymous shopper.
    Guest(GuestId),
}

/// Cart reconciliation service.
pub struct CartService<'a> {
    pool: &'a PgPool,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Resolve the single authoritative cart for a request.
    ///
    /// When the caller is authenticated and still carries a guest id, any
    /// guest cart under that id is merged into the user cart first (see the
    /// module docs for the exactly-once argument). Returns `None` when the
    /// identity has no cart yet; carts are created lazily on first write.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::Repository` if the database fails.
    pub async fn resolve(&self, identity: CartIdentity) -> Result<Option<Cart>, CartServiceError> {
        let repo = CartRepository::new(self.pool);

        match identity {
            CartIdentity::User { id, guest } => {
                if let Some(guest_id) = guest
                    && let Some(merged) = self.merge_guest_into_user(id, guest_id).await?
                {
                    return Ok(Some(merged));
                }

                Ok(repo.get_by_user(id).await?)
            }
            CartIdentity::Guest(guest_id) => Ok(repo.get_by_guest(guest_id).await?),
        }
    }

    /// Merge a guest cart into a user's cart, exactly once.
    ///
    /// Returns the resulting user cart, or `None` when there is no guest
    /// cart to merge (including the replay case).
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::Repository` if the database fails; the
    /// transaction rolls back and the guest cart survives for a retry.
    async fn merge_guest_into_user(
        &self,
        user_id: UserId,
        guest_id: GuestId,
    ) -> Result<Option<Cart>, CartServiceError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        // Lock order is guest-then-user everywhere, so concurrent merges of
        // the same pair cannot deadlock.
        let Some(mut guest_cart) = CartRepository::lock_by_guest(&mut tx, guest_id).await? else {
            return Ok(None);
        };

        let merged = match CartRepository::lock_by_user(&mut tx, user_id).await? {
            // No user cart yet: reassign the guest cart wholesale. O(1),
            // no item-level work, the row and its id survive.
            None => {
                guest_cart.assign_to_user(user_id);
                CartRepository::save(&mut tx, &mut guest_cart).await?;
                guest_cart
            }
            // User cart exists: fold the guest items in, then delete the
            // guest row in the same transaction.
            Some(mut user_cart) => {
                user_cart.merge_from(guest_cart.items);
                CartRepository::save(&mut tx, &mut user_cart).await?;
                CartRepository::delete(&mut tx, guest_cart.id).await?;
                user_cart
            }
        };

        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(user = %user_id, guest = %guest_id, "merged guest cart into user cart");
        Ok(Some(merged))
    }

    /// Add a product to a user's cart, creating the cart if needed.
    ///
    /// Adding an existing product increments its quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::ProductNotFound` for an unknown product
    /// id, or `CartServiceError::Repository` if the database fails.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, CartServiceError> {
        let product = ProductRepository::new(self.pool)
            .get(product_id)
            .await?
            .ok_or(CartServiceError::ProductNotFound(product_id))?;

        let snapshot = ProductSnapshot {
            product_id: product.id,
            name: product.name,
            price: product.price,
            image: Some(product.image),
        };

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let mut cart = match CartRepository::lock_by_user(&mut tx, user_id).await? {
            Some(cart) => cart,
            None => CartRepository::create_user_cart(&mut tx, user_id).await?,
        };
        cart.add_item(snapshot, quantity);
        CartRepository::save(&mut tx, &mut cart).await?;

        tx.commit().await.map_err(RepositoryError::from)?;
        Ok(cart)
    }

    /// Set the quantity of a line item directly; zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::CartNotFound` if the user has no cart,
    /// `CartServiceError::LineNotFound` if the product is not in it, or
    /// `CartServiceError::Repository` if the database fails.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Cart, CartServiceError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let mut cart = CartRepository::lock_by_user(&mut tx, user_id)
            .await?
            .ok_or(CartServiceError::CartNotFound)?;
        cart.set_quantity(product_id, quantity)?;
        CartRepository::save(&mut tx, &mut cart).await?;

        tx.commit().await.map_err(RepositoryError::from)?;
        Ok(cart)
    }

    /// Remove a product's line item. Removing an absent product is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::CartNotFound` if the user has no cart, or
    /// `CartServiceError::Repository` if the database fails.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Cart, CartServiceError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let mut cart = CartRepository::lock_by_user(&mut tx, user_id)
            .await?
            .ok_or(CartServiceError::CartNotFound)?;
        cart.remove_item(product_id);
        CartRepository::save(&mut tx, &mut cart).await?;

        tx.commit().await.map_err(RepositoryError::from)?;
        Ok(cart)
    }

    /// Remove every line item from a user's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::CartNotFound` if the user has no cart, or
    /// `CartServiceError::Repository` if the database fails.
    pub async fn clear(&self, user_id: UserId) -> Result<Cart, CartServiceError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let mut cart = CartRepository::lock_by_user(&mut tx, user_id)
            .await?
            .ok_or(CartServiceError::CartNotFound)?;
        cart.clear();
        CartRepository::save(&mut tx, &mut cart).await?;

        tx.commit().await.map_err(RepositoryError::from)?;
        Ok(cart)
    }
}
