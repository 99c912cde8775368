//! Shopping cart model and reconciliation algorithms.
//!
//! A cart belongs to exactly one owner: an authenticated user or an
//! anonymous guest addressed by a cookie-held [`GuestId`]. The owner is a
//! tagged variant rather than a pair of nullable fields, so the
//! user-XOR-guest invariant is enforced by the type system.
//!
//! All mutation here is pure: persistence, locking and the transactional
//! merge-then-delete protocol live in the API crate's repositories. Every
//! mutator recomputes `total_price` from the line items, so a stored total
//! is never trusted from caller input.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CartId, GuestId, ProductId, UserId};

/// Errors produced by cart mutations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CartError {
    /// The cart holds no line item for the given product.
    #[error("item not found in cart: {0}")]
    LineNotFound(ProductId),
}

/// Who a cart belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartOwner {
    /// An authenticated user's cart. Persists until an order consumes it.
    User(UserId),
    /// An anonymous cart, addressed by the `guestCartId` cookie. Deleted on
    /// merge or 30 days after last write, whichever comes first.
    Guest(GuestId),
}

impl CartOwner {
    /// The user id, if this cart belongs to an authenticated user.
    #[must_use]
    pub const fn user_id(self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(id),
            Self::Guest(_) => None,
        }
    }

    /// The guest id, if this cart is anonymous.
    #[must_use]
    pub const fn guest_id(self) -> Option<GuestId> {
        match self {
            Self::User(_) => None,
            Self::Guest(id) => Some(id),
        }
    }
}

/// The product fields a cart line denormalizes at add-time.
///
/// Carts keep the price/name/image the shopper saw when adding, so later
/// catalog edits don't silently reprice a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
}

/// One line of a cart: a product reference plus its add-time snapshot.
///
/// A cart holds at most one line per distinct product id; adding the same
/// product again increments the quantity instead of appending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub quantity: u32,
}

impl CartLineItem {
    /// Price times quantity for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A shopping cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    pub id: CartId,
    pub owner: CartOwner,
    pub items: Vec<CartLineItem>,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Create an empty cart for an authenticated user.
    #[must_use]
    pub fn new_for_user(user_id: UserId) -> Self {
        Self::empty(CartOwner::User(user_id))
    }

    /// Create an empty cart for a guest.
    #[must_use]
    pub fn new_for_guest(guest_id: GuestId) -> Self {
        Self::empty(CartOwner::Guest(guest_id))
    }

    fn empty(owner: CartOwner) -> Self {
        let now = Utc::now();
        Self {
            id: CartId::mint(),
            owner,
            items: Vec::new(),
            total_price: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the cart holds no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The line item for `product_id`, if present.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Add `quantity` of a product to the cart.
    ///
    /// If the product is already a line item its quantity is incremented;
    /// otherwise a new line is appended carrying the snapshot. A zero
    /// quantity is treated as one, matching the add-to-cart default.
    pub fn add_item(&mut self, snapshot: ProductSnapshot, quantity: u32) {
        let quantity = quantity.max(1);

        match self
            .items
            .iter_mut()
            .find(|item| item.product_id == snapshot.product_id)
        {
            Some(line) => line.quantity += quantity,
            None => self.items.push(CartLineItem {
                product_id: snapshot.product_id,
                name: snapshot.name,
                price: snapshot.price,
                image: snapshot.image,
                quantity,
            }),
        }

        self.recompute_total();
    }

    /// Set the quantity of an existing line item directly (replace, not
    /// increment). A quantity of zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if the cart has no line for
    /// `product_id`.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: i64) -> Result<(), CartError> {
        let index = self
            .items
            .iter()
            .position(|item| item.product_id == product_id)
            .ok_or(CartError::LineNotFound(product_id))?;

        if quantity <= 0 {
            self.items.remove(index);
        } else if let Some(line) = self.items.get_mut(index) {
            line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }

        self.recompute_total();
        Ok(())
    }

    /// Remove a product's line item. Removing an absent product is a no-op.
    pub fn remove_item(&mut self, product_id: ProductId) {
        self.items.retain(|item| item.product_id != product_id);
        self.recompute_total();
    }

    /// Remove every line item.
    pub fn clear(&mut self) {
        self.items.clear();
        self.recompute_total();
    }

    /// Merge another cart's line items into this one.
    ///
    /// Quantities are added together where a product id collides; other
    /// lines are appended verbatim, carrying their add-time snapshot. The
    /// caller must delete the source cart in the same transaction; the
    /// source row's continued existence is what would make a retried merge
    /// double-count.
    pub fn merge_from(&mut self, other_items: Vec<CartLineItem>) {
        for incoming in other_items {
            match self
                .items
                .iter_mut()
                .find(|item| item.product_id == incoming.product_id)
            {
                Some(line) => line.quantity += incoming.quantity,
                None => self.items.push(incoming),
            }
        }

        self.recompute_total();
    }

    /// Reassign a guest cart wholesale to a user.
    ///
    /// The O(1) half of the merge contract: when the user has no cart yet,
    /// the guest cart simply changes owner. The owner variant swap clears
    /// the guest id by construction.
    pub fn assign_to_user(&mut self, user_id: UserId) {
        self.owner = CartOwner::User(user_id);
    }

    /// Recompute `total_price` as the sum of line totals.
    ///
    /// Called by every mutator; repositories call it once more immediately
    /// before persisting.
    pub fn recompute_total(&mut self) {
        self.total_price = self.items.iter().map(CartLineItem::line_total).sum();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn snapshot(product_id: ProductId, name: &str, price: i64) -> ProductSnapshot {
        ProductSnapshot {
            product_id,
            name: name.to_owned(),
            price: Decimal::new(price, 2),
            image: Some(format!("/uploads/{name}.jpg")),
        }
    }

    #[test]
    fn test_add_item_accumulates_per_product() {
        let product = ProductId::mint();
        let mut cart = Cart::new_for_user(UserId::mint());

        cart.add_item(snapshot(product, "soap", 450), 1);
        cart.add_item(snapshot(product, "soap", 450), 2);
        cart.add_item(snapshot(product, "soap", 450), 4);

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.line(product).unwrap().quantity, 7);
        assert_eq!(cart.total_price, Decimal::new(450 * 7, 2));
    }

    #[test]
    fn test_add_item_zero_quantity_means_one() {
        let product = ProductId::mint();
        let mut cart = Cart::new_for_user(UserId::mint());

        cart.add_item(snapshot(product, "soap", 450), 0);

        assert_eq!(cart.line(product).unwrap().quantity, 1);
    }

    #[test]
    fn test_add_item_snapshots_first_seen_price() {
        let product = ProductId::mint();
        let mut cart = Cart::new_for_user(UserId::mint());

        cart.add_item(snapshot(product, "soap", 450), 1);
        // A later add after a catalog price change keeps the line's snapshot.
        cart.add_item(snapshot(product, "soap", 999), 1);

        assert_eq!(cart.line(product).unwrap().price, Decimal::new(450, 2));
        assert_eq!(cart.total_price, Decimal::new(900, 2));
    }

    #[test]
    fn test_set_quantity_replaces() {
        let product = ProductId::mint();
        let mut cart = Cart::new_for_user(UserId::mint());
        cart.add_item(snapshot(product, "soap", 450), 5);

        cart.set_quantity(product, 2).unwrap();

        assert_eq!(cart.line(product).unwrap().quantity, 2);
        assert_eq!(cart.total_price, Decimal::new(900, 2));
    }

    #[test]
    fn test_set_quantity_zero_or_negative_removes() {
        let product = ProductId::mint();

        let mut cart = Cart::new_for_user(UserId::mint());
        cart.add_item(snapshot(product, "soap", 450), 5);
        cart.set_quantity(product, 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price, Decimal::ZERO);

        let mut cart = Cart::new_for_user(UserId::mint());
        cart.add_item(snapshot(product, "soap", 450), 5);
        cart.set_quantity(product, -1).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_missing_line_is_not_found() {
        let mut cart = Cart::new_for_user(UserId::mint());
        let absent = ProductId::mint();

        assert!(matches!(
            cart.set_quantity(absent, 3),
            Err(CartError::LineNotFound(id)) if id == absent
        ));
    }

    #[test]
    fn test_remove_item_is_silent_for_absent_product() {
        let product = ProductId::mint();
        let mut cart = Cart::new_for_user(UserId::mint());
        cart.add_item(snapshot(product, "soap", 450), 1);

        cart.remove_item(ProductId::mint());
        assert_eq!(cart.items.len(), 1);

        cart.remove_item(product);
        assert!(cart.is_empty());
        assert_eq!(cart.total_price, Decimal::ZERO);
    }

    #[test]
    fn test_clear_empties_and_zeroes_total() {
        let mut cart = Cart::new_for_user(UserId::mint());
        cart.add_item(snapshot(ProductId::mint(), "soap", 450), 2);
        cart.add_item(snapshot(ProductId::mint(), "candle", 1200), 1);

        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.total_price, Decimal::ZERO);
    }

    #[test]
    fn test_merge_adds_colliding_quantities_and_appends_rest() {
        let product_a = ProductId::mint();
        let product_b = ProductId::mint();

        let mut guest = Cart::new_for_guest(GuestId::mint());
        guest.add_item(snapshot(product_a, "soap", 450), 2);

        let mut user = Cart::new_for_user(UserId::mint());
        user.add_item(snapshot(product_a, "soap", 450), 1);
        user.add_item(snapshot(product_b, "candle", 1200), 1);

        user.merge_from(guest.items);

        assert_eq!(user.items.len(), 2);
        assert_eq!(user.line(product_a).unwrap().quantity, 3);
        assert_eq!(user.line(product_b).unwrap().quantity, 1);
        assert_eq!(
            user.total_price,
            Decimal::new(450 * 3, 2) + Decimal::new(1200, 2)
        );
    }

    #[test]
    fn test_merge_carries_guest_snapshot_verbatim() {
        let product = ProductId::mint();

        let mut guest = Cart::new_for_guest(GuestId::mint());
        guest.add_item(snapshot(product, "soap", 450), 5);

        let mut user = Cart::new_for_user(UserId::mint());
        user.merge_from(guest.items.clone());

        assert_eq!(user.items, guest.items);
        assert_eq!(user.total_price, Decimal::new(450 * 5, 2));
    }

    #[test]
    fn test_merge_twice_double_counts() {
        // The reason the repository must delete the guest cart in the same
        // transaction: replaying the merge is not idempotent.
        let product = ProductId::mint();

        let mut guest = Cart::new_for_guest(GuestId::mint());
        guest.add_item(snapshot(product, "soap", 450), 2);

        let mut user = Cart::new_for_user(UserId::mint());
        user.merge_from(guest.items.clone());
        user.merge_from(guest.items);

        assert_eq!(user.line(product).unwrap().quantity, 4);
    }

    #[test]
    fn test_assign_to_user_clears_guest_identity() {
        let guest_id = GuestId::mint();
        let user_id = UserId::mint();
        let product = ProductId::mint();

        let mut cart = Cart::new_for_guest(guest_id);
        cart.add_item(snapshot(product, "soap", 450), 5);
        let cart_id = cart.id;

        cart.assign_to_user(user_id);

        assert_eq!(cart.id, cart_id);
        assert_eq!(cart.owner, CartOwner::User(user_id));
        assert_eq!(cart.owner.guest_id(), None);
        assert_eq!(cart.line(product).unwrap().quantity, 5);
    }

    #[test]
    fn test_line_item_jsonb_round_trip() {
        let line = CartLineItem {
            product_id: ProductId::mint(),
            name: "cedar soap".to_owned(),
            price: Decimal::new(450, 2),
            image: None,
            quantity: 3,
        };

        let json = serde_json::to_value(&line).unwrap();
        assert!(json.get("image").is_none());

        let back: CartLineItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, line);
    }
}
