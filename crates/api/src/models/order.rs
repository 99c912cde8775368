//! Order model.
//!
//! An order is created from a cart and carries its own denormalized item
//! snapshots; the source cart is deleted in the same transaction (the order
//! consumes the cart).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cedarmarket_core::{Cart, CartLineItem, OrderId, OrderStatus, PaymentMethod, ProductId, UserId};

/// Shipping address captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

/// One ordered line, snapshotted from the cart at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<CartLineItem> for OrderItem {
    fn from(line: CartLineItem) -> Self {
        Self {
            product_id: line.product_id,
            name: line.name,
            price: line.price,
            quantity: line.quantity,
            image: line.image,
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub items: Vec<OrderItem>,
    pub address: Address,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a new pending order from a cart's contents.
    ///
    /// Shipping is currently always free; the subtotal is recomputed from
    /// the line snapshots rather than read off the cart row.
    #[must_use]
    pub fn from_cart(
        user_id: Option<UserId>,
        cart: Cart,
        address: Address,
        payment_method: PaymentMethod,
    ) -> Self {
        let items: Vec<OrderItem> = cart.items.into_iter().map(OrderItem::from).collect();
        let subtotal: Decimal = items
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum();
        let shipping = Decimal::ZERO;
        let now = Utc::now();

        Self {
            id: OrderId::mint(),
            user_id,
            items,
            address,
            subtotal,
            shipping,
            total: subtotal + shipping,
            status: OrderStatus::Pending,
            payment_method,
            is_paid: false,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move the order to a new status, settling payment when the transition
    /// calls for it: `processing` marks non-cash orders paid, `delivered`
    /// marks cash orders paid.
    pub fn transition_to(&mut self, status: OrderStatus) {
        if status.settles_payment(self.payment_method, self.is_paid) {
            self.is_paid = true;
            self.paid_at = Some(Utc::now());
        }
        self.status = status;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cedarmarket_core::ProductSnapshot;

    fn address() -> Address {
        Address {
            first_name: "Nour".to_owned(),
            last_name: "Khalil".to_owned(),
            country: "Lebanon".to_owned(),
            address: "12 Cedar St".to_owned(),
            city: "Beirut".to_owned(),
            phone: "+961 1 234 567".to_owned(),
            email: "nour@example.com".to_owned(),
            special_instructions: None,
        }
    }

    fn cart_with_items() -> Cart {
        let mut cart = Cart::new_for_user(UserId::mint());
        cart.add_item(
            ProductSnapshot {
                product_id: ProductId::mint(),
                name: "cedar soap".to_owned(),
                price: Decimal::new(450, 2),
                image: None,
            },
            2,
        );
        cart.add_item(
            ProductSnapshot {
                product_id: ProductId::mint(),
                name: "olive candle".to_owned(),
                price: Decimal::new(1200, 2),
                image: Some("/uploads/candle.jpg".to_owned()),
            },
            1,
        );
        cart
    }

    #[test]
    fn test_from_cart_totals() {
        let order = Order::from_cart(None, cart_with_items(), address(), PaymentMethod::Cash);

        assert_eq!(order.items.len(), 2);
        assert_eq!(order.subtotal, Decimal::new(450 * 2 + 1200, 2));
        assert_eq!(order.shipping, Decimal::ZERO);
        assert_eq!(order.total, order.subtotal);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(!order.is_paid);
    }

    #[test]
    fn test_transition_processing_settles_card() {
        let mut order = Order::from_cart(None, cart_with_items(), address(), PaymentMethod::Card);
        order.transition_to(OrderStatus::Processing);

        assert_eq!(order.status, OrderStatus::Processing);
        assert!(order.is_paid);
        assert!(order.paid_at.is_some());
    }

    #[test]
    fn test_transition_processing_leaves_cash_unpaid() {
        let mut order = Order::from_cart(None, cart_with_items(), address(), PaymentMethod::Cash);
        order.transition_to(OrderStatus::Processing);

        assert!(!order.is_paid);
        assert!(order.paid_at.is_none());

        order.transition_to(OrderStatus::Delivered);
        assert!(order.is_paid);
    }

    #[test]
    fn test_transition_never_resets_paid_at() {
        let mut order = Order::from_cart(None, cart_with_items(), address(), PaymentMethod::Card);
        order.transition_to(OrderStatus::Processing);
        let paid_at = order.paid_at.unwrap();

        order.transition_to(OrderStatus::Delivered);
        assert_eq!(order.paid_at.unwrap(), paid_at);
    }

    #[test]
    fn test_order_item_json_round_trip() {
        let order = Order::from_cart(None, cart_with_items(), address(), PaymentMethod::Paypal);

        let json = serde_json::to_value(&order.items).unwrap();
        let back: Vec<OrderItem> = serde_json::from_value(json).unwrap();
        assert_eq!(back, order.items);
    }
}
