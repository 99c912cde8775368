//! Cart route handlers.
//!
//! The current cart is addressed by the authenticated identity when there
//! is one, and by the `guestCartId` cookie otherwise. An authenticated
//! request that still carries the guest cookie triggers the one-time merge
//! inside `CartService::resolve`.
//!
//! Guests can read their (possibly empty) cart, but all mutations require
//! authentication: guest carts exist for the later merge, not for guest
//! checkout.

use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use cedarmarket_core::{Cart, CartId, CartLineItem, GuestId, ProductId, UserId};

use crate::db::CartRepository;
use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, RequireAuth};
use crate::services::{CartIdentity, CartService};
use crate::state::AppState;

/// Name of the guest cart cookie.
pub const GUEST_CART_COOKIE: &str = "guestCartId";

/// Guest cart cookie lifetime, matching the storage-side expiry.
const GUEST_CART_COOKIE_DAYS: i64 = 30;

/// Cart response body. An identity with no cart yet serializes as an
/// empty cart rather than an error.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<CartId>,
    pub items: Vec<CartLineItem>,
    pub total_price: Decimal,
}

impl CartResponse {
    /// The empty cart body: `{"items": [], "totalPrice": 0}`.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            id: None,
            items: Vec::new(),
            total_price: Decimal::ZERO,
        }
    }
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        Self {
            id: Some(cart.id),
            items: cart.items,
            total_price: cart.total_price,
        }
    }
}

impl From<Option<Cart>> for CartResponse {
    fn from(cart: Option<Cart>) -> Self {
        cart.map_or_else(Self::empty, Self::from)
    }
}

/// Add-to-cart payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Update-quantity payload. Zero or negative removes the line.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Clear-cart response, echoing the now-empty cart.
#[derive(Debug, Serialize)]
pub struct ClearCartResponse {
    pub message: String,
    pub cart: CartResponse,
}

/// Build the `guestCartId` cookie.
fn guest_cookie(guest_id: GuestId) -> Cookie<'static> {
    Cookie::build((GUEST_CART_COOKIE, guest_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::days(GUEST_CART_COOKIE_DAYS))
        .build()
}

/// Read the guest id off the cookie jar, ignoring malformed values.
fn guest_from_jar(jar: &CookieJar) -> Option<GuestId> {
    jar.get(GUEST_CART_COOKIE)
        .and_then(|cookie| cookie.value().parse().ok())
}

/// Current cart for the caller's identity or guest cookie.
///
/// Anonymous callers without a cookie are minted one; the response is then
/// the empty cart (guest cart rows are only created on first write).
#[instrument(skip(state, jar))]
pub async fn get_current(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<CartResponse>)> {
    let service = CartService::new(state.pool());

    match user {
        Some(auth) => {
            let cart = service
                .resolve(CartIdentity::User {
                    id: auth.id,
                    guest: guest_from_jar(&jar),
                })
                .await?;

            Ok((jar, Json(cart.into())))
        }
        None => match guest_from_jar(&jar) {
            Some(guest_id) => {
                let cart = service.resolve(CartIdentity::Guest(guest_id)).await?;
                // Refresh the 30-day expiry on every read.
                Ok((jar.add(guest_cookie(guest_id)), Json(cart.into())))
            }
            None => {
                let guest_id = GuestId::mint();
                Ok((jar.add(guest_cookie(guest_id)), Json(CartResponse::empty())))
            }
        },
    }
}

/// A specific user's cart; accessible to that user and to admins.
#[instrument(skip(state))]
pub async fn get_by_user(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<CartResponse>> {
    if auth.id != user_id && !auth.is_admin {
        return Err(AppError::Forbidden(
            "Not authorized to access this cart".to_owned(),
        ));
    }

    let cart = CartRepository::new(state.pool()).get_by_user(user_id).await?;
    Ok(Json(cart.into()))
}

/// Add a product to the caller's cart.
#[instrument(skip(state))]
pub async fn add(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<CartResponse>> {
    let cart = CartService::new(state.pool())
        .add_item(auth.id, body.product_id, body.quantity.unwrap_or(1))
        .await?;

    Ok(Json(cart.into()))
}

/// Set a line's quantity directly; zero or less removes it.
#[instrument(skip(state))]
pub async fn update(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<CartResponse>> {
    let cart = CartService::new(state.pool())
        .set_quantity(auth.id, body.product_id, body.quantity)
        .await?;

    Ok(Json(cart.into()))
}

/// Remove one product's line from the caller's cart.
#[instrument(skip(state))]
pub async fn remove(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartResponse>> {
    let cart = CartService::new(state.pool())
        .remove_item(auth.id, product_id)
        .await?;

    Ok(Json(cart.into()))
}

/// Empty the caller's cart.
#[instrument(skip(state))]
pub async fn clear(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<ClearCartResponse>> {
    let cart = CartService::new(state.pool()).clear(auth.id).await?;

    Ok(Json(ClearCartResponse {
        message: "Cart cleared successfully".to_owned(),
        cart: cart.into(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cedarmarket_core::ProductSnapshot;

    #[test]
    fn test_guest_cookie_attributes() {
        let cookie = guest_cookie(GuestId::mint());

        assert_eq!(cookie.name(), GUEST_CART_COOKIE);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(30)));
    }

    #[test]
    fn test_empty_response_has_no_id_and_zero_total() {
        let body = serde_json::to_value(CartResponse::empty()).unwrap();

        assert!(body.get("id").is_none());
        assert_eq!(body["items"], serde_json::json!([]));
        assert_eq!(body["totalPrice"], serde_json::json!("0"));
    }

    #[test]
    fn test_response_from_cart_keeps_lines() {
        let mut cart = Cart::new_for_user(UserId::mint());
        cart.add_item(
            ProductSnapshot {
                product_id: ProductId::mint(),
                name: "soap".to_owned(),
                price: Decimal::new(450, 2),
                image: None,
            },
            2,
        );

        let response = CartResponse::from(cart.clone());
        assert_eq!(response.id, Some(cart.id));
        assert_eq!(response.items, cart.items);
        assert_eq!(response.total_price, Decimal::new(900, 2));
    }
}
