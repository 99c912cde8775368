//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! # Products (list/get public; mutations admin-only)
//! GET    /api/products                - Filtered, paginated listing (cached)
//! GET    /api/products/{id}           - Product detail (cached)
//! GET    /api/products/categories     - Distinct categories (cached)
//! GET    /api/products/stats          - Aggregate stats (admin, cached)
//! GET    /api/products/count          - Total product count (admin)
//! GET    /api/products/cache/stats    - Cache counters (admin)
//! DELETE /api/products/cache/clear    - Coarse cache invalidation (admin)
//! POST   /api/products                - Create (admin)
//! PUT    /api/products/{id}           - Partial update (admin)
//! DELETE /api/products/{id}           - Soft delete (admin)
//! DELETE /api/products/{id}/hard      - Hard delete (admin)
//!
//! # Cart
//! GET    /api/cart                    - Current cart (identity or guest cookie)
//! GET    /api/cart/user/{userId}      - A user's cart (self or admin)
//! POST   /api/cart/add                - Add item (auth)
//! PUT    /api/cart/update             - Set line quantity (auth)
//! DELETE /api/cart/item/{productId}   - Remove line (auth)
//! DELETE /api/cart/clear              - Empty the cart (auth)
//!
//! # Orders
//! POST   /api/orders                  - Create from current cart (auth)
//! GET    /api/orders                  - All orders (admin)
//! GET    /api/orders/myorders         - Caller's orders (auth)
//! GET    /api/orders/count            - Total order count (admin)
//! GET    /api/orders/{id}             - One order (owner or admin)
//! PUT    /api/orders/{id}/status      - Status transition (admin)
//! DELETE /api/orders/{id}             - Delete (admin)
//!
//! # Contact
//! POST   /api/contact                 - Submit (public)
//! GET    /api/contact                 - List (admin)
//! GET    /api/contact/{id}            - Detail, advances new->read (admin)
//! PUT    /api/contact/{id}            - Update / respond (admin)
//! DELETE /api/contact/{id}            - Delete (admin)
//!
//! # Users
//! POST   /api/users/register          - Register, returns token
//! POST   /api/users/login             - Login, returns token
//! GET    /api/users/me                - Caller's profile (auth)
//! GET    /api/users                   - List users (admin)
//! GET    /api/users/count             - Total user count (admin)
//! GET    /api/users/{id}              - Profile (self or admin)
//! PUT    /api/users/{id}              - Update profile (self or admin)
//! DELETE /api/users/{id}              - Delete account (self or admin)
//! ```

pub mod cart;
pub mod contact;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use serde::Serialize;

use crate::state::AppState;

/// Generic `{"message": ...}` response body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    /// Build a message response.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Generic `{"count": ...}` response body.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

/// Assemble the full `/api` router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/contact", contact_routes())
        .nest("/api/users", user_routes())
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route("/categories", get(products::categories))
        .route("/stats", get(products::stats))
        .route("/count", get(products::count))
        .route("/cache/stats", get(products::cache_stats))
        .route("/cache/clear", delete(products::cache_clear))
        .route(
            "/{id}",
            get(products::get_by_id)
                .put(products::update)
                .delete(products::soft_delete),
        )
        .route("/{id}/hard", delete(products::hard_delete))
}

fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::get_current))
        .route("/user/{user_id}", get(cart::get_by_user))
        .route("/add", post(cart::add))
        .route("/update", put(cart::update))
        .route("/item/{product_id}", delete(cart::remove))
        .route("/clear", delete(cart::clear))
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create).get(orders::list_all))
        .route("/myorders", get(orders::my_orders))
        .route("/count", get(orders::count))
        .route(
            "/{id}",
            get(orders::get_by_id).delete(orders::delete),
        )
        .route("/{id}/status", put(orders::update_status))
}

fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(contact::submit).get(contact::list))
        .route(
            "/{id}",
            get(contact::get_by_id)
                .put(contact::update)
                .delete(contact::delete),
        )
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/me", get(users::me))
        .route("/", get(users::list))
        .route("/count", get(users::count))
        .route(
            "/{id}",
            get(users::get_by_id)
                .put(users::update)
                .delete(users::delete),
        )
}
