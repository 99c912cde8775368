//! Domain models for the API crate.
//!
//! The cart model lives in `cedarmarket-core` because its merge logic is
//! shared, pure domain code; the models here are storage-backed entities
//! owned by this server.

pub mod contact;
pub mod order;
pub mod product;
pub mod user;

pub use contact::{Contact, ContactPage};
pub use order::{Address, Order, OrderItem};
pub use product::{
    CategoryStat, NewProduct, Product, ProductPage, ProductPatch, ProductQuery, ProductSort,
    ProductStats,
};
pub use user::User;
