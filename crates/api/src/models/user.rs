//! User account model.
//!
//! The password hash never leaves the repository layer; see
//! `db::users::UserRepository::get_password_hash`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cedarmarket_core::{Email, UserId};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
