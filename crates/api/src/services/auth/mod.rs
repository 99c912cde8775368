//! Authentication service.
//!
//! Password hashing (Argon2id) and Bearer-token issuance are external
//! collaborators as far as the domain is concerned; this module keeps them
//! behind a thin, typed seam.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use cedarmarket_core::{Email, UserId};

use crate::db::{RepositoryError, users::UserRepository};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// How long issued tokens stay valid.
const TOKEN_LIFETIME_DAYS: i64 = 30;

/// Claims carried by an issued Bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: Uuid,
    /// Whether the user held the admin role at issue time.
    pub admin: bool,
    /// Expiry, as Unix epoch seconds.
    pub exp: i64,
    /// Issued-at, as Unix epoch seconds.
    pub iat: i64,
}

/// Pre-derived JWT keys, built once at startup from the configured secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    /// Derive signing and verification keys from the shared secret.
    #[must_use]
    pub fn from_secret(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// Issue a token for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if signing fails.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user.id.as_uuid(),
            admin: user.is_admin,
            exp: (now + chrono::Duration::days(TOKEN_LIFETIME_DAYS)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for malformed, mis-signed, or
    /// expired tokens.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}

impl Claims {
    /// The authenticated user id.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::new(self.sub)
    }
}

/// Authentication service.
///
/// Handles user registration and login.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    keys: &'a JwtKeys,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, keys: &'a JwtKeys) -> Self {
        Self {
            users: UserRepository::new(pool),
            keys,
        }
    }

    /// Register a new user and issue their first token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(name, &email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let token = self.keys.issue(&user)?;
        Ok((user, token))
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let token = self.keys.issue(&user)?;
        Ok((user, token))
    }

    /// Hash a new password for a profile update.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the password doesn't meet
    /// requirements.
    pub fn hash_new_password(&self, password: &str) -> Result<String, AuthError> {
        validate_password(password)?;
        hash_password(password)
    }
}

/// Validate password strength requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user(is_admin: bool) -> User {
        User {
            id: UserId::mint(),
            name: "Test Shopper".to_owned(),
            email: Email::parse("shopper@example.com").unwrap(),
            is_admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_keys() -> JwtKeys {
        JwtKeys::from_secret(&SecretString::from("a-test-secret-of-reasonable-length"))
    }

    #[test]
    fn test_token_round_trip() {
        let keys = test_keys();
        let user = test_user(true);

        let token = keys.issue(&user).unwrap();
        let claims = keys.verify(&token).unwrap();

        assert_eq!(claims.user_id(), user.id);
        assert!(claims.admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let user = test_user(false);
        let token = test_keys().issue(&user).unwrap();

        let other = JwtKeys::from_secret(&SecretString::from("a-different-secret-entirely!"));
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(matches!(
            test_keys().verify("not.a.token"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_short_password_is_weak() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough password").is_ok());
    }
}
