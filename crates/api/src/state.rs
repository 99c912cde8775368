//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::CatalogCache;
use crate::config::ApiConfig;
use crate::services::{EmailService, JwtKeys};

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("smtp configuration error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources: the database pool, the catalog response cache, the
/// token keys, and the optional outbound mailer. The cache instance is
/// owned here: one per process, created at startup, no globals.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    catalog_cache: CatalogCache,
    jwt: JwtKeys,
    email: Option<EmailService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay cannot be configured.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        let jwt = JwtKeys::from_secret(&config.jwt_secret);
        let email = config.email.as_ref().map(EmailService::new).transpose()?;

        if email.is_none() {
            tracing::warn!("EMAIL_HOST not set; outbound email disabled");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog_cache: CatalogCache::new(),
                jwt,
                email,
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the catalog response cache.
    #[must_use]
    pub fn catalog_cache(&self) -> &CatalogCache {
        &self.inner.catalog_cache
    }

    /// Get a reference to the token keys.
    #[must_use]
    pub fn jwt(&self) -> &JwtKeys {
        &self.inner.jwt
    }

    /// Get a reference to the outbound mailer, if configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }
}
