//! Application state shared across handlers.

use std::sync::Arc;

use lettre::transport::smtp::Error as SmtpError;

use crate::config::StorefrontConfig;
use crate::db::{PgStore, Store};
use crate::services::auth::TokenService;
use crate::services::email::{EmailService, Notifier};
use crate::services::oauth::GoogleOAuthClient;

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("smtp configuration error: {0}")]
    Smtp(#[from] SmtpError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the store and configuration. It is generic over
/// the store so tests can run the real router against [`crate::db::MemoryStore`].
pub struct AppState<S = PgStore> {
    inner: Arc<AppStateInner<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct AppStateInner<S> {
    config: StorefrontConfig,
    store: S,
    tokens: TokenService,
    google: Option<GoogleOAuthClient>,
    notifier: Notifier,
}

impl<S: Store> AppState<S> {
    /// Create a new application state.
    ///
    /// Google login and email notifications are enabled when their
    /// configuration is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay cannot be configured.
    pub fn new(config: StorefrontConfig, store: S) -> Result<Self, StateError> {
        let notifier = match &config.smtp {
            Some(smtp) => Notifier::new(Some(EmailService::new(smtp, &config.frontend_url)?)),
            None => Notifier::disabled(),
        };
        Ok(Self::with_notifier(config, store, notifier))
    }

    /// Create a state with an explicit notifier.
    #[must_use]
    pub fn with_notifier(config: StorefrontConfig, store: S, notifier: Notifier) -> Self {
        let tokens = TokenService::new(&config.token.secret, config.token.ttl_minutes);
        let google = config
            .google
            .as_ref()
            .map(|google| GoogleOAuthClient::new(google, config.token.secret.clone()));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                tokens,
                google,
                notifier,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Get a reference to the token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get the Google OAuth client, if configured.
    #[must_use]
    pub fn google(&self) -> Option<&GoogleOAuthClient> {
        self.inner.google.as_ref()
    }

    /// Get a reference to the notification dispatcher.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }
}
