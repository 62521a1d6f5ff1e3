//! Google OAuth 2.0 client.
//!
//! # Flow
//!
//! 1. `authorization_url()` builds the Google consent URL with a signed `state`
//! 2. Google redirects back to the callback with `code` and `state`
//! 3. `verify_state()` checks the HMAC and age of `state`
//! 4. `exchange_code()` trades the code for an access token
//! 5. `fetch_userinfo()` returns the account's email and name
//!
//! The `state` parameter is self-verifying (`nonce.timestamp.signature`), so
//! no server-side session is needed between steps 1 and 3.

use std::sync::Arc;

use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use crate::config::GoogleOAuthConfig;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// How long a signed `state` stays valid.
const STATE_MAX_AGE_SECS: i64 = 600;

/// Errors from the Google login flow.
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("invalid oauth state: {0}")]
    InvalidState(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider error: {0}")]
    Provider(String),
}

/// The subset of Google's userinfo response the storefront uses.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client for Google's OAuth endpoints.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    inner: Arc<GoogleOAuthClientInner>,
}

struct GoogleOAuthClientInner {
    client: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
    state_key: SecretString,
}

impl GoogleOAuthClient {
    /// Create a client. `state_key` signs the `state` parameter.
    #[must_use]
    pub fn new(config: &GoogleOAuthConfig, state_key: SecretString) -> Self {
        Self {
            inner: Arc::new(GoogleOAuthClientInner {
                client: reqwest::Client::new(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                redirect_uri: config.redirect_uri.clone(),
                state_key,
            }),
        }
    }

    /// Build the consent URL with a freshly signed `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if the state key cannot initialize the signer.
    pub fn authorization_url(&self) -> Result<String, OAuthError> {
        let state = self.sign_state(Utc::now().timestamp())?;
        Ok(format!(
            "{AUTHORIZE_URL}?\
            client_id={}&\
            response_type=code&\
            redirect_uri={}&\
            scope=openid%20email%20profile&\
            state={}",
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(&self.inner.redirect_uri),
            urlencoding::encode(&state),
        ))
    }

    fn sign_state(&self, issued_at: i64) -> Result<String, OAuthError> {
        let mut nonce = [0u8; 16];
        rand::rng().fill_bytes(&mut nonce);
        let payload = format!("{}.{issued_at}", hex::encode(nonce));
        let signature = hex::encode(self.state_mac(&payload)?.finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }

    fn state_mac(&self, payload: &str) -> Result<Hmac<Sha256>, OAuthError> {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(self.inner.state_key.expose_secret().as_bytes())
                .map_err(|e| OAuthError::InvalidState(e.to_string()))?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }

    /// Check that `state` was signed by this server within the last ten minutes.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::InvalidState` on a malformed, forged or stale state.
    pub fn verify_state(&self, state: &str) -> Result<(), OAuthError> {
        let (payload, signature) = state
            .rsplit_once('.')
            .ok_or_else(|| OAuthError::InvalidState("malformed".to_owned()))?;
        let (_, issued_at) = payload
            .split_once('.')
            .ok_or_else(|| OAuthError::InvalidState("malformed".to_owned()))?;

        let signature = hex::decode(signature)
            .map_err(|_| OAuthError::InvalidState("signature is not hex".to_owned()))?;
        self.state_mac(payload)?
            .verify_slice(&signature)
            .map_err(|_| OAuthError::InvalidState("signature mismatch".to_owned()))?;

        let issued_at: i64 = issued_at
            .parse()
            .map_err(|_| OAuthError::InvalidState("bad timestamp".to_owned()))?;
        let age = Utc::now().timestamp() - issued_at;
        if !(0..=STATE_MAX_AGE_SECS).contains(&age) {
            return Err(OAuthError::InvalidState("expired".to_owned()));
        }

        Ok(())
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Google rejects the code.
    pub async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.inner.client_id.as_str()),
            ("client_secret", self.inner.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", self.inner.redirect_uri.as_str()),
        ];

        let response = self.inner.client.post(TOKEN_URL).form(&params).send().await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OAuthError::Provider(format!("token exchange failed: {text}")));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Fetch the signed-in account's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the email is unverified.
    pub async fn fetch_userinfo(&self, access_token: &str) -> Result<GoogleUserInfo, OAuthError> {
        let response = self
            .inner
            .client
            .get(USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OAuthError::Provider(format!("userinfo failed: {text}")));
        }

        let info: GoogleUserInfo = response.json().await?;
        if info.email_verified == Some(false) {
            return Err(OAuthError::Provider("email is not verified".to_owned()));
        }
        Ok(info)
    }
}
