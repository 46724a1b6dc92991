//! Login session that supplies the bearer token to the products client.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::models::user::{LoginRequest, LoginResponse, User};
use crate::services::products_api::{TokenSource, read_json};

/// Tokens this close to expiry are treated as already expired
pub const EXPIRY_MARGIN_SECS: i64 = 300;

#[derive(Debug, Clone)]
struct Session {
    user: User,
    access_token: String,
}

pub struct AuthSession {
    client: Client,
    base_url: String,
    session: RwLock<Option<Session>>,
}

impl AuthSession {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: RwLock::new(None),
        }
    }

    /// Exchange credentials for an access token.
    ///
    /// A reply missing either the user or the token counts as a failed login.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let url = format!("{}/users/login/", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let reply: LoginResponse = read_json(response).await?;
        let (Some(user), Some(access_token)) = (reply.user, reply.access) else {
            warn!(username, "Login reply missing user or access token");
            return Err(ApiError::Unauthenticated);
        };

        info!(username = %user.username, "Logged in");
        *self.session.write() = Some(Session {
            user: user.clone(),
            access_token,
        });
        Ok(user)
    }

    /// Adopt a previously stored session if its token is still usable.
    pub fn restore(&self, user: User, access_token: String) -> bool {
        if is_token_expiring(&access_token, Utc::now()) {
            self.logout();
            return false;
        }
        *self.session.write() = Some(Session { user, access_token });
        true
    }

    pub fn logout(&self) {
        if self.session.write().take().is_some() {
            info!("Logged out");
        }
    }

    pub fn user(&self) -> Option<User> {
        self.session.read().as_ref().map(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.read().is_some()
    }
}

impl TokenSource for AuthSession {
    fn token(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.access_token.clone())
    }
}

#[derive(Deserialize)]
struct Claims {
    exp: i64,
}

/// True if the JWT expires within [`EXPIRY_MARGIN_SECS`] of `now`.
///
/// The signature is not checked; the backend does that. Tokens that cannot
/// be decoded are reported as expiring.
pub fn is_token_expiring(token: &str, now: DateTime<Utc>) -> bool {
    match token_expiry(token) {
        Some(exp) => exp < now.timestamp() + EXPIRY_MARGIN_SECS,
        None => true,
    }
}

fn token_expiry(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    Some(claims.exp)
}
