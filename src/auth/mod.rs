//! Authentication: token lifecycle, session guard and wire types.

pub mod session;
pub mod token;
pub mod types;

pub use session::{Route, Session, SessionEvent, SessionListener};
pub use types::{LoginData, LoginRequest, LoginResponse, SignupRequest};

use std::sync::Arc;

use tracing::info;

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::storage::TokenStore;

/// Authentication service driving the token lifecycle and the session.
pub struct AuthService {
    api: Arc<ApiClient>,
    tokens: Arc<dyn TokenStore>,
    session: Arc<Session>,
}

impl AuthService {
    /// Create an auth service over the shared client, store and session.
    #[must_use]
    pub fn new(api: Arc<ApiClient>, tokens: Arc<dyn TokenStore>, session: Arc<Session>) -> Self {
        Self {
            api,
            tokens,
            session,
        }
    }

    /// One-time startup call: check the stored token locally and feed the
    /// result into the session. No server round-trip is involved.
    pub fn initialize(&self) {
        self.session.initialize(self.is_authenticated());
    }

    /// Whether the stored token exists and its expiry lies in the future.
    ///
    /// Missing or malformed tokens count as unauthenticated; decode
    /// failures are swallowed, never surfaced.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.tokens
            .get()
            .is_some_and(|token| token::is_token_valid(&token, now_ms))
    }

    /// Log in with the given credentials, store the returned token and
    /// mark the session signed in.
    ///
    /// # Errors
    /// Returns an error if the request fails or the backend rejects the
    /// credentials; the session is left untouched in that case.
    pub async fn login(&self, request: &LoginRequest) -> Result<(), ClientError> {
        let response: LoginResponse = self.api.post_json("login", request).await?;
        self.tokens.set(&response.data.token);
        self.session.sign_in();
        info!("Signed in as {}", request.email);
        Ok(())
    }

    /// Register a new account and return the server confirmation text.
    ///
    /// Signup does not authenticate; the caller still has to log in.
    ///
    /// # Errors
    /// Returns an error if the request fails or the backend rejects the
    /// registration (validation messages are joined into one string).
    pub async fn signup(&self, request: &SignupRequest) -> Result<String, ClientError> {
        let body: serde_json::Value = self.api.post_json("signup", request).await?;
        Ok(confirmation_text(&body))
    }

    /// Clear the stored token and mark the session signed out.
    pub fn logout(&self) {
        self.tokens.remove();
        self.session.sign_out();
        info!("Signed out");
    }
}

/// Reduce a server-defined confirmation payload to one displayable line.
///
/// A string body is used verbatim, an object body contributes its
/// `message` field, anything else falls back to the raw JSON.
fn confirmation_text(body: &serde_json::Value) -> String {
    match body {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Object(map) => map
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| body.to_string(), ToString::to_string),
        _ => body.to_string(),
    }
}
