//! HTTP client wrapper for the chatbot backend.
//!
//! All endpoint calls flow through [`ApiClient`]: it injects the stored
//! bearer token into every outgoing request and applies one global
//! policy to every response. A 401 clears the token and signs the
//! session out, regardless of which call triggered it.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::session::Session;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::storage::TokenStore;

/// HTTP client bound to one backend, one token store and one session.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenStore>,
    session: Arc<Session>,
}

impl ApiClient {
    /// Build a client from the given configuration.
    ///
    /// # Errors
    /// Returns an error if the base URL does not parse or the underlying
    /// HTTP client cannot be constructed.
    pub fn new(
        config: &ClientConfig,
        tokens: Arc<dyn TokenStore>,
        session: Arc<Session>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ClientError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            base_url: Url::parse(&config.base_url)?,
            tokens,
            session,
        })
    }

    /// Issue a GET request and deserialize the JSON response.
    ///
    /// # Errors
    /// Returns [`ClientError::SessionExpired`] on a 401,
    /// [`ClientError::Api`] for other error statuses, and transport or
    /// decode errors otherwise.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.endpoint(path)?;
        let response = self.execute(self.http.get(url)).await?;
        Ok(response.json::<T>().await?)
    }

    /// Issue a POST request with a JSON body and deserialize the JSON
    /// response.
    ///
    /// # Errors
    /// Same contract as [`ApiClient::get_json`].
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let response = self.execute(self.http.post(url).json(body)).await?;
        Ok(response.json::<T>().await?)
    }

    /// Resolve an endpoint path against the base URL, preserving any
    /// path prefix the base URL carries (e.g. `/api`).
    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&joined)?)
    }

    /// Attach credentials, send, and apply the response policy.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ClientError> {
        let request = match self.tokens.get() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.expire_session();
            return Err(ClientError::SessionExpired);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api(error_message(status, &body)));
        }
        Ok(response)
    }

    /// Global reaction to an authentication failure: drop the stored
    /// token and force the session back to the login view.
    pub(crate) fn expire_session(&self) {
        tracing::warn!("Backend returned 401, clearing stored credentials");
        self.tokens.remove();
        self.session.sign_out();
    }
}

/// Error body shape used by the backend: `{"detail": ...}` where the
/// detail is either a plain string or a list of validation items.
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    detail: Option<ErrorDetail>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Text(String),
    Items(Vec<ErrorItem>),
}

#[derive(Debug, serde::Deserialize)]
struct ErrorItem {
    msg: String,
}

/// Reduce an error response to a single human-readable string. Array
/// details are joined with commas; unparseable bodies fall back to the
/// HTTP status line.
fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Some(ErrorDetail::Text(text)),
        }) => text,
        Ok(ErrorBody {
            detail: Some(ErrorDetail::Items(items)),
        }) if !items.is_empty() => items
            .iter()
            .map(|item| item.msg.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        _ => format!("Request failed with status {status}"),
    }
}
