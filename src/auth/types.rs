//! Wire types for the login and signup endpoints.

use serde::{Deserialize, Serialize};

/// Credentials for `POST /login`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account email address.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Registration payload for `POST /signup`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignupRequest {
    /// Display name for the new account.
    pub user_name: String,
    /// Account email address.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Successful `POST /login` response: `{"data": {"token": "..."}}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Payload wrapper.
    pub data: LoginData,
}

/// Inner payload of a login response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginData {
    /// Bearer token to store for subsequent requests.
    pub token: String,
}
