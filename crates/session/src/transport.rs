//! Wire contract of the authentication endpoints.
//!
//! The session manager never talks HTTP directly; it goes through
//! [`AuthTransport`] so tests can script the backend and the HTTP client
//! crate can plug in the real thing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ledgerdesk_auth::{CredentialPair, Identity, RegisterProfile};
use ledgerdesk_core::TransportError;

/// Credentials submitted to the login endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login answer: a freshly minted pair plus the user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionGrant {
    #[serde(flatten)]
    pub credentials: CredentialPair,
    pub user: Identity,
}

/// The authentication endpoints, transport-agnostic.
///
/// Implementations report the raw exchange outcome; interpreting refusals
/// (invalid credentials vs inactive account vs rejected refresh) is the
/// session manager's job.
#[async_trait]
pub trait AuthTransport: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<SessionGrant, TransportError>;

    /// Create an account. Success returns the created identity only —
    /// registration never authenticates.
    async fn register(&self, profile: &RegisterProfile) -> Result<Identity, TransportError>;

    /// Exchange the refresh token for a new credential pair.
    async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, TransportError>;

    /// Ask the backend to invalidate the refresh token.
    async fn logout(&self, refresh_token: &str) -> Result<(), TransportError>;
}
