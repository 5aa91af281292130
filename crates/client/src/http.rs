//! reqwest implementation of the authentication transport.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use ledgerdesk_auth::{CredentialPair, Identity, RegisterProfile};
use ledgerdesk_core::{ErrorBody, TransportError};
use ledgerdesk_session::{AuthTransport, LoginRequest, SessionGrant};

pub(crate) const LOGIN_PATH: &str = "/api/auth/login";
pub(crate) const REGISTER_PATH: &str = "/api/auth/register";
pub(crate) const REFRESH_PATH: &str = "/api/auth/refresh";
pub(crate) const LOGOUT_PATH: &str = "/api/auth/logout";

/// Map a reqwest failure onto the transport taxonomy.
pub(crate) fn transport_failure(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(err.to_string())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(serde::Deserialize)]
struct CreatedAccount {
    user: Identity,
}

/// The authentication endpoints over HTTP.
///
/// The reqwest client is shared with the request interceptor, so the bounded
/// timeout configured at bootstrap applies to every exchange here too.
pub struct HttpAuthTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthTransport {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: ErrorBody::parse(&raw),
            });
        }

        let raw = response
            .text()
            .await
            .map_err(|err| TransportError::Decode(err.to_string()))?;
        serde_json::from_str(&raw).map_err(|err| TransportError::Decode(err.to_string()))
    }
}

#[async_trait]
impl AuthTransport for HttpAuthTransport {
    async fn login(&self, request: &LoginRequest) -> Result<SessionGrant, TransportError> {
        self.post_json(LOGIN_PATH, request).await
    }

    async fn register(&self, profile: &RegisterProfile) -> Result<Identity, TransportError> {
        let created: CreatedAccount = self.post_json(REGISTER_PATH, profile).await?;
        Ok(created.user)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, TransportError> {
        self.post_json(REFRESH_PATH, &RefreshRequest { refresh_token })
            .await
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), TransportError> {
        let response = self
            .http
            .post(self.url(LOGOUT_PATH))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let raw = response.text().await.unwrap_or_default();
            Err(TransportError::Status {
                status: status.as_u16(),
                body: ErrorBody::parse(&raw),
            })
        }
    }
}
