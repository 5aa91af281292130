//! Request interceptor: credential attachment and refresh-and-retry.
//!
//! Every outbound business call goes through [`ApiClient`]: attach the
//! current access token, dispatch, and on an authorization refusal run a
//! single coordinated refresh and re-issue the original request exactly
//! once. Business code only ever sees the final outcome; the "please
//! refresh" signal never leaks.
//!
//! The interceptor owns no session state — it reads from and triggers the
//! session manager, which is the sole writer.

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use ledgerdesk_core::{ApiError, ErrorBody, TransportError};
use ledgerdesk_session::SessionManager;

use crate::http::{REFRESH_PATH, transport_failure};
use crate::notify::Notifier;

/// Whether an endpoint demands credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// Short-circuit with an authorization failure when no session exists.
    Required,
    /// Dispatch without credentials when no session exists (health checks,
    /// public catalogs).
    Public,
}

/// HTTP client for protected endpoints.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionManager,
    notifier: Notifier,
}

impl ApiClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        session: SessionManager,
        notifier: Notifier,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            session,
            notifier,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.run(Method::GET, path, None, AuthPolicy::Required).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let body = to_body(body)?;
        self.run(Method::POST, path, Some(body), AuthPolicy::Required).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let body = to_body(body)?;
        self.run(Method::PUT, path, Some(body), AuthPolicy::Required).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.run(Method::DELETE, path, None, AuthPolicy::Required).await
    }

    /// Connectivity probe against the public health endpoint.
    pub async fn health(&self) -> Result<Value, ApiError> {
        self.run(Method::GET, "/api/health", None, AuthPolicy::Public).await
    }

    /// Raw entry point for callers that manage their own payload shapes.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        policy: AuthPolicy,
    ) -> Result<Value, ApiError> {
        self.run(method, path, body, policy).await
    }

    /// Dispatch, then hand the final outcome to the notification stage.
    ///
    /// The notification happens here and only here, after retry has settled,
    /// so each failed call produces exactly one event.
    async fn run<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        policy: AuthPolicy,
    ) -> Result<T, ApiError> {
        let outcome = match self
            .authorized_dispatch(&method, path, body.as_ref(), policy)
            .await
        {
            Ok(value) => {
                serde_json::from_value(value).map_err(|err| ApiError::Decode(err.to_string()))
            }
            Err(err) => Err(err),
        };

        if let Err(err) = &outcome {
            self.notifier.report_api_failure(err);
        }
        outcome
    }

    async fn authorized_dispatch(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        policy: AuthPolicy,
    ) -> Result<Value, ApiError> {
        let token = self.session.access_token();
        if token.is_none() && policy == AuthPolicy::Required {
            return Err(ApiError::Unauthorized(ErrorBody {
                error: Some("not_authenticated".to_string()),
                message: Some("Please log in to continue".to_string()),
                ..ErrorBody::default()
            }));
        }

        let first = self.dispatch(method, path, body, token.as_deref()).await;

        let refused = matches!(
            first,
            Err(ApiError::Unauthorized(_)) | Err(ApiError::Forbidden(_))
        );
        // The refresh exchange never re-enters itself, and anonymous calls
        // have nothing to refresh.
        if !refused || token.is_none() || path == REFRESH_PATH {
            return first;
        }

        match self.session.refresh().await {
            Ok(()) => {
                let rotated = self.session.access_token();
                tracing::debug!(path, "retrying once with rotated credentials");
                self.dispatch(method, path, body, rotated.as_deref()).await
            }
            Err(err) => {
                // Session manager already forced logout where warranted; the
                // caller gets the original refusal, not a refresh error.
                tracing::debug!(path, error = %err, "refresh failed; propagating original refusal");
                first
            }
        }
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method.clone(), url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|err| ApiError::from(transport_failure(err)))?;

        let status = response.status();
        if status.is_success() {
            let raw = response
                .text()
                .await
                .map_err(|err| ApiError::Decode(err.to_string()))?;
            if raw.trim().is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_str(&raw).map_err(|err| ApiError::Decode(err.to_string()))
        } else {
            let raw = response.text().await.unwrap_or_default();
            Err(ApiError::from(TransportError::Status {
                status: status.as_u16(),
                body: ErrorBody::parse(&raw),
            }))
        }
    }
}

fn to_body(body: &impl Serialize) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|err| ApiError::Decode(err.to_string()))
}
