//! Top-level wiring of the client core.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::broadcast;

use ledgerdesk_auth::{Identity, RegisterProfile};
use ledgerdesk_core::ApiError;
use ledgerdesk_session::{
    JsonFileStorage, LoginError, MemoryStorage, RegisterError, RouteGuard, SessionManager,
    SnapshotStorage, TokenStore,
};

use crate::config::ClientConfig;
use crate::http::HttpAuthTransport;
use crate::interceptor::ApiClient;
use crate::notify::{Notification, Notifier, Severity};

/// The assembled client core: session manager, route guard, request
/// interceptor and notification channel, wired from one [`ClientConfig`].
///
/// Login/registration failures funnel into the same notification channel as
/// failed API calls, so presentation code has a single place to listen.
pub struct LedgerdeskClient {
    session: SessionManager,
    guard: RouteGuard,
    api: ApiClient,
    notifier: Notifier,
}

impl LedgerdeskClient {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build the HTTP client")?;

        let storage: Arc<dyn SnapshotStorage> = match &config.session_file {
            Some(path) => Arc::new(JsonFileStorage::at(path)),
            None => match JsonFileStorage::default_profile() {
                Some(storage) => Arc::new(storage),
                None => {
                    tracing::warn!(
                        "no platform data directory; the session will not survive restarts"
                    );
                    Arc::new(MemoryStorage::new())
                }
            },
        };

        let store = TokenStore::open(storage);
        let transport = Arc::new(HttpAuthTransport::new(http.clone(), config.api_url.clone()));
        let session = SessionManager::new(transport, store);
        let notifier = Notifier::new();
        let api = ApiClient::new(http, config.api_url, session.clone(), notifier.clone());
        let guard = RouteGuard::new(session.clone());

        Ok(Self {
            session,
            guard,
            api,
            notifier,
        })
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    /// Authenticate; failures surface on the notification channel.
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, LoginError> {
        let result = self.session.login(username, password).await;
        if let Err(err) = &result {
            let status = match err {
                LoginError::InvalidCredentials => Some(401),
                LoginError::AccountInactive => Some(403),
                LoginError::Unreachable(_) => None,
            };
            self.notifier.publish(Severity::Error, err.to_string(), status);
        }
        result
    }

    /// Create an account; does not authenticate. Field-scoped errors stay on
    /// the result for the form, the notification carries a summary.
    pub async fn register(&self, profile: &RegisterProfile) -> Result<Identity, RegisterError> {
        let result = self.session.register(profile).await;
        if let Err(err) = &result {
            let message = match err {
                RegisterError::Validation(_) => {
                    "Please correct the highlighted fields".to_string()
                }
                other => other.to_string(),
            };
            self.notifier.publish(Severity::Error, message, None);
        }
        result
    }

    pub async fn logout(&self) {
        self.session.logout().await;
    }

    /// Change the password of the authenticated user. A protected call like
    /// any other: it rides the interceptor pipeline, refresh included.
    pub async fn change_password(&self, current: &str, new: &str) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "currentPassword": current,
            "newPassword": new,
        });
        self.api
            .post::<serde_json::Value>("/api/auth/change-password", &body)
            .await
            .map(|_| ())
    }
}
