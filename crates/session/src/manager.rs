//! Session lifecycle orchestration.
//!
//! The manager is the sole writer of the [`TokenStore`]. Everything that
//! mutates session state — login, logout, registration, refresh — funnels
//! through here; the request interceptor and the route guard only read.
//!
//! The central correctness property is **at-most-one refresh**: duplicate
//! refresh calls can invalidate each other's token at the backend and lock
//! the user out permanently, so concurrent callers share a single in-flight
//! exchange and settle on its outcome together.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::{Mutex, watch};

use ledgerdesk_auth::{Identity, RegisterProfile};
use ledgerdesk_core::{FieldError, TransportError};

use crate::store::{SessionSnapshot, TokenStore};
use crate::transport::{AuthTransport, LoginRequest};

// ─────────────────────────────────────────────────────────────────────────────
// Failure kinds
// ─────────────────────────────────────────────────────────────────────────────

/// Why a login attempt did not produce a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("this account is deactivated")]
    AccountInactive,

    /// Network failure, timeout, or an unexpected backend answer.
    #[error("authentication service unavailable: {0}")]
    Unreachable(String),
}

/// Why a registration attempt was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegisterError {
    /// Field-scoped violations, local or backend-reported.
    #[error("registration data failed validation")]
    Validation(Vec<FieldError>),

    /// An account with the same username or email already exists.
    #[error("an account with this {field} already exists")]
    Duplicate { field: String },

    #[error("registration service unavailable: {0}")]
    Unreachable(String),
}

/// Why a refresh did not rotate the credential pair.
///
/// Every variant except [`NoSession`] is terminal: the store has been
/// cleared and the session is over.
///
/// [`NoSession`]: RefreshError::NoSession
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// The backend refused the refresh token.
    #[error("session expired, please log in again")]
    Rejected,

    /// There was nothing to refresh.
    #[error("no active session")]
    NoSession,

    /// Network failure or timeout. Still terminal — an unauthenticated
    /// failure beats a session stuck in `Refreshing` forever.
    #[error("could not refresh the session: {0}")]
    Unreachable(String),

    /// Logout closed the session while the exchange was in flight; the
    /// late result was discarded.
    #[error("session was closed during refresh")]
    Interrupted,
}

/// Derived session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated(Identity),
    /// A refresh is pending; new requests should queue behind it rather
    /// than race it.
    Refreshing(Identity),
}

// ─────────────────────────────────────────────────────────────────────────────
// Manager
// ─────────────────────────────────────────────────────────────────────────────

type RefreshOutcome = Result<(), RefreshError>;

struct ManagerInner {
    transport: Arc<dyn AuthTransport>,
    store: TokenStore,

    /// Single-flight coordination point: while a refresh is in flight this
    /// holds a receiver for its eventual outcome; cleared only after the
    /// exchange settles.
    pending_refresh: Mutex<Option<watch::Receiver<Option<RefreshOutcome>>>>,
    refresh_in_flight: AtomicBool,

    /// Session generation. Bumped on every commit/clear by login, logout and
    /// failed refresh; a refresh result whose generation went stale is
    /// discarded instead of resurrecting a closed session. The guard is held
    /// only around store mutations, never across an await.
    generation: StdMutex<u64>,
}

/// Owner of the session lifecycle. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<ManagerInner>,
}

impl SessionManager {
    /// Build the manager around a transport and a token store, restoring
    /// whatever snapshot the store loaded at startup.
    ///
    /// Requires a running tokio runtime (refresh exchanges are spawned so
    /// they settle even if the initiating caller goes away).
    pub fn new(transport: Arc<dyn AuthTransport>, store: TokenStore) -> Self {
        if let Some(snapshot) = store.read() {
            match snapshot.credentials.access_expires_at() {
                Some(expires_at) => tracing::info!(
                    user = %snapshot.identity.username,
                    %expires_at,
                    "restored persisted session"
                ),
                None => tracing::info!(
                    user = %snapshot.identity.username,
                    "restored persisted session (opaque access token)"
                ),
            }
        }

        Self {
            inner: Arc::new(ManagerInner {
                transport,
                store,
                pending_refresh: Mutex::new(None),
                refresh_in_flight: AtomicBool::new(false),
                generation: StdMutex::new(0),
            }),
        }
    }

    // ── read-only queries ────────────────────────────────────────────────

    pub fn current_identity(&self) -> Option<Identity> {
        self.inner.store.read().map(|snapshot| snapshot.identity)
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner
            .store
            .read()
            .map(|snapshot| snapshot.credentials.access_token)
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.store.read().is_some()
    }

    pub fn state(&self) -> SessionState {
        match self.inner.store.read() {
            None => SessionState::Unauthenticated,
            Some(snapshot) => {
                if self.inner.refresh_in_flight.load(Ordering::Acquire) {
                    SessionState::Refreshing(snapshot.identity)
                } else {
                    SessionState::Authenticated(snapshot.identity)
                }
            }
        }
    }

    /// Watch the committed snapshot; sees every commit and clear.
    pub fn watch(&self) -> watch::Receiver<Option<SessionSnapshot>> {
        self.inner.store.subscribe()
    }

    // ── lifecycle operations ─────────────────────────────────────────────

    /// Authenticate and establish a session.
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, LoginError> {
        let request = LoginRequest::new(username, password);
        tracing::debug!(username, "authenticating");

        let grant = self
            .inner
            .transport
            .login(&request)
            .await
            .map_err(map_login_error)?;

        if !grant.user.is_active {
            tracing::warn!(user = %grant.user.username, "backend granted tokens for an inactive account");
            return Err(LoginError::AccountInactive);
        }

        let identity = grant.user.clone();
        {
            let mut generation = self.inner.generation.lock().unwrap();
            *generation += 1;
            self.inner.store.commit(SessionSnapshot {
                credentials: grant.credentials,
                identity: grant.user,
            });
        }

        tracing::info!(user = %identity.username, "session established");
        Ok(identity)
    }

    /// Create an account. Validates locally first; never authenticates.
    pub async fn register(&self, profile: &RegisterProfile) -> Result<Identity, RegisterError> {
        profile.validate().map_err(RegisterError::Validation)?;

        let identity = self
            .inner
            .transport
            .register(profile)
            .await
            .map_err(map_register_error)?;

        tracing::info!(user = %identity.username, "account created; caller should proceed to login");
        Ok(identity)
    }

    /// End the session.
    ///
    /// Local invalidation never depends on the network: the store is cleared
    /// first, then the backend is notified best-effort.
    pub async fn logout(&self) {
        let snapshot = {
            let mut generation = self.inner.generation.lock().unwrap();
            *generation += 1;
            let snapshot = self.inner.store.read();
            self.inner.store.clear();
            snapshot
        };

        let Some(snapshot) = snapshot else {
            return;
        };
        tracing::info!(user = %snapshot.identity.username, "session closed");

        if let Err(err) = self
            .inner
            .transport
            .logout(&snapshot.credentials.refresh_token)
            .await
        {
            tracing::warn!(error = %err, "backend logout failed; session already cleared locally");
        }
    }

    /// Exchange the refresh token for a new credential pair.
    ///
    /// If an exchange is already in flight, awaits its outcome instead of
    /// issuing a duplicate. Any failure is terminal for the session.
    pub async fn refresh(&self) -> Result<(), RefreshError> {
        let mut rx = {
            let mut pending = self.inner.pending_refresh.lock().await;
            match pending.as_ref() {
                Some(rx) => rx.clone(),
                None => {
                    let (tx, rx) = watch::channel(None);
                    *pending = Some(rx.clone());
                    self.inner.refresh_in_flight.store(true, Ordering::Release);

                    // Spawned so the exchange settles even if every caller
                    // goes away: the backend has single-use refresh tokens,
                    // and an abandoned half-exchange would strand the pair.
                    let inner = Arc::clone(&self.inner);
                    tokio::spawn(async move {
                        let outcome = run_refresh(&inner).await;
                        *inner.pending_refresh.lock().await = None;
                        inner.refresh_in_flight.store(false, Ordering::Release);
                        let _ = tx.send(Some(outcome));
                    });
                    rx
                }
            }
        };

        match rx.wait_for(|outcome| outcome.is_some()).await {
            Ok(outcome) => outcome.clone().unwrap_or(Err(RefreshError::Interrupted)),
            // The exchange task was torn down (runtime shutdown).
            Err(_) => Err(RefreshError::Interrupted),
        }
    }
}

/// Drive one refresh exchange to completion.
async fn run_refresh(inner: &ManagerInner) -> RefreshOutcome {
    // Snapshot and generation are read under the same lock that logout
    // holds while clearing the store, so a logout can only land entirely
    // before this read (no session) or entirely after (stale generation).
    let (snapshot, started_at) = {
        let generation = inner.generation.lock().unwrap();
        (inner.store.read(), *generation)
    };
    let Some(snapshot) = snapshot else {
        return Err(RefreshError::NoSession);
    };

    tracing::debug!(user = %snapshot.identity.username, "exchanging refresh token");
    match inner
        .transport
        .refresh(&snapshot.credentials.refresh_token)
        .await
    {
        Ok(pair) => {
            let generation = inner.generation.lock().unwrap();
            if *generation != started_at {
                tracing::info!("discarding refresh result for a session closed in the meantime");
                return Err(RefreshError::Interrupted);
            }
            inner.store.commit(SessionSnapshot {
                credentials: pair,
                identity: snapshot.identity,
            });
            tracing::debug!("credential pair rotated");
            Ok(())
        }
        Err(err) => {
            let outcome = match err {
                TransportError::Status { status: 401 | 403, .. } => RefreshError::Rejected,
                other => RefreshError::Unreachable(other.to_string()),
            };

            let mut generation = inner.generation.lock().unwrap();
            if *generation == started_at {
                *generation += 1;
                inner.store.clear();
                tracing::warn!(error = %outcome, "refresh failed; session terminated");
            }
            Err(outcome)
        }
    }
}

fn map_login_error(err: TransportError) -> LoginError {
    match err {
        TransportError::Status { status, body } => {
            if body.code() == Some("account_inactive") || status == 403 {
                LoginError::AccountInactive
            } else if status == 401 {
                LoginError::InvalidCredentials
            } else {
                LoginError::Unreachable(format!("backend returned status {status}"))
            }
        }
        other => LoginError::Unreachable(other.to_string()),
    }
}

fn map_register_error(err: TransportError) -> RegisterError {
    match err {
        TransportError::Status { status: 400, body } => {
            if body.fields.is_empty() {
                let message = body
                    .message
                    .unwrap_or_else(|| "registration rejected".to_string());
                RegisterError::Validation(vec![FieldError::new("profile", message)])
            } else {
                RegisterError::Validation(body.fields)
            }
        }
        TransportError::Status { status: 409, body } => RegisterError::Duplicate {
            field: body.field.unwrap_or_else(|| "username".to_string()),
        },
        TransportError::Status { status, .. } => {
            RegisterError::Unreachable(format!("backend returned status {status}"))
        }
        other => RegisterError::Unreachable(other.to_string()),
    }
}
