//! Navigation gate for protected areas.

use std::sync::Mutex;

use crate::manager::SessionManager;

/// Decides whether navigation into a protected route is allowed.
///
/// Read-only with respect to session state: it queries the manager and never
/// mutates it. On a denial it remembers the requested destination so the
/// navigation layer can return there after a successful login.
pub struct RouteGuard {
    session: SessionManager,
    intended: Mutex<Option<String>>,
}

impl RouteGuard {
    pub fn new(session: SessionManager) -> Self {
        Self {
            session,
            intended: Mutex::new(None),
        }
    }

    /// True iff an identity is present. On false, the destination is
    /// recorded and the caller should redirect to the entry point.
    pub fn can_enter(&self, route: &str) -> bool {
        if self.session.current_identity().is_some() {
            return true;
        }
        tracing::debug!(route, "denying unauthenticated navigation");
        *self.intended.lock().unwrap() = Some(route.to_string());
        false
    }

    /// The destination recorded by the most recent denial, consumed.
    pub fn take_intended_destination(&self) -> Option<String> {
        self.intended.lock().unwrap().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use async_trait::async_trait;

    use ledgerdesk_auth::{CredentialPair, Identity, RegisterProfile, Role, UserId};
    use ledgerdesk_core::TransportError;

    use crate::store::{SessionSnapshot, TokenStore};
    use crate::transport::{AuthTransport, LoginRequest, SessionGrant};

    struct NoTransport;

    #[async_trait]
    impl AuthTransport for NoTransport {
        async fn login(&self, _request: &LoginRequest) -> Result<SessionGrant, TransportError> {
            Err(TransportError::Network("offline".to_string()))
        }
        async fn register(&self, _profile: &RegisterProfile) -> Result<Identity, TransportError> {
            Err(TransportError::Network("offline".to_string()))
        }
        async fn refresh(&self, _refresh_token: &str) -> Result<CredentialPair, TransportError> {
            Err(TransportError::Network("offline".to_string()))
        }
        async fn logout(&self, _refresh_token: &str) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn seeded_store() -> TokenStore {
        let store = TokenStore::in_memory();
        store.commit(SessionSnapshot {
            credentials: CredentialPair::new("a", "r"),
            identity: Identity {
                id: UserId::new(),
                username: "testuser".to_string(),
                email: "test@example.com".to_string(),
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                roles: vec![Role::new("USER")],
                is_active: true,
                created_at: None,
                updated_at: None,
            },
        });
        store
    }

    #[tokio::test]
    async fn authenticated_sessions_pass() {
        let manager = SessionManager::new(Arc::new(NoTransport), seeded_store());
        let guard = RouteGuard::new(manager);

        assert!(guard.can_enter("/dashboard"));
        assert_eq!(guard.take_intended_destination(), None);
    }

    #[tokio::test]
    async fn denial_records_the_destination_once() {
        let manager = SessionManager::new(Arc::new(NoTransport), TokenStore::in_memory());
        let guard = RouteGuard::new(manager);

        assert!(!guard.can_enter("/accounting/journal-entries"));
        assert_eq!(
            guard.take_intended_destination().as_deref(),
            Some("/accounting/journal-entries")
        );
        // Consumed.
        assert_eq!(guard.take_intended_destination(), None);
    }

    #[tokio::test]
    async fn logout_closes_the_gate() {
        let manager = SessionManager::new(Arc::new(NoTransport), seeded_store());
        let guard = RouteGuard::new(manager.clone());

        assert!(guard.can_enter("/dashboard"));
        manager.logout().await;
        assert!(!guard.can_enter("/dashboard"));
    }
}
