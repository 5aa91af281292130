//! Shared user-facing notification channel.
//!
//! Every failure that reaches presentation code goes through here exactly
//! once per failed call — nothing is silently swallowed, nothing is
//! double-reported. The channel is observe-only: it never influences retry
//! or control flow.

use serde::Serialize;
use tokio::sync::broadcast;

use ledgerdesk_core::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One user-facing event.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

/// Publisher handle for the notification channel.
///
/// Broadcast semantics; delivery is lossy for slow subscribers (no
/// backpressure on the request path).
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn publish(&self, severity: Severity, message: impl Into<String>, status: Option<u16>) {
        let notification = Notification {
            severity,
            message: message.into(),
            status,
        };
        tracing::debug!(message = %notification.message, status, "notification published");
        let _ = self.tx.send(notification);
    }

    /// Publish the single notification for a failed API call.
    pub(crate) fn report_api_failure(&self, err: &ApiError) {
        self.publish(Severity::Error, message_for(err), err.status());
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Human-readable message for a failed call: the backend's own message when
/// it supplied one, otherwise synthesized from the failure kind.
pub fn message_for(err: &ApiError) -> String {
    if let Some(message) = err.body().and_then(|body| body.message.clone()) {
        return message;
    }

    match err {
        ApiError::Unauthorized(_) => "Your session has expired, please log in again".to_string(),
        ApiError::Forbidden(_) => "You do not have permission to perform this action".to_string(),
        ApiError::Status { status: 404, .. } => "The requested resource was not found".to_string(),
        ApiError::Status { status, .. } => {
            format!("The server reported an error (status {status})")
        }
        ApiError::Network(_) => "Cannot reach the server, please check your connection".to_string(),
        ApiError::Timeout => "The server took too long to answer".to_string(),
        ApiError::Decode(_) => "The server answer could not be understood".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdesk_core::ErrorBody;

    #[test]
    fn backend_message_wins_over_synthesis() {
        let err = ApiError::Status {
            status: 422,
            body: ErrorBody::parse(r#"{"message":"journal entry is unbalanced"}"#),
        };
        assert_eq!(message_for(&err), "journal entry is unbalanced");
    }

    #[test]
    fn messages_are_synthesized_from_the_failure_kind() {
        assert_eq!(
            message_for(&ApiError::Unauthorized(ErrorBody::default())),
            "Your session has expired, please log in again"
        );
        assert_eq!(
            message_for(&ApiError::Status {
                status: 500,
                body: ErrorBody::default()
            }),
            "The server reported an error (status 500)"
        );
        assert_eq!(
            message_for(&ApiError::Network("connection refused".to_string())),
            "Cannot reach the server, please check your connection"
        );
    }

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let notifier = Notifier::new();
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();

        notifier.publish(Severity::Error, "boom", Some(500));

        assert_eq!(a.recv().await.unwrap().message, "boom");
        assert_eq!(b.recv().await.unwrap().status, Some(500));
    }
}
