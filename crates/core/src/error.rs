//! Client-side error model.
//!
//! Two layers:
//! - [`TransportError`] is the raw outcome of one wire exchange.
//! - [`ApiError`] is what business code sees for a protected call, after
//!   the interceptor pipeline has finished (including refresh-and-retry).

use thiserror::Error;

use crate::wire::ErrorBody;

/// Raw failure of a single wire exchange.
///
/// Keep this mechanical: no interpretation of *why* the backend refused,
/// only *what* came back. Interpretation (invalid credentials vs inactive
/// account vs rejected refresh) belongs to the session layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The backend answered with a non-success status.
    #[error("backend returned status {status}")]
    Status { status: u16, body: ErrorBody },

    /// The backend could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The bounded per-request timeout elapsed.
    #[error("request timed out")]
    Timeout,

    /// The response arrived but could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            TransportError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Whether the failure is a credential/authorization refusal.
    pub fn is_auth_refusal(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

/// Final failure of a protected call, as seen by business code.
///
/// Authorization refusals that survived refresh-and-retry surface as
/// [`ApiError::Unauthorized`] / [`ApiError::Forbidden`]; everything else is
/// passed through unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("not authorized")]
    Unauthorized(ErrorBody),

    #[error("forbidden")]
    Forbidden(ErrorBody),

    /// Any other non-success status.
    #[error("request failed with status {status}")]
    Status { status: u16, body: ErrorBody },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Forbidden(_) => Some(403),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            ApiError::Unauthorized(body) | ApiError::Forbidden(body) | ApiError::Status { body, .. } => {
                Some(body)
            }
            _ => None,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Status { status: 401, body } => ApiError::Unauthorized(body),
            TransportError::Status { status: 403, body } => ApiError::Forbidden(body),
            TransportError::Status { status, body } => ApiError::Status { status, body },
            TransportError::Network(reason) => ApiError::Network(reason),
            TransportError::Timeout => ApiError::Timeout,
            TransportError::Decode(reason) => ApiError::Decode(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses_map_to_dedicated_variants() {
        let unauthorized = TransportError::Status {
            status: 401,
            body: ErrorBody::default(),
        };
        assert!(unauthorized.is_auth_refusal());
        assert!(matches!(ApiError::from(unauthorized), ApiError::Unauthorized(_)));

        let forbidden = TransportError::Status {
            status: 403,
            body: ErrorBody::default(),
        };
        assert!(forbidden.is_auth_refusal());
        assert!(matches!(ApiError::from(forbidden), ApiError::Forbidden(_)));
    }

    #[test]
    fn other_statuses_pass_through() {
        let conflict = TransportError::Status {
            status: 409,
            body: ErrorBody::parse(r#"{"error":"conflict"}"#),
        };
        assert!(!conflict.is_auth_refusal());
        match ApiError::from(conflict) {
            ApiError::Status { status, body } => {
                assert_eq!(status, 409);
                assert_eq!(body.code(), Some("conflict"));
            }
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[test]
    fn network_failures_have_no_status() {
        assert_eq!(ApiError::Network("dns".into()).status(), None);
        assert_eq!(ApiError::Timeout.status(), None);
    }
}
