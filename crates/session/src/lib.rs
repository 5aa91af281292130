//! `ledgerdesk-session` — token lifecycle and session state.
//!
//! Owns the three stateful pieces of the client core:
//!
//! - [`TokenStore`]: durable, process-local holder of the committed
//!   credential pair + identity, with a watch-based subscription contract.
//! - [`SessionManager`]: the sole writer of the token store; login, logout,
//!   registration side-effects, and single-flight refresh coordination.
//! - [`RouteGuard`]: read-only gatekeeper for protected navigation.
//!
//! The network is reached only through the [`AuthTransport`] seam, so the
//! whole lifecycle is testable without HTTP.

pub mod guard;
pub mod manager;
pub mod store;
pub mod transport;

pub use guard::RouteGuard;
pub use manager::{LoginError, RefreshError, RegisterError, SessionManager, SessionState};
pub use store::{JsonFileStorage, MemoryStorage, SessionSnapshot, SnapshotStorage, TokenStore};
pub use transport::{AuthTransport, LoginRequest, SessionGrant};
