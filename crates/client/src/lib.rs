//! `ledgerdesk-client` — HTTP edge of the session core.
//!
//! Wires the session layer to a real backend: the reqwest implementation of
//! the auth transport, the request interceptor that attaches credentials and
//! coordinates refresh-and-retry, the shared notification channel every
//! failure funnels into, and the configuration/bootstrap facade.

pub mod config;
pub mod facade;
pub mod http;
pub mod interceptor;
pub mod notify;

pub use config::ClientConfig;
pub use facade::LedgerdeskClient;
pub use http::HttpAuthTransport;
pub use interceptor::{ApiClient, AuthPolicy};
pub use notify::{Notification, Notifier, Severity};
