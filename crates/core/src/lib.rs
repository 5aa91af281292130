//! `ledgerdesk-core` — shared failure taxonomy for the client boundary.
//!
//! This crate contains the **transport-agnostic** error model: what the
//! backend can answer, and how failures look to business code. No HTTP
//! client, no session state.

pub mod error;
pub mod wire;

pub use error::{ApiError, TransportError};
pub use wire::{ErrorBody, FieldError};
