//! `ledgerdesk-auth` — identity and credential primitives.
//!
//! Pure data layer: who the authenticated user is, what the credential pair
//! looks like on the wire, and how a registration profile is validated.
//! No storage, no HTTP.

pub mod credentials;
pub mod identity;
pub mod register;

pub use credentials::CredentialPair;
pub use identity::{Identity, Role, UserId};
pub use register::RegisterProfile;
