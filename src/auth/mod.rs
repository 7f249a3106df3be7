//! Credential and session lifecycle.
//!
//! Everything auth lives here: identity records and roles, password hashing,
//! token issuance and verification, the credential store, the lifecycle
//! service, and the authorization gate the HTTP layer leans on.

pub mod config;
pub mod error;
pub mod gate;
pub mod identity;
pub mod mailer;
pub mod password;
pub mod service;
pub mod store;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use gate::AuthGate;
pub use identity::{Identity, Role};
pub use mailer::{DeliveryError, LogMailer, Mailer};
pub use password::PasswordHasher;
pub use service::AuthService;
pub use store::{CredentialStore, MemoryCredentialStore, PgCredentialStore};
pub use token::{SessionClaims, TokenCodec};
