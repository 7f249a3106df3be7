//! # Casakey (Credential & Session Service)
//!
//! `casakey` is the credential authority of the Casa housing marketplace.
//! It owns the identity lifecycle: email-verified registration, bcrypt
//! password storage, signed session tokens, opaque password-reset tokens,
//! and role-based authorization for users, agents, and administrators.
//!
//! ## Registration & Activation
//!
//! Registration creates no record. The pending name, email, and password are
//! sealed into a short-lived signed activation token mailed to the user; the
//! identity is persisted only when the token is presented back, so abandoned
//! sign-ups never occupy storage.
//!
//! ## Sessions & Authorization
//!
//! Logins hand out a signed token carrying the identity id and role. Every
//! authenticated request re-reads the identity from the store, so deleting
//! an identity revokes access immediately. Agents are provisioned by an
//! administrator and must change their temporary password before their
//! first login succeeds.
//!
//! ## Password Recovery
//!
//! Reset tokens are opaque random values: the user gets the raw token once,
//! the store keeps only its SHA-256 digest and an absolute expiry. Tokens
//! are single use and a new request overwrites any pending one.

pub mod api;
pub mod auth;
pub mod cli;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
