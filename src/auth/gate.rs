//! Request authorization.
//!
//! The gate turns a presented bearer token into a live identity: signature
//! and expiry are checked first, then the identity is re-read from the store
//! so that deletions take effect before the token expires.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use std::sync::Arc;

use super::error::AuthError;
use super::identity::{Identity, Role};
use super::store::CredentialStore;
use super::token::TokenCodec;

/// Authenticates session tokens against the store.
pub struct AuthGate {
    store: Arc<dyn CredentialStore>,
    codec: TokenCodec,
}

impl AuthGate {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, codec: TokenCodec) -> Self {
        Self { store, codec }
    }

    /// Resolve a session token to the identity it names.
    ///
    /// Bad or expired tokens are `Unauthenticated`; a valid token whose
    /// identity has since been deleted is `NotFound`.
    pub async fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self
            .codec
            .verify_session(token)
            .map_err(|_| AuthError::Unauthenticated)?;

        self.store
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::NotFound)
    }
}

/// Reject identities whose role is outside the allow-list.
pub fn require_role(identity: &Identity, allowed: &[Role]) -> Result<(), AuthError> {
    if allowed.contains(&identity.role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Extract the token from an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::Identity;
    use crate::auth::store::MemoryCredentialStore;
    use chrono::Duration;
    use secrecy::SecretString;

    fn codec() -> TokenCodec {
        TokenCodec::new(SecretString::from("gate-test-secret")).unwrap()
    }

    async fn seeded_gate(role: Role) -> (AuthGate, Identity, TokenCodec) {
        let store = Arc::new(MemoryCredentialStore::new());
        let identity = Identity::new("Alice".into(), "alice@example.com".into(), "hash".into(), role);
        let identity = store.create(identity).await.unwrap();
        let codec = codec();
        (AuthGate::new(store, codec.clone()), identity, codec)
    }

    #[tokio::test]
    async fn valid_token_resolves_identity() {
        let (gate, identity, codec) = seeded_gate(Role::User).await;
        let token = codec
            .issue_session(identity.id, identity.role, Duration::days(7))
            .unwrap();
        let resolved = gate.authenticate(&token).await.unwrap();
        assert_eq!(resolved.id, identity.id);
    }

    #[tokio::test]
    async fn expired_token_is_unauthenticated() {
        let (gate, identity, codec) = seeded_gate(Role::User).await;
        let token = codec
            .issue_session(identity.id, identity.role, Duration::seconds(-5))
            .unwrap();
        assert!(matches!(
            gate.authenticate(&token).await,
            Err(AuthError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn garbage_token_is_unauthenticated() {
        let (gate, _, _) = seeded_gate(Role::User).await;
        assert!(matches!(
            gate.authenticate("not-a-token").await,
            Err(AuthError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn deleted_identity_is_not_found() {
        let store = Arc::new(MemoryCredentialStore::new());
        let identity =
            Identity::new("Alice".into(), "alice@example.com".into(), "hash".into(), Role::User);
        let identity = store.create(identity).await.unwrap();
        let codec = codec();
        let token = codec
            .issue_session(identity.id, identity.role, Duration::days(7))
            .unwrap();

        store.remove(identity.id).unwrap();
        let gate = AuthGate::new(store, codec);
        assert!(matches!(
            gate.authenticate(&token).await,
            Err(AuthError::NotFound)
        ));
    }

    #[test]
    fn role_allow_list() {
        let admin =
            Identity::new("Root".into(), "root@example.com".into(), "hash".into(), Role::Admin);
        assert!(require_role(&admin, &[Role::Admin]).is_ok());
        assert!(matches!(
            require_role(&admin, &[Role::User, Role::Agent]),
            Err(AuthError::Forbidden)
        ));
    }

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            bearer_token(&headers),
            Err(AuthError::Unauthenticated)
        ));

        headers.insert(AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(matches!(
            bearer_token(&headers),
            Err(AuthError::Unauthenticated)
        ));

        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }
}
