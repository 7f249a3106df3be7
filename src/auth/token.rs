//! Token issuance and verification.
//!
//! Two kinds of tokens are produced here:
//!
//! - stateless signed tokens (activation, session): HS256 JWTs carrying the
//!   payload plus an expiry claim, signed with the process-wide secret;
//! - opaque reset tokens: random bytes returned to the user once, with only
//!   the SHA-256 digest and an absolute expiry kept server-side.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

use super::error::AuthError;
use super::identity::{PendingRegistration, Role};

/// Claims embedded in an activation token. The plaintext password rides
/// inside the signed, time-bounded capsule so that no unverified identity
/// occupies storage; the signing secret is as sensitive as the store itself.
#[derive(Serialize, Deserialize)]
struct ActivationClaims {
    name: String,
    email: String,
    password: String,
    iat: i64,
    exp: i64,
}

/// Claims embedded in a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: identity id.
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies activation and session tokens.
#[derive(Clone)]
pub struct TokenCodec {
    secret: SecretString,
}

impl TokenCodec {
    /// Fails when the signing secret is unset; a missing secret must keep
    /// the service from accepting traffic.
    pub fn new(secret: SecretString) -> Result<Self, AuthError> {
        if secret.expose_secret().trim().is_empty() {
            return Err(AuthError::Config("signing secret is not set".into()));
        }
        Ok(Self { secret })
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.secret.expose_secret().as_bytes())
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.secret.expose_secret().as_bytes())
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        validation
    }

    /// Issue a signed activation token embedding the pending registration.
    pub fn issue_activation(
        &self,
        pending: &PendingRegistration,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = ActivationClaims {
            name: pending.name.clone(),
            email: pending.email.clone(),
            password: pending.password.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key())
            .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
    }

    /// Verify an activation token and recover the pending registration.
    pub fn verify_activation(&self, token: &str) -> Result<PendingRegistration, AuthError> {
        let data = jsonwebtoken::decode::<ActivationClaims>(
            token,
            &self.decoding_key(),
            &Self::validation(),
        )
        .map_err(map_jwt_error)?;
        Ok(PendingRegistration {
            name: data.claims.name,
            email: data.claims.email,
            password: data.claims.password,
        })
    }

    /// Issue a signed session token carrying identity id and role.
    pub fn issue_session(&self, id: Uuid, role: Role, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: id,
            role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key())
            .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
    }

    /// Verify a session token's signature and expiry.
    pub fn verify_session(&self, token: &str) -> Result<SessionClaims, AuthError> {
        jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key(), &Self::validation())
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::TokenInvalid,
    }
}

/// A freshly issued reset token. `raw` goes to the user exactly once;
/// `digest` and `expires_at` are what the store keeps.
pub struct ResetGrant {
    pub raw: String,
    pub digest: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for ResetGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetGrant")
            .field("raw", &"***")
            .field("digest", &self.digest)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Generate an opaque reset token: 32 random bytes, base64url-encoded,
/// plus its digest and expiry.
#[must_use]
pub fn issue_reset_token(ttl: Duration) -> ResetGrant {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let raw = URL_SAFE_NO_PAD.encode(bytes);
    let digest = hash_reset_token(&raw);
    ResetGrant {
        raw,
        digest,
        expires_at: Utc::now() + ttl,
    }
}

/// SHA-256 digest of a raw reset token, hex-encoded. This is the only form
/// ever persisted.
#[must_use]
pub fn hash_reset_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

/// A presented raw token matches only when its digest equals the stored one
/// AND the expiry has not passed. Both conditions must hold.
#[must_use]
pub fn match_reset_token(
    raw: &str,
    stored_digest: &str,
    stored_expiry: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    hash_reset_token(raw) == stored_digest && now <= stored_expiry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(SecretString::from("test-signing-secret")).unwrap()
    }

    fn pending() -> PendingRegistration {
        PendingRegistration {
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password: "Secr3t!pw".into(),
        }
    }

    #[test]
    fn empty_secret_is_a_config_error() {
        let result = TokenCodec::new(SecretString::from(""));
        assert!(matches!(result, Err(AuthError::Config(_))));

        let result = TokenCodec::new(SecretString::from("   "));
        assert!(matches!(result, Err(AuthError::Config(_))));
    }

    #[test]
    fn activation_round_trip() {
        let token = codec()
            .issue_activation(&pending(), Duration::hours(1))
            .unwrap();
        let recovered = codec().verify_activation(&token).unwrap();
        assert_eq!(recovered.name, "Alice");
        assert_eq!(recovered.email, "alice@example.com");
        assert_eq!(recovered.password, "Secr3t!pw");
    }

    #[test]
    fn expired_activation_is_distinguished() {
        let token = codec()
            .issue_activation(&pending(), Duration::seconds(-5))
            .unwrap();
        assert!(matches!(
            codec().verify_activation(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn tampered_token_is_invalid() {
        let token = codec()
            .issue_activation(&pending(), Duration::hours(1))
            .unwrap();
        let mut tampered = token.into_bytes();
        let last = tampered.len() - 1;
        tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(tampered).unwrap();
        assert!(matches!(
            codec().verify_activation(&tampered),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = codec()
            .issue_activation(&pending(), Duration::hours(1))
            .unwrap();
        let other = TokenCodec::new(SecretString::from("another-secret")).unwrap();
        assert!(matches!(
            other.verify_activation(&token),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn session_round_trip() {
        let id = Uuid::new_v4();
        let token = codec()
            .issue_session(id, Role::Agent, Duration::days(7))
            .unwrap();
        let claims = codec().verify_session(&token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, Role::Agent);
    }

    #[test]
    fn expired_session_is_rejected() {
        let token = codec()
            .issue_session(Uuid::new_v4(), Role::User, Duration::seconds(-5))
            .unwrap();
        assert!(matches!(
            codec().verify_session(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn reset_token_round_trip() {
        let grant = issue_reset_token(Duration::minutes(30));
        assert!(match_reset_token(
            &grant.raw,
            &grant.digest,
            grant.expires_at,
            Utc::now()
        ));
    }

    #[test]
    fn reset_token_single_bit_mutation_fails() {
        let grant = issue_reset_token(Duration::minutes(30));
        let mut mutated = grant.raw.clone().into_bytes();
        mutated[0] ^= 1;
        let mutated = String::from_utf8(mutated).unwrap();
        assert!(!match_reset_token(
            &mutated,
            &grant.digest,
            grant.expires_at,
            Utc::now()
        ));
    }

    #[test]
    fn reset_token_expiry_rejected_even_with_matching_digest() {
        let grant = issue_reset_token(Duration::seconds(-5));
        assert!(!match_reset_token(
            &grant.raw,
            &grant.digest,
            grant.expires_at,
            Utc::now()
        ));
    }

    #[test]
    fn reset_token_is_url_safe() {
        let grant = issue_reset_token(Duration::minutes(30));
        assert!(grant
            .raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        // 32 bytes encode to 43 base64url chars.
        assert_eq!(grant.raw.len(), 43);
    }

    #[test]
    fn reset_digest_is_deterministic() {
        assert_eq!(hash_reset_token("some-token"), hash_reset_token("some-token"));
        assert_ne!(hash_reset_token("token-a"), hash_reset_token("token-b"));
    }

    #[test]
    fn reset_grant_debug_redacts_raw() {
        let grant = issue_reset_token(Duration::minutes(30));
        let rendered = format!("{grant:?}");
        assert!(!rendered.contains(&grant.raw));
    }
}
