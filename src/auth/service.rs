//! Identity lifecycle orchestration.
//!
//! State machine per identity-in-progress:
//!
//! ```text
//! REQUESTED --(activation token verified, email still free)--> ACTIVE
//! ACTIVE --(reset requested)--> RESET_PENDING
//! RESET_PENDING --(reset token matched before expiry)--> ACTIVE
//! RESET_PENDING --(expiry elapses, or a new reset request)--> superseded
//! ```
//!
//! Registration persists nothing: the pending payload rides inside the
//! signed activation token until it is presented back.

use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::config::AuthConfig;
use super::error::AuthError;
use super::identity::{
    normalize_email, valid_email, valid_password, Identity, PendingRegistration, Role,
};
use super::mailer::{DeliveryError, Mailer};
use super::password::PasswordHasher;
use super::store::CredentialStore;
use super::token::{self, TokenCodec};

/// Outcome of a registration request. Delivery failure is reported alongside
/// the issued token; it never voids the token.
#[derive(Debug)]
pub struct RegisterOutput {
    pub activation_token: String,
    pub delivery: Result<(), DeliveryError>,
}

/// Outcome of a password-reset request. The raw token goes to the mailer and
/// to the caller; only its digest is persisted, and it is never logged.
pub struct ResetRequestOutput {
    pub raw_token: String,
    pub delivery: Result<(), DeliveryError>,
}

/// Outcome of admin-driven agent provisioning.
#[derive(Debug)]
pub struct AgentInvite {
    pub identity: Identity,
    pub delivery: Result<(), DeliveryError>,
}

/// Orchestrates registration, activation, login, and password recovery over
/// the credential store, hasher, codec, and mailer.
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    mailer: Arc<dyn Mailer>,
    codec: TokenCodec,
    hasher: PasswordHasher,
    config: AuthConfig,
}

impl AuthService {
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        mailer: Arc<dyn Mailer>,
        codec: TokenCodec,
        hasher: PasswordHasher,
        config: AuthConfig,
    ) -> Self {
        Self {
            store,
            mailer,
            codec,
            hasher,
            config,
        }
    }

    /// Request registration. No record is persisted; the whole payload is
    /// sealed into a short-lived activation token and mailed out.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisterOutput, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::Validation("name is required".into()));
        }
        let email = normalize_email(email);
        if !valid_email(&email) {
            return Err(AuthError::Validation("invalid email address".into()));
        }
        if !valid_password(password) {
            return Err(AuthError::Validation(
                "password must be at least 6 characters".into(),
            ));
        }

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateIdentity);
        }

        let pending = PendingRegistration {
            name: name.to_string(),
            email: email.clone(),
            password: password.to_string(),
        };
        let activation_token = self
            .codec
            .issue_activation(&pending, self.config.activation_ttl())?;

        let activation_url = self
            .config
            .frontend_link(&format!("activation/{activation_token}"));
        let body = format!(
            "Hello {email}, please click the link below to activate your account: {activation_url}"
        );
        let delivery = self.mailer.send(&email, "Activation Email", &body);
        if let Err(err) = &delivery {
            warn!("activation email for {email} not delivered: {err}");
        }

        Ok(RegisterOutput {
            activation_token,
            delivery,
        })
    }

    /// Consume an activation token and persist the identity it carries.
    pub async fn activate(&self, activation_token: &str) -> Result<Identity, AuthError> {
        let pending = self.codec.verify_activation(activation_token)?;

        // The email may have been taken since the token was issued; the
        // store's uniqueness constraint remains the final authority.
        if self.store.find_by_email(&pending.email).await?.is_some() {
            return Err(AuthError::DuplicateIdentity);
        }

        let password_hash = self.hasher.hash(&pending.password)?;
        let identity = Identity::new(pending.name, pending.email, password_hash, Role::User);
        let identity = self.store.create(identity).await?;

        info!("identity {} activated", identity.id);
        Ok(identity)
    }

    /// Verify credentials and issue a session token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let email = normalize_email(email);
        let identity = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.hasher.verify(password, &identity.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        if !identity.activated {
            return Err(AuthError::InvalidCredentials);
        }
        if identity.must_change_password {
            return Err(AuthError::PasswordChangeRequired);
        }

        self.codec
            .issue_session(identity.id, identity.role, self.config.session_ttl())
    }

    /// Issue a reset token for an existing identity. Any pending reset is
    /// overwritten; the digest and expiry are durable before mail is tried.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<ResetRequestOutput, AuthError> {
        let email = normalize_email(email);
        let mut identity = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::NotFound)?;

        let grant = token::issue_reset_token(self.config.reset_ttl());
        identity.set_reset_token(grant.digest, grant.expires_at);
        self.store.save(&identity).await?;

        let reset_url = self
            .config
            .frontend_link(&format!("reset-password/{}", grant.raw));
        let body = format!(
            "Click the following link to reset your password:\n\n{reset_url}\n\n\
             If you did not request this, please ignore."
        );
        let delivery = self.mailer.send(&email, "Password Reset Request", &body);
        if let Err(err) = &delivery {
            warn!("reset email for {email} not delivered: {err}");
        }

        Ok(ResetRequestOutput {
            raw_token: grant.raw,
            delivery,
        })
    }

    /// Consume a reset token: rotate the password, clear the reset state and
    /// the must-change flag. Single use; expired tokens are rejected even
    /// when the digest matches.
    pub async fn complete_password_reset(
        &self,
        raw_token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if !valid_password(new_password) {
            return Err(AuthError::Validation(
                "password must be at least 6 characters".into(),
            ));
        }

        let digest = token::hash_reset_token(raw_token);
        let mut identity = self
            .store
            .find_by_reset_digest(&digest)
            .await?
            .ok_or(AuthError::TokenInvalid)?;

        let expires_at = identity
            .reset_token_expires_at
            .ok_or(AuthError::TokenInvalid)?;
        if !token::match_reset_token(raw_token, &digest, expires_at, Utc::now()) {
            return Err(AuthError::TokenExpired);
        }

        // Hash first so a failure leaves the record untouched.
        let password_hash = self.hasher.hash(new_password)?;
        identity.password_hash = password_hash;
        identity.clear_reset_token();
        identity.must_change_password = false;
        self.store.save(&identity).await?;

        info!("password reset completed for identity {}", identity.id);
        Ok(())
    }

    /// Rotate a password for an authenticated identity after re-verifying
    /// the old one.
    pub async fn change_password(
        &self,
        id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if !valid_password(new_password) {
            return Err(AuthError::Validation(
                "password must be at least 6 characters".into(),
            ));
        }

        let mut identity = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(AuthError::NotFound)?;

        if !self.hasher.verify(old_password, &identity.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        identity.password_hash = self.hasher.hash(new_password)?;
        self.store.save(&identity).await?;
        Ok(())
    }

    /// Admin-driven agent provisioning: a temporary random password is
    /// hashed and mailed along with a reset link, and the agent must change
    /// it before the first login succeeds.
    pub async fn create_agent(&self, name: &str, email: &str) -> Result<AgentInvite, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::Validation("name is required".into()));
        }
        let email = normalize_email(email);
        if !valid_email(&email) {
            return Err(AuthError::Validation("invalid email address".into()));
        }
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateIdentity);
        }

        let temporary_password = random_password();
        let password_hash = self.hasher.hash(&temporary_password)?;
        let mut identity = Identity::new(name.to_string(), email.clone(), password_hash, Role::Agent);
        identity.must_change_password = true;

        let grant = token::issue_reset_token(self.config.reset_ttl());
        identity.set_reset_token(grant.digest, grant.expires_at);

        let identity = self.store.create(identity).await?;

        let reset_url = self
            .config
            .frontend_link(&format!("reset-password/{}", grant.raw));
        let body = format!(
            "Hello {name},\n\n\
             Your agent account has been created.\n\n\
             Login details:\n\
             - Email: {email}\n\
             - Temporary Password: {temporary_password}\n\n\
             Please reset your password using the link below before logging in:\n\
             {reset_url}\n"
        );
        let delivery = self
            .mailer
            .send(&email, "Your Agent Account Details", &body);
        if let Err(err) = &delivery {
            warn!("agent invite for {email} not delivered: {err}");
        }

        Ok(AgentInvite { identity, delivery })
    }

    /// Idempotent provisioning of the default administrator. Invoked once at
    /// service initialization, never from request handling.
    pub async fn bootstrap_admin(&self) -> Result<(), AuthError> {
        let email = normalize_email(self.config.admin_email());
        if self.store.find_by_email(&email).await?.is_some() {
            return Ok(());
        }

        let password_hash = self
            .hasher
            .hash(self.config.admin_password().expose_secret())?;
        let identity = Identity::new("Administrator".into(), email, password_hash, Role::Admin);
        match self.store.create(identity).await {
            Ok(identity) => {
                info!("default administrator {} provisioned", identity.id);
                Ok(())
            }
            // Lost a provisioning race to another replica; the admin exists.
            Err(super::store::StoreError::Duplicate) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// 8 random bytes, hex-encoded, for a 16-character temporary password.
fn random_password() -> String {
    let mut bytes = [0u8; 8];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
