//! Credential storage.
//!
//! The store is the single source of truth for identities and the authority
//! on email uniqueness: `create` fails with `StoreError::Duplicate` for the
//! second of two concurrent writers. Lookups report not-found (`Ok(None)`)
//! separately from backend failure.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

use super::error::AuthError;
use super::identity::{Identity, Role};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("identity already exists")]
    Duplicate,

    #[error("storage backend: {0}")]
    Backend(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => Self::DuplicateIdentity,
            StoreError::Backend(msg) => Self::Storage(msg),
        }
    }
}

/// Durable identity storage consumed by the lifecycle service and the
/// authorization gate.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError>;

    /// Lookup by the stored reset-token digest (reset completion has only
    /// the raw token; the digest is the correlating key).
    async fn find_by_reset_digest(&self, digest: &str) -> Result<Option<Identity>, StoreError>;

    /// Persist a new identity. The email uniqueness check and the insert are
    /// atomic; the second concurrent writer gets `Duplicate`.
    async fn create(&self, identity: Identity) -> Result<Identity, StoreError>;

    /// Upsert mutated fields of an existing identity.
    async fn save(&self, identity: &Identity) -> Result<(), StoreError>;
}

/// In-memory store used for local dev and tests.
///
/// One mutex serializes all access, so check-then-insert is atomic.
#[derive(Default)]
pub struct MemoryCredentialStore {
    records: Mutex<HashMap<Uuid, Identity>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, Identity>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Backend("poisoned lock".into()))
    }

    /// Remove a record. Test hook for the deleted-identity gate path.
    pub fn remove(&self, id: Uuid) -> Result<(), StoreError> {
        self.lock()?.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let records = self.lock()?;
        Ok(records.values().find(|i| i.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        let records = self.lock()?;
        Ok(records.get(&id).cloned())
    }

    async fn find_by_reset_digest(&self, digest: &str) -> Result<Option<Identity>, StoreError> {
        let records = self.lock()?;
        Ok(records
            .values()
            .find(|i| i.reset_token_hash.as_deref() == Some(digest))
            .cloned())
    }

    async fn create(&self, identity: Identity) -> Result<Identity, StoreError> {
        let mut records = self.lock()?;
        if records.values().any(|i| i.email == identity.email) {
            return Err(StoreError::Duplicate);
        }
        records.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn save(&self, identity: &Identity) -> Result<(), StoreError> {
        let mut records = self.lock()?;
        records.insert(identity.id, identity.clone());
        Ok(())
    }
}

/// Postgres-backed store. The unique index on `email` is the authority on
/// uniqueness; SQLSTATE 23505 maps to `Duplicate`.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const IDENTITY_COLUMNS: &str = "id, name, email, password_hash, role, activated, \
     must_change_password, reset_token_hash, reset_token_expires_at, created_at";

fn row_to_identity(row: &sqlx::postgres::PgRow) -> Result<Identity, StoreError> {
    let role: String = row.get("role");
    let role = Role::from_str(&role).map_err(StoreError::Backend)?;
    Ok(Identity {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        activated: row.get("activated"),
        must_change_password: row.get("must_change_password"),
        reset_token_hash: row.get("reset_token_hash"),
        reset_token_expires_at: row.get("reset_token_expires_at"),
        created_at: row.get("created_at"),
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let query = format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE email = $1");
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.as_ref().map(row_to_identity).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        let query = format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.as_ref().map(row_to_identity).transpose()
    }

    async fn find_by_reset_digest(&self, digest: &str) -> Result<Option<Identity>, StoreError> {
        let query = format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE reset_token_hash = $1");
        let row = sqlx::query(&query)
            .bind(digest)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.as_ref().map(row_to_identity).transpose()
    }

    async fn create(&self, identity: Identity) -> Result<Identity, StoreError> {
        sqlx::query(
            "INSERT INTO identities \
             (id, name, email, password_hash, role, activated, must_change_password, \
              reset_token_hash, reset_token_expires_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(identity.id)
        .bind(&identity.name)
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(identity.role.as_str())
        .bind(identity.activated)
        .bind(identity.must_change_password)
        .bind(&identity.reset_token_hash)
        .bind(identity.reset_token_expires_at)
        .bind(identity.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                StoreError::Duplicate
            } else {
                backend(err)
            }
        })?;
        Ok(identity)
    }

    async fn save(&self, identity: &Identity) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO identities \
             (id, name, email, password_hash, role, activated, must_change_password, \
              reset_token_hash, reset_token_expires_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (id) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 email = EXCLUDED.email, \
                 password_hash = EXCLUDED.password_hash, \
                 role = EXCLUDED.role, \
                 activated = EXCLUDED.activated, \
                 must_change_password = EXCLUDED.must_change_password, \
                 reset_token_hash = EXCLUDED.reset_token_hash, \
                 reset_token_expires_at = EXCLUDED.reset_token_expires_at",
        )
        .bind(identity.id)
        .bind(&identity.name)
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(identity.role.as_str())
        .bind(identity.activated)
        .bind(identity.must_change_password)
        .bind(&identity.reset_token_hash)
        .bind(identity.reset_token_expires_at)
        .bind(identity.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                StoreError::Duplicate
            } else {
                backend(err)
            }
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn identity(email: &str) -> Identity {
        Identity::new("Test".into(), email.into(), "hash".into(), Role::User)
    }

    #[tokio::test]
    async fn create_then_find_by_email_and_id() {
        let store = MemoryCredentialStore::new();
        let created = store.create(identity("a@example.com")).await.unwrap();

        let by_email = store.find_by_email("a@example.com").await.unwrap();
        assert_eq!(by_email.map(|i| i.id), Some(created.id));

        let by_id = store.find_by_id(created.id).await.unwrap();
        assert_eq!(by_id.map(|i| i.email), Some("a@example.com".to_string()));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryCredentialStore::new();
        store.create(identity("a@example.com")).await.unwrap();
        let result = store.create(identity("a@example.com")).await;
        assert!(matches!(result, Err(StoreError::Duplicate)));
    }

    #[tokio::test]
    async fn not_found_is_none_not_an_error() {
        let store = MemoryCredentialStore::new();
        assert!(store.find_by_email("missing@example.com").await.unwrap().is_none());
        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
        assert!(store.find_by_reset_digest("deadbeef").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_persists_reset_fields() {
        let store = MemoryCredentialStore::new();
        let mut record = store.create(identity("a@example.com")).await.unwrap();

        record.set_reset_token("digest".into(), Utc::now());
        store.save(&record).await.unwrap();

        let found = store.find_by_reset_digest("digest").await.unwrap();
        assert_eq!(found.map(|i| i.id), Some(record.id));
    }

    #[test]
    fn store_error_maps_to_auth_error() {
        assert!(matches!(
            AuthError::from(StoreError::Duplicate),
            AuthError::DuplicateIdentity
        ));
        assert!(matches!(
            AuthError::from(StoreError::Backend("x".into())),
            AuthError::Storage(_)
        ));
    }
}
