use crate::{
    api,
    auth::{
        AuthConfig, AuthGate, AuthService, CredentialStore, LogMailer, MemoryCredentialStore,
        PasswordHasher, PgCredentialStore, TokenCodec,
    },
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing::warn;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub signing_secret: SecretString,
    pub frontend_base_url: String,
    pub activation_ttl_seconds: i64,
    pub session_ttl_seconds: i64,
    pub reset_ttl_seconds: i64,
    pub admin_email: String,
    pub admin_password: SecretString,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the signing secret is unusable, the database is
/// unreachable, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let codec = TokenCodec::new(args.signing_secret).context("Invalid signing secret")?;

    let config = AuthConfig::new(args.frontend_base_url.clone())
        .with_activation_ttl_seconds(args.activation_ttl_seconds)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_reset_ttl_seconds(args.reset_ttl_seconds)
        .with_admin_credentials(args.admin_email, args.admin_password);

    let store: Arc<dyn CredentialStore> = if let Some(dsn) = &args.dsn {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;

        Arc::new(PgCredentialStore::new(pool))
    } else {
        warn!("no --dsn given, identities are kept in memory and lost on restart");
        Arc::new(MemoryCredentialStore::new())
    };

    let service = Arc::new(AuthService::new(
        store.clone(),
        Arc::new(LogMailer),
        codec.clone(),
        PasswordHasher::new(),
        config,
    ));

    // The default administrator must exist before the listener binds.
    service
        .bootstrap_admin()
        .await
        .context("Failed to provision default administrator")?;

    let auth_gate = Arc::new(AuthGate::new(store, codec));

    api::new(args.port, service, auth_gate, &args.frontend_base_url).await
}
