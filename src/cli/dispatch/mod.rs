//! Command-line argument dispatch.
//!
//! Maps validated CLI arguments to the action executed by the binary.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_SIGNING_SECRET, auth};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches.get_one::<String>("dsn").cloned();
    let signing_secret = matches
        .get_one::<String>(ARG_SIGNING_SECRET)
        .cloned()
        .context("missing required argument: --signing-secret")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        signing_secret: SecretString::from(signing_secret),
        frontend_base_url: auth_opts.frontend_base_url,
        activation_ttl_seconds: auth_opts.activation_ttl_seconds,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        reset_ttl_seconds: auth_opts.reset_ttl_seconds,
        admin_email: auth_opts.admin_email,
        admin_password: SecretString::from(auth_opts.admin_password),
    }))
}
