//! Token lifetime, frontend, and admin-seed arguments.

use anyhow::{Context, Result};
use clap::{Arg, Command};

pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";
pub const ARG_ACTIVATION_TTL: &str = "activation-ttl-seconds";
pub const ARG_SESSION_TTL: &str = "session-ttl-seconds";
pub const ARG_RESET_TTL: &str = "reset-ttl-seconds";
pub const ARG_ADMIN_EMAIL: &str = "admin-email";
pub const ARG_ADMIN_PASSWORD: &str = "admin-password";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Base URL used in activation and reset links")
                .default_value("http://localhost:5173")
                .env("CASAKEY_FRONTEND_BASE_URL"),
        )
        .arg(
            Arg::new(ARG_ACTIVATION_TTL)
                .long(ARG_ACTIVATION_TTL)
                .help("Activation token lifetime in seconds")
                .default_value("3600")
                .env("CASAKEY_ACTIVATION_TTL_SECONDS")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL)
                .long(ARG_SESSION_TTL)
                .help("Session token lifetime in seconds")
                .default_value("604800")
                .env("CASAKEY_SESSION_TTL_SECONDS")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_RESET_TTL)
                .long(ARG_RESET_TTL)
                .help("Password reset token lifetime in seconds")
                .default_value("1800")
                .env("CASAKEY_RESET_TTL_SECONDS")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_ADMIN_EMAIL)
                .long(ARG_ADMIN_EMAIL)
                .help("Email of the default administrator seeded at startup")
                .default_value("admin@example.com")
                .env("CASAKEY_ADMIN_EMAIL"),
        )
        .arg(
            Arg::new(ARG_ADMIN_PASSWORD)
                .long(ARG_ADMIN_PASSWORD)
                .help("Password of the default administrator seeded at startup")
                .default_value("Admin@123")
                .env("CASAKEY_ADMIN_PASSWORD"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub frontend_base_url: String,
    pub activation_ttl_seconds: i64,
    pub session_ttl_seconds: i64,
    pub reset_ttl_seconds: i64,
    pub admin_email: String,
    pub admin_password: String,
}

impl Options {
    /// # Errors
    /// Returns an error if a defaulted argument is somehow missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        Ok(Self {
            frontend_base_url: matches
                .get_one::<String>(ARG_FRONTEND_BASE_URL)
                .cloned()
                .context("missing required argument: --frontend-base-url")?,
            activation_ttl_seconds: matches
                .get_one::<i64>(ARG_ACTIVATION_TTL)
                .copied()
                .context("missing required argument: --activation-ttl-seconds")?,
            session_ttl_seconds: matches
                .get_one::<i64>(ARG_SESSION_TTL)
                .copied()
                .context("missing required argument: --session-ttl-seconds")?,
            reset_ttl_seconds: matches
                .get_one::<i64>(ARG_RESET_TTL)
                .copied()
                .context("missing required argument: --reset-ttl-seconds")?,
            admin_email: matches
                .get_one::<String>(ARG_ADMIN_EMAIL)
                .cloned()
                .context("missing required argument: --admin-email")?,
            admin_password: matches
                .get_one::<String>(ARG_ADMIN_PASSWORD)
                .cloned()
                .context("missing required argument: --admin-password")?,
        })
    }
}
