//! Runtime configuration for the credential subsystem.

use chrono::Duration;
use secrecy::SecretString;
use std::fmt;

/// Token lifetimes, link base URL, and the default administrator seed.
#[derive(Clone)]
pub struct AuthConfig {
    frontend_base_url: String,
    activation_ttl: Duration,
    session_ttl: Duration,
    reset_ttl: Duration,
    admin_email: String,
    admin_password: SecretString,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            activation_ttl: Duration::hours(1),
            session_ttl: Duration::days(7),
            reset_ttl: Duration::minutes(30),
            admin_email: "admin@example.com".to_string(),
            admin_password: SecretString::from("Admin@123"),
        }
    }

    #[must_use]
    pub fn with_activation_ttl_seconds(mut self, seconds: i64) -> Self {
        self.activation_ttl = Duration::seconds(seconds);
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl = Duration::seconds(seconds);
        self
    }

    #[must_use]
    pub fn with_reset_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_ttl = Duration::seconds(seconds);
        self
    }

    #[must_use]
    pub fn with_admin_credentials(mut self, email: String, password: SecretString) -> Self {
        self.admin_email = email;
        self.admin_password = password;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub const fn activation_ttl(&self) -> Duration {
        self.activation_ttl
    }

    #[must_use]
    pub const fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    #[must_use]
    pub const fn reset_ttl(&self) -> Duration {
        self.reset_ttl
    }

    #[must_use]
    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }

    #[must_use]
    pub const fn admin_password(&self) -> &SecretString {
        &self.admin_password
    }

    /// Frontend link with the base's trailing slash normalized away.
    #[must_use]
    pub fn frontend_link(&self, path: &str) -> String {
        let base = self.frontend_base_url.trim_end_matches('/');
        format!("{base}/{path}")
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("frontend_base_url", &self.frontend_base_url)
            .field("activation_ttl", &self.activation_ttl)
            .field("session_ttl", &self.session_ttl)
            .field("reset_ttl", &self.reset_ttl)
            .field("admin_email", &self.admin_email)
            .field("admin_password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn defaults_match_token_lifetimes() {
        let config = AuthConfig::new("http://localhost:5173".into());
        assert_eq!(config.activation_ttl(), Duration::hours(1));
        assert_eq!(config.session_ttl(), Duration::days(7));
        assert_eq!(config.reset_ttl(), Duration::minutes(30));
    }

    #[test]
    fn builders_override_defaults() {
        let config = AuthConfig::new("http://localhost:5173".into())
            .with_activation_ttl_seconds(60)
            .with_session_ttl_seconds(120)
            .with_reset_ttl_seconds(30)
            .with_admin_credentials("root@casa.dev".into(), SecretString::from("s3cret-pw"));
        assert_eq!(config.activation_ttl(), Duration::seconds(60));
        assert_eq!(config.session_ttl(), Duration::seconds(120));
        assert_eq!(config.reset_ttl(), Duration::seconds(30));
        assert_eq!(config.admin_email(), "root@casa.dev");
        assert_eq!(config.admin_password().expose_secret(), "s3cret-pw");
    }

    #[test]
    fn frontend_link_trims_trailing_slash() {
        let config = AuthConfig::new("http://localhost:5173/".into());
        assert_eq!(
            config.frontend_link("activation/tok"),
            "http://localhost:5173/activation/tok"
        );
    }

    #[test]
    fn debug_redacts_admin_password() {
        let config = AuthConfig::new("http://localhost:5173".into())
            .with_admin_credentials("root@casa.dev".into(), SecretString::from("s3cret-pw"));
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("s3cret-pw"));
    }
}
