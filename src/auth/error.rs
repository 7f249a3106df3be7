//! Error taxonomy for the credential subsystem.
//!
//! Every per-request failure is recovered at the handler boundary and mapped
//! to a status plus a caller-safe message. `Config` is fatal at startup and
//! never reaches request handling.

use axum::http::StatusCode;
use thiserror::Error;

use super::mailer::DeliveryError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("identity already exists")]
    DuplicateIdentity,

    /// Unknown email and wrong password collapse into this one kind so the
    /// login path cannot be used to enumerate accounts.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid token")]
    TokenInvalid,

    #[error("token has expired")]
    TokenExpired,

    #[error("password change required before login")]
    PasswordChangeRequired,

    #[error("forbidden")]
    Forbidden,

    #[error("please login to continue")]
    Unauthenticated,

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl AuthError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::TokenInvalid | Self::TokenExpired => {
                StatusCode::BAD_REQUEST
            }
            Self::DuplicateIdentity => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::PasswordChangeRequired | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Delivery(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Crypto(_) | Self::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to return to the caller. Internal kinds collapse to a
    /// generic message; details stay in the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Config(_) | Self::Crypto(_) | Self::Storage(_) => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            AuthError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::DuplicateIdentity.status(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::TokenInvalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::TokenExpired.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::PasswordChangeRequired.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AuthError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AuthError::Delivery(DeliveryError("smtp down".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AuthError::Storage("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_details_do_not_leak() {
        let err = AuthError::Storage("connection refused to 10.0.0.2".into());
        assert_eq!(err.public_message(), "internal server error");

        let err = AuthError::Crypto("bad key material".into());
        assert_eq!(err.public_message(), "internal server error");
    }

    #[test]
    fn wrong_password_and_unknown_email_share_one_message() {
        // Both paths construct the same variant; the message carries no hint.
        assert_eq!(
            AuthError::InvalidCredentials.public_message(),
            "invalid credentials"
        );
    }
}
