//! API handlers for casakey.
//!
//! Handlers stay thin: decode the payload, call into `auth`, and map the
//! outcome through [`error_response`]. Internal error detail never leaves
//! the process; it is logged here and collapsed to a generic message.

pub mod admin;
pub mod health;
pub mod password;
pub mod user;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::AuthError;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageBody {
    pub message: String,
}

/// Map an [`AuthError`] to its HTTP response, logging internal kinds.
pub fn error_response(err: &AuthError) -> Response {
    let status = err.status();
    if status == StatusCode::INTERNAL_SERVER_ERROR || status == StatusCode::BAD_GATEWAY {
        error!("request failed: {err}");
    }
    (
        status,
        Json(ErrorBody {
            error: err.public_message(),
        }),
    )
        .into_response()
}

// axum handler for /, undocumented on purpose
pub async fn root() -> impl IntoResponse {
    (StatusCode::OK, env!("CARGO_PKG_NAME"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn root_names_the_service() {
        let response = root().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let response = error_response(&AuthError::Storage("dsn and secrets".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
