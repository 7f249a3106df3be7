//! Password recovery and rotation.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::{MessageBody, error_response};
use crate::auth::{AuthError, AuthGate, AuthService, gate};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Issue a reset token and mail the reset link.
#[utoipa::path(
    post,
    path = "/password/forgot",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email sent", body = MessageBody),
        (status = 404, description = "No identity for that email", body = super::ErrorBody),
        (status = 502, description = "Mail delivery failed", body = super::ErrorBody)
    ),
    tag = "password"
)]
pub async fn forgot(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return error_response(&AuthError::Validation("missing payload".into()));
    };

    match service.request_password_reset(&request.email).await {
        // The reset grant is durable either way; a failed send only means
        // the link did not go out.
        Ok(output) => match output.delivery {
            Ok(()) => (
                StatusCode::OK,
                Json(MessageBody {
                    message: "a password reset email has been sent".to_string(),
                }),
            )
                .into_response(),
            Err(err) => error_response(&AuthError::Delivery(err)),
        },
        Err(err) => error_response(&err),
    }
}

/// Consume a reset token and set a new password.
#[utoipa::path(
    post,
    path = "/password/reset",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageBody),
        (status = 400, description = "Invalid or expired token", body = super::ErrorBody)
    ),
    tag = "password"
)]
pub async fn reset(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return error_response(&AuthError::Validation("missing payload".into()));
    };
    if request.token.trim().is_empty() {
        return error_response(&AuthError::Validation("missing token".into()));
    }

    match service
        .complete_password_reset(request.token.trim(), &request.password)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageBody {
                message: "password has been reset".to_string(),
            }),
        )
            .into_response(),
        Err(err) => error_response(&err),
    }
}

/// Rotate the password of the authenticated identity.
#[utoipa::path(
    put,
    path = "/password/change",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Invalid new password", body = super::ErrorBody),
        (status = 401, description = "Wrong old password or bad token", body = super::ErrorBody)
    ),
    tag = "password"
)]
pub async fn change(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
    auth_gate: Extension<Arc<AuthGate>>,
    payload: Option<Json<ChangePasswordRequest>>,
) -> impl IntoResponse {
    let token = match gate::bearer_token(&headers) {
        Ok(token) => token,
        Err(err) => return error_response(&err),
    };
    let identity = match auth_gate.authenticate(token).await {
        Ok(identity) => identity,
        Err(err) => return error_response(&err),
    };
    let Some(Json(request)) = payload else {
        return error_response(&AuthError::Validation("missing payload".into()));
    };

    match service
        .change_password(identity.id, &request.old_password, &request.new_password)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&err),
    }
}
