//! Registration, activation, login, and the authenticated profile.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{MessageBody, error_response};
use crate::auth::{AuthError, AuthGate, AuthService, Identity, Role, gate};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ActivateRequest {
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IdentityResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            name: identity.name,
            email: identity.email,
            role: identity.role,
        }
    }
}

/// Request registration: no record is created yet, an activation email is
/// sent instead.
#[utoipa::path(
    post,
    path = "/user/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Activation email sent", body = MessageBody),
        (status = 400, description = "Invalid payload", body = super::ErrorBody),
        (status = 409, description = "Email already registered", body = super::ErrorBody),
        (status = 502, description = "Mail delivery failed", body = super::ErrorBody)
    ),
    tag = "user"
)]
pub async fn register(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return error_response(&AuthError::Validation("missing payload".into()));
    };

    match service
        .register(&request.name, &request.email, &request.password)
        .await
    {
        Ok(output) => match output.delivery {
            Ok(()) => (
                StatusCode::OK,
                Json(MessageBody {
                    message: "an activation email has been sent".to_string(),
                }),
            )
                .into_response(),
            // Nothing was persisted; without the mail the token is lost, so
            // the caller must retry.
            Err(err) => error_response(&AuthError::Delivery(err)),
        },
        Err(err) => error_response(&err),
    }
}

/// Consume an activation token and create the identity.
#[utoipa::path(
    post,
    path = "/user/activate",
    request_body = ActivateRequest,
    responses(
        (status = 201, description = "Identity created", body = IdentityResponse),
        (status = 400, description = "Invalid or expired token", body = super::ErrorBody),
        (status = 409, description = "Email already registered", body = super::ErrorBody)
    ),
    tag = "user"
)]
pub async fn activate(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<ActivateRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return error_response(&AuthError::Validation("missing payload".into()));
    };
    if request.token.trim().is_empty() {
        return error_response(&AuthError::Validation("missing token".into()));
    }

    match service.activate(request.token.trim()).await {
        Ok(identity) => {
            (StatusCode::CREATED, Json(IdentityResponse::from(identity))).into_response()
        }
        Err(err) => error_response(&err),
    }
}

/// Verify credentials and hand out a session token.
#[utoipa::path(
    post,
    path = "/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = super::ErrorBody),
        (status = 403, description = "Password change required", body = super::ErrorBody)
    ),
    tag = "user"
)]
pub async fn login(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return error_response(&AuthError::Validation("missing payload".into()));
    };

    match service.login(&request.email, &request.password).await {
        Ok(token) => (StatusCode::OK, Json(LoginResponse { token })).into_response(),
        Err(err) => error_response(&err),
    }
}

/// Return the profile of the authenticated identity.
#[utoipa::path(
    get,
    path = "/user/me",
    responses(
        (status = 200, description = "Authenticated identity", body = IdentityResponse),
        (status = 401, description = "Missing or invalid bearer token", body = super::ErrorBody),
        (status = 404, description = "Identity no longer exists", body = super::ErrorBody)
    ),
    tag = "user"
)]
pub async fn me(headers: HeaderMap, auth_gate: Extension<Arc<AuthGate>>) -> impl IntoResponse {
    let token = match gate::bearer_token(&headers) {
        Ok(token) => token,
        Err(err) => return error_response(&err),
    };

    match auth_gate.authenticate(token).await {
        Ok(identity) => (StatusCode::OK, Json(IdentityResponse::from(identity))).into_response(),
        Err(err) => error_response(&err),
    }
}
