//! Administrative provisioning.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::error_response;
use super::user::IdentityResponse;
use crate::auth::{AuthError, AuthGate, AuthService, Role, gate};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAgentRequest {
    pub name: String,
    pub email: String,
}

/// Provision an agent account with a temporary password. Admin only.
#[utoipa::path(
    post,
    path = "/admin/agents",
    request_body = CreateAgentRequest,
    responses(
        (status = 201, description = "Agent created and invite mailed", body = IdentityResponse),
        (status = 401, description = "Missing or invalid bearer token", body = super::ErrorBody),
        (status = 403, description = "Caller is not an administrator", body = super::ErrorBody),
        (status = 409, description = "Email already registered", body = super::ErrorBody)
    ),
    tag = "admin"
)]
pub async fn create_agent(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
    auth_gate: Extension<Arc<AuthGate>>,
    payload: Option<Json<CreateAgentRequest>>,
) -> impl IntoResponse {
    let token = match gate::bearer_token(&headers) {
        Ok(token) => token,
        Err(err) => return error_response(&err),
    };
    let caller = match auth_gate.authenticate(token).await {
        Ok(identity) => identity,
        Err(err) => return error_response(&err),
    };
    if let Err(err) = gate::require_role(&caller, &[Role::Admin]) {
        return error_response(&err);
    }

    let Some(Json(request)) = payload else {
        return error_response(&AuthError::Validation("missing payload".into()));
    };

    match service.create_agent(&request.name, &request.email).await {
        Ok(invite) => (
            StatusCode::CREATED,
            Json(IdentityResponse::from(invite.identity)),
        )
            .into_response(),
        Err(err) => error_response(&err),
    }
}
