use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::models::profile::Role;
use crate::policy::Actor;
use crate::AppState;

/// Token claims carry the principal id only. A role claim would let a caller
/// forge its own authorization, so the role is resolved from the profiles
/// table on every request instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Decodes the bearer token, resolves the caller's stored role and injects
/// an [`Actor`] into request extensions. An identity without a profile row
/// is denied outright.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return unauthorized("missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return unauthorized("bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return unauthorized("unsupported_scheme");
    };

    let config = crate::config::get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = match decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => data,
        Err(_) => return unauthorized("invalid_token"),
    };
    let Ok(identity) = data.claims.sub.parse::<Uuid>() else {
        return unauthorized("invalid_subject");
    };

    let role = match state.role_resolver.resolve(identity).await {
        Ok(Some(role)) => role,
        // fail closed: no profile row, no access
        Ok(None) => {
            return (StatusCode::FORBIDDEN, Json(json!({"error":"forbidden"}))).into_response()
        }
        Err(e) => {
            tracing::error!(error = ?e, "role resolution failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error":"internal"})),
            )
                .into_response();
        }
    };

    req.extensions_mut().insert(Actor { id: identity, role });
    next.run(req).await
}

/// Gate for the admin router group; expects [`authenticate`] to have run.
pub async fn require_admin(req: Request, next: Next) -> Response {
    match req.extensions().get::<Actor>() {
        Some(actor) if actor.role == Role::Admin => next.run(req).await,
        Some(_) => (StatusCode::FORBIDDEN, Json(json!({"error":"forbidden"}))).into_response(),
        None => unauthorized("missing_authorization"),
    }
}

fn unauthorized(code: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
}
