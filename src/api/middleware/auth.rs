//! Bearer token authentication middleware

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::api::error::ApiError;

/// Rejects requests whose `Authorization: Bearer <token>` header does not
/// match the configured token.
pub async fn auth_middleware(
    State(expected_token): State<String>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token {
        Some(token) if token == expected_token => Ok(next.run(request).await),
        Some(_) => Err(ApiError::Unauthorized("Invalid token")),
        None => Err(ApiError::Unauthorized(
            "Missing Authorization header (expected: Bearer <token>)",
        )),
    }
}
