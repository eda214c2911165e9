//! Session authentication middleware
//!
//! Verifies the caller's bearer token against the configured session table
//! (the stand-in for the external auth provider) and attaches the resolved
//! account id to the request.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::{ApiError, ApiState};
use crate::Error;

/// The externally-authenticated account identifier of the caller
#[derive(Debug, Clone)]
pub struct AccountId(pub String);

/// Extract the bearer token from the Authorization header
fn extract_token(req: &Request) -> Option<&str> {
    req.headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Middleware requiring a valid caller session
pub async fn require_session(
    State(state): State<Arc<ApiState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&req)
        .ok_or_else(|| Error::Unauthorized("missing bearer token".to_string()))?;

    let account_id = state
        .sessions
        .get(token)
        .cloned()
        .ok_or_else(|| Error::Unauthorized("unknown session token".to_string()))?;

    req.extensions_mut().insert(AccountId(account_id));
    Ok(next.run(req).await)
}
