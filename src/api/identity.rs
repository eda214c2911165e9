//! Tenant identity endpoint

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::Serialize;

use super::{auth::AccountId, ApiError, ApiState};

/// Identity response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    pub tenant_key: String,
}

/// Resolve the caller's tenant key
pub async fn identity(
    State(state): State<Arc<ApiState>>,
    Extension(account): Extension<AccountId>,
) -> Result<Json<IdentityResponse>, ApiError> {
    let key = state.resolver.resolve(&account.0)?;
    Ok(Json(IdentityResponse {
        tenant_key: key.as_str().to_string(),
    }))
}
