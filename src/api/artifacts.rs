//! Authenticated artifact management endpoints

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{auth::AccountId, ApiError, ApiState};
use crate::catalog::{is_allowed_upload, ArtifactKind, ArtifactStore};
use crate::identity::TenantKey;
use crate::Error;

fn tenant_of(state: &ApiState, account: &AccountId) -> Result<TenantKey, ApiError> {
    Ok(state.resolver.resolve(&account.0)?)
}

fn store_of(state: &ApiState) -> Result<&Arc<dyn ArtifactStore>, ApiError> {
    state
        .store
        .as_ref()
        .ok_or_else(|| Error::NotConfigured("artifact storage backend").into())
}

/// Upload acknowledgement
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub accepted: bool,
    pub name: String,
    pub size: u64,
    pub kind: ArtifactKind,
}

/// Accept a multipart file upload into the caller's catalog
pub async fn upload(
    State(state): State<Arc<ApiState>>,
    Extension(account): Extension<AccountId>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let tenant = tenant_of(&state, &account)?;
    let store = store_of(&state)?;

    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let name = field
                .file_name()
                .map(ToString::to_string)
                .ok_or_else(|| Error::Validation("file part has no filename".to_string()))?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| Error::Validation(format!("could not read file part: {e}")))?;
            file = Some((name, bytes.to_vec()));
            break;
        }
    }

    let (name, bytes) =
        file.ok_or_else(|| Error::Validation("no file provided".to_string()))?;

    // Extension allow-list gates the catalog; nothing disallowed is stored.
    if !is_allowed_upload(&name) {
        return Err(Error::Validation(format!("file type not allowed: {name}")).into());
    }

    let descriptor = store.put(&tenant, &name, &bytes).await?;

    Ok(Json(UploadResponse {
        accepted: true,
        name: descriptor.name,
        size: descriptor.size,
        kind: descriptor.kind,
    }))
}

/// One listed artifact
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedArtifact {
    pub name: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// Listing response
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub files: Vec<ListedArtifact>,
}

/// List the caller's artifacts; requires `?list=1`
pub async fn list(
    State(state): State<Arc<ApiState>>,
    Extension(account): Extension<AccountId>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ListResponse>, ApiError> {
    if params.get("list").map(String::as_str) != Some("1") {
        return Err(Error::Validation("invalid request".to_string()).into());
    }

    let tenant = tenant_of(&state, &account)?;
    let store = store_of(&state)?;

    let files = store
        .list(&tenant)
        .await?
        .into_iter()
        .map(|a| ListedArtifact {
            name: a.name,
            size: a.size,
            uploaded_at: a.modified,
        })
        .collect();

    Ok(Json(ListResponse { files }))
}

/// Deletion request
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub name: String,
}

/// Deletion response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// Remove one artifact from the caller's catalog
pub async fn remove(
    State(state): State<Arc<ApiState>>,
    Extension(account): Extension<AccountId>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let tenant = tenant_of(&state, &account)?;
    let store = store_of(&state)?;

    let deleted = store.delete(&tenant, &request.name).await?;
    Ok(Json(DeleteResponse { deleted }))
}
