//! Route handlers.
//!
//! | Route | Component |
//! |-------|-----------|
//! | `POST /generate-url` | capability issuer |
//! | `GET /access-object` | access resolver (behind the authorizer gate) |
//! | `PUT /objects/:bucket/:key` | object store, write capability |
//! | `GET /objects/:bucket/:key` | object store, read capability |
//! | `GET /health` | liveness |

use crate::domain::error::ApiError;
use crate::middleware::{ClientIdentity, ObjectNameQuery};
use axum::{
    body::{to_bytes, Body},
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use bytes::Bytes;
use it_02_object_storage::{CapabilityClaims, CapabilitySigner, ObjectStore, ObjectStoreError};
use it_03_capability_issuer::{CapabilityIssuer, GenerateUrlRequest, IssueError};
use it_07_access_resolver::{AccessOutcome, AccessResolver, ResolveError};
use serde::Deserialize;
use shared_types::CapabilityOperation;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub const OBJECT_NAME_HEADER: &str = "object-name";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub issuer: Arc<CapabilityIssuer>,
    pub resolver: Arc<AccessResolver>,
    pub signer: CapabilitySigner,
    pub objects: Arc<dyn ObjectStore>,
    pub max_object_bytes: usize,
}

/// Capability claims carried in the object URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CapabilityQuery {
    pub op: Option<String>,
    pub expires: Option<String>,
    pub signature: Option<String>,
}

impl CapabilityQuery {
    fn claims(self) -> Option<CapabilityClaims> {
        Some(CapabilityClaims {
            operation: self.op?,
            expires_at: self.expires?.parse().ok()?,
            signature: self.signature?,
        })
    }
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn generate_url(
    State(state): State<AppState>,
    identity: Option<Extension<ClientIdentity>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: GenerateUrlRequest = serde_json::from_slice(&body).map_err(|e| {
        debug!(error = %e, "Malformed generate-url body");
        ApiError::malformed_request()
    })?;

    let Some(Extension(ClientIdentity(source))) = identity else {
        error!("generate-url reached without a client identity");
        return Err(ApiError::internal());
    };

    let issued = state
        .issuer
        .issue(request, source)
        .await
        .map_err(|e| match e {
            IssueError::UnsupportedMediaType { .. } => ApiError::unsupported_media_type(),
            IssueError::Store(e) => {
                error!(error = %e, "Failed to issue capability");
                ApiError::internal()
            }
        })?;

    Ok((
        StatusCode::OK,
        [
            (OBJECT_NAME_HEADER, issued.object_id.to_string()),
            (header::CONTENT_TYPE.as_str(), "text/plain; charset=utf-8".to_string()),
        ],
        issued.capability.url,
    )
        .into_response())
}

pub async fn access_object(
    State(state): State<AppState>,
    Query(query): Query<ObjectNameQuery>,
) -> Result<Response, ApiError> {
    match state.resolver.resolve(query.object_name.as_deref()).await {
        Ok(AccessOutcome::TryLater) => Err(ApiError::not_ready()),
        Ok(AccessOutcome::Broken) => Err(ApiError::object_broken()),
        Ok(AccessOutcome::Ready(capability)) => Ok((StatusCode::OK, capability.url).into_response()),
        Err(ResolveError::MissingObjectName) => Err(ApiError::missing_object_name()),
        // Already logged by the resolver.
        Err(ResolveError::InternalConsistency { .. }) => Err(ApiError::internal()),
        Err(ResolveError::Store(e)) => {
            error!(error = %e, "Failed to resolve access");
            Err(ApiError::internal())
        }
    }
}

fn verify(
    signer: &CapabilitySigner,
    required: CapabilityOperation,
    bucket: &str,
    key: &str,
    query: CapabilityQuery,
) -> Result<(), ApiError> {
    let Some(claims) = query.claims() else {
        return Err(ApiError::invalid_capability());
    };
    signer
        .verify(required, bucket, key, &claims)
        .map_err(|e| {
            warn!(bucket, key, op = %required, reason = %e, "Capability rejected");
            ApiError::invalid_capability()
        })
}

fn object_error(e: ObjectStoreError) -> ApiError {
    match e {
        ObjectStoreError::NoSuchBucket { .. } | ObjectStoreError::NoSuchKey { .. } => {
            ApiError::no_such_object()
        }
        other => {
            error!(error = %other, "Object store failure");
            ApiError::internal()
        }
    }
}

pub async fn put_object(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
    Query(query): Query<CapabilityQuery>,
    headers: HeaderMap,
    body: Body,
) -> Result<StatusCode, ApiError> {
    verify(&state.signer, CapabilityOperation::Write, &bucket, &key, query)?;

    let bytes = to_bytes(body, state.max_object_bytes)
        .await
        .map_err(|_| ApiError::payload_too_large())?;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    state
        .objects
        .put_object(&bucket, &key, bytes, content_type)
        .await
        .map_err(object_error)?;
    Ok(StatusCode::OK)
}

pub async fn get_object(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
    Query(query): Query<CapabilityQuery>,
) -> Result<Response, ApiError> {
    verify(&state.signer, CapabilityOperation::Read, &bucket, &key, query)?;

    let object = state
        .objects
        .get_object(&bucket, &key)
        .await
        .map_err(object_error)?;
    let content_type = object
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE.as_str(), content_type),
            (header::ETAG.as_str(), format!("\"{}\"", object.etag)),
        ],
        object.body,
    )
        .into_response())
}
