//! Per-request caller context
//!
//! The caller's organisation and user are taken from the `organisationId` and
//! `userId` headers as-is. Each context owns a cancellation token that fires
//! once the request is dropped, e.g. when the client disconnects.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use tokio_util::sync::{CancellationToken, DropGuard};
use uuid::Uuid;

use crate::error::{AppError, FieldError};

pub const ORGANISATION_ID_HEADER: &str = "organisationid";
pub const USER_ID_HEADER: &str = "userid";

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub organisation_id: Uuid,
    pub user_id: Uuid,
    cancellation: CancellationToken,
    _guard: Arc<DropGuard>,
}

impl RequestContext {
    pub fn new(organisation_id: Uuid, user_id: Uuid) -> Self {
        let cancellation = CancellationToken::new();
        let guard = cancellation.clone().drop_guard();
        Self {
            organisation_id,
            user_id,
            cancellation,
            _guard: Arc::new(guard),
        }
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }
}

fn header_guid(headers: &HeaderMap, name: &str, field: &str) -> Result<Uuid, FieldError> {
    let raw = headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| FieldError::new(field, format!("'{field}' header is required")))?;

    Uuid::parse_str(raw)
        .map_err(|_| FieldError::new(field, format!("'{field}' header must be a GUID")))
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let organisation = header_guid(&parts.headers, ORGANISATION_ID_HEADER, "organisationId");
        let user = header_guid(&parts.headers, USER_ID_HEADER, "userId");

        match (organisation, user) {
            (Ok(organisation_id), Ok(user_id)) => Ok(Self::new(organisation_id, user_id)),
            (organisation, user) => Err(AppError::Validation(
                [organisation.err(), user.err()].into_iter().flatten().collect(),
            )),
        }
    }
}
