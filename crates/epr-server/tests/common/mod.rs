//! Shared fixtures for API integration tests
//!
//! Every test drives a fresh router over the in-memory store with
//! `tower::ServiceExt::oneshot`, as one organisation and user.
#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use epr_server::api::create_router;
use epr_server::config::Config;
use epr_server::features::AppState;
use epr_server::repository::MemoryStore;

pub struct TestClient {
    router: Router,
    pub organisation_id: Uuid,
    pub user_id: Uuid,
}

impl TestClient {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let state = AppState::new(Arc::new(MemoryStore::new()), &config);
        Self {
            router: create_router(state, &config.cors),
            organisation_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
        }
    }

    /// Same backing store, acting for another organisation
    pub fn as_organisation(&self, organisation_id: Uuid) -> Self {
        Self {
            router: self.router.clone(),
            organisation_id,
            user_id: Uuid::new_v4(),
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header("organisationId", self.organisation_id.to_string())
            .header("userId", self.user_id.to_string());
        let body = match body {
            Some(body) => {
                request = request.header("content-type", "application/json");
                Body::from(body.to_string())
            },
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    /// Creates a submission of `submission_type` and returns its id
    pub async fn create_submission(&self, submission_type: &str, period: &str) -> Uuid {
        let id = Uuid::new_v4();
        let (status, body) = self
            .post(
                "/api/v1/submissions",
                json!({
                    "id": id,
                    "submissionType": submission_type,
                    "submissionPeriod": period,
                    "dataSourceType": "File",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        id
    }

    pub async fn post_event(&self, submission_id: Uuid, event: Value) -> (StatusCode, Value) {
        self.post(&format!("/api/v1/submissions/{submission_id}/events"), event)
            .await
    }

    /// Records an upload of `file_type` that scanned cleanly into `blob_name`
    pub async fn upload_clean_file(
        &self,
        submission_id: Uuid,
        file_type: &str,
        blob_name: &str,
        registration_set_id: Option<Uuid>,
    ) -> Uuid {
        let file_id = Uuid::new_v4();
        let (status, body) = self
            .post_event(
                submission_id,
                json!({
                    "type": "AntivirusCheck",
                    "fileId": file_id,
                    "fileType": file_type,
                    "fileName": format!("{file_type}.csv"),
                    "registrationSetId": registration_set_id,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        let (status, body) = self
            .post_event(
                submission_id,
                json!({
                    "type": "AntivirusResult",
                    "fileId": file_id,
                    "antivirusScanResult": "Success",
                    "blobName": blob_name,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        file_id
    }
}

pub fn data(body: &Value) -> &Value {
    &body["data"]
}
