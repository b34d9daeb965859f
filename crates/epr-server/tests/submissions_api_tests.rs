//! Submission endpoints over the in-memory store

mod common;

use axum::http::StatusCode;
use chrono::{Datelike, Utc};
use serde_json::json;
use uuid::Uuid;

use common::{data, TestClient};

#[tokio::test]
async fn test_create_then_get_submission() {
    let client = TestClient::new();
    let id = client
        .create_submission("Producer", "January to June 2024")
        .await;

    let (status, body) = client.get(&format!("/api/v1/submissions/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let submission = data(&body);
    assert_eq!(submission["id"], json!(id));
    assert_eq!(submission["submissionType"], "Producer");
    assert_eq!(submission["organisationId"], json!(client.organisation_id));
    assert_eq!(submission["userId"], json!(client.user_id));
    assert_eq!(submission["isSubmitted"], false);
    assert_eq!(submission["pomDataComplete"], false);
}

#[tokio::test]
async fn test_duplicate_id_is_a_validation_error_on_id() {
    let client = TestClient::new();
    let id = client.create_submission("Producer", "2024-P1").await;

    let (status, body) = client
        .post(
            "/api/v1/submissions",
            json!({
                "id": id,
                "submissionType": "Producer",
                "submissionPeriod": "2024-P1",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let fields: Vec<_> = body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(fields, ["id"]);
}

#[tokio::test]
async fn test_short_period_and_bad_json_are_rejected() {
    let client = TestClient::new();
    let (status, _) = client
        .post(
            "/api/v1/submissions",
            json!({ "id": Uuid::new_v4(), "submissionType": "Producer", "submissionPeriod": "P1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = client
        .post("/api/v1/submissions", json!({ "submissionType": "Nope" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_other_organisation_is_forbidden() {
    let client = TestClient::new();
    let id = client.create_submission("Registration", "2024-P1").await;

    let stranger = client.as_organisation(Uuid::new_v4());
    let (status, body) = stranger.get(&format!("/api/v1/submissions/{id}")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "ORGANISATION_MISMATCH");

    let (status, _) = client
        .get(&format!("/api/v1/submissions/{}", Uuid::new_v4()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_filters_orders_and_limits() {
    let client = TestClient::new();
    let first = client.create_submission("Producer", "2024-P1").await;
    let second = client.create_submission("Producer", "2024-P2").await;
    let registration = client.create_submission("Registration", "2024-P2").await;
    client
        .as_organisation(Uuid::new_v4())
        .create_submission("Producer", "2024-P1")
        .await;

    let (status, body) = client.get("/api/v1/submissions").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = data(&body)
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].clone())
        .collect();
    assert_eq!(ids, [json!(registration), json!(second), json!(first)]);

    let (_, body) = client
        .get("/api/v1/submissions?type=Producer&periods=2024-P1,2024-P2&limit=1")
        .await;
    let ids: Vec<_> = data(&body)
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].clone())
        .collect();
    assert_eq!(ids, [json!(second)]);

    let (status, _) = client.get("/api/v1/submissions?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_periods_for_this_year_and_future_year() {
    let client = TestClient::new();
    client.create_submission("Producer", "2024-P1").await;
    client.create_submission("Producer", "2024-P2").await;
    client.create_submission("Producer", "2024-P1").await;

    let year = Utc::now().year();
    let (status, body) = client
        .get(&format!("/api/v1/submissions/periods?type=Producer&year={year}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body), &json!(["2024-P1", "2024-P2"]));

    let (status, body) = client
        .get(&format!("/api/v1/submissions/periods?year={}", year + 1))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_submit_requires_clean_scan() {
    let client = TestClient::new();
    let id = client.create_submission("Producer", "2024-P1").await;
    let file_id = client.upload_clean_file(id, "Pom", "blob-1", None).await;

    let (status, _) = client
        .post(
            &format!("/api/v1/submissions/{id}/submit"),
            json!({ "fileId": Uuid::new_v4(), "submittedBy": "Jo" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = client
        .post(
            &format!("/api/v1/submissions/{id}/submit"),
            json!({ "fileId": file_id, "submittedBy": "Jo" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, body) = client.get(&format!("/api/v1/submissions/{id}")).await;
    let submission = data(&body);
    assert_eq!(submission["isSubmitted"], true);
    assert_eq!(submission["lastSubmittedFile"]["fileId"], json!(file_id));
    assert_eq!(submission["lastSubmittedFile"]["fileName"], "Pom.csv");
    assert_eq!(submission["lastSubmittedFile"]["submittedBy"], "Jo");
}

#[tokio::test]
async fn test_file_lookups() {
    let client = TestClient::new();
    let id = client.create_submission("Producer", "2024-P1").await;
    let file_id = client.upload_clean_file(id, "Pom", "blob-1", None).await;

    let (status, body) = client.get(&format!("/api/v1/files/{file_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body)["submissionId"], json!(id));
    assert_eq!(data(&body)["fileName"], "Pom.csv");

    let (status, body) = client
        .get(&format!("/api/v1/submissions/{id}/uploadedfile/{file_id}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body)["blobName"], "blob-1");
    assert_eq!(data(&body)["antivirusScanResult"], "Success");

    let (status, _) = client
        .get(&format!("/api/v1/files/{}", Uuid::new_v4()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
