//! Event recording, regulator sync feeds and validation issue endpoints

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use common::{data, TestClient};
use epr_server::config::Config;

fn check_splitter(blob_name: &str, rows: &[i32]) -> Value {
    let errors: Vec<Value> = rows
        .iter()
        .map(|row| {
            json!({
                "validationErrorType": "CheckSplitter",
                "rowNumber": row,
                "errorCodes": ["801"],
            })
        })
        .collect();
    json!({
        "type": "CheckSplitter",
        "blobName": blob_name,
        "dataCount": 1,
        "errors": errors,
    })
}

fn rows(body: &Value) -> Vec<i64> {
    data(body)
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| issue["rowNumber"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_pom_file_with_splitter_errors() {
    let client = TestClient::new();
    let id = client.create_submission("Producer", "2024-P1").await;
    let file_id = client.upload_clean_file(id, "Pom", "blob-1", None).await;

    let (status, body) = client
        .post_event(id, check_splitter("blob-1", &[9, 2]))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert!(data(&body)["id"].is_string());

    let (_, body) = client.get(&format!("/api/v1/submissions/{id}")).await;
    let submission = data(&body);
    assert_eq!(submission["pomFileId"], json!(file_id));
    assert_eq!(submission["pomFileName"], "Pom.csv");
    assert_eq!(submission["pomDataComplete"], true);
    assert_eq!(submission["validationPass"], false);

    let (status, body) = client
        .get(&format!("/api/v1/submissions/{id}/organisation-file-upload-errors"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows(&body), [2, 9]);
    assert_eq!(data(&body)[0]["blobName"], "blob-1");
    assert_eq!(data(&body)[0]["validationErrorType"], "CheckSplitter");

    let (status, body) = client
        .get(&format!("/api/v1/submissions/{id}/organisation-file-upload-warnings"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body), &json!([]));
}

#[tokio::test]
async fn test_no_antivirus_result_means_no_errors() {
    let client = TestClient::new();
    let id = client.create_submission("Producer", "2024-P1").await;

    let (status, body) = client
        .get(&format!("/api/v1/submissions/{id}/organisation-file-upload-errors"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body), &json!([]));
}

#[tokio::test]
async fn test_stored_issues_are_capped() {
    let mut config = Config::default();
    config.validation.max_issues_to_process = 2;
    let client = TestClient::with_config(config);
    let id = client.create_submission("Producer", "2024-P1").await;
    client.upload_clean_file(id, "Pom", "blob-1", None).await;

    let (status, _) = client
        .post_event(id, check_splitter("blob-1", &[1, 2, 3]))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = client
        .get(&format!("/api/v1/submissions/{id}/organisation-file-upload-errors"))
        .await;
    assert_eq!(rows(&body), [1, 2]);
}

#[tokio::test]
async fn test_rejected_event_payloads() {
    let client = TestClient::new();
    let id = client.create_submission("Producer", "2024-P1").await;

    let (status, body) = client.post_event(id, json!({ "type": 99 })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");

    let (status, _) = client
        .post_event(id, json!({ "type": "AntivirusCheck", "fileType": "Pom" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = client
        .post_event(
            Uuid::new_v4(),
            json!({ "type": "Submitted", "fileId": Uuid::new_v4() }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "submissionId");

    let (status, body) = client
        .post_event(
            id,
            json!({
                "type": "RegulatorPoMDecision",
                "decision": "Rejected",
                "isResubmissionRequired": true,
                "fileId": Uuid::new_v4(),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "comments");
}

#[tokio::test]
async fn test_unknown_nested_issue_type_is_an_internal_error() {
    let client = TestClient::new();
    let id = client.create_submission("Producer", "2024-P1").await;
    client.upload_clean_file(id, "Pom", "b", None).await;

    let (status, body) = client
        .post_event(
            id,
            json!({
                "type": "CheckSplitter",
                "blobName": "b",
                "errors": [{ "validationErrorType": 9 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");

    let (status, body) = client
        .post_event(
            id,
            json!({
                "type": "CheckSplitter",
                "blobName": "b",
                "errors": [{ "rowNumber": 1 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MALFORMED_PAYLOAD");

    let (_, body) = client
        .get(&format!("/api/v1/submissions/{id}/organisation-file-upload-errors"))
        .await;
    assert_eq!(data(&body), &json!([]));
}

#[tokio::test]
async fn test_regulator_sync_feeds() {
    let client = TestClient::new();
    let id = client.create_submission("Producer", "2024-P1").await;
    let file_id = client.upload_clean_file(id, "Pom", "blob-1", None).await;

    let (status, _) = client
        .post_event(
            id,
            json!({
                "type": "RegulatorPoMDecision",
                "decision": "Accepted",
                "isResubmissionRequired": false,
                "fileId": file_id,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = client.get("/api/v1/regulator-decisions/pom").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body).as_array().unwrap().len(), 1);
    assert_eq!(data(&body)[0]["decision"], "Accepted");
    assert_eq!(data(&body)[0]["submissionId"], json!(id));

    let (_, body) = client
        .get("/api/v1/regulator-decisions/pom?lastSyncTime=2100-01-01T00:00:00Z")
        .await;
    assert_eq!(data(&body), &json!([]));

    let (_, body) = client.get("/api/v1/regulator-decisions/registration").await;
    assert_eq!(data(&body), &json!([]));

    let (status, body) = client
        .get(&format!("/api/v1/submissions/{id}/events"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let events = data(&body);
    assert_eq!(events["antivirusChecks"][0]["fileName"], "Pom.csv");
    assert_eq!(events["regulatorDecisions"][0]["fileName"], "Pom.csv");
    assert_eq!(events["submitted"], json!([]));
}

#[tokio::test]
async fn test_organisation_details_follow_registration_set() {
    let client = TestClient::new();
    let id = client.create_submission("Registration", "2024-P1").await;
    let set = Uuid::new_v4();
    let company_file = client
        .upload_clean_file(id, "CompanyDetails", "company-blob", Some(set))
        .await;
    client
        .upload_clean_file(id, "Brands", "brands-blob", Some(set))
        .await;

    let (status, body) = client
        .get("/api/v1/organisation-details?blobName=brands-blob")
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let details = data(&body);
    assert_eq!(details["blobName"], "company-blob");
    assert_eq!(details["fileId"], json!(company_file));
    assert_eq!(details["registrationSetId"], json!(set));
    assert_eq!(details["submissionId"], json!(id));

    let (status, _) = client
        .get("/api/v1/organisation-details?blobName=unknown-blob")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
