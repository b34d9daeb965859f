//! In-memory fixtures for feature tests
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use epr_common::types::{AntivirusScanResult, DataSourceType, FileType, SubmissionType};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::models::{
    AntivirusCheck, AntivirusResult, EventKind, Submission, SubmissionEvent, ValidationSummary,
};
use crate::repository::{Change, MemoryStore, Record, SharedStore};

pub fn store() -> SharedStore {
    Arc::new(MemoryStore::new())
}

pub fn context(organisation_id: Uuid) -> RequestContext {
    RequestContext::new(organisation_id, Uuid::new_v4())
}

/// A fixed instant `minutes` after a base time, for deterministic ordering
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
}

pub fn submission(organisation_id: Uuid, submission_type: SubmissionType) -> Submission {
    Submission {
        id: Uuid::new_v4(),
        submission_type,
        submission_period: "January to June 2024".to_string(),
        data_source_type: DataSourceType::File,
        organisation_id,
        user_id: Uuid::new_v4(),
        compliance_scheme_id: None,
        is_submitted: false,
        is_resubmission: false,
        app_reference_number: None,
        created: at(0),
    }
}

pub fn event(submission_id: Uuid, minutes: i64, kind: EventKind) -> SubmissionEvent {
    let mut event = SubmissionEvent::new(submission_id, Uuid::new_v4(), kind);
    event.created = at(minutes);
    event
}

pub fn antivirus_check(
    submission_id: Uuid,
    minutes: i64,
    file_id: Uuid,
    file_type: FileType,
    registration_set_id: Option<Uuid>,
) -> SubmissionEvent {
    event(
        submission_id,
        minutes,
        EventKind::AntivirusCheck(AntivirusCheck {
            file_id,
            file_type,
            file_name: format!("{file_type}.csv"),
            registration_set_id,
        }),
    )
}

pub fn antivirus_result(
    submission_id: Uuid,
    minutes: i64,
    file_id: Uuid,
    result: AntivirusScanResult,
    blob_name: &str,
) -> SubmissionEvent {
    event(
        submission_id,
        minutes,
        EventKind::AntivirusResult(AntivirusResult {
            file_id,
            antivirus_scan_result: result,
            requires_row_validation: Some(true),
            blob_name: Some(blob_name.to_string()),
            antivirus_scan_trigger: None,
            errors: Vec::new(),
        }),
    )
}

/// Validation summary with the given counts and no stored issues
pub fn summary(blob_name: &str, errors: i32, warnings: i32) -> ValidationSummary {
    ValidationSummary::from_issues::<(), ()>(
        blob_name.to_string(),
        None,
        &[],
        &[],
        Some(errors),
        Some(warnings),
    )
}

/// Inserts `records` in one batch
pub async fn seed(store: &SharedStore, records: Vec<Record>) {
    let changes = records
        .into_iter()
        .map(Change::Insert)
        .collect();
    store.commit(changes).await.unwrap();
}
