use chrono::{DateTime, Utc};
use epr_common::types::{DataSourceType, SubmissionType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A data submission owned by an organisation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub submission_type: SubmissionType,
    pub submission_period: String,
    pub data_source_type: DataSourceType,
    pub organisation_id: Uuid,
    pub user_id: Uuid,
    pub compliance_scheme_id: Option<Uuid>,
    pub is_submitted: bool,
    pub is_resubmission: bool,
    pub app_reference_number: Option<String>,
    pub created: DateTime<Utc>,
}

impl Submission {
    /// Marks the submission as submitted, optionally recording the
    /// application reference number issued for it.
    pub fn mark_submitted(&mut self, app_reference_number: Option<String>) {
        self.is_submitted = true;
        if app_reference_number.is_some() {
            self.app_reference_number = app_reference_number;
        }
    }

    /// Whether the submission is visible to the given organisation
    pub fn belongs_to(&self, organisation_id: Uuid) -> bool {
        self.organisation_id == organisation_id
    }
}
