//! Validation errors and warnings
//!
//! Errors and warnings share one shape and differ only in where they are
//! stored and which field carries their discriminator on the wire. The
//! [`IssueSeverity`] marker captures that difference at the type level so the
//! storage, codec and query code is written once.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use epr_common::types::ValidationType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marker distinguishing validation errors from warnings
pub trait IssueSeverity: Debug + Clone + Copy + PartialEq + Send + Sync + 'static {
    /// Backing table
    const TABLE: &'static str;
    /// Name of the discriminator field in request and response payloads
    const TYPE_FIELD: &'static str;
    /// Human-readable label used in logs
    const LABEL: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorSeverity;

impl IssueSeverity for ErrorSeverity {
    const TABLE: &'static str = "validation_errors";
    const TYPE_FIELD: &'static str = "validationErrorType";
    const LABEL: &'static str = "error";
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarningSeverity;

impl IssueSeverity for WarningSeverity {
    const TABLE: &'static str = "validation_warnings";
    const TYPE_FIELD: &'static str = "validationWarningType";
    const LABEL: &'static str = "warning";
}

/// A problem found in one row of an uploaded file
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue<S: IssueSeverity> {
    pub id: Uuid,
    pub validation_event_id: Uuid,
    pub blob_name: String,
    pub row_number: i32,
    pub error_codes: Vec<String>,
    pub created: DateTime<Utc>,
    pub detail: IssueDetail,
    severity: PhantomData<S>,
}

pub type ValidationError = ValidationIssue<ErrorSeverity>;
pub type ValidationWarning = ValidationIssue<WarningSeverity>;

impl<S: IssueSeverity> ValidationIssue<S> {
    pub fn new(
        validation_event_id: Uuid,
        blob_name: String,
        row_number: i32,
        error_codes: Vec<String>,
        detail: IssueDetail,
    ) -> Self {
        Self::restore(
            Uuid::new_v4(),
            validation_event_id,
            blob_name,
            row_number,
            error_codes,
            Utc::now(),
            detail,
        )
    }

    /// Rebuilds an issue read back from storage
    pub fn restore(
        id: Uuid,
        validation_event_id: Uuid,
        blob_name: String,
        row_number: i32,
        error_codes: Vec<String>,
        created: DateTime<Utc>,
        detail: IssueDetail,
    ) -> Self {
        Self {
            id,
            validation_event_id,
            blob_name,
            row_number,
            error_codes,
            created,
            detail,
            severity: PhantomData,
        }
    }

    pub fn validation_type(&self) -> ValidationType {
        self.detail.validation_type()
    }

    /// Stored payload: the variant fields plus the error codes
    pub fn to_data(&self) -> Result<serde_json::Value, serde_json::Error> {
        let mut data = self.detail.to_data()?;
        if let serde_json::Value::Object(map) = &mut data {
            map.insert("errorCodes".to_string(), serde_json::to_value(&self.error_codes)?);
        }
        Ok(data)
    }

    /// Splits a stored payload back into error codes and variant detail
    pub fn split_data(
        validation_type: ValidationType,
        mut data: serde_json::Value,
    ) -> Result<(Vec<String>, IssueDetail), serde_json::Error> {
        let error_codes = match data.as_object_mut().and_then(|m| m.remove("errorCodes")) {
            Some(codes) => serde_json::from_value(codes)?,
            None => Vec::new(),
        };
        Ok((error_codes, IssueDetail::from_data(validation_type, data)?))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IssueView<'a> {
    id: Uuid,
    validation_event_id: Uuid,
    blob_name: &'a str,
    row_number: i32,
    error_codes: &'a [String],
    created: DateTime<Utc>,
    #[serde(flatten)]
    discriminator: BTreeMap<&'static str, ValidationType>,
    #[serde(flatten)]
    detail: &'a IssueDetail,
}

impl<S: IssueSeverity> Serialize for ValidationIssue<S> {
    fn serialize<Ser: serde::Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        IssueView {
            id: self.id,
            validation_event_id: self.validation_event_id,
            blob_name: &self.blob_name,
            row_number: self.row_number,
            error_codes: &self.error_codes,
            created: self.created,
            discriminator: BTreeMap::from([(S::TYPE_FIELD, self.validation_type())]),
            detail: &self.detail,
        }
        .serialize(serializer)
    }
}

/// Variant fields of a validation issue
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IssueDetail {
    Producer(ProducerIssue),
    Registration(RegistrationIssue),
    CheckSplitter,
}

impl IssueDetail {
    pub fn validation_type(&self) -> ValidationType {
        match self {
            IssueDetail::Producer(_) => ValidationType::Producer,
            IssueDetail::Registration(_) => ValidationType::Registration,
            IssueDetail::CheckSplitter => ValidationType::CheckSplitter,
        }
    }

    fn to_data(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            IssueDetail::Producer(p) => serde_json::to_value(p),
            IssueDetail::Registration(r) => serde_json::to_value(r),
            IssueDetail::CheckSplitter => Ok(serde_json::Value::Object(Default::default())),
        }
    }

    fn from_data(
        validation_type: ValidationType,
        data: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match validation_type {
            ValidationType::Producer => IssueDetail::Producer(serde_json::from_value(data)?),
            ValidationType::Registration => {
                IssueDetail::Registration(serde_json::from_value(data)?)
            },
            ValidationType::CheckSplitter => IssueDetail::CheckSplitter,
        })
    }
}

/// Row-level problem in a packaging (POM) file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProducerIssue {
    pub producer_id: Option<String>,
    pub subsidiary_id: Option<String>,
    pub producer_type: Option<String>,
    pub data_submission_period: Option<String>,
    pub producer_size: Option<String>,
    pub waste_type: Option<String>,
    pub packaging_category: Option<String>,
    pub material_type: Option<String>,
    pub material_sub_type: Option<String>,
    pub from_home_nation: Option<String>,
    pub to_home_nation: Option<String>,
    pub quantity_kg: Option<String>,
    pub quantity_units: Option<String>,
    pub transitional_packaging_units: Option<String>,
    pub recyclability_rating: Option<String>,
}

/// Row-level problem in a registration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationIssue {
    pub organisation_id: Option<String>,
    pub subsidiary_id: Option<String>,
    pub column_errors: Vec<ColumnValidationError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnValidationError {
    pub error_code: String,
    #[serde(default)]
    pub column_index: Option<i32>,
    #[serde(default)]
    pub column_name: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn registration_issue() -> ValidationWarning {
        ValidationIssue::new(
            Uuid::new_v4(),
            "blob-1".to_string(),
            3,
            vec!["801".to_string()],
            IssueDetail::Registration(RegistrationIssue {
                organisation_id: Some("100".to_string()),
                subsidiary_id: None,
                column_errors: vec![ColumnValidationError {
                    error_code: "801".to_string(),
                    column_index: Some(2),
                    column_name: "trading_name".to_string(),
                }],
            }),
        )
    }

    #[test]
    fn test_response_carries_severity_discriminator() {
        let json = serde_json::to_value(registration_issue()).unwrap();
        assert_eq!(json["validationWarningType"], "Registration");
        assert!(json.get("validationErrorType").is_none());
        assert_eq!(json["rowNumber"], 3);
        assert_eq!(json["columnErrors"][0]["columnName"], "trading_name");
    }

    #[test]
    fn test_check_splitter_issue_serializes_without_detail() {
        let issue: ValidationError = ValidationIssue::new(
            Uuid::new_v4(),
            "blob".to_string(),
            0,
            vec!["99".to_string()],
            IssueDetail::CheckSplitter,
        );
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["validationErrorType"], "CheckSplitter");
        assert_eq!(json["errorCodes"][0], "99");
    }

    #[test]
    fn test_stored_payload_keeps_error_codes() {
        let issue = registration_issue();
        let data = issue.to_data().unwrap();
        let (codes, detail) =
            ValidationWarning::split_data(ValidationType::Registration, data).unwrap();
        assert_eq!(codes, issue.error_codes);
        assert_eq!(detail, issue.detail);
    }
}
