//! Decoding of validation errors and warnings nested in validation events
//!
//! The discriminator lives in `validationErrorType` for errors and in
//! `validationWarningType` for warnings. Ids and timestamps are assigned on
//! decode; the owning event id and blob name are overwritten when the event is
//! staged.

use epr_common::types::ValidationType;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use super::{field, guid, peek_discriminator, DecodeError};
use crate::models::{IssueDetail, IssueSeverity, ProducerIssue, RegistrationIssue, ValidationIssue};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueCommon {
    #[serde(default, deserialize_with = "guid::lenient")]
    validation_event_id: Uuid,
    #[serde(default)]
    blob_name: Option<String>,
    #[serde(default)]
    row_number: i32,
    #[serde(default)]
    error_codes: Vec<String>,
}

fn decode_issue<S: IssueSeverity>(value: serde_json::Value) -> Result<ValidationIssue<S>, DecodeError> {
    let object = value.as_object().ok_or(DecodeError::NotAnObject)?;
    let validation_type: ValidationType =
        peek_discriminator(object, S::TYPE_FIELD, "validation type")?;

    let detail = match validation_type {
        ValidationType::Producer => {
            IssueDetail::Producer(ProducerIssue::deserialize(&value)?)
        },
        ValidationType::Registration => {
            IssueDetail::Registration(RegistrationIssue::deserialize(&value)?)
        },
        ValidationType::CheckSplitter => IssueDetail::CheckSplitter,
    };
    let common = IssueCommon::deserialize(value)?;

    Ok(ValidationIssue::new(
        common.validation_event_id,
        common.blob_name.unwrap_or_default(),
        common.row_number,
        common.error_codes,
        detail,
    ))
}

/// Surfaces an unknown discriminator among the issues listed under `key`
///
/// Serde folds nested failures into a malformed-payload error, so unknown
/// issue types are looked up before the event body is deserialized. Shape
/// problems are left for deserialization to report.
pub(crate) fn check_issue_types<S: IssueSeverity>(
    object: &serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Result<(), DecodeError> {
    let Some(serde_json::Value::Array(issues)) = field(object, key) else {
        return Ok(());
    };

    for issue in issues.iter().filter_map(serde_json::Value::as_object) {
        let peeked = peek_discriminator::<ValidationType>(issue, S::TYPE_FIELD, "validation type");
        if let Err(err @ DecodeError::Unimplemented { .. }) = peeked {
            return Err(err);
        }
    }
    Ok(())
}

impl<'de, S: IssueSeverity> Deserialize<'de> for ValidationIssue<S> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        decode_issue(value).map_err(D::Error::custom)
    }
}
