//! Column names and the [`Entity`] mapping of each model

use super::{Entity, Value};
use crate::models::{IssueSeverity, Submission, SubmissionEvent, ValidationIssue};

/// Column names shared by predicates, ordering and SQL
pub mod col {
    pub const ID: &str = "id";
    pub const CREATED: &str = "created";
    pub const USER_ID: &str = "user_id";
    pub const DATA: &str = "data";

    pub const SUBMISSION_TYPE: &str = "submission_type";
    pub const SUBMISSION_PERIOD: &str = "submission_period";
    pub const DATA_SOURCE_TYPE: &str = "data_source_type";
    pub const ORGANISATION_ID: &str = "organisation_id";
    pub const COMPLIANCE_SCHEME_ID: &str = "compliance_scheme_id";
    pub const IS_SUBMITTED: &str = "is_submitted";
    pub const IS_RESUBMISSION: &str = "is_resubmission";
    pub const APP_REFERENCE_NUMBER: &str = "app_reference_number";

    pub const SUBMISSION_ID: &str = "submission_id";
    pub const EVENT_TYPE: &str = "type";
    pub const FILE_ID: &str = "file_id";
    pub const FILE_TYPE: &str = "file_type";
    pub const FILE_NAME: &str = "file_name";
    pub const BLOB_NAME: &str = "blob_name";
    pub const REGISTRATION_SET_ID: &str = "registration_set_id";

    pub const VALIDATION_EVENT_ID: &str = "validation_event_id";
    pub const VALIDATION_TYPE: &str = "validation_type";
    pub const ROW_NUMBER: &str = "row_number";
}

impl Entity for Submission {
    const TABLE: &'static str = "submissions";

    fn id(&self) -> uuid::Uuid {
        self.id
    }

    fn column(&self, name: &str) -> Value {
        match name {
            col::ID => self.id.into(),
            col::SUBMISSION_TYPE => self.submission_type.value().into(),
            col::SUBMISSION_PERIOD => self.submission_period.as_str().into(),
            col::DATA_SOURCE_TYPE => self.data_source_type.value().into(),
            col::ORGANISATION_ID => self.organisation_id.into(),
            col::USER_ID => self.user_id.into(),
            col::COMPLIANCE_SCHEME_ID => self.compliance_scheme_id.into(),
            col::IS_SUBMITTED => self.is_submitted.into(),
            col::IS_RESUBMISSION => self.is_resubmission.into(),
            col::APP_REFERENCE_NUMBER => self.app_reference_number.clone().into(),
            col::CREATED => self.created.into(),
            _ => Value::Null,
        }
    }
}

impl Entity for SubmissionEvent {
    const TABLE: &'static str = "submission_events";

    fn id(&self) -> uuid::Uuid {
        self.id
    }

    fn column(&self, name: &str) -> Value {
        match name {
            col::ID => self.id.into(),
            col::SUBMISSION_ID => self.submission_id.into(),
            col::USER_ID => self.user_id.into(),
            col::CREATED => self.created.into(),
            col::EVENT_TYPE => self.event_type().value().into(),
            col::FILE_ID => self.kind.file_id().into(),
            col::FILE_TYPE => self.kind.file_type().map(|t| t.value()).into(),
            col::FILE_NAME => self.kind.file_name().into(),
            col::BLOB_NAME => self.kind.blob_name().into(),
            col::REGISTRATION_SET_ID => self.kind.registration_set_id().into(),
            col::DATA => self.kind.to_data().map_or(Value::Null, Value::Json),
            _ => Value::Null,
        }
    }
}

impl<S: IssueSeverity> Entity for ValidationIssue<S> {
    const TABLE: &'static str = S::TABLE;

    fn id(&self) -> uuid::Uuid {
        self.id
    }

    fn column(&self, name: &str) -> Value {
        match name {
            col::ID => self.id.into(),
            col::VALIDATION_EVENT_ID => self.validation_event_id.into(),
            col::BLOB_NAME => self.blob_name.as_str().into(),
            col::VALIDATION_TYPE => self.validation_type().value().into(),
            col::ROW_NUMBER => self.row_number.into(),
            col::CREATED => self.created.into(),
            col::DATA => self.to_data().map_or(Value::Null, Value::Json),
            _ => Value::Null,
        }
    }
}
