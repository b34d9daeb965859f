//! Submission events
//!
//! [`SubmissionEvent`] holds the columns every event shares and an
//! [`EventKind`] with the variant payload. The event type is derived from the
//! variant, so it can never disagree with the payload it describes.

use chrono::{DateTime, Utc};
use epr_common::types::{
    AntivirusScanResult, AntivirusScanTrigger, EventType, FileType, RegulatorDecision,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A timestamped fact attached to a submission
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionEvent {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub user_id: Uuid,
    pub created: DateTime<Utc>,
    pub kind: EventKind,
}

impl SubmissionEvent {
    pub fn new(submission_id: Uuid, user_id: Uuid, kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            submission_id,
            user_id,
            created: Utc::now(),
            kind,
        }
    }

    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }
}

/// Variant payload of a submission event
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    AntivirusCheck(AntivirusCheck),
    CheckSplitter(ValidationEvent<CheckSplitterDetails>),
    ProducerValidation(ValidationEvent<ProducerValidationDetails>),
    Submitted(Submitted),
    AntivirusResult(AntivirusResult),
    RegistrationValidation(ValidationEvent<RegistrationValidationDetails>),
    RegulatorPoMDecision(RegulatorPoMDecision),
    BrandValidation(ValidationEvent<NoDetails>),
    PartnerValidation(ValidationEvent<NoDetails>),
    RegulatorRegistrationDecision(RegulatorRegistrationDecision),
    FileDownloadCheck(FileDownloadCheck),
    RegistrationFeePayment(FeePayment),
    RegistrationApplicationSubmitted(ApplicationSubmitted),
    PackagingResubmissionFeePayment(PackagingResubmissionFeePayment),
    PackagingResubmissionApplicationSubmitted(PackagingResubmissionApplicationSubmitted),
}

impl EventKind {
    pub fn event_type(&self) -> EventType {
        match self {
            EventKind::AntivirusCheck(_) => EventType::AntivirusCheck,
            EventKind::CheckSplitter(_) => EventType::CheckSplitter,
            EventKind::ProducerValidation(_) => EventType::ProducerValidation,
            EventKind::Submitted(_) => EventType::Submitted,
            EventKind::AntivirusResult(_) => EventType::AntivirusResult,
            EventKind::RegistrationValidation(_) => EventType::RegistrationValidation,
            EventKind::RegulatorPoMDecision(_) => EventType::RegulatorPoMDecision,
            EventKind::BrandValidation(_) => EventType::BrandValidation,
            EventKind::PartnerValidation(_) => EventType::PartnerValidation,
            EventKind::RegulatorRegistrationDecision(_) => EventType::RegulatorRegistrationDecision,
            EventKind::FileDownloadCheck(_) => EventType::FileDownloadCheck,
            EventKind::RegistrationFeePayment(_) => EventType::RegistrationFeePayment,
            EventKind::RegistrationApplicationSubmitted(_) => {
                EventType::RegistrationApplicationSubmitted
            },
            EventKind::PackagingResubmissionFeePayment(_) => {
                EventType::PackagingResubmissionFeePayment
            },
            EventKind::PackagingResubmissionApplicationSubmitted(_) => {
                EventType::PackagingResubmissionApplicationSubmitted
            },
        }
    }

    /// Validation summary, for the validation event variants
    pub fn validation(&self) -> Option<&ValidationSummary> {
        match self {
            EventKind::CheckSplitter(e) => Some(&e.summary),
            EventKind::ProducerValidation(e) => Some(&e.summary),
            EventKind::RegistrationValidation(e) => Some(&e.summary),
            EventKind::BrandValidation(e) | EventKind::PartnerValidation(e) => Some(&e.summary),
            _ => None,
        }
    }

    pub fn file_id(&self) -> Option<Uuid> {
        match self {
            EventKind::AntivirusCheck(e) => Some(e.file_id),
            EventKind::AntivirusResult(e) => Some(e.file_id),
            EventKind::Submitted(e) => Some(e.file_id),
            EventKind::RegulatorPoMDecision(e) => Some(e.file_id),
            EventKind::RegulatorRegistrationDecision(e) => Some(e.file_id),
            EventKind::FileDownloadCheck(e) => Some(e.file_id),
            EventKind::PackagingResubmissionFeePayment(e) => e.file_id,
            EventKind::PackagingResubmissionApplicationSubmitted(e) => e.file_id,
            _ => None,
        }
    }

    pub fn blob_name(&self) -> Option<&str> {
        match self {
            EventKind::AntivirusResult(e) => e.blob_name.as_deref(),
            EventKind::FileDownloadCheck(e) => Some(&e.blob_name),
            other => other.validation().map(|v| v.blob_name.as_str()),
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        match self {
            EventKind::AntivirusCheck(e) => Some(&e.file_name),
            EventKind::FileDownloadCheck(e) => Some(&e.file_name),
            _ => None,
        }
    }

    pub fn file_type(&self) -> Option<FileType> {
        match self {
            EventKind::AntivirusCheck(e) => Some(e.file_type),
            _ => None,
        }
    }

    pub fn registration_set_id(&self) -> Option<Uuid> {
        match self {
            EventKind::AntivirusCheck(e) => e.registration_set_id,
            _ => None,
        }
    }

    /// Serializes the variant payload for storage next to its discriminator
    pub fn to_data(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            EventKind::AntivirusCheck(e) => serde_json::to_value(e),
            EventKind::CheckSplitter(e) => serde_json::to_value(e),
            EventKind::ProducerValidation(e) => serde_json::to_value(e),
            EventKind::Submitted(e) => serde_json::to_value(e),
            EventKind::AntivirusResult(e) => serde_json::to_value(e),
            EventKind::RegistrationValidation(e) => serde_json::to_value(e),
            EventKind::RegulatorPoMDecision(e) => serde_json::to_value(e),
            EventKind::BrandValidation(e) => serde_json::to_value(e),
            EventKind::PartnerValidation(e) => serde_json::to_value(e),
            EventKind::RegulatorRegistrationDecision(e) => serde_json::to_value(e),
            EventKind::FileDownloadCheck(e) => serde_json::to_value(e),
            EventKind::RegistrationFeePayment(e) => serde_json::to_value(e),
            EventKind::RegistrationApplicationSubmitted(e) => serde_json::to_value(e),
            EventKind::PackagingResubmissionFeePayment(e) => serde_json::to_value(e),
            EventKind::PackagingResubmissionApplicationSubmitted(e) => serde_json::to_value(e),
        }
    }

    /// Rebuilds a variant from its stored discriminator and payload
    pub fn from_data(
        event_type: EventType,
        data: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        use serde_json::from_value;

        Ok(match event_type {
            EventType::AntivirusCheck => EventKind::AntivirusCheck(from_value(data)?),
            EventType::CheckSplitter => EventKind::CheckSplitter(from_value(data)?),
            EventType::ProducerValidation => EventKind::ProducerValidation(from_value(data)?),
            EventType::Submitted => EventKind::Submitted(from_value(data)?),
            EventType::AntivirusResult => EventKind::AntivirusResult(from_value(data)?),
            EventType::RegistrationValidation => {
                EventKind::RegistrationValidation(from_value(data)?)
            },
            EventType::RegulatorPoMDecision => EventKind::RegulatorPoMDecision(from_value(data)?),
            EventType::BrandValidation => EventKind::BrandValidation(from_value(data)?),
            EventType::PartnerValidation => EventKind::PartnerValidation(from_value(data)?),
            EventType::RegulatorRegistrationDecision => {
                EventKind::RegulatorRegistrationDecision(from_value(data)?)
            },
            EventType::FileDownloadCheck => EventKind::FileDownloadCheck(from_value(data)?),
            EventType::RegistrationFeePayment => {
                EventKind::RegistrationFeePayment(from_value(data)?)
            },
            EventType::RegistrationApplicationSubmitted => {
                EventKind::RegistrationApplicationSubmitted(from_value(data)?)
            },
            EventType::PackagingResubmissionFeePayment => {
                EventKind::PackagingResubmissionFeePayment(from_value(data)?)
            },
            EventType::PackagingResubmissionApplicationSubmitted => {
                EventKind::PackagingResubmissionApplicationSubmitted(from_value(data)?)
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AntivirusCheck {
    pub file_id: Uuid,
    pub file_type: FileType,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub registration_set_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AntivirusResult {
    pub file_id: Uuid,
    pub antivirus_scan_result: AntivirusScanResult,
    #[serde(default)]
    pub requires_row_validation: Option<bool>,
    #[serde(default)]
    pub blob_name: Option<String>,
    #[serde(default)]
    pub antivirus_scan_trigger: Option<AntivirusScanTrigger>,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submitted {
    pub file_id: Uuid,
    #[serde(default)]
    pub submitted_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulatorPoMDecision {
    pub decision: RegulatorDecision,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub is_resubmission_required: bool,
    pub file_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulatorRegistrationDecision {
    pub decision: RegulatorDecision,
    #[serde(default)]
    pub comments: Option<String>,
    pub file_id: Uuid,
    #[serde(default)]
    pub app_reference_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDownloadCheck {
    pub file_id: Uuid,
    pub file_name: String,
    pub blob_name: String,
    pub antivirus_scan_result: AntivirusScanResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeePayment {
    pub payment_method: String,
    pub payment_status: String,
    pub paid_amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSubmitted {
    #[serde(default)]
    pub application_reference_number: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub submission_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagingResubmissionFeePayment {
    #[serde(flatten)]
    pub payment: FeePayment,
    #[serde(default)]
    pub file_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagingResubmissionApplicationSubmitted {
    #[serde(default)]
    pub is_resubmitted: Option<bool>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub file_id: Option<Uuid>,
    #[serde(default)]
    pub submission_date: Option<DateTime<Utc>>,
}

/// Outcome shared by every validation event
///
/// `is_valid` is derived from the issue lists when the summary is built and
/// has no setter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub blob_name: String,
    #[serde(default)]
    pub blob_container_name: Option<String>,
    pub error_count: i32,
    pub warning_count: i32,
    is_valid: bool,
}

impl ValidationSummary {
    /// Builds a summary from the errors and warnings raised against a blob.
    ///
    /// The counts default to the list lengths; `reported_*` can raise them when
    /// the producer of the event recorded more issues than it shipped.
    pub fn from_issues<E, W>(
        blob_name: String,
        blob_container_name: Option<String>,
        errors: &[E],
        warnings: &[W],
        reported_error_count: Option<i32>,
        reported_warning_count: Option<i32>,
    ) -> Self {
        let listed_errors = i32::try_from(errors.len()).unwrap_or(i32::MAX);
        let listed_warnings = i32::try_from(warnings.len()).unwrap_or(i32::MAX);

        Self {
            blob_name,
            blob_container_name,
            error_count: reported_error_count.unwrap_or(0).max(listed_errors),
            warning_count: reported_warning_count.unwrap_or(0).max(listed_warnings),
            is_valid: errors.is_empty() && warnings.is_empty(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warning_count > 0
    }
}

/// A validation event: the shared summary plus variant-specific details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationEvent<D> {
    #[serde(flatten)]
    pub summary: ValidationSummary,
    #[serde(flatten)]
    pub details: D,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSplitterDetails {
    /// Number of producer validation batches the file was split into
    #[serde(default)]
    pub data_count: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducerValidationDetails {
    #[serde(default)]
    pub producer_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationValidationDetails {
    #[serde(default)]
    pub requires_brands_file: bool,
    #[serde(default)]
    pub requires_partnership_file: bool,
    #[serde(default)]
    pub organisation_member_count: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoDetails {}
