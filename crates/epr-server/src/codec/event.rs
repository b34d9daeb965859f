use epr_common::types::EventType;
use serde::{Deserialize, Serialize};
use serde_json::{from_value, Value};

use super::validation::check_issue_types;
use super::{peek_discriminator, DecodeError};
use crate::models::{
    AntivirusCheck, AntivirusResult, ApplicationSubmitted, CheckSplitterDetails, FeePayment,
    FileDownloadCheck, NoDetails, PackagingResubmissionApplicationSubmitted,
    PackagingResubmissionFeePayment, ProducerValidationDetails, RegistrationValidationDetails,
    ErrorSeverity, RegulatorPoMDecision, RegulatorRegistrationDecision, Submitted,
    ValidationError, ValidationWarning, WarningSeverity,
};

/// Body of a validation event as posted by the validators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationPayload<D> {
    #[serde(default)]
    pub blob_name: String,
    #[serde(default)]
    pub blob_container_name: Option<String>,
    #[serde(default)]
    pub error_count: Option<i32>,
    #[serde(default)]
    pub warning_count: Option<i32>,
    #[serde(default)]
    pub errors: Option<Vec<ValidationError>>,
    #[serde(default)]
    pub warnings: Option<Vec<ValidationWarning>>,
    #[serde(flatten)]
    pub details: D,
}

/// A decoded event-creation payload
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum EventPayload {
    AntivirusCheck(AntivirusCheck),
    CheckSplitter(ValidationPayload<CheckSplitterDetails>),
    ProducerValidation(ValidationPayload<ProducerValidationDetails>),
    Submitted(Submitted),
    AntivirusResult(AntivirusResult),
    RegistrationValidation(ValidationPayload<RegistrationValidationDetails>),
    RegulatorPoMDecision(RegulatorPoMDecision),
    BrandValidation(ValidationPayload<NoDetails>),
    PartnerValidation(ValidationPayload<NoDetails>),
    RegulatorRegistrationDecision(RegulatorRegistrationDecision),
    FileDownloadCheck(FileDownloadCheck),
    RegistrationFeePayment(FeePayment),
    RegistrationApplicationSubmitted(ApplicationSubmitted),
    PackagingResubmissionFeePayment(PackagingResubmissionFeePayment),
    PackagingResubmissionApplicationSubmitted(PackagingResubmissionApplicationSubmitted),
}

impl EventPayload {
    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::AntivirusCheck(_) => EventType::AntivirusCheck,
            EventPayload::CheckSplitter(_) => EventType::CheckSplitter,
            EventPayload::ProducerValidation(_) => EventType::ProducerValidation,
            EventPayload::Submitted(_) => EventType::Submitted,
            EventPayload::AntivirusResult(_) => EventType::AntivirusResult,
            EventPayload::RegistrationValidation(_) => EventType::RegistrationValidation,
            EventPayload::RegulatorPoMDecision(_) => EventType::RegulatorPoMDecision,
            EventPayload::BrandValidation(_) => EventType::BrandValidation,
            EventPayload::PartnerValidation(_) => EventType::PartnerValidation,
            EventPayload::RegulatorRegistrationDecision(_) => {
                EventType::RegulatorRegistrationDecision
            },
            EventPayload::FileDownloadCheck(_) => EventType::FileDownloadCheck,
            EventPayload::RegistrationFeePayment(_) => EventType::RegistrationFeePayment,
            EventPayload::RegistrationApplicationSubmitted(_) => {
                EventType::RegistrationApplicationSubmitted
            },
            EventPayload::PackagingResubmissionFeePayment(_) => {
                EventType::PackagingResubmissionFeePayment
            },
            EventPayload::PackagingResubmissionApplicationSubmitted(_) => {
                EventType::PackagingResubmissionApplicationSubmitted
            },
        }
    }
}

/// Decodes an event-creation body into the shape its `type` field selects
pub fn decode_event(body: Value) -> Result<EventPayload, DecodeError> {
    let object = body.as_object().ok_or(DecodeError::NotAnObject)?;
    let event_type: EventType = peek_discriminator(object, "type", "event type")?;
    if event_type.is_validation() {
        check_issue_types::<ErrorSeverity>(object, "errors")?;
        check_issue_types::<WarningSeverity>(object, "warnings")?;
    }

    Ok(match event_type {
        EventType::AntivirusCheck => EventPayload::AntivirusCheck(from_value(body)?),
        EventType::CheckSplitter => EventPayload::CheckSplitter(from_value(body)?),
        EventType::ProducerValidation => EventPayload::ProducerValidation(from_value(body)?),
        EventType::Submitted => EventPayload::Submitted(from_value(body)?),
        EventType::AntivirusResult => EventPayload::AntivirusResult(from_value(body)?),
        EventType::RegistrationValidation => {
            EventPayload::RegistrationValidation(from_value(body)?)
        },
        EventType::RegulatorPoMDecision => EventPayload::RegulatorPoMDecision(from_value(body)?),
        EventType::BrandValidation => EventPayload::BrandValidation(from_value(body)?),
        EventType::PartnerValidation => EventPayload::PartnerValidation(from_value(body)?),
        EventType::RegulatorRegistrationDecision => {
            EventPayload::RegulatorRegistrationDecision(from_value(body)?)
        },
        EventType::FileDownloadCheck => EventPayload::FileDownloadCheck(from_value(body)?),
        EventType::RegistrationFeePayment => {
            EventPayload::RegistrationFeePayment(from_value(body)?)
        },
        EventType::RegistrationApplicationSubmitted => {
            EventPayload::RegistrationApplicationSubmitted(from_value(body)?)
        },
        EventType::PackagingResubmissionFeePayment => {
            EventPayload::PackagingResubmissionFeePayment(from_value(body)?)
        },
        EventType::PackagingResubmissionApplicationSubmitted => {
            EventPayload::PackagingResubmissionApplicationSubmitted(from_value(body)?)
        },
    })
}
