//! Submission status derived from the submission's event history
//!
//! Producer submissions report on their latest packaging (PoM) upload;
//! registration submissions on their latest company details upload plus the
//! brands and partnerships files of the same registration set. Other types
//! carry no derived status.

use chrono::{DateTime, Utc};
use epr_common::types::{
    AntivirusScanResult, DataSourceType, EventType, FileType, SubmissionType,
};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{
    AntivirusCheck, AntivirusResult, EventKind, FeePayment, Submission, SubmissionEvent,
    Submitted, ValidationSummary,
};

/// Fields every submission response carries
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSummary {
    pub id: Uuid,
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

impl From<&Submission> for SubmissionSummary {
    fn from(submission: &Submission) -> Self {
        Self {
            id: submission.id,
            submission_period: submission.submission_period.clone(),
            data_source_type: submission.data_source_type,
            organisation_id: submission.organisation_id,
            user_id: submission.user_id,
            compliance_scheme_id: submission.compliance_scheme_id,
            is_submitted: submission.is_submitted,
            is_resubmission: submission.is_resubmission,
            app_reference_number: submission.app_reference_number.clone(),
            created: submission.created,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "submissionType")]
pub enum SubmissionResponse {
    Producer(PomSubmissionResponse),
    Registration(RegistrationSubmissionResponse),
    Subsidiary(SubmissionSummary),
    CompaniesHouse(SubmissionSummary),
    Accreditation(SubmissionSummary),
}

impl SubmissionResponse {
    pub fn id(&self) -> Uuid {
        match self {
            SubmissionResponse::Producer(r) => r.summary.id,
            SubmissionResponse::Registration(r) => r.summary.id,
            SubmissionResponse::Subsidiary(s)
            | SubmissionResponse::CompaniesHouse(s)
            | SubmissionResponse::Accreditation(s) => s.id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFileInformation {
    pub file_id: Uuid,
    pub file_name: String,
    pub file_upload_date_time: DateTime<Utc>,
    pub uploaded_by: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedFileInformation {
    pub file_id: Uuid,
    pub file_name: Option<String>,
    pub submitted_date_time: DateTime<Utc>,
    pub submitted_by: Option<String>,
    pub submitted_by_user: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PomSubmissionResponse {
    #[serde(flatten)]
    pub summary: SubmissionSummary,
    pub pom_file_id: Option<Uuid>,
    pub pom_file_name: Option<String>,
    pub pom_file_upload_date_time: Option<DateTime<Utc>>,
    pub pom_data_complete: bool,
    pub validation_pass: bool,
    pub has_warnings: bool,
    pub errors: Vec<String>,
    pub has_valid_file: bool,
    pub last_uploaded_valid_file: Option<UploadedFileInformation>,
    pub last_submitted_file: Option<SubmittedFileInformation>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationSubmissionResponse {
    #[serde(flatten)]
    pub summary: SubmissionSummary,
    pub registration_set_id: Option<Uuid>,
    pub company_details_file_id: Option<Uuid>,
    pub company_details_file_name: Option<String>,
    pub company_details_upload_date_time: Option<DateTime<Utc>>,
    pub company_details_data_complete: bool,
    pub requires_brands_file: bool,
    pub brands_file_name: Option<String>,
    pub brands_upload_date_time: Option<DateTime<Utc>>,
    pub brands_data_complete: bool,
    pub requires_partnership_file: bool,
    pub partnerships_file_name: Option<String>,
    pub partnerships_upload_date_time: Option<DateTime<Utc>>,
    pub partnerships_data_complete: bool,
    pub organisation_member_count: Option<i32>,
    pub validation_pass: bool,
    pub has_warnings: bool,
    pub errors: Vec<String>,
    pub last_submitted_file: Option<SubmittedFileInformation>,
    pub fee_payment: Option<FeePayment>,
    pub application_reference_number: Option<String>,
}

/// Processing state of one uploaded file
#[derive(Debug, Clone, Default, PartialEq)]
struct FileStatus {
    data_complete: bool,
    validation_pass: bool,
    has_warnings: bool,
    errors: Vec<String>,
}

impl FileStatus {
    fn pending() -> Self {
        Self::default()
    }

    /// Status once every validation summary for the file is in
    fn validated<'a>(summaries: impl IntoIterator<Item = &'a ValidationSummary>) -> Self {
        let mut status = FileStatus {
            data_complete: true,
            validation_pass: true,
            ..Self::default()
        };
        for summary in summaries {
            status.validation_pass &= !summary.has_errors();
            status.has_warnings |= summary.has_warnings();
        }
        status
    }

    fn rejected(result: &AntivirusResult) -> Self {
        FileStatus {
            data_complete: true,
            validation_pass: false,
            has_warnings: false,
            errors: result.errors.clone(),
        }
    }
}

/// A submission's events, newest first
struct Timeline<'a> {
    events: Vec<&'a SubmissionEvent>,
}

impl<'a> Timeline<'a> {
    fn new(events: &'a [SubmissionEvent]) -> Self {
        let mut events: Vec<_> = events.iter().collect();
        events.sort_by(|a, b| b.created.cmp(&a.created));
        Self { events }
    }

    fn checks(
        &self,
        file_type: FileType,
    ) -> impl Iterator<Item = (&'a SubmissionEvent, &'a AntivirusCheck)> + '_ {
        self.events.iter().copied().filter_map(move |event| match &event.kind {
            EventKind::AntivirusCheck(check) if check.file_type == file_type => {
                Some((event, check))
            },
            _ => None,
        })
    }

    fn latest_check(&self, file_type: FileType) -> Option<(&'a SubmissionEvent, &'a AntivirusCheck)> {
        self.checks(file_type).next()
    }

    /// Latest check of `file_type` in the registration set, or the latest of
    /// that type overall when no set is known
    fn latest_in_set(
        &self,
        file_type: FileType,
        registration_set_id: Option<Uuid>,
    ) -> Option<(&'a SubmissionEvent, &'a AntivirusCheck)> {
        self.checks(file_type).find(|(_, check)| {
            registration_set_id.is_none() || check.registration_set_id == registration_set_id
        })
    }

    fn file_name(&self, file_id: Uuid) -> Option<&'a str> {
        self.events.iter().copied().find_map(|event| match &event.kind {
            EventKind::AntivirusCheck(check) if check.file_id == file_id => {
                Some(check.file_name.as_str())
            },
            _ => None,
        })
    }

    fn result_for(&self, file_id: Uuid) -> Option<&'a AntivirusResult> {
        self.events.iter().copied().find_map(|event| match &event.kind {
            EventKind::AntivirusResult(result) if result.file_id == file_id => Some(result),
            _ => None,
        })
    }

    /// Validation summaries of one event type raised against `blob_name`
    fn validations(
        &self,
        event_type: EventType,
        blob_name: &'a str,
    ) -> impl Iterator<Item = &'a EventKind> + '_ {
        self.events
            .iter()
            .copied()
            .map(|event| &event.kind)
            .filter(move |kind| {
                kind.event_type() == event_type
                    && kind.validation().is_some_and(|v| v.blob_name == blob_name)
            })
    }

    /// Antivirus outcome of a file: `Err` carries the final status when the
    /// scan has not produced a clean blob
    fn scanned_blob(&self, file_id: Uuid) -> Result<&'a str, FileStatus> {
        let Some(result) = self.result_for(file_id) else {
            return Err(FileStatus::pending());
        };
        match result.antivirus_scan_result {
            AntivirusScanResult::Success => {},
            AntivirusScanResult::AwaitingProcessing => return Err(FileStatus::pending()),
            AntivirusScanResult::Quarantined | AntivirusScanResult::FailedToVirusScan => {
                return Err(FileStatus::rejected(result))
            },
        }
        result.blob_name.as_deref().ok_or_else(FileStatus::pending)
    }

    /// Producer data is complete once every split part has been validated, or
    /// as soon as the splitter itself reported errors
    fn pom_status(&self, check: &AntivirusCheck) -> FileStatus {
        let blob_name = match self.scanned_blob(check.file_id) {
            Ok(blob_name) => blob_name,
            Err(status) => return status,
        };

        let Some(EventKind::CheckSplitter(splitter)) =
            self.validations(EventType::CheckSplitter, blob_name).next()
        else {
            return FileStatus::pending();
        };

        let producers: Vec<&ValidationSummary> = self
            .validations(EventType::ProducerValidation, blob_name)
            .filter_map(EventKind::validation)
            .collect();
        let expected = usize::try_from(splitter.details.data_count).unwrap_or(0);

        if !splitter.summary.has_errors() && producers.len() < expected {
            return FileStatus::pending();
        }
        FileStatus::validated(std::iter::once(&splitter.summary).chain(producers))
    }

    /// Status of a file validated by a single event of `event_type`
    fn single_validation_status(&self, check: &AntivirusCheck, event_type: EventType) -> FileStatus {
        let blob_name = match self.scanned_blob(check.file_id) {
            Ok(blob_name) => blob_name,
            Err(status) => return status,
        };
        match self
            .validations(event_type, blob_name)
            .next()
            .and_then(EventKind::validation)
        {
            Some(summary) => FileStatus::validated([summary]),
            None => FileStatus::pending(),
        }
    }

    fn last_submitted(&self) -> Option<SubmittedFileInformation> {
        self.events.iter().find_map(|event| match &event.kind {
            EventKind::Submitted(Submitted {
                file_id,
                submitted_by,
            }) => Some(SubmittedFileInformation {
                file_id: *file_id,
                file_name: self.file_name(*file_id).map(str::to_string),
                submitted_date_time: event.created,
                submitted_by: submitted_by.clone(),
                submitted_by_user: event.user_id,
            }),
            _ => None,
        })
    }
}

/// Builds the response for `submission` from all of its events
pub fn enrich(submission: &Submission, events: &[SubmissionEvent]) -> SubmissionResponse {
    let summary = SubmissionSummary::from(submission);
    let timeline = Timeline::new(events);

    match submission.submission_type {
        SubmissionType::Producer => SubmissionResponse::Producer(producer(summary, &timeline)),
        SubmissionType::Registration => {
            SubmissionResponse::Registration(registration(summary, &timeline))
        },
        SubmissionType::Subsidiary => SubmissionResponse::Subsidiary(summary),
        SubmissionType::CompaniesHouse => SubmissionResponse::CompaniesHouse(summary),
        SubmissionType::Accreditation => SubmissionResponse::Accreditation(summary),
    }
}

fn producer(summary: SubmissionSummary, timeline: &Timeline<'_>) -> PomSubmissionResponse {
    let latest = timeline.latest_check(FileType::Pom);
    let status = latest
        .map(|(_, check)| timeline.pom_status(check))
        .unwrap_or_default();

    let last_uploaded_valid_file = timeline
        .checks(FileType::Pom)
        .find(|(_, check)| timeline.pom_status(check).validation_pass)
        .map(|(event, check)| UploadedFileInformation {
            file_id: check.file_id,
            file_name: check.file_name.clone(),
            file_upload_date_time: event.created,
            uploaded_by: event.user_id,
        });

    PomSubmissionResponse {
        summary,
        pom_file_id: latest.map(|(_, check)| check.file_id),
        pom_file_name: latest.map(|(_, check)| check.file_name.clone()),
        pom_file_upload_date_time: latest.map(|(event, _)| event.created),
        pom_data_complete: status.data_complete,
        validation_pass: status.validation_pass,
        has_warnings: status.has_warnings,
        errors: status.errors,
        has_valid_file: last_uploaded_valid_file.is_some(),
        last_uploaded_valid_file,
        last_submitted_file: timeline.last_submitted(),
    }
}

fn registration(
    summary: SubmissionSummary,
    timeline: &Timeline<'_>,
) -> RegistrationSubmissionResponse {
    let company = timeline.latest_check(FileType::CompanyDetails);
    let registration_set_id = company.and_then(|(_, check)| check.registration_set_id);

    let company_status = company
        .map(|(_, check)| {
            timeline.single_validation_status(check, EventType::RegistrationValidation)
        })
        .unwrap_or_default();

    let details = company
        .and_then(|(_, check)| timeline.scanned_blob(check.file_id).ok())
        .and_then(|blob_name| {
            timeline
                .validations(EventType::RegistrationValidation, blob_name)
                .find_map(|kind| match kind {
                    EventKind::RegistrationValidation(event) => Some(&event.details),
                    _ => None,
                })
        });
    let requires_brands_file = details.is_some_and(|d| d.requires_brands_file);
    let requires_partnership_file = details.is_some_and(|d| d.requires_partnership_file);

    let brands = timeline.latest_in_set(FileType::Brands, registration_set_id);
    let partnerships = timeline.latest_in_set(FileType::Partnerships, registration_set_id);

    let optional_status = |required: bool,
                           upload: Option<(&SubmissionEvent, &AntivirusCheck)>,
                           event_type: EventType| {
        match (required, upload) {
            (false, _) => FileStatus {
                data_complete: true,
                validation_pass: true,
                ..FileStatus::default()
            },
            (true, None) => FileStatus::pending(),
            (true, Some((_, check))) => timeline.single_validation_status(check, event_type),
        }
    };
    let brands_status =
        optional_status(requires_brands_file, brands, EventType::BrandValidation);
    let partnerships_status = optional_status(
        requires_partnership_file,
        partnerships,
        EventType::PartnerValidation,
    );

    let statuses = [&company_status, &brands_status, &partnerships_status];
    let validation_pass = statuses
        .iter()
        .all(|s| s.data_complete && s.validation_pass);
    let has_warnings = statuses.iter().any(|s| s.has_warnings);
    let errors = statuses
        .iter()
        .flat_map(|s| s.errors.iter().cloned())
        .collect();

    let fee_payment = timeline.events.iter().find_map(|event| match &event.kind {
        EventKind::RegistrationFeePayment(payment) => Some(payment.clone()),
        _ => None,
    });
    let application_reference_number = timeline.events.iter().find_map(|event| match &event.kind {
        EventKind::RegistrationApplicationSubmitted(application) => {
            application.application_reference_number.clone()
        },
        _ => None,
    });

    RegistrationSubmissionResponse {
        summary,
        registration_set_id,
        company_details_file_id: company.map(|(_, check)| check.file_id),
        company_details_file_name: company.map(|(_, check)| check.file_name.clone()),
        company_details_upload_date_time: company.map(|(event, _)| event.created),
        company_details_data_complete: company_status.data_complete,
        requires_brands_file,
        brands_file_name: brands.map(|(_, check)| check.file_name.clone()),
        brands_upload_date_time: brands.map(|(event, _)| event.created),
        brands_data_complete: brands_status.data_complete,
        requires_partnership_file,
        partnerships_file_name: partnerships.map(|(_, check)| check.file_name.clone()),
        partnerships_upload_date_time: partnerships.map(|(event, _)| event.created),
        partnerships_data_complete: partnerships_status.data_complete,
        organisation_member_count: details.and_then(|d| d.organisation_member_count),
        validation_pass,
        has_warnings,
        errors,
        last_submitted_file: timeline.last_submitted(),
        fee_payment,
        application_reference_number,
    }
}
