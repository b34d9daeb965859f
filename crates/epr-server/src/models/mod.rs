//! Entity model
//!
//! Submissions own their events; validation events own their errors and
//! warnings. Every polymorphic record carries a persisted discriminator that
//! is derived from its variant and never set independently.

pub mod event;
pub mod submission;
pub mod validation;

pub use event::{
    AntivirusCheck, AntivirusResult, ApplicationSubmitted, CheckSplitterDetails, EventKind,
    FeePayment, FileDownloadCheck, NoDetails, PackagingResubmissionApplicationSubmitted,
    PackagingResubmissionFeePayment, ProducerValidationDetails, RegistrationValidationDetails,
    RegulatorPoMDecision, RegulatorRegistrationDecision, Submitted, SubmissionEvent,
    ValidationEvent, ValidationSummary,
};
pub use submission::Submission;
pub use validation::{
    ColumnValidationError, ErrorSeverity, IssueDetail, IssueSeverity, ProducerIssue,
    RegistrationIssue, ValidationError, ValidationIssue, ValidationWarning, WarningSeverity,
};
