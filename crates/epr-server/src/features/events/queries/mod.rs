pub mod regulator_decisions;
pub mod submission_events;

pub use regulator_decisions::{
    GetRegulatorPoMDecisionsQuery, GetRegulatorRegistrationDecisionsQuery,
    RegulatorDecisionResponse,
};
pub use submission_events::{GetSubmissionEventsQuery, SubmissionEventsResponse};

use chrono::{DateTime, TimeZone, Utc};

/// Sync cursor used when the caller has never synced
pub fn default_last_sync_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}
