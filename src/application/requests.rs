use crate::domain::commission::Commission;
use crate::domain::ids::{MeetingId, PaymentId, SessionId, StudentId, TeacherId};
use crate::domain::meeting::AttendanceStatus;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One student's line in a close-meeting request, as the attendance UI
/// submits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub student_id: StudentId,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Present only when someone other than the assigned teacher taught.
/// The substitute id is a required field, so a substitution without a named
/// substitute cannot be expressed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstitutionRequest {
    pub substitute_id: TeacherId,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseMeetingRequest {
    pub session_id: SessionId,
    /// The teacher scheduled to teach this meeting.
    pub teacher_id: TeacherId,
    pub teacher_present: bool,
    pub date: NaiveDate,
    #[serde(default)]
    pub topic: String,
    pub attendance: Vec<AttendanceEntry>,
    #[serde(default)]
    pub substitution: Option<SubstitutionRequest>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CloseMeetingOutcome {
    pub meeting_id: MeetingId,
    pub sequence: u32,
    pub present_count: u32,
    pub commission: Commission,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPaymentRequest {
    pub payment_id: PaymentId,
    pub amount: Decimal,
    pub method: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
    pub recorded_by: String,
}
