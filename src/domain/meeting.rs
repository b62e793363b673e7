use crate::domain::commission::Commission;
use crate::domain::ids::{MeetingId, SessionId, StudentId, TeacherId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Presence outcome for one person at one meeting.
///
/// `Late` and `Excused` still count as "showed up" for commission purposes;
/// only `Absent` does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn is_present_equivalent(&self) -> bool {
        !matches!(self, Self::Absent)
    }
}

/// Who actually taught a meeting.
///
/// Substitution structurally requires a substitute id, so "substituted but
/// nobody named" is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaughtBy {
    Assigned {
        teacher: TeacherId,
    },
    Substitute {
        assigned: TeacherId,
        substitute: TeacherId,
        notes: Option<String>,
    },
}

impl TaughtBy {
    /// The teacher who stood in front of the class.
    pub fn actual_teacher(&self) -> TeacherId {
        match self {
            Self::Assigned { teacher } => *teacher,
            Self::Substitute { substitute, .. } => *substitute,
        }
    }

    pub fn is_substitution(&self) -> bool {
        matches!(self, Self::Substitute { .. })
    }
}

/// One closed occurrence of a class session.
///
/// Meetings are created closed and are immutable afterwards: the commission
/// amount and breakdown recorded here never change, even if the session's
/// policy is edited later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: MeetingId,
    pub session: SessionId,
    /// 1-based, contiguous within the session.
    pub sequence: u32,
    pub date: NaiveDate,
    pub topic: String,
    pub taught_by: TaughtBy,
    pub commission: Commission,
    pub notes: Option<String>,
}

/// One student's presence fact at one meeting. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub meeting: MeetingId,
    pub student: StudentId,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeacherRole {
    Assigned,
    Substitute,
}

/// Mirrors `AttendanceRecord` for the instructor side. One row when the
/// assigned teacher taught, two rows when a substitution occurred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherPresenceRecord {
    pub meeting: MeetingId,
    pub teacher: TeacherId,
    pub role: TeacherRole,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
