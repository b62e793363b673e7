use crate::domain::ids::{MeetingId, PaymentId, SessionId, StudentId, TeacherId, TransactionId};
use crate::domain::meeting::{AttendanceRecord, Meeting, TeacherPresenceRecord};
use crate::domain::payment::{Payment, PaymentTransaction};
use crate::domain::roster::{Enrollment, Student};
use crate::domain::session::ClassSession;
use crate::error::Result;
use async_trait::async_trait;

/// A meeting together with its attendance and teacher-presence rows, the
/// unit both ledgers are written and read in.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RecordedMeeting {
    pub meeting: Meeting,
    pub attendance: Vec<AttendanceRecord>,
    pub teachers: Vec<TeacherPresenceRecord>,
}

/// Everything a close-meeting writes, committed as one atomic unit.
///
/// `session` already carries the advanced counter and the bumped version;
/// the store must reject the whole commit if the stored session's version
/// differs from `expected_version`.
#[derive(Debug, Clone)]
pub struct MeetingCommit {
    pub session: ClassSession,
    pub expected_version: u64,
    pub record: RecordedMeeting,
}

/// A recomputed payment header plus the transaction that produced it,
/// committed atomically under the header's version.
#[derive(Debug, Clone)]
pub struct PaymentCommit {
    pub payment: Payment,
    pub expected_version: u64,
    pub transaction: PaymentTransaction,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: ClassSession) -> Result<()>;
    async fn get(&self, id: SessionId) -> Result<Option<ClassSession>>;
    /// Versioned replace; fails with a conflict if the stored version moved.
    async fn update(&self, session: ClassSession, expected_version: u64) -> Result<()>;
}

#[async_trait]
pub trait MeetingStore: Send + Sync {
    /// Applies every write in the commit or none of them.
    async fn commit(&self, commit: MeetingCommit) -> Result<()>;
    async fn get(&self, id: MeetingId) -> Result<Option<RecordedMeeting>>;
    /// All recorded meetings of a session, date descending.
    async fn for_session(&self, session: SessionId) -> Result<Vec<RecordedMeeting>>;
    /// All recorded meetings with a presence row for this teacher, date
    /// descending.
    async fn for_teacher(&self, teacher: TeacherId) -> Result<Vec<RecordedMeeting>>;
}

#[async_trait]
pub trait RosterStore: Send + Sync {
    async fn insert_student(&self, student: Student) -> Result<()>;
    async fn get_student(&self, id: StudentId) -> Result<Option<Student>>;
    async fn update_student(&self, student: Student) -> Result<()>;
    async fn insert_enrollment(&self, enrollment: Enrollment) -> Result<()>;
    async fn get_enrollment(
        &self,
        session: SessionId,
        student: StudentId,
    ) -> Result<Option<Enrollment>>;
    async fn enrollments_for_student(&self, student: StudentId) -> Result<Vec<Enrollment>>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert(&self, payment: Payment) -> Result<()>;
    async fn get(&self, id: PaymentId) -> Result<Option<Payment>>;
    async fn for_student(&self, student: StudentId) -> Result<Option<Payment>>;
    async fn get_all(&self) -> Result<Vec<Payment>>;
    /// Full append-only history of one payment, oldest first.
    async fn transactions(&self, payment: PaymentId) -> Result<Vec<PaymentTransaction>>;
    async fn get_transaction(&self, id: TransactionId) -> Result<Option<PaymentTransaction>>;
    /// Applies the header and the new transaction or neither.
    async fn commit(&self, commit: PaymentCommit) -> Result<()>;
}

pub type SessionStoreBox = Box<dyn SessionStore>;
pub type MeetingStoreBox = Box<dyn MeetingStore>;
pub type RosterStoreBox = Box<dyn RosterStore>;
pub type PaymentStoreBox = Box<dyn PaymentStore>;
