use crate::domain::ids::{
    EnrollmentId, MeetingId, PaymentId, SessionId, StudentId, TeacherId, TransactionId,
};
use crate::domain::payment::{Payment, PaymentTransaction};
use crate::domain::ports::{
    MeetingCommit, MeetingStore, PaymentCommit, PaymentStore, RecordedMeeting, RosterStore,
    SessionStore,
};
use crate::domain::roster::{Enrollment, Student};
use crate::domain::session::ClassSession;
use crate::error::{CoreError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    sessions: HashMap<SessionId, ClassSession>,
    meetings: HashMap<MeetingId, RecordedMeeting>,
    students: HashMap<StudentId, Student>,
    enrollments: HashMap<EnrollmentId, Enrollment>,
    payments: HashMap<PaymentId, Payment>,
    transactions: HashMap<TransactionId, PaymentTransaction>,
}

/// A thread-safe in-memory store backing every port.
///
/// One `RwLock` guards the whole state on purpose: a `commit` holds the
/// write guard across all of its writes, so readers and racing writers see
/// either none of a commit or all of it. `Clone` shares the underlying
/// state.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn stale_session(id: SessionId) -> CoreError {
    CoreError::conflict(format!("session {id} was modified by a concurrent writer"))
}

fn sort_newest_first(records: &mut [RecordedMeeting]) {
    records.sort_by(|a, b| {
        b.meeting
            .date
            .cmp(&a.meeting.date)
            .then(b.meeting.sequence.cmp(&a.meeting.sequence))
    });
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn insert(&self, session: ClassSession) -> Result<()> {
        let mut state = self.state.write().await;
        state.sessions.insert(session.id, session);
        Ok(())
    }

    async fn get(&self, id: SessionId) -> Result<Option<ClassSession>> {
        let state = self.state.read().await;
        Ok(state.sessions.get(&id).cloned())
    }

    async fn update(&self, session: ClassSession, expected_version: u64) -> Result<()> {
        let mut state = self.state.write().await;
        let current = state
            .sessions
            .get(&session.id)
            .ok_or_else(|| CoreError::not_found("session", session.id))?;
        if current.version != expected_version {
            return Err(stale_session(session.id));
        }
        state.sessions.insert(session.id, session);
        Ok(())
    }
}

#[async_trait]
impl MeetingStore for InMemoryStore {
    async fn commit(&self, commit: MeetingCommit) -> Result<()> {
        let mut state = self.state.write().await;
        let current = state
            .sessions
            .get(&commit.session.id)
            .ok_or_else(|| CoreError::not_found("session", commit.session.id))?;
        if current.version != commit.expected_version {
            return Err(stale_session(commit.session.id));
        }

        // Version verified under the write guard: every write below lands
        // together or the commit has already bailed out above.
        state.sessions.insert(commit.session.id, commit.session);
        state
            .meetings
            .insert(commit.record.meeting.id, commit.record);
        Ok(())
    }

    async fn get(&self, id: MeetingId) -> Result<Option<RecordedMeeting>> {
        let state = self.state.read().await;
        Ok(state.meetings.get(&id).cloned())
    }

    async fn for_session(&self, session: SessionId) -> Result<Vec<RecordedMeeting>> {
        let state = self.state.read().await;
        let mut records: Vec<RecordedMeeting> = state
            .meetings
            .values()
            .filter(|record| record.meeting.session == session)
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn for_teacher(&self, teacher: TeacherId) -> Result<Vec<RecordedMeeting>> {
        let state = self.state.read().await;
        let mut records: Vec<RecordedMeeting> = state
            .meetings
            .values()
            .filter(|record| record.teachers.iter().any(|row| row.teacher == teacher))
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }
}

#[async_trait]
impl RosterStore for InMemoryStore {
    async fn insert_student(&self, student: Student) -> Result<()> {
        let mut state = self.state.write().await;
        state.students.insert(student.id, student);
        Ok(())
    }

    async fn get_student(&self, id: StudentId) -> Result<Option<Student>> {
        let state = self.state.read().await;
        Ok(state.students.get(&id).cloned())
    }

    async fn update_student(&self, student: Student) -> Result<()> {
        let mut state = self.state.write().await;
        state.students.insert(student.id, student);
        Ok(())
    }

    async fn insert_enrollment(&self, enrollment: Enrollment) -> Result<()> {
        let mut state = self.state.write().await;
        state.enrollments.insert(enrollment.id, enrollment);
        Ok(())
    }

    async fn get_enrollment(
        &self,
        session: SessionId,
        student: StudentId,
    ) -> Result<Option<Enrollment>> {
        let state = self.state.read().await;
        Ok(state
            .enrollments
            .values()
            .find(|e| e.session == session && e.student == student)
            .cloned())
    }

    async fn enrollments_for_student(&self, student: StudentId) -> Result<Vec<Enrollment>> {
        let state = self.state.read().await;
        Ok(state
            .enrollments
            .values()
            .filter(|e| e.student == student)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PaymentStore for InMemoryStore {
    async fn insert(&self, payment: Payment) -> Result<()> {
        let mut state = self.state.write().await;
        state.payments.insert(payment.id, payment);
        Ok(())
    }

    async fn get(&self, id: PaymentId) -> Result<Option<Payment>> {
        let state = self.state.read().await;
        Ok(state.payments.get(&id).cloned())
    }

    async fn for_student(&self, student: StudentId) -> Result<Option<Payment>> {
        let state = self.state.read().await;
        Ok(state
            .payments
            .values()
            .find(|p| p.student == student)
            .cloned())
    }

    async fn get_all(&self) -> Result<Vec<Payment>> {
        let state = self.state.read().await;
        Ok(state.payments.values().cloned().collect())
    }

    async fn transactions(&self, payment: PaymentId) -> Result<Vec<PaymentTransaction>> {
        let state = self.state.read().await;
        let mut history: Vec<PaymentTransaction> = state
            .transactions
            .values()
            .filter(|tx| tx.payment == payment)
            .cloned()
            .collect();
        history.sort_by_key(|tx| tx.recorded_at);
        Ok(history)
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<PaymentTransaction>> {
        let state = self.state.read().await;
        Ok(state.transactions.get(&id).cloned())
    }

    async fn commit(&self, commit: PaymentCommit) -> Result<()> {
        let mut state = self.state.write().await;
        let current = state
            .payments
            .get(&commit.payment.id)
            .ok_or_else(|| CoreError::not_found("payment", commit.payment.id))?;
        if current.version != commit.expected_version {
            return Err(CoreError::conflict(format!(
                "payment {} was modified by a concurrent writer",
                commit.payment.id
            )));
        }

        state.payments.insert(commit.payment.id, commit.payment);
        state
            .transactions
            .insert(commit.transaction.id, commit.transaction);
        Ok(())
    }
}
