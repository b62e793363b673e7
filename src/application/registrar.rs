use crate::domain::commission::CommissionPolicy;
use crate::domain::ids::{PaymentId, SessionId, StudentId, TeacherId};
use crate::domain::money::Amount;
use crate::domain::payment::Payment;
use crate::domain::ports::{PaymentStoreBox, RosterStoreBox, SessionStoreBox};
use crate::domain::roster::{CoursePlan, CourseType, Enrollment, Student, StudentStatus};
use crate::domain::session::ClassSession;
use crate::error::{CoreError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct NewSession {
    /// Client-supplied id, e.g. from a replay script; generated when absent.
    #[serde(default)]
    pub id: Option<SessionId>,
    pub name: String,
    #[serde(default)]
    pub teacher_id: Option<TeacherId>,
    #[serde(default)]
    pub room: Option<String>,
    pub total_meetings: u32,
    #[serde(flatten)]
    pub policy: CommissionPolicy,
    #[serde(default)]
    pub schedule: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStudent {
    #[serde(default)]
    pub id: Option<StudentId>,
    pub name: String,
    pub course_type: CourseType,
    pub list_price: Decimal,
    #[serde(default)]
    pub discount: Decimal,
}

/// Enrollment-time record keeping around the core: sessions, students and
/// the payment ledger header that every student gets at registration.
pub struct Registrar {
    sessions: SessionStoreBox,
    roster: RosterStoreBox,
    payments: PaymentStoreBox,
}

impl Registrar {
    pub fn new(
        sessions: SessionStoreBox,
        roster: RosterStoreBox,
        payments: PaymentStoreBox,
    ) -> Self {
        Self {
            sessions,
            roster,
            payments,
        }
    }

    pub async fn create_session(&self, req: NewSession) -> Result<ClassSession> {
        if req.total_meetings == 0 {
            return Err(CoreError::validation(
                "a session needs at least one planned meeting",
            ));
        }

        let mut session = ClassSession::new(
            req.id.unwrap_or_default(),
            req.name,
            req.total_meetings,
            req.policy,
        );
        session.assigned_teacher = req.teacher_id;
        session.room = req.room;
        session.schedule = req.schedule.unwrap_or_default();

        self.sessions.insert(session.clone()).await?;
        tracing::info!(session = %session.id, name = %session.name, "session created");
        Ok(session)
    }

    /// Registers a student and opens their tuition ledger in the same call:
    /// the payment total is fixed to the plan's final price here and never
    /// changes afterwards.
    pub async fn register_student(&self, req: NewStudent) -> Result<(Student, Payment)> {
        let list_price = Amount::try_from(req.list_price)
            .map_err(|_| CoreError::validation("list price must be positive"))?;
        let plan = CoursePlan::new(req.course_type, list_price, req.discount)?;

        let student = Student::new(req.id.unwrap_or_default(), req.name, plan);
        let payment = Payment::open(student.id, student.plan.final_price);

        self.roster.insert_student(student.clone()).await?;
        self.payments.insert(payment.clone()).await?;
        tracing::info!(
            student = %student.id,
            payment = %payment.id,
            total = %payment.total,
            "student registered"
        );
        Ok((student, payment))
    }

    pub async fn enroll(&self, student_id: StudentId, session_id: SessionId) -> Result<Enrollment> {
        if self.roster.get_student(student_id).await?.is_none() {
            return Err(CoreError::not_found("student", student_id));
        }
        if self.sessions.get(session_id).await?.is_none() {
            return Err(CoreError::not_found("session", session_id));
        }
        if self
            .roster
            .get_enrollment(session_id, student_id)
            .await?
            .is_some()
        {
            return Err(CoreError::validation(format!(
                "student {student_id} is already enrolled in session {session_id}"
            )));
        }

        let enrollment = Enrollment::new(student_id, session_id);
        self.roster.insert_enrollment(enrollment.clone()).await?;
        Ok(enrollment)
    }

    pub async fn confirm_student(&self, student_id: StudentId) -> Result<Student> {
        let mut student = self
            .roster
            .get_student(student_id)
            .await?
            .ok_or_else(|| CoreError::not_found("student", student_id))?;
        student.status = StudentStatus::Confirmed;
        self.roster.update_student(student.clone()).await?;
        Ok(student)
    }

    /// The explicit finish action. Versioned like every other session write;
    /// losing a race against a concurrent close-meeting surfaces as a
    /// retriable conflict.
    pub async fn finish_session(
        &self,
        session_id: SessionId,
        date: NaiveDate,
    ) -> Result<ClassSession> {
        let session = self
            .sessions
            .get(session_id)
            .await?
            .ok_or_else(|| CoreError::not_found("session", session_id))?;

        let expected_version = session.version;
        let mut finished = session;
        finished.finish(date);
        finished.version += 1;

        self.sessions
            .update(finished.clone(), expected_version)
            .await?;
        tracing::info!(session = %session_id, %date, "session finished");
        Ok(finished)
    }

    /// Takes a session out of service without finishing it: close-meeting
    /// rejects it, but `finished_on` stays unset.
    pub async fn deactivate_session(&self, session_id: SessionId) -> Result<ClassSession> {
        let session = self
            .sessions
            .get(session_id)
            .await?
            .ok_or_else(|| CoreError::not_found("session", session_id))?;

        let expected_version = session.version;
        let mut deactivated = session;
        deactivated.active = false;
        deactivated.version += 1;

        self.sessions
            .update(deactivated.clone(), expected_version)
            .await?;
        tracing::info!(session = %session_id, "session deactivated");
        Ok(deactivated)
    }

    pub async fn payment_for_student(&self, student_id: StudentId) -> Result<Payment> {
        self.payments
            .for_student(student_id)
            .await?
            .ok_or_else(|| CoreError::not_found("payment for student", student_id))
    }
}
