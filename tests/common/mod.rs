#![allow(dead_code)]

use classledger::application::billing::BillingLedger;
use classledger::application::recorder::MeetingRecorder;
use classledger::application::requests::{AttendanceEntry, CloseMeetingRequest};
use classledger::domain::commission::CommissionPolicy;
use classledger::domain::ids::{SessionId, StudentId, TeacherId};
use classledger::domain::meeting::AttendanceStatus;
use classledger::domain::money::Amount;
use classledger::domain::ports::{RosterStore, SessionStore};
use classledger::domain::roster::{CoursePlan, CourseType, Enrollment, Student};
use classledger::domain::session::ClassSession;
use classledger::infrastructure::in_memory::InMemoryStore;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub struct TestClass {
    pub store: InMemoryStore,
    pub session: SessionId,
    pub teacher: TeacherId,
    pub students: Vec<StudentId>,
}

/// A session with the given policy and `students` enrolled students.
pub async fn seeded_class(policy: CommissionPolicy, students: usize) -> TestClass {
    let store = InMemoryStore::new();
    let teacher = TeacherId::new();
    let session = ClassSession::new(SessionId::new(), "Algebra II", 8, policy)
        .with_teacher(teacher)
        .with_schedule("Mon/Wed 16:00");
    let session_id = session.id;
    store.insert(session).await.unwrap();

    let mut ids = Vec::new();
    for i in 0..students {
        let plan = CoursePlan::new(
            CourseType::Group,
            Amount::new(dec!(1000000)).unwrap(),
            Decimal::ZERO,
        )
        .unwrap();
        let student = Student::new(StudentId::new(), format!("student-{i}"), plan);
        ids.push(student.id);
        store.insert_student(student.clone()).await.unwrap();
        store
            .insert_enrollment(Enrollment::new(student.id, session_id))
            .await
            .unwrap();
    }

    TestClass {
        store,
        session: session_id,
        teacher,
        students: ids,
    }
}

pub fn recorder(store: &InMemoryStore) -> MeetingRecorder {
    MeetingRecorder::new(
        Box::new(store.clone()),
        Box::new(store.clone()),
        Box::new(store.clone()),
    )
}

pub fn billing(store: &InMemoryStore) -> BillingLedger {
    BillingLedger::new(
        Box::new(store.clone()),
        Box::new(store.clone()),
        Box::new(store.clone()),
    )
}

pub fn flat_policy(rate: Decimal) -> CommissionPolicy {
    CommissionPolicy::Flat(Amount::new(rate).unwrap())
}

pub fn per_student_policy(rate: Decimal) -> CommissionPolicy {
    CommissionPolicy::PerStudent(Amount::new(rate).unwrap())
}

pub fn close_request(
    class: &TestClass,
    date: NaiveDate,
    statuses: &[AttendanceStatus],
) -> CloseMeetingRequest {
    CloseMeetingRequest {
        session_id: class.session,
        teacher_id: class.teacher,
        teacher_present: true,
        date,
        topic: String::new(),
        attendance: class
            .students
            .iter()
            .zip(statuses)
            .map(|(id, status)| AttendanceEntry {
                student_id: *id,
                status: *status,
                notes: None,
            })
            .collect(),
        substitution: None,
        notes: None,
    }
}

pub fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}
