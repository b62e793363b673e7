use crate::domain::ids::{
    MeetingId, PaymentId, SessionId, StudentId, TeacherId, TransactionId,
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
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const CF_SESSIONS: &str = "sessions";
pub const CF_MEETINGS: &str = "meetings";
pub const CF_STUDENTS: &str = "students";
pub const CF_ENROLLMENTS: &str = "enrollments";
pub const CF_PAYMENTS: &str = "payments";
pub const CF_TRANSACTIONS: &str = "payment_transactions";

/// A persistent store implementation using RocksDB.
///
/// Each entity lives in its own column family, serialized as JSON. Versioned
/// commits serialize their check-then-write cycle behind `commit_lock` and
/// land all writes in one `WriteBatch`, so a commit is atomic on disk.
///
/// `Clone` shares the underlying `Arc<DB>` and the commit lock.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    commit_lock: Arc<Mutex<()>>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// all required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [
            CF_SESSIONS,
            CF_MEETINGS,
            CF_STUDENTS,
            CF_ENROLLMENTS,
            CF_PAYMENTS,
            CF_TRANSACTIONS,
        ]
        .into_iter()
        .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
        .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors).map_err(CoreError::storage)?;

        Ok(Self {
            db: Arc::new(db),
            commit_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &'static str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| CoreError::storage(std::io::Error::other(format!(
                "column family {name} not found"
            ))))
    }

    fn put<T: Serialize>(&self, cf: &'static str, key: &[u8], value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.db
            .put_cf(self.cf(cf)?, key, bytes)
            .map_err(CoreError::storage)
    }

    fn read<T: DeserializeOwned>(&self, cf: &'static str, key: &[u8]) -> Result<Option<T>> {
        match self.db.get_cf(self.cf(cf)?, key).map_err(CoreError::storage)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf: &'static str) -> Result<Vec<T>> {
        let mut values = Vec::new();
        for item in self
            .db
            .iterator_cf(self.cf(cf)?, rocksdb::IteratorMode::Start)
        {
            let (_key, bytes) = item.map_err(CoreError::storage)?;
            values.push(serde_json::from_slice(&bytes)?);
        }
        Ok(values)
    }

    fn batch_put<T: Serialize>(
        &self,
        batch: &mut WriteBatch,
        cf: &'static str,
        key: &[u8],
        value: &T,
    ) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        batch.put_cf(self.cf(cf)?, key, bytes);
        Ok(())
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db.write(batch).map_err(CoreError::storage)
    }
}

#[async_trait]
impl SessionStore for RocksDbStore {
    async fn insert(&self, session: ClassSession) -> Result<()> {
        self.put(CF_SESSIONS, session.id.as_bytes(), &session)
    }

    async fn get(&self, id: SessionId) -> Result<Option<ClassSession>> {
        self.read(CF_SESSIONS, id.as_bytes())
    }

    async fn update(&self, session: ClassSession, expected_version: u64) -> Result<()> {
        let _guard = self.commit_lock.lock().await;
        let current: ClassSession = self
            .read(CF_SESSIONS, session.id.as_bytes())?
            .ok_or_else(|| CoreError::not_found("session", session.id))?;
        if current.version != expected_version {
            return Err(CoreError::conflict(format!(
                "session {} was modified by a concurrent writer",
                session.id
            )));
        }
        self.put(CF_SESSIONS, session.id.as_bytes(), &session)
    }
}

#[async_trait]
impl MeetingStore for RocksDbStore {
    async fn commit(&self, commit: MeetingCommit) -> Result<()> {
        let _guard = self.commit_lock.lock().await;
        let current: ClassSession = self
            .read(CF_SESSIONS, commit.session.id.as_bytes())?
            .ok_or_else(|| CoreError::not_found("session", commit.session.id))?;
        if current.version != commit.expected_version {
            return Err(CoreError::conflict(format!(
                "session {} was modified by a concurrent writer",
                commit.session.id
            )));
        }

        let mut batch = WriteBatch::default();
        self.batch_put(
            &mut batch,
            CF_SESSIONS,
            commit.session.id.as_bytes(),
            &commit.session,
        )?;
        self.batch_put(
            &mut batch,
            CF_MEETINGS,
            commit.record.meeting.id.as_bytes(),
            &commit.record,
        )?;
        self.write(batch)
    }

    async fn get(&self, id: MeetingId) -> Result<Option<RecordedMeeting>> {
        self.read(CF_MEETINGS, id.as_bytes())
    }

    async fn for_session(&self, session: SessionId) -> Result<Vec<RecordedMeeting>> {
        let mut records: Vec<RecordedMeeting> = self
            .scan::<RecordedMeeting>(CF_MEETINGS)?
            .into_iter()
            .filter(|record| record.meeting.session == session)
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn for_teacher(&self, teacher: TeacherId) -> Result<Vec<RecordedMeeting>> {
        let mut records: Vec<RecordedMeeting> = self
            .scan::<RecordedMeeting>(CF_MEETINGS)?
            .into_iter()
            .filter(|record| record.teachers.iter().any(|row| row.teacher == teacher))
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }
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
impl RosterStore for RocksDbStore {
    async fn insert_student(&self, student: Student) -> Result<()> {
        self.put(CF_STUDENTS, student.id.as_bytes(), &student)
    }

    async fn get_student(&self, id: StudentId) -> Result<Option<Student>> {
        self.read(CF_STUDENTS, id.as_bytes())
    }

    async fn update_student(&self, student: Student) -> Result<()> {
        self.put(CF_STUDENTS, student.id.as_bytes(), &student)
    }

    async fn insert_enrollment(&self, enrollment: Enrollment) -> Result<()> {
        self.put(CF_ENROLLMENTS, enrollment.id.as_bytes(), &enrollment)
    }

    async fn get_enrollment(
        &self,
        session: SessionId,
        student: StudentId,
    ) -> Result<Option<Enrollment>> {
        Ok(self
            .scan::<Enrollment>(CF_ENROLLMENTS)?
            .into_iter()
            .find(|e| e.session == session && e.student == student))
    }

    async fn enrollments_for_student(&self, student: StudentId) -> Result<Vec<Enrollment>> {
        Ok(self
            .scan::<Enrollment>(CF_ENROLLMENTS)?
            .into_iter()
            .filter(|e| e.student == student)
            .collect())
    }
}

#[async_trait]
impl PaymentStore for RocksDbStore {
    async fn insert(&self, payment: Payment) -> Result<()> {
        self.put(CF_PAYMENTS, payment.id.as_bytes(), &payment)
    }

    async fn get(&self, id: PaymentId) -> Result<Option<Payment>> {
        self.read(CF_PAYMENTS, id.as_bytes())
    }

    async fn for_student(&self, student: StudentId) -> Result<Option<Payment>> {
        Ok(self
            .scan::<Payment>(CF_PAYMENTS)?
            .into_iter()
            .find(|p| p.student == student))
    }

    async fn get_all(&self) -> Result<Vec<Payment>> {
        self.scan(CF_PAYMENTS)
    }

    async fn transactions(&self, payment: PaymentId) -> Result<Vec<PaymentTransaction>> {
        let mut history: Vec<PaymentTransaction> = self
            .scan::<PaymentTransaction>(CF_TRANSACTIONS)?
            .into_iter()
            .filter(|tx| tx.payment == payment)
            .collect();
        history.sort_by_key(|tx| tx.recorded_at);
        Ok(history)
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<PaymentTransaction>> {
        self.read(CF_TRANSACTIONS, id.as_bytes())
    }

    async fn commit(&self, commit: PaymentCommit) -> Result<()> {
        let _guard = self.commit_lock.lock().await;
        let current: Payment = self
            .read(CF_PAYMENTS, commit.payment.id.as_bytes())?
            .ok_or_else(|| CoreError::not_found("payment", commit.payment.id))?;
        if current.version != commit.expected_version {
            return Err(CoreError::conflict(format!(
                "payment {} was modified by a concurrent writer",
                commit.payment.id
            )));
        }

        let mut batch = WriteBatch::default();
        self.batch_put(
            &mut batch,
            CF_PAYMENTS,
            commit.payment.id.as_bytes(),
            &commit.payment,
        )?;
        self.batch_put(
            &mut batch,
            CF_TRANSACTIONS,
            commit.transaction.id.as_bytes(),
            &commit.transaction,
        )?;
        self.write(batch)
    }
}
