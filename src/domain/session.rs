use crate::domain::commission::CommissionPolicy;
use crate::domain::ids::{SessionId, TeacherId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A scheduled course offering and its progression state.
///
/// `version` is the optimistic-lock token for the meeting-sequence counter:
/// every committed close-meeting bumps it, and a commit against a stale
/// version is rejected by the store. The sequence number is therefore never
/// final until the commit that carries it succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSession {
    pub id: SessionId,
    pub name: String,
    pub assigned_teacher: Option<TeacherId>,
    pub room: Option<String>,
    pub total_meetings: u32,
    pub completed_meetings: u32,
    pub policy: CommissionPolicy,
    pub schedule: String,
    /// Set when the first meeting closes, never cleared.
    pub started_on: Option<NaiveDate>,
    /// Set only by the explicit finish action; reaching `total_meetings`
    /// does not set it.
    pub finished_on: Option<NaiveDate>,
    pub active: bool,
    pub version: u64,
}

impl ClassSession {
    pub fn new(
        id: SessionId,
        name: impl Into<String>,
        total_meetings: u32,
        policy: CommissionPolicy,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            assigned_teacher: None,
            room: None,
            total_meetings,
            completed_meetings: 0,
            policy,
            schedule: String::new(),
            started_on: None,
            finished_on: None,
            active: true,
            version: 0,
        }
    }

    pub fn with_teacher(mut self, teacher: TeacherId) -> Self {
        self.assigned_teacher = Some(teacher);
        self
    }

    pub fn with_schedule(mut self, schedule: impl Into<String>) -> Self {
        self.schedule = schedule.into();
        self
    }

    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    /// The sequence number the next closed meeting will take. Provisional
    /// until committed under this session's `version`.
    pub fn next_sequence(&self) -> u32 {
        self.completed_meetings + 1
    }

    /// Advances the completed-meeting counter and marks the session started
    /// on first use. Idempotent on the start date; the counter only moves
    /// forward. Never touches `finished_on`.
    pub fn record_progress(&mut self, sequence: u32, date: NaiveDate) {
        self.completed_meetings = self.completed_meetings.max(sequence);
        if self.started_on.is_none() {
            self.started_on = Some(date);
        }
    }

    /// The explicit administrative finish action. Decoupled from the meeting
    /// counter on purpose: a session that held all its planned meetings
    /// stays open until someone closes it.
    pub fn finish(&mut self, date: NaiveDate) {
        self.finished_on = Some(date);
        self.active = false;
    }

    pub fn is_finished(&self) -> bool {
        self.finished_on.is_some()
    }
}
