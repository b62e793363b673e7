use crate::application::requests::{CloseMeetingOutcome, CloseMeetingRequest};
use crate::domain::commission::Commission;
use crate::domain::ids::MeetingId;
use crate::domain::meeting::{
    AttendanceRecord, AttendanceStatus, Meeting, TaughtBy, TeacherPresenceRecord, TeacherRole,
};
use crate::domain::ports::{
    MeetingCommit, MeetingStoreBox, RecordedMeeting, RosterStoreBox, SessionStoreBox,
};
use crate::error::{CoreError, Result};
use chrono::Utc;

/// How often a close-meeting recomputes against fresh state after losing
/// the sequence-counter race before the conflict is surfaced to the caller.
const MAX_COMMIT_ATTEMPTS: u32 = 5;

/// Orchestrates the close-meeting use case.
///
/// One request allocates the next sequence number, writes the student and
/// teacher attendance ledgers, computes the commission and advances the
/// session's progression, all inside a single versioned commit. A losing
/// writer re-reads the session and recomputes; nothing partial is ever
/// visible.
pub struct MeetingRecorder {
    sessions: SessionStoreBox,
    meetings: MeetingStoreBox,
    roster: RosterStoreBox,
}

impl MeetingRecorder {
    pub fn new(
        sessions: SessionStoreBox,
        meetings: MeetingStoreBox,
        roster: RosterStoreBox,
    ) -> Self {
        Self {
            sessions,
            meetings,
            roster,
        }
    }

    pub async fn close_meeting(&self, req: CloseMeetingRequest) -> Result<CloseMeetingOutcome> {
        // A meeting cannot be held with nobody there. Rejected before any
        // read-modify-write work happens.
        if !req
            .attendance
            .iter()
            .any(|entry| entry.status.is_present_equivalent())
        {
            return Err(CoreError::validation(
                "a meeting needs at least one present, late or excused student",
            ));
        }

        let mut attempts = 0;
        loop {
            match self.try_close(&req).await {
                Err(err) if err.is_retriable() && attempts + 1 < MAX_COMMIT_ATTEMPTS => {
                    attempts += 1;
                    tracing::debug!(
                        session = %req.session_id,
                        attempts,
                        "sequence counter moved underneath us, recomputing"
                    );
                }
                outcome => return outcome,
            }
        }
    }

    /// One optimistic pass: read the session, build the full commit against
    /// the observed version, and hand it to the store.
    async fn try_close(&self, req: &CloseMeetingRequest) -> Result<CloseMeetingOutcome> {
        let session = self
            .sessions
            .get(req.session_id)
            .await?
            .ok_or_else(|| CoreError::not_found("session", req.session_id))?;

        if !session.active {
            return Err(CoreError::validation(format!(
                "session {} is not active",
                session.id
            )));
        }

        let sequence = session.next_sequence();
        let meeting_id = MeetingId::new();
        let now = Utc::now();

        // Resolve each attendance entry against the roster. Unenrolled
        // students are tolerated (stale client state) but not recorded.
        let mut attendance = Vec::with_capacity(req.attendance.len());
        let mut outcomes = Vec::with_capacity(req.attendance.len());
        for entry in &req.attendance {
            if self
                .roster
                .get_enrollment(req.session_id, entry.student_id)
                .await?
                .is_none()
            {
                tracing::warn!(
                    student = %entry.student_id,
                    session = %req.session_id,
                    "attendance entry for a student not enrolled in this session, skipping"
                );
                continue;
            }
            outcomes.push(entry.status);
            attendance.push(AttendanceRecord {
                meeting: meeting_id,
                student: entry.student_id,
                status: entry.status,
                notes: entry.notes.clone(),
                recorded_at: now,
            });
        }

        let present_count = outcomes
            .iter()
            .filter(|status| status.is_present_equivalent())
            .count() as u32;
        if present_count == 0 {
            return Err(CoreError::validation(
                "no enrolled student was present at this meeting",
            ));
        }

        let taught_by = match &req.substitution {
            Some(sub) => TaughtBy::Substitute {
                assigned: req.teacher_id,
                substitute: sub.substitute_id,
                notes: sub.notes.clone(),
            },
            None => TaughtBy::Assigned {
                teacher: req.teacher_id,
            },
        };
        let teachers = self.presence_rows(req, &taught_by, meeting_id);

        let commission = Commission::calculate(&session.policy, &outcomes);
        let meeting = Meeting {
            id: meeting_id,
            session: session.id,
            sequence,
            date: req.date,
            topic: req.topic.clone(),
            taught_by,
            commission: commission.clone(),
            notes: req.notes.clone(),
        };

        let expected_version = session.version;
        let mut advanced = session;
        advanced.record_progress(sequence, req.date);
        advanced.version += 1;

        self.meetings
            .commit(MeetingCommit {
                session: advanced,
                expected_version,
                record: RecordedMeeting {
                    meeting,
                    attendance,
                    teachers,
                },
            })
            .await?;

        tracing::info!(
            session = %req.session_id,
            meeting = %meeting_id,
            sequence,
            present_count,
            commission = %commission.amount,
            "meeting closed"
        );

        Ok(CloseMeetingOutcome {
            meeting_id,
            sequence,
            present_count,
            commission,
        })
    }

    fn presence_rows(
        &self,
        req: &CloseMeetingRequest,
        taught_by: &TaughtBy,
        meeting: MeetingId,
    ) -> Vec<TeacherPresenceRecord> {
        let now = Utc::now();
        match taught_by {
            TaughtBy::Assigned { teacher } => vec![TeacherPresenceRecord {
                meeting,
                teacher: *teacher,
                role: TeacherRole::Assigned,
                status: if req.teacher_present {
                    AttendanceStatus::Present
                } else {
                    AttendanceStatus::Absent
                },
                notes: None,
                recorded_at: now,
            }],
            TaughtBy::Substitute {
                assigned,
                substitute,
                notes,
            } => vec![
                TeacherPresenceRecord {
                    meeting,
                    teacher: *assigned,
                    role: TeacherRole::Assigned,
                    status: AttendanceStatus::Absent,
                    notes: Some(format!("substituted by {substitute}")),
                    recorded_at: now,
                },
                TeacherPresenceRecord {
                    meeting,
                    teacher: *substitute,
                    role: TeacherRole::Substitute,
                    status: AttendanceStatus::Present,
                    notes: notes.clone(),
                    recorded_at: now,
                },
            ],
        }
    }
}
