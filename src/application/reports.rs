use crate::domain::commission::PolicyKind;
use crate::domain::ids::{MeetingId, SessionId, StudentId, TeacherId};
use crate::domain::ports::MeetingStoreBox;
use crate::error::Result;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct MonthFilter {
    pub year: i32,
    pub month: u32,
}

impl MonthFilter {
    fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

/// One meeting's line in a teacher's commission history.
#[derive(Debug, Clone, Serialize)]
pub struct CommissionLine {
    pub meeting_id: MeetingId,
    pub session: SessionId,
    pub sequence: u32,
    pub date: NaiveDate,
    pub policy: PolicyKind,
    pub amount: Decimal,
    pub counted_students: u32,
    pub substituted: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PolicyTotals {
    pub flat: Decimal,
    pub per_student: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeacherCommissionReport {
    pub teacher: TeacherId,
    pub total_commission: Decimal,
    pub meetings_taught: u32,
    pub students_taught: u32,
    pub substitute_meetings: u32,
    pub by_policy: PolicyTotals,
    pub lines: Vec<CommissionLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentAttendance {
    pub student: StudentId,
    pub present: u32,
    pub late: u32,
    pub excused: u32,
    pub absent: u32,
}

impl StudentAttendance {
    /// Share of recorded meetings the student showed up for.
    pub fn rate(&self) -> f64 {
        let attended = self.present + self.late + self.excused;
        let recorded = attended + self.absent;
        if recorded == 0 {
            0.0
        } else {
            f64::from(attended) / f64::from(recorded)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionAttendanceReport {
    pub session: SessionId,
    pub meetings_held: u32,
    pub students: Vec<StudentAttendance>,
}

/// Pure reads over the committed attendance and commission ledgers; never
/// writes, and only sees state the enclosing commits made visible.
pub struct Reports {
    meetings: MeetingStoreBox,
}

impl Reports {
    pub fn new(meetings: MeetingStoreBox) -> Self {
        Self { meetings }
    }

    /// Aggregated commission for the meetings a teacher actually taught,
    /// optionally narrowed to one month. Amounts come from the frozen
    /// per-meeting breakdowns, not from the sessions' current policies.
    pub async fn teacher_commission(
        &self,
        teacher: TeacherId,
        filter: Option<MonthFilter>,
    ) -> Result<TeacherCommissionReport> {
        let records = self.meetings.for_teacher(teacher).await?;

        let mut lines = Vec::new();
        let mut by_policy = PolicyTotals::default();
        let mut students = HashSet::new();
        let mut substitute_meetings = 0;

        for record in records {
            let meeting = &record.meeting;
            if meeting.taught_by.actual_teacher() != teacher {
                // Presence row only: the teacher was substituted out here.
                continue;
            }
            if let Some(filter) = &filter
                && !filter.contains(meeting.date)
            {
                continue;
            }

            if meeting.taught_by.is_substitution() {
                substitute_meetings += 1;
            }
            match meeting.commission.breakdown.policy {
                PolicyKind::Flat => by_policy.flat += meeting.commission.amount,
                PolicyKind::PerStudent => by_policy.per_student += meeting.commission.amount,
            }
            for row in &record.attendance {
                if row.status.is_present_equivalent() {
                    students.insert(row.student);
                }
            }

            lines.push(CommissionLine {
                meeting_id: meeting.id,
                session: meeting.session,
                sequence: meeting.sequence,
                date: meeting.date,
                policy: meeting.commission.breakdown.policy,
                amount: meeting.commission.amount,
                counted_students: meeting.commission.breakdown.counted_students,
                substituted: meeting.taught_by.is_substitution(),
            });
        }

        Ok(TeacherCommissionReport {
            teacher,
            total_commission: by_policy.flat + by_policy.per_student,
            meetings_taught: lines.len() as u32,
            students_taught: students.len() as u32,
            substitute_meetings,
            by_policy,
            lines,
        })
    }

    pub async fn session_attendance(&self, session: SessionId) -> Result<SessionAttendanceReport> {
        let records = self.meetings.for_session(session).await?;
        let meetings_held = records.len() as u32;

        let mut per_student: HashMap<StudentId, StudentAttendance> = HashMap::new();
        for record in &records {
            for row in &record.attendance {
                let entry =
                    per_student
                        .entry(row.student)
                        .or_insert_with(|| StudentAttendance {
                            student: row.student,
                            present: 0,
                            late: 0,
                            excused: 0,
                            absent: 0,
                        });
                use crate::domain::meeting::AttendanceStatus::*;
                match row.status {
                    Present => entry.present += 1,
                    Late => entry.late += 1,
                    Excused => entry.excused += 1,
                    Absent => entry.absent += 1,
                }
            }
        }

        let mut students: Vec<StudentAttendance> = per_student.into_values().collect();
        students.sort_by_key(|s| s.student);

        Ok(SessionAttendanceReport {
            session,
            meetings_held,
            students,
        })
    }
}
