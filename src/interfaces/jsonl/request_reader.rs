use crate::application::registrar::{NewSession, NewStudent};
use crate::application::requests::CloseMeetingRequest;
use crate::domain::ids::{SessionId, StudentId};
use crate::error::{CoreError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::{BufRead, BufReader, Read};

/// One line of a replay stream, tagged by operation.
///
/// Payments are addressed by student here; the reader's caller resolves the
/// student's ledger before calling into the core.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    CreateSession(NewSession),
    RegisterStudent(NewStudent),
    Enroll {
        student_id: StudentId,
        session_id: SessionId,
    },
    CloseMeeting(CloseMeetingRequest),
    RecordPayment {
        student_id: StudentId,
        amount: Decimal,
        method: String,
        date: NaiveDate,
        #[serde(default)]
        notes: Option<String>,
        recorded_by: String,
    },
    FinishSession {
        session_id: SessionId,
        date: NaiveDate,
    },
}

/// Reads requests from a JSON Lines source.
///
/// Wraps any `Read` and yields `Result<Request>` lazily, so large replay
/// files stream without being loaded whole. Blank lines are skipped.
pub struct RequestReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> RequestReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: BufReader::new(source),
        }
    }

    pub fn requests(self) -> impl Iterator<Item = Result<Request>> {
        self.reader
            .lines()
            .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
            .map(|line| {
                let line = line?;
                serde_json::from_str(&line)
                    .map_err(|err| CoreError::validation(format!("malformed request: {err}")))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_valid_stream() {
        let data = concat!(
            r#"{"op":"register_student","name":"Ada","course_type":"group","list_price":1000000}"#,
            "\n\n",
            r#"{"op":"create_session","name":"Algebra II","total_meetings":8,"policy":"flat","rate":50000}"#,
            "\n",
        );
        let reader = RequestReader::new(data.as_bytes());
        let results: Vec<Result<Request>> = reader.requests().collect();

        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[0].as_ref().unwrap(),
            Request::RegisterStudent(_)
        ));
        assert!(matches!(
            results[1].as_ref().unwrap(),
            Request::CreateSession(_)
        ));
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = r#"{"op":"no_such_op"}"#;
        let reader = RequestReader::new(data.as_bytes());
        let results: Vec<Result<Request>> = reader.requests().collect();

        assert!(matches!(&results[0], Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_substitution_without_substitute_is_rejected_at_parse() {
        let data = concat!(
            r#"{"op":"close_meeting","session_id":"7f8ad661-9a30-4f0e-a9f5-2f8f1f6f6f10","#,
            r#""teacher_id":"9b30c5e3-31cc-4a40-9b68-5bb92cfe5a10","teacher_present":false,"#,
            r#""date":"2024-03-04","attendance":[],"substitution":{"notes":"no name given"}}"#,
        );
        let reader = RequestReader::new(data.as_bytes());
        let results: Vec<Result<Request>> = reader.requests().collect();

        // `substitute_id` is a required field of the substitution payload.
        assert!(matches!(&results[0], Err(CoreError::Validation(_))));
    }
}
