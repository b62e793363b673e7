#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::io::Write;
use std::process::Command;
use tempfile::tempdir;

const STUDENT: &str = "3d1c2b3a-4e5f-4a6b-8c7d-9e0f1a2b3c4d";

#[test]
fn test_rocksdb_ledger_survives_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("ledger_db");

    // 1. First run: register a student and take the first installment.
    let mut requests1 = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        requests1,
        r#"{{"op":"register_student","id":"{STUDENT}","name":"Ada","course_type":"group","list_price":1000000}}"#
    )
    .unwrap();
    writeln!(
        requests1,
        r#"{{"op":"record_payment","student_id":"{STUDENT}","amount":400000,"method":"transfer","date":"2024-03-05","recorded_by":"front-desk"}}"#
    )
    .unwrap();

    let mut cmd1 = Command::new(cargo_bin!("classledger"));
    cmd1.arg(requests1.path()).arg("--db-path").arg(&db_path);
    let output1 = cmd1.output().expect("failed to execute command");
    assert!(output1.status.success());
    let stdout1 = String::from_utf8_lossy(&output1.stdout);
    assert!(stdout1.contains("Ada,1000000,400000,600000,partial"));

    // 2. Second run against the same database: the remaining installment.
    let mut requests2 = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        requests2,
        r#"{{"op":"record_payment","student_id":"{STUDENT}","amount":600000,"method":"transfer","date":"2024-04-01","recorded_by":"front-desk"}}"#
    )
    .unwrap();

    let mut cmd2 = Command::new(cargo_bin!("classledger"));
    cmd2.arg(requests2.path()).arg("--db-path").arg(&db_path);
    let output2 = cmd2.output().expect("failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);

    // The header was recomputed from the recovered history.
    assert!(stdout2.contains("Ada,1000000,1000000,0,completed"));
}
