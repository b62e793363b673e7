use clap::Parser;
use classledger::application::billing::BillingLedger;
use classledger::application::recorder::MeetingRecorder;
use classledger::application::registrar::Registrar;
use classledger::application::requests::RecordPaymentRequest;
use classledger::domain::ports::{MeetingStore, PaymentStore, RosterStore, SessionStore};
use classledger::infrastructure::in_memory::InMemoryStore;
use classledger::interfaces::csv::payment_writer::{PaymentSummary, PaymentWriter};
use classledger::interfaces::jsonl::request_reader::{Request, RequestReader};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input requests file, one JSON object per line
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.db_path {
        Some(path) => {
            #[cfg(feature = "storage-rocksdb")]
            {
                let store = classledger::infrastructure::rocksdb::RocksDbStore::open(path)
                    .into_diagnostic()?;
                replay(store, cli.input).await
            }
            #[cfg(not(feature = "storage-rocksdb"))]
            {
                let _ = path;
                Err(miette::miette!(
                    "this build has no persistent storage; rebuild with --features storage-rocksdb"
                ))
            }
        }
        None => replay(InMemoryStore::new(), cli.input).await,
    }
}

async fn replay<S>(store: S, input: PathBuf) -> Result<()>
where
    S: SessionStore + MeetingStore + RosterStore + PaymentStore + Clone + 'static,
{
    let registrar = Registrar::new(
        Box::new(store.clone()),
        Box::new(store.clone()),
        Box::new(store.clone()),
    );
    let recorder = MeetingRecorder::new(
        Box::new(store.clone()),
        Box::new(store.clone()),
        Box::new(store.clone()),
    );
    let billing = BillingLedger::new(
        Box::new(store.clone()),
        Box::new(store.clone()),
        Box::new(store.clone()),
    );

    let file = File::open(&input).into_diagnostic()?;
    for request in RequestReader::new(file).requests() {
        let outcome = match request {
            Ok(request) => apply(&registrar, &recorder, &billing, request).await,
            Err(err) => Err(err),
        };
        if let Err(err) = outcome {
            eprintln!("Error processing request: {err}");
        }
    }

    // Final state of every tuition ledger.
    let mut summaries = Vec::new();
    for payment in PaymentStore::get_all(&store).await.into_diagnostic()? {
        let student = RosterStore::get_student(&store, payment.student)
            .await
            .into_diagnostic()?
            .map(|student| student.name)
            .unwrap_or_default();
        summaries.push(PaymentSummary {
            payment: payment.id,
            student,
            total: payment.total,
            paid: payment.paid,
            remaining: payment.remaining,
            status: payment.status,
        });
    }
    summaries.sort_by(|a, b| a.student.cmp(&b.student));

    let stdout = io::stdout();
    let mut writer = PaymentWriter::new(stdout.lock());
    writer.write_summaries(summaries).into_diagnostic()?;

    Ok(())
}

async fn apply(
    registrar: &Registrar,
    recorder: &MeetingRecorder,
    billing: &BillingLedger,
    request: Request,
) -> classledger::error::Result<()> {
    match request {
        Request::CreateSession(req) => {
            registrar.create_session(req).await?;
        }
        Request::RegisterStudent(req) => {
            registrar.register_student(req).await?;
        }
        Request::Enroll {
            student_id,
            session_id,
        } => {
            registrar.enroll(student_id, session_id).await?;
        }
        Request::CloseMeeting(req) => {
            recorder.close_meeting(req).await?;
        }
        Request::RecordPayment {
            student_id,
            amount,
            method,
            date,
            notes,
            recorded_by,
        } => {
            let payment = registrar.payment_for_student(student_id).await?;
            billing
                .record_transaction(RecordPaymentRequest {
                    payment_id: payment.id,
                    amount,
                    method,
                    date,
                    notes,
                    recorded_by,
                })
                .await?;
        }
        Request::FinishSession { session_id, date } => {
            registrar.finish_session(session_id, date).await?;
        }
    }
    Ok(())
}
