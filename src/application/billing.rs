use crate::application::requests::RecordPaymentRequest;
use crate::domain::ids::TransactionId;
use crate::domain::money::Amount;
use crate::domain::payment::{LedgerPosition, Payment, PaymentStatus, PaymentTransaction};
use crate::domain::ports::{PaymentCommit, PaymentStoreBox, RosterStoreBox, SessionStoreBox};
use crate::domain::roster::CourseType;
use crate::error::{CoreError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;

const MAX_COMMIT_ATTEMPTS: u32 = 5;

/// Read-only view of one ledger entry for the receipt renderer.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Receipt {
    pub receipt_number: String,
    pub transaction_date: NaiveDate,
    pub student_name: String,
    pub course_name: Option<String>,
    pub course_type: CourseType,
    pub amount: Decimal,
    pub payment_method: String,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
    pub status: PaymentStatus,
    pub notes: Option<String>,
}

/// The tuition payment ledger.
///
/// Transactions are append-only; the header is recomputed from the full,
/// freshly-read history on every write and committed together with the new
/// transaction under the header's version. Nothing here increments a
/// running total in place.
pub struct BillingLedger {
    payments: PaymentStoreBox,
    roster: RosterStoreBox,
    sessions: SessionStoreBox,
}

impl BillingLedger {
    pub fn new(
        payments: PaymentStoreBox,
        roster: RosterStoreBox,
        sessions: SessionStoreBox,
    ) -> Self {
        Self {
            payments,
            roster,
            sessions,
        }
    }

    pub async fn record_transaction(&self, req: RecordPaymentRequest) -> Result<LedgerPosition> {
        let amount = Amount::try_from(req.amount)
            .map_err(|_| CoreError::validation("payment amount must be positive"))?;

        let mut attempts = 0;
        loop {
            match self.try_record(&req, amount).await {
                Err(err) if err.is_retriable() && attempts + 1 < MAX_COMMIT_ATTEMPTS => {
                    attempts += 1;
                    tracing::debug!(
                        payment = %req.payment_id,
                        attempts,
                        "payment header moved underneath us, recomputing"
                    );
                }
                outcome => return outcome,
            }
        }
    }

    async fn try_record(
        &self,
        req: &RecordPaymentRequest,
        amount: Amount,
    ) -> Result<LedgerPosition> {
        let payment = self
            .payments
            .get(req.payment_id)
            .await?
            .ok_or_else(|| CoreError::not_found("payment", req.payment_id))?;

        let transaction = PaymentTransaction::new(
            payment.id,
            amount,
            req.method.clone(),
            req.date,
            req.notes.clone(),
            req.recorded_by.clone(),
        );

        // Recompute from the full history, never from the stored header.
        let mut history = self.payments.transactions(payment.id).await?;
        history.push(transaction.clone());
        let position = Payment::project(payment.total, &history);

        let expected_version = payment.version;
        let mut updated = payment;
        updated.apply(position.clone());
        updated.version += 1;

        self.payments
            .commit(PaymentCommit {
                payment: updated,
                expected_version,
                transaction: transaction.clone(),
            })
            .await?;

        tracing::info!(
            payment = %req.payment_id,
            transaction = %transaction.id,
            amount = %amount,
            paid = %position.paid,
            remaining = %position.remaining,
            "payment transaction recorded"
        );

        Ok(position)
    }

    /// Pure read for the PDF renderer: one transaction plus the ledger
    /// position and student facts at read time.
    pub async fn receipt(&self, transaction_id: TransactionId) -> Result<Receipt> {
        let tx = self
            .payments
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| CoreError::not_found("transaction", transaction_id))?;
        let payment = self
            .payments
            .get(tx.payment)
            .await?
            .ok_or_else(|| CoreError::not_found("payment", tx.payment))?;
        let student = self
            .roster
            .get_student(payment.student)
            .await?
            .ok_or_else(|| CoreError::not_found("student", payment.student))?;

        // The most recent enrollment names the course on the receipt.
        let mut enrollments = self.roster.enrollments_for_student(student.id).await?;
        enrollments.sort_by_key(|e| e.enrolled_at);
        let course_name = match enrollments.last() {
            Some(enrollment) => self
                .sessions
                .get(enrollment.session)
                .await?
                .map(|session| session.name),
            None => None,
        };

        Ok(Receipt {
            receipt_number: receipt_number(tx.id),
            transaction_date: tx.date,
            student_name: student.name,
            course_name,
            course_type: student.plan.course_type,
            amount: tx.amount.value(),
            payment_method: tx.method,
            total_amount: payment.total,
            paid_amount: payment.paid,
            remaining_amount: payment.remaining,
            status: payment.status,
            notes: tx.notes,
        })
    }
}

fn receipt_number(id: TransactionId) -> String {
    let hex = id.0.simple().to_string();
    format!("RCP-{}", hex[..12].to_uppercase())
}
