use crate::domain::ids::{PaymentId, StudentId, TransactionId};
use crate::domain::money::Amount;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Completed,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Partial => write!(f, "partial"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// The derived header fields of a payment ledger at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerPosition {
    pub paid: Decimal,
    pub remaining: Decimal,
    pub status: PaymentStatus,
}

/// The tuition ledger header for one student.
///
/// `total` is fixed at creation (the student's final price). `paid`,
/// `remaining` and `status` are projections of the transaction history,
/// never incremented in place; `version` guards the recompute-and-write
/// cycle against concurrent writers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub student: StudentId,
    pub total: Decimal,
    pub paid: Decimal,
    pub remaining: Decimal,
    pub status: PaymentStatus,
    pub version: u64,
}

impl Payment {
    pub fn open(student: StudentId, total: Decimal) -> Self {
        Self {
            id: PaymentId::new(),
            student,
            total,
            paid: Decimal::ZERO,
            remaining: total,
            status: PaymentStatus::Pending,
            version: 0,
        }
    }

    /// Recomputes the header from the full transaction history.
    ///
    /// Overpayment is deliberately neither clamped nor rejected: `remaining`
    /// goes negative and the status reads `completed`. `paid + remaining ==
    /// total` holds either way.
    pub fn project(total: Decimal, history: &[PaymentTransaction]) -> LedgerPosition {
        let paid: Decimal = history.iter().map(|tx| tx.amount.value()).sum();
        let remaining = total - paid;
        let status = if paid == Decimal::ZERO {
            PaymentStatus::Pending
        } else if paid >= total {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Partial
        };
        LedgerPosition {
            paid,
            remaining,
            status,
        }
    }

    pub fn apply(&mut self, position: LedgerPosition) {
        self.paid = position.paid;
        self.remaining = position.remaining;
        self.status = position.status;
    }
}

/// One entry in the append-only tuition ledger. Never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: TransactionId,
    pub payment: PaymentId,
    pub amount: Amount,
    pub method: String,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub recorded_by: String,
    pub recorded_at: DateTime<Utc>,
}

impl PaymentTransaction {
    pub fn new(
        payment: PaymentId,
        amount: Amount,
        method: impl Into<String>,
        date: NaiveDate,
        notes: Option<String>,
        recorded_by: impl Into<String>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            payment,
            amount,
            method: method.into(),
            date,
            notes,
            recorded_by: recorded_by.into(),
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tx(payment: PaymentId, amount: Decimal) -> PaymentTransaction {
        PaymentTransaction::new(
            payment,
            Amount::new(amount).unwrap(),
            "cash",
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            None,
            "front-desk",
        )
    }

    #[test]
    fn test_open_payment_is_pending() {
        let payment = Payment::open(StudentId::new(), dec!(1000000));
        assert_eq!(payment.paid, dec!(0));
        assert_eq!(payment.remaining, dec!(1000000));
        assert_eq!(payment.status, PaymentStatus::Pending);
    }

    #[test]
    fn test_projection_partial_then_completed() {
        let payment = Payment::open(StudentId::new(), dec!(1000000));
        let mut history = vec![tx(payment.id, dec!(400000))];

        let position = Payment::project(payment.total, &history);
        assert_eq!(position.paid, dec!(400000));
        assert_eq!(position.remaining, dec!(600000));
        assert_eq!(position.status, PaymentStatus::Partial);

        history.push(tx(payment.id, dec!(600000)));
        let position = Payment::project(payment.total, &history);
        assert_eq!(position.paid, dec!(1000000));
        assert_eq!(position.remaining, dec!(0));
        assert_eq!(position.status, PaymentStatus::Completed);
    }

    #[test]
    fn test_projection_of_empty_history_is_pending() {
        let position = Payment::project(dec!(500), &[]);
        assert_eq!(position.paid, dec!(0));
        assert_eq!(position.remaining, dec!(500));
        assert_eq!(position.status, PaymentStatus::Pending);
    }

    #[test]
    fn test_overpayment_goes_negative_and_completes() {
        let payment = Payment::open(StudentId::new(), dec!(100));
        let history = vec![tx(payment.id, dec!(150))];

        let position = Payment::project(payment.total, &history);
        assert_eq!(position.paid, dec!(150));
        assert_eq!(position.remaining, dec!(-50));
        assert_eq!(position.status, PaymentStatus::Completed);
        // The invariant holds even when overpaid.
        assert_eq!(position.paid + position.remaining, payment.total);
    }

    #[test]
    fn test_apply_keeps_invariant() {
        let mut payment = Payment::open(StudentId::new(), dec!(1000));
        let history = vec![tx(payment.id, dec!(250)), tx(payment.id, dec!(250))];
        payment.apply(Payment::project(payment.total, &history));

        assert_eq!(payment.paid + payment.remaining, payment.total);
        assert_eq!(payment.status, PaymentStatus::Partial);
    }
}
