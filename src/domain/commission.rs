use crate::domain::meeting::AttendanceStatus;
use crate::domain::money::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How instructor pay is derived from a meeting.
///
/// Closed variant on purpose: adding a policy forces every match in the
/// crate to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", content = "rate", rename_all = "snake_case")]
pub enum CommissionPolicy {
    /// Fixed amount per meeting, independent of how many students attended.
    Flat(Amount),
    /// Amount per present-equivalent student.
    PerStudent(Amount),
}

impl CommissionPolicy {
    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::Flat(_) => PolicyKind::Flat,
            Self::PerStudent(_) => PolicyKind::PerStudent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Flat,
    PerStudent,
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flat => write!(f, "flat"),
            Self::PerStudent => write!(f, "per_student"),
        }
    }
}

/// The audit record of how a commission amount came to be.
///
/// Frozen onto the meeting at close time; later policy edits on the session
/// never touch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionBreakdown {
    pub policy: PolicyKind,
    pub unit_amount: Decimal,
    pub counted_students: u32,
}

impl std::fmt::Display for CommissionBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.policy {
            PolicyKind::Flat => write!(
                f,
                "flat {} per meeting ({} attending)",
                self.unit_amount, self.counted_students
            ),
            PolicyKind::PerStudent => write!(
                f,
                "{} x {} attending students",
                self.unit_amount, self.counted_students
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commission {
    pub amount: Decimal,
    pub breakdown: CommissionBreakdown,
}

impl Commission {
    /// Pure: policy and the meeting's attendance outcomes in, amount and
    /// breakdown out. Only `Absent` is excluded from the head count.
    pub fn calculate(policy: &CommissionPolicy, outcomes: &[AttendanceStatus]) -> Self {
        let counted = outcomes
            .iter()
            .filter(|status| status.is_present_equivalent())
            .count() as u32;

        let (amount, unit_amount) = match policy {
            CommissionPolicy::Flat(rate) => (rate.value(), rate.value()),
            CommissionPolicy::PerStudent(rate) => {
                (rate.value() * Decimal::from(counted), rate.value())
            }
        };

        Self {
            amount,
            breakdown: CommissionBreakdown {
                policy: policy.kind(),
                unit_amount,
                counted_students: counted,
            },
        }
    }
}
