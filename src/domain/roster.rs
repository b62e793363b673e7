use crate::domain::ids::{EnrollmentId, SessionId, StudentId};
use crate::domain::money::Amount;
use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseType {
    Group,
    Private,
}

impl std::fmt::Display for CourseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Group => write!(f, "group"),
            Self::Private => write!(f, "private"),
        }
    }
}

/// A student's priced course selection. The final price is fixed here and
/// becomes the payment ledger's total at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoursePlan {
    pub course_type: CourseType,
    pub list_price: Amount,
    pub discount: Decimal,
    pub final_price: Decimal,
}

impl CoursePlan {
    pub fn new(course_type: CourseType, list_price: Amount, discount: Decimal) -> Result<Self> {
        if discount < Decimal::ZERO {
            return Err(CoreError::validation("discount cannot be negative"));
        }
        let final_price = list_price.value() - discount;
        if final_price < Decimal::ZERO {
            return Err(CoreError::validation("discount exceeds the list price"));
        }
        Ok(Self {
            course_type,
            list_price,
            discount,
            final_price,
        })
    }
}

/// Lifecycle independent of the core engine; the engine only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    AwaitingConfirmation,
    Confirmed,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub plan: CoursePlan,
    pub status: StudentStatus,
}

impl Student {
    pub fn new(id: StudentId, name: impl Into<String>, plan: CoursePlan) -> Self {
        Self {
            id,
            name: name.into(),
            plan,
            status: StudentStatus::AwaitingConfirmation,
        }
    }
}

/// Join entity between a student and a class session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student: StudentId,
    pub session: SessionId,
    pub enrolled_at: DateTime<Utc>,
}

impl Enrollment {
    pub fn new(student: StudentId, session: SessionId) -> Self {
        Self {
            id: EnrollmentId::new(),
            student,
            session,
            enrolled_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_final_price_applies_discount() {
        let plan = CoursePlan::new(
            CourseType::Group,
            Amount::new(dec!(1200000)).unwrap(),
            dec!(200000),
        )
        .unwrap();
        assert_eq!(plan.final_price, dec!(1000000));
    }

    #[test]
    fn test_discount_larger_than_price_is_rejected() {
        let result = CoursePlan::new(
            CourseType::Private,
            Amount::new(dec!(100)).unwrap(),
            dec!(200),
        );
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_negative_discount_is_rejected() {
        let result = CoursePlan::new(
            CourseType::Group,
            Amount::new(dec!(100)).unwrap(),
            dec!(-1),
        );
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_new_students_await_confirmation() {
        let plan =
            CoursePlan::new(CourseType::Group, Amount::new(dec!(100)).unwrap(), dec!(0)).unwrap();
        let student = Student::new(StudentId::new(), "Ada", plan);
        assert_eq!(student.status, StudentStatus::AwaitingConfirmation);
    }
}
