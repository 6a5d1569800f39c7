use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decimal::{Money, Rate};

/// unique identifier for a student fee record
pub type FeeId = Uuid;
/// unique identifier for a payment
pub type PaymentId = Uuid;
/// unique identifier for a student
pub type StudentId = Uuid;
/// unique identifier for a school
pub type SchoolId = Uuid;
/// unique identifier for a parent
pub type ParentId = Uuid;
/// unique identifier for a bursary program
pub type BursaryId = Uuid;
/// unique identifier for an activity
pub type ActivityId = Uuid;

/// academic year label, e.g. "2024-2025"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AcademicYear(pub String);

impl AcademicYear {
    pub fn new(label: impl Into<String>) -> Self {
        AcademicYear(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AcademicYear {
    fn from(s: &str) -> Self {
        AcademicYear(s.to_string())
    }
}

/// billing cadence, each with its own base amount and discount rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentFrequency {
    Yearly,
    Monthly,
    Weekly,
}

/// student fee status driven by the running balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeStatus {
    /// nothing paid yet
    Pending,
    /// partially paid, balance remains
    Partial,
    /// balance cleared
    Paid,
    /// past due date with nothing paid
    Overdue,
}

/// payment lifecycle: pending -> completed -> refunded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Refunded,
}

/// payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
    Cheque,
    MobileMoney,
}

/// how a bursary reduces the amount due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BursaryCoverage {
    /// percentage of the post-discount total
    Percentage(Rate),
    /// fixed amount, capped at the post-discount total
    Fixed(Money),
}

/// itemized fee breakdown produced by the calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub student_id: StudentId,
    pub school_id: SchoolId,
    pub academic_year: AcademicYear,
    pub payment_frequency: PaymentFrequency,

    pub base_tuition_amount: Money,
    pub activity_fees_amount: Money,
    pub material_fees_amount: Money,
    pub other_fees_amount: Money,

    pub payment_discount_percent: Rate,
    pub payment_discount_amount: Money,
    pub sibling_order: u32,
    pub sibling_discount_percent: Rate,
    pub sibling_discount_amount: Money,

    pub bursary_id: Option<BursaryId>,
    pub bursary_amount: Money,

    pub total_before_discounts: Money,
    pub total_discounts: Money,
    pub total_amount_due: Money,
    pub due_date: NaiveDate,
}

impl FeeBreakdown {
    /// total after payment and sibling discounts, before bursary
    pub fn total_after_discounts(&self) -> Money {
        self.total_before_discounts - self.total_discounts
    }
}
