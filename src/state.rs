use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::types::{
    AcademicYear, BursaryId, FeeBreakdown, FeeId, FeeStatus, PaymentFrequency, SchoolId, StudentId,
};

/// persisted per-student-per-year fee record with running balance
///
/// Invariant: `balance_due == total_amount_due - total_paid` after every
/// mutation. All mutation paths re-derive the balance from that formula
/// rather than patching it incrementally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentFee {
    pub id: FeeId,
    pub student_id: StudentId,
    pub school_id: SchoolId,
    pub academic_year: AcademicYear,
    pub payment_frequency: PaymentFrequency,

    // fee components
    pub base_tuition_amount: Money,
    pub activity_fees_amount: Money,
    pub material_fees_amount: Money,
    pub other_fees_amount: Money,

    // discounts
    pub payment_discount_percent: Rate,
    pub payment_discount_amount: Money,
    pub sibling_order: u32,
    pub sibling_discount_percent: Rate,
    pub sibling_discount_amount: Money,

    // bursary
    pub bursary_id: Option<BursaryId>,
    pub bursary_amount: Money,

    // totals
    pub total_before_discounts: Money,
    pub total_discounts: Money,
    pub total_amount_due: Money,
    pub total_paid: Money,
    pub balance_due: Money,

    pub status: FeeStatus,
    pub due_date: NaiveDate,

    pub deleted: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl StudentFee {
    /// materialize a fee record from a calculator breakdown
    pub fn from_breakdown(breakdown: &FeeBreakdown, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id: breakdown.student_id,
            school_id: breakdown.school_id,
            academic_year: breakdown.academic_year.clone(),
            payment_frequency: breakdown.payment_frequency,
            base_tuition_amount: breakdown.base_tuition_amount,
            activity_fees_amount: breakdown.activity_fees_amount,
            material_fees_amount: breakdown.material_fees_amount,
            other_fees_amount: breakdown.other_fees_amount,
            payment_discount_percent: breakdown.payment_discount_percent,
            payment_discount_amount: breakdown.payment_discount_amount,
            sibling_order: breakdown.sibling_order,
            sibling_discount_percent: breakdown.sibling_discount_percent,
            sibling_discount_amount: breakdown.sibling_discount_amount,
            bursary_id: breakdown.bursary_id,
            bursary_amount: breakdown.bursary_amount,
            total_before_discounts: breakdown.total_before_discounts,
            total_discounts: breakdown.total_discounts,
            total_amount_due: breakdown.total_amount_due,
            total_paid: Money::ZERO,
            balance_due: breakdown.total_amount_due,
            status: FeeStatus::Pending,
            due_date: breakdown.due_date,
            deleted: false,
            created: now,
            updated: now,
        }
    }

    /// re-derive balance and balance-driven status; the single place
    /// balance-driven status changes occur
    fn refresh_balance(&mut self) {
        self.balance_due = self.total_amount_due - self.total_paid;

        if !self.balance_due.is_positive() {
            self.status = FeeStatus::Paid;
        } else if self.total_paid.is_positive() {
            self.status = FeeStatus::Partial;
        } else {
            // nothing paid: Pending or Overdue stands, anything else resets
            if !matches!(self.status, FeeStatus::Pending | FeeStatus::Overdue) {
                self.status = FeeStatus::Pending;
            }
        }
    }

    /// apply a completed payment to the running balance
    pub fn apply_payment(&mut self, amount: Money, now: DateTime<Utc>) {
        self.total_paid += amount;
        self.refresh_balance();
        self.updated = now;
    }

    /// reverse a refunded payment off the running balance
    pub fn reverse_payment(&mut self, amount: Money, now: DateTime<Utc>) {
        self.total_paid -= amount;
        self.refresh_balance();
        self.updated = now;
    }

    /// overwrite derived fields from a fresh breakdown; already-paid amount
    /// carries over, so the balance may go negative after a downward
    /// recalculation (reported via `overpayment`, not auto-refunded)
    pub fn apply_recalculation(&mut self, breakdown: &FeeBreakdown, now: DateTime<Utc>) {
        self.payment_frequency = breakdown.payment_frequency;
        self.base_tuition_amount = breakdown.base_tuition_amount;
        self.activity_fees_amount = breakdown.activity_fees_amount;
        self.material_fees_amount = breakdown.material_fees_amount;
        self.other_fees_amount = breakdown.other_fees_amount;
        self.payment_discount_percent = breakdown.payment_discount_percent;
        self.payment_discount_amount = breakdown.payment_discount_amount;
        self.sibling_order = breakdown.sibling_order;
        self.sibling_discount_percent = breakdown.sibling_discount_percent;
        self.sibling_discount_amount = breakdown.sibling_discount_amount;
        self.bursary_id = breakdown.bursary_id;
        self.bursary_amount = breakdown.bursary_amount;
        self.total_before_discounts = breakdown.total_before_discounts;
        self.total_discounts = breakdown.total_discounts;
        self.total_amount_due = breakdown.total_amount_due;
        self.due_date = breakdown.due_date;
        self.refresh_balance();
        self.updated = now;
    }

    /// flip Pending to Overdue once past the due date with nothing paid
    pub fn refresh_overdue(&mut self, today: NaiveDate) {
        if self.status == FeeStatus::Pending && today > self.due_date && self.total_paid.is_zero() {
            self.status = FeeStatus::Overdue;
        }
    }

    /// amount paid beyond the current total, for manual reconciliation
    pub fn overpayment(&self) -> Money {
        (self.total_paid - self.total_amount_due).max(Money::ZERO)
    }

    /// whether the fee is settled
    pub fn is_paid(&self) -> bool {
        self.status == FeeStatus::Paid
    }

    /// soft delete; the caller pairs this with a bursary seat release
    pub fn soft_delete(&mut self, now: DateTime<Utc>) {
        self.deleted = true;
        self.updated = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fee(total: i64) -> StudentFee {
        let now = Utc::now();
        StudentFee {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            school_id: Uuid::new_v4(),
            academic_year: "2024-2025".into(),
            payment_frequency: PaymentFrequency::Yearly,
            base_tuition_amount: Money::from_major(total),
            activity_fees_amount: Money::ZERO,
            material_fees_amount: Money::ZERO,
            other_fees_amount: Money::ZERO,
            payment_discount_percent: Rate::ZERO,
            payment_discount_amount: Money::ZERO,
            sibling_order: 1,
            sibling_discount_percent: Rate::ZERO,
            sibling_discount_amount: Money::ZERO,
            bursary_id: None,
            bursary_amount: Money::ZERO,
            total_before_discounts: Money::from_major(total),
            total_discounts: Money::ZERO,
            total_amount_due: Money::from_major(total),
            total_paid: Money::ZERO,
            balance_due: Money::from_major(total),
            status: FeeStatus::Pending,
            due_date: NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
            deleted: false,
            created: now,
            updated: now,
        }
    }

    #[test]
    fn test_balance_invariant_through_payments() {
        let mut f = fee(8_700);
        f.apply_payment(Money::from_major(5_000), Utc::now());
        assert_eq!(f.balance_due, f.total_amount_due - f.total_paid);
        assert_eq!(f.status, FeeStatus::Partial);

        f.apply_payment(Money::from_major(3_700), Utc::now());
        assert_eq!(f.balance_due, Money::ZERO);
        assert_eq!(f.status, FeeStatus::Paid);
    }

    #[test]
    fn test_full_reversal_returns_to_pending() {
        let mut f = fee(8_700);
        f.apply_payment(Money::from_major(5_000), Utc::now());
        f.reverse_payment(Money::from_major(5_000), Utc::now());
        assert_eq!(f.total_paid, Money::ZERO);
        assert_eq!(f.balance_due, Money::from_major(8_700));
        assert_eq!(f.status, FeeStatus::Pending);
    }

    #[test]
    fn test_overdue_only_before_any_payment() {
        let late = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap();

        let mut f = fee(1_000);
        f.refresh_overdue(late);
        assert_eq!(f.status, FeeStatus::Overdue);

        let mut paid_some = fee(1_000);
        paid_some.apply_payment(Money::from_major(100), Utc::now());
        paid_some.refresh_overdue(late);
        assert_eq!(paid_some.status, FeeStatus::Partial);
    }

    #[test]
    fn test_overdue_survives_refresh_balance() {
        let mut f = fee(1_000);
        f.refresh_overdue(NaiveDate::from_ymd_opt(2024, 11, 1).unwrap());
        // a reversal of nothing still re-derives the balance
        f.apply_payment(Money::ZERO, Utc::now());
        assert_eq!(f.status, FeeStatus::Overdue);
    }

    #[test]
    fn test_json_round_trip() {
        let mut f = fee(8_700);
        f.apply_payment(Money::from_major(5_000), Utc::now());

        let json = serde_json::to_string(&f).unwrap();
        let restored: StudentFee = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.total_paid, f.total_paid);
        assert_eq!(restored.balance_due, f.balance_due);
        assert_eq!(restored.status, f.status);
    }

    #[test]
    fn test_downward_recalculation_reports_overpayment() {
        let mut f = fee(10_000);
        f.apply_payment(Money::from_major(9_000), Utc::now());

        let breakdown = FeeBreakdown {
            student_id: f.student_id,
            school_id: f.school_id,
            academic_year: f.academic_year.clone(),
            payment_frequency: PaymentFrequency::Yearly,
            base_tuition_amount: Money::from_major(8_000),
            activity_fees_amount: Money::ZERO,
            material_fees_amount: Money::ZERO,
            other_fees_amount: Money::ZERO,
            payment_discount_percent: Rate::ZERO,
            payment_discount_amount: Money::ZERO,
            sibling_order: 1,
            sibling_discount_percent: Rate::ZERO,
            sibling_discount_amount: Money::ZERO,
            bursary_id: None,
            bursary_amount: Money::ZERO,
            total_before_discounts: Money::from_major(8_000),
            total_discounts: Money::ZERO,
            total_amount_due: Money::from_major(8_000),
            due_date: f.due_date,
        };
        f.apply_recalculation(&breakdown, Utc::now());

        assert_eq!(f.total_paid, Money::from_major(9_000));
        assert_eq!(f.balance_due, Money::from_major(-1_000));
        assert_eq!(f.status, FeeStatus::Paid);
        assert_eq!(f.overpayment(), Money::from_major(1_000));
    }
}
