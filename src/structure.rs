use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{AcademicYear, PaymentFrequency, SchoolId};

/// per-frequency amounts or rates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyTable<T> {
    pub yearly: T,
    pub monthly: T,
    pub weekly: T,
}

impl<T: Copy> FrequencyTable<T> {
    pub fn get(&self, frequency: PaymentFrequency) -> T {
        match frequency {
            PaymentFrequency::Yearly => self.yearly,
            PaymentFrequency::Monthly => self.monthly,
            PaymentFrequency::Weekly => self.weekly,
        }
    }
}

/// fee structure: immutable reference data per (school, grade, academic year)
///
/// Set by administrators; read-only to the calculation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeStructure {
    pub school_id: SchoolId,
    pub grade_level: u8,
    pub academic_year: AcademicYear,
    /// base tuition keyed by payment frequency
    pub base_tuition: FrequencyTable<Money>,
    /// discount percentage keyed by payment frequency
    pub payment_discounts: FrequencyTable<Rate>,
    /// discount percentage per sibling order, index 0 is the 1st child;
    /// orders beyond the last tier reuse the last tier
    pub sibling_discounts: Vec<Rate>,
}

impl FeeStructure {
    pub fn new(
        school_id: SchoolId,
        grade_level: u8,
        academic_year: AcademicYear,
        base_tuition: FrequencyTable<Money>,
        payment_discounts: FrequencyTable<Rate>,
        sibling_discounts: Vec<Rate>,
    ) -> Self {
        Self {
            school_id,
            grade_level,
            academic_year,
            base_tuition,
            payment_discounts,
            sibling_discounts,
        }
    }

    /// base tuition for the given payment frequency
    pub fn base_amount(&self, frequency: PaymentFrequency) -> Money {
        self.base_tuition.get(frequency)
    }

    /// payment-frequency discount rate
    pub fn payment_discount(&self, frequency: PaymentFrequency) -> Rate {
        self.payment_discounts.get(frequency)
    }

    /// sibling discount rate for a 1-based enrollment-order rank
    pub fn sibling_discount(&self, sibling_order: u32) -> Rate {
        if sibling_order == 0 || self.sibling_discounts.is_empty() {
            return Rate::ZERO;
        }
        let index = (sibling_order as usize - 1).min(self.sibling_discounts.len() - 1);
        self.sibling_discounts[index]
    }
}
