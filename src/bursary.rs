use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::decimal::Money;
use crate::errors::{FeeError, Result};
use crate::types::{BursaryCoverage, BursaryId, SchoolId};

/// capacity-limited financial-aid program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bursary {
    pub id: BursaryId,
    pub school_id: SchoolId,
    pub name: String,
    /// grade levels eligible for this program
    pub eligible_grades: BTreeSet<u8>,
    pub coverage: BursaryCoverage,
    pub current_recipients: u32,
    pub max_recipients: u32,
}

impl Bursary {
    pub fn new(
        school_id: SchoolId,
        name: impl Into<String>,
        eligible_grades: BTreeSet<u8>,
        coverage: BursaryCoverage,
        max_recipients: u32,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            school_id,
            name: name.into(),
            eligible_grades,
            coverage,
            current_recipients: 0,
            max_recipients,
        }
    }

    /// whether the program can take another recipient
    pub fn is_accepting(&self) -> bool {
        self.current_recipients < self.max_recipients
    }

    /// whether the grade level is in the eligible set
    pub fn is_eligible(&self, grade_level: u8) -> bool {
        self.eligible_grades.contains(&grade_level)
    }

    /// reduction applied to the post-discount total
    pub fn award_amount(&self, total_after_discounts: Money) -> Money {
        match self.coverage {
            BursaryCoverage::Percentage(rate) => total_after_discounts.percentage(rate),
            BursaryCoverage::Fixed(amount) => amount.min(total_after_discounts),
        }
    }

    /// take a recipient seat; the capacity check and increment are one step,
    /// failure maps to the bursary-full error
    pub fn try_award(&mut self) -> Result<()> {
        if self.current_recipients >= self.max_recipients {
            return Err(FeeError::BursaryFull {
                current: self.current_recipients,
                max: self.max_recipients,
            });
        }
        self.current_recipients += 1;
        Ok(())
    }

    /// release a recipient seat
    pub fn release(&mut self) {
        self.current_recipients = self.current_recipients.saturating_sub(1);
    }
}
