use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{AcademicYear, SchoolId};

/// fixed prefix for permanent receipt numbers
const RECEIPT_PREFIX: &str = "RCP";
/// prefix for temporary pending-payment tokens
const PENDING_PREFIX: &str = "TMP";

/// sequential receipt numbering scoped to one (school, academic year)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptSequence {
    pub school_id: SchoolId,
    pub academic_year: AcademicYear,
    next: u32,
}

impl ReceiptSequence {
    pub fn new(school_id: SchoolId, academic_year: AcademicYear) -> Self {
        Self {
            school_id,
            academic_year,
            next: 1,
        }
    }

    /// issue the next permanent receipt number, e.g. RCP-2024-2025-00001
    pub fn next_number(&mut self) -> String {
        let number = format!("{}-{}-{:05}", RECEIPT_PREFIX, self.academic_year, self.next);
        self.next += 1;
        number
    }

    /// temporary token for a pending payment, never part of the sequence
    pub fn pending_token() -> String {
        format!("{}-{}", PENDING_PREFIX, Uuid::new_v4().simple())
    }

    /// count of receipts issued so far
    pub fn issued(&self) -> u32 {
        self.next - 1
    }
}
