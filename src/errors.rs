use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{AcademicYear, PaymentStatus};

#[derive(Error, Debug)]
pub enum FeeError {
    #[error("no fee structure for grade {grade} in {year}")]
    FeeStructureNotFound {
        grade: u8,
        year: AcademicYear,
    },

    #[error("student not found: {id}")]
    StudentNotFound {
        id: Uuid,
    },

    #[error("bursary not found: {id}")]
    BursaryNotFound {
        id: Uuid,
    },

    #[error("payment not found: {id}")]
    PaymentNotFound {
        id: Uuid,
    },

    #[error("record does not belong to school {expected}: found {found}")]
    SchoolMismatch {
        expected: Uuid,
        found: Uuid,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("overpayment: balance due {balance}, requested {requested}")]
    Overpayment {
        balance: Money,
        requested: Money,
    },

    #[error("invalid payment state: current {current:?}, expected {expected:?}")]
    InvalidPaymentState {
        current: PaymentStatus,
        expected: PaymentStatus,
    },

    #[error("completed payments cannot be deleted, refund instead")]
    CompletedPaymentNotDeletable,

    #[error("payment already deleted: {id}")]
    PaymentDeleted {
        id: Uuid,
    },

    #[error("bursary at capacity: {current} of {max} recipients")]
    BursaryFull {
        current: u32,
        max: u32,
    },

    #[error("student grade {grade} not eligible for bursary {name}")]
    BursaryIneligible {
        name: String,
        grade: u8,
    },

    #[error("fee already deleted")]
    FeeDeleted,
}

pub type Result<T> = std::result::Result<T, FeeError>;
