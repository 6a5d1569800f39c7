pub mod bursary;
pub mod calculator;
pub mod decimal;
pub mod directory;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod state;
pub mod structure;
pub mod types;

// re-export key types
pub use bursary::Bursary;
pub use calculator::{due_date_for, FeeCalculator, FeeRequest};
pub use decimal::{Money, Rate};
pub use directory::{ActivityEnrollment, Directory, Student};
pub use errors::{FeeError, Result};
pub use events::{Event, EventStore};
pub use ledger::{Payment, PaymentLedger, ReceiptSequence};
pub use state::StudentFee;
pub use structure::{FeeStructure, FrequencyTable};
pub use types::{
    AcademicYear, BursaryCoverage, FeeBreakdown, FeeStatus, PaymentFrequency, PaymentMethod,
    PaymentStatus,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
