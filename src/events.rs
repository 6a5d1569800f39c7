use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{BursaryId, FeeId, FeeStatus, PaymentId, StudentId};

/// all events emitted by the fee calculator and payment ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // fee lifecycle
    FeeCreated {
        fee_id: FeeId,
        student_id: StudentId,
        total_amount_due: Money,
        due_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    FeeRecalculated {
        fee_id: FeeId,
        old_total: Money,
        new_total: Money,
        balance_due: Money,
        timestamp: DateTime<Utc>,
    },
    FeeDeleted {
        fee_id: FeeId,
        timestamp: DateTime<Utc>,
    },

    // payment lifecycle
    PaymentReceived {
        payment_id: PaymentId,
        fee_id: FeeId,
        amount: Money,
        receipt_number: String,
        new_balance: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentPending {
        payment_id: PaymentId,
        fee_id: FeeId,
        amount: Money,
        receipt_token: String,
        timestamp: DateTime<Utc>,
    },
    PaymentConfirmed {
        payment_id: PaymentId,
        fee_id: FeeId,
        amount: Money,
        receipt_number: String,
        new_balance: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentRefunded {
        payment_id: PaymentId,
        fee_id: FeeId,
        amount: Money,
        reason: String,
        new_balance: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentDeleted {
        payment_id: PaymentId,
        fee_id: FeeId,
        timestamp: DateTime<Utc>,
    },

    // bursary seats
    BursaryAwarded {
        bursary_id: BursaryId,
        fee_id: FeeId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    BursaryReleased {
        bursary_id: BursaryId,
        fee_id: FeeId,
        timestamp: DateTime<Utc>,
    },

    // status changes
    StatusChanged {
        fee_id: FeeId,
        old_status: FeeStatus,
        new_status: FeeStatus,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
