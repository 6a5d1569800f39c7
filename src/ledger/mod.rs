pub mod receipt;

use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculator::{FeeCalculator, FeeRequest};
use crate::decimal::Money;
use crate::directory::Directory;
use crate::errors::{FeeError, Result};
use crate::events::{Event, EventStore};
use crate::state::StudentFee;
use crate::types::{FeeId, PaymentId, PaymentMethod, PaymentStatus};

pub use receipt::ReceiptSequence;

/// record of funds applied (or pending application) to a student fee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub fee_id: FeeId,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// temporary token while pending, permanent sequential number once completed
    pub receipt_number: String,
    pub refund_reason: Option<String>,
    pub deleted: bool,
    pub created: DateTime<Utc>,
}

impl Payment {
    /// completed and not yet refunded
    pub fn can_be_refunded(&self) -> bool {
        self.status == PaymentStatus::Completed
    }
}

/// payment ledger: applies payments to student fees, owns the receipt
/// sequence for its (school, academic year) scope
#[derive(Debug)]
pub struct PaymentLedger {
    receipts: ReceiptSequence,
}

impl PaymentLedger {
    pub fn new(receipts: ReceiptSequence) -> Self {
        Self { receipts }
    }

    pub fn receipts(&self) -> &ReceiptSequence {
        &self.receipts
    }

    fn guard_live(fee: &StudentFee) -> Result<()> {
        if fee.deleted {
            return Err(FeeError::FeeDeleted);
        }
        Ok(())
    }

    fn guard_amount(amount: Money) -> Result<()> {
        if !amount.is_positive() {
            return Err(FeeError::InvalidPaymentAmount { amount });
        }
        Ok(())
    }

    fn guard_balance(fee: &StudentFee, amount: Money) -> Result<()> {
        if amount > fee.balance_due {
            return Err(FeeError::Overpayment {
                balance: fee.balance_due,
                requested: amount,
            });
        }
        Ok(())
    }

    fn guard_owner(fee: &StudentFee, payment: &Payment) -> Result<()> {
        if payment.fee_id != fee.id {
            return Err(FeeError::PaymentNotFound { id: payment.id });
        }
        Ok(())
    }

    fn guard_payment_live(payment: &Payment) -> Result<()> {
        if payment.deleted {
            return Err(FeeError::PaymentDeleted { id: payment.id });
        }
        Ok(())
    }

    /// record a completed payment against the fee
    ///
    /// The overpayment guard is strict: a request above the balance is
    /// rejected whole, never partially accepted.
    pub fn record_payment(
        &mut self,
        fee: &mut StudentFee,
        amount: Money,
        method: PaymentMethod,
        time: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<Payment> {
        Self::guard_live(fee)?;
        Self::guard_amount(amount)?;
        Self::guard_balance(fee, amount)?;

        let now = time.now();
        let old_status = fee.status;
        let payment = Payment {
            id: Uuid::new_v4(),
            fee_id: fee.id,
            amount,
            payment_date: now.date_naive(),
            method,
            status: PaymentStatus::Completed,
            receipt_number: self.receipts.next_number(),
            refund_reason: None,
            deleted: false,
            created: now,
        };

        fee.apply_payment(amount, now);

        events.emit(Event::PaymentReceived {
            payment_id: payment.id,
            fee_id: fee.id,
            amount,
            receipt_number: payment.receipt_number.clone(),
            new_balance: fee.balance_due,
            timestamp: now,
        });
        if fee.status != old_status {
            events.emit(Event::StatusChanged {
                fee_id: fee.id,
                old_status,
                new_status: fee.status,
                timestamp: now,
            });
        }

        Ok(payment)
    }

    /// record a pending payment: a hold with no ledger effect
    ///
    /// The live-balance guard is intentionally not applied here; a hold may
    /// reserve funds before confirmation.
    pub fn create_pending_payment(
        &self,
        fee: &StudentFee,
        amount: Money,
        method: PaymentMethod,
        time: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<Payment> {
        Self::guard_live(fee)?;
        Self::guard_amount(amount)?;

        let now = time.now();
        let payment = Payment {
            id: Uuid::new_v4(),
            fee_id: fee.id,
            amount,
            payment_date: now.date_naive(),
            method,
            status: PaymentStatus::Pending,
            receipt_number: ReceiptSequence::pending_token(),
            refund_reason: None,
            deleted: false,
            created: now,
        };

        events.emit(Event::PaymentPending {
            payment_id: payment.id,
            fee_id: fee.id,
            amount,
            receipt_token: payment.receipt_number.clone(),
            timestamp: now,
        });

        Ok(payment)
    }

    /// confirm a pending payment: assign a permanent receipt number and
    /// apply the identical balance-update rule as `record_payment`
    ///
    /// The overpayment guard re-checks the live balance; a rejected
    /// confirmation leaves the payment pending.
    pub fn confirm_payment(
        &mut self,
        fee: &mut StudentFee,
        payment: &mut Payment,
        time: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<()> {
        Self::guard_live(fee)?;
        Self::guard_owner(fee, payment)?;
        Self::guard_payment_live(payment)?;
        if payment.status != PaymentStatus::Pending {
            return Err(FeeError::InvalidPaymentState {
                current: payment.status,
                expected: PaymentStatus::Pending,
            });
        }
        Self::guard_balance(fee, payment.amount)?;

        let now = time.now();
        let old_status = fee.status;
        payment.status = PaymentStatus::Completed;
        payment.receipt_number = self.receipts.next_number();

        fee.apply_payment(payment.amount, now);

        events.emit(Event::PaymentConfirmed {
            payment_id: payment.id,
            fee_id: fee.id,
            amount: payment.amount,
            receipt_number: payment.receipt_number.clone(),
            new_balance: fee.balance_due,
            timestamp: now,
        });
        if fee.status != old_status {
            events.emit(Event::StatusChanged {
                fee_id: fee.id,
                old_status,
                new_status: fee.status,
                timestamp: now,
            });
        }

        Ok(())
    }

    /// refund a completed payment, reversing its ledger effect
    pub fn refund_payment(
        &mut self,
        fee: &mut StudentFee,
        payment: &mut Payment,
        reason: impl Into<String>,
        time: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<()> {
        Self::guard_live(fee)?;
        Self::guard_owner(fee, payment)?;
        Self::guard_payment_live(payment)?;
        if !payment.can_be_refunded() {
            return Err(FeeError::InvalidPaymentState {
                current: payment.status,
                expected: PaymentStatus::Completed,
            });
        }

        let now = time.now();
        let old_status = fee.status;
        let reason = reason.into();
        payment.status = PaymentStatus::Refunded;
        payment.refund_reason = Some(reason.clone());

        fee.reverse_payment(payment.amount, now);

        events.emit(Event::PaymentRefunded {
            payment_id: payment.id,
            fee_id: fee.id,
            amount: payment.amount,
            reason,
            new_balance: fee.balance_due,
            timestamp: now,
        });
        if fee.status != old_status {
            events.emit(Event::StatusChanged {
                fee_id: fee.id,
                old_status,
                new_status: fee.status,
                timestamp: now,
            });
        }

        Ok(())
    }

    /// soft-delete a payment that never touched the balance
    ///
    /// Completed payments are not deletable; the audit-preserving path is a
    /// refund.
    pub fn delete_payment(
        &mut self,
        fee: &StudentFee,
        payment: &mut Payment,
        time: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<()> {
        Self::guard_owner(fee, payment)?;
        Self::guard_payment_live(payment)?;
        if payment.status == PaymentStatus::Completed {
            return Err(FeeError::CompletedPaymentNotDeletable);
        }

        payment.deleted = true;
        events.emit(Event::PaymentDeleted {
            payment_id: payment.id,
            fee_id: fee.id,
            timestamp: time.now(),
        });

        Ok(())
    }

    /// re-run the calculator with changed inputs and overwrite the fee's
    /// derived fields; already-paid amount carries over unchanged
    ///
    /// Bursary attach/detach pairs the recipient-seat award/release.
    pub fn recalculate_fee(
        &mut self,
        directory: &mut Directory,
        fee: &mut StudentFee,
        request: &FeeRequest,
        time: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<()> {
        Self::guard_live(fee)?;

        let old_bursary = fee.bursary_id;

        // a kept bursary already holds its seat; release it around the
        // preview so the capacity check does not count the fee twice,
        // restoring on failure
        let keeping_seat = old_bursary.is_some() && old_bursary == request.bursary_id;
        if keeping_seat {
            if let Some(bursary) = directory.bursary_mut(old_bursary.unwrap()) {
                bursary.release();
            }
        }

        let breakdown = match FeeCalculator::preview(directory, request, time) {
            Ok(b) => b,
            Err(e) => {
                if keeping_seat {
                    if let Some(bursary) = directory.bursary_mut(old_bursary.unwrap()) {
                        let _ = bursary.try_award();
                    }
                }
                return Err(e);
            }
        };

        let now = time.now();

        if let Some(new_id) = breakdown.bursary_id {
            let bursary = directory
                .bursary_mut(new_id)
                .ok_or(FeeError::BursaryNotFound { id: new_id })?;
            bursary.try_award()?;
            if old_bursary != Some(new_id) {
                events.emit(Event::BursaryAwarded {
                    bursary_id: new_id,
                    fee_id: fee.id,
                    amount: breakdown.bursary_amount,
                    timestamp: now,
                });
            }
        }
        if let Some(old_id) = old_bursary {
            if !keeping_seat {
                if let Some(bursary) = directory.bursary_mut(old_id) {
                    bursary.release();
                }
                events.emit(Event::BursaryReleased {
                    bursary_id: old_id,
                    fee_id: fee.id,
                    timestamp: now,
                });
            }
        }

        let old_total = fee.total_amount_due;
        fee.apply_recalculation(&breakdown, now);

        events.emit(Event::FeeRecalculated {
            fee_id: fee.id,
            old_total,
            new_total: fee.total_amount_due,
            balance_due: fee.balance_due,
            timestamp: now,
        });

        Ok(())
    }

    /// soft-delete a fee, rolling back its bursary seat if attached
    pub fn delete_fee(
        &mut self,
        directory: &mut Directory,
        fee: &mut StudentFee,
        time: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<()> {
        Self::guard_live(fee)?;

        let now = time.now();
        if let Some(bursary_id) = fee.bursary_id {
            if let Some(bursary) = directory.bursary_mut(bursary_id) {
                bursary.release();
            }
            events.emit(Event::BursaryReleased {
                bursary_id,
                fee_id: fee.id,
                timestamp: now,
            });
        }

        fee.soft_delete(now);
        events.emit(Event::FeeDeleted {
            fee_id: fee.id,
            timestamp: now,
        });

        Ok(())
    }
}
