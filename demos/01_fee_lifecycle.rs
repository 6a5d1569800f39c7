/// fee lifecycle - siblings, bursary, pending payments, refunds
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use school_fees_rs::{
    Bursary, BursaryCoverage, Directory, EventStore, FeeCalculator, FeeRequest, FeeStructure,
    FrequencyTable, Money, PaymentFrequency, PaymentLedger, PaymentMethod, Rate, ReceiptSequence,
    SafeTimeProvider, Student, TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);
    let mut directory = Directory::new();
    let school_id = Uuid::new_v4();
    let parent_id = Uuid::new_v4();

    // two siblings, the younger enrolled later
    directory.add_student(Student {
        id: Uuid::new_v4(),
        school_id,
        grade_level: 5,
        enrollment_date: NaiveDate::from_ymd_opt(2020, 9, 1).unwrap(),
        enrollment_active: true,
        parent_ids: vec![parent_id],
    });
    let younger = directory.add_student(Student {
        id: Uuid::new_v4(),
        school_id,
        grade_level: 3,
        enrollment_date: NaiveDate::from_ymd_opt(2022, 9, 1).unwrap(),
        enrollment_active: true,
        parent_ids: vec![parent_id],
    });

    directory.add_fee_structure(FeeStructure::new(
        school_id,
        3,
        "2024-2025".into(),
        FrequencyTable {
            yearly: Money::from_major(10_000),
            monthly: Money::from_major(900),
            weekly: Money::from_major(250),
        },
        FrequencyTable {
            yearly: Rate::from_percentage(5),
            monthly: Rate::from_percentage(2),
            weekly: Rate::ZERO,
        },
        vec![Rate::ZERO, Rate::from_percentage(10)],
    ));

    let bursary_id = directory.add_bursary(Bursary::new(
        school_id,
        "STEM Scholars",
        [3, 4, 5].into_iter().collect(),
        BursaryCoverage::Percentage(Rate::from_decimal(dec!(25))),
        10,
    ));

    let request = FeeRequest::new(school_id, younger, "2024-2025".into(), PaymentFrequency::Yearly)
        .with_bursary(bursary_id)
        .with_material_fees(Money::from_major(200));

    let mut events = EventStore::new();
    let mut fee = FeeCalculator::create_student_fee(&mut directory, &request, &time, &mut events)?;
    println!(
        "sibling #{}: {} - {} discounts - {} bursary = {} due",
        fee.sibling_order,
        fee.total_before_discounts,
        fee.total_discounts,
        fee.bursary_amount,
        fee.total_amount_due,
    );

    let mut ledger = PaymentLedger::new(ReceiptSequence::new(school_id, "2024-2025".into()));

    // a cheque comes in as a hold, then clears
    let mut hold = ledger.create_pending_payment(
        &fee,
        Money::from_major(2_000),
        PaymentMethod::Cheque,
        &time,
        &mut events,
    )?;
    println!("hold {} (no ledger effect)", hold.receipt_number);
    ledger.confirm_payment(&mut fee, &mut hold, &time, &mut events)?;
    println!("cleared as {} / balance {}", hold.receipt_number, fee.balance_due);

    // a duplicate card charge gets refunded
    let mut duplicate = ledger.record_payment(
        &mut fee,
        Money::from_major(1_000),
        PaymentMethod::Card,
        &time,
        &mut events,
    )?;
    ledger.refund_payment(&mut fee, &mut duplicate, "duplicate charge", &time, &mut events)?;
    println!("after refund: balance {} status {:?}", fee.balance_due, fee.status);

    for event in events.take_events() {
        println!("event: {:?}", event);
    }

    Ok(())
}
