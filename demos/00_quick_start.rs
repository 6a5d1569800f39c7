/// quick start - compute a fee and take a payment
use chrono::NaiveDate;
use school_fees_rs::{
    Directory, EventStore, FeeCalculator, FeeRequest, FeeStructure, FrequencyTable, Money,
    PaymentFrequency, PaymentLedger, PaymentMethod, Rate, ReceiptSequence, SafeTimeProvider,
    Student, TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);
    let mut directory = Directory::new();
    let school_id = Uuid::new_v4();

    let student_id = directory.add_student(Student {
        id: Uuid::new_v4(),
        school_id,
        grade_level: 3,
        enrollment_date: NaiveDate::from_ymd_opt(2022, 9, 1).unwrap(),
        enrollment_active: true,
        parent_ids: vec![],
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

    // create the fee record for the year
    let request = FeeRequest::new(school_id, student_id, "2024-2025".into(), PaymentFrequency::Yearly);
    let mut events = EventStore::new();
    let mut fee = FeeCalculator::create_student_fee(&mut directory, &request, &time, &mut events)?;
    println!("amount due: {} by {}", fee.total_amount_due, fee.due_date);

    // take a payment
    let mut ledger = PaymentLedger::new(ReceiptSequence::new(school_id, "2024-2025".into()));
    let payment = ledger.record_payment(
        &mut fee,
        Money::from_major(5_000),
        PaymentMethod::BankTransfer,
        &time,
        &mut events,
    )?;
    println!("receipt {} / balance {}", payment.receipt_number, fee.balance_due);

    Ok(())
}
