use chrono::{Datelike, Duration, NaiveDate};
use hourglass_rs::SafeTimeProvider;

use crate::decimal::Money;
use crate::directory::Directory;
use crate::errors::{FeeError, Result};
use crate::events::{Event, EventStore};
use crate::state::StudentFee;
use crate::types::{
    AcademicYear, BursaryId, FeeBreakdown, PaymentFrequency, SchoolId, StudentId,
};

/// inputs for a fee calculation
#[derive(Debug, Clone)]
pub struct FeeRequest {
    pub school_id: SchoolId,
    pub student_id: StudentId,
    pub academic_year: AcademicYear,
    pub payment_frequency: PaymentFrequency,
    pub bursary_id: Option<BursaryId>,
    pub include_activities: bool,
    pub material_fees: Money,
    pub other_fees: Money,
}

impl FeeRequest {
    pub fn new(
        school_id: SchoolId,
        student_id: StudentId,
        academic_year: AcademicYear,
        payment_frequency: PaymentFrequency,
    ) -> Self {
        Self {
            school_id,
            student_id,
            academic_year,
            payment_frequency,
            bursary_id: None,
            include_activities: false,
            material_fees: Money::ZERO,
            other_fees: Money::ZERO,
        }
    }

    pub fn with_bursary(mut self, bursary_id: BursaryId) -> Self {
        self.bursary_id = Some(bursary_id);
        self
    }

    pub fn with_activities(mut self) -> Self {
        self.include_activities = true;
        self
    }

    pub fn with_material_fees(mut self, amount: Money) -> Self {
        self.material_fees = amount;
        self
    }

    pub fn with_other_fees(mut self, amount: Money) -> Self {
        self.other_fees = amount;
        self
    }
}

/// fee calculator: itemized breakdowns from reference data
pub struct FeeCalculator;

impl FeeCalculator {
    /// compute a fully itemized fee breakdown without persisting anything
    pub fn preview(
        directory: &Directory,
        request: &FeeRequest,
        time: &SafeTimeProvider,
    ) -> Result<FeeBreakdown> {
        let student = directory
            .student(request.student_id)
            .ok_or(FeeError::StudentNotFound {
                id: request.student_id,
            })?;
        if student.school_id != request.school_id {
            return Err(FeeError::SchoolMismatch {
                expected: request.school_id,
                found: student.school_id,
            });
        }

        let structure = directory
            .fee_structure(request.school_id, student.grade_level, &request.academic_year)
            .ok_or_else(|| FeeError::FeeStructureNotFound {
                grade: student.grade_level,
                year: request.academic_year.clone(),
            })?;

        let base_tuition = structure.base_amount(request.payment_frequency);

        let payment_discount_percent = structure.payment_discount(request.payment_frequency);
        let payment_discount_amount = base_tuition.percentage(payment_discount_percent);

        let sibling_order = directory.sibling_order(student);
        let sibling_discount_percent = structure.sibling_discount(sibling_order);
        let sibling_discount_amount = base_tuition.percentage(sibling_discount_percent);

        let activity_fees_amount = if request.include_activities {
            directory.activity_fees(request.student_id, &request.academic_year)
        } else {
            Money::ZERO
        };

        let total_before_discounts =
            base_tuition + activity_fees_amount + request.material_fees + request.other_fees;
        let total_discounts = payment_discount_amount + sibling_discount_amount;
        let total_after_discounts = total_before_discounts - total_discounts;

        let bursary_amount = match request.bursary_id {
            Some(id) => {
                let bursary = directory
                    .bursary(id)
                    .ok_or(FeeError::BursaryNotFound { id })?;
                if !bursary.is_eligible(student.grade_level) {
                    return Err(FeeError::BursaryIneligible {
                        name: bursary.name.clone(),
                        grade: student.grade_level,
                    });
                }
                if !bursary.is_accepting() {
                    return Err(FeeError::BursaryFull {
                        current: bursary.current_recipients,
                        max: bursary.max_recipients,
                    });
                }
                bursary.award_amount(total_after_discounts)
            }
            None => Money::ZERO,
        };

        let total_amount_due = (total_after_discounts - bursary_amount).max(Money::ZERO);
        let today = time.now().date_naive();

        Ok(FeeBreakdown {
            student_id: request.student_id,
            school_id: request.school_id,
            academic_year: request.academic_year.clone(),
            payment_frequency: request.payment_frequency,
            base_tuition_amount: base_tuition,
            activity_fees_amount,
            material_fees_amount: request.material_fees,
            other_fees_amount: request.other_fees,
            payment_discount_percent,
            payment_discount_amount,
            sibling_order,
            sibling_discount_percent,
            sibling_discount_amount,
            bursary_id: request.bursary_id,
            bursary_amount,
            total_before_discounts,
            total_discounts,
            total_amount_due,
            due_date: due_date_for(request.payment_frequency, today),
        })
    }

    /// compute and persist the fee record, taking the bursary seat
    pub fn create_student_fee(
        directory: &mut Directory,
        request: &FeeRequest,
        time: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<StudentFee> {
        let breakdown = Self::preview(directory, request, time)?;
        let now = time.now();

        if let Some(id) = breakdown.bursary_id {
            let bursary = directory
                .bursary_mut(id)
                .ok_or(FeeError::BursaryNotFound { id })?;
            bursary.try_award()?;
        }

        let fee = StudentFee::from_breakdown(&breakdown, now);

        if let Some(id) = fee.bursary_id {
            events.emit(Event::BursaryAwarded {
                bursary_id: id,
                fee_id: fee.id,
                amount: fee.bursary_amount,
                timestamp: now,
            });
        }
        events.emit(Event::FeeCreated {
            fee_id: fee.id,
            student_id: fee.student_id,
            total_amount_due: fee.total_amount_due,
            due_date: fee.due_date,
            timestamp: now,
        });

        Ok(fee)
    }
}

/// due date by payment frequency: yearly 30 days out, monthly the first of
/// the next calendar month, weekly 7 days out
pub fn due_date_for(frequency: PaymentFrequency, today: NaiveDate) -> NaiveDate {
    match frequency {
        PaymentFrequency::Yearly => today + Duration::days(30),
        PaymentFrequency::Weekly => today + Duration::days(7),
        PaymentFrequency::Monthly => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            // first of a valid month always exists
            NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(today)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bursary::Bursary;
    use crate::decimal::Rate;
    use crate::directory::{ActivityEnrollment, Student};
    use crate::structure::{FeeStructure, FrequencyTable};
    use crate::types::BursaryCoverage;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn test_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 9, 2, 9, 0, 0).unwrap(),
        ))
    }

    fn seed_directory() -> (Directory, SchoolId, StudentId) {
        let mut directory = Directory::new();
        let school_id = Uuid::new_v4();
        let parent_id = Uuid::new_v4();

        // older sibling enrolled first
        directory.add_student(Student {
            id: Uuid::new_v4(),
            school_id,
            grade_level: 5,
            enrollment_date: NaiveDate::from_ymd_opt(2020, 9, 1).unwrap(),
            enrollment_active: true,
            parent_ids: vec![parent_id],
        });

        let student_id = directory.add_student(Student {
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

        (directory, school_id, student_id)
    }

    #[test]
    fn test_second_sibling_breakdown() {
        // grade 3, yearly base 10000, 5% payment discount, 10% second-sibling
        // discount, 200 in material fees
        let (directory, school_id, student_id) = seed_directory();
        let request = FeeRequest::new(school_id, student_id, "2024-2025".into(), PaymentFrequency::Yearly)
            .with_material_fees(Money::from_major(200));

        let b = FeeCalculator::preview(&directory, &request, &test_time()).unwrap();

        assert_eq!(b.sibling_order, 2);
        assert_eq!(b.payment_discount_amount, Money::from_major(500));
        assert_eq!(b.sibling_discount_amount, Money::from_major(1_000));
        assert_eq!(b.total_before_discounts, Money::from_major(10_200));
        assert_eq!(b.total_discounts, Money::from_major(1_500));
        assert_eq!(b.total_amount_due, Money::from_major(8_700));
        assert_eq!(b.due_date, NaiveDate::from_ymd_opt(2024, 10, 2).unwrap());
    }

    #[test]
    fn test_activities_included_only_on_request() {
        let (mut directory, school_id, student_id) = seed_directory();
        directory.add_activity_enrollment(ActivityEnrollment {
            activity_id: Uuid::new_v4(),
            student_id,
            academic_year: "2024-2025".into(),
            fee: Money::from_major(300),
            active: true,
        });

        let base = FeeRequest::new(
            school_id,
            student_id,
            "2024-2025".into(),
            PaymentFrequency::Yearly,
        );
        let without = FeeCalculator::preview(&directory, &base, &test_time()).unwrap();
        assert_eq!(without.activity_fees_amount, Money::ZERO);

        let with = FeeCalculator::preview(&directory, &base.clone().with_activities(), &test_time())
            .unwrap();
        assert_eq!(with.activity_fees_amount, Money::from_major(300));
        assert_eq!(
            with.total_before_discounts,
            without.total_before_discounts + Money::from_major(300)
        );
    }

    #[test]
    fn test_missing_fee_structure() {
        let (directory, school_id, student_id) = seed_directory();
        let request = FeeRequest::new(
            school_id,
            student_id,
            "2030-2031".into(),
            PaymentFrequency::Yearly,
        );
        assert!(matches!(
            FeeCalculator::preview(&directory, &request, &test_time()),
            Err(FeeError::FeeStructureNotFound { grade: 3, .. })
        ));
    }

    #[test]
    fn test_bursary_applied_after_discounts() {
        let (mut directory, school_id, student_id) = seed_directory();
        let bursary_id = directory.add_bursary(Bursary::new(
            school_id,
            "STEM Scholars",
            [3].into_iter().collect(),
            BursaryCoverage::Percentage(Rate::from_decimal(dec!(50))),
            10,
        ));

        let request = FeeRequest::new(
            school_id,
            student_id,
            "2024-2025".into(),
            PaymentFrequency::Yearly,
        )
        .with_bursary(bursary_id);

        let b = FeeCalculator::preview(&directory, &request, &test_time()).unwrap();
        // 10000 - 1500 discounts = 8500; 50% bursary = 4250
        assert_eq!(b.bursary_amount, Money::from_major(4_250));
        assert_eq!(b.total_amount_due, Money::from_major(4_250));
    }

    #[test]
    fn test_bursary_ineligible_grade() {
        let (mut directory, school_id, student_id) = seed_directory();
        let bursary_id = directory.add_bursary(Bursary::new(
            school_id,
            "Seniors Only",
            [11, 12].into_iter().collect(),
            BursaryCoverage::Fixed(Money::from_major(1_000)),
            10,
        ));

        let request = FeeRequest::new(
            school_id,
            student_id,
            "2024-2025".into(),
            PaymentFrequency::Yearly,
        )
        .with_bursary(bursary_id);

        assert!(matches!(
            FeeCalculator::preview(&directory, &request, &test_time()),
            Err(FeeError::BursaryIneligible { grade: 3, .. })
        ));
    }

    #[test]
    fn test_total_never_negative() {
        let (mut directory, school_id, student_id) = seed_directory();
        let bursary_id = directory.add_bursary(Bursary::new(
            school_id,
            "Full Ride",
            [3].into_iter().collect(),
            BursaryCoverage::Percentage(Rate::from_decimal(dec!(100))),
            10,
        ));

        let request = FeeRequest::new(
            school_id,
            student_id,
            "2024-2025".into(),
            PaymentFrequency::Yearly,
        )
        .with_bursary(bursary_id);

        let b = FeeCalculator::preview(&directory, &request, &test_time()).unwrap();
        assert_eq!(b.total_amount_due, Money::ZERO);
    }

    #[test]
    fn test_create_takes_bursary_seat() {
        let (mut directory, school_id, student_id) = seed_directory();
        let bursary_id = directory.add_bursary(Bursary::new(
            school_id,
            "One Seat",
            [3].into_iter().collect(),
            BursaryCoverage::Fixed(Money::from_major(500)),
            1,
        ));

        let request = FeeRequest::new(
            school_id,
            student_id,
            "2024-2025".into(),
            PaymentFrequency::Yearly,
        )
        .with_bursary(bursary_id);

        let mut events = EventStore::new();
        let time = test_time();
        let fee =
            FeeCalculator::create_student_fee(&mut directory, &request, &time, &mut events).unwrap();
        assert_eq!(fee.bursary_id, Some(bursary_id));
        assert_eq!(directory.bursary(bursary_id).unwrap().current_recipients, 1);
        assert!(events
            .events()
            .iter()
            .any(|e| matches!(e, Event::BursaryAwarded { .. })));

        // seat taken, a second fee against the same program fails
        assert!(matches!(
            FeeCalculator::create_student_fee(&mut directory, &request, &time, &mut events),
            Err(FeeError::BursaryFull { .. })
        ));
    }

    #[test]
    fn test_due_dates() {
        let sep = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
        assert_eq!(
            due_date_for(PaymentFrequency::Yearly, sep),
            NaiveDate::from_ymd_opt(2024, 10, 2).unwrap()
        );
        assert_eq!(
            due_date_for(PaymentFrequency::Weekly, sep),
            NaiveDate::from_ymd_opt(2024, 9, 9).unwrap()
        );
        assert_eq!(
            due_date_for(PaymentFrequency::Monthly, sep),
            NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()
        );

        // december rolls into january of the next year
        let dec = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        assert_eq!(
            due_date_for(PaymentFrequency::Monthly, dec),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_preview_is_pure() {
        let (mut directory, school_id, student_id) = seed_directory();
        let bursary_id = directory.add_bursary(Bursary::new(
            school_id,
            "STEM Scholars",
            [3].into_iter().collect(),
            BursaryCoverage::Fixed(Money::from_major(500)),
            3,
        ));

        let request = FeeRequest::new(
            school_id,
            student_id,
            "2024-2025".into(),
            PaymentFrequency::Yearly,
        )
        .with_bursary(bursary_id);

        FeeCalculator::preview(&directory, &request, &test_time()).unwrap();
        assert_eq!(directory.bursary(bursary_id).unwrap().current_recipients, 0);
    }
}
