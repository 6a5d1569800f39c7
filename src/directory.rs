use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::bursary::Bursary;
use crate::decimal::Money;
use crate::structure::FeeStructure;
use crate::types::{AcademicYear, ActivityId, BursaryId, ParentId, SchoolId, StudentId};

/// enrolled student with parent links
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub school_id: SchoolId,
    pub grade_level: u8,
    pub enrollment_date: NaiveDate,
    pub enrollment_active: bool,
    pub parent_ids: Vec<ParentId>,
}

/// active enrollment in a fee-bearing activity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEnrollment {
    pub activity_id: ActivityId,
    pub student_id: StudentId,
    pub academic_year: AcademicYear,
    pub fee: Money,
    pub active: bool,
}

/// in-memory reference-data store backing the calculator lookups:
/// fee structures, bursaries, students with parent links, and activity
/// enrollments
#[derive(Debug, Default)]
pub struct Directory {
    students: HashMap<StudentId, Student>,
    fee_structures: Vec<FeeStructure>,
    bursaries: HashMap<BursaryId, Bursary>,
    activity_enrollments: Vec<ActivityEnrollment>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_student(&mut self, student: Student) -> StudentId {
        let id = student.id;
        self.students.insert(id, student);
        id
    }

    pub fn add_fee_structure(&mut self, structure: FeeStructure) {
        self.fee_structures.push(structure);
    }

    pub fn add_bursary(&mut self, bursary: Bursary) -> BursaryId {
        let id = bursary.id;
        self.bursaries.insert(id, bursary);
        id
    }

    pub fn add_activity_enrollment(&mut self, enrollment: ActivityEnrollment) {
        self.activity_enrollments.push(enrollment);
    }

    pub fn student(&self, id: StudentId) -> Option<&Student> {
        self.students.get(&id)
    }

    pub fn bursary(&self, id: BursaryId) -> Option<&Bursary> {
        self.bursaries.get(&id)
    }

    pub fn bursary_mut(&mut self, id: BursaryId) -> Option<&mut Bursary> {
        self.bursaries.get_mut(&id)
    }

    /// fee structure matching school, grade and academic year
    pub fn fee_structure(
        &self,
        school_id: SchoolId,
        grade_level: u8,
        academic_year: &AcademicYear,
    ) -> Option<&FeeStructure> {
        self.fee_structures.iter().find(|s| {
            s.school_id == school_id
                && s.grade_level == grade_level
                && &s.academic_year == academic_year
        })
    }

    /// 1-based rank of the student among actively enrolled students sharing
    /// at least one parent in the same school, ordered by enrollment date
    /// ascending (ties broken by student id). A student with no linked
    /// parent is rank 1.
    pub fn sibling_order(&self, student: &Student) -> u32 {
        if student.parent_ids.is_empty() {
            return 1;
        }

        let mut siblings: Vec<&Student> = self
            .students
            .values()
            .filter(|s| {
                s.enrollment_active
                    && s.school_id == student.school_id
                    && s.parent_ids.iter().any(|p| student.parent_ids.contains(p))
            })
            .collect();
        siblings.sort_by_key(|s| (s.enrollment_date, s.id));

        siblings
            .iter()
            .position(|s| s.id == student.id)
            .map(|i| i as u32 + 1)
            .unwrap_or(1)
    }

    /// sum of active activity-enrollment fees for the student and year
    pub fn activity_fees(&self, student_id: StudentId, academic_year: &AcademicYear) -> Money {
        self.activity_enrollments
            .iter()
            .filter(|e| {
                e.active && e.student_id == student_id && &e.academic_year == academic_year
            })
            .fold(Money::ZERO, |total, e| total + e.fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn student(school: SchoolId, parents: Vec<ParentId>, enrolled: NaiveDate) -> Student {
        Student {
            id: Uuid::new_v4(),
            school_id: school,
            grade_level: 3,
            enrollment_date: enrolled,
            enrollment_active: true,
            parent_ids: parents,
        }
    }

    #[test]
    fn test_sibling_order_by_enrollment_date() {
        let school = Uuid::new_v4();
        let parent = Uuid::new_v4();
        let mut directory = Directory::new();

        let first = student(school, vec![parent], date(2020, 9, 1));
        let second = student(school, vec![parent], date(2022, 9, 1));
        let third = student(school, vec![parent], date(2024, 9, 1));
        let first_id = directory.add_student(first);
        let second_id = directory.add_student(second);
        let third_id = directory.add_student(third);

        // rank is independent of lookup order
        for (id, expected) in [(third_id, 3), (first_id, 1), (second_id, 2)] {
            let s = directory.student(id).unwrap();
            assert_eq!(directory.sibling_order(s), expected);
        }
    }

    #[test]
    fn test_sibling_order_without_parent() {
        let mut directory = Directory::new();
        let id = directory.add_student(student(Uuid::new_v4(), vec![], date(2021, 1, 10)));
        let s = directory.student(id).unwrap();
        assert_eq!(directory.sibling_order(s), 1);
    }

    #[test]
    fn test_sibling_order_ignores_inactive_and_other_schools() {
        let school = Uuid::new_v4();
        let parent = Uuid::new_v4();
        let mut directory = Directory::new();

        let mut withdrawn = student(school, vec![parent], date(2018, 9, 1));
        withdrawn.enrollment_active = false;
        directory.add_student(withdrawn);

        // same parent, different school
        directory.add_student(student(Uuid::new_v4(), vec![parent], date(2019, 9, 1)));

        let id = directory.add_student(student(school, vec![parent], date(2022, 9, 1)));
        let s = directory.student(id).unwrap();
        assert_eq!(directory.sibling_order(s), 1);
    }

    #[test]
    fn test_activity_fee_sum() {
        let mut directory = Directory::new();
        let student_id = Uuid::new_v4();
        let year: AcademicYear = "2024-2025".into();

        for (fee, active) in [(150, true), (75, true), (999, false)] {
            directory.add_activity_enrollment(ActivityEnrollment {
                activity_id: Uuid::new_v4(),
                student_id,
                academic_year: year.clone(),
                fee: Money::from_major(fee),
                active,
            });
        }
        // other year is excluded
        directory.add_activity_enrollment(ActivityEnrollment {
            activity_id: Uuid::new_v4(),
            student_id,
            academic_year: "2023-2024".into(),
            fee: Money::from_major(500),
            active: true,
        });

        assert_eq!(directory.activity_fees(student_id, &year), Money::from_major(225));
    }
}
