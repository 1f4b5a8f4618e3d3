use std::sync::Arc;

use super::common::*;
use crate::academics::catalog::{CurricularSpace, MemoryCatalog, Program, StudyPlan, Term};
use crate::academics::domain::{
    AdminCondition, ConditionCode, FileStatus, MovementKind, PlanId, ProgramId,
};
use crate::academics::ledger::{AcademicLedger, MemoryLedger};
use crate::academics::rules::{CatalogRules, Purpose};
use crate::academics::validation::{MovementRejection, MovementValidator, ValidationError};

type TestValidator = MovementValidator<MemoryLedger, MemoryCatalog, CatalogRules<MemoryCatalog>>;

fn validator(ledger: Arc<MemoryLedger>, catalog: Arc<MemoryCatalog>) -> TestValidator {
    let rules = Arc::new(CatalogRules::new(catalog.clone()));
    MovementValidator::new(ledger, catalog, rules)
}

fn expect_rejection(result: Result<crate::academics::domain::Movement, ValidationError>) -> MovementRejection {
    match result {
        Err(ValidationError::Rejected(rejection)) => rejection,
        other => panic!("expected a rejection, got {other:?}"),
    }
}

#[test]
fn condition_must_match_the_movement_kind() {
    let validator = validator(ledger(), catalog());

    let mut draft = exam_draft("alg-1", ConditionCode::ExamRegular, Some(7.0));
    draft.condition = ConditionCode::Regular;

    let rejection = expect_rejection(validator.validate(draft));
    assert!(matches!(
        rejection,
        MovementRejection::ConditionKindMismatch {
            condition: ConditionCode::Regular,
            kind: MovementKind::Exam,
        }
    ));
}

#[test]
fn grades_outside_the_scale_are_rejected() {
    let validator = validator(ledger(), catalog());

    let mut draft = course_draft("alg-1", ConditionCode::Promoted);
    draft.grade = Some(11.0);

    let rejection = expect_rejection(validator.validate(draft));
    assert!(matches!(
        rejection,
        MovementRejection::GradeOutOfRange { grade } if grade == 11.0
    ));
}

#[test]
fn free_conditions_cannot_follow_an_earned_regularity() {
    let ledger = ledger();
    ledger
        .append_movement(course_movement(
            "alg-1",
            ConditionCode::Regular,
            Some(date(2024, 11, 20)),
        ))
        .expect("append");
    let validator = validator(ledger, catalog());

    let rejection =
        expect_rejection(validator.validate(course_draft("alg-1", ConditionCode::FreeByAbsence)));
    assert_eq!(rejection, MovementRejection::FreeAfterRegular);
}

#[test]
fn conditional_enrollments_cannot_approve_through_coursework() {
    let ledger = MemoryLedger::new();
    ledger
        .add_enrollment(enrollment(FileStatus::Complete, AdminCondition::Conditional))
        .expect("enrollment inserts");
    let validator = validator(Arc::new(ledger), catalog());

    let rejection =
        expect_rejection(validator.validate(course_draft("alg-1", ConditionCode::Promoted)));
    assert!(matches!(
        rejection,
        MovementRejection::ConditionalCannotApprove {
            condition: ConditionCode::Promoted
        }
    ));

    // Regularity is still within reach for conditional students.
    let ledger = MemoryLedger::new();
    ledger
        .add_enrollment(enrollment(FileStatus::Complete, AdminCondition::Conditional))
        .expect("enrollment inserts");
    let validator = self::validator(Arc::new(ledger), catalog());
    validator
        .validate(course_draft("alg-1", ConditionCode::Regular))
        .expect("regularity accepted");
}

#[test]
fn incomplete_files_block_exam_movements() {
    let ledger = MemoryLedger::new();
    ledger
        .add_enrollment(enrollment(FileStatus::Incomplete, AdminCondition::Regular))
        .expect("enrollment inserts");
    let validator = validator(Arc::new(ledger), catalog());

    let rejection =
        expect_rejection(validator.validate(exam_draft("alg-1", ConditionCode::ExamRegular, Some(7.0))));
    assert_eq!(rejection, MovementRejection::FileIncomplete);
}

#[test]
fn a_present_final_needs_a_grade() {
    let ledger = ledger();
    ledger
        .append_movement(course_movement(
            "alg-1",
            ConditionCode::Regular,
            Some(date(2024, 11, 20)),
        ))
        .expect("append");
    let validator = validator(ledger, catalog());

    let rejection =
        expect_rejection(validator.validate(exam_draft("alg-1", ConditionCode::ExamRegular, None)));
    assert_eq!(rejection, MovementRejection::GradeOrAbsenceRequired);
}

#[test]
fn finals_below_six_do_not_pass() {
    let ledger = ledger();
    ledger
        .append_movement(course_movement(
            "alg-1",
            ConditionCode::Regular,
            Some(date(2024, 11, 20)),
        ))
        .expect("append");
    let validator = validator(ledger, catalog());

    let rejection =
        expect_rejection(validator.validate(exam_draft("alg-1", ConditionCode::ExamRegular, Some(4.0))));
    assert!(matches!(
        rejection,
        MovementRejection::BelowPassingGrade { grade } if grade == 4.0
    ));
}

#[test]
fn a_regularity_older_than_two_years_no_longer_qualifies() {
    let ledger = ledger();
    ledger
        .append_movement(course_movement(
            "alg-1",
            ConditionCode::Regular,
            Some(date(2022, 11, 20)),
        ))
        .expect("append");
    let validator = validator(ledger, catalog());

    // Draft is dated 2025-07-04, more than 730 days later.
    let rejection =
        expect_rejection(validator.validate(exam_draft("alg-1", ConditionCode::ExamRegular, Some(8.0))));
    assert_eq!(rejection, MovementRejection::RegularityExpired);
}

#[test]
fn a_recent_regularity_carries_the_final() {
    let ledger = ledger();
    ledger
        .append_movement(course_movement(
            "alg-1",
            ConditionCode::Regular,
            Some(date(2024, 11, 20)),
        ))
        .expect("append");
    let validator = validator(ledger, catalog());

    let movement = validator
        .validate(exam_draft("alg-1", ConditionCode::ExamRegular, Some(8.0)))
        .expect("final accepted");
    assert_eq!(movement.condition, ConditionCode::ExamRegular);
    assert_eq!(movement.grade, Some(8.0));
}

#[test]
fn walk_in_finals_need_the_space_to_allow_them() {
    let validator = validator(ledger(), catalog());

    let rejection =
        expect_rejection(validator.validate(exam_draft("alg-1", ConditionCode::WalkIn, Some(7.0))));
    assert_eq!(rejection, MovementRejection::WalkInNotPermitted);

    let validator = self::validator(ledger(), catalog());
    validator
        .validate(exam_draft("geo-1", ConditionCode::WalkIn, Some(7.0)))
        .expect("walk-in accepted where the space allows it");
}

#[test]
fn current_regulars_cannot_sit_as_walk_ins() {
    let ledger = ledger();
    ledger
        .append_movement(course_movement(
            "geo-1",
            ConditionCode::Regular,
            Some(date(2024, 11, 20)),
        ))
        .expect("append");
    let validator = validator(ledger, catalog());

    let rejection =
        expect_rejection(validator.validate(exam_draft("geo-1", ConditionCode::WalkIn, Some(7.0))));
    assert_eq!(rejection, MovementRejection::RegularMustSitAsRegular);
}

#[test]
fn walk_ins_on_an_approved_space_are_rejected() {
    let ledger = ledger();
    ledger
        .append_movement(exam_movement(
            "geo-1",
            ConditionCode::ExamRegular,
            Some(9.0),
            Some(date(2024, 11, 20)),
        ))
        .expect("append");
    let validator = validator(ledger, catalog());

    let rejection =
        expect_rejection(validator.validate(exam_draft("geo-1", ConditionCode::WalkIn, Some(7.0))));
    assert_eq!(rejection, MovementRejection::AlreadyApproved);
}

#[test]
fn three_counted_attempts_exhaust_the_space() {
    let ledger = ledger();
    ledger
        .append_movement(course_movement(
            "alg-1",
            ConditionCode::Regular,
            Some(date(2024, 11, 20)),
        ))
        .expect("append");
    for month in [2, 3, 5] {
        ledger
            .append_movement(exam_movement(
                "alg-1",
                ConditionCode::ExamRegular,
                Some(2.0),
                Some(date(2025, month, 10)),
            ))
            .expect("append");
    }
    let validator = validator(ledger, catalog());

    let rejection =
        expect_rejection(validator.validate(exam_draft("alg-1", ConditionCode::ExamRegular, Some(7.0))));
    assert!(matches!(
        rejection,
        MovementRejection::AttemptCeilingReached { attempts: 3 }
    ));
}

#[test]
fn justified_absences_do_not_count_toward_the_ceiling() {
    let ledger = ledger();
    ledger
        .append_movement(course_movement(
            "alg-1",
            ConditionCode::Regular,
            Some(date(2024, 11, 20)),
        ))
        .expect("append");
    for month in [2, 3] {
        ledger
            .append_movement(exam_movement(
                "alg-1",
                ConditionCode::ExamRegular,
                Some(2.0),
                Some(date(2025, month, 10)),
            ))
            .expect("append");
    }
    let mut excused = exam_movement("alg-1", ConditionCode::ExamRegular, None, Some(date(2025, 5, 10)));
    excused.absent = true;
    excused.absence_justified = true;
    ledger.append_movement(excused).expect("append");
    let validator = validator(ledger, catalog());

    validator
        .validate(exam_draft("alg-1", ConditionCode::ExamRegular, Some(7.0)))
        .expect("third counted attempt accepted");
}

#[test]
fn a_passed_final_blocks_further_sittings() {
    let ledger = ledger();
    ledger
        .append_movement(course_movement(
            "alg-1",
            ConditionCode::Regular,
            Some(date(2024, 11, 20)),
        ))
        .expect("append");
    ledger
        .append_movement(exam_movement(
            "alg-1",
            ConditionCode::ExamRegular,
            Some(6.0),
            Some(date(2025, 2, 10)),
        ))
        .expect("append");
    let validator = validator(ledger, catalog());

    let rejection =
        expect_rejection(validator.validate(exam_draft("alg-1", ConditionCode::ExamRegular, Some(8.0))));
    assert_eq!(rejection, MovementRejection::AlreadyPassedFinal);
}

#[test]
fn spaces_from_another_program_are_rejected() {
    let catalog = catalog();
    catalog
        .add_program(Program {
            id: ProgramId("prog-2".to_string()),
            name: "Profesorado de Historia".to_string(),
            abbreviation: None,
        })
        .expect("program inserts");
    catalog
        .add_plan(StudyPlan {
            id: PlanId("plan-h".to_string()),
            program: ProgramId("prog-2".to_string()),
            resolution: "77/18".to_string(),
            name: None,
            current: true,
        })
        .expect("plan inserts");
    catalog
        .add_space(CurricularSpace {
            id: space("hist-1"),
            plan: PlanId("plan-h".to_string()),
            subject: "Historia Antigua".to_string(),
            year: 1,
            term: Term::FirstHalf,
            hours: 64,
            walk_in_allowed: false,
        })
        .expect("space inserts");
    let validator = validator(ledger(), catalog);

    let rejection =
        expect_rejection(validator.validate(course_draft("hist-1", ConditionCode::Regular)));
    assert!(matches!(rejection, MovementRejection::ProgramMismatch { .. }));
}

#[test]
fn prerequisites_gate_the_movement_itself() {
    let validator = validator(ledger(), catalog());

    let rejection =
        expect_rejection(validator.validate(course_draft("ana-2", ConditionCode::Regular)));
    match rejection {
        MovementRejection::MissingPrerequisites { purpose, unmet } => {
            assert_eq!(purpose, Purpose::Course);
            assert_eq!(unmet[0].missing[0].id, space("alg-1"));
        }
        other => panic!("expected missing prerequisites, got {other:?}"),
    }
}

#[test]
fn prerequisites_are_checked_as_of_the_movement_date() {
    let ledger = ledger();
    // Regularity earned after the draft date must not count.
    ledger
        .append_movement(course_movement(
            "alg-1",
            ConditionCode::Regular,
            Some(date(2025, 11, 20)),
        ))
        .expect("append");
    let validator = validator(ledger.clone(), catalog());

    let mut backdated = course_draft("ana-2", ConditionCode::Regular);
    backdated.date = Some(date(2025, 7, 4));
    let rejection = expect_rejection(validator.validate(backdated));
    assert!(matches!(
        rejection,
        MovementRejection::MissingPrerequisites { .. }
    ));

    let mut later = course_draft("ana-2", ConditionCode::Regular);
    later.date = Some(date(2025, 12, 1));
    validator.validate(later).expect("later movement accepted");
}

#[test]
fn equivalences_skip_the_prerequisite_gate() {
    let validator = validator(ledger(), catalog());

    let mut draft = exam_draft("ana-2", ConditionCode::Equivalence, None);
    draft.date = None;
    let movement = validator.validate(draft).expect("equivalence accepted");
    assert_eq!(movement.condition, ConditionCode::Equivalence);
}

#[test]
fn unknown_enrollments_and_spaces_are_lookup_errors() {
    let validator = validator(ledger(), catalog());

    let mut draft = course_draft("alg-1", ConditionCode::Regular);
    draft.enrollment = crate::academics::domain::EnrollmentId("enr-missing".to_string());
    assert!(matches!(
        validator.validate(draft),
        Err(ValidationError::EnrollmentNotFound(_))
    ));

    let draft = course_draft("unknown", ConditionCode::Regular);
    assert!(matches!(
        validator.validate(draft),
        Err(ValidationError::SpaceNotFound(_))
    ));
}
