use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};

use super::catalog::{CatalogError, CatalogReader, CurricularSpace};
use super::domain::{
    AcademicEnrollment, ConditionCode, Movement, MovementDraft, MovementKind, PASSING_GRADE,
};
use super::eligibility::{EligibilityEngine, EligibilityError, UnmetRequirement};
use super::ledger::{AcademicLedger, LedgerError};
use super::rules::{Purpose, RuleSource};

/// A regularity satisfies exam conditions for two years from its date.
pub const REGULARITY_VALIDITY_DAYS: i64 = 730;

/// A space allows at most three counted final-exam attempts before the
/// course must be retaken.
pub const MAX_EXAM_ATTEMPTS: usize = 3;

/// Guard run before any movement is appended to the ledger. The caller wraps
/// validate-then-append in one transaction per (enrollment, space) so the
/// attempt ceiling and already-approved invariants hold under concurrency.
pub struct MovementValidator<L, C, R> {
    ledger: Arc<L>,
    catalog: Arc<C>,
    engine: EligibilityEngine<L, C, R>,
}

impl<L, C, R> MovementValidator<L, C, R>
where
    L: AcademicLedger,
    C: CatalogReader,
    R: RuleSource,
{
    pub fn new(ledger: Arc<L>, catalog: Arc<C>, rules: Arc<R>) -> Self {
        let engine = EligibilityEngine::new(ledger.clone(), catalog.clone(), rules);
        Self {
            ledger,
            catalog,
            engine,
        }
    }

    /// Validate a draft against the accumulated history and the rule set,
    /// yielding the accepted movement or a structured rejection.
    pub fn validate(&self, draft: MovementDraft) -> Result<Movement, ValidationError> {
        if draft.condition.kind() != draft.kind {
            return Err(MovementRejection::ConditionKindMismatch {
                condition: draft.condition,
                kind: draft.kind,
            }
            .into());
        }

        let enrollment = self
            .ledger
            .enrollment(&draft.enrollment)?
            .ok_or_else(|| ValidationError::EnrollmentNotFound(draft.enrollment.0.clone()))?;
        let space = self
            .catalog
            .space(&draft.space)?
            .ok_or_else(|| ValidationError::SpaceNotFound(draft.space.0.clone()))?;
        let plan = self
            .catalog
            .plan(&space.plan)?
            .ok_or_else(|| ValidationError::PlanNotFound(space.plan.0.clone()))?;

        let history: Vec<Movement> = self
            .ledger
            .movements(&enrollment.id)?
            .into_iter()
            .filter(|movement| movement.space == draft.space)
            .collect();

        match draft.kind {
            MovementKind::Course => {
                self.check_course_outcome(&draft, &enrollment, &history)?;
            }
            MovementKind::Exam => {
                self.check_exam_outcome(&draft, &enrollment, &space, &history)?;
            }
        }

        if plan.program != enrollment.program {
            return Err(MovementRejection::ProgramMismatch {
                space: space.subject.clone(),
            }
            .into());
        }

        let purpose = match draft.kind {
            MovementKind::Course => Purpose::Course,
            MovementKind::Exam => Purpose::Exam,
        };
        // Equivalences are recognitions of prior studies and skip the
        // prerequisite gate.
        if draft.condition != ConditionCode::Equivalence {
            let standing = self.engine.standing(&enrollment, None, draft.date)?;
            let unmet =
                self.engine
                    .unmet_requirements(&standing, &enrollment.plan, &draft.space, purpose)?;
            if !unmet.is_empty() {
                return Err(MovementRejection::MissingPrerequisites { purpose, unmet }.into());
            }
        }

        Ok(draft.into_movement())
    }

    fn check_course_outcome(
        &self,
        draft: &MovementDraft,
        enrollment: &AcademicEnrollment,
        history: &[Movement],
    ) -> Result<(), MovementRejection> {
        if let Some(grade) = draft.grade {
            if !(0.0..=10.0).contains(&grade) {
                return Err(MovementRejection::GradeOutOfRange { grade });
            }
        }

        if draft.condition.is_free_course()
            && history.iter().any(Movement::grants_regularity)
        {
            return Err(MovementRejection::FreeAfterRegular);
        }

        if enrollment.is_conditional() && draft.condition.rank() == 3 {
            return Err(MovementRejection::ConditionalCannotApprove {
                condition: draft.condition,
            });
        }

        Ok(())
    }

    fn check_exam_outcome(
        &self,
        draft: &MovementDraft,
        enrollment: &AcademicEnrollment,
        space: &CurricularSpace,
        history: &[Movement],
    ) -> Result<(), MovementRejection> {
        if !enrollment.file_complete() {
            return Err(MovementRejection::FileIncomplete);
        }

        if draft.condition.is_exam_from_regularity() && !draft.absent {
            let grade = draft
                .grade
                .ok_or(MovementRejection::GradeOrAbsenceRequired)?;
            if grade < PASSING_GRADE {
                return Err(MovementRejection::BelowPassingGrade { grade });
            }
            if let Some(exam_date) = draft.date {
                if !has_current_regularity(history, exam_date) {
                    return Err(MovementRejection::RegularityExpired);
                }
            }
        }

        if draft.condition == ConditionCode::WalkIn {
            if !space.walk_in_allowed {
                return Err(MovementRejection::WalkInNotPermitted);
            }
            if history.iter().any(Movement::approves) {
                return Err(MovementRejection::AlreadyApproved);
            }
            let anchor = draft.date.unwrap_or_else(|| Local::now().date_naive());
            if has_current_regularity(history, anchor) {
                return Err(MovementRejection::RegularMustSitAsRegular);
            }
            if !draft.absent && draft.grade.is_none() {
                return Err(MovementRejection::GradeOrAbsenceRequired);
            }
        }

        let attempts: Vec<&Movement> = history
            .iter()
            .filter(|movement| movement.counted_exam_attempt())
            .collect();
        if attempts
            .iter()
            .any(|movement| !movement.absent && movement.grade.map(|g| g >= PASSING_GRADE).unwrap_or(false))
        {
            return Err(MovementRejection::AlreadyPassedFinal);
        }
        if attempts.len() >= MAX_EXAM_ATTEMPTS {
            return Err(MovementRejection::AttemptCeilingReached {
                attempts: attempts.len(),
            });
        }

        Ok(())
    }
}

/// Whether any regularity in the history is still within its validity
/// window at `at`. Undated regularities never qualify.
fn has_current_regularity(history: &[Movement], at: NaiveDate) -> bool {
    let earliest_valid = at - Duration::days(REGULARITY_VALIDITY_DAYS);
    history.iter().any(|movement| {
        movement.grants_regularity()
            && movement
                .date
                .map(|date| date >= earliest_valid)
                .unwrap_or(false)
    })
}

fn describe_unmet(unmet: &[UnmetRequirement]) -> String {
    let parts: Vec<String> = unmet.iter().map(UnmetRequirement::summary).collect();
    parts.join("; ")
}

/// Rule violations raised when a movement draft breaks the record-keeping
/// constraints. Messages are user facing; the full missing-prerequisite list
/// travels with the error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MovementRejection {
    #[error("condition '{}' is not valid for a {} movement", condition.label(), kind.label())]
    ConditionKindMismatch {
        condition: ConditionCode,
        kind: MovementKind,
    },
    #[error("grade {grade} is outside the 0-10 scale")]
    GradeOutOfRange { grade: f32 },
    #[error("a free condition does not apply once the student earned regular status in this space")]
    FreeAfterRegular,
    #[error("conditional enrollment cannot receive '{}' through coursework", condition.label())]
    ConditionalCannotApprove { condition: ConditionCode },
    #[error("student file is incomplete; exam movements are not accepted")]
    FileIncomplete,
    #[error("a grade or an absence flag is required")]
    GradeOrAbsenceRequired,
    #[error("final exam grade {grade} is below the minimum passing grade of 6")]
    BelowPassingGrade { grade: f32 },
    #[error("the qualifying regularity is older than two years and no longer current")]
    RegularityExpired,
    #[error("this space does not admit walk-in exams")]
    WalkInNotPermitted,
    #[error("space already approved; no further exam applies")]
    AlreadyApproved,
    #[error("student holds a current regularity and must sit the exam as regular, not walk-in")]
    RegularMustSitAsRegular,
    #[error("a previous final exam for this space already reached a passing grade")]
    AlreadyPassedFinal,
    #[error("reached the limit of {attempts} final attempts; the course must be retaken")]
    AttemptCeilingReached { attempts: usize },
    #[error("space '{space}' does not belong to the program of this enrollment")]
    ProgramMismatch { space: String },
    #[error("does not meet {} prerequisites: {}", purpose.label(), describe_unmet(unmet))]
    MissingPrerequisites {
        purpose: Purpose,
        unmet: Vec<UnmetRequirement>,
    },
}

/// Errors surfaced while validating a movement.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    Rejected(#[from] MovementRejection),
    #[error("enrollment '{0}' not found")]
    EnrollmentNotFound(String),
    #[error("curricular space '{0}' not found")]
    SpaceNotFound(String),
    #[error("study plan '{0}' not found")]
    PlanNotFound(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<EligibilityError> for ValidationError {
    fn from(value: EligibilityError) -> Self {
        match value {
            EligibilityError::Ledger(err) => ValidationError::Ledger(err),
            EligibilityError::Catalog(err) => ValidationError::Catalog(err),
            EligibilityError::SpaceNotFound(id) => ValidationError::SpaceNotFound(id),
            EligibilityError::EnrollmentNotFound { student, .. } => {
                ValidationError::EnrollmentNotFound(student)
            }
        }
    }
}
