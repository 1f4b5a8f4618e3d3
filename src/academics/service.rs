use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::catalog::{CatalogError, CatalogReader, RuleView};
use super::domain::{
    grade_average, AcademicEnrollment, Movement, MovementDraft, PlanId, SpaceId, StudentId,
};
use super::eligibility::{EligibilityEngine, EligibilityError, EligibilityVerdict};
use super::ledger::{AcademicLedger, LedgerError};
use super::rules::{Purpose, RuleSource};
use super::validation::{MovementValidator, ValidationError};

/// Facade composing the ledger, the catalog, the rule source, the
/// eligibility engine, and the movement validator.
pub struct AcademicService<L, C, R> {
    ledger: Arc<L>,
    rules: Arc<R>,
    engine: EligibilityEngine<L, C, R>,
    validator: MovementValidator<L, C, R>,
}

impl<L, C, R> AcademicService<L, C, R>
where
    L: AcademicLedger,
    C: CatalogReader,
    R: RuleSource,
{
    pub fn new(ledger: Arc<L>, catalog: Arc<C>, rules: Arc<R>) -> Self {
        let engine = EligibilityEngine::new(ledger.clone(), catalog.clone(), rules.clone());
        let validator = MovementValidator::new(ledger.clone(), catalog, rules.clone());
        Self {
            ledger,
            rules,
            engine,
            validator,
        }
    }

    /// Eligibility verdict for one (student, plan, space, purpose, cycle).
    pub fn eligibility(
        &self,
        student: &StudentId,
        plan: &PlanId,
        space: &SpaceId,
        purpose: Purpose,
        cycle: Option<u16>,
    ) -> Result<EligibilityVerdict, AcademicServiceError> {
        let verdict = self.engine.evaluate(student, plan, space, purpose, cycle)?;
        Ok(verdict)
    }

    /// The prerequisite rules that gate one (plan, space, purpose), for the
    /// administrative rule-management screens.
    pub fn prerequisites(
        &self,
        plan: &PlanId,
        space: &SpaceId,
        purpose: Purpose,
    ) -> Result<Vec<RuleView>, AcademicServiceError> {
        let rules = self.rules.rules_for(plan, space, purpose)?;
        Ok(rules
            .into_iter()
            .map(|rule| RuleView {
                effective_purpose: rule.effective_purpose(),
                rule,
            })
            .collect())
    }

    /// Validate a movement draft and, when accepted, append it to the
    /// ledger. The validate-then-append pair is the caller's transaction.
    pub fn record_movement(
        &self,
        draft: MovementDraft,
    ) -> Result<Movement, AcademicServiceError> {
        let movement = self.validator.validate(draft)?;
        let stored = self.ledger.append_movement(movement)?;
        info!(
            enrollment = %stored.enrollment.0,
            space = %stored.space.0,
            condition = stored.condition.label(),
            "movement accepted"
        );
        Ok(stored)
    }

    /// The enrollment's full movement history plus the general average
    /// recomputed over approving movements.
    pub fn transcript(
        &self,
        student: &StudentId,
        plan: &PlanId,
    ) -> Result<TranscriptView, AcademicServiceError> {
        let enrollment = self.ledger.enrollment_for(student, plan)?.ok_or_else(|| {
            AcademicServiceError::EnrollmentNotFound {
                student: student.0.clone(),
                plan: plan.0.clone(),
            }
        })?;
        let movements = self.ledger.movements(&enrollment.id)?;
        let average = grade_average(&movements);
        Ok(TranscriptView {
            enrollment,
            grade_average: average,
            movements,
        })
    }
}

/// Serialized history view for one enrollment.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptView {
    pub enrollment: AcademicEnrollment,
    pub grade_average: Option<f32>,
    pub movements: Vec<Movement>,
}

/// Error raised by the academic service facade.
#[derive(Debug, thiserror::Error)]
pub enum AcademicServiceError {
    #[error(transparent)]
    Eligibility(#[from] EligibilityError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("no enrollment for student '{student}' in plan '{plan}'")]
    EnrollmentNotFound { student: String, plan: String },
}
