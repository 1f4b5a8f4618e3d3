//! The eligibility core: standing extraction over the movement ledger plus
//! the veto-then-prerequisites decision procedure.

mod policy;
mod state;

pub use policy::{
    DenialReason, EligibilityDecision, EligibilityVerdict, SpaceRef, UnmetRequirement,
};
pub use state::AcademicStanding;

use std::sync::Arc;

use chrono::NaiveDate;

use super::catalog::{CatalogError, CatalogReader};
use super::domain::{AcademicEnrollment, PlanId, SpaceId, StudentId};
use super::ledger::{AcademicLedger, LedgerError};
use super::rules::{Purpose, RuleScope, RuleSource};

/// Read-only decision engine over a ledger, a catalog, and an injected rule
/// source. Evaluations are deterministic and free of side effects, so
/// concurrent checks need no coordination.
pub struct EligibilityEngine<L, C, R> {
    ledger: Arc<L>,
    catalog: Arc<C>,
    rules: Arc<R>,
}

impl<L, C, R> EligibilityEngine<L, C, R>
where
    L: AcademicLedger,
    C: CatalogReader,
    R: RuleSource,
{
    pub fn new(ledger: Arc<L>, catalog: Arc<C>, rules: Arc<R>) -> Self {
        Self {
            ledger,
            catalog,
            rules,
        }
    }

    /// Extract the four standing sets for an enrollment. `as_of` makes the
    /// extraction historical (used when validating dated movements).
    pub fn standing(
        &self,
        enrollment: &AcademicEnrollment,
        cycle: Option<u16>,
        as_of: Option<NaiveDate>,
    ) -> Result<AcademicStanding, EligibilityError> {
        let movements = self.ledger.movements(&enrollment.id)?;
        let course_registrations = self.ledger.course_registrations(&enrollment.id)?;
        let exam_registrations = self.ledger.exam_registrations(&enrollment.id)?;
        Ok(state::classify(
            &movements,
            &course_registrations,
            &exam_registrations,
            &enrollment.plan,
            cycle,
            as_of,
        ))
    }

    /// Decide whether the student may enroll in (or sit the exam of) the
    /// given space. Veto order is fixed; prerequisite failures report every
    /// unmet rule, never just the first.
    pub fn evaluate(
        &self,
        student: &StudentId,
        plan: &PlanId,
        space: &SpaceId,
        purpose: Purpose,
        cycle: Option<u16>,
    ) -> Result<EligibilityVerdict, EligibilityError> {
        let enrollment = self
            .ledger
            .enrollment_for(student, plan)?
            .ok_or_else(|| EligibilityError::EnrollmentNotFound {
                student: student.0.clone(),
                plan: plan.0.clone(),
            })?;
        let target = self
            .catalog
            .space(space)?
            .filter(|found| &found.plan == plan)
            .ok_or_else(|| EligibilityError::SpaceNotFound(space.0.clone()))?;

        let standing = self.standing(&enrollment, cycle, None)?;

        let veto = if purpose == Purpose::Course && standing.enrolled_in_course.contains(space) {
            Some(DenialReason::AlreadyEnrolled)
        } else if purpose == Purpose::Course && standing.regularized.contains(space) {
            Some(DenialReason::AlreadyRegular)
        } else if standing.approved.contains(space) {
            Some(DenialReason::AlreadyApproved)
        } else if purpose == Purpose::Exam && standing.registered_for_exam.contains(space) {
            Some(DenialReason::AlreadyRegisteredForExam)
        } else {
            None
        };

        let decision = match veto {
            Some(reason) => EligibilityDecision::Denied { reason },
            None => {
                let unmet = self.unmet_requirements(&standing, plan, &target.id, purpose)?;
                if unmet.is_empty() {
                    EligibilityDecision::Admitted
                } else {
                    EligibilityDecision::Denied {
                        reason: DenialReason::MissingPrerequisites(unmet),
                    }
                }
            }
        };

        Ok(EligibilityVerdict {
            student: student.clone(),
            plan: plan.clone(),
            space: space.clone(),
            purpose,
            decision,
        })
    }

    /// Check every applicable rule against a standing, reporting each unmet
    /// one with the concrete spaces still missing. Used directly by the
    /// movement validator, which applies no general vetoes.
    pub fn unmet_requirements(
        &self,
        standing: &AcademicStanding,
        plan: &PlanId,
        space: &SpaceId,
        purpose: Purpose,
    ) -> Result<Vec<UnmetRequirement>, EligibilityError> {
        let mut unmet = Vec::new();
        for rule in self.rules.rules_for(plan, space, purpose)? {
            let selected = standing.set_for(rule.minimum);
            match &rule.scope {
                RuleScope::Space(required) => {
                    if !selected.contains(required) {
                        unmet.push(UnmetRequirement {
                            minimum: rule.minimum,
                            scope: rule.scope.clone(),
                            missing: vec![self.space_ref(required)?],
                        });
                    }
                }
                RuleScope::UpToYear(year) => {
                    // Zero qualifying spaces trivially satisfies the rule.
                    let missing: Vec<SpaceRef> = self
                        .catalog
                        .spaces_in_plan(plan)?
                        .into_iter()
                        .filter(|candidate| candidate.year <= *year)
                        .filter(|candidate| !selected.contains(&candidate.id))
                        .map(|candidate| SpaceRef {
                            id: candidate.id.clone(),
                            label: candidate.subject,
                        })
                        .collect();
                    if !missing.is_empty() {
                        unmet.push(UnmetRequirement {
                            minimum: rule.minimum,
                            scope: rule.scope.clone(),
                            missing,
                        });
                    }
                }
            }
        }
        Ok(unmet)
    }

    fn space_ref(&self, id: &SpaceId) -> Result<SpaceRef, EligibilityError> {
        let label = self
            .catalog
            .space(id)?
            .map(|space| space.subject)
            .unwrap_or_else(|| id.0.clone());
        Ok(SpaceRef {
            id: id.clone(),
            label,
        })
    }
}

/// Errors surfaced by eligibility queries.
#[derive(Debug, thiserror::Error)]
pub enum EligibilityError {
    #[error("no enrollment for student '{student}' in plan '{plan}'")]
    EnrollmentNotFound { student: String, plan: String },
    #[error("curricular space '{0}' not found in plan")]
    SpaceNotFound(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
