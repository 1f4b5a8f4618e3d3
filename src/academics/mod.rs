//! Academic records core: curriculum catalog, movement ledger, prerequisite
//! rules, the eligibility engine, and movement validation.

pub mod catalog;
pub mod demo;
pub mod domain;
pub mod eligibility;
pub mod ledger;
pub mod router;
pub mod rules;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogError, CatalogReader, CurricularSpace, MemoryCatalog, Program, RuleView, StudyPlan, Term};
pub use domain::{
    grade_average, AcademicEnrollment, AdminCondition, ConditionCode, CourseRegistration,
    EnrollmentId, ExamRegistration, FileStatus, Movement, MovementDraft, MovementKind, PlanId,
    ProgramId, RegistrationStatus, SpaceId, StudentId, PASSING_GRADE,
};
pub use eligibility::{
    AcademicStanding, DenialReason, EligibilityDecision, EligibilityEngine, EligibilityError,
    EligibilityVerdict, SpaceRef, UnmetRequirement,
};
pub use ledger::{AcademicLedger, LedgerError, MemoryLedger};
pub use router::academics_router;
pub use rules::{
    CatalogRules, MinimumStatus, PrerequisiteRule, Purpose, RuleScope, RuleSource, StaticRules,
};
pub use service::{AcademicService, AcademicServiceError, TranscriptView};
pub use validation::{
    MovementRejection, MovementValidator, ValidationError, MAX_EXAM_ATTEMPTS,
    REGULARITY_VALIDITY_DAYS,
};
