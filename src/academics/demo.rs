//! Seeded in-memory environment used by the CLI demo and the default state
//! of the served API.

use std::sync::Arc;

use chrono::NaiveDate;

use super::catalog::{CurricularSpace, MemoryCatalog, Program, StudyPlan, Term};
use super::domain::{
    AcademicEnrollment, AdminCondition, ConditionCode, EnrollmentId, FileStatus, Movement,
    MovementKind, PlanId, ProgramId, SpaceId, StudentId,
};
use super::ledger::{AcademicLedger, MemoryLedger};
use super::rules::{CatalogRules, MinimumStatus, PrerequisiteRule, Purpose, RuleScope};
use super::service::{AcademicService, AcademicServiceError};

pub type DemoService = AcademicService<MemoryLedger, MemoryCatalog, CatalogRules<MemoryCatalog>>;

/// A small primary-teaching program: three first-year spaces, a second-year
/// space gated on Pedagogy, and a third-year residency gated on the whole
/// first year.
pub struct DemoEnvironment {
    pub service: Arc<DemoService>,
    pub student: StudentId,
    pub plan: PlanId,
    pub pedagogy: SpaceId,
    pub general_didactics: SpaceId,
    pub subject_didactics: SpaceId,
    pub residency: SpaceId,
}

pub fn seeded() -> Result<DemoEnvironment, AcademicServiceError> {
    let catalog = Arc::new(MemoryCatalog::new());
    let ledger = Arc::new(MemoryLedger::new());

    let program = ProgramId("prof-primaria".to_string());
    let plan = PlanId("plan-2015".to_string());
    catalog.add_program(Program {
        id: program.clone(),
        name: "Profesorado de Educación Primaria".to_string(),
        abbreviation: Some("PEP".to_string()),
    })?;
    catalog.add_plan(StudyPlan {
        id: plan.clone(),
        program: program.clone(),
        resolution: "1935/14".to_string(),
        name: Some("Plan 2015".to_string()),
        current: true,
    })?;

    let pedagogy = SpaceId("ped-1".to_string());
    let practices = SpaceId("pra-1".to_string());
    let general_didactics = SpaceId("did-1".to_string());
    let subject_didactics = SpaceId("did-2".to_string());
    let residency = SpaceId("res-3".to_string());

    let spaces = [
        (&pedagogy, "Pedagogía", 1, Term::FullYear, 96, true),
        (&practices, "Prácticas del Lenguaje", 1, Term::FirstHalf, 64, false),
        (&general_didactics, "Didáctica General", 1, Term::SecondHalf, 64, true),
        (&subject_didactics, "Didáctica de la Matemática", 2, Term::FullYear, 96, false),
        (&residency, "Residencia Pedagógica", 3, Term::FullYear, 128, false),
    ];
    for (id, subject, year, term, hours, walk_in) in spaces {
        catalog.add_space(CurricularSpace {
            id: id.clone(),
            plan: plan.clone(),
            subject: subject.to_string(),
            year,
            term,
            hours,
            walk_in_allowed: walk_in,
        })?;
    }

    catalog.add_rule(PrerequisiteRule {
        plan: plan.clone(),
        space: subject_didactics.clone(),
        purpose: Some(Purpose::Course),
        minimum: MinimumStatus::Regularized,
        scope: RuleScope::Space(pedagogy.clone()),
        notes: None,
    })?;
    catalog.add_rule(PrerequisiteRule {
        plan: plan.clone(),
        space: subject_didactics.clone(),
        purpose: Some(Purpose::Exam),
        minimum: MinimumStatus::Approved,
        scope: RuleScope::Space(pedagogy.clone()),
        notes: None,
    })?;
    catalog.add_rule(PrerequisiteRule {
        plan: plan.clone(),
        space: residency.clone(),
        purpose: Some(Purpose::Course),
        minimum: MinimumStatus::Regularized,
        scope: RuleScope::UpToYear(2),
        notes: Some("full first cycle before residency".to_string()),
    })?;

    let student = StudentId("stu-23001".to_string());
    let enrollment = EnrollmentId("enr-23001".to_string());
    ledger.add_enrollment(AcademicEnrollment {
        id: enrollment.clone(),
        student: student.clone(),
        program,
        plan: plan.clone(),
        cohort: 2024,
        file_status: FileStatus::Complete,
        admin_condition: AdminCondition::Regular,
        grade_average: None,
    })?;

    ledger.append_movement(Movement {
        enrollment: enrollment.clone(),
        space: pedagogy.clone(),
        kind: MovementKind::Course,
        condition: ConditionCode::Regular,
        date: NaiveDate::from_ymd_opt(2024, 11, 22),
        grade: None,
        grade_text: None,
        book: Some("12".to_string()),
        folio: Some("184".to_string()),
        internal_memo: None,
        absent: false,
        absence_justified: false,
    })?;
    ledger.append_movement(Movement {
        enrollment,
        space: practices.clone(),
        kind: MovementKind::Course,
        condition: ConditionCode::Promoted,
        date: NaiveDate::from_ymd_opt(2024, 7, 5),
        grade: Some(8.0),
        grade_text: None,
        book: Some("12".to_string()),
        folio: Some("121".to_string()),
        internal_memo: None,
        absent: false,
        absence_justified: false,
    })?;

    let rules = Arc::new(CatalogRules::new(catalog.clone()));
    let service = Arc::new(AcademicService::new(ledger, catalog, rules));

    Ok(DemoEnvironment {
        service,
        student,
        plan,
        pedagogy,
        general_didactics,
        subject_didactics,
        residency,
    })
}
