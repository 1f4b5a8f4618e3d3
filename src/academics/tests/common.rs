use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::academics::catalog::{CurricularSpace, MemoryCatalog, Program, StudyPlan, Term};
use crate::academics::domain::{
    AcademicEnrollment, AdminCondition, ConditionCode, CourseRegistration, EnrollmentId,
    ExamRegistration, FileStatus, Movement, MovementDraft, MovementKind, PlanId, ProgramId,
    RegistrationStatus, SpaceId, StudentId,
};
use crate::academics::eligibility::EligibilityEngine;
use crate::academics::ledger::{AcademicLedger, LedgerError, MemoryLedger};
use crate::academics::router::academics_router;
use crate::academics::rules::{CatalogRules, MinimumStatus, PrerequisiteRule, Purpose, RuleScope};
use crate::academics::service::AcademicService;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn plan_id() -> PlanId {
    PlanId("plan-a".to_string())
}

pub(super) fn student_id() -> StudentId {
    StudentId("stu-1".to_string())
}

pub(super) fn enrollment_id() -> EnrollmentId {
    EnrollmentId("enr-1".to_string())
}

pub(super) fn space(name: &str) -> SpaceId {
    SpaceId(name.to_string())
}

/// Plan `plan-a` under program `prog-1`: two first-year spaces, a
/// second-year space gated on Algebra, and a third-year seminar gated on the
/// entire first year. Geometry admits walk-in finals, Algebra does not.
pub(super) fn catalog() -> Arc<MemoryCatalog> {
    let catalog = MemoryCatalog::new();
    catalog
        .add_program(Program {
            id: ProgramId("prog-1".to_string()),
            name: "Profesorado de Matemática".to_string(),
            abbreviation: Some("PM".to_string()),
        })
        .expect("program inserts");
    catalog
        .add_plan(StudyPlan {
            id: plan_id(),
            program: ProgramId("prog-1".to_string()),
            resolution: "302/19".to_string(),
            name: None,
            current: true,
        })
        .expect("plan inserts");

    let spaces = [
        ("alg-1", "Álgebra", 1, Term::FirstHalf, false),
        ("geo-1", "Geometría", 1, Term::SecondHalf, true),
        ("ana-2", "Análisis II", 2, Term::FullYear, false),
        ("sem-3", "Seminario de Investigación", 3, Term::FullYear, false),
    ];
    for (id, subject, year, term, walk_in) in spaces {
        catalog
            .add_space(CurricularSpace {
                id: space(id),
                plan: plan_id(),
                subject: subject.to_string(),
                year,
                term,
                hours: 64,
                walk_in_allowed: walk_in,
            })
            .expect("space inserts");
    }

    catalog
        .add_rule(PrerequisiteRule {
            plan: plan_id(),
            space: space("ana-2"),
            purpose: Some(Purpose::Course),
            minimum: MinimumStatus::Regularized,
            scope: RuleScope::Space(space("alg-1")),
            notes: None,
        })
        .expect("rule inserts");
    catalog
        .add_rule(PrerequisiteRule {
            plan: plan_id(),
            space: space("ana-2"),
            purpose: Some(Purpose::Exam),
            minimum: MinimumStatus::Approved,
            scope: RuleScope::Space(space("alg-1")),
            notes: None,
        })
        .expect("rule inserts");
    catalog
        .add_rule(PrerequisiteRule {
            plan: plan_id(),
            space: space("sem-3"),
            purpose: Some(Purpose::Course),
            minimum: MinimumStatus::Regularized,
            scope: RuleScope::UpToYear(1),
            notes: None,
        })
        .expect("rule inserts");

    Arc::new(catalog)
}

pub(super) fn enrollment(
    file_status: FileStatus,
    admin_condition: AdminCondition,
) -> AcademicEnrollment {
    AcademicEnrollment {
        id: enrollment_id(),
        student: student_id(),
        program: ProgramId("prog-1".to_string()),
        plan: plan_id(),
        cohort: 2023,
        file_status,
        admin_condition,
        grade_average: None,
    }
}

pub(super) fn ledger() -> Arc<MemoryLedger> {
    let ledger = MemoryLedger::new();
    ledger
        .add_enrollment(enrollment(FileStatus::Complete, AdminCondition::Regular))
        .expect("enrollment inserts");
    Arc::new(ledger)
}

pub(super) fn course_movement(
    target: &str,
    condition: ConditionCode,
    on: Option<NaiveDate>,
) -> Movement {
    Movement {
        enrollment: enrollment_id(),
        space: space(target),
        kind: MovementKind::Course,
        condition,
        date: on,
        grade: None,
        grade_text: None,
        book: None,
        folio: None,
        internal_memo: None,
        absent: false,
        absence_justified: false,
    }
}

pub(super) fn exam_movement(
    target: &str,
    condition: ConditionCode,
    grade: Option<f32>,
    on: Option<NaiveDate>,
) -> Movement {
    Movement {
        enrollment: enrollment_id(),
        space: space(target),
        kind: MovementKind::Exam,
        condition,
        date: on,
        grade,
        grade_text: None,
        book: None,
        folio: None,
        internal_memo: None,
        absent: false,
        absence_justified: false,
    }
}

pub(super) fn course_draft(target: &str, condition: ConditionCode) -> MovementDraft {
    MovementDraft {
        enrollment: enrollment_id(),
        space: space(target),
        kind: MovementKind::Course,
        condition,
        date: Some(date(2025, 7, 4)),
        grade: None,
        grade_text: None,
        book: None,
        folio: None,
        internal_memo: None,
        absent: false,
        absence_justified: false,
    }
}

pub(super) fn exam_draft(target: &str, condition: ConditionCode, grade: Option<f32>) -> MovementDraft {
    MovementDraft {
        enrollment: enrollment_id(),
        space: space(target),
        kind: MovementKind::Exam,
        condition,
        date: Some(date(2025, 7, 4)),
        grade,
        grade_text: None,
        book: None,
        folio: None,
        internal_memo: None,
        absent: false,
        absence_justified: false,
    }
}

pub(super) fn course_registration(target: &str, cycle: u16) -> CourseRegistration {
    CourseRegistration {
        enrollment: enrollment_id(),
        space: space(target),
        plan: plan_id(),
        cycle,
        status: RegistrationStatus::InProgress,
        registered_on: None,
    }
}

pub(super) fn exam_registration(target: &str, pending: bool) -> ExamRegistration {
    ExamRegistration {
        enrollment: enrollment_id(),
        space: space(target),
        plan: plan_id(),
        sitting_date: None,
        pending,
    }
}

pub(super) type TestEngine =
    EligibilityEngine<MemoryLedger, MemoryCatalog, CatalogRules<MemoryCatalog>>;

pub(super) fn engine(ledger: Arc<MemoryLedger>, catalog: Arc<MemoryCatalog>) -> TestEngine {
    let rules = Arc::new(CatalogRules::new(catalog.clone()));
    EligibilityEngine::new(ledger, catalog, rules)
}

pub(super) type TestService =
    AcademicService<MemoryLedger, MemoryCatalog, CatalogRules<MemoryCatalog>>;

pub(super) fn build_service() -> (Arc<TestService>, Arc<MemoryLedger>, Arc<MemoryCatalog>) {
    let ledger = ledger();
    let catalog = catalog();
    let rules = Arc::new(CatalogRules::new(catalog.clone()));
    let service = Arc::new(AcademicService::new(ledger.clone(), catalog.clone(), rules));
    (service, ledger, catalog)
}

pub(super) fn router_with_service(service: Arc<TestService>) -> axum::Router {
    academics_router(service)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Ledger whose every call fails, for the degraded-backend paths.
pub(super) struct UnavailableLedger;

impl AcademicLedger for UnavailableLedger {
    fn enrollment(&self, _id: &EnrollmentId) -> Result<Option<AcademicEnrollment>, LedgerError> {
        Err(LedgerError::Unavailable("records database offline".to_string()))
    }

    fn enrollment_for(
        &self,
        _student: &StudentId,
        _plan: &PlanId,
    ) -> Result<Option<AcademicEnrollment>, LedgerError> {
        Err(LedgerError::Unavailable("records database offline".to_string()))
    }

    fn movements(&self, _enrollment: &EnrollmentId) -> Result<Vec<Movement>, LedgerError> {
        Err(LedgerError::Unavailable("records database offline".to_string()))
    }

    fn course_registrations(
        &self,
        _enrollment: &EnrollmentId,
    ) -> Result<Vec<CourseRegistration>, LedgerError> {
        Err(LedgerError::Unavailable("records database offline".to_string()))
    }

    fn append_movement(&self, _movement: Movement) -> Result<Movement, LedgerError> {
        Err(LedgerError::Unavailable("records database offline".to_string()))
    }
}

/// Ledger that keeps the trait's default empty exam-registration feed, for
/// the fail-open behavior of backends that never track sittings.
pub(super) struct NoExamFeedLedger {
    pub(super) inner: MemoryLedger,
}

impl AcademicLedger for NoExamFeedLedger {
    fn enrollment(&self, id: &EnrollmentId) -> Result<Option<AcademicEnrollment>, LedgerError> {
        self.inner.enrollment(id)
    }

    fn enrollment_for(
        &self,
        student: &StudentId,
        plan: &PlanId,
    ) -> Result<Option<AcademicEnrollment>, LedgerError> {
        self.inner.enrollment_for(student, plan)
    }

    fn movements(&self, enrollment: &EnrollmentId) -> Result<Vec<Movement>, LedgerError> {
        self.inner.movements(enrollment)
    }

    fn course_registrations(
        &self,
        enrollment: &EnrollmentId,
    ) -> Result<Vec<CourseRegistration>, LedgerError> {
        self.inner.course_registrations(enrollment)
    }

    fn append_movement(&self, movement: Movement) -> Result<Movement, LedgerError> {
        self.inner.append_movement(movement)
    }
}
