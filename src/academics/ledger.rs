use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::domain::{
    AcademicEnrollment, CourseRegistration, EnrollmentId, ExamRegistration, Movement, PlanId,
    StudentId,
};

/// Read/append access to the academic ledger: enrollments, their movement
/// history, and their course/exam registrations. Reads are side-effect free;
/// the only write is appending a validated movement, which the caller wraps
/// in its own transaction boundary.
pub trait AcademicLedger: Send + Sync {
    fn enrollment(&self, id: &EnrollmentId) -> Result<Option<AcademicEnrollment>, LedgerError>;

    fn enrollment_for(
        &self,
        student: &StudentId,
        plan: &PlanId,
    ) -> Result<Option<AcademicEnrollment>, LedgerError>;

    fn movements(&self, enrollment: &EnrollmentId) -> Result<Vec<Movement>, LedgerError>;

    fn course_registrations(
        &self,
        enrollment: &EnrollmentId,
    ) -> Result<Vec<CourseRegistration>, LedgerError>;

    /// Backends that do not track exam registrations keep the default, and
    /// the extractor sees an empty set for that feed.
    fn exam_registrations(
        &self,
        enrollment: &EnrollmentId,
    ) -> Result<Vec<ExamRegistration>, LedgerError> {
        let _ = enrollment;
        Ok(Vec::new())
    }

    fn append_movement(&self, movement: Movement) -> Result<Movement, LedgerError>;
}

/// Error enumeration for ledger failures.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger record conflicts with an existing one: {0}")]
    Conflict(String),
    #[error("ledger record not found")]
    NotFound,
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

#[derive(Default)]
struct LedgerState {
    enrollments: HashMap<EnrollmentId, AcademicEnrollment>,
    movements: Vec<Movement>,
    course_registrations: Vec<CourseRegistration>,
    exam_registrations: Vec<ExamRegistration>,
}

/// In-memory ledger backing the demo binary and the test suites.
#[derive(Default)]
pub struct MemoryLedger {
    inner: Mutex<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, LedgerState>, LedgerError> {
        self.inner
            .lock()
            .map_err(|_| LedgerError::Unavailable("ledger mutex poisoned".to_string()))
    }

    pub fn add_enrollment(&self, enrollment: AcademicEnrollment) -> Result<(), LedgerError> {
        let mut state = self.state()?;
        if state.enrollments.contains_key(&enrollment.id) {
            return Err(LedgerError::Conflict(format!(
                "enrollment '{}' already exists",
                enrollment.id.0
            )));
        }
        let duplicate = state
            .enrollments
            .values()
            .any(|existing| existing.student == enrollment.student && existing.plan == enrollment.plan);
        if duplicate {
            return Err(LedgerError::Conflict(format!(
                "student '{}' is already enrolled in plan '{}'",
                enrollment.student.0, enrollment.plan.0
            )));
        }
        state.enrollments.insert(enrollment.id.clone(), enrollment);
        Ok(())
    }

    pub fn add_course_registration(
        &self,
        registration: CourseRegistration,
    ) -> Result<(), LedgerError> {
        self.state()?.course_registrations.push(registration);
        Ok(())
    }

    pub fn add_exam_registration(&self, registration: ExamRegistration) -> Result<(), LedgerError> {
        self.state()?.exam_registrations.push(registration);
        Ok(())
    }
}

impl AcademicLedger for MemoryLedger {
    fn enrollment(&self, id: &EnrollmentId) -> Result<Option<AcademicEnrollment>, LedgerError> {
        Ok(self.state()?.enrollments.get(id).cloned())
    }

    fn enrollment_for(
        &self,
        student: &StudentId,
        plan: &PlanId,
    ) -> Result<Option<AcademicEnrollment>, LedgerError> {
        let state = self.state()?;
        Ok(state
            .enrollments
            .values()
            .find(|enrollment| &enrollment.student == student && &enrollment.plan == plan)
            .cloned())
    }

    fn movements(&self, enrollment: &EnrollmentId) -> Result<Vec<Movement>, LedgerError> {
        let state = self.state()?;
        Ok(state
            .movements
            .iter()
            .filter(|movement| &movement.enrollment == enrollment)
            .cloned()
            .collect())
    }

    fn course_registrations(
        &self,
        enrollment: &EnrollmentId,
    ) -> Result<Vec<CourseRegistration>, LedgerError> {
        let state = self.state()?;
        Ok(state
            .course_registrations
            .iter()
            .filter(|registration| &registration.enrollment == enrollment)
            .cloned()
            .collect())
    }

    fn exam_registrations(
        &self,
        enrollment: &EnrollmentId,
    ) -> Result<Vec<ExamRegistration>, LedgerError> {
        let state = self.state()?;
        Ok(state
            .exam_registrations
            .iter()
            .filter(|registration| &registration.enrollment == enrollment)
            .cloned()
            .collect())
    }

    fn append_movement(&self, movement: Movement) -> Result<Movement, LedgerError> {
        let mut state = self.state()?;
        state.movements.push(movement.clone());
        Ok(movement)
    }
}
