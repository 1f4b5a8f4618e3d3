use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use super::super::domain::{
    CourseRegistration, ExamRegistration, Movement, PlanId, RegistrationStatus, SpaceId,
};
use super::super::rules::MinimumStatus;

/// The four standing sets extracted from a student's ledger for one plan.
/// Invariant: `approved` is always a subset of `regularized`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AcademicStanding {
    pub approved: BTreeSet<SpaceId>,
    pub regularized: BTreeSet<SpaceId>,
    pub enrolled_in_course: BTreeSet<SpaceId>,
    pub registered_for_exam: BTreeSet<SpaceId>,
}

impl AcademicStanding {
    /// The set a rule's minimum status selects its membership check against.
    pub fn set_for(&self, minimum: MinimumStatus) -> &BTreeSet<SpaceId> {
        match minimum {
            MinimumStatus::Approved => &self.approved,
            MinimumStatus::Regularized => &self.regularized,
        }
    }
}

/// Classify ledger records into standing sets. Pure; the caller fetches the
/// records. Dated movements after `as_of` are ignored, undated ones always
/// count. `cycle` narrows course registrations only.
pub(crate) fn classify(
    movements: &[Movement],
    course_registrations: &[CourseRegistration],
    exam_registrations: &[ExamRegistration],
    plan: &PlanId,
    cycle: Option<u16>,
    as_of: Option<NaiveDate>,
) -> AcademicStanding {
    let mut standing = AcademicStanding::default();

    for movement in movements {
        if !movement.on_or_before(as_of) {
            continue;
        }
        if movement.approves() {
            standing.approved.insert(movement.space.clone());
        }
        if movement.regularizes() {
            standing.regularized.insert(movement.space.clone());
        }
    }
    // Approval always implies regularized, even when it came through an
    // exam or equivalence rather than coursework.
    standing
        .regularized
        .extend(standing.approved.iter().cloned());

    for registration in course_registrations {
        if &registration.plan != plan || registration.status != RegistrationStatus::InProgress {
            continue;
        }
        if let Some(cycle) = cycle {
            if registration.cycle != cycle {
                continue;
            }
        }
        standing.enrolled_in_course.insert(registration.space.clone());
    }

    for registration in exam_registrations {
        if &registration.plan == plan && registration.pending {
            standing.registered_for_exam.insert(registration.space.clone());
        }
    }

    standing
}
