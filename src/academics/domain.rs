use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for students (legajo-level identity).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentId(pub String);

/// Identifier wrapper for a student's enrollment into one program/plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnrollmentId(pub String);

/// Identifier wrapper for programs (carreras).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgramId(pub String);

/// Identifier wrapper for study plans.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlanId(pub String);

/// Identifier wrapper for curricular spaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpaceId(pub String);

/// The two shapes an academic movement can take: a course-regularity outcome
/// or a final-exam outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Course,
    Exam,
}

impl MovementKind {
    pub const fn label(self) -> &'static str {
        match self {
            MovementKind::Course => "course regularity",
            MovementKind::Exam => "final exam",
        }
    }
}

/// Closed set of outcome condition codes. Replaces the loose status strings of
/// the legacy records system with a tagged enumeration; each code belongs to
/// exactly one movement kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionCode {
    // Course-regularity outcomes.
    Promoted,
    CourseApproved,
    Regular,
    FailedCoursework,
    FailedPartial,
    Free,
    FreeByAbsence,
    FreeByWithdrawal,
    // Final-exam outcomes.
    ExamRegular,
    ExamApproved,
    WalkIn,
    Equivalence,
}

impl ConditionCode {
    /// The movement kind this condition is valid for.
    pub const fn kind(self) -> MovementKind {
        match self {
            ConditionCode::Promoted
            | ConditionCode::CourseApproved
            | ConditionCode::Regular
            | ConditionCode::FailedCoursework
            | ConditionCode::FailedPartial
            | ConditionCode::Free
            | ConditionCode::FreeByAbsence
            | ConditionCode::FreeByWithdrawal => MovementKind::Course,
            ConditionCode::ExamRegular
            | ConditionCode::ExamApproved
            | ConditionCode::WalkIn
            | ConditionCode::Equivalence => MovementKind::Exam,
        }
    }

    /// Strength ordering for course outcomes: 3 = promoted/approved,
    /// 2 = regular, 1 = failed, 0 = free. Exam codes carry no course
    /// strength and rank 0; ranking stays a total function either way.
    pub const fn rank(self) -> u8 {
        match self {
            ConditionCode::Promoted | ConditionCode::CourseApproved => 3,
            ConditionCode::Regular => 2,
            ConditionCode::FailedCoursework | ConditionCode::FailedPartial => 1,
            ConditionCode::Free
            | ConditionCode::FreeByAbsence
            | ConditionCode::FreeByWithdrawal
            | ConditionCode::ExamRegular
            | ConditionCode::ExamApproved
            | ConditionCode::WalkIn
            | ConditionCode::Equivalence => 0,
        }
    }

    /// Walk-in style course conditions (libre and its variants).
    pub const fn is_free_course(self) -> bool {
        matches!(
            self,
            ConditionCode::Free | ConditionCode::FreeByAbsence | ConditionCode::FreeByWithdrawal
        )
    }

    /// Exam conditions that approve through a prior regularity.
    pub const fn is_exam_from_regularity(self) -> bool {
        matches!(self, ConditionCode::ExamRegular | ConditionCode::ExamApproved)
    }

    pub const fn label(self) -> &'static str {
        match self {
            ConditionCode::Promoted => "promoted",
            ConditionCode::CourseApproved => "approved in course",
            ConditionCode::Regular => "regular",
            ConditionCode::FailedCoursework => "failed coursework",
            ConditionCode::FailedPartial => "failed partial exam",
            ConditionCode::Free => "free",
            ConditionCode::FreeByAbsence => "free (absences)",
            ConditionCode::FreeByWithdrawal => "free (early withdrawal)",
            ConditionCode::ExamRegular => "final as regular",
            ConditionCode::ExamApproved => "final approved",
            ConditionCode::WalkIn => "walk-in final",
            ConditionCode::Equivalence => "equivalence",
        }
    }
}

/// One accepted academic event in the append-only ledger. Corrections are new
/// movements; accepted records are never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub enrollment: EnrollmentId,
    pub space: SpaceId,
    pub kind: MovementKind,
    pub condition: ConditionCode,
    pub date: Option<NaiveDate>,
    pub grade: Option<f32>,
    pub grade_text: Option<String>,
    pub book: Option<String>,
    pub folio: Option<String>,
    pub internal_memo: Option<String>,
    pub absent: bool,
    pub absence_justified: bool,
}

/// Minimum passing grade on the 0-10 scale.
pub const PASSING_GRADE: f32 = 6.0;

impl Movement {
    /// Whether this movement fully approves its space: course promotion or
    /// in-course approval, a passed final sat as regular, or an equivalence.
    pub fn approves(&self) -> bool {
        match self.kind {
            MovementKind::Course => self.condition.rank() == 3,
            MovementKind::Exam => {
                if self.condition == ConditionCode::Equivalence {
                    return true;
                }
                self.condition.is_exam_from_regularity()
                    && !self.absent
                    && self.grade.map(|g| g >= PASSING_GRADE).unwrap_or(false)
            }
        }
    }

    /// Whether this movement regularizes its space (regular or better
    /// course outcome). Approval always implies regularized.
    pub fn regularizes(&self) -> bool {
        self.kind == MovementKind::Course && self.condition.rank() >= 2
    }

    /// Whether this movement is exactly a grant of regular status.
    pub fn grants_regularity(&self) -> bool {
        self.kind == MovementKind::Course && self.condition == ConditionCode::Regular
    }

    /// Exam attempts count toward the sitting ceiling unless the absence
    /// was justified.
    pub fn counted_exam_attempt(&self) -> bool {
        self.kind == MovementKind::Exam && !(self.absent && self.absence_justified)
    }

    /// True when the movement is undated or dated at or before `as_of`.
    pub fn on_or_before(&self, as_of: Option<NaiveDate>) -> bool {
        match (self.date, as_of) {
            (Some(date), Some(cutoff)) => date <= cutoff,
            _ => true,
        }
    }

    /// The grade this movement contributes to the general average, when it
    /// counts as an approval with a passing mark.
    pub fn approving_grade(&self) -> Option<f32> {
        let numeric = self.grade.or_else(|| {
            self.grade_text
                .as_deref()
                .and_then(parse_numeric_grade_text)
        });
        match self.kind {
            MovementKind::Exam if self.condition.is_exam_from_regularity() && !self.absent => {
                numeric.filter(|g| *g >= PASSING_GRADE)
            }
            MovementKind::Course if self.condition.rank() == 3 => {
                numeric.filter(|g| *g >= PASSING_GRADE)
            }
            _ => None,
        }
    }
}

fn parse_numeric_grade_text(text: &str) -> Option<f32> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u32>().ok().map(|n| n as f32)
}

/// General average across approving movements, rounded to two decimals.
/// `None` when nothing approved yet.
pub fn grade_average(movements: &[Movement]) -> Option<f32> {
    let grades: Vec<f32> = movements.iter().filter_map(Movement::approving_grade).collect();
    if grades.is_empty() {
        return None;
    }
    let mean = grades.iter().sum::<f32>() / grades.len() as f32;
    Some((mean * 100.0).round() / 100.0)
}

/// An unvalidated movement as submitted by staff. The validator either
/// rejects it or turns it into an accepted [`Movement`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementDraft {
    pub enrollment: EnrollmentId,
    pub space: SpaceId,
    pub kind: MovementKind,
    pub condition: ConditionCode,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub grade: Option<f32>,
    #[serde(default)]
    pub grade_text: Option<String>,
    #[serde(default)]
    pub book: Option<String>,
    #[serde(default)]
    pub folio: Option<String>,
    #[serde(default)]
    pub internal_memo: Option<String>,
    #[serde(default)]
    pub absent: bool,
    #[serde(default)]
    pub absence_justified: bool,
}

impl MovementDraft {
    pub(crate) fn into_movement(self) -> Movement {
        Movement {
            enrollment: self.enrollment,
            space: self.space,
            kind: self.kind,
            condition: self.condition,
            date: self.date,
            grade: self.grade,
            grade_text: self.grade_text,
            book: self.book,
            folio: self.folio,
            internal_memo: self.internal_memo,
            absent: self.absent,
            absence_justified: self.absence_justified,
        }
    }
}

/// Participation state of a course registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    InProgress,
    Withdrawn,
}

impl RegistrationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RegistrationStatus::InProgress => "in_progress",
            RegistrationStatus::Withdrawn => "withdrawn",
        }
    }
}

/// Registration into a course for one academic cycle. Records participation;
/// outcomes live in [`Movement`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRegistration {
    pub enrollment: EnrollmentId,
    pub space: SpaceId,
    pub plan: PlanId,
    pub cycle: u16,
    pub status: RegistrationStatus,
    #[serde(default)]
    pub registered_on: Option<NaiveDate>,
}

/// Registration for a final-exam sitting, pending until resolved into an
/// exam movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamRegistration {
    pub enrollment: EnrollmentId,
    pub space: SpaceId,
    pub plan: PlanId,
    #[serde(default)]
    pub sitting_date: Option<NaiveDate>,
    pub pending: bool,
}

/// Administrative completeness of the student's file (legajo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Complete,
    Incomplete,
}

/// Administrative condition of the enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminCondition {
    Regular,
    Conditional,
}

/// A student's registration into one program under one study plan. The file
/// status, administrative condition, and grade average are cached values
/// recomputed by a collaborator; this core consults them and never derives
/// them from documents itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicEnrollment {
    pub id: EnrollmentId,
    pub student: StudentId,
    pub program: ProgramId,
    pub plan: PlanId,
    pub cohort: u16,
    pub file_status: FileStatus,
    pub admin_condition: AdminCondition,
    #[serde(default)]
    pub grade_average: Option<f32>,
}

impl AcademicEnrollment {
    pub fn file_complete(&self) -> bool {
        self.file_status == FileStatus::Complete
    }

    pub fn is_conditional(&self) -> bool {
        self.admin_condition == AdminCondition::Conditional
    }
}
