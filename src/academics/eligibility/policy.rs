use serde::{Deserialize, Serialize};

use super::super::domain::{PlanId, SpaceId, StudentId};
use super::super::rules::{MinimumStatus, Purpose, RuleScope};

/// A required space named in a denial, with its catalog label when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceRef {
    pub id: SpaceId,
    pub label: String,
}

/// One prerequisite rule the student does not satisfy, with every concrete
/// space still missing at the demanded minimum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmetRequirement {
    pub minimum: MinimumStatus,
    pub scope: RuleScope,
    pub missing: Vec<SpaceRef>,
}

impl UnmetRequirement {
    pub fn summary(&self) -> String {
        let names: Vec<&str> = self.missing.iter().map(|space| space.label.as_str()).collect();
        match &self.scope {
            RuleScope::Space(_) => format!(
                "requires {} in {}",
                self.minimum.label(),
                names.join(", ")
            ),
            RuleScope::UpToYear(year) => format!(
                "requires every space through year {} at {} (missing: {})",
                year,
                self.minimum.label(),
                names.join(", ")
            ),
        }
    }
}

/// Why an enrollment or exam sitting is denied. General vetoes come before
/// prerequisite failures and are checked in this order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", content = "detail", rename_all = "snake_case")]
pub enum DenialReason {
    AlreadyEnrolled,
    AlreadyRegular,
    AlreadyApproved,
    AlreadyRegisteredForExam,
    MissingPrerequisites(Vec<UnmetRequirement>),
}

impl DenialReason {
    /// Machine-readable reason code.
    pub const fn code(&self) -> &'static str {
        match self {
            DenialReason::AlreadyEnrolled => "already_enrolled",
            DenialReason::AlreadyRegular => "already_regular",
            DenialReason::AlreadyApproved => "already_approved",
            DenialReason::AlreadyRegisteredForExam => "already_registered_for_exam",
            DenialReason::MissingPrerequisites(_) => "missing_prerequisites",
        }
    }

    pub fn summary(&self) -> String {
        match self {
            DenialReason::AlreadyEnrolled => "already registered in this course".to_string(),
            DenialReason::AlreadyRegular => "already regular in this space".to_string(),
            DenialReason::AlreadyApproved => "space already approved".to_string(),
            DenialReason::AlreadyRegisteredForExam => {
                "already registered for this exam sitting".to_string()
            }
            DenialReason::MissingPrerequisites(unmet) => {
                let parts: Vec<String> = unmet.iter().map(UnmetRequirement::summary).collect();
                format!("missing prerequisites: {}", parts.join("; "))
            }
        }
    }
}

/// Admit/deny outcome of one eligibility check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EligibilityDecision {
    Admitted,
    Denied { reason: DenialReason },
}

impl EligibilityDecision {
    pub fn admitted(&self) -> bool {
        matches!(self, EligibilityDecision::Admitted)
    }

    pub fn summary(&self) -> String {
        match self {
            EligibilityDecision::Admitted => "admitted".to_string(),
            EligibilityDecision::Denied { reason } => reason.summary(),
        }
    }
}

/// Full verdict returned to intake screens and the movement validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityVerdict {
    pub student: StudentId,
    pub plan: PlanId,
    pub space: SpaceId,
    pub purpose: Purpose,
    pub decision: EligibilityDecision,
}
