use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use super::domain::{PlanId, ProgramId, SpaceId};
use super::rules::{PrerequisiteRule, Purpose};

/// A program (carrera) offering one or more study plans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub name: String,
    #[serde(default)]
    pub abbreviation: Option<String>,
}

/// A resolution-numbered curriculum belonging to one program. At most one
/// plan per program may be current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyPlan {
    pub id: PlanId,
    pub program: ProgramId,
    pub resolution: String,
    #[serde(default)]
    pub name: Option<String>,
    pub current: bool,
}

/// Position of a curricular space within the academic year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    FirstHalf,
    SecondHalf,
    FullYear,
}

impl Term {
    pub const fn label(self) -> &'static str {
        match self {
            Term::FirstHalf => "1st term",
            Term::SecondHalf => "2nd term",
            Term::FullYear => "full year",
        }
    }
}

/// One course offering within a study plan. Unique per
/// (plan, subject, year, term).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurricularSpace {
    pub id: SpaceId,
    pub plan: PlanId,
    pub subject: String,
    pub year: u8,
    pub term: Term,
    pub hours: u16,
    /// Whether the space admits sitting the final as a walk-in (libre).
    pub walk_in_allowed: bool,
}

impl CurricularSpace {
    /// Human label used in denial explanations.
    pub fn label(&self) -> &str {
        &self.subject
    }
}

/// Read side of the curriculum catalog. The catalog is maintained elsewhere;
/// the engine only queries it.
pub trait CatalogReader: Send + Sync {
    fn program(&self, id: &ProgramId) -> Result<Option<Program>, CatalogError>;
    fn plan(&self, id: &PlanId) -> Result<Option<StudyPlan>, CatalogError>;
    fn space(&self, id: &SpaceId) -> Result<Option<CurricularSpace>, CatalogError>;
    fn spaces_in_plan(&self, plan: &PlanId) -> Result<Vec<CurricularSpace>, CatalogError>;
    /// Stored prerequisite rules for one target space, regardless of purpose.
    fn stored_rules(
        &self,
        plan: &PlanId,
        space: &SpaceId,
    ) -> Result<Vec<PrerequisiteRule>, CatalogError>;
}

/// Error enumeration for catalog access and maintenance.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog record conflicts with an existing one: {0}")]
    Conflict(String),
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

#[derive(Default)]
struct CatalogState {
    programs: HashMap<ProgramId, Program>,
    plans: HashMap<PlanId, StudyPlan>,
    spaces: HashMap<SpaceId, CurricularSpace>,
    rules: HashMap<(PlanId, SpaceId), Vec<PrerequisiteRule>>,
}

/// In-memory catalog store backing the demo binary and the test suites.
#[derive(Default)]
pub struct MemoryCatalog {
    inner: Mutex<CatalogState>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, CatalogState>, CatalogError> {
        self.inner
            .lock()
            .map_err(|_| CatalogError::Unavailable("catalog mutex poisoned".to_string()))
    }

    pub fn add_program(&self, program: Program) -> Result<(), CatalogError> {
        let mut state = self.state()?;
        if state.programs.contains_key(&program.id) {
            return Err(CatalogError::Conflict(format!(
                "program '{}' already exists",
                program.id.0
            )));
        }
        state.programs.insert(program.id.clone(), program);
        Ok(())
    }

    pub fn add_plan(&self, plan: StudyPlan) -> Result<(), CatalogError> {
        let mut state = self.state()?;
        if state.plans.contains_key(&plan.id) {
            return Err(CatalogError::Conflict(format!(
                "plan '{}' already exists",
                plan.id.0
            )));
        }
        if plan.current
            && state
                .plans
                .values()
                .any(|existing| existing.program == plan.program && existing.current)
        {
            return Err(CatalogError::Conflict(format!(
                "program '{}' already has a current plan",
                plan.program.0
            )));
        }
        state.plans.insert(plan.id.clone(), plan);
        Ok(())
    }

    pub fn add_space(&self, space: CurricularSpace) -> Result<(), CatalogError> {
        let mut state = self.state()?;
        if state.spaces.contains_key(&space.id) {
            return Err(CatalogError::Conflict(format!(
                "space '{}' already exists",
                space.id.0
            )));
        }
        let duplicate = state.spaces.values().any(|existing| {
            existing.plan == space.plan
                && existing.subject == space.subject
                && existing.year == space.year
                && existing.term == space.term
        });
        if duplicate {
            return Err(CatalogError::Conflict(format!(
                "plan '{}' already offers '{}' in year {} ({})",
                space.plan.0,
                space.subject,
                space.year,
                space.term.label()
            )));
        }
        state.spaces.insert(space.id.clone(), space);
        Ok(())
    }

    pub fn add_rule(&self, rule: PrerequisiteRule) -> Result<(), CatalogError> {
        let mut state = self.state()?;
        let key = (rule.plan.clone(), rule.space.clone());
        state.rules.entry(key).or_default().push(rule);
        Ok(())
    }
}

impl CatalogReader for MemoryCatalog {
    fn program(&self, id: &ProgramId) -> Result<Option<Program>, CatalogError> {
        Ok(self.state()?.programs.get(id).cloned())
    }

    fn plan(&self, id: &PlanId) -> Result<Option<StudyPlan>, CatalogError> {
        Ok(self.state()?.plans.get(id).cloned())
    }

    fn space(&self, id: &SpaceId) -> Result<Option<CurricularSpace>, CatalogError> {
        Ok(self.state()?.spaces.get(id).cloned())
    }

    fn spaces_in_plan(&self, plan: &PlanId) -> Result<Vec<CurricularSpace>, CatalogError> {
        let state = self.state()?;
        let mut spaces: Vec<CurricularSpace> = state
            .spaces
            .values()
            .filter(|space| &space.plan == plan)
            .cloned()
            .collect();
        spaces.sort_by(|a, b| (a.year, a.term, &a.subject).cmp(&(b.year, b.term, &b.subject)));
        Ok(spaces)
    }

    fn stored_rules(
        &self,
        plan: &PlanId,
        space: &SpaceId,
    ) -> Result<Vec<PrerequisiteRule>, CatalogError> {
        let state = self.state()?;
        Ok(state
            .rules
            .get(&(plan.clone(), space.clone()))
            .cloned()
            .unwrap_or_default())
    }
}

/// Convenience view pairing a rule with its resolved purpose, used by the
/// administrative rule-management endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RuleView {
    pub rule: PrerequisiteRule,
    pub effective_purpose: Purpose,
}
