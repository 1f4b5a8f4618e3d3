use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::catalog::{CatalogError, CatalogReader};
use super::domain::{PlanId, SpaceId};

/// What an eligibility check is for: enrolling into the course, or sitting
/// its final exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    Course,
    Exam,
}

impl Purpose {
    pub const fn label(self) -> &'static str {
        match self {
            Purpose::Course => "course",
            Purpose::Exam => "exam",
        }
    }
}

/// Minimum standing a prerequisite demands of the required space(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinimumStatus {
    Regularized,
    Approved,
}

impl MinimumStatus {
    pub const fn label(self) -> &'static str {
        match self {
            MinimumStatus::Regularized => "regularized",
            MinimumStatus::Approved => "approved",
        }
    }
}

/// The single populated shape of a rule: one named space, or every space up
/// through a year level. Exactly one holds, by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleScope {
    Space(SpaceId),
    UpToYear(u8),
}

/// A correlatividad: what a target space demands before it may be cursada or
/// rendida.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrerequisiteRule {
    pub plan: PlanId,
    /// The space this rule gates.
    pub space: SpaceId,
    /// `None` is legacy data with the purpose left unset; those rows apply
    /// to course-enrollment checks only.
    pub purpose: Option<Purpose>,
    pub minimum: MinimumStatus,
    pub scope: RuleScope,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PrerequisiteRule {
    /// Resolve the legacy unset purpose to its effective one.
    pub fn effective_purpose(&self) -> Purpose {
        self.purpose.unwrap_or(Purpose::Course)
    }

    pub fn applies_to(&self, purpose: Purpose) -> bool {
        match purpose {
            Purpose::Exam => self.purpose == Some(Purpose::Exam),
            Purpose::Course => matches!(self.purpose, Some(Purpose::Course) | None),
        }
    }
}

/// Source of the prerequisite rules that gate one (plan, space, purpose).
/// Injected into the engine so the catalog-backed and static-table variants
/// stay interchangeable.
pub trait RuleSource: Send + Sync {
    fn rules_for(
        &self,
        plan: &PlanId,
        space: &SpaceId,
        purpose: Purpose,
    ) -> Result<Vec<PrerequisiteRule>, CatalogError>;
}

fn select_applicable(rules: Vec<PrerequisiteRule>, purpose: Purpose) -> Vec<PrerequisiteRule> {
    let mut applicable = Vec::new();
    for rule in rules {
        if !rule.applies_to(purpose) {
            continue;
        }
        if rule.purpose.is_none() {
            // Legacy rows with the purpose left blank still gate course
            // enrollment; surface them so data entry can be fixed.
            warn!(
                plan = %rule.plan.0,
                space = %rule.space.0,
                "prerequisite rule has no purpose set, applying to course enrollment"
            );
        }
        applicable.push(rule);
    }
    applicable
}

/// Rules read from the curriculum catalog.
pub struct CatalogRules<C> {
    catalog: Arc<C>,
}

impl<C> CatalogRules<C> {
    pub fn new(catalog: Arc<C>) -> Self {
        Self { catalog }
    }
}

impl<C: CatalogReader> RuleSource for CatalogRules<C> {
    fn rules_for(
        &self,
        plan: &PlanId,
        space: &SpaceId,
        purpose: Purpose,
    ) -> Result<Vec<PrerequisiteRule>, CatalogError> {
        let stored = self.catalog.stored_rules(plan, space)?;
        Ok(select_applicable(stored, purpose))
    }
}

/// Fixed rule table for deployments that have no rule catalog yet.
#[derive(Default)]
pub struct StaticRules {
    table: BTreeMap<(PlanId, SpaceId), Vec<PrerequisiteRule>>,
}

impl StaticRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: PrerequisiteRule) -> Self {
        self.add(rule);
        self
    }

    pub fn add(&mut self, rule: PrerequisiteRule) {
        let key = (rule.plan.clone(), rule.space.clone());
        self.table.entry(key).or_default().push(rule);
    }
}

impl RuleSource for StaticRules {
    fn rules_for(
        &self,
        plan: &PlanId,
        space: &SpaceId,
        purpose: Purpose,
    ) -> Result<Vec<PrerequisiteRule>, CatalogError> {
        let stored = self
            .table
            .get(&(plan.clone(), space.clone()))
            .cloned()
            .unwrap_or_default();
        Ok(select_applicable(stored, purpose))
    }
}
