//! Closed material catalog enforcement.
//!
//! Every `materials` list in a plan is overwritten from the catalog. Nothing
//! the enrichment service proposed survives, so a final plan can only name
//! catalog materials.

use indexmap::IndexMap;
use lexigrade_config::CatalogConfig;
use lexigrade_core::{PlanPayload, SkillAggregate};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Skill → ordered material names, plus the skill used for anything else.
#[derive(Debug, Clone)]
pub struct MaterialCatalog {
    fallback_skill: String,
    materials: IndexMap<String, Vec<String>>,
}

impl MaterialCatalog {
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            fallback_skill: config.fallback_skill.clone(),
            materials: config.materials.clone(),
        }
    }

    /// The catalog key that `skill` resolves to: itself when listed,
    /// otherwise the fallback skill.
    pub fn resolve_skill<'a>(&'a self, skill: &'a str) -> &'a str {
        if self.materials.contains_key(skill) {
            skill
        } else {
            &self.fallback_skill
        }
    }

    /// Materials for `skill`, falling back to the fallback skill's list.
    pub fn materials_for(&self, skill: &str) -> &[String] {
        self.materials
            .get(skill)
            .or_else(|| self.materials.get(&self.fallback_skill))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn fallback_skill(&self) -> &str {
        &self.fallback_skill
    }

    pub fn skills(&self) -> impl Iterator<Item = &str> {
        self.materials.keys().map(String::as_str)
    }

    /// Whether `material` appears anywhere in the catalog.
    pub fn contains(&self, material: &str) -> bool {
        self.materials.values().flatten().any(|m| m == material)
    }
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        Self::from_config(&CatalogConfig::default())
    }
}

/// Which part of a plan a rewrite applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteScope {
    /// One weekly goal.
    Goal,
    /// A plan without per-goal structure.
    Plan,
}

/// Record of one `materials` overwrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialRewrite {
    pub week: Option<i64>,
    pub topic: Option<String>,
    /// Catalog skill whose list was written.
    pub skill: String,
    pub scope: RewriteScope,
}

/// Rewrites plan materials from a [`MaterialCatalog`].
#[derive(Debug, Clone, Default)]
pub struct MaterialResolver {
    catalog: MaterialCatalog,
}

impl MaterialResolver {
    pub fn new(catalog: MaterialCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &MaterialCatalog {
        &self.catalog
    }

    /// Overwrite every `materials` list in `plan` from the catalog.
    ///
    /// Returns `None` when the plan is opaque and not a JSON object, since
    /// such a plan cannot be checked against the catalog.
    pub fn resolve(
        &self,
        plan: PlanPayload,
        skill_summary: &[SkillAggregate],
        weak_topics: &[String],
    ) -> Option<PlanPayload> {
        self.resolve_with_report(plan, skill_summary, weak_topics).0
    }

    /// Like [`MaterialResolver::resolve`], also returning each rewrite made.
    pub fn resolve_with_report(
        &self,
        plan: PlanPayload,
        skill_summary: &[SkillAggregate],
        weak_topics: &[String],
    ) -> (Option<PlanPayload>, Vec<MaterialRewrite>) {
        let mut rewrites = Vec::new();
        let plan = match plan {
            PlanPayload::Structured(mut plan) => {
                for goal in &mut plan.weekly_goals {
                    let skill = self.goal_skill(&goal.topic, skill_summary);
                    goal.materials = self.catalog.materials_for(skill).to_vec();
                    rewrites.push(self.record(Some(i64::from(goal.week)), Some(&goal.topic), skill, RewriteScope::Goal));
                }
                Some(PlanPayload::Structured(plan))
            }
            PlanPayload::Opaque(Value::Object(mut map)) => {
                self.rewrite_opaque(&mut map, skill_summary, weak_topics, &mut rewrites);
                Some(PlanPayload::Opaque(Value::Object(map)))
            }
            PlanPayload::Opaque(other) => {
                warn!(kind = ?other, "Dropping personalized plan that is not a JSON object");
                None
            }
        };
        (plan, rewrites)
    }

    fn rewrite_opaque(
        &self,
        map: &mut Map<String, Value>,
        skill_summary: &[SkillAggregate],
        weak_topics: &[String],
        rewrites: &mut Vec<MaterialRewrite>,
    ) {
        let mut per_goal = false;
        if let Some(Value::Array(goals)) = map.get_mut("weekly_goals") {
            per_goal = true;
            for goal in goals.iter_mut().filter_map(Value::as_object_mut) {
                let topic = goal.get("topic").and_then(Value::as_str).map(str::to_string);
                let skill = self.goal_skill(topic.as_deref().unwrap_or_default(), skill_summary);
                goal.insert("materials".into(), self.material_list(skill));
                let week = goal.get("week").and_then(Value::as_i64);
                rewrites.push(self.record(week, topic.as_deref(), skill, RewriteScope::Goal));
            }
        }

        // A flat plan gets one list; a stray top-level list is overwritten too.
        if !per_goal || map.contains_key("materials") {
            let skill = self.plan_skill(skill_summary, weak_topics);
            map.insert("materials".into(), self.material_list(skill));
            rewrites.push(self.record(None, None, skill, RewriteScope::Plan));
        }
    }

    /// First `skill_summary` skill named in the goal topic, else the fallback.
    fn goal_skill<'a>(&'a self, topic: &str, skill_summary: &'a [SkillAggregate]) -> &'a str {
        detect_skill(topic, skill_summary)
            .map(|skill| self.catalog.resolve_skill(skill))
            .unwrap_or(self.catalog.fallback_skill())
    }

    /// Skill for a plan without goals: the first `skill_summary` entry, else
    /// the skill part of the first weak topic, else the fallback.
    fn plan_skill<'a>(&'a self, skill_summary: &'a [SkillAggregate], weak_topics: &'a [String]) -> &'a str {
        skill_summary
            .first()
            .map(|agg| agg.skill.as_str())
            .or_else(|| {
                weak_topics
                    .first()
                    .and_then(|label| label.split(" - ").next())
            })
            .map(|skill| self.catalog.resolve_skill(skill))
            .unwrap_or(self.catalog.fallback_skill())
    }

    fn material_list(&self, skill: &str) -> Value {
        Value::Array(
            self.catalog
                .materials_for(skill)
                .iter()
                .cloned()
                .map(Value::String)
                .collect(),
        )
    }

    fn record(&self, week: Option<i64>, topic: Option<&str>, skill: &str, scope: RewriteScope) -> MaterialRewrite {
        debug!(?week, skill, ?scope, "Rewrote plan materials from catalog");
        MaterialRewrite {
            week,
            topic: topic.map(str::to_string),
            skill: skill.to_string(),
            scope,
        }
    }
}

/// The first skill in `skill_summary` whose name occurs in `topic`.
///
/// Matching is a case-sensitive substring test; empty skill names never match.
pub(crate) fn detect_skill<'a>(topic: &str, skill_summary: &'a [SkillAggregate]) -> Option<&'a str> {
    skill_summary
        .iter()
        .map(|agg| agg.skill.as_str())
        .find(|skill| !skill.is_empty() && topic.contains(skill))
}
