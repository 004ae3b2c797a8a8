//! Skill filtering for catalog browsing.

use serde::Deserialize;

use crate::models::Skill;

/// Criteria for narrowing a skill list. Unset criteria match everything.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillFilter {
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub subcategory_id: Option<String>,
    #[serde(default)]
    pub city_id: Option<String>,
    /// Case-insensitive substring of the title or description
    #[serde(default)]
    pub query: Option<String>,
}

impl SkillFilter {
    pub fn matches(&self, skill: &Skill) -> bool {
        id_matches(&self.category_id, &skill.category_id)
            && id_matches(&self.subcategory_id, &skill.subcategory_id)
            && id_matches(&self.city_id, &skill.city_id)
            && self.query_matches(skill)
    }

    pub fn apply(&self, skills: Vec<Skill>) -> Vec<Skill> {
        skills.into_iter().filter(|s| self.matches(s)).collect()
    }

    fn query_matches(&self, skill: &Skill) -> bool {
        let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
            return true;
        };
        let needle = query.to_lowercase();

        skill.title.to_lowercase().contains(&needle)
            || skill
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }
}

fn id_matches(wanted: &Option<String>, actual: &Option<String>) -> bool {
    match wanted {
        Some(w) => actual.as_deref() == Some(w.as_str()),
        None => true,
    }
}
