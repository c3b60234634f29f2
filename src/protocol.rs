//! Public HTTP request/response DTOs (serde ready).
//! Field names are camelCase to match the frontend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Badge, BadgeCategory, Criteria, EventData, ProgressFacts, Rarity};

pub const DEFAULT_PAGE_LIMIT: usize = 50;
pub const MAX_PAGE_LIMIT: usize = 100;

/// Query string accepted by `GET /badges`. All filters are combined with AND.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeQuery {
    pub category: Option<String>,
    pub rarity: Option<String>,
    pub criteria_type: Option<String>,
    /// Case-insensitive substring of the badge name.
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl BadgeQuery {
    pub fn matches(&self, b: &Badge) -> bool {
        if !self.include_inactive && !b.is_active {
            return false;
        }
        if let Some(c) = &self.category {
            if b.category.as_str() != c {
                return false;
            }
        }
        if let Some(r) = &self.rarity {
            if b.rarity.as_str() != r {
                return false;
            }
        }
        if let Some(t) = &self.criteria_type {
            if b.criteria.kind.as_str() != t {
                return false;
            }
        }
        if let Some(s) = &self.search {
            if !b.name.to_lowercase().contains(&s.to_lowercase()) {
                return false;
            }
        }
        true
    }

    /// (offset, limit) after defaulting and clamping.
    pub fn window(&self) -> (usize, usize) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
        let page = self.page.unwrap_or(1).max(1);
        ((page - 1).saturating_mul(limit), limit)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeIn {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: BadgeCategory,
    #[serde(default)]
    pub rarity: Rarity,
    pub criteria: Criteria,
    #[serde(default)]
    pub xp_reward: u64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Partial update for `PUT /badges/:id`; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<BadgeCategory>,
    pub rarity: Option<Rarity>,
    pub criteria: Option<Criteria>,
    pub xp_reward: Option<u64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardIn {
    pub criteria_met: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub event_data: EventData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIn {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(flatten)]
    pub progress: ProgressFacts,
}

/// Collaborator update of progress facts. Present fields overwrite the stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPatch {
    pub total_notes: Option<u64>,
    pub current_streak: Option<u64>,
    pub shared_notes: Option<u64>,
    pub ai_usage_count: Option<u64>,
    pub level: Option<u64>,
}

impl ProgressPatch {
    pub fn apply(&self, p: &mut ProgressFacts) {
        if let Some(v) = self.total_notes { p.total_notes = v; }
        if let Some(v) = self.current_streak { p.current_streak = v; }
        if let Some(v) = self.shared_notes { p.shared_notes = v; }
        if let Some(v) = self.ai_usage_count { p.ai_usage_count = v; }
        if let Some(v) = self.level { p.level = v; }
    }
}

/// An earned badge joined with its catalog record.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnedBadgeOut {
    pub badge: Badge,
    pub earned_at: DateTime<Utc>,
    pub criteria_met: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageOut {
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
