//! Domain models: badges, their award criteria, earned-badge records, and users with progress facts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Broad grouping shown in the badge gallery.
///
/// Admins may introduce new groupings; those are kept verbatim in `Other`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum BadgeCategory {
  Achievement,
  Engagement,
  Level,
  Streak,
  Social,
  Special,
  Other(String),
}

impl BadgeCategory {
  pub fn as_str(&self) -> &str {
    match self {
      BadgeCategory::Achievement => "achievement",
      BadgeCategory::Engagement => "engagement",
      BadgeCategory::Level => "level",
      BadgeCategory::Streak => "streak",
      BadgeCategory::Social => "social",
      BadgeCategory::Special => "special",
      BadgeCategory::Other(s) => s,
    }
  }
}

impl From<String> for BadgeCategory {
  fn from(s: String) -> Self {
    match s.as_str() {
      "achievement" => BadgeCategory::Achievement,
      "engagement" => BadgeCategory::Engagement,
      "level" => BadgeCategory::Level,
      "streak" => BadgeCategory::Streak,
      "social" => BadgeCategory::Social,
      "special" => BadgeCategory::Special,
      _ => BadgeCategory::Other(s),
    }
  }
}

impl From<BadgeCategory> for String {
  fn from(c: BadgeCategory) -> Self {
    match c {
      BadgeCategory::Other(s) => s,
      other => other.as_str().to_string(),
    }
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
  #[default]
  Common,
  Uncommon,
  Rare,
  Epic,
  Legendary,
}

impl Rarity {
  pub fn as_str(&self) -> &'static str {
    match self {
      Rarity::Common => "common",
      Rarity::Uncommon => "uncommon",
      Rarity::Rare => "rare",
      Rarity::Epic => "epic",
      Rarity::Legendary => "legendary",
    }
  }
}

/// Which fact a badge threshold is compared against.
///
/// Unknown strings are kept verbatim in `Unrecognized` so a catalog entry written
/// by a newer admin tool still round-trips; such criteria never match.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum CriteriaType {
  NoteCount,
  StreakDays,
  SharedNotes,
  AiUsage,
  XpLevel,
  ViewCount,
  Rating,
  Unrecognized(String),
}

impl CriteriaType {
  pub fn as_str(&self) -> &str {
    match self {
      CriteriaType::NoteCount => "note_count",
      CriteriaType::StreakDays => "streak_days",
      CriteriaType::SharedNotes => "shared_notes",
      CriteriaType::AiUsage => "ai_usage",
      CriteriaType::XpLevel => "xp_level",
      CriteriaType::ViewCount => "view_count",
      CriteriaType::Rating => "rating",
      CriteriaType::Unrecognized(s) => s,
    }
  }
}

impl From<String> for CriteriaType {
  fn from(s: String) -> Self {
    match s.as_str() {
      "note_count" => CriteriaType::NoteCount,
      "streak_days" => CriteriaType::StreakDays,
      "shared_notes" => CriteriaType::SharedNotes,
      "ai_usage" => CriteriaType::AiUsage,
      "xp_level" => CriteriaType::XpLevel,
      "view_count" => CriteriaType::ViewCount,
      "rating" => CriteriaType::Rating,
      _ => CriteriaType::Unrecognized(s),
    }
  }
}

impl From<CriteriaType> for String {
  fn from(t: CriteriaType) -> Self {
    match t {
      CriteriaType::Unrecognized(s) => s,
      other => other.as_str().to_string(),
    }
  }
}

impl std::fmt::Display for CriteriaType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Criteria {
  #[serde(rename = "type")]
  pub kind: CriteriaType,
  pub threshold: f64,
}

/// Path segment that `/users/:user_id/badges/check` claims; a badge with this id could
/// never be awarded by hand.
pub const RESERVED_BADGE_ID: &str = "check";

/// Catalog entry. Deactivated instead of deleted so earned records keep resolving.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
  pub id: String,
  pub name: String,
  #[serde(default)] pub description: String,
  pub category: BadgeCategory,
  pub rarity: Rarity,
  pub criteria: Criteria,
  pub xp_reward: u64,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Badge {
  /// Checks the fields the catalog cannot enforce through types alone.
  pub fn validate(&self) -> ApiResult<()> {
    if self.id.trim().is_empty() {
      return Err(ApiError::validation("badge id must not be empty"));
    }
    if self.id == RESERVED_BADGE_ID {
      return Err(ApiError::validation(format!("badge id '{}' is reserved", RESERVED_BADGE_ID)));
    }
    if self.name.trim().is_empty() {
      return Err(ApiError::validation("badge name must not be empty"));
    }
    if self.category.as_str().trim().is_empty() {
      return Err(ApiError::validation("badge category must not be empty"));
    }
    let t = self.criteria.threshold;
    if !t.is_finite() || t < 0.0 {
      return Err(ApiError::validation(format!(
        "criteria threshold must be a non-negative number, got {}",
        t
      )));
    }
    Ok(())
  }
}

/// One earned badge on a user. Never mutated after insertion.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserBadge {
  pub badge: String,
  pub earned_at: DateTime<Utc>,
  /// Free-form description: a string for manual awards, an object for event-driven ones.
  pub criteria_met: serde_json::Value,
}

/// Counters maintained by note upload, the streak tracker and the AI usage tracker.
/// The evaluator only reads them.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressFacts {
  pub total_notes: u64,
  pub current_streak: u64,
  pub shared_notes: u64,
  pub ai_usage_count: u64,
  pub level: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: String,
  pub name: String,
  #[serde(flatten)]
  pub progress: ProgressFacts,
  pub xp: u64,
  pub badges: Vec<UserBadge>,
  pub created_at: DateTime<Utc>,
}

impl User {
  pub fn has_badge(&self, badge_id: &str) -> bool {
    self.badges.iter().any(|ub| ub.badge == badge_id)
  }
}

/// Context bag supplied with an event. Only `view_count` and `rating` criteria read it.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EventData {
  pub view_count: Option<f64>,
  pub rating: Option<f64>,
}
