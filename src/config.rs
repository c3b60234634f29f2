//! Loading the service configuration (badge catalog + seeded users) from TOML.
//!
//! See `ServiceConfig`, `BadgeCfg` and `UserCfg` for the expected schema.

use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{Badge, BadgeCategory, Criteria, ProgressFacts, Rarity};

#[derive(Clone, Debug, Deserialize)]
pub struct ServiceConfig {
  /// Load the built-in catalog in addition to `badges`.
  #[serde(default = "default_true")]
  pub seed_builtin_badges: bool,
  #[serde(default)]
  pub badges: Vec<BadgeCfg>,
  #[serde(default)]
  pub users: Vec<UserCfg>,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self { seed_builtin_badges: true, badges: vec![], users: vec![] }
  }
}

fn default_true() -> bool { true }

/// Badge entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct BadgeCfg {
  #[serde(default)] pub id: Option<String>,
  pub name: String,
  #[serde(default)] pub description: String,
  pub category: BadgeCategory,
  #[serde(default)] pub rarity: Rarity,
  pub criteria: Criteria,
  #[serde(default)] pub xp_reward: u64,
  #[serde(default = "default_true")] pub is_active: bool,
}

impl BadgeCfg {
  pub fn into_badge(self) -> Badge {
    let now = Utc::now();
    Badge {
      id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
      name: self.name,
      description: self.description,
      category: self.category,
      rarity: self.rarity,
      criteria: self.criteria,
      xp_reward: self.xp_reward,
      is_active: self.is_active,
      created_at: now,
      updated_at: now,
    }
  }
}

/// User entry accepted in TOML configuration; facts default to zero.
#[derive(Clone, Debug, Deserialize)]
pub struct UserCfg {
  pub id: String,
  pub name: String,
  #[serde(default)] pub total_notes: u64,
  #[serde(default)] pub current_streak: u64,
  #[serde(default)] pub shared_notes: u64,
  #[serde(default)] pub ai_usage_count: u64,
  #[serde(default)] pub level: u64,
}

impl UserCfg {
  pub fn progress(&self) -> ProgressFacts {
    ProgressFacts {
      total_notes: self.total_notes,
      current_streak: self.current_streak,
      shared_notes: self.shared_notes,
      ai_usage_count: self.ai_usage_count,
      level: self.level,
    }
  }
}

pub fn parse_config(s: &str) -> Result<ServiceConfig, toml::de::Error> {
  toml::from_str::<ServiceConfig>(s)
}

/// Attempt to load `ServiceConfig` from BADGE_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<ServiceConfig> {
  let path = std::env::var("BADGE_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "eduguardian_backend", %path, badges = cfg.badges.len(), users = cfg.users.len(), "Loaded service config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "eduguardian_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "eduguardian_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
