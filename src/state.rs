//! Application state: the badge catalog, the user registry, and the award engine.
//!
//! This module owns:
//!   - the badge catalog (by id + insertion order, which is the catalog order)
//!   - users with their progress facts, XP and earned badges
//!   - the award transaction and the batch "check and award" flow
//!
//! Lock order is always `badges` before `catalog` before `users`. The duplicate-award
//! check and the append happen under one write guard on `users`, so two concurrent
//! awards of the same badge to the same user cannot both succeed.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{load_config_from_env, ServiceConfig};
use crate::domain::{Badge, EventData, User, UserBadge};
use crate::error::{ApiError, ApiResult};
use crate::evaluator::{criteria_met_for, evaluate};
use crate::protocol::{BadgeIn, BadgePatch, BadgeQuery, EarnedBadgeOut, ProgressPatch, UserIn};
use crate::seeds::seed_badges;

/// Result of a single award attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwardOutcome {
    Awarded { xp_reward: u64 },
    AlreadyHeld,
}

impl AwardOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            AwardOutcome::Awarded { .. } => "Badge awarded successfully",
            AwardOutcome::AlreadyHeld => "User already has this badge",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BadgeFailure {
    pub badge_id: String,
    pub error: String,
}

/// Shared by the HTTP create path and users seeded from config.
fn validate_user_fields(id: &str, name: &str) -> ApiResult<()> {
    if id.trim().is_empty() {
        return Err(ApiError::validation("user id must not be empty"));
    }
    if name.trim().is_empty() {
        return Err(ApiError::validation("user name must not be empty"));
    }
    Ok(())
}

/// What a batch evaluation did: badges newly awarded (catalog order) and per-badge failures.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub awarded: Vec<Badge>,
    pub failed: Vec<BadgeFailure>,
}

#[derive(Clone, Default)]
pub struct AppState {
    pub badges: Arc<RwLock<HashMap<String, Badge>>>,
    pub catalog: Arc<RwLock<Vec<String>>>,
    pub users: Arc<RwLock<HashMap<String, User>>>,
}

impl AppState {
    /// Build state from env: load config, seed the catalog and users.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_config_from_env().unwrap_or_default();
        Self::from_config(cfg)
    }

    pub fn from_config(cfg: ServiceConfig) -> Self {
        let mut by_id = HashMap::<String, Badge>::new();
        let mut order = Vec::<String>::new();

        // Configured badges first, so they win over built-ins with the same id.
        for bc in cfg.badges {
            let badge = bc.into_badge();
            if let Err(e) = badge.validate() {
                error!(target: "badges", id = %badge.id, error = %e, "Skipping configured badge");
                continue;
            }
            if by_id.contains_key(&badge.id) {
                error!(target: "badges", id = %badge.id, "Skipping configured badge: duplicate id");
                continue;
            }
            order.push(badge.id.clone());
            by_id.insert(badge.id.clone(), badge);
        }

        if cfg.seed_builtin_badges {
            for badge in seed_badges() {
                if !by_id.contains_key(&badge.id) {
                    order.push(badge.id.clone());
                    by_id.insert(badge.id.clone(), badge);
                }
            }
        }

        let mut users = HashMap::<String, User>::new();
        for uc in cfg.users {
            if let Err(e) = validate_user_fields(&uc.id, &uc.name) {
                error!(target: "eduguardian_backend", id = %uc.id, error = %e, "Skipping configured user");
                continue;
            }
            if users.contains_key(&uc.id) {
                error!(target: "eduguardian_backend", id = %uc.id, "Skipping configured user: duplicate id");
                continue;
            }
            let user = User {
                id: uc.id.clone(),
                name: uc.name.trim().to_string(),
                progress: uc.progress(),
                xp: 0,
                badges: vec![],
                created_at: Utc::now(),
            };
            users.insert(user.id.clone(), user);
        }

        let active = by_id.values().filter(|b| b.is_active).count();
        info!(target: "eduguardian_backend", badges = by_id.len(), active, users = users.len(), "Startup inventory");

        Self {
            badges: Arc::new(RwLock::new(by_id)),
            catalog: Arc::new(RwLock::new(order)),
            users: Arc::new(RwLock::new(users)),
        }
    }

    // ---------------------------------------------------------------- catalog

    #[instrument(level = "debug", skip(self, input), fields(name = %input.name))]
    pub async fn create_badge(&self, input: BadgeIn) -> ApiResult<Badge> {
        let now = Utc::now();
        let badge = Badge {
            id: input.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: input.name.trim().to_string(),
            description: input.description,
            category: input.category,
            rarity: input.rarity,
            criteria: input.criteria,
            xp_reward: input.xp_reward,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        badge.validate()?;

        let mut badges = self.badges.write().await;
        if badges.contains_key(&badge.id) {
            return Err(ApiError::validation(format!("badge id already exists: {}", badge.id)));
        }
        let mut catalog = self.catalog.write().await;
        badges.insert(badge.id.clone(), badge.clone());
        catalog.push(badge.id.clone());
        info!(target: "badges", id = %badge.id, kind = %badge.criteria.kind, threshold = badge.criteria.threshold, "Badge created");
        Ok(badge)
    }

    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_badge(&self, id: &str) -> ApiResult<Badge> {
        self.badges
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Badge", id))
    }

    /// Badges matching `q`, in catalog order, paginated.
    #[instrument(level = "debug", skip(self, q))]
    pub async fn list_badges(&self, q: &BadgeQuery) -> Vec<Badge> {
        let badges = self.badges.read().await;
        let catalog = self.catalog.read().await;
        let (offset, limit) = q.window();
        catalog
            .iter()
            .filter_map(|id| badges.get(id))
            .filter(|b| q.matches(b))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    /// All active badges in catalog order, unpaginated.
    pub async fn active_badges(&self) -> Vec<Badge> {
        let badges = self.badges.read().await;
        let catalog = self.catalog.read().await;
        catalog
            .iter()
            .filter_map(|id| badges.get(id))
            .filter(|b| b.is_active)
            .cloned()
            .collect()
    }

    #[instrument(level = "debug", skip(self, patch), fields(%id))]
    pub async fn update_badge(&self, id: &str, patch: BadgePatch) -> ApiResult<Badge> {
        let mut badges = self.badges.write().await;
        let current = badges.get(id).ok_or_else(|| ApiError::not_found("Badge", id))?;

        let mut next = current.clone();
        if let Some(v) = patch.name { next.name = v.trim().to_string(); }
        if let Some(v) = patch.description { next.description = v; }
        if let Some(v) = patch.category { next.category = v; }
        if let Some(v) = patch.rarity { next.rarity = v; }
        if let Some(v) = patch.criteria { next.criteria = v; }
        if let Some(v) = patch.xp_reward { next.xp_reward = v; }
        if let Some(v) = patch.is_active { next.is_active = v; }
        next.updated_at = Utc::now();
        next.validate()?;

        badges.insert(id.to_string(), next.clone());
        info!(target: "badges", %id, active = next.is_active, "Badge updated");
        Ok(next)
    }

    /// Soft delete: the badge stays resolvable but drops out of batch scans.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn deactivate_badge(&self, id: &str) -> ApiResult<Badge> {
        let mut badges = self.badges.write().await;
        let badge = badges.get_mut(id).ok_or_else(|| ApiError::not_found("Badge", id))?;
        badge.is_active = false;
        badge.updated_at = Utc::now();
        info!(target: "badges", %id, "Badge deactivated");
        Ok(badge.clone())
    }

    // ---------------------------------------------------------------- users

    #[instrument(level = "debug", skip(self, input), fields(name = %input.name))]
    pub async fn create_user(&self, input: UserIn) -> ApiResult<User> {
        let name = input.name.trim().to_string();
        let id = input.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        validate_user_fields(&id, &name)?;

        let mut users = self.users.write().await;
        if users.contains_key(&id) {
            return Err(ApiError::validation(format!("user id already exists: {}", id)));
        }
        let user = User {
            id: id.clone(),
            name,
            progress: input.progress,
            xp: 0,
            badges: vec![],
            created_at: Utc::now(),
        };
        users.insert(id, user.clone());
        info!(target: "eduguardian_backend", id = %user.id, "User created");
        Ok(user)
    }

    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_user(&self, id: &str) -> ApiResult<User> {
        self.users
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("User", id))
    }

    #[instrument(level = "debug", skip(self, patch), fields(%id))]
    pub async fn update_progress(&self, id: &str, patch: &ProgressPatch) -> ApiResult<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(id).ok_or_else(|| ApiError::not_found("User", id))?;
        patch.apply(&mut user.progress);
        debug!(target: "badges", %id, progress = ?user.progress, "Progress facts updated");
        Ok(user.clone())
    }

    /// The user's earned badges, oldest first, joined with catalog records.
    #[instrument(level = "debug", skip(self), fields(%user_id))]
    pub async fn earned_badges(&self, user_id: &str) -> ApiResult<Vec<EarnedBadgeOut>> {
        let badges = self.badges.read().await;
        let users = self.users.read().await;
        let user = users.get(user_id).ok_or_else(|| ApiError::not_found("User", user_id))?;
        Ok(user
            .badges
            .iter()
            .filter_map(|ub| {
                badges.get(&ub.badge).map(|b| EarnedBadgeOut {
                    badge: b.clone(),
                    earned_at: ub.earned_at,
                    criteria_met: ub.criteria_met.clone(),
                })
            })
            .collect())
    }

    // ---------------------------------------------------------------- awards

    /// Record `badge_id` on `user_id` once and grant its XP.
    ///
    /// Awarding a badge the user already holds is a successful no-op.
    #[instrument(level = "info", skip(self, criteria_met), fields(%user_id, %badge_id))]
    pub async fn award_badge(
        &self,
        user_id: &str,
        badge_id: &str,
        criteria_met: serde_json::Value,
    ) -> ApiResult<AwardOutcome> {
        let badge = self.get_badge(badge_id).await?;

        let mut users = self.users.write().await;
        let user = users.get_mut(user_id).ok_or_else(|| ApiError::not_found("User", user_id))?;

        if user.has_badge(badge_id) {
            debug!(target: "badges", %user_id, %badge_id, "Badge already held");
            return Ok(AwardOutcome::AlreadyHeld);
        }

        let xp = user.xp.checked_add(badge.xp_reward).ok_or_else(|| {
            ApiError::internal(format!("xp overflow awarding {} to {}", badge_id, user_id))
        })?;
        user.badges.push(UserBadge {
            badge: badge.id.clone(),
            earned_at: Utc::now(),
            criteria_met,
        });
        user.xp = xp;

        info!(target: "badges", %user_id, %badge_id, xp_reward = badge.xp_reward, total_xp = xp, "Badge awarded");
        Ok(AwardOutcome::Awarded { xp_reward: badge.xp_reward })
    }

    /// Evaluate every active badge against the user and award the ones that newly pass.
    ///
    /// Facts and held badges are snapshotted once at the start of the batch.
    #[instrument(level = "info", skip(self, data), fields(%user_id, %event))]
    pub async fn check_and_award(
        &self,
        user_id: &str,
        event: &str,
        data: &EventData,
    ) -> ApiResult<BatchOutcome> {
        let snapshot = self.get_user(user_id).await?;
        let candidates: Vec<Badge> = self
            .active_badges()
            .await
            .into_iter()
            .filter(|b| !snapshot.has_badge(&b.id))
            .filter(|b| evaluate(&snapshot.progress, &b.criteria, event, data))
            .collect();

        debug!(target: "badges", %user_id, %event, candidates = candidates.len(), "Batch candidates selected");
        Ok(self.award_candidates(user_id, event, candidates).await)
    }

    /// Award each candidate in order; a failing badge is recorded and skipped.
    async fn award_candidates(&self, user_id: &str, event: &str, candidates: Vec<Badge>) -> BatchOutcome {
        let mut out = BatchOutcome::default();
        for badge in candidates {
            let met = criteria_met_for(&badge.criteria, event);
            match self.award_badge(user_id, &badge.id, met).await {
                Ok(AwardOutcome::Awarded { .. }) => out.awarded.push(badge),
                Ok(AwardOutcome::AlreadyHeld) => {}
                Err(e) => {
                    let failure = BadgeFailure { badge_id: badge.id, error: e.to_string() };
                    warn!(target: "badges", %user_id, badge_id = %failure.badge_id, error = %failure.error, "Award failed; continuing batch");
                    out.failed.push(failure);
                }
            }
        }
        info!(target: "badges", %user_id, %event, awarded = out.awarded.len(), failed = out.failed.len(), "Batch evaluation finished");
        out
    }
}
