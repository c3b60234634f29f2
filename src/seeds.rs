//! Built-in badge catalog so a fresh instance has something to award.

use chrono::Utc;

use crate::domain::{Badge, BadgeCategory, Criteria, CriteriaType, Rarity};

#[allow(clippy::too_many_arguments)]
fn badge(
  id: &str,
  name: &str,
  description: &str,
  category: BadgeCategory,
  rarity: Rarity,
  kind: CriteriaType,
  threshold: f64,
  xp_reward: u64,
) -> Badge {
  let now = Utc::now();
  Badge {
    id: id.into(),
    name: name.into(),
    description: description.into(),
    category,
    rarity,
    criteria: Criteria { kind, threshold },
    xp_reward,
    is_active: true,
    created_at: now,
    updated_at: now,
  }
}

pub fn seed_badges() -> Vec<Badge> {
  use BadgeCategory::*;
  use CriteriaType::*;
  vec![
    badge("first-note", "First Steps", "Upload your first note.", Achievement, Rarity::Common, NoteCount, 1.0, 10),
    badge("note-collector", "Note Collector", "Upload 10 notes.", Achievement, Rarity::Uncommon, NoteCount, 10.0, 50),
    badge("note-master", "Note Master", "Upload 50 notes.", Achievement, Rarity::Epic, NoteCount, 50.0, 200),
    badge("week-streak", "On Fire", "Study 7 days in a row.", Streak, Rarity::Uncommon, StreakDays, 7.0, 70),
    badge("month-streak", "Unstoppable", "Study 30 days in a row.", Streak, Rarity::Legendary, StreakDays, 30.0, 300),
    badge("first-share", "Generous Mind", "Share a note with the community.", Social, Rarity::Common, SharedNotes, 1.0, 15),
    badge("ai-explorer", "AI Explorer", "Generate 5 summaries or flashcard sets.", Engagement, Rarity::Common, AiUsage, 5.0, 25),
    badge("level-5", "Rising Scholar", "Reach level 5.", Level, Rarity::Rare, XpLevel, 5.0, 100),
    badge("popular-note", "Crowd Favourite", "Have a note viewed 100 times.", Social, Rarity::Rare, ViewCount, 100.0, 80),
    badge("top-rated", "Top Rated", "Receive a rating of 4.5 or higher.", Special, Rarity::Epic, Rating, 4.5, 120),
  ]
}
