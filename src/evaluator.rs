//! Badge criteria evaluation.
//!
//! `evaluate` is pure: it compares one fact (from the user's progress or the event's
//! data) against the badge threshold with `>=`. Unknown criteria types never match.

use serde_json::json;
use tracing::trace;

use crate::domain::{Criteria, CriteriaType, EventData, ProgressFacts};

/// Decide whether `facts` (plus the event context) satisfy `criteria`.
///
/// `event` does not take part in dispatch; it is only traced.
pub fn evaluate(facts: &ProgressFacts, criteria: &Criteria, event: &str, data: &EventData) -> bool {
  let observed = match &criteria.kind {
    CriteriaType::NoteCount => Some(facts.total_notes as f64),
    CriteriaType::StreakDays => Some(facts.current_streak as f64),
    CriteriaType::SharedNotes => Some(facts.shared_notes as f64),
    CriteriaType::AiUsage => Some(facts.ai_usage_count as f64),
    CriteriaType::XpLevel => Some(facts.level as f64),
    CriteriaType::ViewCount => data.view_count,
    CriteriaType::Rating => data.rating,
    CriteriaType::Unrecognized(_) => None,
  };
  let passed = observed.map_or(false, |v| v >= criteria.threshold);
  trace!(target: "badges", %event, kind = %criteria.kind, threshold = criteria.threshold, ?observed, passed, "criteria evaluated");
  passed
}

/// The `criteriaMet` record stored on an event-driven award.
pub fn criteria_met_for(criteria: &Criteria, event: &str) -> serde_json::Value {
  json!({
    "event": event,
    "type": criteria.kind.as_str(),
    "threshold": criteria.threshold,
  })
}
