//! Segment definitions and the segment store boundary.

use audience_core::{AudienceError, AudienceResult, EntityKind};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::predicates::{Rule, RuleLogic};

/// A named, persisted rule set plus its cached member count for one entity
/// kind. Rules keep their insertion order; evaluation reads whatever the
/// store holds at sync time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub entity_kind: EntityKind,
    pub rules: Vec<Rule>,
    pub rule_logic: RuleLogic,
    /// Cached count; equals the membership row count immediately after every
    /// successful sync and may go stale between runs.
    pub member_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Segment {
    /// Reject definitions the engine should never be asked to evaluate.
    /// Evaluation itself degrades bad rules to non-matches; this is the
    /// stricter check applied when a definition is saved.
    pub fn validate(&self, max_rules: usize) -> AudienceResult<()> {
        if self.name.trim().is_empty() {
            return Err(AudienceError::Validation("segment name is empty".into()));
        }
        if self.rules.len() > max_rules {
            return Err(AudienceError::Validation(format!(
                "segment has {} rules, limit is {}",
                self.rules.len(),
                max_rules
            )));
        }
        if let Some(rule) = self.rules.iter().find(|r| r.field.trim().is_empty()) {
            return Err(AudienceError::Validation(format!(
                "rule with operator {:?} has an empty field",
                rule.operator
            )));
        }
        Ok(())
    }
}

/// Persistence boundary for segment definitions.
pub trait SegmentStore: Send + Sync {
    fn get(&self, id: Uuid) -> AudienceResult<Option<Segment>>;
    fn set_member_count(&self, id: Uuid, count: u64) -> AudienceResult<()>;
}

/// Thread-safe in-memory segment store backed by DashMap.
///
/// Production: replace with the CRM's segment table; the trait surface stays
/// the same.
pub struct InMemorySegmentStore {
    segments: DashMap<Uuid, Segment>,
}

impl InMemorySegmentStore {
    pub fn new() -> Self {
        Self {
            segments: DashMap::new(),
        }
    }

    pub fn insert(&self, segment: Segment) {
        self.segments.insert(segment.id, segment);
    }

    pub fn list_for_org(&self, org_id: Uuid) -> Vec<Segment> {
        let mut segments: Vec<Segment> = self
            .segments
            .iter()
            .filter(|entry| entry.value().org_id == org_id)
            .map(|entry| entry.value().clone())
            .collect();
        segments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        segments
    }
}

impl Default for InMemorySegmentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentStore for InMemorySegmentStore {
    fn get(&self, id: Uuid) -> AudienceResult<Option<Segment>> {
        Ok(self.segments.get(&id).map(|entry| entry.value().clone()))
    }

    fn set_member_count(&self, id: Uuid, count: u64) -> AudienceResult<()> {
        if let Some(mut entry) = self.segments.get_mut(&id) {
            entry.member_count = count;
            entry.updated_at = Utc::now();
        }
        Ok(())
    }
}
