//! Membership persistence boundary — the only mutable shared state in the
//! engine. All writes go through the synchronizer's guarded path.

use std::collections::{HashMap, HashSet};

use audience_core::AudienceResult;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One persisted membership: entity `entity_id` belongs to segment
/// `segment_id` since `added_at`. `(segment_id, entity_id)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipRow {
    pub segment_id: Uuid,
    pub entity_id: Uuid,
    pub added_at: DateTime<Utc>,
}

/// Storage for segment membership rows.
pub trait MembershipStore: Send + Sync {
    /// The segment's current member-id set.
    fn current_members(&self, segment_id: Uuid) -> AudienceResult<HashSet<Uuid>>;

    /// Apply a diff as a single transaction: every insert and delete lands
    /// or none do. Rows not named in the diff stay untouched — in
    /// particular, surviving members keep their original `added_at`.
    fn commit_diff(
        &self,
        segment_id: Uuid,
        added: &[Uuid],
        removed: &[Uuid],
        added_at: DateTime<Utc>,
    ) -> AudienceResult<()>;

    /// Full rows for a segment, for display and verification.
    fn member_rows(&self, segment_id: Uuid) -> AudienceResult<Vec<MembershipRow>>;
}

/// Thread-safe in-memory membership store.
///
/// Production: replace with a transactional row store; the per-segment
/// DashMap entry lock stands in for the database transaction here, so
/// `commit_diff` is atomic with respect to concurrent readers.
pub struct InMemoryMembershipStore {
    rows: DashMap<Uuid, HashMap<Uuid, DateTime<Utc>>>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }

    pub fn member_count(&self, segment_id: Uuid) -> usize {
        self.rows
            .get(&segment_id)
            .map(|entry| entry.value().len())
            .unwrap_or(0)
    }
}

impl Default for InMemoryMembershipStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MembershipStore for InMemoryMembershipStore {
    fn current_members(&self, segment_id: Uuid) -> AudienceResult<HashSet<Uuid>> {
        Ok(self
            .rows
            .get(&segment_id)
            .map(|entry| entry.value().keys().copied().collect())
            .unwrap_or_default())
    }

    fn commit_diff(
        &self,
        segment_id: Uuid,
        added: &[Uuid],
        removed: &[Uuid],
        added_at: DateTime<Utc>,
    ) -> AudienceResult<()> {
        let mut entry = self.rows.entry(segment_id).or_default();
        let members = entry.value_mut();
        for entity_id in added {
            // `or_insert` keeps the uniqueness invariant and never refreshes
            // the first-match timestamp of an existing row.
            members.entry(*entity_id).or_insert(added_at);
        }
        for entity_id in removed {
            members.remove(entity_id);
        }
        Ok(())
    }

    fn member_rows(&self, segment_id: Uuid) -> AudienceResult<Vec<MembershipRow>> {
        Ok(self
            .rows
            .get(&segment_id)
            .map(|entry| {
                entry
                    .value()
                    .iter()
                    .map(|(entity_id, added_at)| MembershipRow {
                        segment_id,
                        entity_id: *entity_id,
                        added_at: *added_at,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
