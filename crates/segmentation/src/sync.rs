//! Membership synchronization — diffs matcher output against persisted
//! membership and applies the change under a per-segment recalculation
//! guard.

use std::collections::HashSet;
use std::sync::Arc;

use audience_core::error::{AudienceError, AudienceResult};
use audience_core::triggers::{SegmentEvent, TriggerSink};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::matcher::Matcher;
use crate::membership::MembershipStore;
use crate::segment::{Segment, SegmentStore};

/// What a sync changed: the resulting member count and the size of each side
/// of the diff.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SyncSummary {
    pub member_count: u64,
    pub members_added: u64,
    pub members_removed: u64,
}

/// Lifecycle of a recalculation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Running,
    Committed,
    Failed,
}

/// One recorded recalculation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRun {
    pub id: Uuid,
    pub segment_id: Uuid,
    pub status: SyncStatus,
    pub summary: Option<SyncSummary>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// Reconciles a segment's persisted membership with what its rules currently
/// match.
///
/// At most one sync runs per segment at a time; a second caller is rejected
/// immediately with [`AudienceError::RecalcInProgress`] rather than queued.
/// Syncs on different segments never contend, and previews never take the
/// guard.
pub struct Synchronizer {
    segments: Arc<dyn SegmentStore>,
    matcher: Matcher,
    membership: Arc<dyn MembershipStore>,
    triggers: Arc<dyn TriggerSink>,
    in_flight: DashMap<Uuid, ()>,
    history: DashMap<Uuid, SyncRun>,
}

impl Synchronizer {
    pub fn new(
        segments: Arc<dyn SegmentStore>,
        matcher: Matcher,
        membership: Arc<dyn MembershipStore>,
        triggers: Arc<dyn TriggerSink>,
    ) -> Self {
        Self {
            segments,
            matcher,
            membership,
            triggers,
            in_flight: DashMap::new(),
            history: DashMap::new(),
        }
    }

    /// Recalculate the segment's membership and apply the diff.
    ///
    /// Everything before the commit is side-effect-free: a failure while
    /// loading candidates or evaluating rules leaves the previous membership
    /// rows and cached count exactly as they were. The trigger dispatch after
    /// a commit is fire-and-forget and cannot affect the returned summary.
    pub fn sync(&self, segment_id: Uuid) -> AudienceResult<SyncSummary> {
        let segment = self
            .segments
            .get(segment_id)?
            .ok_or(AudienceError::SegmentNotFound(segment_id))?;

        let _guard = self.acquire_guard(segment_id)?;

        let run_id = Uuid::new_v4();
        self.history.insert(
            run_id,
            SyncRun {
                id: run_id,
                segment_id,
                status: SyncStatus::Running,
                summary: None,
                started_at: Utc::now(),
                completed_at: None,
                error: None,
            },
        );

        match self.run_guarded(&segment) {
            Ok(summary) => {
                self.finish_run(run_id, SyncStatus::Committed, Some(summary), None);
                info!(
                    %segment_id,
                    org_id = %segment.org_id,
                    member_count = summary.member_count,
                    members_added = summary.members_added,
                    members_removed = summary.members_removed,
                    "segment sync committed"
                );
                self.triggers.dispatch(SegmentEvent::new(
                    segment_id,
                    segment.org_id,
                    summary.member_count,
                    summary.members_added,
                    summary.members_removed,
                ));
                Ok(summary)
            }
            Err(e) => {
                self.finish_run(run_id, SyncStatus::Failed, None, Some(e.to_string()));
                warn!(%segment_id, error = %e, "segment sync failed, no diff applied");
                Err(e)
            }
        }
    }

    fn run_guarded(&self, segment: &Segment) -> AudienceResult<SyncSummary> {
        let current = self.membership.current_members(segment.id)?;
        let matched_ids = self.matcher.match_ids(
            segment.org_id,
            segment.entity_kind,
            &segment.rules,
            segment.rule_logic,
            None,
        )?;
        let matched: HashSet<Uuid> = matched_ids.into_iter().collect();

        let added: Vec<Uuid> = matched.difference(&current).copied().collect();
        let removed: Vec<Uuid> = current.difference(&matched).copied().collect();

        self.membership
            .commit_diff(segment.id, &added, &removed, Utc::now())?;
        self.segments
            .set_member_count(segment.id, matched.len() as u64)?;

        Ok(SyncSummary {
            member_count: matched.len() as u64,
            members_added: added.len() as u64,
            members_removed: removed.len() as u64,
        })
    }

    fn acquire_guard(&self, segment_id: Uuid) -> AudienceResult<RecalcGuard<'_>> {
        match self.in_flight.entry(segment_id) {
            Entry::Occupied(_) => Err(AudienceError::RecalcInProgress(segment_id)),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(RecalcGuard {
                    registry: &self.in_flight,
                    segment_id,
                })
            }
        }
    }

    fn finish_run(
        &self,
        run_id: Uuid,
        status: SyncStatus,
        summary: Option<SyncSummary>,
        error: Option<String>,
    ) {
        if let Some(mut entry) = self.history.get_mut(&run_id) {
            let run = entry.value_mut();
            run.status = status;
            run.summary = summary;
            run.completed_at = Some(Utc::now());
            run.error = error;
        }
    }

    /// All recorded runs, newest first.
    pub fn sync_history(&self) -> Vec<SyncRun> {
        let mut runs: Vec<SyncRun> = self.history.iter().map(|e| e.value().clone()).collect();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        runs
    }

    /// Recorded runs for one segment, newest first.
    pub fn history_for_segment(&self, segment_id: Uuid) -> Vec<SyncRun> {
        let mut runs: Vec<SyncRun> = self
            .history
            .iter()
            .filter(|e| e.value().segment_id == segment_id)
            .map(|e| e.value().clone())
            .collect();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        runs
    }
}

/// Exclusive per-segment recalculation token; releases on drop, including on
/// every error path.
struct RecalcGuard<'a> {
    registry: &'a DashMap<Uuid, ()>,
    segment_id: Uuid,
}

impl Drop for RecalcGuard<'_> {
    fn drop(&mut self) {
        self.registry.remove(&self.segment_id);
    }
}
