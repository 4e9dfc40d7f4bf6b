//! Candidate matching — runs the rule evaluator over a tenant's records.

use std::sync::Arc;

use audience_core::{AudienceResult, CandidateEntity, EntityKind};
use tracing::debug;
use uuid::Uuid;

use crate::evaluator;
use crate::predicates::{Rule, RuleLogic};
use crate::source::CandidateSource;

/// Evaluates a rule set against every candidate in scope and collects the
/// passing records. Read-only; evaluation never mutates shared state, so
/// callers may run matches concurrently with anything.
#[derive(Clone)]
pub struct Matcher {
    source: Arc<dyn CandidateSource>,
}

impl Matcher {
    pub fn new(source: Arc<dyn CandidateSource>) -> Self {
        Self { source }
    }

    /// Matched entity ids. With `limit` set (preview mode) the scan stops as
    /// soon as the limit is reached; without it every candidate is scanned.
    pub fn match_ids(
        &self,
        org_id: Uuid,
        kind: EntityKind,
        rules: &[Rule],
        logic: RuleLogic,
        limit: Option<usize>,
    ) -> AudienceResult<Vec<Uuid>> {
        let candidates = self.source.load_candidates(org_id, kind)?;
        let scanned = candidates.len();
        let mut matched = Vec::new();
        for entity in &candidates {
            if evaluator::passes(entity, rules, logic) {
                matched.push(entity.id);
                if let Some(limit) = limit {
                    if matched.len() >= limit {
                        break;
                    }
                }
            }
        }
        debug!(
            %org_id,
            kind = kind.label(),
            scanned,
            matched = matched.len(),
            "candidate scan complete"
        );
        Ok(matched)
    }

    /// Matched entities with their full projections, for the preview path.
    pub fn match_entities(
        &self,
        org_id: Uuid,
        kind: EntityKind,
        rules: &[Rule],
        logic: RuleLogic,
        limit: Option<usize>,
    ) -> AudienceResult<Vec<CandidateEntity>> {
        let candidates = self.source.load_candidates(org_id, kind)?;
        let mut matched = Vec::new();
        for entity in candidates {
            if evaluator::passes(&entity, rules, logic) {
                matched.push(entity);
                if let Some(limit) = limit {
                    if matched.len() >= limit {
                        break;
                    }
                }
            }
        }
        Ok(matched)
    }
}
