//! Read-only rule-set preview — bounded matching with display projections.

use std::sync::Arc;

use audience_core::{AudienceResult, EntityKind, EntityPreview};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matcher::Matcher;
use crate::predicates::{Rule, RuleLogic};
use crate::resolver;
use crate::source::CandidateSource;

/// A bounded sample of the records a rule set currently matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentPreview {
    pub members: Vec<EntityPreview>,
    pub entity_kind: EntityKind,
}

/// Lets a caller iterate on a rule set before committing it to a segment.
/// Pure read path: no membership writes, no recalculation guard, safe to run
/// concurrently with an in-flight sync on the same segment.
pub struct PreviewService {
    matcher: Matcher,
}

impl PreviewService {
    pub fn new(source: Arc<dyn CandidateSource>) -> Self {
        Self {
            matcher: Matcher::new(source),
        }
    }

    pub fn preview(
        &self,
        org_id: Uuid,
        kind: EntityKind,
        rules: &[Rule],
        logic: RuleLogic,
        limit: usize,
    ) -> AudienceResult<SegmentPreview> {
        let entities = self
            .matcher
            .match_entities(org_id, kind, rules, logic, Some(limit))?;

        let members = entities
            .iter()
            .map(|entity| EntityPreview {
                id: entity.id,
                name: resolver::display_name(entity),
                email: entity.email.clone(),
                company: entity.company.clone(),
            })
            .collect();

        Ok(SegmentPreview {
            members,
            entity_kind: kind,
        })
    }
}
