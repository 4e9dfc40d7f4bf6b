//! Candidate loading boundary.
//!
//! Production: replace with PostgreSQL (sqlx) or similar row store. The
//! in-memory source provides the same API surface for development and
//! testing.

use audience_core::{AudienceResult, CandidateEntity, EntityKind};
use dashmap::DashMap;
use uuid::Uuid;

/// Read-only access to the tenant's candidate records.
pub trait CandidateSource: Send + Sync {
    /// Load every entity of `kind` owned by `org_id`, including all built-in
    /// columns and the full custom-field map. Tenant scoping is part of the
    /// contract: implementations must never return another org's rows.
    fn load_candidates(
        &self,
        org_id: Uuid,
        kind: EntityKind,
    ) -> AudienceResult<Vec<CandidateEntity>>;
}

/// Thread-safe in-memory candidate store keyed by `(org_id, kind)`.
pub struct InMemoryCandidateSource {
    entities: DashMap<(Uuid, EntityKind), Vec<CandidateEntity>>,
}

impl InMemoryCandidateSource {
    pub fn new() -> Self {
        Self {
            entities: DashMap::new(),
        }
    }

    pub fn insert(&self, entity: CandidateEntity) {
        self.entities
            .entry((entity.org_id, entity.kind))
            .or_default()
            .push(entity);
    }

    pub fn len(&self) -> usize {
        self.entities.iter().map(|e| e.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryCandidateSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateSource for InMemoryCandidateSource {
    fn load_candidates(
        &self,
        org_id: Uuid,
        kind: EntityKind,
    ) -> AudienceResult<Vec<CandidateEntity>> {
        Ok(self
            .entities
            .get(&(org_id, kind))
            .map(|e| e.value().clone())
            .unwrap_or_default())
    }
}
