//! Integration test for the full segmentation flow: seed candidates, preview
//! a rule set, sync a segment, and reconcile after the data changes.

use std::collections::HashSet;
use std::sync::Arc;

use audience_core::error::AudienceError;
use audience_core::triggers::capture_sink;
use audience_core::{CandidateEntity, EntityKind, FieldValue};
use audience_segmentation::{
    InMemoryCandidateSource, InMemoryMembershipStore, InMemorySegmentStore, Matcher,
    MembershipStore, PreviewService, RuleLogic, SegmentBuilder, SegmentStore, Synchronizer,
};
use uuid::Uuid;

fn seed_contact(
    source: &InMemoryCandidateSource,
    org_id: Uuid,
    name: &str,
    status: &str,
    revenue: Option<f64>,
) -> Uuid {
    let mut entity = CandidateEntity::new(org_id, EntityKind::Contact);
    entity.first_name = Some(name.to_string());
    entity.email = Some(format!("{}@example.com", name.to_lowercase()));
    entity.status = Some(status.to_string());
    entity.revenue = revenue;
    entity
        .custom_fields
        .insert("plan".into(), FieldValue::Text("pro".into()));
    let id = entity.id;
    source.insert(entity);
    id
}

#[test]
fn test_preview_then_sync_then_reconcile() {
    let source = Arc::new(InMemoryCandidateSource::new());
    let segments = Arc::new(InMemorySegmentStore::new());
    let membership = Arc::new(InMemoryMembershipStore::new());
    let captured = capture_sink();

    let org_id = Uuid::new_v4();
    let other_org = Uuid::new_v4();

    let alice = seed_contact(&source, org_id, "Alice", "active", Some(250_000.0));
    let bob = seed_contact(&source, org_id, "Bob", "active", Some(40_000.0));
    let carol = seed_contact(&source, org_id, "Carol", "churned", Some(900_000.0));
    // A lookalike in another org that must never leak into results.
    seed_contact(&source, other_org, "Mallory", "active", Some(500_000.0));

    let segment = SegmentBuilder::new(org_id, "High-value active", EntityKind::Contact)
        .description("Active contacts above 100k revenue")
        .field_equals("status", "active")
        .field_gt("revenue", 100_000i64)
        .build();
    let segment_id = segment.id;

    // Preview before committing the rule set: read-only, no rows written.
    let preview_service = PreviewService::new(source.clone());
    let preview = preview_service
        .preview(
            org_id,
            EntityKind::Contact,
            &segment.rules,
            RuleLogic::And,
            10,
        )
        .unwrap();
    assert_eq!(preview.members.len(), 1);
    assert_eq!(preview.members[0].name, "Alice");
    assert_eq!(membership.member_count(segment_id), 0);

    segments.insert(segment);
    let synchronizer = Synchronizer::new(
        segments.clone(),
        Matcher::new(source.clone()),
        membership.clone(),
        captured.clone(),
    );

    let summary = synchronizer.sync(segment_id).unwrap();
    assert_eq!(summary.member_count, 1);
    assert_eq!(summary.members_added, 1);
    assert_eq!(summary.members_removed, 0);

    let members = membership.current_members(segment_id).unwrap();
    assert_eq!(members, HashSet::from([alice]));
    assert!(!members.contains(&bob));
    assert!(!members.contains(&carol));

    // Bob's revenue grows past the threshold; Alice churns. Rebuild the
    // org's contact set to reflect the CRM update; the next sync reports
    // exactly the delta.
    let rebuilt = Arc::new(InMemoryCandidateSource::new());
    let mut bob_entity = CandidateEntity::new(org_id, EntityKind::Contact);
    bob_entity.id = bob;
    bob_entity.first_name = Some("Bob".into());
    bob_entity.status = Some("active".into());
    bob_entity.revenue = Some(140_000.0);
    rebuilt.insert(bob_entity);
    let mut alice_entity = CandidateEntity::new(org_id, EntityKind::Contact);
    alice_entity.id = alice;
    alice_entity.first_name = Some("Alice".into());
    alice_entity.status = Some("churned".into());
    alice_entity.revenue = Some(250_000.0);
    rebuilt.insert(alice_entity);

    let synchronizer = Synchronizer::new(
        segments.clone(),
        Matcher::new(rebuilt),
        membership.clone(),
        captured.clone(),
    );
    let summary = synchronizer.sync(segment_id).unwrap();
    assert_eq!(summary.members_added, 1);
    assert_eq!(summary.members_removed, 1);
    assert_eq!(summary.member_count, 1);
    assert_eq!(
        membership.current_members(segment_id).unwrap(),
        HashSet::from([bob])
    );

    // Cached count tracks the rows after every successful run.
    assert_eq!(segments.get(segment_id).unwrap().unwrap().member_count, 1);
    assert_eq!(captured.count(), 2);
}

#[test]
fn test_diff_set_algebra_holds() {
    let source = Arc::new(InMemoryCandidateSource::new());
    let segments = Arc::new(InMemorySegmentStore::new());
    let membership = Arc::new(InMemoryMembershipStore::new());

    let org_id = Uuid::new_v4();
    let mut expected_matched = HashSet::new();
    for i in 0..40 {
        let status = if i % 2 == 0 { "active" } else { "dormant" };
        let id = seed_contact(&source, org_id, &format!("C{i}"), status, None);
        if i % 2 == 0 {
            expected_matched.insert(id);
        }
    }

    let segment = SegmentBuilder::new(org_id, "Actives", EntityKind::Contact)
        .field_equals("status", "active")
        .build();
    let segment_id = segment.id;
    segments.insert(segment);

    // Pre-seed membership with an arbitrary mix of matching and stale ids.
    let stale: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
    let preexisting: Vec<Uuid> = expected_matched.iter().take(7).copied().collect();
    let mut current: Vec<Uuid> = preexisting.clone();
    current.extend(&stale);
    membership
        .commit_diff(segment_id, &current, &[], chrono::Utc::now())
        .unwrap();

    let synchronizer = Synchronizer::new(
        segments,
        Matcher::new(source),
        membership.clone(),
        audience_core::triggers::noop_sink(),
    );
    let summary = synchronizer.sync(segment_id).unwrap();

    // added ∪ unchanged = matched, removed ∪ unchanged = current,
    // added ∩ removed = ∅.
    let final_members = membership.current_members(segment_id).unwrap();
    assert_eq!(final_members, expected_matched);
    assert_eq!(summary.member_count as usize, expected_matched.len());
    assert_eq!(
        summary.members_added as usize,
        expected_matched.len() - preexisting.len()
    );
    assert_eq!(summary.members_removed as usize, stale.len());
}

#[test]
fn test_simultaneous_syncs_serialize_or_reject() {
    let source = Arc::new(InMemoryCandidateSource::new());
    let segments = Arc::new(InMemorySegmentStore::new());
    let membership = Arc::new(InMemoryMembershipStore::new());

    let org_id = Uuid::new_v4();
    for i in 0..200 {
        seed_contact(&source, org_id, &format!("C{i}"), "active", None);
    }

    let segment = SegmentBuilder::new(org_id, "Actives", EntityKind::Contact)
        .field_equals("status", "active")
        .build();
    let segment_id = segment.id;
    segments.insert(segment);

    let synchronizer = Arc::new(Synchronizer::new(
        segments.clone(),
        Matcher::new(source),
        membership.clone(),
        audience_core::triggers::noop_sink(),
    ));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let synchronizer = synchronizer.clone();
        handles.push(std::thread::spawn(move || synchronizer.sync(segment_id)));
    }

    let mut committed = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) => committed += 1,
            Err(AudienceError::RecalcInProgress(_)) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert!(committed >= 1);
    assert_eq!(committed + rejected, 4);

    // Whatever interleaving happened, the final state equals a serial run.
    assert_eq!(membership.member_count(segment_id), 200);
    assert_eq!(segments.get(segment_id).unwrap().unwrap().member_count, 200);

    // One more sync confirms the state converged.
    let summary = synchronizer.sync(segment_id).unwrap();
    assert_eq!(summary.members_added, 0);
    assert_eq!(summary.members_removed, 0);
}
