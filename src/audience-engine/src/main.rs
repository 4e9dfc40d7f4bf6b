//! Audience Engine — rule-based segmentation and membership sync for CRM
//! contact and lead records.
//!
//! Development entry point: seeds an in-memory tenant, previews a rule set,
//! then runs the synchronizer end-to-end. The HTTP trigger surface lives in
//! the surrounding application; this binary exercises the engine directly.

use std::sync::Arc;

use audience_core::config::AppConfig;
use audience_core::triggers::ChannelSink;
use audience_core::{CandidateEntity, EntityKind, FieldValue};
use audience_segmentation::{
    InMemoryCandidateSource, InMemoryMembershipStore, InMemorySegmentStore, Matcher,
    PreviewService, SegmentBuilder, Synchronizer,
};
use clap::Parser;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "audience-engine")]
#[command(about = "Rule-based audience segmentation and membership sync")]
#[command(version)]
struct Cli {
    /// Number of demo contacts to seed
    #[arg(long, default_value_t = 200, env = "AUDIENCE_ENGINE__DEMO_CONTACTS")]
    contacts: usize,

    /// Number of demo leads to seed
    #[arg(long, default_value_t = 120, env = "AUDIENCE_ENGINE__DEMO_LEADS")]
    leads: usize,

    /// Preview sample size (overrides config)
    #[arg(long, env = "AUDIENCE_ENGINE__ENGINE__PREVIEW_SAMPLE_LIMIT")]
    preview_limit: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "audience_engine=info,audience_segmentation=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Audience Engine starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(limit) = cli.preview_limit {
        config.engine.preview_sample_limit = limit;
    }

    info!(
        node_id = %config.node_id,
        preview_limit = config.engine.preview_sample_limit,
        triggers_enabled = config.triggers.enabled,
        "Configuration loaded"
    );

    let source = Arc::new(InMemoryCandidateSource::new());
    let segments = Arc::new(InMemorySegmentStore::new());
    let membership = Arc::new(InMemoryMembershipStore::new());

    let org_id = Uuid::new_v4();
    seed_demo_entities(&source, org_id, cli.contacts, cli.leads);
    info!(
        %org_id,
        contacts = cli.contacts,
        leads = cli.leads,
        "Demo tenant seeded"
    );

    let segment = SegmentBuilder::new(org_id, "Hot new leads", EntityKind::Lead)
        .description("New leads worth a first call")
        .field_equals("status", "new")
        .field_gt("score", 60i64)
        .build();
    segment.validate(config.engine.max_rules_per_segment)?;

    // Iterate on the rule set before committing it to the segment store.
    let preview_service = PreviewService::new(source.clone());
    let preview = preview_service.preview(
        org_id,
        segment.entity_kind,
        &segment.rules,
        segment.rule_logic,
        config.engine.preview_sample_limit,
    )?;
    info!(sample = preview.members.len(), "Rule-set preview complete");
    for member in &preview.members {
        info!(id = %member.id, name = %member.name, "Preview member");
    }

    let segment_id = segment.id;
    segments.insert(segment);

    let triggers: Arc<dyn audience_core::triggers::TriggerSink> = if config.triggers.enabled {
        Arc::new(ChannelSink::spawn())
    } else {
        audience_core::triggers::noop_sink()
    };

    let synchronizer = Synchronizer::new(
        segments.clone(),
        Matcher::new(source.clone()),
        membership.clone(),
        triggers,
    );

    let summary = synchronizer.sync(segment_id)?;
    info!(
        member_count = summary.member_count,
        members_added = summary.members_added,
        members_removed = summary.members_removed,
        "Initial sync committed"
    );

    // A second run against unchanged data reports an empty diff.
    let summary = synchronizer.sync(segment_id)?;
    info!(
        member_count = summary.member_count,
        members_added = summary.members_added,
        members_removed = summary.members_removed,
        "Repeat sync committed"
    );

    Ok(())
}

fn seed_demo_entities(
    source: &InMemoryCandidateSource,
    org_id: Uuid,
    contacts: usize,
    leads: usize,
) {
    let mut rng = rand::thread_rng();
    let lead_statuses = ["new", "working", "qualified", "unqualified"];
    let companies = ["Acme Corp", "Globex", "Initech", "Northwind", "Umbrella"];

    for i in 0..contacts {
        let mut entity = CandidateEntity::new(org_id, EntityKind::Contact);
        entity.first_name = Some(format!("Contact{i}"));
        entity.email = Some(format!("contact{i}@example.com"));
        entity.company = companies.choose(&mut rng).map(|c| c.to_string());
        entity.status = Some(
            if rng.gen_bool(0.7) { "active" } else { "dormant" }.to_string(),
        );
        entity.revenue = Some(rng.gen_range(1_000.0..500_000.0));
        source.insert(entity);
    }

    for i in 0..leads {
        let mut entity = CandidateEntity::new(org_id, EntityKind::Lead);
        entity.first_name = Some(format!("Lead{i}"));
        entity.email = Some(format!("lead{i}@example.com"));
        entity.status = lead_statuses.choose(&mut rng).map(|s| s.to_string());
        entity.custom_fields.insert(
            "score".into(),
            FieldValue::Number(rng.gen_range(0.0_f64..100.0).round()),
        );
        source.insert(entity);
    }
}
