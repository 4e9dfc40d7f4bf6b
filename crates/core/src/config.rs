use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `AUDIENCE_ENGINE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub triggers: TriggerConfig,
}

/// Knobs for the segmentation engine itself.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Sample size for rule-set previews when the caller does not pass one.
    #[serde(default = "default_preview_sample_limit")]
    pub preview_sample_limit: usize,
    /// Upper bound on rules per segment accepted at build time.
    #[serde(default = "default_max_rules_per_segment")]
    pub max_rules_per_segment: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TriggerConfig {
    #[serde(default = "default_triggers_enabled")]
    pub enabled: bool,
}

// Default functions
fn default_node_id() -> String {
    "node-01".to_string()
}
fn default_preview_sample_limit() -> usize {
    25
}
fn default_max_rules_per_segment() -> usize {
    50
}
fn default_triggers_enabled() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            preview_sample_limit: default_preview_sample_limit(),
            max_rules_per_segment: default_max_rules_per_segment(),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            enabled: default_triggers_enabled(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            engine: EngineConfig::default(),
            triggers: TriggerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("AUDIENCE_ENGINE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
