pub mod config;
pub mod error;
pub mod triggers;
pub mod types;

pub use config::AppConfig;
pub use error::{AudienceError, AudienceResult};
pub use types::{CandidateEntity, EntityKind, EntityPreview, FieldValue};
