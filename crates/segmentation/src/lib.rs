//! Rule-based audience segmentation — attribute resolution, predicate
//! evaluation, candidate matching, and membership synchronization.

pub mod builder;
pub mod evaluator;
pub mod matcher;
pub mod membership;
pub mod predicates;
pub mod preview;
pub mod resolver;
pub mod segment;
pub mod source;
pub mod sync;

pub use builder::SegmentBuilder;
pub use matcher::Matcher;
pub use membership::{InMemoryMembershipStore, MembershipStore};
pub use predicates::{Rule, RuleLogic, RuleOperator, RuleValue};
pub use preview::PreviewService;
pub use segment::{InMemorySegmentStore, Segment, SegmentStore};
pub use source::{CandidateSource, InMemoryCandidateSource};
pub use sync::{SyncSummary, Synchronizer};
