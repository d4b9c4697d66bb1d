pub mod aggregator;
pub mod context;
pub mod engine;
pub mod insights;

pub use aggregator::{aggregate, AggregationError};
pub use context::SearchContext;
pub use engine::{AskOutcome, CapabilityStatus, FareEngine};
pub use insights::{InsightError, InsightOrchestrator, InsightState};
