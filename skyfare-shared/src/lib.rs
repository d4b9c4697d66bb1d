pub mod models;
pub mod pii;

pub use models::history::HistoryEntry;
pub use models::insight::{Capability, InsightContext, InsightPayload};
pub use models::quote::{OfferTags, ParsedOffer, QuoteOffer, SearchResult};
pub use models::search::{AirportCode, Currency, Passengers, SearchDraft, SearchQuery};
pub use pii::Masked;
