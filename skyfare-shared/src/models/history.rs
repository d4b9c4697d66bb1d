use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::search::{AirportCode, Currency, Passengers, SearchDraft, SearchQuery};

/// One remembered search. Field names follow the persisted browser format
/// (`departureDate`, `preferredCurrency`), so existing payloads load as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub key: String,
    pub origin: AirportCode,
    pub destination: AirportCode,
    pub departure_date: NaiveDate,
    pub passengers: Passengers,
    pub preferred_currency: Currency,
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn from_query(query: &SearchQuery, saved_at: DateTime<Utc>) -> Self {
        Self {
            key: query.history_key(),
            origin: query.origin.clone(),
            destination: query.destination.clone(),
            departure_date: query.departure_date,
            passengers: query.passengers,
            preferred_currency: query.preferred_currency,
            saved_at,
        }
    }

    /// Route label, e.g. `JFK → LAX`
    pub fn label(&self) -> String {
        format!("{} → {}", self.origin, self.destination)
    }

    pub fn to_query(&self) -> SearchQuery {
        SearchQuery {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            departure_date: self.departure_date,
            passengers: self.passengers,
            preferred_currency: self.preferred_currency,
        }
    }

    /// Form values for re-populating a search from history
    pub fn to_draft(&self) -> SearchDraft {
        SearchDraft::from(&self.to_query())
    }
}
