use serde::{Deserialize, Serialize};
use skyfare_shared::SearchQuery;

/// Query parameters sent to the quote source (`GET /api/flights/search`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub origin: String,
    pub destination: String,
    pub departure_date: chrono::NaiveDate, // Just date, no time component
    pub adults: u8,
    pub currency: String,
}

impl From<&SearchQuery> for QuoteRequest {
    fn from(query: &SearchQuery) -> Self {
        Self {
            origin: query.origin.to_string(),
            destination: query.destination.to_string(),
            departure_date: query.departure_date,
            adults: query.passengers.get(),
            currency: query.preferred_currency.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use skyfare_shared::{AirportCode, Currency, Passengers};

    #[test]
    fn test_quote_request_from_query() {
        let query = SearchQuery {
            origin: AirportCode::parse("JFK").unwrap(),
            destination: AirportCode::parse("LHR").unwrap(),
            departure_date: NaiveDate::from_ymd_opt(2024, 12, 25).unwrap(),
            passengers: Passengers::new(3).unwrap(),
            preferred_currency: Currency::Gbp,
        };
        let request = QuoteRequest::from(&query);
        assert_eq!(request.adults, 3);
        assert_eq!(request.currency, "GBP");

        let json = serde_json::to_value(&request).expect("Failed to serialize");
        assert_eq!(json["departure_date"], "2024-12-25");
        assert_eq!(json["origin"], "JFK");
    }
}
