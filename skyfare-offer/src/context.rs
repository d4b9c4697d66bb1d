use skyfare_shared::models::insight::PricePoint;
use skyfare_shared::{InsightContext, SearchQuery, SearchResult};
use uuid::Uuid;

/// The active base search that insight requests are scoped to.
///
/// `generation` increases every time a new base search replaces the context;
/// anything tagged with an older generation is stale.
#[derive(Debug, Clone)]
pub struct SearchContext {
    pub id: Uuid,
    pub generation: u64,
    pub query: SearchQuery,
    pub result: SearchResult,
}

impl SearchContext {
    pub fn new(generation: u64, query: SearchQuery, result: SearchResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            generation,
            query,
            result,
        }
    }

    /// Dedup key for context-scoped capabilities: route, date and the
    /// currencies compared, e.g. `JFK-LAX-2025-06-15:EUR,USD`
    pub fn key(&self) -> String {
        let mut currencies = self.result.currencies();
        currencies.sort();
        format!("{}:{}", self.query.history_key(), currencies.join(","))
    }

    /// Request body for the context-scoped AI endpoints
    pub fn to_insight_context(&self) -> InsightContext {
        InsightContext {
            origin: self.query.origin.to_string(),
            destination: self.query.destination.to_string(),
            departure_date: self.query.departure_date,
            passengers: self.query.passengers.get(),
            preferred_currency: self.query.preferred_currency.to_string(),
            currencies: self.result.currencies(),
            lowest_price: self.result.lowest_price,
            lowest_currency: self.result.lowest_currency.clone(),
            prices: self
                .result
                .all_results
                .iter()
                .map(|o| PricePoint {
                    currency: o.currency.clone(),
                    price: o.price,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use skyfare_shared::{AirportCode, Currency, OfferTags, Passengers, QuoteOffer};

    fn offer(currency: &str, price: f64, price_usd: f64) -> QuoteOffer {
        QuoteOffer {
            currency: currency.to_string(),
            price,
            price_usd,
            parsed_offer: None,
            tags: OfferTags::default(),
        }
    }

    #[test]
    fn test_key_and_request_body() {
        let query = SearchQuery {
            origin: AirportCode::parse("JFK").unwrap(),
            destination: AirportCode::parse("LAX").unwrap(),
            departure_date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
            passengers: Passengers::new(2).unwrap(),
            preferred_currency: Currency::Eur,
        };
        let result = SearchResult {
            lowest_price: 500.0,
            lowest_currency: "USD".to_string(),
            lowest_price_usd: 500.0,
            all_results: vec![offer("USD", 500.0, 500.0), offer("EUR", 450.0, 500.0)],
        };
        let context = SearchContext::new(1, query, result);

        assert_eq!(context.key(), "JFK-LAX-2025-06-15:EUR,USD");

        let body = context.to_insight_context();
        assert_eq!(body.passengers, 2);
        assert_eq!(body.currencies, vec!["USD".to_string(), "EUR".to_string()]);
        assert_eq!(body.prices[1].price, 450.0);
    }
}
