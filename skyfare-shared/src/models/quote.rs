use serde::{Deserialize, Serialize};

/// Flight metadata the quote source attaches to an offer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedOffer {
    pub airline: Option<String>,
    pub flight_number: Option<String>,
    pub duration: Option<String>,
    pub cabin: Option<String>,
    pub seats_remaining: Option<u32>,
}

/// Display annotations assigned during aggregation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferTags {
    /// Offer is quoted in the caller's preferred currency
    pub preferred: bool,
    /// Offer is the globally lowest by USD-normalized price
    pub best: bool,
}

/// A single quote in one currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteOffer {
    pub currency: String,
    pub price: f64,
    pub price_usd: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_offer: Option<ParsedOffer>,
    #[serde(default)]
    pub tags: OfferTags,
}

/// Aggregated multi-currency search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub lowest_price: f64,
    pub lowest_currency: String,
    pub lowest_price_usd: f64,
    pub all_results: Vec<QuoteOffer>,
}

impl SearchResult {
    pub fn best_offer(&self) -> Option<&QuoteOffer> {
        self.all_results.iter().find(|o| o.tags.best)
    }

    /// Currencies present in the result, in display order, without repeats
    pub fn currencies(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for offer in &self.all_results {
            if !seen.contains(&offer.currency) {
                seen.push(offer.currency.clone());
            }
        }
        seen
    }
}
