use serde_json::Value;
use skyfare_core::CoreError;
use skyfare_core::ResponseError;
use skyfare_shared::{Currency, OfferTags, ParsedOffer, QuoteOffer, SearchResult};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AggregationError {
    #[error("Malformed quote response: {0}")]
    MalformedResponse(String),

    #[error("No flight offers found")]
    NoOffersFound,
}

impl From<AggregationError> for CoreError {
    fn from(err: AggregationError) -> Self {
        match err {
            AggregationError::MalformedResponse(reason) => ResponseError::MalformedResponse(reason).into(),
            AggregationError::NoOffersFound => CoreError::NoOffersFound,
        }
    }
}

fn malformed(reason: impl Into<String>) -> AggregationError {
    AggregationError::MalformedResponse(reason.into())
}

/// Read a non-negative number; strings and other shapes are rejected, not coerced.
fn read_amount(offer: &Value, field: &str, index: usize) -> Result<f64, AggregationError> {
    let amount = offer
        .get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| malformed(format!("all_results[{}].{} is not a number", index, field)))?;
    if amount < 0.0 {
        return Err(malformed(format!("all_results[{}].{} is negative", index, field)));
    }
    Ok(amount)
}

fn read_offer(raw: &Value, index: usize) -> Result<QuoteOffer, AggregationError> {
    if !raw.is_object() {
        return Err(malformed(format!("all_results[{}] is not an object", index)));
    }

    let currency = raw
        .get("currency")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| malformed(format!("all_results[{}].currency is missing", index)))?;
    let price = read_amount(raw, "price", index)?;
    let price_usd = read_amount(raw, "price_usd", index)?;

    let parsed_offer = match raw.get("parsed_offer") {
        None | Some(Value::Null) => None,
        Some(meta) => Some(
            serde_json::from_value::<ParsedOffer>(meta.clone())
                .map_err(|e| malformed(format!("all_results[{}].parsed_offer: {}", index, e)))?,
        ),
    };

    Ok(QuoteOffer {
        currency,
        price,
        price_usd,
        parsed_offer,
        tags: OfferTags::default(),
    })
}

/// Merge a quote-source body into a single result.
///
/// The lowest offer is chosen by `price_usd` only, ties going to the first one
/// seen. Display order is the order the source returned.
pub fn aggregate(raw: &Value, preferred: Currency) -> Result<SearchResult, AggregationError> {
    let results = match raw.get("all_results") {
        None => return Err(malformed("all_results is missing")),
        Some(Value::Null) => return Err(AggregationError::NoOffersFound),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(malformed("all_results is not a sequence")),
    };

    let mut offers = results
        .iter()
        .enumerate()
        .map(|(i, raw)| read_offer(raw, i))
        .collect::<Result<Vec<_>, _>>()?;

    let mut best = 0;
    for (i, offer) in offers.iter().enumerate() {
        if offer.price_usd < offers[best].price_usd {
            best = i;
        }
    }
    let lowest = offers.get(best).cloned().ok_or(AggregationError::NoOffersFound)?;

    for (i, offer) in offers.iter_mut().enumerate() {
        offer.tags.preferred = offer.currency.eq_ignore_ascii_case(preferred.code());
        offer.tags.best = i == best;
    }

    if let Some(reported) = raw.get("lowest_currency").and_then(Value::as_str) {
        if reported != lowest.currency {
            tracing::debug!(
                "Quote source reported lowest {} but USD-normalized lowest is {}",
                reported,
                lowest.currency
            );
        }
    }

    Ok(SearchResult {
        lowest_price: lowest.price,
        lowest_currency: lowest.currency,
        lowest_price_usd: lowest.price_usd,
        all_results: offers,
    })
}
