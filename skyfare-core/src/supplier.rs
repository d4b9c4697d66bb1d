use async_trait::async_trait;
use serde_json::Value;
use skyfare_shared::models::insight::{DestinationInsights, PriceAnalysis, TravelRecommendations};
use skyfare_shared::{AirportCode, InsightContext};

use crate::interpreter::ParsedQuery;
use crate::search::QuoteRequest;
use crate::UpstreamError;

/// External source of raw multi-currency flight offers
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Raw quote body; shape checks happen in the aggregator
    async fn fetch_quotes(&self, request: &QuoteRequest) -> Result<Value, UpstreamError>;
}

/// External natural language interpreter
#[async_trait]
pub trait QueryInterpreter: Send + Sync {
    async fn parse_query(&self, text: &str) -> Result<ParsedQuery, UpstreamError>;
}

/// External AI model backing the insight capabilities
#[async_trait]
pub trait InsightModel: Send + Sync {
    async fn destination_insights(
        &self,
        destination: &AirportCode,
    ) -> Result<DestinationInsights, UpstreamError>;

    async fn analyze_prices(
        &self,
        context: &InsightContext,
    ) -> Result<PriceAnalysis, UpstreamError>;

    async fn recommendations(
        &self,
        context: &InsightContext,
    ) -> Result<TravelRecommendations, UpstreamError>;
}
