use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Independently schedulable AI enrichment operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    DestinationInsights,
    PriceAnalysis,
    Recommendations,
}

impl Capability {
    pub const ALL: [Capability; 3] = [
        Capability::DestinationInsights,
        Capability::PriceAnalysis,
        Capability::Recommendations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::DestinationInsights => "destination_insights",
            Capability::PriceAnalysis => "price_analysis",
            Capability::Recommendations => "recommendations",
        }
    }

    /// Caller-facing wording when this capability fails
    pub fn failure_message(&self) -> &'static str {
        match self {
            Capability::DestinationInsights => "AI service temporarily unavailable",
            Capability::PriceAnalysis => "AI analysis service temporarily unavailable",
            Capability::Recommendations => "Unable to load travel tips",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationInsights {
    pub best_time_to_visit: String,
    pub attractions: Vec<String>,
    pub travel_tips: Vec<String>,
    pub transportation: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAnalysis {
    pub best_value_currency: String,
    pub trend_analysis: String,
    pub booking_recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelRecommendations {
    pub recommendations: Vec<String>,
    pub insights: String,
}

/// Settled payload of any capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "capability", content = "payload", rename_all = "snake_case")]
pub enum InsightPayload {
    DestinationInsights(DestinationInsights),
    PriceAnalysis(PriceAnalysis),
    Recommendations(TravelRecommendations),
}

impl InsightPayload {
    pub fn capability(&self) -> Capability {
        match self {
            InsightPayload::DestinationInsights(_) => Capability::DestinationInsights,
            InsightPayload::PriceAnalysis(_) => Capability::PriceAnalysis,
            InsightPayload::Recommendations(_) => Capability::Recommendations,
        }
    }
}

/// One currency quote as sent to the price analysis model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub currency: String,
    pub price: f64,
}

/// Search context body posted to the context-scoped AI endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightContext {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub passengers: u8,
    pub preferred_currency: String,
    pub currencies: Vec<String>,
    pub lowest_price: f64,
    pub lowest_currency: String,
    pub prices: Vec<PricePoint>,
}
