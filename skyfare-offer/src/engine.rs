use chrono::{Local, NaiveDate, Utc};
use serde::Serialize;
use skyfare_core::interpreter::{interpret, InterpretedOutcome};
use skyfare_core::search::QuoteRequest;
use skyfare_core::supplier::{InsightModel, QueryInterpreter, QuoteSource};
use skyfare_core::validator::validate_draft;
use skyfare_core::{CoreResult, NetworkError, UpstreamError, ValidationError};
use skyfare_shared::models::events::SearchCompletedEvent;
use skyfare_shared::models::insight::{DestinationInsights, PriceAnalysis, TravelRecommendations};
use skyfare_shared::{Capability, HistoryEntry, SearchDraft, SearchQuery, SearchResult};
use skyfare_store::HistoryStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::aggregator::aggregate;
use crate::insights::{InsightError, InsightOrchestrator, InsightState};

/// Outcome of a free-text search: how the text was understood and, when it
/// was understood, the search it triggered.
#[derive(Debug, Clone, PartialEq)]
pub struct AskOutcome {
    pub interpretation: InterpretedOutcome,
    pub search: Option<CoreResult<SearchResult>>,
}

/// Per-capability snapshot for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityStatus {
    pub capability: Capability,
    #[serde(flatten)]
    pub state: InsightState,
}

/// Ties the search flow together:
/// validate -> quote source -> aggregate -> history, and text -> interpret -> same path.
pub struct FareEngine {
    quotes: Arc<dyn QuoteSource>,
    interpreter: Arc<dyn QueryInterpreter>,
    insights: InsightOrchestrator,
    history: Arc<HistoryStore>,
    timeout: Duration,
    today: Option<NaiveDate>,
}

impl FareEngine {
    pub fn new(
        quotes: Arc<dyn QuoteSource>,
        interpreter: Arc<dyn QueryInterpreter>,
        model: Arc<dyn InsightModel>,
        history: Arc<HistoryStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            quotes,
            interpreter,
            insights: InsightOrchestrator::new(model, timeout),
            history,
            timeout,
            today: None,
        }
    }

    /// Pin the reference date used for past-date validation
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Structured search. Every validation problem is reported before any
    /// network call is made.
    pub async fn search(&self, draft: &SearchDraft) -> CoreResult<SearchResult> {
        let query = validate_draft(draft, self.today())?;
        self.run_search(query).await
    }

    /// Free-text search. The interpreted query goes through the same validation
    /// as a form, whatever its confidence.
    pub async fn ask(&self, text: &str) -> CoreResult<AskOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }

        let parse = bounded(self.timeout, self.interpreter.parse_query(text)).await?;
        let interpretation = interpret(&parse, self.today());

        let search = match &interpretation {
            InterpretedOutcome::Unparsed { message } => {
                info!("Query not understood: {}", message);
                None
            }
            InterpretedOutcome::Invalid { error, .. } => Some(Err(error.clone().into())),
            InterpretedOutcome::ParsedLowConfidence { query } | InterpretedOutcome::ParsedActionable { query, .. } => {
                if let Some(tier) = interpretation.tier() {
                    info!("Interpreted {} ({})", query.history_key(), tier.label());
                }
                Some(self.run_search(query.clone()).await)
            }
        };

        Ok(AskOutcome { interpretation, search })
    }

    async fn run_search(&self, query: SearchQuery) -> CoreResult<SearchResult> {
        // A new base search invalidates whatever insights were pending
        self.insights.clear_context().await;

        let request = QuoteRequest::from(&query);
        info!(
            "Searching {} for {} passenger(s), preferred {}",
            query.history_key(),
            request.adults,
            request.currency
        );

        let raw = bounded(self.timeout, self.quotes.fetch_quotes(&request))
            .await
            .inspect_err(|e| warn!("Quote source failed for {}: {}", query.history_key(), e))?;
        let result = aggregate(&raw, query.preferred_currency)?;

        let context = self.insights.set_context(query.clone(), result.clone()).await;
        self.history.record(HistoryEntry::from_query(&query, Utc::now())).await;

        let event = SearchCompletedEvent {
            context_id: context.id,
            history_key: query.history_key(),
            lowest_currency: result.lowest_currency.clone(),
            lowest_price_usd: result.lowest_price_usd,
            offer_count: result.all_results.len(),
            timestamp: Utc::now().timestamp(),
        };
        info!(
            "Search completed: {}",
            serde_json::to_string(&event).unwrap_or_default()
        );

        Ok(result)
    }

    pub async fn destination_insights(&self, code: &str) -> Result<DestinationInsights, InsightError> {
        self.insights.destination_insights(code).await
    }

    pub async fn analyze_prices(&self) -> Result<PriceAnalysis, InsightError> {
        self.insights.analyze_prices().await
    }

    pub async fn recommendations(&self) -> Result<TravelRecommendations, InsightError> {
        self.insights.recommendations().await
    }

    pub async fn insight_status(&self) -> Vec<CapabilityStatus> {
        self.insights
            .states()
            .await
            .into_iter()
            .map(|(capability, state)| CapabilityStatus { capability, state })
            .collect()
    }

    pub async fn active_search(&self) -> Option<SearchQuery> {
        self.insights.context().await.map(|c| c.query.clone())
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.history.list().await
    }

    pub async fn restore(&self, key: &str) -> Option<SearchDraft> {
        self.history.restore(key).await
    }
}

async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, UpstreamError>>,
) -> Result<T, UpstreamError> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or_else(|_| Err(NetworkError::Timeout(limit).into()))
}
