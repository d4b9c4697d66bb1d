//! AI enrichment scoped to the active search.
//!
//! Each capability has its own `Idle -> Loading -> Ready | Failed` state. A
//! request made while an identical one is pending joins the pending call instead
//! of issuing another. Replacing the search context bumps a generation counter;
//! results from an older generation are dropped on arrival.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use skyfare_core::supplier::InsightModel;
use skyfare_core::validator::validate_airport_code;
use skyfare_core::{CoreError, NetworkError, ResponseError, UpstreamError, ValidationError};
use skyfare_shared::models::events::InsightSettledEvent;
use skyfare_shared::models::insight::{DestinationInsights, PriceAnalysis, TravelRecommendations};
use skyfare_shared::{Capability, InsightPayload, SearchQuery, SearchResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::context::SearchContext;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InsightState {
    Idle,
    Loading,
    Ready { payload: InsightPayload },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InsightError {
    #[error("{}", .capability.failure_message())]
    Unavailable {
        capability: Capability,
        cause: UpstreamError,
    },

    #[error("Invalid destination: {0}")]
    InvalidDestination(ValidationError),

    #[error("No active search; search for flights first")]
    NoActiveSearch,

    #[error("Search changed before {0} finished; result discarded")]
    Stale(Capability),
}

impl InsightError {
    /// The same failure in the core taxonomy, where it has one
    pub fn to_core(&self) -> Option<CoreError> {
        match self {
            InsightError::Unavailable { capability, .. } => Some(CoreError::AiUnavailable(*capability)),
            InsightError::InvalidDestination(err) => Some(CoreError::Validation(err.clone())),
            InsightError::NoActiveSearch | InsightError::Stale(_) => None,
        }
    }
}

type PendingInsight = Shared<BoxFuture<'static, Result<InsightPayload, InsightError>>>;
type ModelCall = BoxFuture<'static, Result<InsightPayload, UpstreamError>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RequestKey {
    capability: Capability,
    scope: String,
}

struct Pending {
    generation: u64,
    future: PendingInsight,
}

struct Slot {
    request: RequestKey,
    state: InsightState,
}

#[derive(Default)]
struct Inner {
    generation: u64,
    context: Option<Arc<SearchContext>>,
    pending: HashMap<RequestKey, Pending>,
    slots: HashMap<Capability, Slot>,
}

pub struct InsightOrchestrator {
    model: Arc<dyn InsightModel>,
    timeout: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl InsightOrchestrator {
    pub fn new(model: Arc<dyn InsightModel>, timeout: Duration) -> Self {
        Self {
            model,
            timeout,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Install a new base search. Pending requests for the previous one become stale.
    pub async fn set_context(&self, query: SearchQuery, result: SearchResult) -> Arc<SearchContext> {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        let context = Arc::new(SearchContext::new(inner.generation, query, result));
        inner.context = Some(context.clone());
        inner.pending.clear();
        inner.slots.clear();
        info!("Insight context {} set (generation {})", context.key(), context.generation);
        context
    }

    /// Drop the current context, e.g. when a new base search starts.
    pub async fn clear_context(&self) {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        inner.context = None;
        inner.pending.clear();
        inner.slots.clear();
    }

    pub async fn context(&self) -> Option<Arc<SearchContext>> {
        self.inner.lock().await.context.clone()
    }

    pub async fn state(&self, capability: Capability) -> InsightState {
        self.inner
            .lock()
            .await
            .slots
            .get(&capability)
            .map(|slot| slot.state.clone())
            .unwrap_or(InsightState::Idle)
    }

    pub async fn states(&self) -> Vec<(Capability, InsightState)> {
        let inner = self.inner.lock().await;
        Capability::ALL
            .into_iter()
            .map(|c| {
                let state = inner.slots.get(&c).map(|s| s.state.clone()).unwrap_or(InsightState::Idle);
                (c, state)
            })
            .collect()
    }

    pub async fn destination_insights(&self, code: &str) -> Result<DestinationInsights, InsightError> {
        let code = validate_airport_code(code).map_err(InsightError::InvalidDestination)?;
        let scope = code.to_string();
        let model = self.model.clone();

        let payload = self
            .request(Capability::DestinationInsights, move |_| scope, move |_| {
                async move {
                    model
                        .destination_insights(&code)
                        .await
                        .map(InsightPayload::DestinationInsights)
                }
                .boxed()
            })
            .await?;

        match payload {
            InsightPayload::DestinationInsights(insights) => Ok(insights),
            other => Err(mismatched(Capability::DestinationInsights, &other)),
        }
    }

    pub async fn analyze_prices(&self) -> Result<PriceAnalysis, InsightError> {
        let model = self.model.clone();

        let payload = self
            .request(Capability::PriceAnalysis, SearchContext::key, move |context| {
                let body = context.to_insight_context();
                async move { model.analyze_prices(&body).await.map(InsightPayload::PriceAnalysis) }.boxed()
            })
            .await?;

        match payload {
            InsightPayload::PriceAnalysis(analysis) => Ok(analysis),
            other => Err(mismatched(Capability::PriceAnalysis, &other)),
        }
    }

    pub async fn recommendations(&self) -> Result<TravelRecommendations, InsightError> {
        let model = self.model.clone();

        let payload = self
            .request(Capability::Recommendations, SearchContext::key, move |context| {
                let body = context.to_insight_context();
                async move { model.recommendations(&body).await.map(InsightPayload::Recommendations) }.boxed()
            })
            .await?;

        match payload {
            InsightPayload::Recommendations(recs) => Ok(recs),
            other => Err(mismatched(Capability::Recommendations, &other)),
        }
    }

    /// `scope` and `call` both see the context current under the lock, so the
    /// dedup key always matches the context the call runs against.
    async fn request<S, F>(&self, capability: Capability, scope: S, call: F) -> Result<InsightPayload, InsightError>
    where
        S: FnOnce(&SearchContext) -> String,
        F: FnOnce(&SearchContext) -> ModelCall,
    {
        let (generation, pending) = {
            let mut inner = self.inner.lock().await;
            let context = inner.context.clone().ok_or(InsightError::NoActiveSearch)?;
            let generation = inner.generation;
            let key = RequestKey {
                capability,
                scope: scope(context.as_ref()),
            };

            let joined = inner
                .pending
                .get(&key)
                .filter(|p| p.generation == generation)
                .map(|p| p.future.clone());

            let future = match joined {
                Some(future) => {
                    debug!("Joining pending {} request for {}", capability, key.scope);
                    future
                }
                None => {
                    let future = self.spawn_call(key.clone(), generation, call(context.as_ref()));
                    inner.pending.insert(
                        key.clone(),
                        Pending {
                            generation,
                            future: future.clone(),
                        },
                    );
                    future
                }
            };

            inner.slots.insert(
                capability,
                Slot {
                    request: key,
                    state: InsightState::Loading,
                },
            );
            (generation, future)
        };

        let outcome = pending.await;

        if self.inner.lock().await.generation != generation {
            return Err(InsightError::Stale(capability));
        }
        outcome
    }

    /// Run the model call on its own task so it settles (and updates state)
    /// even if every caller stops waiting.
    fn spawn_call(&self, key: RequestKey, generation: u64, call: ModelCall) -> PendingInsight {
        let inner = self.inner.clone();
        let timeout = self.timeout;
        let capability = key.capability;

        let handle = tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, call).await {
                Ok(Ok(payload)) => Ok(payload),
                Ok(Err(cause)) => Err(InsightError::Unavailable { capability, cause }),
                Err(_) => Err(InsightError::Unavailable {
                    capability,
                    cause: NetworkError::Timeout(timeout).into(),
                }),
            };
            settle(&inner, &key, generation, &outcome).await;
            outcome
        });

        async move {
            handle.await.unwrap_or_else(|e| {
                Err(InsightError::Unavailable {
                    capability,
                    cause: NetworkError::ConnectionFailed(format!("insight task aborted: {}", e)).into(),
                })
            })
        }
        .boxed()
        .shared()
    }
}

async fn settle(
    inner: &Mutex<Inner>,
    key: &RequestKey,
    generation: u64,
    outcome: &Result<InsightPayload, InsightError>,
) {
    let mut inner = inner.lock().await;

    let label = if inner.generation != generation {
        "stale"
    } else if outcome.is_ok() {
        "ready"
    } else {
        "failed"
    };

    let event = InsightSettledEvent {
        context_id: inner.context.as_ref().map(|c| c.id).unwrap_or_default(),
        capability: key.capability,
        request_key: key.scope.clone(),
        outcome: label.to_string(),
        timestamp: chrono::Utc::now().timestamp(),
    };
    let event_json = serde_json::to_string(&event).unwrap_or_default();

    if label == "stale" {
        info!("Discarding stale insight result: {}", event_json);
        return;
    }

    inner.pending.remove(key);
    if let Some(slot) = inner.slots.get_mut(&key.capability) {
        // Only the latest request for a capability owns its visible state
        if slot.request == *key {
            slot.state = match outcome {
                Ok(payload) => InsightState::Ready { payload: payload.clone() },
                Err(e) => InsightState::Failed { message: e.to_string() },
            };
        }
    }

    match outcome {
        Ok(_) => info!("Insight settled: {}", event_json),
        Err(e) => warn!("Insight failed ({}): {}", failure_cause(e), event_json),
    }
}

fn failure_cause(err: &InsightError) -> String {
    match err {
        InsightError::Unavailable { cause, .. } => cause.to_string(),
        other => other.to_string(),
    }
}

fn mismatched(capability: Capability, payload: &InsightPayload) -> InsightError {
    InsightError::Unavailable {
        capability,
        cause: ResponseError::MalformedResponse(format!("unexpected {} payload", payload.capability())).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use skyfare_shared::{AirportCode, Currency, InsightContext, OfferTags, Passengers, QuoteOffer};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockModel {
        delay: Duration,
        destination_calls: AtomicUsize,
        price_calls: AtomicUsize,
        priced_routes: std::sync::Mutex<Vec<String>>,
        fail_prices: bool,
    }

    impl MockModel {
        fn new(delay_ms: u64) -> Self {
            Self {
                delay: Duration::from_millis(delay_ms),
                destination_calls: AtomicUsize::new(0),
                price_calls: AtomicUsize::new(0),
                priced_routes: std::sync::Mutex::new(Vec::new()),
                fail_prices: false,
            }
        }
    }

    #[async_trait]
    impl InsightModel for MockModel {
        async fn destination_insights(&self, destination: &AirportCode) -> Result<DestinationInsights, UpstreamError> {
            self.destination_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(DestinationInsights {
                best_time_to_visit: format!("Spring in {}", destination),
                attractions: vec!["Santa Monica Pier".to_string()],
                travel_tips: vec!["Rent a car".to_string()],
                transportation: vec!["FlyAway bus".to_string()],
            })
        }

        async fn analyze_prices(&self, context: &InsightContext) -> Result<PriceAnalysis, UpstreamError> {
            self.price_calls.fetch_add(1, Ordering::SeqCst);
            self.priced_routes.lock().unwrap().push(context.destination.clone());
            tokio::time::sleep(self.delay).await;
            if self.fail_prices {
                return Err(ResponseError::ServerError(500).into());
            }
            Ok(PriceAnalysis {
                best_value_currency: context.lowest_currency.clone(),
                trend_analysis: "Stable".to_string(),
                booking_recommendation: "Book within a week".to_string(),
            })
        }

        async fn recommendations(&self, _context: &InsightContext) -> Result<TravelRecommendations, UpstreamError> {
            tokio::time::sleep(self.delay).await;
            Ok(TravelRecommendations {
                recommendations: vec!["Travel midweek".to_string()],
                insights: "Shoulder season".to_string(),
            })
        }
    }

    fn query(destination: &str) -> SearchQuery {
        SearchQuery {
            origin: AirportCode::parse("JFK").unwrap(),
            destination: AirportCode::parse(destination).unwrap(),
            departure_date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
            passengers: Passengers::new(1).unwrap(),
            preferred_currency: Currency::Usd,
        }
    }

    fn result() -> SearchResult {
        SearchResult {
            lowest_price: 450.0,
            lowest_currency: "EUR".to_string(),
            lowest_price_usd: 490.0,
            all_results: vec![QuoteOffer {
                currency: "EUR".to_string(),
                price: 450.0,
                price_usd: 490.0,
                parsed_offer: None,
                tags: OfferTags { preferred: false, best: true },
            }],
        }
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_call() {
        let model = Arc::new(MockModel::new(100));
        let orchestrator = InsightOrchestrator::new(model.clone(), Duration::from_secs(30));
        orchestrator.set_context(query("LAX"), result()).await;

        let (a, b) = tokio::join!(
            orchestrator.destination_insights("LAX"),
            orchestrator.destination_insights("lax")
        );

        assert_eq!(model.destination_calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), b.unwrap());
        assert!(matches!(
            orchestrator.state(Capability::DestinationInsights).await,
            InsightState::Ready { .. }
        ));

        // Settled: the next request is a fresh call
        orchestrator.destination_insights("LAX").await.unwrap();
        assert_eq!(model.destination_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_price_analysis_shares_one_call() {
        let model = Arc::new(MockModel::new(100));
        let orchestrator = InsightOrchestrator::new(model.clone(), Duration::from_secs(30));
        orchestrator.set_context(query("LAX"), result()).await;

        let (a, b) = tokio::join!(orchestrator.analyze_prices(), orchestrator.analyze_prices());

        assert_eq!(model.price_calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[tokio::test]
    async fn test_request_keyed_to_context_it_runs_against() {
        let model = Arc::new(MockModel::new(50));
        let orchestrator = Arc::new(InsightOrchestrator::new(model.clone(), Duration::from_secs(30)));
        orchestrator.set_context(query("LAX"), result()).await;

        // Queue the request and then a context switch behind a held lock, so
        // they are served strictly in that order once it is released
        let guard = orchestrator.inner.lock().await;
        let first = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.analyze_prices().await }
        });
        tokio::task::yield_now().await;
        let switch = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move {
                orchestrator.set_context(query("CDG"), result()).await;
            }
        });
        tokio::task::yield_now().await;
        drop(guard);

        switch.await.unwrap();
        assert_eq!(
            first.await.unwrap(),
            Err(InsightError::Stale(Capability::PriceAnalysis))
        );

        orchestrator.analyze_prices().await.unwrap();
        assert_eq!(
            *model.priced_routes.lock().unwrap(),
            vec!["LAX".to_string(), "CDG".to_string()]
        );
    }

    #[test]
    fn test_core_view_of_failures() {
        let err = InsightError::Unavailable {
            capability: Capability::Recommendations,
            cause: ResponseError::ServerError(502).into(),
        };
        assert_eq!(err.to_core(), Some(CoreError::AiUnavailable(Capability::Recommendations)));
        assert_eq!(err.to_core().unwrap().title(), "Unable to load travel tips");
        assert_eq!(InsightError::NoActiveSearch.to_core(), None);
    }

    #[tokio::test]
    async fn test_requires_active_search() {
        let orchestrator = InsightOrchestrator::new(Arc::new(MockModel::new(0)), Duration::from_secs(30));
        assert_eq!(orchestrator.analyze_prices().await, Err(InsightError::NoActiveSearch));
        assert_eq!(
            orchestrator.destination_insights("LAX").await,
            Err(InsightError::NoActiveSearch)
        );
    }

    #[tokio::test]
    async fn test_invalid_destination_rejected_before_call() {
        let model = Arc::new(MockModel::new(0));
        let orchestrator = InsightOrchestrator::new(model.clone(), Duration::from_secs(30));
        orchestrator.set_context(query("LAX"), result()).await;

        let err = orchestrator.destination_insights("L4X").await.unwrap_err();
        assert!(matches!(err, InsightError::InvalidDestination(_)));
        assert_eq!(model.destination_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_is_local_to_capability() {
        let mut model = MockModel::new(10);
        model.fail_prices = true;
        let orchestrator = InsightOrchestrator::new(Arc::new(model), Duration::from_secs(30));
        orchestrator.set_context(query("LAX"), result()).await;

        let (prices, recs) = tokio::join!(orchestrator.analyze_prices(), orchestrator.recommendations());

        let err = prices.unwrap_err();
        assert_eq!(err.to_string(), "AI analysis service temporarily unavailable");
        assert!(recs.is_ok());
        assert_eq!(
            orchestrator.state(Capability::PriceAnalysis).await,
            InsightState::Failed {
                message: "AI analysis service temporarily unavailable".to_string()
            }
        );
        assert!(matches!(
            orchestrator.state(Capability::Recommendations).await,
            InsightState::Ready { .. }
        ));
        assert_eq!(orchestrator.state(Capability::DestinationInsights).await, InsightState::Idle);
        // base search untouched
        assert_eq!(orchestrator.context().await.unwrap().result, result());
    }

    #[tokio::test]
    async fn test_context_change_discards_late_result() {
        let model = Arc::new(MockModel::new(200));
        let orchestrator = InsightOrchestrator::new(model.clone(), Duration::from_secs(30));
        orchestrator.set_context(query("LAX"), result()).await;

        let (old, _) = tokio::join!(orchestrator.analyze_prices(), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            orchestrator.set_context(query("CDG"), result()).await;
        });

        assert_eq!(old, Err(InsightError::Stale(Capability::PriceAnalysis)));
        assert_eq!(orchestrator.state(Capability::PriceAnalysis).await, InsightState::Idle);

        // The new context issues its own call rather than joining the stale one
        orchestrator.analyze_prices().await.unwrap();
        assert_eq!(model.price_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_outer_timeout_surfaces_failure() {
        let model = Arc::new(MockModel::new(60_000));
        let orchestrator = InsightOrchestrator::new(model, Duration::from_secs(30));
        orchestrator.set_context(query("LAX"), result()).await;

        match orchestrator.recommendations().await {
            Err(InsightError::Unavailable { capability, cause }) => {
                assert_eq!(capability, Capability::Recommendations);
                assert!(cause.is_timeout());
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert_eq!(
            orchestrator.state(Capability::Recommendations).await,
            InsightState::Failed { message: "Unable to load travel tips".to_string() }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_response_within_bound_settles() {
        let model = Arc::new(MockModel::new(5_000));
        let orchestrator = InsightOrchestrator::new(model, Duration::from_secs(30));
        orchestrator.set_context(query("LAX"), result()).await;

        let analysis = orchestrator.analyze_prices().await.unwrap();
        assert_eq!(analysis.best_value_currency, "EUR");
    }

}
