use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use serde_json::{json, Value};
use skyfare_api::{app, AppState};
use skyfare_core::interpreter::ParsedQuery;
use skyfare_core::search::QuoteRequest;
use skyfare_core::supplier::{InsightModel, QueryInterpreter, QuoteSource};
use skyfare_core::{ResponseError, UpstreamError};
use skyfare_offer::FareEngine;
use skyfare_shared::models::insight::{DestinationInsights, PriceAnalysis, TravelRecommendations};
use skyfare_shared::{AirportCode, InsightContext};
use skyfare_store::app_config::HistoryConfig;
use skyfare_store::{HistoryStore, MemoryRepository};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct StubUpstream {
    parse: ParsedQuery,
}

#[async_trait]
impl QuoteSource for StubUpstream {
    async fn fetch_quotes(&self, request: &QuoteRequest) -> Result<Value, UpstreamError> {
        if request.destination == "NRT" {
            return Ok(json!({ "all_results": [] }));
        }
        Ok(json!({
            "lowest_price": 450,
            "lowest_currency": "EUR",
            "all_results": [
                { "currency": "USD", "price": 500, "price_usd": 500 },
                { "currency": "EUR", "price": 450, "price_usd": 500 }
            ]
        }))
    }
}

#[async_trait]
impl QueryInterpreter for StubUpstream {
    async fn parse_query(&self, _text: &str) -> Result<ParsedQuery, UpstreamError> {
        Ok(self.parse.clone())
    }
}

#[async_trait]
impl InsightModel for StubUpstream {
    async fn destination_insights(&self, _destination: &AirportCode) -> Result<DestinationInsights, UpstreamError> {
        Err(ResponseError::ServerError(500).into())
    }

    async fn analyze_prices(&self, context: &InsightContext) -> Result<PriceAnalysis, UpstreamError> {
        Ok(PriceAnalysis {
            best_value_currency: context.lowest_currency.clone(),
            trend_analysis: "Stable".to_string(),
            booking_recommendation: "Book soon".to_string(),
        })
    }

    async fn recommendations(&self, _context: &InsightContext) -> Result<TravelRecommendations, UpstreamError> {
        Ok(TravelRecommendations {
            recommendations: vec!["Fly on Tuesday".to_string()],
            insights: "Summer demand is high".to_string(),
        })
    }
}

async fn test_app(parse: ParsedQuery) -> axum::Router {
    let upstream = Arc::new(StubUpstream { parse });
    let (history, _) = HistoryStore::init(Arc::new(MemoryRepository::new()), &HistoryConfig::default()).await;
    let engine = FareEngine::new(
        upstream.clone(),
        upstream.clone(),
        upstream,
        Arc::new(history),
        Duration::from_secs(30),
    )
    .with_today(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    app(AppState::new(engine))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let app = test_app(ParsedQuery::default()).await;
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_search_then_history_and_insights() {
    let app = test_app(ParsedQuery::default()).await;

    let (status, body) = send(
        &app,
        post_json(
            "/v1/search",
            json!({ "origin": "jfk", "destination": "lax", "departure_date": "2025-06-15", "passengers": 2 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lowest_currency"], "USD");
    assert_eq!(body["lowest_price"], 500.0);
    assert_eq!(body["all_results"].as_array().unwrap().len(), 2);

    let (status, body) = send(&app, get("/v1/history")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["key"], "JFK-LAX-2025-06-15");
    assert_eq!(body[0]["label"], "JFK → LAX");

    let (status, body) = send(&app, get("/v1/history/JFK-LAX-2025-06-15")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["passengers"], 2);

    let (status, body) = send(&app, post_json("/v1/insights/prices", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["best_value_currency"], "USD");

    // a failing capability does not affect the others
    let (status, body) = send(&app, get("/v1/insights/destination/LAX")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["title"], "AI service temporarily unavailable");

    let (_, body) = send(&app, get("/v1/insights/status")).await;
    assert_eq!(body[0]["capability"], "destination_insights");
    assert_eq!(body[0]["state"], "failed");
    assert_eq!(body[1]["state"], "ready");
    assert_eq!(body[2]["state"], "idle");
}

#[tokio::test]
async fn test_validation_errors_are_bad_requests() {
    let app = test_app(ParsedQuery::default()).await;

    let (status, body) = send(&app, post_json("/v1/search", json!({ "origin": "JFK" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], "Missing Information");
    assert_eq!(body["error"], "Missing required fields: destination, departure date");

    let (status, body) = send(
        &app,
        post_json(
            "/v1/search",
            json!({ "origin": "J1K", "destination": "L4X", "departure_date": "2025-06-15" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], "Invalid Airport Codes");
}

#[tokio::test]
async fn test_empty_results_are_not_found() {
    let app = test_app(ParsedQuery::default()).await;
    let (status, body) = send(
        &app,
        post_json(
            "/v1/search",
            json!({ "origin": "JFK", "destination": "NRT", "departure_date": "2025-06-15" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["title"], "No Flights Found");
}

#[tokio::test]
async fn test_insights_need_a_search() {
    let app = test_app(ParsedQuery::default()).await;
    let (status, body) = send(&app, post_json("/v1/insights/recommendations", json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["title"], "No Active Search");
}

#[tokio::test]
async fn test_ask_not_understood() {
    let app = test_app(ParsedQuery {
        parsed: false,
        message: Some("Natural language processing requires an API key".to_string()),
        ..Default::default()
    })
    .await;

    let (status, body) = send(&app, post_json("/v1/ask", json!({ "query": "somewhere warm" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["title"], "Could Not Understand");
    assert_eq!(body["error"], "Natural language processing requires an API key");
}

#[tokio::test]
async fn test_ask_runs_search() {
    let app = test_app(ParsedQuery {
        parsed: true,
        origin: Some("JFK".to_string()),
        destination: Some("LAX".to_string()),
        departure_date: Some("2025-06-15".to_string()),
        currency: Some("EUR".to_string()),
        confidence_score: Some(0.9),
        ..Default::default()
    })
    .await;

    let (status, body) = send(
        &app,
        post_json("/v1/ask", json!({ "query": "new york to los angeles june 15 in euros" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["confidence"], "high");
    assert_eq!(body["confidence_label"], "High confidence");
    assert_eq!(body["summary"], "Found: JFK to LAX");
    assert_eq!(body["result"]["lowest_currency"], "USD");
}

#[tokio::test]
async fn test_invalid_destination_code() {
    let app = test_app(ParsedQuery::default()).await;
    send(
        &app,
        post_json(
            "/v1/search",
            json!({ "origin": "JFK", "destination": "LAX", "departure_date": "2025-06-15" }),
        ),
    )
    .await;

    let (status, body) = send(&app, get("/v1/insights/destination/L4X")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], "Invalid Airport Codes");
}

#[tokio::test]
async fn test_unknown_history_key() {
    let app = test_app(ParsedQuery::default()).await;
    let (status, _) = send(&app, get("/v1/history/JFK-SFO-2025-06-15")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
