//! reqwest-backed clients for the quote source, interpreter and insight model.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use skyfare_core::interpreter::ParsedQuery;
use skyfare_core::search::QuoteRequest;
use skyfare_core::supplier::{InsightModel, QueryInterpreter, QuoteSource};
use skyfare_core::wire::{decode, decode_json};
use skyfare_core::{NetworkError, UpstreamError};
use skyfare_shared::models::insight::{DestinationInsights, PriceAnalysis, TravelRecommendations};
use skyfare_shared::{AirportCode, InsightContext};
use std::time::Duration;
use tracing::debug;

use crate::app_config::UpstreamConfig;

#[derive(Clone)]
pub struct HttpCollaborators {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpCollaborators {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(8)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.as_ref().map(|k| k.expose().clone()),
            timeout: config.request_timeout(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn classify(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            NetworkError::Timeout(self.timeout).into()
        } else {
            NetworkError::ConnectionFailed(err.to_string()).into()
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(u16, Vec<u8>), UpstreamError> {
        let request = match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        };
        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        debug!("Upstream responded {} ({} bytes)", status, body.len());
        Ok((status, body.to_vec()))
    }

    async fn get_typed<T: DeserializeOwned>(&self, path: &str) -> Result<T, UpstreamError> {
        debug!("HTTP GET: {}", path);
        let (status, body) = self.send(self.http.get(self.url(path))).await?;
        decode(status, &body).into_result()
    }

    async fn post_typed<T: DeserializeOwned>(&self, path: &str, payload: &Value) -> Result<T, UpstreamError> {
        debug!("HTTP POST: {}", path);
        let (status, body) = self.send(self.http.post(self.url(path)).json(payload)).await?;
        decode(status, &body).into_result()
    }
}

#[async_trait]
impl QuoteSource for HttpCollaborators {
    async fn fetch_quotes(&self, request: &QuoteRequest) -> Result<Value, UpstreamError> {
        debug!("HTTP GET: /api/flights/search {}->{}", request.origin, request.destination);
        let builder = self.http.get(self.url("/api/flights/search")).query(request);
        let (status, body) = self.send(builder).await?;
        decode_json(status, &body).into_result()
    }
}

#[async_trait]
impl QueryInterpreter for HttpCollaborators {
    async fn parse_query(&self, text: &str) -> Result<ParsedQuery, UpstreamError> {
        debug!("HTTP POST: /api/ai/parse-query");
        let builder = self
            .http
            .post(self.url("/api/ai/parse-query"))
            .json(&json!({ "query": text }));
        let (status, body) = self.send(builder).await?;
        decode_json(status, &body).and_then(ParsedQuery::from_value).into_result()
    }
}

#[async_trait]
impl InsightModel for HttpCollaborators {
    async fn destination_insights(
        &self,
        destination: &AirportCode,
    ) -> Result<DestinationInsights, UpstreamError> {
        self.get_typed(&format!("/api/ai/destination-insights/{}", destination)).await
    }

    async fn analyze_prices(
        &self,
        context: &InsightContext,
    ) -> Result<PriceAnalysis, UpstreamError> {
        let payload = serde_json::to_value(context).unwrap_or_default();
        self.post_typed("/api/ai/analyze-prices", &payload).await
    }

    async fn recommendations(
        &self,
        context: &InsightContext,
    ) -> Result<TravelRecommendations, UpstreamError> {
        let payload = serde_json::to_value(context).unwrap_or_default();
        self.post_typed("/api/ai/recommendations", &payload).await
    }
}
