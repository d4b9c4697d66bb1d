use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct SearchCompletedEvent {
    pub context_id: Uuid,
    pub history_key: String,
    pub lowest_currency: String,
    pub lowest_price_usd: f64,
    pub offer_count: usize,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct InsightSettledEvent {
    pub context_id: Uuid,
    pub capability: super::insight::Capability,
    pub request_key: String,
    pub outcome: String, // "ready" | "failed" | "stale"
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct HistoryResetEvent {
    pub storage_key: String,
    pub reason: String,
    pub timestamp: i64,
}
