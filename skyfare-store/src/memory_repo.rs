use async_trait::async_trait;
use skyfare_core::repository::HistoryRepository;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local storage, used when no Redis is configured and in tests
#[derive(Default)]
pub struct MemoryRepository {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a slot with arbitrary content (including corrupt payloads)
    pub async fn seed(&self, key: &str, payload: &str) {
        self.slots.write().await.insert(key.to_string(), payload.to_string());
    }
}

#[async_trait]
impl HistoryRepository for MemoryRepository {
    async fn read(
        &self,
        key: &str,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.slots.read().await.get(key).cloned())
    }

    async fn write(
        &self,
        key: &str,
        payload: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.slots.write().await.insert(key.to_string(), payload.to_string());
        Ok(())
    }
}
