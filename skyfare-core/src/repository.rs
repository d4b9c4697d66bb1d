use async_trait::async_trait;

/// Externally owned key/value slot holding the serialized search history
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn read(
        &self,
        key: &str,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>>;

    async fn write(
        &self,
        key: &str,
        payload: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
