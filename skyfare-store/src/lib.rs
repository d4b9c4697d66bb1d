pub mod app_config;
pub mod history;
pub mod http;
pub mod memory_repo;
pub mod redis_repo;

pub use app_config::Config;
pub use history::{HistoryStore, LoadOutcome, SearchHistory};
pub use http::HttpCollaborators;
pub use memory_repo::MemoryRepository;
pub use redis_repo::RedisClient;
