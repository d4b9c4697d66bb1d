use serde::Deserialize;
use skyfare_shared::Masked;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    pub redis: Option<RedisConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

fn default_port() -> u16 { 8080 }

/// Where the quote source, interpreter and insight model live
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Outer bound for every collaborator call. Slow upstreams take several
    /// seconds, so keep this well above typical latency.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default)]
    pub api_key: Option<Masked<String>>,
}

impl UpstreamConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            api_key: None,
        }
    }
}

fn default_base_url() -> String { "http://localhost:8000".to_string() }
fn default_timeout_secs() -> u64 { 30 }
fn default_connect_timeout_secs() -> u64 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    /// Storage slot the serialized history lives under
    #[serde(default = "default_history_key")]
    pub key: String,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            key: default_history_key(),
            capacity: default_capacity(),
        }
    }
}

fn default_history_key() -> String { "flightSearchHistory".to_string() }
fn default_capacity() -> usize { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Every section has defaults, so even the base file is optional
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `SKYFARE_UPSTREAM__BASE_URL=http://quotes:8000`
            .add_source(config::Environment::with_prefix("SKYFARE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.upstream.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.history.key, "flightSearchHistory");
        assert_eq!(config.history.capacity, 5);
        assert!(config.redis.is_none());
    }

    #[test]
    fn test_partial_source_fills_defaults() {
        let s = config::Config::builder()
            .set_override("upstream.base_url", "http://quotes.internal")
            .unwrap()
            .set_override("upstream.api_key", "secret-key")
            .unwrap()
            .build()
            .unwrap();
        let config: Config = s.try_deserialize().unwrap();

        assert_eq!(config.upstream.base_url, "http://quotes.internal");
        assert_eq!(config.upstream.request_timeout_secs, 30);
        assert_eq!(config.server.port, 8080);
        let key = config.upstream.api_key.expect("api key");
        assert_eq!(key.expose(), "secret-key");
        assert_eq!(format!("{:?}", key), "********");
    }
}
