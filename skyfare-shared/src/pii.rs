use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wrapper for credentials (upstream API keys) that keeps them out of logs.
/// Debug, Display and Serialize all print a mask; use `expose` at the call site
/// that actually needs the value.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Masked<T>(T);

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("********")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_never_printed() {
        let key = Masked::new("gsk_live_123".to_string());
        assert_eq!(format!("{:?}", key), "********");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"********\"");
        assert_eq!(key.expose(), "gsk_live_123");
    }
}
