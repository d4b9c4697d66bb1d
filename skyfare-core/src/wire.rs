//! Boundary decoding. Every collaborator response is turned into one of a closed
//! set of outcomes before anything in the core looks at it.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{ResponseError, UpstreamError};

#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Success(T),
    Malformed(String),
    ServerError(u16),
}

impl<T> Decoded<T> {
    pub fn into_result(self) -> Result<T, UpstreamError> {
        match self {
            Decoded::Success(value) => Ok(value),
            Decoded::Malformed(reason) => Err(ResponseError::MalformedResponse(reason).into()),
            Decoded::ServerError(status) => Err(ResponseError::ServerError(status).into()),
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Decoded<U>) -> Decoded<U> {
        match self {
            Decoded::Success(value) => f(value),
            Decoded::Malformed(reason) => Decoded::Malformed(reason),
            Decoded::ServerError(status) => Decoded::ServerError(status),
        }
    }
}

/// Decode a body as untyped JSON; shape checks are left to the consumer.
pub fn decode_json(status: u16, body: &[u8]) -> Decoded<Value> {
    if !(200..300).contains(&status) {
        return Decoded::ServerError(status);
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => Decoded::Success(value),
        Err(e) => Decoded::Malformed(format!("body is not JSON: {}", e)),
    }
}

/// Decode a body straight into a typed payload.
pub fn decode<T: DeserializeOwned>(status: u16, body: &[u8]) -> Decoded<T> {
    decode_json(status, body).and_then(|value| match serde_json::from_value::<T>(value) {
        Ok(typed) => Decoded::Success(typed),
        Err(e) => Decoded::Malformed(e.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyfare_shared::models::insight::PriceAnalysis;

    #[test]
    fn test_non_success_status_is_server_error() {
        let decoded: Decoded<PriceAnalysis> = decode(500, br#"{"detail":"AI service error"}"#);
        assert_eq!(decoded, Decoded::ServerError(500));
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let decoded: Decoded<PriceAnalysis> = decode(200, br#"{"best_value_currency":"EUR"}"#);
        assert!(matches!(decoded, Decoded::Malformed(_)));
        assert!(matches!(
            decoded.into_result(),
            Err(UpstreamError::Response(ResponseError::MalformedResponse(_)))
        ));
    }

    #[test]
    fn test_typed_success() {
        let body = br#"{"best_value_currency":"EUR","trend_analysis":"stable","booking_recommendation":"book now"}"#;
        let decoded: Decoded<PriceAnalysis> = decode(200, body);
        match decoded {
            Decoded::Success(analysis) => assert_eq!(analysis.best_value_currency, "EUR"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
