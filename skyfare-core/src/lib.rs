pub mod interpreter;
pub mod repository;
pub mod search;
pub mod supplier;
pub mod validator;
pub mod wire;

use skyfare_shared::Capability;
use std::fmt;
use std::time::Duration;

/// Form fields the validator checks for presence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Origin,
    Destination,
    DepartureDate,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Origin => "origin",
            Field::Destination => "destination",
            Field::DepartureDate => "departure date",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn join_labels<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required fields: {}", join_labels(.0))]
    MissingField(Vec<Field>),
    #[error("Invalid airport codes: {}", join_labels(.0))]
    InvalidAirportCode(Vec<String>),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Passenger count must be between 1 and 4, got {0}")]
    InvalidPassengers(i64),
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),
    #[error("Query is required")]
    EmptyQuery,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResponseError {
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Upstream returned status {0}")]
    ServerError(u16),
}

/// Failure of a call to any external collaborator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UpstreamError {
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Response(#[from] ResponseError),
}

impl UpstreamError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, UpstreamError::Network(NetworkError::Timeout(_)))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Response(#[from] ResponseError),
    #[error("No flight offers found")]
    NoOffersFound,
    #[error("{}", .0.failure_message())]
    AiUnavailable(Capability),
    #[error("Stored search history was corrupted: {0}")]
    StorageCorruption(String),
}

impl From<UpstreamError> for CoreError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Network(e) => CoreError::Network(e),
            UpstreamError::Response(e) => CoreError::Response(e),
        }
    }
}

impl CoreError {
    /// Single consolidated heading for the caller to render
    pub fn title(&self) -> &'static str {
        match self {
            CoreError::Validation(ValidationError::MissingField(_) | ValidationError::EmptyQuery) => {
                "Missing Information"
            }
            CoreError::Validation(ValidationError::InvalidAirportCode(_)) => "Invalid Airport Codes",
            CoreError::Validation(ValidationError::InvalidDate(_)) => "Invalid Date",
            CoreError::Validation(_) => "Invalid Search",
            CoreError::Network(_) => "Connection Error",
            CoreError::Response(_) => "Search Failed",
            CoreError::NoOffersFound => "No Flights Found",
            CoreError::AiUnavailable(capability) => capability.failure_message(),
            CoreError::StorageCorruption(_) => "Search History Reset",
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
