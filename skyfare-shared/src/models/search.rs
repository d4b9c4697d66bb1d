use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Three-letter IATA airport code, always stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AirportCode(String);

impl AirportCode {
    /// Normalize and check a raw code. Whitespace around the code is ignored,
    /// anything else that is not an ASCII letter rejects the input.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.chars().count() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        Some(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AirportCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid airport code: {}", value))
    }
}

impl From<AirportCode> for String {
    fn from(code: AirportCode) -> Self {
        code.0
    }
}

impl fmt::Display for AirportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Currencies the quote source compares across
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Cad,
    Aud,
}

impl Currency {
    pub const ALL: [Currency; 5] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Cad,
        Currency::Aud,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| format!("unsupported currency: {}", s))
    }
}

/// Passenger count, bounded to the values the search form offers (1-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Passengers(u8);

impl Passengers {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    pub fn new(count: i64) -> Option<Self> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&count) {
            Some(Self(count as u8))
        } else {
            None
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl Default for Passengers {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<u8> for Passengers {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value as i64).ok_or_else(|| format!("passenger count out of range: {}", value))
    }
}

impl From<Passengers> for u8 {
    fn from(p: Passengers) -> Self {
        p.0
    }
}

/// A validated flight search. Built by the validator, never mutated after dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub origin: AirportCode,
    pub destination: AirportCode,
    pub departure_date: NaiveDate,
    pub passengers: Passengers,
    pub preferred_currency: Currency,
}

impl SearchQuery {
    /// Composite key used by the search history: `ORIGIN-DEST-YYYY-MM-DD`
    pub fn history_key(&self) -> String {
        format!(
            "{}-{}-{}",
            self.origin,
            self.destination,
            self.departure_date.format("%Y-%m-%d")
        )
    }
}

/// Raw, unvalidated form input as submitted by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchDraft {
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub departure_date: Option<String>,
    #[serde(default)]
    pub passengers: Option<i64>,
    #[serde(default)]
    pub preferred_currency: Option<String>,
}

impl From<&SearchQuery> for SearchDraft {
    fn from(query: &SearchQuery) -> Self {
        Self {
            origin: Some(query.origin.to_string()),
            destination: Some(query.destination.to_string()),
            departure_date: Some(query.departure_date.format("%Y-%m-%d").to_string()),
            passengers: Some(query.passengers.get() as i64),
            preferred_currency: Some(query.preferred_currency.to_string()),
        }
    }
}
