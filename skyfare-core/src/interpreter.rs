use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use skyfare_shared::{SearchDraft, SearchQuery};
use std::fmt;

use crate::validator::validate_draft;
use crate::wire::Decoded;
use crate::ValidationError;

/// Best-effort parse returned by the natural language interpreter.
///
/// `parsed == false` always carries `message`; `parsed == true` always carries
/// `confidence_score`. Responses breaking either rule are rejected at decode time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub parsed: bool,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub departure_date: Option<String>,
    pub passengers: Option<i64>,
    pub currency: Option<String>,
    pub confidence_score: Option<f64>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawParse {
    parsed: Option<bool>,
    #[serde(default)]
    origin: Option<String>,
    #[serde(default)]
    destination: Option<String>,
    #[serde(default)]
    departure_date: Option<String>,
    #[serde(default)]
    passengers: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    confidence_score: Option<f64>,
    #[serde(default)]
    message: Option<String>,
}

impl ParsedQuery {
    /// Decode the interpreter body. A missing `parsed` flag is read as a
    /// successful parse when a confidence score is present, since the model
    /// output is passed through without the flag on success.
    pub fn from_value(value: Value) -> Decoded<Self> {
        let raw: RawParse = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => return Decoded::Malformed(format!("unreadable parse response: {}", e)),
        };

        let parsed = raw.parsed.unwrap_or(raw.confidence_score.is_some());
        if !parsed && raw.message.is_none() {
            return Decoded::Malformed("parse failure without message".to_string());
        }
        if parsed {
            match raw.confidence_score {
                None => return Decoded::Malformed("parse success without confidence_score".to_string()),
                Some(s) if !(0.0..=1.0).contains(&s) => {
                    return Decoded::Malformed(format!("confidence_score {} outside [0, 1]", s))
                }
                Some(_) => {}
            }
        }

        Decoded::Success(Self {
            parsed,
            origin: raw.origin,
            destination: raw.destination,
            departure_date: raw.departure_date,
            passengers: raw.passengers,
            currency: raw.currency,
            confidence_score: raw.confidence_score,
            message: raw.message,
        })
    }

    /// The parse viewed as a form draft, ready for the validator
    pub fn to_draft(&self) -> SearchDraft {
        SearchDraft {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            departure_date: self.departure_date.clone(),
            passengers: self.passengers,
            preferred_currency: self.currency.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            ConfidenceTier::High
        } else if score > 0.6 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "High confidence",
            ConfidenceTier::Medium => "Medium confidence",
            ConfidenceTier::Low => "Low confidence",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterpretedOutcome {
    /// The interpreter could not understand the request; message is verbatim.
    Unparsed { message: String },
    /// Valid search, low trust. Still dispatched.
    ParsedLowConfidence { query: SearchQuery },
    /// Valid search with medium or high trust.
    ParsedActionable { query: SearchQuery, tier: ConfidenceTier },
    /// Understood, but the extracted fields fail domain validation.
    Invalid { tier: ConfidenceTier, draft: SearchDraft, error: ValidationError },
}

impl InterpretedOutcome {
    pub fn query(&self) -> Option<&SearchQuery> {
        match self {
            InterpretedOutcome::ParsedLowConfidence { query } => Some(query),
            InterpretedOutcome::ParsedActionable { query, .. } => Some(query),
            _ => None,
        }
    }

    pub fn tier(&self) -> Option<ConfidenceTier> {
        match self {
            InterpretedOutcome::Unparsed { .. } => None,
            InterpretedOutcome::ParsedLowConfidence { .. } => Some(ConfidenceTier::Low),
            InterpretedOutcome::ParsedActionable { tier, .. } => Some(*tier),
            InterpretedOutcome::Invalid { tier, .. } => Some(*tier),
        }
    }

    /// One-line recap shown next to the tier, e.g. `Found: JFK to CDG`
    pub fn summary(&self) -> Option<String> {
        match self {
            InterpretedOutcome::ParsedLowConfidence { query }
            | InterpretedOutcome::ParsedActionable { query, .. } => {
                Some(format!("Found: {} to {}", query.origin, query.destination))
            }
            InterpretedOutcome::Invalid { draft, .. } => Some(format!(
                "Found: {} to {}",
                draft.origin.as_deref().unwrap_or("?"),
                draft.destination.as_deref().unwrap_or("?")
            )),
            InterpretedOutcome::Unparsed { .. } => None,
        }
    }
}

/// Interpret a decoded parse: tier first, then domain validation.
/// Confidence never bypasses validation.
pub fn interpret(parse: &ParsedQuery, today: NaiveDate) -> InterpretedOutcome {
    if !parse.parsed {
        return InterpretedOutcome::Unparsed {
            message: parse.message.clone().unwrap_or_default(),
        };
    }

    let tier = ConfidenceTier::from_score(parse.confidence_score.unwrap_or(0.0));
    let draft = parse.to_draft();

    match validate_draft(&draft, today) {
        Ok(query) if tier == ConfidenceTier::Low => InterpretedOutcome::ParsedLowConfidence { query },
        Ok(query) => InterpretedOutcome::ParsedActionable { query, tier },
        Err(error) => {
            tracing::debug!("Interpreted query failed validation: {}", error);
            InterpretedOutcome::Invalid { tier, draft, error }
        }
    }
}
