//! Pure checks applied to every search before it reaches the network.
//!
//! All functions are total over their inputs: malformed strings always come back
//! as a typed `ValidationError`, never a panic.

use chrono::NaiveDate;
use skyfare_shared::{AirportCode, Currency, Passengers, SearchDraft, SearchQuery};

use crate::{Field, ValidationError};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn validate_airport_code(input: &str) -> Result<AirportCode, ValidationError> {
    AirportCode::parse(input).ok_or_else(|| ValidationError::InvalidAirportCode(vec![input.to_string()]))
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Reports every missing field at once so the caller can render one message.
pub fn validate_required_fields(draft: &SearchDraft) -> Result<(), ValidationError> {
    let mut missing = Vec::new();
    if is_blank(&draft.origin) {
        missing.push(Field::Origin);
    }
    if is_blank(&draft.destination) {
        missing.push(Field::Destination);
    }
    if is_blank(&draft.departure_date) {
        missing.push(Field::DepartureDate);
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingField(missing))
    }
}

/// Parses `YYYY-MM-DD`; dates strictly before `today` are rejected.
pub fn validate_date(input: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let date = NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(format!("'{}' is not a YYYY-MM-DD date", input)))?;

    if date < today {
        return Err(ValidationError::InvalidDate(format!(
            "{} is in the past",
            date.format(DATE_FORMAT)
        )));
    }
    Ok(date)
}

/// Absent means the form default of one passenger.
pub fn validate_passengers(count: Option<i64>) -> Result<Passengers, ValidationError> {
    match count {
        None => Ok(Passengers::default()),
        Some(n) => Passengers::new(n).ok_or(ValidationError::InvalidPassengers(n)),
    }
}

/// Absent or blank means USD.
pub fn validate_currency(code: Option<&str>) -> Result<Currency, ValidationError> {
    match code.map(str::trim).filter(|c| !c.is_empty()) {
        None => Ok(Currency::Usd),
        Some(c) => Currency::from_code(c).ok_or_else(|| ValidationError::UnsupportedCurrency(c.to_string())),
    }
}

/// Full validation of a form draft, in order: presence, airport codes, date,
/// passengers, currency.
pub fn validate_draft(draft: &SearchDraft, today: NaiveDate) -> Result<SearchQuery, ValidationError> {
    validate_required_fields(draft)?;

    let origin_raw = draft.origin.as_deref().unwrap_or_default();
    let destination_raw = draft.destination.as_deref().unwrap_or_default();
    let origin = AirportCode::parse(origin_raw);
    let destination = AirportCode::parse(destination_raw);

    let (origin, destination) = match (origin, destination) {
        (Some(o), Some(d)) => (o, d),
        (o, d) => {
            let mut invalid = Vec::new();
            if o.is_none() {
                invalid.push(origin_raw.to_string());
            }
            if d.is_none() {
                invalid.push(destination_raw.to_string());
            }
            return Err(ValidationError::InvalidAirportCode(invalid));
        }
    };

    let departure_date = validate_date(draft.departure_date.as_deref().unwrap_or_default(), today)?;
    let passengers = validate_passengers(draft.passengers)?;
    let preferred_currency = validate_currency(draft.preferred_currency.as_deref())?;

    Ok(SearchQuery {
        origin,
        destination,
        departure_date,
        passengers,
        preferred_currency,
    })
}
