use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::de::{self, Deserializer, Error as _, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Statistics;

pub const DELETED_MESSAGE: &str = "All transactions were successfully deleted";

/// Body of `POST /transactions`.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CreateTransaction {
    #[serde(deserialize_with = "deserialize_non_negative_amount")]
    pub amount: Decimal,
    #[serde(deserialize_with = "deserialize_iso8601")]
    pub timestamp: DateTime<Utc>,
}

fn deserialize_non_negative_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let amount = deserializer.deserialize_any(AmountVisitor)?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(D::Error::custom("amount cannot be negative"));
    }
    Ok(amount)
}

/// Accepts JSON numbers only. Strings such as `"12.5"` fall through to serde's
/// `invalid_type` error.
struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Decimal;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a number")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Decimal, E> {
        Ok(Decimal::from(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Decimal, E> {
        Ok(Decimal::from(value))
    }

    /// Goes through the shortest round-trip text of the float, so `123.45`
    /// becomes exactly `123.45`.
    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Decimal, E> {
        Decimal::from_str(&value.to_string())
            .map_err(|_| E::custom(format!("amount {value} is out of range")))
    }
}

/// ISO 8601 date or date-time. Without an offset the value is read as UTC;
/// a bare date means midnight UTC.
fn deserialize_iso8601<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_iso8601(&raw)
        .ok_or_else(|| D::Error::custom(format!("timestamp {raw:?} is not a valid ISO 8601 date")))
}

fn parse_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Body of `GET /statistics`.
#[derive(Debug, Serialize, PartialEq)]
pub struct StatisticsRow {
    pub count: u64,
    pub sum: f64,
    #[serde(with = "rust_decimal::serde::float")]
    pub avg: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub min: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub max: Decimal,
}

impl From<Statistics> for StatisticsRow {
    fn from(statistics: Statistics) -> Self {
        Self {
            count: statistics.count,
            sum: statistics.sum.to_f64(),
            avg: statistics.avg,
            min: statistics.min,
            max: statistics.max,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Error body shared by every failing endpoint.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: String,
    pub error: String,
}
