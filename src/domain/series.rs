//! Series payload parsing and normalization
//!
//! The station endpoint returns one JSON object with three positionally
//! correlated arrays of equal length:
//!
//! ```json
//! {"dateandtime":[1000,2000],"temperature":[20.5,21.0],"humidity":[50.0,51.2]}
//! ```
//!
//! `dateandtime` holds integer Unix seconds; element i of each array
//! describes the same reading. A batch is accepted whole or rejected whole;
//! there is no partial extraction.

use crate::domain::types::{Measurement, MeasurementBatch};
use serde::Deserialize;

/// Typed failure for a parse attempt. Terminal for the refresh cycle,
/// never retried, never a panic.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Response body was empty or blank
    EmptyResponse,
    /// Top-level decode failure, missing or non-array key, unequal array
    /// lengths, or a value that violates the batch invariant
    MalformedPayload(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::EmptyResponse => write!(f, "empty response body"),
            ParseError::MalformedPayload(cause) => write!(f, "malformed payload: {}", cause),
        }
    }
}

impl std::error::Error for ParseError {}

/// Wire shape of the station response. Key names are the server contract.
#[derive(Debug, Deserialize)]
struct SeriesPayload {
    dateandtime: Vec<i64>,
    temperature: Vec<f64>,
    humidity: Vec<f64>,
}

/// Decode a raw response body into an ordered measurement batch.
///
/// Timestamps are converted from seconds to milliseconds; source order is
/// preserved. No sorting, dedup, or outlier filtering. An empty (but
/// well-formed) series yields `Ok` with an empty batch, which callers treat
/// as "nothing to display" rather than as a parse error.
pub fn parse_series(raw: &str) -> Result<MeasurementBatch, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::EmptyResponse);
    }

    let payload: SeriesPayload =
        serde_json::from_str(raw).map_err(|e| ParseError::MalformedPayload(e.to_string()))?;

    let n = payload.dateandtime.len();
    if payload.temperature.len() != n || payload.humidity.len() != n {
        // Unequal lengths are rejected outright rather than truncated:
        // silent truncation would hide data-quality problems at the source.
        return Err(ParseError::MalformedPayload(format!(
            "array length mismatch: dateandtime={}, temperature={}, humidity={}",
            n,
            payload.temperature.len(),
            payload.humidity.len()
        )));
    }

    let mut measurements = Vec::with_capacity(n);
    for i in 0..n {
        let seconds = payload.dateandtime[i];
        let temperature = payload.temperature[i];
        let humidity = payload.humidity[i];

        if seconds < 0 {
            return Err(ParseError::MalformedPayload(format!(
                "negative timestamp {} at index {}",
                seconds, i
            )));
        }
        let timestamp_ms = seconds.checked_mul(1000).ok_or_else(|| {
            ParseError::MalformedPayload(format!("timestamp {} out of range at index {}", seconds, i))
        })?;
        if !temperature.is_finite() || !humidity.is_finite() {
            return Err(ParseError::MalformedPayload(format!(
                "non-finite value at index {}",
                i
            )));
        }

        measurements.push(Measurement { timestamp_ms, temperature, humidity });
    }

    Ok(MeasurementBatch::new(measurements))
}
