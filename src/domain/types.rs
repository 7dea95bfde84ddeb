//! Shared types for the weather station client

use serde::Serialize;

/// One sensor reading: time of measurement, temperature, humidity.
///
/// Immutable value with structural equality. Created only by the series
/// parser; replaced wholesale with the rest of its batch on each refresh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    /// Milliseconds since the Unix epoch, UTC
    pub timestamp_ms: i64,
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity, percent
    pub humidity: f64,
}

/// Ordered sequence of measurements from one fetch cycle.
///
/// Ordering is ascending timestamp as delivered by the station; the client
/// does not re-sort. Every element carries a non-negative timestamp and
/// finite values (the parser rejects batches that would violate this).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeasurementBatch {
    measurements: Vec<Measurement>,
}

impl MeasurementBatch {
    pub fn new(measurements: Vec<Measurement>) -> Self {
        Self { measurements }
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Most recent reading, for headline display
    pub fn latest(&self) -> Option<&Measurement> {
        self.measurements.last()
    }

    pub fn first(&self) -> Option<&Measurement> {
        self.measurements.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Measurement> {
        self.measurements.iter()
    }

    pub fn as_slice(&self) -> &[Measurement] {
        &self.measurements
    }

    /// (timestamp_ms, temperature) pairs for feeding a time-series chart
    pub fn temperature_points(&self) -> Vec<(f64, f64)> {
        self.measurements.iter().map(|m| (m.timestamp_ms as f64, m.temperature)).collect()
    }
}

impl<'a> IntoIterator for &'a MeasurementBatch {
    type Item = &'a Measurement;
    type IntoIter = std::slice::Iter<'a, Measurement>;

    fn into_iter(self) -> Self::IntoIter {
        self.measurements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(ts: i64, temp: f64) -> Measurement {
        Measurement { timestamp_ms: ts, temperature: temp, humidity: 50.0 }
    }

    #[test]
    fn test_latest_is_last_in_source_order() {
        let batch = MeasurementBatch::new(vec![reading(1000, 20.0), reading(2000, 21.5)]);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.latest().unwrap().timestamp_ms, 2000);
        assert_eq!(batch.first().unwrap().timestamp_ms, 1000);
    }

    #[test]
    fn test_empty_batch() {
        let batch = MeasurementBatch::default();
        assert!(batch.is_empty());
        assert_eq!(batch.latest(), None);
        assert!(batch.temperature_points().is_empty());
    }

    #[test]
    fn test_temperature_points_preserve_order() {
        let batch = MeasurementBatch::new(vec![
            reading(1000, 20.0),
            reading(2000, 21.5),
            reading(3000, 19.0),
        ]);
        let points = batch.temperature_points();
        assert_eq!(points, vec![(1000.0, 20.0), (2000.0, 21.5), (3000.0, 19.0)]);
    }
}
