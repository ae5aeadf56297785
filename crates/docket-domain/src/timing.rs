//! Per-document stage timing

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wall-clock durations of one document's pipeline run, in seconds
///
/// Timing is document-level: every record of a document carries the same values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingMetrics {
    /// Time spent turning the file into text
    pub doc_extraction_seconds: f64,
    /// Time spent in the event provider
    pub event_extraction_seconds: f64,
    /// Time for the whole document
    pub total_seconds: f64,
}

impl TimingMetrics {
    /// Build metrics from measured stage durations
    pub fn from_durations(doc: Duration, event: Duration, total: Duration) -> Self {
        Self {
            doc_extraction_seconds: round_millis(doc.as_secs_f64()),
            event_extraction_seconds: round_millis(event.as_secs_f64()),
            total_seconds: round_millis(total.as_secs_f64()),
        }
    }
}

fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_durations_rounds_to_millis() {
        let timing = TimingMetrics::from_durations(
            Duration::from_micros(1_234_567),
            Duration::from_millis(2_500),
            Duration::from_micros(3_734_999),
        );
        assert_eq!(timing.doc_extraction_seconds, 1.235);
        assert_eq!(timing.event_extraction_seconds, 2.5);
        assert_eq!(timing.total_seconds, 3.735);
    }
}
