//! Metric factory double that keeps every measurement.

use std::sync::Mutex;
use std::time::Duration;

use crate::metrics::MetricFactory;

#[derive(Debug, Default)]
pub struct RecordingMetricFactory {
    measurements: Mutex<Vec<(&'static str, Duration)>>,
}

impl RecordingMetricFactory {
    /// Timer names in recording order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.measurements
            .lock()
            .expect("metric factory mutex poisoned")
            .iter()
            .map(|(name, _)| *name)
            .collect()
    }
}

impl MetricFactory for RecordingMetricFactory {
    fn record_duration(&self, name: &'static str, elapsed: Duration) {
        self.measurements
            .lock()
            .expect("metric factory mutex poisoned")
            .push((name, elapsed));
    }
}
