//! Request timing.
//!
//! Handlers time their body through an injected [`MetricFactory`]. The
//! default factory writes each measurement as a debug event; tests swap in a
//! recording factory.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Tracing target for timing measurements.
pub(crate) const METRICS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::metrics");

/// Timer name used for JMAP request handling.
pub const JMAP_REQUEST_TIMER: &str = "JMAP-request";

/// Sink for named duration measurements.
pub trait MetricFactory: Send + Sync {
    /// Records that `name` took `elapsed`.
    fn record_duration(&self, name: &'static str, elapsed: Duration);
}

/// Guard measuring the time between [`Timer::start`] and stop or drop.
pub struct Timer<'a> {
    factory: &'a dyn MetricFactory,
    name: &'static str,
    started: Instant,
    recorded: bool,
}

impl<'a> Timer<'a> {
    /// Starts timing `name`.
    #[must_use]
    pub fn start(factory: &'a dyn MetricFactory, name: &'static str) -> Self {
        Self {
            factory,
            name,
            started: Instant::now(),
            recorded: false,
        }
    }

    /// Stops the timer, records the measurement and returns it.
    pub fn stop(mut self) -> Duration {
        self.record()
    }

    fn record(&mut self) -> Duration {
        let elapsed = self.started.elapsed();
        if !self.recorded {
            self.recorded = true;
            self.factory.record_duration(self.name, elapsed);
        }
        elapsed
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        self.record();
    }
}

impl fmt::Debug for Timer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("name", &self.name)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

/// Writes measurements as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetricFactory;

impl MetricFactory for TracingMetricFactory {
    fn record_duration(&self, name: &'static str, elapsed: Duration) {
        debug!(
            target: METRICS_TARGET,
            metric = name,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "duration recorded"
        );
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tracing_test::traced_test;

    use super::*;
    use crate::tests::support::RecordingMetricFactory;

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn stop_records_elapsed_time() {
        let factory = RecordingMetricFactory::default();
        let timer = Timer::start(&factory, "work");
        tokio::time::advance(Duration::from_millis(40)).await;
        let elapsed = timer.stop();

        assert!(elapsed >= Duration::from_millis(40));
        assert_eq!(factory.names(), vec!["work"]);
    }

    #[rstest]
    fn drop_records_once() {
        let factory = RecordingMetricFactory::default();
        {
            let _timer = Timer::start(&factory, "dropped");
        }
        assert_eq!(factory.names(), vec!["dropped"]);
    }

    #[rstest]
    #[traced_test]
    fn tracing_factory_logs_measurement() {
        TracingMetricFactory.record_duration(JMAP_REQUEST_TIMER, Duration::from_millis(3));
        assert!(logs_contain("duration recorded"));
        assert!(logs_contain("JMAP-request"));
    }
}
