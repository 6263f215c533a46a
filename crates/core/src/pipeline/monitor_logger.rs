use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for the monitoring loop.
///
/// The executor reports progress, stage timings and metrics here; the
/// implementation decides whether they reach the `log` facade or nowhere.
pub trait MonitorLogger: Send {
    /// Report tick-level progress. `total` is `None` for open-ended sources.
    fn progress(&mut self, ticks: usize, total: Option<usize>);

    /// Record how long a named stage took for one tick.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. subjects in view).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullMonitorLogger;

impl MonitorLogger for NullMonitorLogger {
    fn progress(&mut self, _ticks: usize, _total: Option<usize>) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Count, sum and peak of one stage timing or metric.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct RunningStat {
    count: usize,
    total: f64,
    max: f64,
}

impl RunningStat {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
        self.max = if self.count == 1 { value } else { self.max.max(value) };
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Logger backed by the `log` facade.
///
/// Progress lines are throttled to every `throttle_ticks` ticks. Stage
/// timings and metrics are folded into running stats as they arrive, so a
/// long live session holds a fixed amount of state.
pub struct LogMonitorLogger {
    throttle_ticks: usize,
    timings: BTreeMap<String, RunningStat>,
    metrics: BTreeMap<String, RunningStat>,
    start_time: Instant,
    ticks: usize,
}

impl LogMonitorLogger {
    pub fn new(throttle_ticks: usize) -> Self {
        Self {
            throttle_ticks: throttle_ticks.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time: Instant::now(),
            ticks: 0,
        }
    }

    /// Formatted end-of-run report, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Monitor summary ({} ticks, {elapsed:.1}s total):",
            self.ticks
        )];
        for (stage, stat) in &self.timings {
            lines.push(format!(
                "  {stage:12}: avg {:6.2}ms  max {:7.2}ms  total {:7.0}ms",
                stat.mean(),
                stat.max,
                stat.total
            ));
        }
        for (name, stat) in &self.metrics {
            lines.push(format!("  {name}: avg {:.1}, max {:.0}", stat.mean(), stat.max));
        }
        if self.ticks > 0 && elapsed > 0.0 {
            lines.push(format!(
                "  Throughput: {:.1} ticks/s",
                self.ticks as f64 / elapsed
            ));
        }
        Some(lines.join("\n"))
    }
}

impl Default for LogMonitorLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl MonitorLogger for LogMonitorLogger {
    fn progress(&mut self, ticks: usize, total: Option<usize>) {
        self.ticks = ticks;
        let at_end = total == Some(ticks);
        if ticks % self.throttle_ticks != 0 && !at_end {
            return;
        }
        match total {
            Some(total) if total > 0 => {
                let pct = ticks as f64 / total as f64 * 100.0;
                log::info!("Monitoring: {ticks}/{total} frames ({pct:.1}%)");
            }
            _ => log::info!("Monitoring: {ticks} frames"),
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings.entry(stage.to_owned()).or_default().push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_owned()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
