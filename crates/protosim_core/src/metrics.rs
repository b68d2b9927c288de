//! Performance counters and structured logging for the simulation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Running totals for one engine.
///
/// Counters are atomics so the parallel compute path can record without a
/// lock; every read is a relaxed snapshot.
pub struct Metrics {
    tick_count: AtomicU64,
    device_count: AtomicU64,
    transmits: AtomicU64,
    computes: AtomicU64,
    moves: AtomicU64,
    spawns: AtomicU64,
    suppressed_faults: AtomicU64,
    dropped_clones: AtomicU64,
    log_interval: u64,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Metrics {
    /// Creates a collector that logs progress every `log_interval` ticks.
    #[must_use]
    pub fn new(log_interval: u64) -> Self {
        Self {
            tick_count: AtomicU64::new(0),
            device_count: AtomicU64::new(0),
            transmits: AtomicU64::new(0),
            computes: AtomicU64::new(0),
            moves: AtomicU64::new(0),
            spawns: AtomicU64::new(0),
            suppressed_faults: AtomicU64::new(0),
            dropped_clones: AtomicU64::new(0),
            log_interval: log_interval.max(1),
            start_time: Instant::now(),
        }
    }

    /// Records a completed tick with its duration.
    pub fn record_tick(&self, duration: Duration, time: f64, devices: usize) {
        self.tick_count.fetch_add(1, Ordering::Relaxed);
        self.device_count.store(devices as u64, Ordering::Relaxed);

        let tick = self.tick_count.load(Ordering::Relaxed);
        if tick % self.log_interval == 0 {
            tracing::info!(
                tick = tick,
                time = time,
                devices = devices,
                computes = self.computes(),
                moves = self.moves(),
                spawns = self.spawns(),
                duration_us = duration.as_micros() as u64,
                "Simulation tick"
            );
        }
    }

    pub fn add_transmits(&self, n: usize) {
        self.transmits.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn add_computes(&self, n: usize) {
        self.computes.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn add_moves(&self, n: usize) {
        self.moves.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn add_spawns(&self, n: usize) {
        self.spawns.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn add_suppressed_faults(&self, n: usize) {
        self.suppressed_faults.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn add_dropped_clones(&self, n: usize) {
        self.dropped_clones.fetch_add(n as u64, Ordering::Relaxed);
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn device_count(&self) -> u64 {
        self.device_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn transmits(&self) -> u64 {
        self.transmits.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn computes(&self) -> u64 {
        self.computes.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn moves(&self) -> u64 {
        self.moves.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn spawns(&self) -> u64 {
        self.spawns.load(Ordering::Relaxed)
    }

    /// Actuator deltas rejected because they were not finite.
    #[must_use]
    pub fn suppressed_faults(&self) -> u64 {
        self.suppressed_faults.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn dropped_clones(&self) -> u64 {
        self.dropped_clones.load(Ordering::Relaxed)
    }

    /// Gets elapsed wall time since metrics creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Logs the final totals of a run.
    pub fn log_summary(&self) {
        tracing::info!(
            ticks = self.tick_count(),
            devices = self.device_count(),
            transmits = self.transmits(),
            computes = self.computes(),
            moves = self.moves(),
            spawns = self.spawns(),
            suppressed_faults = self.suppressed_faults(),
            dropped_clones = self.dropped_clones(),
            elapsed_ms = self.elapsed().as_millis() as u64,
            "Simulation summary"
        );
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. Calling this twice is
/// harmless; the second subscriber is discarded.
pub fn init_logging(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .finish(),
    )
    .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new(10);
        assert_eq!(metrics.tick_count(), 0);
        assert_eq!(metrics.spawns(), 0);
    }

    #[test]
    fn test_record_tick() {
        let metrics = Metrics::new(2);
        metrics.record_tick(Duration::from_millis(1), 1.0, 5);
        metrics.record_tick(Duration::from_millis(1), 2.0, 6);
        assert_eq!(metrics.tick_count(), 2);
        assert_eq!(metrics.device_count(), 6);
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = Metrics::default();
        metrics.add_moves(3);
        metrics.add_moves(2);
        metrics.add_suppressed_faults(1);
        metrics.add_dropped_clones(4);
        assert_eq!(metrics.moves(), 5);
        assert_eq!(metrics.suppressed_faults(), 1);
        assert_eq!(metrics.dropped_clones(), 4);
    }

    #[test]
    fn test_zero_log_interval_clamped() {
        let metrics = Metrics::new(0);
        metrics.record_tick(Duration::ZERO, 0.0, 0);
        assert_eq!(metrics.tick_count(), 1);
    }
}
