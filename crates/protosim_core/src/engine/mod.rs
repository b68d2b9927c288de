//! The engine context.
//!
//! [`Engine`] owns the population, the global clock, the neighbor index and
//! the RNG. There is no global state: two engines built from the same seeded
//! configuration evolve identically.

use crate::config::SimConfig;
use crate::device::Device;
use crate::error::{Result, SimError};
use crate::hooks::EngineHooks;
use crate::metrics::Metrics;
use crate::neighbor::{neighbors_within, NeighborIndex};
use crate::registry::Population;
use crate::unit::ComputationUnit;
use protosim_data::{Color, DeviceId, PopulationSnapshot, Vec3};
use rand_chacha::ChaCha8Rng;

pub mod init;
pub mod update;

pub use init::EngineBuilder;

/// Predicate checked between ticks.
pub enum StopCondition {
    Never,
    /// Stop once the clock reaches the given time.
    AtTime(f64),
    Custom(Box<dyn Fn(f64) -> bool>),
}

impl StopCondition {
    #[must_use]
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f64) -> bool + 'static,
    {
        StopCondition::Custom(Box::new(f))
    }

    #[must_use]
    pub fn should_stop(&self, time: f64) -> bool {
        match self {
            StopCondition::Never => false,
            StopCondition::AtTime(at) => time >= *at,
            StopCondition::Custom(f) => f(time),
        }
    }
}

impl std::fmt::Debug for StopCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopCondition::Never => write!(f, "Never"),
            StopCondition::AtTime(t) => write!(f, "AtTime({t})"),
            StopCondition::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickReport {
    /// Index of the tick, starting at 0.
    pub tick: u64,
    /// Clock value the tick's phases compared against.
    pub time: f64,
    pub transmitted: usize,
    pub computed: usize,
    pub moved: usize,
    /// Actuator deltas rejected as non-finite.
    pub suppressed: usize,
    pub spawned: usize,
    pub dropped_clones: usize,
    /// Whether neighbor caches were dropped at the start of the tick.
    pub topology_rebuilt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Condition,
    TickLimit,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub time: f64,
    pub reason: StopReason,
}

pub struct Engine<U: ComputationUnit> {
    pub(crate) config: SimConfig,
    pub(crate) program: U::Program,
    pub(crate) population: Population<U>,
    pub(crate) neighbors: NeighborIndex,
    pub(crate) time: f64,
    pub(crate) tick: u64,
    pub(crate) paused: bool,
    pub(crate) stop: StopCondition,
    pub(crate) hooks: Box<dyn EngineHooks<U>>,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) metrics: Metrics,
    pub(crate) fingerprint: String,
}

impl<U: ComputationUnit> Engine<U> {
    /// Builds an engine with default hooks and the configured stop time.
    pub fn new(config: SimConfig, program: U::Program) -> Result<Self> {
        EngineBuilder::new(config, program).build()
    }

    #[must_use]
    pub fn builder(config: SimConfig, program: U::Program) -> EngineBuilder<U> {
        EngineBuilder::new(config, program)
    }

    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of completed ticks.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.population.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.population.is_empty()
    }

    pub fn device(&self, id: DeviceId) -> Result<&Device<U>> {
        self.population.get(id)
    }

    /// Every device in ascending id order.
    #[must_use]
    pub fn devices(&self) -> &[Device<U>] {
        self.population.devices()
    }

    pub fn ids(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.population.ids()
    }

    pub fn position(&self, id: DeviceId) -> Result<Vec3> {
        Ok(self.population.get(id)?.position())
    }

    pub fn color(&self, id: DeviceId) -> Result<Color> {
        Ok(self.population.get(id)?.color())
    }

    /// Current neighbors of `id`, ascending.
    ///
    /// Between ticks, after something moved, the answer reflects the new
    /// positions even though caches are only dropped when the next tick
    /// starts.
    pub fn neighbors_of(&mut self, id: DeviceId) -> Result<Vec<DeviceId>> {
        let index = self
            .population
            .index_of(id)
            .ok_or(SimError::UnknownDevice(id))?;
        Ok(self
            .neighbors
            .neighbors_of(self.population.devices_mut(), index))
    }

    /// Uncached brute-force neighbors, for cross-checking the index.
    pub fn neighbors_uncached(&self, id: DeviceId) -> Result<Vec<DeviceId>> {
        let index = self
            .population
            .index_of(id)
            .ok_or(SimError::UnknownDevice(id))?;
        Ok(neighbors_within(self.population.devices(), index))
    }

    pub fn set_sensor(&mut self, id: DeviceId, index: usize, value: bool) -> Result<()> {
        self.population.get_mut(id)?.unit.set_sensor(index, value);
        Ok(())
    }

    /// Changes a device's sensing radius. Takes effect on the next tick.
    pub fn set_radius(&mut self, id: DeviceId, radius: f64) -> Result<()> {
        crate::ensure_config!(
            radius.is_finite() && radius > 0.0,
            "radius must be finite and positive, got {radius}"
        );
        let device = self.population.get_mut(id)?;
        device.set_radius(radius);
        self.neighbors.mark_dirty();
        Ok(())
    }

    /// Raises a clone request, honored at the next population mutation phase.
    pub fn request_clone(&mut self, id: DeviceId) -> Result<()> {
        self.population.get_mut(id)?.requests.request_clone = true;
        Ok(())
    }

    /// Records a death request. Devices are never removed.
    pub fn request_death(&mut self, id: DeviceId) -> Result<()> {
        self.population.get_mut(id)?.requests.request_death = true;
        Ok(())
    }

    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[must_use]
    pub fn program(&self) -> &U::Program {
        &self.program
    }

    /// Whether the topology changed since the current caches were built.
    #[must_use]
    pub fn topology_dirty(&self) -> bool {
        self.neighbors.is_dirty()
    }

    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop.should_stop(self.time)
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Runs one tick unless paused or stopped.
    pub fn advance(&mut self) -> Option<TickReport> {
        if self.paused || self.should_stop() {
            return None;
        }
        Some(self.tick())
    }

    /// Ticks until the stop condition holds, the engine is paused, or
    /// `max_ticks` ticks have run.
    pub fn run(&mut self, max_ticks: u64) -> RunSummary {
        let mut ticks = 0;
        let reason = loop {
            if self.should_stop() {
                break StopReason::Condition;
            }
            if self.paused {
                break StopReason::Paused;
            }
            if ticks >= max_ticks {
                break StopReason::TickLimit;
            }
            self.tick();
            ticks += 1;
        };
        tracing::debug!(ticks, time = self.time, ?reason, "Run finished");
        RunSummary {
            ticks,
            time: self.time,
            reason,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> PopulationSnapshot {
        PopulationSnapshot {
            tick: self.tick,
            time: self.time,
            fingerprint: self.fingerprint.clone(),
            devices: self.population.devices().iter().map(Device::snapshot).collect(),
        }
    }
}
