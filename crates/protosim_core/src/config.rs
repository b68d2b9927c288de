//! Configuration management for simulation parameters.
//!
//! Strongly-typed sections that map onto a TOML file. Every field has a
//! default, so a partial file (or none at all) is valid input. Validation runs
//! once, at engine construction, and rejects the whole configuration on the
//! first bad value.
//!
//! ## Example `config.toml`
//!
//! ```toml
//! [engine]
//! step_size = 0.5
//! seed = 42
//!
//! [population]
//! size = 200
//! radius = 8.0
//!
//! [population.distribution]
//! kind = "grid"
//!
//! [schedule]
//! sync = false
//! transmit = { kind = "fixed", period = 0.5 }
//! compute = { kind = "jittered", period = 1.0, variance = 0.1 }
//!
//! [index]
//! strategy = "grid"
//! ```

use crate::distribution::Distribution;
use crate::ensure_config;
use crate::error::Result;
use crate::schedule::TimerPolicy;
use protosim_data::Volume;
use serde::{Deserialize, Serialize};

/// Global clock and run control.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub step_size: f64,
    pub start_time: f64,
    pub start_paused: bool,
    /// RNG seed for placement, timer jitter and clone offsets. `None` draws
    /// one from the OS.
    pub seed: Option<u64>,
    pub parallel_compute: bool,
    /// Stop once the clock reaches this time.
    pub stop_at: Option<f64>,
    /// Ticks between periodic progress log lines.
    pub log_interval: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_size: 1.0,
            start_time: 0.0,
            start_paused: false,
            seed: None,
            parallel_compute: false,
            stop_at: None,
            log_interval: 100,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PopulationConfig {
    pub size: usize,
    /// Default sensing radius for every device.
    pub radius: f64,
    pub volume: Volume,
    pub distribution: Distribution,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: 100,
            radius: 10.0,
            volume: Volume::default(),
            distribution: Distribution::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ScheduleConfig {
    pub transmit: TimerPolicy,
    pub compute: TimerPolicy,
    /// When false every device starts with a random lag in
    /// `[0, compute period)` instead of being due at the start time.
    pub sync: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            transmit: TimerPolicy::Fixed { period: 0.5 },
            compute: TimerPolicy::Fixed { period: 1.0 },
            sync: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct DynamicsConfig {
    /// Longest displacement applied in one actuation phase.
    pub speed_limit: Option<f64>,
    /// Clamp moved devices into the population volume.
    pub bounded: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Distance from the parent at which clones are placed.
    pub clone_offset: f64,
    /// Clone requests beyond this population are dropped.
    pub max_population: Option<usize>,
    /// Minimum time between two clones of the same device. Each device
    /// counts down from this value, by the time elapsed between its rounds,
    /// while it keeps requesting clones. Zero disables the countdown.
    pub clone_delay: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IndexStrategy {
    /// Scan every device per query.
    #[default]
    BruteForce,
    /// Hashed uniform grid rebuilt whenever the topology changes.
    Grid,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct IndexConfig {
    pub strategy: IndexStrategy,
    /// Grid cell edge. Defaults to the population radius.
    pub cell_size: Option<f64>,
}

impl IndexConfig {
    #[must_use]
    pub fn effective_cell_size(&self, radius: f64) -> f64 {
        self.cell_size.unwrap_or(radius)
    }
}

/// Complete simulation configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct SimConfig {
    pub engine: EngineConfig,
    pub population: PopulationConfig,
    pub schedule: ScheduleConfig,
    pub dynamics: DynamicsConfig,
    pub lifecycle: LifecycleConfig,
    pub index: IndexConfig,
}

impl SimConfig {
    /// Validates all configuration parameters.
    ///
    /// # Validation Rules
    /// - Step size and radius must be finite and strictly positive
    /// - The population must hold at least one device
    /// - Start time must be finite and non-negative
    /// - Timer periods and variances must be finite and non-negative
    /// - The distribution must be able to place the whole population
    /// - Optional limits, when present, must be positive
    pub fn validate(&self) -> Result<()> {
        // Engine
        ensure_config!(
            self.engine.step_size.is_finite() && self.engine.step_size > 0.0,
            "step_size must be finite and positive, got {}",
            self.engine.step_size
        );
        ensure_config!(
            self.engine.start_time.is_finite() && self.engine.start_time >= 0.0,
            "start_time must be finite and non-negative, got {}",
            self.engine.start_time
        );
        if let Some(stop_at) = self.engine.stop_at {
            ensure_config!(!stop_at.is_nan(), "stop_at must not be NaN");
        }
        ensure_config!(self.engine.log_interval > 0, "log_interval must be positive");

        // Population
        ensure_config!(self.population.size > 0, "population size must be positive");
        ensure_config!(
            self.population.radius.is_finite() && self.population.radius > 0.0,
            "radius must be finite and positive, got {}",
            self.population.radius
        );
        self.population
            .distribution
            .validate(&self.population.volume, self.population.size)?;

        // Schedule
        self.schedule.transmit.validate("transmit")?;
        self.schedule.compute.validate("compute")?;

        // Dynamics
        if let Some(limit) = self.dynamics.speed_limit {
            ensure_config!(
                limit.is_finite() && limit >= 0.0,
                "speed_limit must be finite and non-negative, got {limit}"
            );
        }

        // Lifecycle
        ensure_config!(
            self.lifecycle.clone_offset.is_finite() && self.lifecycle.clone_offset >= 0.0,
            "clone_offset must be finite and non-negative, got {}",
            self.lifecycle.clone_offset
        );
        ensure_config!(
            self.lifecycle.clone_delay.is_finite() && self.lifecycle.clone_delay >= 0.0,
            "clone_delay must be finite and non-negative, got {}",
            self.lifecycle.clone_delay
        );
        if let Some(max) = self.lifecycle.max_population {
            ensure_config!(
                max >= self.population.size,
                "max_population ({max}) is below the initial population ({})",
                self.population.size
            );
        }

        // Index
        if let Some(cell) = self.index.cell_size {
            ensure_config!(
                cell.is_finite() && cell > 0.0,
                "cell_size must be finite and positive, got {cell}"
            );
        }

        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Stable digest of the behavior-relevant sections, recorded in snapshots
    /// so dumps can be matched to the configuration that produced them.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.engine).as_bytes());
        hasher.update(format!("{:?}", self.population).as_bytes());
        hasher.update(format!("{:?}", self.schedule).as_bytes());
        hasher.update(format!("{:?}", self.dynamics).as_bytes());
        hasher.update(format!("{:?}", self.lifecycle).as_bytes());
        hex::encode(hasher.finalize())
    }
}
