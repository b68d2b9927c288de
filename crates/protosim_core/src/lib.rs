//! # Protosim Core
//!
//! The simulation engine for a spatial computer: a population of devices that
//! each run an opaque computation unit, move in continuous 3D space, pull
//! messages from nearby devices and may clone themselves at runtime.
//!
//! This crate contains:
//! - The [`ComputationUnit`] trait the engine drives
//! - Device scheduling with per-device transmit/compute timers
//! - A cached neighbor index with population-wide invalidation
//! - An arena population registry with deferred spawning
//! - The tick loop (transmit, compute, actuation, population mutation)
//!
//! ## Example
//!
//! ```
//! use protosim_core::config::SimConfig;
//! use protosim_core::engine::Engine;
//! use protosim_core::program::{Program, ScriptedUnit};
//! use protosim_data::Vec3;
//!
//! let mut config = SimConfig::default();
//! config.population.size = 10;
//! config.engine.seed = Some(7);
//!
//! let program = Program::Drift { velocity: Vec3::new(1.0, 0.0, 0.0) };
//! let mut engine: Engine<ScriptedUnit> = Engine::new(config, program).unwrap();
//! for _ in 0..5 {
//!     engine.tick();
//! }
//! assert_eq!(engine.tick_count(), 5);
//! ```

/// Typed configuration with validation and TOML loading
pub mod config;
/// Device state owned by the registry
pub mod device;
/// Initial placement of devices
pub mod distribution;
/// The engine context and per-tick algorithm
pub mod engine;
/// Error types
pub mod error;
/// Instrumentation hooks
pub mod hooks;
/// Counters and structured logging
pub mod metrics;
/// Cached neighbor discovery
pub mod neighbor;
/// Reference computation units used by the headless runner and tests
pub mod program;
/// Arena registry with deferred insertion
pub mod registry;
/// Per-device transmit/compute timers
pub mod schedule;
/// Uniform 3D grid for radius queries
pub mod spatial_hash;
/// The computation unit capability
pub mod unit;

pub use config::SimConfig;
pub use device::Device;
pub use engine::{Engine, EngineBuilder, RunSummary, StopCondition, StopReason, TickReport};
pub use error::{Result, SimError};
pub use hooks::EngineHooks;
pub use metrics::{init_logging, Metrics};
pub use unit::ComputationUnit;
