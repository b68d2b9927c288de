use super::{Engine, StopCondition};
use crate::config::SimConfig;
use crate::device::Device;
use crate::error::{Result, SimError};
use crate::hooks::{EngineHooks, NoHooks};
use crate::metrics::Metrics;
use crate::neighbor::NeighborIndex;
use crate::registry::Population;
use crate::schedule::Schedule;
use crate::unit::ComputationUnit;
use protosim_data::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Configures and constructs an [`Engine`].
///
/// Everything expressible in [`SimConfig`] comes from there; the builder adds
/// what cannot be serialized: hooks, a stop predicate, a placement function
/// and custom timer functions.
pub struct EngineBuilder<U: ComputationUnit> {
    config: SimConfig,
    program: U::Program,
    hooks: Box<dyn EngineHooks<U>>,
    stop: Option<StopCondition>,
    placement: Option<fn(usize) -> Vec3>,
    schedule: Option<Schedule>,
}

impl<U: ComputationUnit> EngineBuilder<U> {
    #[must_use]
    pub fn new(config: SimConfig, program: U::Program) -> Self {
        Self {
            config,
            program,
            hooks: Box::new(NoHooks),
            stop: None,
            placement: None,
            schedule: None,
        }
    }

    #[must_use]
    pub fn hooks<H>(mut self, hooks: H) -> Self
    where
        H: EngineHooks<U> + 'static,
    {
        self.hooks = Box::new(hooks);
        self
    }

    /// Overrides `engine.stop_at`.
    #[must_use]
    pub fn stop_when(mut self, stop: StopCondition) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Places device `i` at `placement(i)` instead of using the configured
    /// distribution.
    #[must_use]
    pub fn placement(mut self, placement: fn(usize) -> Vec3) -> Self {
        self.placement = Some(placement);
        self
    }

    /// Gives every device this schedule instead of resolving the configured
    /// timer policies.
    #[must_use]
    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    /// Validates the configuration and creates the initial population.
    pub fn build(self) -> Result<Engine<U>> {
        let EngineBuilder {
            config,
            program,
            mut hooks,
            stop,
            placement,
            schedule,
        } = self;

        config.validate()?;
        hooks.pre_init(&config);

        let mut rng = match config.engine.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let size = config.population.size;
        let start = config.engine.start_time;
        let mut population = Population::new();

        for index in 0..size {
            let position = match placement {
                Some(place) => place(index),
                None => config.population.distribution.place(
                    index,
                    size,
                    &config.population.volume,
                    &mut rng,
                ),
            };
            if !position.is_finite() {
                return Err(SimError::invalid_distribution(format!(
                    "device {index} placed at non-finite position {position:?}"
                )));
            }

            let device_schedule = match schedule {
                Some(s) => s,
                None => Schedule {
                    transmit: config.schedule.transmit.resolve(&mut rng),
                    compute: config.schedule.compute.resolve(&mut rng),
                },
            };
            let first_due = start + start_lag(&config, &device_schedule, &mut rng);

            let id = population.allocate_id();
            let unit = U::new(position, &program);
            let mut device = Device::new(
                id,
                None,
                position,
                config.population.radius,
                unit,
                device_schedule,
                first_due,
            );
            device.clone_timer = config.lifecycle.clone_delay;
            hooks.device_init(&device);
            population.insert(device);
        }

        let stop = stop.unwrap_or(match config.engine.stop_at {
            Some(at) => StopCondition::AtTime(at),
            None => StopCondition::Never,
        });

        tracing::info!(
            devices = population.len(),
            seed = ?config.engine.seed,
            strategy = ?config.index.strategy,
            "Engine initialized"
        );

        Ok(Engine {
            neighbors: NeighborIndex::new(&config.index, config.population.radius),
            metrics: Metrics::new(config.engine.log_interval),
            fingerprint: config.fingerprint(),
            time: start,
            tick: 0,
            paused: config.engine.start_paused,
            stop,
            hooks,
            rng,
            population,
            program,
            config,
        })
    }
}

/// Delay before a device first runs. Unsynchronized devices start somewhere
/// within their first compute period.
fn start_lag(config: &SimConfig, schedule: &Schedule, rng: &mut ChaCha8Rng) -> f64 {
    if config.schedule.sync {
        return 0.0;
    }
    let period = schedule
        .compute
        .period()
        .unwrap_or_else(|| config.schedule.compute.nominal_period());
    if period > 0.0 {
        rng.gen_range(0.0..period)
    } else {
        0.0
    }
}
