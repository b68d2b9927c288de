use crate::config::SimConfig;
use crate::device::Device;

/// Instrumentation callbacks invoked by the engine.
///
/// Hooks observe; they cannot mutate devices or the clock. Every method
/// defaults to a no-op so implementors override only what they need.
pub trait EngineHooks<U> {
    /// Once, before the initial population is created.
    fn pre_init(&mut self, _config: &SimConfig) {}

    /// After each device is created, including clones.
    fn device_init(&mut self, _device: &Device<U>) {}

    /// At the start of every tick, before the transmit phase.
    fn pre_update(&mut self, _time: f64) {}

    /// After a device's compute round, in ascending id order.
    fn device_executed(&mut self, _device: &Device<U>) {}
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl<U> EngineHooks<U> for NoHooks {}
