use protosim_data::{Color, DeviceId, LifecycleRequests, Vec3};

/// Capability the engine requires from a device's computation unit.
///
/// The unit is opaque: the engine never interprets its program. It mirrors
/// the device position (seeded at construction, refreshed by the engine
/// before every round and after every move), exposes actuator deltas and
/// color after a round, and ingests neighbor state as messages.
///
/// Implementations must be deterministic given the same sequence of calls;
/// tick determinism of the whole simulation relies on it.
pub trait ComputationUnit: Send {
    /// Program shared by every unit in a population.
    type Program: Clone;

    fn new(position: Vec3, program: &Self::Program) -> Self;

    /// Builds the unit for a device cloned from `self`. The default starts a
    /// fresh unit running the population program.
    fn spawn_clone(&self, position: Vec3, program: &Self::Program) -> Self
    where
        Self: Sized,
    {
        Self::new(position, program)
    }

    /// Runs the program for one round at engine time `time`.
    fn execute_round(&mut self, time: f64);

    /// Ingests `source`'s exported state as an incoming message.
    fn deliver_message(&mut self, source: &Self);

    /// Zeroes actuator deltas and emitted color before a round.
    fn reset_actuators(&mut self);

    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);

    /// Movement requested by the last round.
    fn actuators(&self) -> Vec3;
    fn set_actuators(&mut self, delta: Vec3);

    fn color(&self) -> Color;

    fn sensor(&self, index: usize) -> bool;
    fn set_sensor(&mut self, index: usize, value: bool);

    /// Number of addressable sensors, used for state dumps.
    fn sensor_count(&self) -> usize {
        0
    }

    fn radius(&self) -> f64;
    fn set_radius(&mut self, radius: f64);

    fn id(&self) -> DeviceId;
    fn set_id(&mut self, id: DeviceId);

    /// Drains lifecycle requests raised during the last round.
    fn take_requests(&mut self) -> LifecycleRequests {
        LifecycleRequests::default()
    }
}
