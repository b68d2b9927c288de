//! Reference computation units.
//!
//! [`ScriptedUnit`] runs one of a handful of fixed behaviors selected by
//! [`Program`]. It stands in for a real program interpreter in the headless
//! runner, the benches and the tests; the engine knows nothing about it
//! beyond the [`ComputationUnit`] trait.

use crate::unit::ComputationUnit;
use protosim_data::{Color, DeviceId, LifecycleRequests, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Program {
    /// Does nothing.
    #[default]
    Idle,
    /// Requests the same displacement every round.
    Drift { velocity: Vec3 },
    /// Hop-count gradient from every device whose `source_sensor` is set.
    HopGradient { source_sensor: usize },
    /// Requests a single clone at the first round at or after `at_time`.
    Divide { at_time: f64 },
    /// Toggles green every `period` time units.
    Blink { period: f64 },
}

/// Unit executing a [`Program`].
#[derive(Debug, Clone)]
pub struct ScriptedUnit {
    program: Program,
    id: DeviceId,
    radius: f64,
    position: Vec3,
    actuators: Vec3,
    color: Color,
    sensors: [bool; ScriptedUnit::SENSOR_COUNT],
    requests: LifecycleRequests,
    /// Exported gradient value, read by neighbors.
    hops: Option<u32>,
    /// Smallest gradient value heard since the last round.
    best_heard: Option<u32>,
    divided: bool,
    rounds: u64,
}

impl ScriptedUnit {
    pub const SENSOR_COUNT: usize = 4;

    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Current gradient value, if the device has heard of a source.
    #[must_use]
    pub fn hops(&self) -> Option<u32> {
        self.hops
    }

    #[must_use]
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    fn run_gradient(&mut self, source_sensor: usize) {
        self.hops = if self.sensor(source_sensor) {
            Some(0)
        } else {
            self.best_heard.map(|h| h.saturating_add(1))
        };
        self.best_heard = None;
        self.color = match self.hops {
            Some(0) => Color::new(1.0, 0.0, 0.0),
            Some(h) => Color::new(0.0, 0.0, 1.0 / f64::from(h)),
            None => Color::OFF,
        };
    }
}

impl ComputationUnit for ScriptedUnit {
    type Program = Program;

    fn new(position: Vec3, program: &Program) -> Self {
        Self {
            program: program.clone(),
            id: DeviceId::default(),
            radius: 0.0,
            position,
            actuators: Vec3::ZERO,
            color: Color::OFF,
            sensors: [false; Self::SENSOR_COUNT],
            requests: LifecycleRequests::default(),
            hops: None,
            best_heard: None,
            divided: false,
            rounds: 0,
        }
    }

    /// A divided parent produces a child that will not divide again.
    fn spawn_clone(&self, position: Vec3, program: &Program) -> Self {
        let mut child = Self::new(position, program);
        child.divided = self.divided;
        child
    }

    fn execute_round(&mut self, time: f64) {
        self.rounds += 1;
        match self.program {
            Program::Idle => {}
            Program::Drift { velocity } => self.actuators = velocity,
            Program::HopGradient { source_sensor } => self.run_gradient(source_sensor),
            Program::Divide { at_time } => {
                if !self.divided && time >= at_time {
                    self.divided = true;
                    self.requests.request_clone = true;
                }
            }
            Program::Blink { period } => {
                let on = period <= 0.0 || ((time / period).floor() as i64) % 2 == 0;
                self.color = if on {
                    Color::new(0.0, 1.0, 0.0)
                } else {
                    Color::OFF
                };
            }
        }
    }

    fn deliver_message(&mut self, source: &Self) {
        if let Some(h) = source.hops {
            self.best_heard = Some(self.best_heard.map_or(h, |best| best.min(h)));
        }
    }

    fn reset_actuators(&mut self) {
        self.actuators = Vec3::ZERO;
        self.color = Color::OFF;
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn actuators(&self) -> Vec3 {
        self.actuators
    }

    fn set_actuators(&mut self, delta: Vec3) {
        self.actuators = delta;
    }

    fn color(&self) -> Color {
        self.color
    }

    fn sensor(&self, index: usize) -> bool {
        self.sensors.get(index).copied().unwrap_or(false)
    }

    fn set_sensor(&mut self, index: usize, value: bool) {
        if let Some(slot) = self.sensors.get_mut(index) {
            *slot = value;
        }
    }

    fn sensor_count(&self) -> usize {
        Self::SENSOR_COUNT
    }

    fn radius(&self) -> f64 {
        self.radius
    }

    fn set_radius(&mut self, radius: f64) {
        self.radius = radius;
    }

    fn id(&self) -> DeviceId {
        self.id
    }

    fn set_id(&mut self, id: DeviceId) {
        self.id = id;
    }

    fn take_requests(&mut self) -> LifecycleRequests {
        std::mem::take(&mut self.requests)
    }
}
