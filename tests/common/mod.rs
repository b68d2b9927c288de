pub mod macros;

use protosim_core::config::SimConfig;
use protosim_core::distribution::Distribution;
use protosim_core::engine::{Engine, EngineBuilder};
use protosim_core::program::{Program, ScriptedUnit};
use protosim_core::unit::ComputationUnit;
use protosim_data::{Color, DeviceId, LifecycleRequests, Vec3, Volume};

/// Scripted behavior for [`ProbeUnit`], keyed by device id.
#[allow(dead_code)]
#[derive(Debug, Clone, Default)]
pub struct ProbePlan {
    /// Displacement requested every round by the listed device.
    pub velocities: Vec<(DeviceId, Vec3)>,
    /// The listed device requests one clone at its first round at or after
    /// the given time.
    pub clones: Vec<(DeviceId, f64)>,
    /// Devices whose rounds request a NaN displacement.
    pub faulty: Vec<DeviceId>,
    /// Devices that request a clone in every round.
    pub budding: Vec<DeviceId>,
}

/// Test unit that records what the engine does to it.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct ProbeUnit {
    plan: ProbePlan,
    id: DeviceId,
    radius: f64,
    position: Vec3,
    actuators: Vec3,
    color: Color,
    sensors: [bool; 2],
    requests: LifecycleRequests,
    cloned: bool,
    /// Ids of every unit whose state was delivered, in delivery order.
    pub heard: Vec<DeviceId>,
    /// Times of every executed round.
    pub rounds: Vec<f64>,
    /// Position mirror observed at the start of each round.
    pub seen_positions: Vec<Vec3>,
}

impl ComputationUnit for ProbeUnit {
    type Program = ProbePlan;

    fn new(position: Vec3, plan: &ProbePlan) -> Self {
        Self {
            plan: plan.clone(),
            id: DeviceId::default(),
            radius: 0.0,
            position,
            actuators: Vec3::ZERO,
            color: Color::OFF,
            sensors: [false; 2],
            requests: LifecycleRequests::default(),
            cloned: false,
            heard: Vec::new(),
            rounds: Vec::new(),
            seen_positions: Vec::new(),
        }
    }

    fn spawn_clone(&self, position: Vec3, plan: &ProbePlan) -> Self {
        let mut child = Self::new(position, plan);
        child.cloned = true;
        child
    }

    fn execute_round(&mut self, time: f64) {
        self.rounds.push(time);
        self.seen_positions.push(self.position);
        self.color = Color::new(time, 0.0, 0.0);
        if let Some((_, v)) = self.plan.velocities.iter().find(|(id, _)| *id == self.id) {
            self.actuators = *v;
        }
        if self.plan.faulty.contains(&self.id) {
            self.actuators = Vec3::new(f64::NAN, 1.0, 0.0);
        }
        let due_clone = self
            .plan
            .clones
            .iter()
            .any(|(id, at)| *id == self.id && time >= *at);
        if due_clone && !self.cloned {
            self.cloned = true;
            self.requests.request_clone = true;
        }
        if self.plan.budding.contains(&self.id) {
            self.requests.request_clone = true;
        }
    }

    fn deliver_message(&mut self, source: &Self) {
        self.heard.push(source.id);
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
        if let Some(s) = self.sensors.get_mut(index) {
            *s = value;
        }
    }

    fn sensor_count(&self) -> usize {
        self.sensors.len()
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

/// Fluent setup for engines placed at explicit points.
#[allow(dead_code)]
pub struct SimBuilder {
    config: SimConfig,
    points: Vec<Vec3>,
}

#[allow(dead_code)]
impl SimBuilder {
    pub fn new() -> Self {
        let mut config = SimConfig::default();
        config.engine.seed = Some(42);
        config.population.volume =
            Volume::new(Vec3::new(-1000.0, -1000.0, 0.0), Vec3::new(1000.0, 1000.0, 0.0));
        Self {
            config,
            points: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.engine.seed = Some(seed);
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.config.population.radius = radius;
        self
    }

    pub fn with_device(mut self, x: f64, y: f64, z: f64) -> Self {
        self.points.push(Vec3::new(x, y, z));
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut SimConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn config(&self) -> SimConfig {
        let mut config = self.config.clone();
        if !self.points.is_empty() {
            config.population.size = self.points.len();
            config.population.distribution = Distribution::Explicit {
                points: self.points.clone(),
            };
        }
        config
    }

    pub fn probe(self, plan: ProbePlan) -> EngineBuilder<ProbeUnit> {
        Engine::builder(self.config(), plan)
    }

    pub fn build_probe(self, plan: ProbePlan) -> Engine<ProbeUnit> {
        self.probe(plan).build().expect("Failed to build probe engine")
    }

    pub fn build_scripted(self, program: Program) -> Engine<ScriptedUnit> {
        Engine::new(self.config(), program).expect("Failed to build scripted engine")
    }
}

/// Neighbor ids of every device, in id order.
#[allow(dead_code)]
pub fn all_neighbors<U: ComputationUnit>(engine: &mut Engine<U>) -> Vec<(DeviceId, Vec<DeviceId>)> {
    let ids: Vec<DeviceId> = engine.ids().collect();
    ids.into_iter()
        .map(|id| (id, engine.neighbors_of(id).expect("registered device")))
        .collect()
}
