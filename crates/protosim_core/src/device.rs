use crate::schedule::Schedule;
use crate::unit::ComputationUnit;
use protosim_data::{Color, DeviceId, DeviceSnapshot, LifecycleRequests, Vec3};

/// One simulated device.
///
/// The position held here is authoritative; the unit's position fields are a
/// mirror kept in sync by the engine. Only the engine's actuation phase moves
/// a device, so every mutator is crate-private.
#[derive(Debug)]
pub struct Device<U> {
    id: DeviceId,
    parent: Option<DeviceId>,
    position: Vec3,
    radius: f64,
    pub(crate) unit: U,
    pub(crate) schedule: Schedule,
    pub(crate) next_transmit_time: f64,
    pub(crate) next_compute_time: f64,
    pub(crate) last_compute_time: Option<f64>,
    pub(crate) neighbor_cache: Option<Vec<DeviceId>>,
    pub(crate) requests: LifecycleRequests,
    /// Time left before the next clone request may fire.
    pub(crate) clone_timer: f64,
    /// Time between the two most recent rounds, not yet charged to the clone
    /// timer.
    round_elapsed: f64,
}

impl<U: ComputationUnit> Device<U> {
    pub(crate) fn new(
        id: DeviceId,
        parent: Option<DeviceId>,
        position: Vec3,
        radius: f64,
        mut unit: U,
        schedule: Schedule,
        first_due: f64,
    ) -> Self {
        unit.set_id(id);
        unit.set_radius(radius);
        unit.set_position(position);
        Self {
            id,
            parent,
            position,
            radius,
            unit,
            schedule,
            next_transmit_time: first_due,
            next_compute_time: first_due,
            last_compute_time: None,
            neighbor_cache: None,
            requests: LifecycleRequests::default(),
            clone_timer: 0.0,
            round_elapsed: 0.0,
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Device this one was cloned from, if any.
    pub fn parent(&self) -> Option<DeviceId> {
        self.parent
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn unit(&self) -> &U {
        &self.unit
    }

    pub fn color(&self) -> Color {
        self.unit.color()
    }

    pub fn sensor(&self, index: usize) -> bool {
        self.unit.sensor(index)
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn next_transmit_time(&self) -> f64 {
        self.next_transmit_time
    }

    pub fn next_compute_time(&self) -> f64 {
        self.next_compute_time
    }

    /// Engine time of this device's most recent compute round.
    pub fn last_compute_time(&self) -> Option<f64> {
        self.last_compute_time
    }

    pub fn requests(&self) -> LifecycleRequests {
        self.requests
    }

    /// Time left before this device may clone again.
    pub fn clone_timer(&self) -> f64 {
        self.clone_timer
    }

    /// Cached neighbor ids, if the cache is currently valid.
    pub fn neighbor_cache(&self) -> Option<&[DeviceId]> {
        self.neighbor_cache.as_deref()
    }

    #[inline]
    pub fn transmit_due(&self, time: f64) -> bool {
        time >= self.next_transmit_time
    }

    #[inline]
    pub fn compute_due(&self, time: f64) -> bool {
        time >= self.next_compute_time
    }

    /// Runs one compute round: mirror the position, reset actuators, execute,
    /// collect lifecycle requests and advance the compute timer.
    pub(crate) fn run_compute(&mut self, time: f64) {
        self.unit.set_position(self.position);
        self.unit.reset_actuators();
        self.unit.execute_round(time);
        self.round_elapsed = self.last_compute_time.map_or(0.0, |last| time - last);
        self.last_compute_time = Some(time);
        self.requests.merge(self.unit.take_requests());
        self.next_compute_time = self.schedule.compute.next(time);
    }

    /// Charges the time since the previous round to the clone countdown and
    /// reports whether a pending clone request may fire. Firing re-arms the
    /// countdown by whole multiples of `delay`.
    pub(crate) fn clone_ready(&mut self, delay: f64) -> bool {
        if delay <= 0.0 {
            return true;
        }
        if self.clone_timer > 0.0 {
            self.clone_timer -= self.round_elapsed;
        }
        self.round_elapsed = 0.0;
        if self.clone_timer > 0.0 {
            return false;
        }
        self.clone_timer += delay * ((-self.clone_timer / delay).floor() + 1.0);
        true
    }

    pub(crate) fn set_radius(&mut self, radius: f64) {
        self.radius = radius;
        self.unit.set_radius(radius);
    }

    pub(crate) fn advance_transmit(&mut self, time: f64) {
        self.next_transmit_time = self.schedule.transmit.next(time);
    }

    /// Writes a new authoritative position and mirrors it into the unit.
    pub(crate) fn move_to(&mut self, position: Vec3) {
        self.position = position;
        self.unit.set_position(position);
    }

    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            id: self.id,
            parent: self.parent,
            position: self.position,
            radius: self.radius,
            color: self.unit.color(),
            sensors: (0..self.unit.sensor_count())
                .map(|i| self.unit.sensor(i))
                .collect(),
            next_transmit_time: self.next_transmit_time,
            next_compute_time: self.next_compute_time,
            last_compute_time: self.last_compute_time,
            requests: self.requests,
            clone_timer: self.clone_timer,
        }
    }
}
