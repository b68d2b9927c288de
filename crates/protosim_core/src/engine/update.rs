use super::{Engine, TickReport};
use crate::device::Device;
use crate::registry::SpawnRequest;
use crate::unit::ComputationUnit;
use protosim_data::{DeviceId, Vec3, Volume};
use rand::Rng;
use rayon::prelude::*;
use std::f64::consts::TAU;
use std::time::Instant;

impl<U: ComputationUnit> Engine<U> {
    /// Advances the simulation by one tick.
    ///
    /// Phases run in a fixed order, all comparing against the same clock
    /// value:
    /// - Transmit: due devices pull state from their neighbors
    /// - Compute: due devices execute one round
    /// - Actuation: requested displacements are applied
    /// - Population mutation: clone requests become new devices
    ///
    /// The clock advances by `step_size` afterwards. Ticking ignores the pause
    /// flag and the stop condition; see [`Engine::advance`] and
    /// [`Engine::run`] for that.
    pub fn tick(&mut self) -> TickReport {
        let started = Instant::now();
        let time = self.time;

        self.hooks.pre_update(time);
        let topology_rebuilt = self.neighbors.begin_tick(self.population.devices_mut());

        let transmitted = self.transmit_phase(time);
        let computed = self.compute_phase(time);
        let (moved, suppressed) = self.actuation_phase();
        let (spawned, dropped_clones) = self.mutation_phase();

        let report = TickReport {
            tick: self.tick,
            time,
            transmitted,
            computed,
            moved,
            suppressed,
            spawned,
            dropped_clones,
            topology_rebuilt,
        };

        self.time += self.config.engine.step_size;
        self.tick += 1;

        self.metrics.add_transmits(transmitted);
        self.metrics.add_computes(computed);
        self.metrics.add_moves(moved);
        self.metrics.add_suppressed_faults(suppressed);
        self.metrics.add_spawns(spawned);
        self.metrics.add_dropped_clones(dropped_clones);
        self.metrics
            .record_tick(started.elapsed(), self.time, self.population.len());

        tracing::debug!(
            tick = report.tick,
            time,
            transmitted,
            computed,
            moved,
            spawned,
            topology_rebuilt,
            "Tick complete"
        );
        report
    }

    /// Every due device pulls each neighbor's state, in ascending neighbor id
    /// order. Returns how many devices transmitted.
    fn transmit_phase(&mut self, time: f64) -> usize {
        let mut transmitted = 0;
        for index in 0..self.population.len() {
            if !self.population.devices()[index].transmit_due(time) {
                continue;
            }
            let neighbors = self
                .neighbors
                .neighbors_of(self.population.devices_mut(), index);
            for id in neighbors {
                if let Some(source) = self.population.index_of(id) {
                    let (receiver, sender) = self.population.pair_mut(index, source);
                    receiver.unit.deliver_message(&sender.unit);
                }
            }
            self.population.devices_mut()[index].advance_transmit(time);
            transmitted += 1;
        }
        transmitted
    }

    /// Runs a round on every due device. Units only touch their own state
    /// here, so the parallel path is observably identical; `device_executed`
    /// always fires afterwards in id order.
    fn compute_phase(&mut self, time: f64) -> usize {
        let devices = self.population.devices_mut();
        let due: Vec<usize> = devices
            .iter()
            .enumerate()
            .filter(|(_, d)| d.compute_due(time))
            .map(|(i, _)| i)
            .collect();

        if self.config.engine.parallel_compute {
            devices
                .par_iter_mut()
                .filter(|d| d.compute_due(time))
                .for_each(|d| d.run_compute(time));
        } else {
            for &index in &due {
                devices[index].run_compute(time);
            }
        }

        for &index in &due {
            self.hooks.device_executed(&devices[index]);
        }
        due.len()
    }

    /// Applies actuator deltas. Returns `(moved, suppressed)`.
    fn actuation_phase(&mut self) -> (usize, usize) {
        let speed_limit = self.config.dynamics.speed_limit;
        let bounds = self
            .config
            .dynamics
            .bounded
            .then_some(self.config.population.volume);

        let mut moved = 0;
        let mut suppressed = 0;
        for device in self.population.devices_mut() {
            let delta = device.unit.actuators();
            if delta.is_zero() {
                device.unit.set_position(device.position());
                continue;
            }
            device.unit.set_actuators(Vec3::ZERO);

            match displaced(device.position(), delta, speed_limit, bounds.as_ref()) {
                Some(target) if target != device.position() => {
                    device.move_to(target);
                    moved += 1;
                }
                Some(_) => device.unit.set_position(device.position()),
                None => {
                    tracing::warn!(
                        device = %device.id(),
                        ?delta,
                        "Suppressed non-finite actuator delta"
                    );
                    device.unit.set_position(device.position());
                    suppressed += 1;
                }
            }
        }

        if moved > 0 {
            self.neighbors.mark_dirty();
        }
        (moved, suppressed)
    }

    /// Turns clone requests into deferred spawns, then materializes them.
    /// A request raised while the device's clone countdown is still running
    /// is consumed without effect. Returns `(spawned, dropped)`.
    fn mutation_phase(&mut self) -> (usize, usize) {
        let delay = self.config.lifecycle.clone_delay;
        let mut parents: Vec<DeviceId> = Vec::new();
        for device in self.population.devices_mut() {
            if device.requests.request_clone {
                device.requests.request_clone = false;
                if device.clone_ready(delay) {
                    parents.push(device.id());
                }
            }
        }

        let max_population = self.config.lifecycle.max_population;
        let mut dropped = 0;
        for parent_id in parents {
            if let Some(max) = max_population {
                if self.population.len() + self.population.pending_len() >= max {
                    dropped += 1;
                    continue;
                }
            }
            let Ok(parent) = self.population.get(parent_id) else {
                continue;
            };
            let request = SpawnRequest {
                parent: Some(parent_id),
                position: parent.position(),
                radius: parent.radius(),
                schedule: parent.schedule,
                next_transmit_time: parent.next_transmit_time,
                next_compute_time: parent.next_compute_time,
            };
            let offset = self.clone_offset();
            self.population.defer(SpawnRequest {
                position: request.position + offset,
                ..request
            });
        }

        if dropped > 0 {
            tracing::debug!(dropped, "Clone requests dropped at population cap");
        }

        let spawned = self.materialize_spawns();
        (spawned, dropped)
    }

    /// Random displacement of length `clone_offset`, on a sphere in 3D
    /// volumes and a circle in flat ones.
    fn clone_offset(&mut self) -> Vec3 {
        let distance = self.config.lifecycle.clone_offset;
        if distance == 0.0 {
            return Vec3::ZERO;
        }
        let theta = self.rng.gen_range(0.0..TAU);
        if self.config.population.volume.is_3d() {
            let phi = self.rng.gen_range(0.0..TAU);
            Vec3::new(
                distance * phi.sin() * theta.cos(),
                distance * phi.sin() * theta.sin(),
                distance * phi.cos(),
            )
        } else {
            Vec3::new(distance * theta.cos(), distance * theta.sin(), 0.0)
        }
    }

    /// Appends every queued spawn to the registry. New devices are first
    /// visited on the next tick.
    pub(crate) fn materialize_spawns(&mut self) -> usize {
        let pending = self.population.take_pending();
        let spawned = pending.len();
        for request in pending {
            let unit = match request.parent.and_then(|p| self.population.get(p).ok()) {
                Some(parent) => parent.unit.spawn_clone(request.position, &self.program),
                None => U::new(request.position, &self.program),
            };
            let id = self.population.allocate_id();
            let mut device = Device::new(
                id,
                request.parent,
                request.position,
                request.radius,
                unit,
                request.schedule,
                self.time,
            );
            device.next_transmit_time = request.next_transmit_time;
            device.next_compute_time = request.next_compute_time;
            device.clone_timer = self.config.lifecycle.clone_delay;
            tracing::debug!(device = %id, parent = ?request.parent, "Device spawned");
            self.hooks.device_init(&device);
            self.population.insert(device);
        }
        if spawned > 0 {
            self.neighbors.mark_dirty();
        }
        spawned
    }
}

/// Target position for `delta`, or `None` if the delta or the result is not
/// finite.
fn displaced(
    position: Vec3,
    delta: Vec3,
    speed_limit: Option<f64>,
    bounds: Option<&Volume>,
) -> Option<Vec3> {
    if !delta.is_finite() {
        return None;
    }
    let delta = match speed_limit {
        Some(limit) => {
            let length = delta.length();
            if length > limit {
                delta * (limit / length)
            } else {
                delta
            }
        }
        None => delta,
    };
    let mut target = position + delta;
    if let Some(volume) = bounds {
        target = volume.clamp(target);
    }
    target.is_finite().then_some(target)
}
