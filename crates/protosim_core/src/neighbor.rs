//! Cached neighbor discovery.
//!
//! A device's neighbors are every *other* device whose position lies within
//! the device's own radius, boundary included. Results are cached on the
//! device and stay valid until the population-wide topology flag is raised.
//! The flag is raised when any device moves (or the population grows) and is
//! consumed at the start of the next tick, which drops every cache at once.
//!
//! Brute force costs O(n) per query, so a full rebuild is O(n²) per tick.
//! The grid strategy narrows the candidate set but applies the same exact
//! distance test, so both strategies return identical sets.

use crate::config::{IndexConfig, IndexStrategy};
use crate::device::Device;
use crate::spatial_hash::SpatialHash;
use crate::unit::ComputationUnit;
use protosim_data::{DeviceId, Vec3};

/// Inclusive distance test shared by every strategy.
#[inline]
#[must_use]
pub fn within_radius(a: Vec3, b: Vec3, radius: f64) -> bool {
    a.distance_squared(&b) <= radius * radius
}

/// Uncached brute-force scan. Returns ids in ascending order.
pub fn neighbors_within<U>(devices: &[Device<U>], index: usize) -> Vec<DeviceId>
where
    U: ComputationUnit,
{
    let center = devices[index].position();
    let radius = devices[index].radius();
    devices
        .iter()
        .enumerate()
        .filter(|&(i, other)| i != index && within_radius(center, other.position(), radius))
        .map(|(_, other)| other.id())
        .collect()
}

pub struct NeighborIndex {
    strategy: IndexStrategy,
    grid: SpatialHash,
    grid_valid: bool,
    dirty: bool,
    candidates: Vec<usize>,
}

impl NeighborIndex {
    #[must_use]
    pub fn new(config: &IndexConfig, radius: f64) -> Self {
        Self {
            strategy: config.strategy,
            grid: SpatialHash::new(config.effective_cell_size(radius)),
            grid_valid: false,
            dirty: false,
            candidates: Vec::new(),
        }
    }

    /// Raises the topology flag.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
        self.grid_valid = false;
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Consumes the topology flag. When it was set every device cache is
    /// dropped; returns whether that happened.
    pub fn begin_tick<U: ComputationUnit>(&mut self, devices: &mut [Device<U>]) -> bool {
        if !self.dirty {
            return false;
        }
        for device in devices.iter_mut() {
            device.neighbor_cache = None;
        }
        self.dirty = false;
        self.grid_valid = false;
        true
    }

    /// Neighbors of the device at `index`, served from its cache when valid.
    ///
    /// While the flag is raised the result is computed fresh and not stored,
    /// since the caches are about to be dropped anyway.
    pub fn neighbors_of<U: ComputationUnit>(
        &mut self,
        devices: &mut [Device<U>],
        index: usize,
    ) -> Vec<DeviceId> {
        if self.dirty {
            return neighbors_within(devices, index);
        }
        if let Some(cached) = &devices[index].neighbor_cache {
            return cached.clone();
        }
        let found = self.compute(devices, index);
        devices[index].neighbor_cache = Some(found.clone());
        found
    }

    fn compute<U: ComputationUnit>(&mut self, devices: &[Device<U>], index: usize) -> Vec<DeviceId> {
        match self.strategy {
            IndexStrategy::BruteForce => neighbors_within(devices, index),
            IndexStrategy::Grid => self.grid_neighbors(devices, index),
        }
    }

    fn grid_neighbors<U: ComputationUnit>(
        &mut self,
        devices: &[Device<U>],
        index: usize,
    ) -> Vec<DeviceId> {
        if !self.grid_valid {
            let positions: Vec<Vec3> = devices.iter().map(|d| d.position()).collect();
            self.grid.build(&positions);
            self.grid_valid = true;
        }

        let center = devices[index].position();
        let radius = devices[index].radius();
        // Positions beyond the representable grid are not hashed.
        if self.grid.len() != devices.len() || self.grid.query_box(center, radius).is_none() {
            return neighbors_within(devices, index);
        }

        self.grid.query_into(center, radius, &mut self.candidates);
        self.candidates
            .iter()
            .filter(|&&i| i != index && within_radius(center, devices[i].position(), radius))
            .map(|&i| devices[i].id())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Program, ScriptedUnit};
    use crate::schedule::Schedule;

    fn population(points: &[(f64, f64, f64)], radius: f64) -> Vec<Device<ScriptedUnit>> {
        points
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let position = Vec3::from(p);
                let unit = ScriptedUnit::new(position, &Program::Idle);
                Device::new(
                    DeviceId(i as u64 + 1),
                    None,
                    position,
                    radius,
                    unit,
                    Schedule::default(),
                    0.0,
                )
            })
            .collect()
    }

    fn grid_config(cell: f64) -> IndexConfig {
        IndexConfig {
            strategy: IndexStrategy::Grid,
            cell_size: Some(cell),
        }
    }

    #[test]
    fn test_brute_force_basic() {
        let devices = population(&[(0.0, 0.0, 0.0), (5.0, 0.0, 0.0), (20.0, 0.0, 0.0)], 10.0);
        assert_eq!(neighbors_within(&devices, 0), vec![DeviceId(2)]);
        assert_eq!(neighbors_within(&devices, 1), vec![DeviceId(1)]);
        assert!(neighbors_within(&devices, 2).is_empty());
    }

    #[test]
    fn test_boundary_inclusive() {
        let devices = population(&[(0.0, 0.0, 0.0), (10.0, 0.0, 0.0), (0.0, 10.000001, 0.0)], 10.0);
        assert_eq!(neighbors_within(&devices, 0), vec![DeviceId(2)]);
    }

    #[test]
    fn test_cache_served_until_dirty() {
        let mut devices = population(&[(0.0, 0.0, 0.0), (5.0, 0.0, 0.0)], 10.0);
        let mut index = NeighborIndex::new(&IndexConfig::default(), 10.0);

        assert_eq!(index.neighbors_of(&mut devices, 0), vec![DeviceId(2)]);
        assert!(devices[0].neighbor_cache().is_some());

        devices[1].move_to(Vec3::new(50.0, 0.0, 0.0));
        index.mark_dirty();
        // Fresh while dirty, without repopulating the cache.
        assert!(index.neighbors_of(&mut devices, 0).is_empty());

        assert!(index.begin_tick(&mut devices));
        assert!(!index.is_dirty());
        assert!(devices[0].neighbor_cache().is_none());
        assert!(index.neighbors_of(&mut devices, 0).is_empty());
        assert!(!index.begin_tick(&mut devices));
    }

    #[test]
    fn test_grid_matches_brute_force() {
        let points: Vec<(f64, f64, f64)> = (0..60)
            .map(|i| {
                let f = i as f64;
                ((f * 7.3) % 50.0, (f * 3.1) % 40.0 - 20.0, (f * 1.7) % 10.0)
            })
            .collect();
        let mut brute = population(&points, 8.0);
        let mut gridded = population(&points, 8.0);
        let mut brute_index = NeighborIndex::new(&IndexConfig::default(), 8.0);
        let mut grid_index = NeighborIndex::new(&grid_config(3.0), 8.0);

        for i in 0..points.len() {
            assert_eq!(
                brute_index.neighbors_of(&mut brute, i),
                grid_index.neighbors_of(&mut gridded, i),
                "mismatch for device {i}"
            );
        }
    }

    #[test]
    fn test_grid_boundary_on_cell_edge() {
        let mut devices = population(&[(0.0, 0.0, 0.0), (10.0, 0.0, 0.0), (-10.0, 0.0, 0.0)], 10.0);
        let mut index = NeighborIndex::new(&grid_config(10.0), 10.0);
        assert_eq!(
            index.neighbors_of(&mut devices, 0),
            vec![DeviceId(2), DeviceId(3)]
        );
    }

    #[test]
    fn test_grid_falls_back_for_unhashable_positions() {
        let far = i32::MAX as f64 * 4.0;
        let mut devices = population(&[(far, 0.0, 0.0), (far + 1.0, 0.0, 0.0)], 10.0);
        let mut index = NeighborIndex::new(&grid_config(1.0), 10.0);
        assert_eq!(index.neighbors_of(&mut devices, 0), vec![DeviceId(2)]);
    }
}
