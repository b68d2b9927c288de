//! Arena registry that owns every device.
//!
//! Devices live in a `Vec` kept sorted by id. Ids are handed out from a
//! monotonic counter and never reused, so appending keeps the order and a
//! lookup is a binary search. Spawns raised while the engine iterates are
//! queued and only appended once the pass is over.

use crate::device::Device;
use crate::error::{Result, SimError};
use crate::schedule::Schedule;
use crate::unit::ComputationUnit;
use protosim_data::{DeviceId, Vec3};

/// A device waiting to be materialized after the current pass.
#[derive(Debug, Clone, Copy)]
pub struct SpawnRequest {
    pub parent: Option<DeviceId>,
    pub position: Vec3,
    pub radius: f64,
    pub schedule: Schedule,
    pub next_transmit_time: f64,
    pub next_compute_time: f64,
}

pub struct Population<U> {
    devices: Vec<Device<U>>,
    pending: Vec<SpawnRequest>,
    next_id: u64,
}

impl<U> Default for Population<U> {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            pending: Vec::new(),
            next_id: 0,
        }
    }
}

impl<U: ComputationUnit> Population<U> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the next id. Ids start at 1.
    pub fn allocate_id(&mut self) -> DeviceId {
        self.next_id += 1;
        DeviceId(self.next_id)
    }

    /// Appends a device. Its id must be newer than every registered id.
    pub fn insert(&mut self, device: Device<U>) {
        debug_assert!(
            self.devices.last().map_or(true, |d| d.id() < device.id()),
            "device ids must be inserted in ascending order"
        );
        self.devices.push(device);
    }

    /// Queues a spawn for after the current pass.
    pub fn defer(&mut self, request: SpawnRequest) {
        self.pending.push(request);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drains queued spawns in the order they were raised.
    pub fn take_pending(&mut self) -> Vec<SpawnRequest> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn index_of(&self, id: DeviceId) -> Option<usize> {
        self.devices.binary_search_by_key(&id, |d| d.id()).ok()
    }

    pub fn get(&self, id: DeviceId) -> Result<&Device<U>> {
        self.index_of(id)
            .map(|i| &self.devices[i])
            .ok_or(SimError::UnknownDevice(id))
    }

    pub fn get_mut(&mut self, id: DeviceId) -> Result<&mut Device<U>> {
        match self.index_of(id) {
            Some(i) => Ok(&mut self.devices[i]),
            None => Err(SimError::UnknownDevice(id)),
        }
    }

    /// Devices in ascending id order.
    pub fn devices(&self) -> &[Device<U>] {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut [Device<U>] {
        &mut self.devices
    }

    pub fn ids(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.devices.iter().map(|d| d.id())
    }

    /// Mutable access to the device at `target` alongside shared access to the
    /// one at `source`. The indices must differ.
    pub fn pair_mut(&mut self, target: usize, source: usize) -> (&mut Device<U>, &Device<U>) {
        assert_ne!(target, source, "a device cannot message itself");
        if target < source {
            let (left, right) = self.devices.split_at_mut(source);
            (&mut left[target], &right[0])
        } else {
            let (left, right) = self.devices.split_at_mut(target);
            (&mut right[0], &left[source])
        }
    }
}
