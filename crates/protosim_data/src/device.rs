use crate::geometry::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable device identifier. Assigned once at spawn and never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DeviceId(pub u64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

/// Emitted LED color. Channels are unit intensities but are not clamped.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl Color {
    pub const OFF: Color = Color {
        red: 0.0,
        green: 0.0,
        blue: 0.0,
    };

    #[must_use]
    pub const fn new(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }
}

/// Lifecycle requests raised by a device's program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LifecycleRequests {
    pub request_clone: bool,
    /// Recorded but never acted on; no removal policy is defined.
    pub request_death: bool,
}

impl LifecycleRequests {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.request_clone && !self.request_death
    }

    pub fn merge(&mut self, other: LifecycleRequests) {
        self.request_clone |= other.request_clone;
        self.request_death |= other.request_death;
    }
}

/// Read-only view of one device, as written to state dumps.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DeviceSnapshot {
    pub id: DeviceId,
    pub parent: Option<DeviceId>,
    pub position: Vec3,
    pub radius: f64,
    pub color: Color,
    pub sensors: Vec<bool>,
    pub next_transmit_time: f64,
    pub next_compute_time: f64,
    pub last_compute_time: Option<f64>,
    pub requests: LifecycleRequests,
    pub clone_timer: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PopulationSnapshot {
    pub tick: u64,
    pub time: f64,
    pub fingerprint: String,
    pub devices: Vec<DeviceSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_merge() {
        let mut r = LifecycleRequests::default();
        assert!(r.is_empty());
        r.merge(LifecycleRequests {
            request_clone: true,
            request_death: false,
        });
        r.merge(LifecycleRequests::default());
        assert!(r.request_clone);
        assert!(!r.request_death);
    }

    #[test]
    fn test_device_id_serializes_as_number() {
        let json = serde_json::to_string(&DeviceId(7)).unwrap();
        assert_eq!(json, "7");
        assert_eq!(DeviceId(7).to_string(), "device#7");
    }
}
