//! Plain data types shared by the protosim engine and its consumers.

pub mod device;
pub mod geometry;

pub use device::{Color, DeviceId, DeviceSnapshot, LifecycleRequests, PopulationSnapshot};
pub use geometry::{Vec3, Volume};
