//! Protosim: a spatial-computer simulator.
//!
//! The engine lives in `protosim_core` and its data types in
//! `protosim_data`; this crate adds the headless application used by the
//! `protosim` binary.

pub mod app;
