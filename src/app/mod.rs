//! Headless application layer: configuration loading, the run loop and
//! state dumps.

pub mod config;
pub mod dump;
pub mod runner;

pub use config::{load_config, ProgramKind, RunConfig, RunSettings};
pub use dump::DumpWriter;
pub use runner::HeadlessRunner;
