use anyhow::{Context, Result};
use protosim_core::config::SimConfig;
use protosim_core::program::Program;
use protosim_data::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Headless run settings, the `[run]` table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RunSettings {
    pub ticks: u64,
    /// JSON-lines state dump destination. No dump when unset.
    pub dump_path: Option<PathBuf>,
    /// Ticks between dumped snapshots.
    pub dump_period: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            ticks: 1000,
            dump_path: None,
            dump_period: 10,
        }
    }
}

/// Everything the headless binary reads from its config file: the engine
/// sections at the top level plus the program and run settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct RunConfig {
    #[serde(flatten)]
    pub sim: SimConfig,
    pub program: Program,
    pub run: RunSettings,
}

impl RunConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse run config")?;
        config.sim.validate()?;
        anyhow::ensure!(config.run.dump_period > 0, "dump_period must be positive");
        Ok(config)
    }
}

/// Loads `path`, falling back to the defaults when the file does not exist.
/// A file that exists but does not parse or validate is an error.
pub fn load_config(path: &Path) -> Result<RunConfig> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Config file not found, using defaults");
        return Ok(RunConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    RunConfig::from_toml(&content).with_context(|| format!("Invalid config {}", path.display()))
}

/// Program choices exposed on the command line, each with stock parameters.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgramKind {
    Idle,
    Drift,
    Gradient,
    Divide,
    Blink,
}

impl ProgramKind {
    #[must_use]
    pub fn program(self) -> Program {
        match self {
            ProgramKind::Idle => Program::Idle,
            ProgramKind::Drift => Program::Drift {
                velocity: Vec3::new(1.0, 0.0, 0.0),
            },
            ProgramKind::Gradient => Program::HopGradient { source_sensor: 0 },
            ProgramKind::Divide => Program::Divide { at_time: 10.0 },
            ProgramKind::Blink => Program::Blink { period: 2.0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_config_defaults() {
        let config = RunConfig::from_toml("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.run.ticks, 1000);
        assert_eq!(config.program, Program::Idle);
    }

    #[test]
    fn test_run_config_sections() {
        let config = RunConfig::from_toml(
            r#"
            [engine]
            seed = 5

            [population]
            size = 12

            [program]
            kind = "blink"
            period = 3.0

            [run]
            ticks = 50
            dump_period = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.sim.engine.seed, Some(5));
        assert_eq!(config.sim.population.size, 12);
        assert_eq!(config.program, Program::Blink { period: 3.0 });
        assert_eq!(config.run.ticks, 50);
        assert_eq!(config.run.dump_period, 5);
    }

    #[test]
    fn test_run_config_rejects_invalid_engine_section() {
        assert!(RunConfig::from_toml("[engine]\nstep_size = 0.0\n").is_err());
        assert!(RunConfig::from_toml("[run]\ndump_period = 0\n").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/protosim.toml")).unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn test_program_kind_mapping() {
        assert_eq!(ProgramKind::Idle.program(), Program::Idle);
        assert!(matches!(
            ProgramKind::Gradient.program(),
            Program::HopGradient { source_sensor: 0 }
        ));
    }
}
