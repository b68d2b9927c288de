use super::config::RunConfig;
use super::dump::DumpWriter;
use anyhow::{Context, Result};
use protosim_core::engine::{Engine, RunSummary, StopReason};
use protosim_core::program::ScriptedUnit;
use std::fs::File;
use std::io::{BufWriter, Write};

/// Drives an engine without any presentation layer, optionally dumping
/// population state every `dump_period` ticks.
pub struct HeadlessRunner<W: Write = BufWriter<File>> {
    engine: Engine<ScriptedUnit>,
    dump: Option<DumpWriter<W>>,
    dump_period: u64,
}

impl HeadlessRunner {
    /// Builds the engine and opens the dump file named in the config.
    pub fn new(config: RunConfig) -> Result<Self> {
        let dump = match &config.run.dump_path {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create dump file {}", path.display()))?;
                Some(DumpWriter::new(BufWriter::new(file)))
            }
            None => None,
        };
        Self::with_writer(config, dump)
    }
}

impl<W: Write> HeadlessRunner<W> {
    pub fn with_writer(config: RunConfig, dump: Option<DumpWriter<W>>) -> Result<Self> {
        let dump_period = config.run.dump_period.max(1);
        let engine = Engine::new(config.sim, config.program)?;
        Ok(Self {
            engine,
            dump,
            dump_period,
        })
    }

    pub fn engine(&self) -> &Engine<ScriptedUnit> {
        &self.engine
    }

    /// Runs until the engine's stop condition holds or `max_ticks` ticks have
    /// run. The initial state is dumped before the first tick.
    pub fn run(&mut self, max_ticks: u64) -> Result<RunSummary> {
        if self.engine.is_paused() {
            tracing::info!("Engine starts paused; resuming for headless run");
            self.engine.resume();
        }
        self.dump_state()?;

        let mut ticks = 0;
        let reason = loop {
            if ticks >= max_ticks {
                break StopReason::TickLimit;
            }
            match self.engine.advance() {
                Some(report) => {
                    ticks += 1;
                    if (report.tick + 1) % self.dump_period == 0 {
                        self.dump_state()?;
                    }
                }
                None => break StopReason::Condition,
            }
        };

        if let Some(dump) = &mut self.dump {
            dump.flush()?;
        }
        self.engine.metrics().log_summary();
        Ok(RunSummary {
            ticks,
            time: self.engine.time(),
            reason,
        })
    }

    fn dump_state(&mut self) -> Result<()> {
        if let Some(dump) = &mut self.dump {
            dump.write_snapshot(&self.engine.snapshot())?;
        }
        Ok(())
    }

    pub fn into_dump(self) -> Option<DumpWriter<W>> {
        self.dump
    }
}
