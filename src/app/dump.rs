use anyhow::Result;
use protosim_data::PopulationSnapshot;
use std::io::Write;

/// Writes population snapshots as JSON lines.
pub struct DumpWriter<W: Write> {
    out: W,
    written: u64,
}

impl<W: Write> DumpWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn write_snapshot(&mut self, snapshot: &PopulationSnapshot) -> Result<()> {
        serde_json::to_writer(&mut self.out, snapshot)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Snapshots written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
