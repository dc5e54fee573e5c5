#![warn(missing_docs)]
//! Deterministic testing surfaces: manual clocks, a fault-injecting host,
//! canned worlds, log capture and a JSONL transcript sink.

mod clock;
mod host;
mod logs;
mod worlds;

use anyhow::Result;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use stuck_core::SimTick;

pub use clock::*;
pub use host::*;
pub use logs::*;
pub use worlds::*;

/// One line of a headless transcript.
#[derive(Debug, Serialize)]
pub struct EventRecord<'a, T> {
    /// Simulation tick when the event occurred.
    pub tick: SimTick,
    /// Human-readable kind label.
    pub kind: &'a str,
    /// Event payload.
    pub payload: T,
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    out: BufWriter<File>,
    written: usize,
}

impl JsonlSink {
    /// Create a new sink at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            out: BufWriter::new(file),
            written: 0,
        })
    }

    /// Append an event to the log.
    pub fn write<T: Serialize>(&mut self, event: &EventRecord<'_, T>) -> Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Lines written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush buffered lines to disk.
    pub fn finish(mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn jsonl_sink_writes_one_line_per_event() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("transcript.jsonl");
        let mut sink = JsonlSink::create(&path).expect("sink create");
        for tick in 0..3 {
            sink.write(&EventRecord {
                tick: SimTick(tick),
                kind: "sample",
                payload: tick * 10,
            })
            .expect("write succeeds");
        }
        assert_eq!(sink.written(), 3);
        sink.finish().expect("flush");

        let contents = fs::read_to_string(&path).expect("file readable");
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("\"payload\":20"));
    }
}
