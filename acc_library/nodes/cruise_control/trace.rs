//! JSON-lines trace of every control iteration

use super::controller::{ControlState, StepOutput};
use crate::ControlInputs;
use acc_core::error::AccResult;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Serialize)]
struct TraceRecord<'a> {
    timestamp: DateTime<Local>,
    iteration: u64,
    inputs: &'a ControlInputs,
    state: &'a ControlState,
    output: &'a StepOutput,
}

/// Appends one JSON object per iteration to a writer
pub struct TraceRecorder {
    writer: Box<dyn Write + Send>,
    records: u64,
}

impl TraceRecorder {
    pub fn create(path: &Path) -> AccResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        tracing::debug!(path = %path.display(), "trace file created");
        Ok(Self::from_writer(BufWriter::new(file)))
    }

    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Box::new(writer),
            records: 0,
        }
    }

    pub fn record(
        &mut self,
        iteration: u64,
        inputs: &ControlInputs,
        state: &ControlState,
        output: &StepOutput,
    ) -> AccResult<()> {
        let record = TraceRecord {
            timestamp: Local::now(),
            iteration,
            inputs,
            state,
            output,
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn flush(&mut self) -> AccResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::cruise_control::controller::{ControlParams, CruiseController};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_one_line_per_iteration() {
        let buf = SharedBuf::default();
        let mut trace = TraceRecorder::from_writer(buf.clone());
        let mut ctl = CruiseController::new(ControlParams::default());

        for i in 1..=2 {
            let inputs = ControlInputs {
                increase: 5.0,
                ..ControlInputs::idle(0.75)
            };
            let out = ctl.step(&inputs);
            trace.record(i, &inputs, ctl.state(), &out).unwrap();
        }
        trace.flush().unwrap();
        assert_eq!(trace.records(), 2);

        let text = String::from_utf8(buf.0.lock().clone()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["iteration"], 2);
        assert_eq!(lines[1]["state"]["speed"], 2);
        assert_eq!(lines[1]["state"]["mode"], "Normal");
        assert_eq!(lines[0]["inputs"]["distance"], 0.75);
        assert!(lines[0]["timestamp"].is_string());
    }
}
