//! Simulated board
//!
//! Feeds scripted input frames to the control loop and records every output
//! write and pause. Cloning a `SimBoard` yields another handle onto the same
//! state, so a test can keep one handle while the node owns the other.
//!
//! The script advances one frame per distance sample. The control loop takes
//! exactly one distance sample per iteration, after the button reads, so a
//! frame with `repeat = n` is seen by `n` consecutive iterations.

use crate::ControlInputs;
use acc_core::config::PinConfig;
use acc_core::error::{AccError, AccResult};
use acc_core::hal::{
    AnalogInput, Board, Delay, DigitalOutput, DistanceSensor, Pin, PinMode, PwmOutput,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// Inputs held for `repeat` iterations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimFrame {
    pub inputs: ControlInputs,
    pub repeat: u32,
}

impl SimFrame {
    pub fn new(inputs: ControlInputs, repeat: u32) -> Self {
        Self { inputs, repeat }
    }

    pub fn once(inputs: ControlInputs) -> Self {
        Self::new(inputs, 1)
    }
}

/// One recorded output write
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimWrite {
    Digital(Pin, bool),
    Pwm(Pin, f64),
}

#[derive(Debug)]
struct SimState {
    pins: PinConfig,
    frames: VecDeque<SimFrame>,
    held: ControlInputs,
    distance_samples: u64,

    configured: Vec<(Pin, PinMode)>,
    writes: Vec<SimWrite>,
    digital: BTreeMap<Pin, bool>,
    pwm: BTreeMap<Pin, f64>,
    pauses: Vec<Duration>,
    realtime: bool,

    failing_writes: HashSet<Pin>,
    failing_reads: HashSet<Pin>,
    fail_distance_after: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SimBoard {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBoard {
    /// Board wired like the reference Uno, idle inputs, obstacle 1 m away
    pub fn new() -> Self {
        Self::with_pins(PinConfig::default())
    }

    pub fn with_pins(pins: PinConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                pins,
                frames: VecDeque::new(),
                held: ControlInputs::idle(1.0),
                distance_samples: 0,
                configured: Vec::new(),
                writes: Vec::new(),
                digital: BTreeMap::new(),
                pwm: BTreeMap::new(),
                pauses: Vec::new(),
                realtime: false,
                failing_writes: HashSet::new(),
                failing_reads: HashSet::new(),
                fail_distance_after: None,
            })),
        }
    }

    /// Queue scripted frames after any already queued
    pub fn push_frames<I: IntoIterator<Item = SimFrame>>(&self, frames: I) {
        let mut state = self.state.lock();
        state
            .frames
            .extend(frames.into_iter().filter(|frame| frame.repeat > 0));
    }

    pub fn push_frame(&self, frame: SimFrame) {
        self.push_frames([frame]);
    }

    /// Sleep for real on every pause instead of only recording it
    pub fn set_realtime(&self, realtime: bool) {
        self.state.lock().realtime = realtime;
    }

    /// Iterations still covered by the script
    pub fn frames_remaining(&self) -> u64 {
        self.state
            .lock()
            .frames
            .iter()
            .map(|frame| frame.repeat as u64)
            .sum()
    }

    pub fn distance_samples(&self) -> u64 {
        self.state.lock().distance_samples
    }

    // Fault injection

    pub fn fail_writes_to(&self, pin: Pin) {
        self.state.lock().failing_writes.insert(pin);
    }

    pub fn fail_reads_from(&self, pin: Pin) {
        self.state.lock().failing_reads.insert(pin);
    }

    /// Let `samples` distance reads succeed, then fail every later one
    pub fn fail_distance_after(&self, samples: u64) {
        self.state.lock().fail_distance_after = Some(samples);
    }

    // Recorded outputs

    pub fn writes(&self) -> Vec<SimWrite> {
        self.state.lock().writes.clone()
    }

    pub fn digital(&self, pin: Pin) -> Option<bool> {
        self.state.lock().digital.get(&pin).copied()
    }

    pub fn pwm(&self, pin: Pin) -> Option<f64> {
        self.state.lock().pwm.get(&pin).copied()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.state.lock().pauses.clone()
    }

    pub fn total_paused(&self) -> Duration {
        self.state.lock().pauses.iter().sum()
    }

    pub fn configured_pins(&self) -> Vec<(Pin, PinMode)> {
        self.state.lock().configured.clone()
    }
}

impl SimState {
    fn current_inputs(&self) -> ControlInputs {
        self.frames
            .front()
            .map(|frame| frame.inputs)
            .unwrap_or(self.held)
    }

    fn advance(&mut self) {
        if let Some(frame) = self.frames.front_mut() {
            frame.repeat -= 1;
            if frame.repeat == 0 {
                if let Some(done) = self.frames.pop_front() {
                    self.held = done.inputs;
                }
            }
        }
    }

    fn record_write(&mut self, pin: Pin, write: SimWrite) -> AccResult<()> {
        if self.failing_writes.contains(&pin) {
            return Err(AccError::actuator(pin, "simulated write fault"));
        }
        match write {
            SimWrite::Digital(_, high) => {
                self.digital.insert(pin, high);
            }
            SimWrite::Pwm(_, duty) => {
                self.pwm.insert(pin, duty);
            }
        }
        self.writes.push(write);
        Ok(())
    }
}

impl AnalogInput for SimBoard {
    fn read_voltage(&mut self, pin: Pin) -> AccResult<f64> {
        let state = self.state.lock();
        if state.failing_reads.contains(&pin) {
            return Err(AccError::sensor(pin, "simulated read fault"));
        }

        let inputs = state.current_inputs();
        let pins = &state.pins;
        let volts = if pin == pins.increase {
            inputs.increase
        } else if pin == pins.decrease {
            inputs.decrease
        } else if pin == pins.cancel {
            inputs.cancel
        } else if pin == pins.set {
            inputs.set
        } else if pin == pins.acc {
            inputs.acc
        } else {
            0.0
        };
        Ok(volts)
    }
}

impl DistanceSensor for SimBoard {
    fn read_distance(&mut self) -> AccResult<f64> {
        let mut state = self.state.lock();
        if let Some(limit) = state.fail_distance_after {
            if state.distance_samples >= limit {
                return Err(AccError::sensor("ultrasonic", "simulated echo timeout"));
            }
        }

        let distance = state.current_inputs().distance;
        state.distance_samples += 1;
        state.advance();
        Ok(distance)
    }
}

impl DigitalOutput for SimBoard {
    fn write_digital(&mut self, pin: Pin, high: bool) -> AccResult<()> {
        self.state
            .lock()
            .record_write(pin, SimWrite::Digital(pin, high))
    }
}

impl PwmOutput for SimBoard {
    fn write_pwm_duty_cycle(&mut self, pin: Pin, duty: f64) -> AccResult<()> {
        self.state.lock().record_write(pin, SimWrite::Pwm(pin, duty))
    }
}

impl Delay for SimBoard {
    fn pause(&mut self, duration: Duration) {
        let realtime = {
            let mut state = self.state.lock();
            state.pauses.push(duration);
            state.realtime
        };
        if realtime && !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

impl Board for SimBoard {
    fn board_name(&self) -> &str {
        "Simulated Uno"
    }

    fn configure_pin(&mut self, pin: Pin, mode: PinMode) -> AccResult<()> {
        self.state.lock().configured.push((pin, mode));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_advances_per_distance_sample() {
        let mut board = SimBoard::new();
        board.push_frames([
            SimFrame::new(
                ControlInputs {
                    increase: 5.0,
                    ..ControlInputs::idle(0.5)
                },
                2,
            ),
            SimFrame::once(ControlInputs::idle(0.1)),
        ]);
        assert_eq!(board.frames_remaining(), 3);

        assert_eq!(board.read_voltage(Pin::Analog(0)).unwrap(), 5.0);
        assert_eq!(board.read_voltage(Pin::Analog(0)).unwrap(), 5.0);
        assert_eq!(board.read_distance().unwrap(), 0.5);
        assert_eq!(board.read_voltage(Pin::Analog(0)).unwrap(), 5.0);
        assert_eq!(board.read_distance().unwrap(), 0.5);

        assert_eq!(board.read_voltage(Pin::Analog(0)).unwrap(), 0.0);
        assert_eq!(board.read_distance().unwrap(), 0.1);
        assert_eq!(board.frames_remaining(), 0);

        // Last frame is held once the script runs out
        assert_eq!(board.read_distance().unwrap(), 0.1);
        assert_eq!(board.distance_samples(), 4);
    }

    #[test]
    fn test_clones_share_state() {
        let probe = SimBoard::new();
        let mut board = probe.clone();
        board.write_digital(Pin::Digital(13), true).unwrap();
        board.pause(Duration::from_millis(10));

        assert_eq!(probe.digital(Pin::Digital(13)), Some(true));
        assert_eq!(probe.pauses(), vec![Duration::from_millis(10)]);
    }

    #[test]
    fn test_fault_injection() {
        let mut board = SimBoard::new();
        board.fail_reads_from(Pin::Analog(3));
        board.fail_distance_after(1);

        assert!(board.read_voltage(Pin::Analog(3)).is_err());
        assert!(board.read_voltage(Pin::Analog(2)).is_ok());
        assert!(board.read_distance().is_ok());
        assert!(matches!(
            board.read_distance(),
            Err(AccError::SensorReadFailure { .. })
        ));
    }

    #[test]
    fn test_zero_repeat_frames_dropped() {
        let board = SimBoard::new();
        board.push_frame(SimFrame::new(ControlInputs::idle(0.1), 0));
        assert_eq!(board.frames_remaining(), 0);
    }
}
