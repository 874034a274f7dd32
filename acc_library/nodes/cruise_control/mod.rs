//! Cruise Control Node - Adaptive cruise control for a DC motor rig
//!
//! Runs the three-mode speed controller against a board once per tick:
//!
//! 1. Sample the five button voltages (increase, decrease, cancel, set, acc)
//!    and then the ultrasonic distance
//! 2. Select the mode (cancel > set > acc) and apply its update rule
//! 3. Drive the LEDs, pause as the mode requires, print the status line
//! 4. Drive the H-bridge from the clamped speed and pause until the next tick
//!
//! All pacing goes through the board's `Delay`, so against a simulated board
//! a tick returns immediately while the requested pauses are recorded.

pub mod controller;
pub mod trace;

pub use controller::{ControlParams, ControlState, CruiseController, StepOutput};
pub use trace::TraceRecorder;

use crate::nodes::dc_motor::DcMotorDriver;
use crate::{ControlInputs, LedPattern};
use acc_core::config::{AccConfig, PinConfig};
use acc_core::core::{Node, NodeInfo, NodeInfoExt};
use acc_core::error::AccResult;
use acc_core::hal::{Board, PinMode};

pub const STARTUP_MESSAGE: &str = "Starting Adaptive Cruise Control...";

pub struct CruiseControlNode<B: Board> {
    board: B,
    pins: PinConfig,
    controller: CruiseController,
    motor: DcMotorDriver,
    trace: Option<TraceRecorder>,

    iterations: u64,
    last_output: Option<StepOutput>,
}

impl<B: Board> CruiseControlNode<B> {
    pub fn new(board: B, config: &AccConfig) -> Self {
        Self {
            board,
            pins: config.pins.clone(),
            controller: CruiseController::from_config(config),
            motor: DcMotorDriver::from_pins(&config.pins),
            trace: None,
            iterations: 0,
            last_output: None,
        }
    }

    /// Record every iteration to `trace`
    pub fn with_trace(mut self, trace: TraceRecorder) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Resume from a saved controller state instead of power-on
    pub fn with_state(mut self, state: ControlState) -> Self {
        self.controller = self.controller.with_state(state);
        self
    }

    pub fn state(&self) -> &ControlState {
        self.controller.state()
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn last_output(&self) -> Option<&StepOutput> {
        self.last_output.as_ref()
    }

    /// Read all five buttons in order, then the distance
    fn sample_inputs(&mut self) -> AccResult<ControlInputs> {
        let [increase, decrease, cancel, set, acc] = self.pins.buttons().map(|(_, pin)| pin);

        let increase = self.board.read_voltage(increase)?;
        let decrease = self.board.read_voltage(decrease)?;
        let cancel = self.board.read_voltage(cancel)?;
        let set = self.board.read_voltage(set)?;
        let acc = self.board.read_voltage(acc)?;
        let distance = self.board.read_distance()?;

        Ok(ControlInputs {
            increase,
            decrease,
            cancel,
            set,
            acc,
            distance,
        })
    }

    fn write_leds(&mut self, leds: LedPattern) -> AccResult<()> {
        self.board.write_digital(self.pins.led1, leds.led1)?;
        self.board.write_digital(self.pins.led2, leds.led2)
    }

    fn configure_pins(&mut self) -> AccResult<()> {
        for (_, pin) in self.pins.buttons() {
            self.board.configure_pin(pin, PinMode::AnalogInput)?;
        }
        self.board.configure_pin(self.pins.led1, PinMode::DigitalOutput)?;
        self.board.configure_pin(self.pins.led2, PinMode::DigitalOutput)?;
        self.motor.configure(&mut self.board)
    }

    /// One full iteration of the loop
    pub fn step(&mut self, mut ctx: Option<&mut NodeInfo>) -> AccResult<&StepOutput> {
        let inputs = self.sample_inputs()?;
        let output = self.controller.step(&inputs);

        if let Some(mode) = output.entered_mode {
            ctx.log_debug(&format!("Entered {}", mode));
        }

        self.write_leds(output.leds)?;
        if let Some(pause) = output.mode_pause {
            self.board.pause(pause);
        }

        ctx.log_status(&output.status);

        self.motor.apply(&mut self.board, &output.motor)?;
        self.board.pause(output.loop_pause);

        self.iterations += 1;
        if let Some(trace) = self.trace.as_mut() {
            trace.record(self.iterations, &inputs, self.controller.state(), &output)?;
        }

        let output = self.last_output.insert(output);
        Ok(&*output)
    }
}

impl<B: Board> Node for CruiseControlNode<B> {
    fn name(&self) -> &'static str {
        "cruise_control"
    }

    fn init(&mut self, ctx: &mut NodeInfo) -> AccResult<()> {
        ctx.log_status(&STARTUP_MESSAGE.to_string());
        ctx.log_info(&format!("Using board: {}", self.board.board_name()));

        self.configure_pins()?;
        // Motor off and LEDs dark until the first tick decides otherwise
        self.motor.stop(&mut self.board)?;
        self.write_leds(LedPattern::OFF)
    }

    fn tick(&mut self, ctx: Option<&mut NodeInfo>) -> AccResult<()> {
        self.step(ctx).map(|_| ())
    }

    fn shutdown(&mut self, ctx: &mut NodeInfo) -> AccResult<()> {
        let motor = self.motor.stop(&mut self.board);
        let leds = self.write_leds(LedPattern::OFF);
        let trace = match self.trace.as_mut() {
            Some(trace) => trace.flush(),
            None => Ok(()),
        };

        ctx.log_info(&format!(
            "Stopped after {} iterations, motor off",
            self.iterations
        ));
        motor.and(leds).and(trace)
    }
}
